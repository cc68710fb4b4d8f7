// Model families, size variants and on-disk folder names

use serde::{Deserialize, Serialize};

/// Synthesis mode category, independent of which model size backs it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Preset speakers with an optional style instruction
    CustomVoice,
    /// Natural-language voice description
    VoiceDesign,
    /// Reference-audio cloning
    Base,
}

impl ModelFamily {
    /// All families in a stable order
    pub const ALL: [Self; 3] = [Self::CustomVoice, Self::VoiceDesign, Self::Base];

    /// Get family key as string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomVoice => "custom_voice",
            Self::VoiceDesign => "voice_design",
            Self::Base => "base",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model size tier within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Smaller model, preferred for latency
    Lite,
    /// Larger model, used when lite is not installed
    Pro,
}

impl ModelVariant {
    /// Probe order: lite first, then pro
    pub const PREFERENCE: [Self; 2] = [Self::Lite, Self::Pro];

    /// Get variant suffix as string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lite => "lite",
            Self::Pro => "pro",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used in status reports, e.g. `custom_voice_lite`
#[must_use]
pub fn variant_key(family: ModelFamily, variant: ModelVariant) -> String {
    format!("{}_{}", family.as_str(), variant.as_str())
}

/// Folder names under the model root, one per family and variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFolders {
    /// Preset-speaker model, large
    pub custom_voice_pro: String,
    /// Preset-speaker model, small
    pub custom_voice_lite: String,
    /// Voice-design model, large
    pub voice_design_pro: String,
    /// Voice-design model, small
    pub voice_design_lite: String,
    /// Cloning model, large
    pub base_pro: String,
    /// Cloning model, small
    pub base_lite: String,
}

impl ModelFolders {
    /// Folder name for a family and variant
    #[must_use]
    pub fn folder(&self, family: ModelFamily, variant: ModelVariant) -> &str {
        match (family, variant) {
            (ModelFamily::CustomVoice, ModelVariant::Pro) => &self.custom_voice_pro,
            (ModelFamily::CustomVoice, ModelVariant::Lite) => &self.custom_voice_lite,
            (ModelFamily::VoiceDesign, ModelVariant::Pro) => &self.voice_design_pro,
            (ModelFamily::VoiceDesign, ModelVariant::Lite) => &self.voice_design_lite,
            (ModelFamily::Base, ModelVariant::Pro) => &self.base_pro,
            (ModelFamily::Base, ModelVariant::Lite) => &self.base_lite,
        }
    }

    /// Iterate over every `(family, variant, folder)` triple
    pub fn iter(&self) -> impl Iterator<Item = (ModelFamily, ModelVariant, &str)> + '_ {
        ModelFamily::ALL.into_iter().flat_map(move |family| {
            ModelVariant::PREFERENCE
                .into_iter()
                .map(move |variant| (family, variant, self.folder(family, variant)))
        })
    }
}

impl Default for ModelFolders {
    fn default() -> Self {
        Self {
            custom_voice_pro: "Qwen3-TTS-12Hz-1.7B-CustomVoice-8bit".to_string(),
            custom_voice_lite: "Qwen3-TTS-12Hz-0.6B-CustomVoice-8bit".to_string(),
            voice_design_pro: "Qwen3-TTS-12Hz-1.7B-VoiceDesign-8bit".to_string(),
            voice_design_lite: "Qwen3-TTS-12Hz-0.6B-VoiceDesign-8bit".to_string(),
            base_pro: "Qwen3-TTS-12Hz-1.7B-Base-8bit".to_string(),
            base_lite: "Qwen3-TTS-12Hz-0.6B-Base-8bit".to_string(),
        }
    }
}
