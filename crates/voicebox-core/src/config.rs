//! Core configuration: directories, limits and model folder names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{VoiceboxError, VoiceboxResult};
use crate::model::ModelFolders;

/// Environment variable overriding [`VoiceboxConfig::models_dir`]
pub const ENV_MODELS_DIR: &str = "VOICEBOX_MODELS_DIR";
/// Environment variable overriding [`VoiceboxConfig::voices_dir`]
pub const ENV_VOICES_DIR: &str = "VOICEBOX_VOICES_DIR";
/// Environment variable overriding [`VoiceboxConfig::scratch_dir`]
pub const ENV_SCRATCH_DIR: &str = "VOICEBOX_SCRATCH_DIR";

/// Synthesis core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceboxConfig {
    /// Root directory holding one folder per model family and variant
    pub models_dir: PathBuf,
    /// Directory holding saved voice prompts
    pub voices_dir: PathBuf,
    /// Parent of per-request scratch directories; OS temp dir when unset
    pub scratch_dir: Option<PathBuf>,
    /// Maximum input text length in characters
    pub max_text_length: usize,
    /// Chunk size used when a streaming request does not set one
    pub default_chunk_size: usize,
    /// Folder names under `models_dir`
    pub model_folders: ModelFolders,
}

impl Default for VoiceboxConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./models"),
            voices_dir: PathBuf::from("./voices/saved"),
            scratch_dir: None,
            max_text_length: crate::MAX_TEXT_LENGTH,
            default_chunk_size: crate::DEFAULT_CHUNK_SIZE,
            model_folders: ModelFolders::default(),
        }
    }
}

impl VoiceboxConfig {
    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for malformed TOML.
    pub fn from_toml_str(source: &str) -> VoiceboxResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Apply overrides from a variable lookup such as `std::env::var`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_MODELS_DIR) {
            self.models_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_VOICES_DIR) {
            self.voices_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_SCRATCH_DIR) {
            self.scratch_dir = Some(PathBuf::from(dir));
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Directory under which scratch areas are created
    #[must_use]
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Check limits and folder names
    ///
    /// # Errors
    ///
    /// Returns `Configuration` describing the first invalid value.
    pub fn validate(&self) -> VoiceboxResult<()> {
        if self.max_text_length == 0 {
            return Err(VoiceboxError::configuration("max_text_length must be greater than 0"));
        }
        if self.default_chunk_size == 0 {
            return Err(VoiceboxError::configuration("default_chunk_size must be greater than 0"));
        }
        if let Some((family, variant, _)) = self
            .model_folders
            .iter()
            .find(|(_, _, folder)| folder.trim().is_empty() || Path::new(folder).is_absolute())
        {
            return Err(VoiceboxError::configuration(format!(
                "model_folders.{family}_{variant} must be a non-empty relative folder name"
            )));
        }
        Ok(())
    }
}
