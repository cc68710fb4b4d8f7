//! Preset speakers and supported languages for the custom-voice family.

use serde::{Deserialize, Serialize};

use crate::error::{VoiceboxError, VoiceboxResult};

/// A preset speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Speaker name as passed to the engine
    pub name: String,
    /// Short description of the timbre
    pub description: String,
    /// Language the speaker was recorded in
    pub native_language: String,
}

impl Speaker {
    fn new(name: &str, description: &str, native_language: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            native_language: native_language.to_string(),
        }
    }
}

/// Read-only list of preset speakers and languages
#[derive(Debug, Clone)]
pub struct SpeakerCatalog {
    speakers: Vec<Speaker>,
    languages: Vec<String>,
}

impl SpeakerCatalog {
    /// Catalog with the built-in speakers and languages
    #[must_use]
    pub fn new() -> Self {
        let speakers = vec![
            Speaker::new("Vivian", "Bright, slightly edgy young female voice", "Chinese"),
            Speaker::new("Serena", "Warm, gentle young female voice", "Chinese"),
            Speaker::new("Uncle_Fu", "Seasoned male voice with a low, mellow timbre", "Chinese"),
            Speaker::new("Dylan", "Youthful Beijing male voice with a clear, natural timbre", "Chinese"),
            Speaker::new("Eric", "Lively Chengdu male voice with a slightly husky brightness", "Chinese"),
            Speaker::new("Ryan", "Dynamic male voice with strong rhythmic drive", "English"),
            Speaker::new("Aiden", "Sunny American male voice with a clear midrange", "English"),
            Speaker::new("Ono_Anna", "Playful Japanese female voice with a light, nimble timbre", "Japanese"),
            Speaker::new("Sohee", "Warm Korean female voice with rich emotion", "Korean"),
        ];

        let languages = [
            "Auto", "Chinese", "English", "Japanese", "Korean", "German", "French", "Russian",
            "Portuguese", "Spanish", "Italian",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            speakers,
            languages,
        }
    }

    /// All preset speakers in display order
    #[must_use]
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// All supported language names, `Auto` first
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Look up a speaker by exact name
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if no preset speaker has that name.
    pub fn speaker(&self, name: &str) -> VoiceboxResult<&Speaker> {
        self.speakers
            .iter()
            .find(|speaker| speaker.name == name)
            .ok_or_else(|| VoiceboxError::invalid_request(format!("Unknown speaker: {name}")))
    }

    /// Canonical spelling of `language`, matched case-insensitively
    #[must_use]
    pub fn language(&self, language: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.eq_ignore_ascii_case(language.trim()))
            .map(String::as_str)
    }
}

impl Default for SpeakerCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = SpeakerCatalog::new();
        assert_eq!(catalog.speakers().len(), 9);
        assert_eq!(catalog.languages().len(), 11);
        assert_eq!(catalog.languages()[0], "Auto");
        assert!(catalog.speaker(crate::DEFAULT_SPEAKER).is_ok());
    }

    #[test]
    fn test_lookup() {
        let catalog = SpeakerCatalog::new();
        assert_eq!(catalog.speaker("Ono_Anna").unwrap().native_language, "Japanese");
        assert!(matches!(
            catalog.speaker("Nobody"),
            Err(VoiceboxError::InvalidRequest { .. })
        ));
        assert_eq!(catalog.language("korean"), Some("Korean"));
        assert_eq!(catalog.language("Klingon"), None);
    }
}
