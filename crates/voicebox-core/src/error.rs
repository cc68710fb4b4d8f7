//! Error types for the Voicebox synthesis core.

use crate::model::ModelFamily;

/// Result type alias for Voicebox operations
pub type VoiceboxResult<T> = Result<T, VoiceboxError>;

/// Main error type for Voicebox operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceboxError {
    /// Neither the lite nor the pro variant of a family is present on disk
    #[error("No {family} model found. Please run the install script.")]
    ModelUnavailable {
        /// The family that could not be resolved
        family: ModelFamily,
    },

    /// Request is missing mode-specific fields or carries invalid values
    #[error("{message}")]
    InvalidRequest {
        /// Error message describing the invalid input
        message: String,
    },

    /// Unknown voice prompt identifier
    #[error("Prompt ID not found: {prompt_id}")]
    PromptNotFound {
        /// The prompt ID that was not found
        prompt_id: String,
    },

    /// The speech engine raised or produced no usable output
    #[error("Generation failed: {message}")]
    GenerationFailure {
        /// Error message describing the failure
        message: String,
    },

    /// Disk read or write error in the prompt store or a scratch area
    #[error("Persistence error: {message}")]
    PersistenceFailure {
        /// Error message describing the file operation failure
        message: String,
    },

    /// WAV container could not be read or written
    #[error("Audio format error: {message}")]
    AudioFormat {
        /// Error message describing the codec issue
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl VoiceboxError {
    /// Create a new model unavailable error
    #[must_use]
    pub const fn model_unavailable(family: ModelFamily) -> Self {
        Self::ModelUnavailable { family }
    }

    /// Create a new invalid request error
    #[must_use]
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new prompt not found error
    #[must_use]
    pub fn prompt_not_found<S: Into<String>>(prompt_id: S) -> Self {
        Self::PromptNotFound {
            prompt_id: prompt_id.into(),
        }
    }

    /// Create a new generation failure
    #[must_use]
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::GenerationFailure {
            message: message.into(),
        }
    }

    /// Create a new persistence failure
    #[must_use]
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::PersistenceFailure {
            message: message.into(),
        }
    }

    /// Create a new audio format error
    #[must_use]
    pub fn audio_format<S: Into<String>>(message: S) -> Self {
        Self::AudioFormat {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this error is due to invalid user input
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::PromptNotFound { .. } | Self::AudioFormat { .. }
        )
    }

    /// Get the error category for logging
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ModelUnavailable { .. } => "model",
            Self::InvalidRequest { .. } => "request",
            Self::PromptNotFound { .. } => "prompt",
            Self::GenerationFailure { .. } => "generation",
            Self::PersistenceFailure { .. } => "persistence",
            Self::AudioFormat { .. } => "audio_format",
            Self::Configuration { .. } => "configuration",
        }
    }
}

impl From<std::io::Error> for VoiceboxError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<serde_json::Error> for VoiceboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(format!("JSON serialization error: {err}"))
    }
}

impl From<hound::Error> for VoiceboxError {
    fn from(err: hound::Error) -> Self {
        Self::audio_format(err.to_string())
    }
}

impl From<toml::de::Error> for VoiceboxError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("Invalid TOML: {err}"))
    }
}

impl From<base64::DecodeError> for VoiceboxError {
    fn from(err: base64::DecodeError) -> Self {
        Self::invalid_request(format!("Invalid base64 audio payload: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoiceboxError::prompt_not_found("abc");
        assert_eq!(err.to_string(), "Prompt ID not found: abc");

        let err = VoiceboxError::model_unavailable(ModelFamily::Base);
        assert_eq!(err.to_string(), "No base model found. Please run the install script.");

        let err = VoiceboxError::invalid_request("Either ref_audio_url or ref_audio_base64 must be provided");
        assert_eq!(err.to_string(), "Either ref_audio_url or ref_audio_base64 must be provided");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(VoiceboxError::model_unavailable(ModelFamily::VoiceDesign).category(), "model");
        assert_eq!(VoiceboxError::invalid_request("x").category(), "request");
        assert_eq!(VoiceboxError::prompt_not_found("x").category(), "prompt");
        assert_eq!(VoiceboxError::generation("x").category(), "generation");
        assert_eq!(VoiceboxError::persistence("x").category(), "persistence");
        assert_eq!(VoiceboxError::audio_format("x").category(), "audio_format");
        assert_eq!(VoiceboxError::configuration("x").category(), "configuration");
    }

    #[test]
    fn test_user_errors() {
        assert!(VoiceboxError::invalid_request("x").is_user_error());
        assert!(VoiceboxError::prompt_not_found("x").is_user_error());
        assert!(VoiceboxError::audio_format("x").is_user_error());
        assert!(!VoiceboxError::generation("x").is_user_error());
        assert!(!VoiceboxError::persistence("x").is_user_error());
        assert!(!VoiceboxError::model_unavailable(ModelFamily::Base).is_user_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = VoiceboxError::from(io_err);
        assert!(matches!(err, VoiceboxError::PersistenceFailure { .. }));
    }

    #[test]
    fn test_from_base64_error() {
        use base64::Engine;
        let decode_err = base64::engine::general_purpose::STANDARD
            .decode("not base64!!")
            .unwrap_err();
        assert!(matches!(
            VoiceboxError::from(decode_err),
            VoiceboxError::InvalidRequest { .. }
        ));
    }
}
