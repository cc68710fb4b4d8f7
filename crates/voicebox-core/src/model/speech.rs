// Call contracts for the external speech engine

use std::path::{Path, PathBuf};

use super::types::{ModelFamily, ModelVariant};
use crate::audio::AudioBuffer;
use crate::error::VoiceboxResult;

/// Parameters for one engine call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Text to synthesize, passed through unchanged
    pub text: String,
    /// Language name such as `Auto` or `English`
    pub language: String,
    /// Speaking rate multiplier
    pub speed: f32,
    /// Preset speaker, custom-voice family only
    pub speaker: Option<String>,
    /// Style instruction or voice description
    pub instruct: Option<String>,
    /// Staged reference audio file, base family only
    pub ref_audio: Option<PathBuf>,
    /// Transcript of the reference audio
    pub ref_text: Option<String>,
    /// Clone from the speaker embedding alone
    pub x_vector_only: bool,
}

impl GenerationRequest {
    /// Request with default language and speed and no voice parameters
    #[must_use]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            language: crate::DEFAULT_LANGUAGE.to_string(),
            speed: crate::DEFAULT_SPEED,
            speaker: None,
            instruct: None,
            ref_audio: None,
            ref_text: None,
            x_vector_only: false,
        }
    }

    /// Same parameters with different text
    #[must_use]
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// A loaded model instance
///
/// Owned exclusively by the [`ModelCache`](super::ModelCache); callers only
/// ever borrow it.
pub trait SpeechModel: Send + std::fmt::Debug {
    /// Synthesize `request` using `workdir` as scratch space
    ///
    /// `workdir` is created before the call and removed after it returns.
    ///
    /// # Errors
    ///
    /// Returns `GenerationFailure` when the engine raises or yields no audio.
    fn synthesize(
        &mut self,
        request: &GenerationRequest,
        workdir: &Path,
    ) -> VoiceboxResult<AudioBuffer>;

    /// Reset the engine's randomness source to `seed`
    fn reseed(&mut self, seed: u64);

    /// Release engine resources ahead of drop
    fn unload(&mut self);
}

/// Loads model instances from a resolved directory
pub trait ModelLoader: Send + Sync + std::fmt::Debug {
    /// Load the model at `path`; blocking and potentially slow
    ///
    /// # Errors
    ///
    /// Returns an error if the model files cannot be loaded.
    fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
        path: &Path,
    ) -> VoiceboxResult<Box<dyn SpeechModel>>;
}
