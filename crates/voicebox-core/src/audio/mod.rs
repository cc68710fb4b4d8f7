//! Audio buffers and the PCM WAV codec used for every audio payload.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::VoiceboxResult;

pub mod wav;

/// Normalized floating-point samples produced by a speech engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    /// Mono samples, expected in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new buffer
    #[must_use]
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a WAV byte stream
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be written.
    pub fn to_wav(&self) -> VoiceboxResult<Vec<u8>> {
        wav::encode(&self.samples, self.sample_rate)
    }

    /// Encode as WAV and wrap in standard base64
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be written.
    pub fn to_base64_wav(&self) -> VoiceboxResult<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_wav()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let audio = AudioBuffer::new(vec![0.0; 12_000], 24_000);
        assert!((audio.duration_secs() - 0.5).abs() < f32::EPSILON);
        assert!(!audio.is_empty());
        assert!(AudioBuffer::new(Vec::new(), 0).duration_secs().abs() < f32::EPSILON);
    }

    #[test]
    fn test_base64_wraps_wav() {
        let audio = AudioBuffer::new(vec![0.25, -0.25], 24_000);
        let encoded = audio.to_base64_wav().unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(bytes, audio.to_wav().unwrap());
    }
}
