// Synthesis request types

use serde::{Deserialize, Serialize};

use crate::model::ModelFamily;

/// Reference voice material for cloning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    /// Audio supplied with the request
    Inline(ReferenceAudio),
    /// A stored voice prompt
    Prompt {
        /// Stored prompt identifier
        prompt_id: String,
    },
}

/// Inline reference audio and its transcript
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceAudio {
    /// WAV bytes
    pub audio: Vec<u8>,
    /// Transcript; `.` is passed to the engine when absent
    pub ref_text: Option<String>,
    /// Clone from the speaker embedding alone
    pub x_vector_only: bool,
}

/// Synthesis mode and its mode-specific parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceMode {
    /// Preset speaker with an optional style instruction
    CustomVoice {
        /// Preset speaker name
        speaker: String,
        /// Style instruction; `Normal tone` when empty
        instruct: Option<String>,
    },
    /// Voice described in natural language
    VoiceDesign {
        /// Voice description, required
        instruct: String,
    },
    /// Reference-audio cloning
    Clone {
        /// Reference material; requests without one are rejected
        reference: Option<ReferenceSource>,
    },
}

impl VoiceMode {
    /// Model family serving this mode
    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::CustomVoice { .. } => ModelFamily::CustomVoice,
            Self::VoiceDesign { .. } => ModelFamily::VoiceDesign,
            Self::Clone { .. } => ModelFamily::Base,
        }
    }

    /// Clone from inline audio
    #[must_use]
    pub fn clone_inline(reference: ReferenceAudio) -> Self {
        Self::Clone {
            reference: Some(ReferenceSource::Inline(reference)),
        }
    }

    /// Clone from a stored prompt
    #[must_use]
    pub fn clone_prompt<S: Into<String>>(prompt_id: S) -> Self {
        Self::Clone {
            reference: Some(ReferenceSource::Prompt {
                prompt_id: prompt_id.into(),
            }),
        }
    }
}

/// Single-shot synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    /// Text to synthesize
    pub text: String,
    /// Language name, `Auto` by default
    pub language: String,
    /// Speaking rate, 0.1 to 3.0
    pub speed: f32,
    /// Mode and its parameters
    pub mode: VoiceMode,
}

impl SynthesisRequest {
    /// Request with default language and speed
    #[must_use]
    pub fn new<S: Into<String>>(text: S, mode: VoiceMode) -> Self {
        Self {
            text: text.into(),
            language: crate::DEFAULT_LANGUAGE.to_string(),
            speed: crate::DEFAULT_SPEED,
            mode,
        }
    }

    /// Set the language
    #[must_use]
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }

    /// Set the speaking rate
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Chunked streaming request
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    /// Text, mode and voice parameters shared by every chunk
    pub synthesis: SynthesisRequest,
    /// Maximum characters per chunk; configured default when unset
    pub chunk_size: Option<usize>,
    /// Seed applied before every chunk
    pub seed: Option<u64>,
}

impl StreamRequest {
    /// Stream with the default chunk size and no seed
    #[must_use]
    pub const fn new(synthesis: SynthesisRequest) -> Self {
        Self {
            synthesis,
            chunk_size: None,
            seed: None,
        }
    }

    /// Set the chunk size
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Set the per-chunk seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One event of a streaming session
///
/// Sessions emit `start`, `chunk` per chunk in order, then `done`; or are
/// cut short by a single `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Session accepted
    Start {
        /// Number of chunks that will follow
        total_chunks: usize,
        /// Character count of the input text
        total_chars: usize,
        /// Display name of the stored prompt, when one is used
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice_name: Option<String>,
    },
    /// One synthesized chunk
    Chunk {
        /// Zero-based position
        chunk_index: usize,
        /// Number of chunks in the session
        total_chunks: usize,
        /// Base64 WAV
        audio: String,
        /// Sample rate of `audio`
        sample_rate: u32,
        /// Source text of this chunk
        text: String,
    },
    /// All chunks delivered
    Done {
        /// Number of chunks delivered
        total_chunks: usize,
    },
    /// Session failed; nothing follows
    Error {
        /// Human-readable message
        error: String,
    },
}

impl StreamEvent {
    /// Whether this event ends the session
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
