//! # Voicebox Core
//!
//! Orchestration around an external text-to-speech engine.
//!
//! ## Features
//!
//! - Single-slot model cache with lite/pro variant fallback
//! - Sentence-respecting text chunking for long input
//! - Mono 16-bit PCM WAV encoding and decoding
//! - Disk-backed store of reusable voice prompts
//! - Single-shot and chunked streaming synthesis
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voicebox_core::{
//!     ModelLoader, StreamEvent, StreamRequest, SynthesisRequest, Synthesizer, VoiceMode,
//!     VoicePromptStore, VoiceboxConfig,
//! };
//!
//! fn run(loader: Arc<dyn ModelLoader>) -> voicebox_core::VoiceboxResult<()> {
//!     let config = VoiceboxConfig::default();
//!     let prompts = Arc::new(VoicePromptStore::open(&config.voices_dir)?);
//!     let synthesizer = Synthesizer::new(&config, loader, prompts);
//!
//!     let request = SynthesisRequest::new(
//!         "A long story. With many sentences.",
//!         VoiceMode::clone_prompt("3f0c..."),
//!     );
//!     for event in synthesizer.stream(StreamRequest::new(request).with_seed(42)) {
//!         if let StreamEvent::Error { error } = event {
//!             eprintln!("stream failed: {error}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod audio;
pub mod catalog;
pub mod chunker;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod prompts;

// Re-export main types for convenience
pub use audio::AudioBuffer;
pub use catalog::{Speaker, SpeakerCatalog};
pub use config::VoiceboxConfig;
pub use engine::{
    ReferenceAudio, ReferenceSource, StreamEvent, StreamRequest, StreamSession, SynthesisRequest,
    Synthesizer, Transcriber, VoiceMode,
};
pub use error::{VoiceboxError, VoiceboxResult};
pub use model::{
    GenerationRequest, ModelCache, ModelFamily, ModelFolders, ModelLoader, ModelVariant,
    SpeechModel, VariantStatus,
};
pub use prompts::{NewPrompt, PromptDetail, PromptSummary, VoicePrompt, VoicePromptStore};

/// Version information for the voicebox-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sample rate reported when an engine does not say otherwise (24 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Maximum text length for synthesis, in characters
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Default maximum characters per streaming chunk
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default request language
pub const DEFAULT_LANGUAGE: &str = "Auto";

/// Default preset speaker
pub const DEFAULT_SPEAKER: &str = "Vivian";

/// Style instruction used when a custom-voice request gives none
pub const DEFAULT_INSTRUCT: &str = "Normal tone";

/// Transcript passed to the engine when a clone reference has none
pub const PLACEHOLDER_REF_TEXT: &str = ".";

/// Default speaking rate
pub const DEFAULT_SPEED: f32 = 1.0;

/// Slowest accepted speaking rate
pub const MIN_SPEED: f32 = 0.1;

/// Fastest accepted speaking rate
pub const MAX_SPEED: f32 = 3.0;
