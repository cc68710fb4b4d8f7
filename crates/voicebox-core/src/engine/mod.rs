//! Synthesis orchestration: single-shot generation, chunked streaming and
//! transcription of reference audio.

mod request;
mod stream;
mod synthesizer;

pub use request::{
    ReferenceAudio, ReferenceSource, StreamEvent, StreamRequest, SynthesisRequest, VoiceMode,
};
pub use stream::StreamSession;
pub use synthesizer::{Synthesizer, Transcriber};
