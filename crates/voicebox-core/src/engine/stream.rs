//! Streaming sessions.
//!
//! A [`StreamSession`] is a finite iterator of [`StreamEvent`]s. The first
//! call to `next` validates the request, acquires the model and stages the
//! reference audio; each following call synthesizes one chunk. The model
//! stays locked for the life of the session and is released, together with
//! the staged reference, as soon as the session ends or is dropped.

use std::iter::FusedIterator;

use parking_lot::{MappedMutexGuard, MutexGuard};

use super::request::{StreamEvent, StreamRequest};
use super::synthesizer::{StagedReference, Synthesizer};
use crate::error::{VoiceboxError, VoiceboxResult};
use crate::model::{GenerationRequest, SpeechModel};

type ModelLease<'a> = MappedMutexGuard<'a, dyn SpeechModel>;

/// Ephemeral state of one streaming request
pub struct StreamSession<'a> {
    synthesizer: &'a Synthesizer,
    state: SessionState<'a>,
}

enum SessionState<'a> {
    Pending(StreamRequest),
    Running(Box<ActiveStream<'a>>),
    Finished,
}

struct ActiveStream<'a> {
    model: ModelLease<'a>,
    // held so the staged file outlives every chunk
    _reference: Option<StagedReference>,
    generation: GenerationRequest,
    chunks: Vec<String>,
    next_index: usize,
    seed: Option<u64>,
}

impl<'a> StreamSession<'a> {
    pub(crate) const fn new(synthesizer: &'a Synthesizer, request: StreamRequest) -> Self {
        Self {
            synthesizer,
            state: SessionState::Pending(request),
        }
    }

    /// Whether the session has emitted its final event
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Finished)
    }

    fn start(&self, request: StreamRequest) -> VoiceboxResult<(ActiveStream<'a>, StreamEvent)> {
        let synthesizer = self.synthesizer;
        let resolved = synthesizer.resolve(&request.synthesis)?;
        let chunk_size = synthesizer.chunk_size_for(request.chunk_size)?;

        let mut cache = synthesizer.cache().lock();
        cache.acquire(resolved.family)?;
        let model = MutexGuard::try_map(cache, |cache| cache.resident_model_mut())
            .map_err(|_| VoiceboxError::model_unavailable(resolved.family))?;

        let reference = synthesizer.stage_reference(resolved.reference_audio.as_deref())?;
        let mut generation = resolved.generation;
        generation.ref_audio = reference.as_ref().map(|r| r.path().to_path_buf());

        let text = &request.synthesis.text;
        let chunks = crate::chunker::chunk(text, chunk_size);
        let total_chars = text.chars().count();
        tracing::info!(
            "Streaming {} chunks from {} chars with {} model",
            chunks.len(),
            total_chars,
            resolved.family
        );

        let start = StreamEvent::Start {
            total_chunks: chunks.len(),
            total_chars,
            voice_name: resolved.voice_name,
        };
        let active = ActiveStream {
            model,
            _reference: reference,
            generation,
            chunks,
            next_index: 0,
            seed: request.seed,
        };
        Ok((active, start))
    }
}

impl ActiveStream<'_> {
    fn total(&self) -> usize {
        self.chunks.len()
    }

    fn next_chunk(&mut self, synthesizer: &Synthesizer) -> VoiceboxResult<StreamEvent> {
        let index = self.next_index;
        let text = self.chunks[index].clone();
        tracing::info!(
            "Generating chunk {}/{}: {} chars",
            index + 1,
            self.total(),
            text.chars().count()
        );

        // every chunk starts from the same seed state
        if let Some(seed) = self.seed {
            self.model.reseed(seed);
        }

        let generation = self.generation.with_text(text.as_str());
        let audio = synthesizer.run(&mut *self.model, &generation)?;
        self.next_index += 1;

        Ok(StreamEvent::Chunk {
            chunk_index: index,
            total_chunks: self.total(),
            audio: audio.to_base64_wav()?,
            sample_rate: audio.sample_rate,
            text,
        })
    }
}

impl Iterator for StreamSession<'_> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        let (state, event) = match std::mem::replace(&mut self.state, SessionState::Finished) {
            SessionState::Finished => return None,
            SessionState::Pending(request) => match self.start(request) {
                Ok((active, start)) => (SessionState::Running(Box::new(active)), start),
                Err(err) => (SessionState::Finished, failure(&err)),
            },
            SessionState::Running(mut active) => {
                if active.next_index < active.total() {
                    match active.next_chunk(self.synthesizer) {
                        Ok(chunk) => (SessionState::Running(active), chunk),
                        Err(err) => (SessionState::Finished, failure(&err)),
                    }
                } else {
                    tracing::info!("Stream done after {} chunks", active.total());
                    let done = StreamEvent::Done {
                        total_chunks: active.total(),
                    };
                    (SessionState::Finished, done)
                }
            }
        };

        self.state = state;
        Some(event)
    }
}

impl FusedIterator for StreamSession<'_> {}

fn failure(err: &VoiceboxError) -> StreamEvent {
    tracing::error!("Streaming session failed ({}): {}", err.category(), err);
    StreamEvent::Error {
        error: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBuffer;
    use crate::config::VoiceboxConfig;
    use crate::engine::{ReferenceAudio, SynthesisRequest, VoiceMode};
    use crate::model::{ModelFamily, ModelFolders, ModelLoader, ModelVariant};
    use crate::prompts::VoicePromptStore;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FailingAfter {
        remaining: usize,
    }

    impl SpeechModel for FailingAfter {
        fn synthesize(&mut self, _: &GenerationRequest, _: &Path) -> VoiceboxResult<AudioBuffer> {
            if self.remaining == 0 {
                return Err(VoiceboxError::generation("engine exploded"));
            }
            self.remaining -= 1;
            Ok(AudioBuffer::new(vec![0.1; 8], 24_000))
        }
        fn reseed(&mut self, _: u64) {}
        fn unload(&mut self) {}
    }

    #[derive(Debug)]
    struct FailingLoader(usize);

    impl ModelLoader for FailingLoader {
        fn load(&self, _: ModelFamily, _: ModelVariant, _: &Path) -> VoiceboxResult<Box<dyn SpeechModel>> {
            Ok(Box::new(FailingAfter { remaining: self.0 }))
        }
    }

    fn synthesizer(root: &TempDir, succeed: usize) -> Synthesizer {
        let config = VoiceboxConfig {
            models_dir: root.path().join("models"),
            voices_dir: root.path().join("voices"),
            scratch_dir: Some(root.path().join("scratch")),
            ..VoiceboxConfig::default()
        };
        let folder = ModelFolders::default().base_lite;
        std::fs::create_dir_all(config.models_dir.join(folder)).unwrap();
        let prompts = Arc::new(VoicePromptStore::open(&config.voices_dir).unwrap());
        Synthesizer::new(&config, Arc::new(FailingLoader(succeed)), prompts)
    }

    fn clone_request(text: &str) -> StreamRequest {
        StreamRequest::new(SynthesisRequest::new(
            text,
            VoiceMode::clone_inline(ReferenceAudio {
                audio: vec![0; 4],
                ..ReferenceAudio::default()
            }),
        ))
        .with_chunk_size(10)
    }

    #[test]
    fn test_mid_stream_failure_truncates() {
        let root = TempDir::new().unwrap();
        let synth = synthesizer(&root, 1);

        let events: Vec<_> = synth.stream(clone_request("First one. Second one. Third.")).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::Start { total_chunks: 3, .. }));
        assert!(matches!(events[1], StreamEvent::Chunk { chunk_index: 0, .. }));
        assert_eq!(
            events[2],
            StreamEvent::Error {
                error: "Generation failed: engine exploded".to_string()
            }
        );

        // model lease and staged reference are gone
        assert!(synth.resident().is_some());
        assert_eq!(std::fs::read_dir(root.path().join("scratch")).unwrap().count(), 0);
    }

    #[test]
    fn test_session_is_fused() {
        let root = TempDir::new().unwrap();
        let synth = synthesizer(&root, 10);

        let mut session = synth.stream(clone_request("Only one."));
        while session.next().is_some() {}
        assert!(session.is_finished());
        assert!(session.next().is_none());
    }

    #[test]
    fn test_zero_chunk_size_is_error_event() {
        let root = TempDir::new().unwrap();
        let synth = synthesizer(&root, 10);

        let events: Vec<_> = synth.stream(clone_request("Hi.").with_chunk_size(0)).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }

    #[test]
    fn test_dropping_session_releases_model() {
        let root = TempDir::new().unwrap();
        let synth = synthesizer(&root, 10);

        let mut session = synth.stream(clone_request("One. Two."));
        assert!(matches!(session.next(), Some(StreamEvent::Start { .. })));
        drop(session);

        // would deadlock if the lease were still held
        assert!(synth.resident().is_some());
    }
}
