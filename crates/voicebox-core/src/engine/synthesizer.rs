// Synthesizer: validation, model acquisition and scratch-dir scoping

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use super::request::{ReferenceSource, StreamRequest, SynthesisRequest, VoiceMode};
use super::stream::StreamSession;
use crate::audio::AudioBuffer;
use crate::catalog::SpeakerCatalog;
use crate::config::VoiceboxConfig;
use crate::error::{VoiceboxError, VoiceboxResult};
use crate::model::{
    probe_all, GenerationRequest, ModelCache, ModelFamily, ModelFolders, ModelLoader,
    ResidentInfo, SpeechModel, VariantStatus,
};
use crate::prompts::VoicePromptStore;

/// External speech-to-text collaborator
#[cfg_attr(test, mockall::automock)]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio_path`
    ///
    /// # Errors
    ///
    /// Returns an error if transcription fails.
    fn transcribe(&self, audio_path: &Path) -> VoiceboxResult<String>;
}

const REFERENCE_FILE: &str = "reference.wav";

/// Reference audio written to a scratch directory for the engine to read
///
/// The directory is removed on drop.
#[derive(Debug)]
pub(crate) struct StagedReference {
    _dir: TempDir,
    path: PathBuf,
}

impl StagedReference {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// A validated request, ready for the engine
#[derive(Debug)]
pub(crate) struct ResolvedVoice {
    pub(crate) family: ModelFamily,
    /// Engine parameters; `ref_audio` is filled in once staged
    pub(crate) generation: GenerationRequest,
    pub(crate) reference_audio: Option<Vec<u8>>,
    /// Prompt display name, when a stored prompt is used
    pub(crate) voice_name: Option<String>,
}

/// Top-level synthesis orchestrator
///
/// Owns the model cache behind a mutex: one heavyweight request, single-shot
/// or streaming, holds the model at a time.
pub struct Synthesizer {
    cache: Mutex<ModelCache>,
    prompts: Arc<VoicePromptStore>,
    catalog: SpeakerCatalog,
    transcriber: Option<Arc<dyn Transcriber>>,
    models_dir: PathBuf,
    model_folders: ModelFolders,
    scratch_root: PathBuf,
    max_text_length: usize,
    default_chunk_size: usize,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("scratch_root", &self.scratch_root)
            .field("max_text_length", &self.max_text_length)
            .field("default_chunk_size", &self.default_chunk_size)
            .field("transcriber", &self.transcriber.is_some())
            .finish_non_exhaustive()
    }
}

impl Synthesizer {
    /// Create a synthesizer over `prompts`, loading models with `loader`
    #[must_use]
    pub fn new(
        config: &VoiceboxConfig,
        loader: Arc<dyn ModelLoader>,
        prompts: Arc<VoicePromptStore>,
    ) -> Self {
        Self {
            cache: Mutex::new(ModelCache::new(
                config.models_dir.clone(),
                config.model_folders.clone(),
                loader,
            )),
            prompts,
            catalog: SpeakerCatalog::new(),
            transcriber: None,
            models_dir: config.models_dir.clone(),
            model_folders: config.model_folders.clone(),
            scratch_root: config.scratch_root(),
            max_text_length: config.max_text_length,
            default_chunk_size: config.default_chunk_size,
        }
    }

    /// Attach a transcription collaborator
    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Voice prompt store
    #[must_use]
    pub fn prompts(&self) -> &VoicePromptStore {
        &self.prompts
    }

    /// Preset speakers and languages
    #[must_use]
    pub const fn catalog(&self) -> &SpeakerCatalog {
        &self.catalog
    }

    /// Whether a transcriber is attached
    #[must_use]
    pub fn can_transcribe(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Currently resident model, if any
    ///
    /// Blocks while a request holds the model.
    #[must_use]
    pub fn resident(&self) -> Option<ResidentInfo> {
        self.cache.lock().resident()
    }

    /// Availability of every model variant on disk
    ///
    /// Does not wait for the model lock.
    #[must_use]
    pub fn probe_models(&self) -> Vec<VariantStatus> {
        probe_all(&self.models_dir, &self.model_folders)
    }

    /// Release any resident model
    pub fn evict_all(&self) {
        self.cache.lock().evict_all();
    }

    /// Synthesize the full text in one engine call
    ///
    /// Blocks for the duration of model loading and generation.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` or `PromptNotFound` before any model work,
    /// `ModelUnavailable` if the family is not installed, and
    /// `GenerationFailure` if the engine fails or returns no audio.
    pub fn synthesize(&self, request: &SynthesisRequest) -> VoiceboxResult<AudioBuffer> {
        let resolved = self.resolve(request)?;
        let text_chars = request.text.chars().count();
        tracing::info!("Synthesizing {} chars with {} model", text_chars, resolved.family);

        let mut cache = self.cache.lock();
        let model = cache.acquire(resolved.family)?;

        let staged = self.stage_reference(resolved.reference_audio.as_deref())?;
        let mut generation = resolved.generation;
        generation.ref_audio = staged.as_ref().map(|s| s.path().to_path_buf());

        let audio = self.run(model, &generation)?;
        tracing::info!(
            "Generated {:.2}s of audio at {} Hz",
            audio.duration_secs(),
            audio.sample_rate
        );
        Ok(audio)
    }

    /// Start a chunked streaming session
    ///
    /// Nothing happens until the session is iterated. Every failure,
    /// validation included, surfaces as one final `error` event.
    #[must_use]
    pub fn stream(&self, request: StreamRequest) -> StreamSession<'_> {
        StreamSession::new(self, request)
    }

    /// Transcribe reference audio with the attached transcriber
    ///
    /// # Errors
    ///
    /// `Configuration` if no transcriber is attached, `InvalidRequest` for
    /// empty audio, or the transcriber's own error.
    pub fn transcribe(&self, audio: &[u8]) -> VoiceboxResult<String> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            VoiceboxError::configuration("Transcription is not configured on this server")
        })?;
        if audio.is_empty() {
            return Err(VoiceboxError::invalid_request("Audio payload is empty"));
        }

        let staged = self.write_scratch_file(audio)?;
        let text = transcriber.transcribe(staged.path())?;
        Ok(text.trim().to_string())
    }

    pub(crate) fn chunk_size_for(&self, requested: Option<usize>) -> VoiceboxResult<usize> {
        match requested {
            Some(0) => Err(VoiceboxError::invalid_request("chunk_size must be greater than 0")),
            Some(size) => Ok(size),
            None => Ok(self.default_chunk_size),
        }
    }

    pub(crate) const fn cache(&self) -> &Mutex<ModelCache> {
        &self.cache
    }

    /// Validate `request` and look up any stored prompt
    pub(crate) fn resolve(&self, request: &SynthesisRequest) -> VoiceboxResult<ResolvedVoice> {
        if request.text.trim().is_empty() {
            return Err(VoiceboxError::invalid_request("Text cannot be empty"));
        }
        let text_chars = request.text.chars().count();
        if text_chars > self.max_text_length {
            return Err(VoiceboxError::invalid_request(format!(
                "Text too long: {text_chars} characters (max {})",
                self.max_text_length
            )));
        }
        if !request.speed.is_finite() || !(crate::MIN_SPEED..=crate::MAX_SPEED).contains(&request.speed) {
            return Err(VoiceboxError::invalid_request(format!(
                "Speed must be between {} and {}",
                crate::MIN_SPEED,
                crate::MAX_SPEED
            )));
        }
        let language = self.catalog.language(&request.language).ok_or_else(|| {
            VoiceboxError::invalid_request(format!("Unsupported language: {}", request.language))
        })?;

        let mut generation = GenerationRequest::new(request.text.clone());
        generation.language = language.to_string();
        generation.speed = request.speed;

        let mut reference_audio = None;
        let mut voice_name = None;

        match &request.mode {
            VoiceMode::CustomVoice { speaker, instruct } => {
                let speaker = self.catalog.speaker(speaker)?;
                generation.speaker = Some(speaker.name.clone());
                generation.instruct = Some(
                    non_empty(instruct.as_deref())
                        .unwrap_or(crate::DEFAULT_INSTRUCT)
                        .to_string(),
                );
            }
            VoiceMode::VoiceDesign { instruct } => {
                let instruct = non_empty(Some(instruct)).ok_or_else(|| {
                    VoiceboxError::invalid_request("Voice design requires a non-empty instruct description")
                })?;
                generation.instruct = Some(instruct.to_string());
            }
            VoiceMode::Clone { reference } => match reference {
                None => {
                    return Err(VoiceboxError::invalid_request(
                        "Either ref_audio_url or ref_audio_base64 must be provided",
                    ))
                }
                Some(ReferenceSource::Inline(inline)) => {
                    if inline.audio.is_empty() {
                        return Err(VoiceboxError::invalid_request("Reference audio is empty"));
                    }
                    generation.ref_text = Some(reference_text(inline.ref_text.as_deref()));
                    generation.x_vector_only = inline.x_vector_only;
                    reference_audio = Some(inline.audio.clone());
                }
                Some(ReferenceSource::Prompt { prompt_id }) => {
                    let prompt = self.prompts.get(prompt_id)?;
                    generation.ref_text = Some(reference_text(prompt.ref_text.as_deref()));
                    generation.x_vector_only = prompt.x_vector_only;
                    reference_audio = Some(prompt.ref_audio.clone());
                    voice_name = Some(prompt.name.clone());
                }
            },
        }

        Ok(ResolvedVoice {
            family: request.mode.family(),
            generation,
            reference_audio,
            voice_name,
        })
    }

    /// Run one engine call in a fresh scratch directory
    pub(crate) fn run(
        &self,
        model: &mut dyn SpeechModel,
        generation: &GenerationRequest,
    ) -> VoiceboxResult<AudioBuffer> {
        let workdir = self.scratch_dir()?;
        let audio = model.synthesize(generation, workdir.path())?;
        if audio.is_empty() {
            return Err(VoiceboxError::generation("Audio generation failed - no output"));
        }
        Ok(audio)
    }

    pub(crate) fn stage_reference(
        &self,
        audio: Option<&[u8]>,
    ) -> VoiceboxResult<Option<StagedReference>> {
        audio.map(|bytes| self.write_scratch_file(bytes)).transpose()
    }

    fn write_scratch_file(&self, bytes: &[u8]) -> VoiceboxResult<StagedReference> {
        let dir = self.scratch_dir()?;
        let path = dir.path().join(REFERENCE_FILE);
        std::fs::write(&path, bytes).map_err(|e| {
            VoiceboxError::persistence(format!("Failed to stage reference audio: {e}"))
        })?;
        Ok(StagedReference { _dir: dir, path })
    }

    fn scratch_dir(&self) -> VoiceboxResult<TempDir> {
        std::fs::create_dir_all(&self.scratch_root)?;
        tempfile::Builder::new()
            .prefix("voicebox-")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| VoiceboxError::persistence(format!("Failed to create scratch directory: {e}")))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn reference_text(ref_text: Option<&str>) -> String {
    non_empty(ref_text)
        .unwrap_or(crate::PLACEHOLDER_REF_TEXT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReferenceAudio;
    use crate::model::{ModelFolders, ModelVariant};
    use rstest::rstest;

    #[derive(Debug)]
    struct SilentModel;

    impl SpeechModel for SilentModel {
        fn synthesize(&mut self, _: &GenerationRequest, _: &Path) -> VoiceboxResult<AudioBuffer> {
            Ok(AudioBuffer::new(vec![0.0; 16], 24_000))
        }
        fn reseed(&mut self, _: u64) {}
        fn unload(&mut self) {}
    }

    #[derive(Debug)]
    struct SilentLoader;

    impl ModelLoader for SilentLoader {
        fn load(&self, _: ModelFamily, _: ModelVariant, _: &Path) -> VoiceboxResult<Box<dyn SpeechModel>> {
            Ok(Box::new(SilentModel))
        }
    }

    struct Fixture {
        _root: TempDir,
        synthesizer: Synthesizer,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let config = VoiceboxConfig {
            models_dir: root.path().join("models"),
            voices_dir: root.path().join("voices"),
            scratch_dir: Some(root.path().join("scratch")),
            ..VoiceboxConfig::default()
        };
        let folders = ModelFolders::default();
        for (_, _, folder) in folders.iter() {
            std::fs::create_dir_all(config.models_dir.join(folder)).unwrap();
        }
        let prompts = Arc::new(VoicePromptStore::open(&config.voices_dir).unwrap());
        let synthesizer = Synthesizer::new(&config, Arc::new(SilentLoader), prompts);
        Fixture {
            _root: root,
            synthesizer,
        }
    }

    fn custom(speaker: &str) -> VoiceMode {
        VoiceMode::CustomVoice {
            speaker: speaker.to_string(),
            instruct: None,
        }
    }

    #[rstest]
    #[case::empty_text("   ", 1.0, "Auto")]
    #[case::speed_too_low("Hello.", 0.05, "Auto")]
    #[case::speed_too_high("Hello.", 3.5, "Auto")]
    #[case::speed_nan("Hello.", f32::NAN, "Auto")]
    #[case::unknown_language("Hello.", 1.0, "Klingon")]
    fn test_rejects_invalid_common_fields(
        #[case] text: &str,
        #[case] speed: f32,
        #[case] language: &str,
    ) {
        let fx = fixture();
        let request = SynthesisRequest::new(text, custom("Vivian"))
            .with_speed(speed)
            .with_language(language);
        assert!(matches!(
            fx.synthesizer.synthesize(&request),
            Err(VoiceboxError::InvalidRequest { .. })
        ));
        assert!(fx.synthesizer.resident().is_none());
    }

    #[test]
    fn test_text_length_limit() {
        let fx = fixture();
        let request = SynthesisRequest::new("a".repeat(crate::MAX_TEXT_LENGTH + 1), custom("Vivian"));
        let err = fx.synthesizer.synthesize(&request).unwrap_err();
        assert!(err.to_string().contains("Text too long"));
    }

    #[test]
    fn test_custom_voice_defaults() {
        let fx = fixture();
        let resolved = fx
            .synthesizer
            .resolve(&SynthesisRequest::new("Hi.", custom("Ryan")).with_language("english"))
            .unwrap();
        assert_eq!(resolved.family, ModelFamily::CustomVoice);
        assert_eq!(resolved.generation.speaker.as_deref(), Some("Ryan"));
        assert_eq!(resolved.generation.instruct.as_deref(), Some("Normal tone"));
        assert_eq!(resolved.generation.language, "English");
    }

    #[test]
    fn test_unknown_speaker() {
        let fx = fixture();
        assert!(matches!(
            fx.synthesizer.resolve(&SynthesisRequest::new("Hi.", custom("Nobody"))),
            Err(VoiceboxError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_voice_design_requires_instruct() {
        let fx = fixture();
        let request = SynthesisRequest::new(
            "Hi.",
            VoiceMode::VoiceDesign {
                instruct: "  ".to_string(),
            },
        );
        assert!(matches!(
            fx.synthesizer.synthesize(&request),
            Err(VoiceboxError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_clone_requires_reference() {
        let fx = fixture();
        let request = SynthesisRequest::new("Hi.", VoiceMode::Clone { reference: None });
        let err = fx.synthesizer.synthesize(&request).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Either ref_audio_url or ref_audio_base64 must be provided"
        );
    }

    #[test]
    fn test_clone_placeholder_ref_text() {
        let fx = fixture();
        let request = SynthesisRequest::new(
            "Hi.",
            VoiceMode::clone_inline(ReferenceAudio {
                audio: vec![1, 2, 3],
                ref_text: Some(String::new()),
                x_vector_only: true,
            }),
        );
        let resolved = fx.synthesizer.resolve(&request).unwrap();
        assert_eq!(resolved.generation.ref_text.as_deref(), Some("."));
        assert!(resolved.generation.x_vector_only);
        assert_eq!(resolved.reference_audio.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_unknown_prompt() {
        let fx = fixture();
        let request = SynthesisRequest::new("Hi.", VoiceMode::clone_prompt("missing"));
        assert!(matches!(
            fx.synthesizer.synthesize(&request),
            Err(VoiceboxError::PromptNotFound { .. })
        ));
    }

    #[test]
    fn test_scratch_dirs_removed() {
        let fx = fixture();
        let request = SynthesisRequest::new(
            "Hi.",
            VoiceMode::clone_inline(ReferenceAudio {
                audio: vec![0; 8],
                ..ReferenceAudio::default()
            }),
        );
        fx.synthesizer.synthesize(&request).unwrap();

        let leftovers = std::fs::read_dir(&fx.synthesizer.scratch_root).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_transcribe_with_mock() {
        let fx = fixture();
        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .withf(|path| path.is_file())
            .times(1)
            .returning(|_| Ok("  Hello world.\n".to_string()));

        let synthesizer = fx.synthesizer.with_transcriber(Arc::new(transcriber));
        assert_eq!(synthesizer.transcribe(b"RIFF").unwrap(), "Hello world.");
    }

    #[test]
    fn test_transcribe_unconfigured() {
        let fx = fixture();
        assert!(!fx.synthesizer.can_transcribe());
        assert!(matches!(
            fx.synthesizer.transcribe(b"RIFF"),
            Err(VoiceboxError::Configuration { .. })
        ));
    }

    #[test]
    fn test_chunk_size_for() {
        let fx = fixture();
        assert_eq!(fx.synthesizer.chunk_size_for(None).unwrap(), 500);
        assert_eq!(fx.synthesizer.chunk_size_for(Some(120)).unwrap(), 120);
        assert!(fx.synthesizer.chunk_size_for(Some(0)).is_err());
    }
}
