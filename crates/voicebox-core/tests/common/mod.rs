// Deterministic stand-in for the external speech engine

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use voicebox_core::{
    AudioBuffer, GenerationRequest, ModelFamily, ModelFolders, ModelLoader, ModelVariant,
    SpeechModel, Synthesizer, VoicePromptStore, VoiceboxConfig, VoiceboxError, VoiceboxResult,
};

/// What the fake engine saw on each call
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub family: ModelFamily,
    pub request: GenerationRequest,
    pub ref_audio_present: bool,
    pub workdir_present: bool,
}

#[derive(Debug, Default)]
pub struct EngineLog {
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
    pub reseeds: AtomicUsize,
    pub calls: Mutex<Vec<CallRecord>>,
    pub loaded: Mutex<Vec<(ModelFamily, ModelVariant)>>,
}

/// Output depends only on the LCG state and the input text
#[derive(Debug)]
pub struct FakeModel {
    family: ModelFamily,
    state: u64,
    fail_on: Option<String>,
    log: Arc<EngineLog>,
}

impl FakeModel {
    fn next_value(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }
}

impl SpeechModel for FakeModel {
    #[allow(clippy::cast_precision_loss)]
    fn synthesize(&mut self, request: &GenerationRequest, workdir: &Path) -> VoiceboxResult<AudioBuffer> {
        self.log.calls.lock().push(CallRecord {
            family: self.family,
            request: request.clone(),
            ref_audio_present: request.ref_audio.as_deref().is_some_and(Path::is_file),
            workdir_present: workdir.is_dir(),
        });

        if let Some(marker) = &self.fail_on {
            if request.text.contains(marker.as_str()) {
                return Err(VoiceboxError::generation(format!("cannot say {marker}")));
            }
        }

        let samples = request
            .text
            .bytes()
            .map(|byte| {
                let noise = (self.next_value() % 1000) as f32 / 1000.0;
                (f32::from(byte) / 255.0 + noise) / 2.0 - 0.25
            })
            .collect();
        Ok(AudioBuffer::new(samples, 24_000))
    }

    fn reseed(&mut self, seed: u64) {
        self.log.reseeds.fetch_add(1, Ordering::SeqCst);
        self.state = seed;
    }

    fn unload(&mut self) {
        self.log.unloads.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct FakeLoader {
    pub log: Arc<EngineLog>,
    pub fail_on: Option<String>,
}

impl ModelLoader for FakeLoader {
    fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
        path: &Path,
    ) -> VoiceboxResult<Box<dyn SpeechModel>> {
        assert!(path.is_dir(), "loader handed a missing directory");
        self.log.loads.fetch_add(1, Ordering::SeqCst);
        self.log.loaded.lock().push((family, variant));
        Ok(Box::new(FakeModel {
            family,
            state: 0x5eed,
            fail_on: self.fail_on.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// Temporary model root, prompt store and scratch area
pub struct TestBed {
    pub root: TempDir,
    pub config: VoiceboxConfig,
    pub log: Arc<EngineLog>,
}

impl TestBed {
    /// Every family installed as lite
    pub fn new() -> Self {
        let bed = Self::empty();
        let folders = ModelFolders::default();
        for family in ModelFamily::ALL {
            bed.install(folders.folder(family, ModelVariant::Lite));
        }
        bed
    }

    /// No models installed
    pub fn empty() -> Self {
        let root = TempDir::new().unwrap();
        let config = VoiceboxConfig {
            models_dir: root.path().join("models"),
            voices_dir: root.path().join("voices").join("saved"),
            scratch_dir: Some(root.path().join("scratch")),
            ..VoiceboxConfig::default()
        };
        std::fs::create_dir_all(&config.models_dir).unwrap();
        Self {
            root,
            config,
            log: Arc::new(EngineLog::default()),
        }
    }

    pub fn install(&self, folder: &str) {
        std::fs::create_dir_all(self.config.models_dir.join(folder)).unwrap();
    }

    pub fn store(&self) -> Arc<VoicePromptStore> {
        Arc::new(VoicePromptStore::open(&self.config.voices_dir).unwrap())
    }

    pub fn synthesizer(&self) -> Synthesizer {
        self.synthesizer_failing_on(None)
    }

    pub fn synthesizer_failing_on(&self, marker: Option<&str>) -> Synthesizer {
        let loader = FakeLoader {
            log: Arc::clone(&self.log),
            fail_on: marker.map(str::to_string),
        };
        Synthesizer::new(&self.config, Arc::new(loader), self.store())
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.root.path().join("scratch"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// A sentence of exactly `len` characters ending in a period
pub fn sentence(len: usize) -> String {
    let mut body: String = "word ".repeat(len).chars().take(len - 1).collect();
    if body.ends_with(' ') {
        body.pop();
        body.push('s');
    }
    body.push('.');
    body
}
