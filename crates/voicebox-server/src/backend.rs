//! Command-line adapters for the external speech and transcription engines

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use voicebox_core::audio::wav;
use voicebox_core::{
    AudioBuffer, GenerationRequest, ModelFamily, ModelLoader, ModelVariant, SpeechModel,
    Transcriber, VoiceboxError, VoiceboxResult, DEFAULT_LANGUAGE,
};

use crate::config::{EngineConfig, TranscriberConfig};

/// Loads models by binding the engine command to a model directory
#[derive(Debug, Clone)]
pub struct CommandModelLoader {
    config: EngineConfig,
}

impl CommandModelLoader {
    /// Create a loader for the configured engine command
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for CommandModelLoader {
    fn load(
        &self,
        family: ModelFamily,
        variant: ModelVariant,
        path: &Path,
    ) -> VoiceboxResult<Box<dyn SpeechModel>> {
        if !path.is_dir() {
            tracing::warn!("Model directory {} disappeared before load", path.display());
            return Err(VoiceboxError::model_unavailable(family));
        }
        tracing::debug!("Bound {} {} to {}", family, variant.as_str(), path.display());
        Ok(Box::new(CommandModel {
            config: self.config.clone(),
            model_dir: path.to_path_buf(),
            seed: None,
        }))
    }
}

/// One engine process per synthesis call
#[derive(Debug)]
pub struct CommandModel {
    config: EngineConfig,
    model_dir: PathBuf,
    seed: Option<u64>,
}

impl CommandModel {
    fn command(&self, request: &GenerationRequest, workdir: &Path, seed: Option<u64>) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg("--model")
            .arg(&self.model_dir)
            .arg("--text")
            .arg(&request.text)
            .arg("--output_path")
            .arg(workdir)
            .arg("--speed")
            .arg(request.speed.to_string());

        if let Some(speaker) = &request.speaker {
            cmd.arg("--voice").arg(speaker);
        }
        if let Some(instruct) = &request.instruct {
            cmd.arg("--instruct").arg(instruct);
        }
        if let Some(ref_audio) = &request.ref_audio {
            cmd.arg("--ref_audio").arg(ref_audio);
        }
        if let Some(ref_text) = &request.ref_text {
            cmd.arg("--ref_text").arg(ref_text);
        }
        if request.x_vector_only {
            cmd.arg("--x_vector_only_mode");
        }
        if request.language != DEFAULT_LANGUAGE {
            cmd.arg("--lang_code").arg(request.language.to_lowercase());
        }
        if let Some(seed) = seed {
            cmd.arg("--seed").arg(seed.to_string());
        }
        cmd
    }
}

impl SpeechModel for CommandModel {
    fn synthesize(
        &mut self,
        request: &GenerationRequest,
        workdir: &Path,
    ) -> VoiceboxResult<AudioBuffer> {
        // a reseed covers the next call only
        let seed = self.seed.take();
        let output = run(self.command(request, workdir, seed), &self.config.program)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceboxError::generation(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        let produced = workdir.join(&self.config.output_file);
        if !produced.is_file() {
            return Err(VoiceboxError::generation(
                "Audio generation failed - no output file",
            ));
        }
        wav::decode_file(&produced)
    }

    fn reseed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    fn unload(&mut self) {
        self.seed = None;
    }
}

/// Transcribes by running a command with the audio path as last argument
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// Build a transcriber if one is configured
    #[must_use]
    pub fn from_config(config: &TranscriberConfig) -> Option<Self> {
        let program = config.program.as_ref().filter(|p| !p.trim().is_empty())?;
        Some(Self {
            program: program.clone(),
            args: config.args.clone(),
        })
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, audio_path: &Path) -> VoiceboxResult<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(audio_path);

        let output = run(cmd, &self.program)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceboxError::generation(format!(
                "Transcription failed: {}",
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map(|text| text.trim().to_string())
            .map_err(|_| VoiceboxError::generation("Transcriber emitted non-UTF-8 output"))
    }
}

fn run(mut cmd: Command, program: &str) -> VoiceboxResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            VoiceboxError::configuration(format!(
                "Failed to execute '{program}': {e}. Ensure it is installed"
            ))
        })
}
