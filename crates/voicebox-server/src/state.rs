//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use voicebox_core::{Synthesizer, VoicePromptStore, VoiceboxResult};

use crate::backend::{CommandModelLoader, CommandTranscriber};
use crate::config::ServerConfig;
use crate::error::ApiError;

/// Timeout for downloading a reference clip
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Handles shared by every request
#[derive(Clone)]
pub struct AppState {
    /// Synthesis core
    pub synthesizer: Arc<Synthesizer>,
    /// Client for `ref_audio_url` downloads
    pub http: reqwest::Client,
    /// Backend label for `/health`
    pub backend: Arc<str>,
}

impl AppState {
    /// Wrap an already configured synthesizer
    #[must_use]
    pub fn new(synthesizer: Synthesizer, backend: &str) -> Self {
        let http = build_client(reqwest::Client::builder().timeout(FETCH_TIMEOUT));
        Self {
            synthesizer: Arc::new(synthesizer),
            http,
            backend: Arc::from(backend),
        }
    }

    /// Build the synthesizer, prompt store and engine adapters from config
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if the voices directory cannot be created.
    pub fn from_config(config: &ServerConfig) -> VoiceboxResult<Self> {
        let prompts = Arc::new(VoicePromptStore::open(&config.core.voices_dir)?);
        tracing::info!(
            "Loaded {} saved voice prompts from {}",
            prompts.len(),
            config.core.voices_dir.display()
        );

        let loader = Arc::new(CommandModelLoader::new(config.engine.clone()));
        let mut synthesizer = Synthesizer::new(&config.core, loader, prompts);
        match CommandTranscriber::from_config(&config.transcriber) {
            Some(transcriber) => synthesizer = synthesizer.with_transcriber(Arc::new(transcriber)),
            None => tracing::info!("No transcriber configured, /api/v1/base/transcribe is disabled"),
        }

        Ok(Self::new(synthesizer, &config.engine.backend))
    }

    /// Download reference audio from `url`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Fetch` on transport errors and non-success statuses.
    pub async fn fetch_reference(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::info!("Fetching reference audio from {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to build HTTP client, reference downloads have no timeout: {}",
            e
        );
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_falls_back_on_builder_error() {
        let broken = reqwest::Client::builder().user_agent("bad\nagent");
        let client = build_client(broken);
        assert!(client.get("http://127.0.0.1:9/ref.wav").build().is_ok());
    }
}
