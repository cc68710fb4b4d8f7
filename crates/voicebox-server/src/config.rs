//! Server configuration
//!
//! One TOML file with `[server]`, `[core]`, `[engine]` and `[transcriber]`
//! tables. Every table and key is optional. Environment variables override
//! the file.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use voicebox_core::{VoiceboxConfig, VoiceboxError, VoiceboxResult};

/// Path of the optional configuration file
pub const ENV_CONFIG: &str = "VOICEBOX_CONFIG";
/// Overrides [`HttpConfig::host`]
pub const ENV_HOST: &str = "VOICEBOX_HOST";
/// Overrides [`HttpConfig::port`]
pub const ENV_PORT: &str = "VOICEBOX_PORT";

/// Complete server configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener and logging
    pub server: HttpConfig,
    /// Synthesis core
    pub core: VoiceboxConfig,
    /// Speech engine command
    pub engine: EngineConfig,
    /// Transcription command
    pub transcriber: TranscriberConfig,
}

/// Listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            log_format: "pretty".to_string(),
        }
    }
}

/// External speech engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Label reported by `/health`
    pub backend: String,
    /// Executable to run
    pub program: String,
    /// Arguments placed before the generation flags
    pub args: Vec<String>,
    /// File the engine writes into its output directory
    pub output_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: "mlx".to_string(),
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "mlx_audio.tts.generate".to_string()],
            output_file: "audio_000.wav".to_string(),
        }
    }
}

/// External transcription invocation; disabled without a program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Executable to run
    pub program: Option<String>,
    /// Arguments placed before the audio path
    pub args: Vec<String>,
}

impl ServerConfig {
    /// Parse from TOML
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for malformed TOML.
    pub fn from_toml_str(source: &str) -> VoiceboxResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read `path`, falling back to defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> VoiceboxResult<Self> {
        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path).map_err(|e| {
            VoiceboxError::configuration(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Load from `VOICEBOX_CONFIG` if set, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Propagates load, override and validation errors.
    pub fn from_env() -> VoiceboxResult<Self> {
        let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let mut config = match lookup(ENV_CONFIG) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup such as `std::env::var`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the port is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> VoiceboxResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.core.apply_overrides(&lookup);
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.parse().map_err(|_| {
                VoiceboxError::configuration(format!("{ENV_PORT} must be a port number, got {port}"))
            })?;
        }
        Ok(())
    }

    /// Check listener, core and engine settings
    ///
    /// # Errors
    ///
    /// Returns `Configuration` describing the first invalid value.
    pub fn validate(&self) -> VoiceboxResult<()> {
        if self.server.port == 0 {
            return Err(VoiceboxError::configuration("server.port must be greater than 0"));
        }
        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(VoiceboxError::configuration(format!(
                "server.log_format must be \"pretty\" or \"json\", got {:?}",
                self.server.log_format
            )));
        }
        if self.engine.program.trim().is_empty() {
            return Err(VoiceboxError::configuration("engine.program must not be empty"));
        }
        self.core.validate()
    }

    /// Socket address to bind
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if host and port do not form an address.
    pub fn socket_addr(&self) -> VoiceboxResult<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| VoiceboxError::configuration(format!("Invalid listen address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7860);
        assert_eq!(config.engine.program, "python3");
        assert!(config.transcriber.program.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ServerConfig::from_toml_str(
            r#"
            [server]
            port = 9000
            log_format = "json"

            [core]
            models_dir = "/srv/models"
            default_chunk_size = 300

            [core.model_folders]
            base_lite = "my-base"

            [transcriber]
            program = "whisper-cli"
            args = ["--model", "tiny"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.core.models_dir, Path::new("/srv/models"));
        assert_eq!(config.core.default_chunk_size, 300);
        assert_eq!(config.core.model_folders.base_lite, "my-base");
        assert_eq!(config.transcriber.program.as_deref(), Some("whisper-cli"));
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "8080"),
            ("VOICEBOX_VOICES_DIR", "/data/voices"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.core.voices_dir, Path::new("/data/voices"));
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_PORT).then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, VoiceboxError::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.log_format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.core.max_text_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
