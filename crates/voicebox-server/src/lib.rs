//! Voicebox Server
//!
//! HTTP and SSE endpoints over the Voicebox synthesis core, with
//! command-line adapters for the speech and transcription engines.

pub mod backend;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use backend::{CommandModel, CommandModelLoader, CommandTranscriber};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

/// Version information for the voicebox-server crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
