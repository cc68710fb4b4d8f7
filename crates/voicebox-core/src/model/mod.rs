//! Model management for the speech engine
//! Resolves family folders on disk and keeps at most one family loaded

/// Single-slot model cache
pub mod cache;
/// Model folder resolution
pub mod discovery;
/// Engine call contracts
pub mod speech;
/// Model families and variants
pub mod types;

pub use cache::{ModelCache, ResidentInfo};
pub use discovery::{probe_all, resolve_model_dir, VariantStatus};
pub use speech::{GenerationRequest, ModelLoader, SpeechModel};
pub use types::{variant_key, ModelFamily, ModelFolders, ModelVariant};
