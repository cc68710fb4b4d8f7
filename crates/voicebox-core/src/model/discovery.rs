//! Model directory resolution.
//!
//! A family folder is either a flat directory of model files or a
//! HuggingFace-style cache with a `snapshots/<revision>/` level.

use std::path::{Path, PathBuf};

use super::types::{variant_key, ModelFolders};

/// Resolve the directory that actually holds the model files for `folder_name`
///
/// Returns the first non-hidden entry of `snapshots/` when that directory
/// exists and is populated, otherwise the folder itself. `None` when the
/// folder is absent.
#[must_use]
pub fn resolve_model_dir(models_dir: &Path, folder_name: &str) -> Option<PathBuf> {
    let full_path = models_dir.join(folder_name);
    if !full_path.is_dir() {
        return None;
    }

    if let Some(snapshot) = first_snapshot(&full_path.join("snapshots")) {
        tracing::debug!("Using snapshot {:?} for {}", snapshot, folder_name);
        return Some(snapshot);
    }

    Some(full_path)
}

fn first_snapshot(snapshots_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(snapshots_dir).ok()?;

    // read_dir order is platform dependent
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Availability of one family/variant folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStatus {
    /// Key such as `base_lite`
    pub key: String,
    /// Resolved directory, if present
    pub path: Option<PathBuf>,
}

impl VariantStatus {
    /// Whether the variant resolved on disk
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Probe every configured folder without loading anything
#[must_use]
pub fn probe_all(models_dir: &Path, folders: &ModelFolders) -> Vec<VariantStatus> {
    folders
        .iter()
        .map(|(family, variant, folder)| VariantStatus {
            key: variant_key(family, variant),
            path: resolve_model_dir(models_dir, folder),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_folder() {
        let root = TempDir::new().unwrap();
        assert_eq!(resolve_model_dir(root.path(), "absent"), None);
    }

    #[test]
    fn test_direct_layout() {
        let root = TempDir::new().unwrap();
        let model = root.path().join("model-a");
        std::fs::create_dir_all(&model).unwrap();
        std::fs::write(model.join("config.json"), "{}").unwrap();

        assert_eq!(resolve_model_dir(root.path(), "model-a"), Some(model));
    }

    #[test]
    fn test_snapshot_layout_skips_hidden() {
        let root = TempDir::new().unwrap();
        let snapshots = root.path().join("model-b").join("snapshots");
        std::fs::create_dir_all(snapshots.join(".partial")).unwrap();
        std::fs::create_dir_all(snapshots.join("rev2")).unwrap();
        std::fs::create_dir_all(snapshots.join("rev1")).unwrap();

        assert_eq!(
            resolve_model_dir(root.path(), "model-b"),
            Some(snapshots.join("rev1"))
        );
    }

    #[test]
    fn test_empty_snapshots_falls_back_to_folder() {
        let root = TempDir::new().unwrap();
        let model = root.path().join("model-c");
        std::fs::create_dir_all(model.join("snapshots").join(".lock")).unwrap();

        assert_eq!(resolve_model_dir(root.path(), "model-c"), Some(model));
    }

    #[test]
    fn test_probe_all_reports_every_variant() {
        let root = TempDir::new().unwrap();
        let folders = ModelFolders::default();
        std::fs::create_dir_all(root.path().join(&folders.base_pro)).unwrap();

        let status = probe_all(root.path(), &folders);
        assert_eq!(status.len(), 6);
        let available: Vec<_> = status.iter().filter(|s| s.is_available()).collect();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].key, "base_pro");
    }
}
