// Model cache: one resident family at a time, lite preferred over pro

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::discovery::resolve_model_dir;
use super::speech::{ModelLoader, SpeechModel};
use super::types::{ModelFamily, ModelFolders, ModelVariant};
use crate::error::{VoiceboxError, VoiceboxResult};

#[derive(Debug)]
struct ResidentModel {
    family: ModelFamily,
    variant: ModelVariant,
    path: PathBuf,
    model: Box<dyn SpeechModel>,
}

/// Family and variant currently held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentInfo {
    /// Resident family
    pub family: ModelFamily,
    /// Variant that was loaded for it
    pub variant: ModelVariant,
    /// Directory the model was loaded from
    pub path: PathBuf,
}

/// Loads and evicts model instances by family
///
/// Loading a family other than the resident one evicts everything first.
/// The cache itself is not synchronized; wrap it in a mutex to share it.
#[derive(Debug)]
pub struct ModelCache {
    models_dir: PathBuf,
    folders: ModelFolders,
    loader: Arc<dyn ModelLoader>,
    resident: Option<ResidentModel>,
}

impl ModelCache {
    /// Create an empty cache rooted at `models_dir`
    pub fn new<P: Into<PathBuf>>(
        models_dir: P,
        folders: ModelFolders,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            folders,
            loader,
            resident: None,
        }
    }

    /// Root directory probed for model folders
    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Return the model for `family`, loading it if needed
    ///
    /// A resident model of the same family is returned with no I/O.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` if neither variant resolves on disk, or the
    /// loader's error if loading fails. A different resident family has
    /// already been evicted in both cases.
    pub fn acquire(&mut self, family: ModelFamily) -> VoiceboxResult<&mut dyn SpeechModel> {
        let cached = matches!(&self.resident, Some(resident) if resident.family == family);
        if !cached {
            self.evict_all();

            let (variant, path) = self.resolve(family)?;
            tracing::info!("Loading {} model ({}) from {:?}", family, variant, path);
            let model = self.loader.load(family, variant, &path)?;
            self.resident = Some(ResidentModel {
                family,
                variant,
                path,
                model,
            });
        }

        self.resident_model_mut()
            .map(|model| model as &mut dyn SpeechModel)
            .ok_or(VoiceboxError::model_unavailable(family))
    }

    /// First resolvable variant for `family`, lite before pro
    fn resolve(&self, family: ModelFamily) -> VoiceboxResult<(ModelVariant, PathBuf)> {
        ModelVariant::PREFERENCE
            .into_iter()
            .find_map(|variant| {
                let folder = self.folders.folder(family, variant);
                tracing::debug!("Probing {} for {} {}", folder, family, variant);
                resolve_model_dir(&self.models_dir, folder).map(|path| (variant, path))
            })
            .ok_or(VoiceboxError::model_unavailable(family))
    }

    /// Drop every resident model
    pub fn evict_all(&mut self) {
        if let Some(mut resident) = self.resident.take() {
            tracing::info!(
                "Evicting {} model ({})",
                resident.family,
                resident.variant
            );
            resident.model.unload();
        }
    }

    /// Currently resident family, if any
    #[must_use]
    pub fn resident(&self) -> Option<ResidentInfo> {
        self.resident.as_ref().map(|resident| ResidentInfo {
            family: resident.family,
            variant: resident.variant,
            path: resident.path.clone(),
        })
    }

    pub(crate) fn resident_model_mut(&mut self) -> Option<&mut (dyn SpeechModel + 'static)> {
        self.resident.as_mut().map(|resident| &mut *resident.model)
    }
}

impl Drop for ModelCache {
    fn drop(&mut self) {
        self.evict_all();
    }
}
