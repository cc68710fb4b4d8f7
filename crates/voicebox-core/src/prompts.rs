//! Voice prompt store.
//!
//! Reusable reference voices kept in memory and mirrored to disk, one
//! directory per prompt:
//!
//! ```text
//! <root>/<prompt_id>/metadata.json   {"name", "ref_text", "x_vector_only_mode"}
//! <root>/<prompt_id>/audio.wav
//! ```
//!
//! Entries are immutable once created. The store is rebuilt from disk once
//! when opened.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{VoiceboxError, VoiceboxResult};

const METADATA_FILE: &str = "metadata.json";
const AUDIO_FILE: &str = "audio.wav";
const STAGING_PREFIX: &str = ".staging-";

/// A stored reference voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePrompt {
    /// Unique identifier, also the directory name
    pub prompt_id: String,
    /// Display name
    pub name: String,
    /// Reference audio as stored (WAV)
    pub ref_audio: Vec<u8>,
    /// Transcript of the reference audio
    pub ref_text: Option<String>,
    /// Clone from the speaker embedding alone
    pub x_vector_only: bool,
}

/// Listing entry; the audio payload is withheld
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSummary {
    /// Prompt identifier
    pub prompt_id: String,
    /// Transcript of the reference audio
    pub ref_text: Option<String>,
    /// Display name
    pub name: String,
    /// Cloning-mode flag
    pub x_vector_only_mode: bool,
}

/// Single-prompt view with an audio presence flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDetail {
    /// Common summary fields
    #[serde(flatten)]
    pub summary: PromptSummary,
    /// Whether the prompt carries any audio bytes
    pub has_audio: bool,
}

/// Input for [`VoicePromptStore::create`]
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    /// Display name; defaults to `Voice_<first 8 chars of id>`
    pub name: Option<String>,
    /// Reference audio (WAV)
    pub ref_audio: Vec<u8>,
    /// Transcript of the reference audio
    pub ref_text: Option<String>,
    /// Clone from the speaker embedding alone
    pub x_vector_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PromptMetadata {
    name: Option<String>,
    ref_text: Option<String>,
    #[serde(default)]
    x_vector_only_mode: bool,
}

impl VoicePrompt {
    /// Summary without the audio payload
    #[must_use]
    pub fn summary(&self) -> PromptSummary {
        PromptSummary {
            prompt_id: self.prompt_id.clone(),
            ref_text: self.ref_text.clone(),
            name: self.name.clone(),
            x_vector_only_mode: self.x_vector_only,
        }
    }

    /// Summary plus `has_audio`
    #[must_use]
    pub fn detail(&self) -> PromptDetail {
        PromptDetail {
            summary: self.summary(),
            has_audio: !self.ref_audio.is_empty(),
        }
    }

    fn metadata(&self) -> PromptMetadata {
        PromptMetadata {
            name: Some(self.name.clone()),
            ref_text: self.ref_text.clone(),
            x_vector_only_mode: self.x_vector_only,
        }
    }
}

/// Default display name for a prompt id
#[must_use]
pub fn default_prompt_name(prompt_id: &str) -> String {
    let short: String = prompt_id.chars().take(8).collect();
    format!("Voice_{short}")
}

/// Disk-mirrored prompt repository
#[derive(Debug)]
pub struct VoicePromptStore {
    root: PathBuf,
    prompts: RwLock<BTreeMap<String, Arc<VoicePrompt>>>,
}

impl VoicePromptStore {
    /// Open the store at `root`, creating it if needed, and load every
    /// complete prompt directory
    ///
    /// Unreadable or incomplete directories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` only if `root` itself cannot be created
    /// or listed.
    pub fn open<P: Into<PathBuf>>(root: P) -> VoiceboxResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            VoiceboxError::persistence(format!(
                "Failed to create voice directory {}: {e}",
                root.display()
            ))
        })?;

        let store = Self {
            root,
            prompts: RwLock::new(BTreeMap::new()),
        };
        store.load_all()?;
        Ok(store)
    }

    /// Directory holding the prompt folders
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_all(&self) -> VoiceboxResult<()> {
        let entries = std::fs::read_dir(&self.root)?;
        let mut prompts = self.prompts.write();

        for entry in entries.flatten() {
            let dir = entry.path();
            let Some(prompt_id) = dir.file_name().and_then(|n| n.to_str()).map(str::to_owned)
            else {
                continue;
            };
            if prompt_id.starts_with('.') || !dir.is_dir() {
                continue;
            }

            match read_prompt(&dir, &prompt_id) {
                Ok(prompt) => {
                    prompts.insert(prompt_id, Arc::new(prompt));
                }
                Err(e) => tracing::warn!("Skipping voice prompt {}: {}", prompt_id, e),
            }
        }

        tracing::info!("Loaded {} saved voice prompts from disk", prompts.len());
        Ok(())
    }

    /// Store a new prompt and persist it
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` if writing to disk fails. The entry is
    /// still usable from memory for the life of this process but will not
    /// survive a restart.
    pub fn create(&self, prompt: NewPrompt) -> VoiceboxResult<String> {
        let prompt_id = uuid::Uuid::new_v4().to_string();
        let name = prompt
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_prompt_name(&prompt_id));

        let entry = Arc::new(VoicePrompt {
            prompt_id: prompt_id.clone(),
            name,
            ref_audio: prompt.ref_audio,
            ref_text: prompt.ref_text,
            x_vector_only: prompt.x_vector_only,
        });
        self.prompts.write().insert(prompt_id.clone(), Arc::clone(&entry));

        if let Err(e) = self.persist(&entry) {
            tracing::error!("Voice prompt {} kept in memory only: {}", prompt_id, e);
            return Err(VoiceboxError::persistence(format!(
                "Prompt {prompt_id} was created but could not be saved: {e}"
            )));
        }

        tracing::info!("Created voice prompt {} ({})", prompt_id, entry.name);
        Ok(prompt_id)
    }

    /// Store generated audio as a prompt that clones with a transcript
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub fn save_generated(
        &self,
        name: String,
        ref_audio: Vec<u8>,
        ref_text: String,
    ) -> VoiceboxResult<String> {
        self.create(NewPrompt {
            name: Some(name),
            ref_audio,
            ref_text: Some(ref_text),
            x_vector_only: false,
        })
    }

    // Write into a hidden staging directory, then rename into place.
    fn persist(&self, prompt: &VoicePrompt) -> VoiceboxResult<()> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)?;

        let metadata = serde_json::to_string_pretty(&prompt.metadata())?;
        std::fs::write(staging.path().join(METADATA_FILE), metadata)?;
        std::fs::write(staging.path().join(AUDIO_FILE), &prompt.ref_audio)?;

        std::fs::rename(staging.path(), self.root.join(&prompt.prompt_id))?;
        Ok(())
    }

    /// Look up a prompt
    ///
    /// # Errors
    ///
    /// Returns `PromptNotFound` if the id is unknown.
    pub fn get(&self, prompt_id: &str) -> VoiceboxResult<Arc<VoicePrompt>> {
        self.prompts
            .read()
            .get(prompt_id)
            .cloned()
            .ok_or_else(|| VoiceboxError::prompt_not_found(prompt_id))
    }

    /// All prompts, ordered by id, without audio
    #[must_use]
    pub fn list(&self) -> Vec<PromptSummary> {
        self.prompts.read().values().map(|p| p.summary()).collect()
    }

    /// Number of prompts in memory
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.read().is_empty()
    }

    /// Delete a prompt from memory and disk
    ///
    /// The directory is removed first; the entry is only dropped from memory
    /// once that succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PromptNotFound` if the id is unknown and
    /// `PersistenceFailure` if its directory cannot be removed.
    pub fn delete(&self, prompt_id: &str) -> VoiceboxResult<()> {
        let mut prompts = self.prompts.write();
        if !prompts.contains_key(prompt_id) {
            return Err(VoiceboxError::prompt_not_found(prompt_id));
        }

        let dir = self.root.join(prompt_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| {
                VoiceboxError::persistence(format!("Failed to delete prompt {prompt_id}: {e}"))
            })?;
        }
        prompts.remove(prompt_id);

        tracing::info!("Deleted voice prompt {}", prompt_id);
        Ok(())
    }
}

fn read_prompt(dir: &Path, prompt_id: &str) -> VoiceboxResult<VoicePrompt> {
    let metadata_path = dir.join(METADATA_FILE);
    let audio_path = dir.join(AUDIO_FILE);
    if !metadata_path.is_file() || !audio_path.is_file() {
        return Err(VoiceboxError::persistence(format!(
            "missing {METADATA_FILE} or {AUDIO_FILE}"
        )));
    }

    let metadata: PromptMetadata = serde_json::from_str(&std::fs::read_to_string(metadata_path)?)?;
    let ref_audio = std::fs::read(audio_path)?;

    Ok(VoicePrompt {
        prompt_id: prompt_id.to_string(),
        name: metadata
            .name
            .unwrap_or_else(|| default_prompt_name(prompt_id)),
        ref_audio,
        ref_text: metadata.ref_text,
        x_vector_only: metadata.x_vector_only_mode,
    })
}
