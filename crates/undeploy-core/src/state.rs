//! Director state handling
//!
//! The deployer keeps its view of the director in a `state.json` blob. During
//! a teardown the blob lives in a [`TemporaryStore`]; between runs it is kept
//! on disk by [`StateFile`].

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Key the director state is stored under
pub const STATE_KEY: &str = "state.json";

const BACKUP_SUFFIX: &str = "backup";

/// Minimal key to bytes map handed to the deployer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporaryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl TemporaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the director state
    pub fn with_state(state: Vec<u8>) -> Self {
        let mut store = Self::new();
        store.set(STATE_KEY, state);
        store
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The director state, empty if none was ever stored
    pub fn into_state(mut self) -> Vec<u8> {
        self.entries.remove(STATE_KEY).unwrap_or_default()
    }
}

/// Director state persisted on disk between runs
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".");
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the state, or an empty blob if the file does not exist
    pub async fn load(&self) -> Result<Vec<u8>> {
        if !self.path.exists() {
            tracing::debug!("State file not found, starting from empty state");
            return Ok(Vec::new());
        }

        let state = fs::read(&self.path).await?;
        tracing::debug!("Loaded {} bytes of director state", state.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        if self.path.exists() {
            let backup = self.backup_path();
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&self.path, &backup).await?;
            tracing::debug!("Created state backup: {}", backup.display());
        }

        fs::write(&self.path, state).await?;
        tracing::debug!("Saved {} bytes of director state", state.len());
        Ok(())
    }
}
