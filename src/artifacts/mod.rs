//! Pipeline-scoped artifact store
//!
//! Carries directories of files between stages. Write-once per name: the
//! producing stage publishes a directory exactly once and consumers only
//! ever read it, so no coordination beyond rejecting duplicate puts is
//! needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Error types for artifact operations
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact '{0}' already exists")]
    Duplicate(String),

    #[error("Artifact '{0}' not found")]
    NotFound(String),

    #[error("IO error for artifact '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Store of named artifacts for a single pipeline run
pub struct ArtifactStore {
    root: PathBuf,
    entries: RwLock<HashMap<String, PathBuf>>,
}

impl ArtifactStore {
    /// Create a store rooted in a fresh temporary directory
    pub fn new() -> std::io::Result<Self> {
        let root = std::env::temp_dir().join(format!("shipway-artifacts-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root)?;
        Ok(Self::with_root(root))
    }

    /// Create a store rooted at an existing directory
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Directory the store keeps its copies in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Publish a directory under `name`, copying its contents into the store
    ///
    /// Fails with [`ArtifactError::Duplicate`] if the name was already
    /// published.
    pub async fn put(&self, name: &str, dir: &Path) -> Result<(), ArtifactError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(name) {
            return Err(ArtifactError::Duplicate(name.to_string()));
        }

        let dest = self.root.join(name);
        copy_dir(dir, &dest).map_err(|source| ArtifactError::Io {
            name: name.to_string(),
            source,
        })?;

        entries.insert(name.to_string(), dest);
        Ok(())
    }

    /// Look up the stored directory for `name`
    pub async fn get(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let entries = self.entries.read().await;
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))
    }

    /// Names of all published artifacts
    pub async fn names(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove the store's directory from disk
    pub fn cleanup(&self) -> std::io::Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Recursively copy a directory
pub(crate) fn copy_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
