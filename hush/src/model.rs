//! Model descriptors and the loader resolving them to a path on disk.
//!
//! The loader is a collaborator: it runs before the worker is spawned, and
//! the rest of the crate treats its result as an opaque path string.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from model resolution.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file {0:?} not found")]
    NotFound(PathBuf),

    #[error("empty model data for key {0:?}")]
    EmptyData(String),

    #[error("no cache directory available on this platform")]
    NoCacheDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the model artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelContent {
    /// Raw model bytes to be materialized into the store.
    Bytes(Vec<u8>),
    /// Already-materialized model file.
    Path(PathBuf),
}

/// Describes a model artifact before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub content: ModelContent,
    /// Store key the artifact is cached under when `content` is bytes.
    pub storage_key: String,
    /// Rewrite the cached artifact even if one already exists.
    #[serde(default)]
    pub overwrite: bool,
    /// Bumping this invalidates previously cached artifacts.
    #[serde(default)]
    pub schema_version: u32,
}

impl ModelDescriptor {
    /// Descriptor for a model file already on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let storage_key = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            content: ModelContent::Path(path),
            storage_key,
            overwrite: false,
            schema_version: 1,
        }
    }

    /// Descriptor for in-memory model bytes cached under `storage_key`.
    pub fn from_bytes(storage_key: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content: ModelContent::Bytes(bytes),
            storage_key: storage_key.into(),
            overwrite: false,
            schema_version: 1,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }
}

/// Resolves a descriptor to a loadable path.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model: &ModelDescriptor) -> Result<PathBuf, ModelError>;
}

/// Filesystem-backed loader caching byte content under a root directory.
///
/// Byte content lands at `<root>/<storage_key>.v<schema_version>`, so a
/// schema bump re-materializes the artifact next to the stale one. Path
/// content is validated to exist and passed through untouched.
pub struct FsModelLoader {
    root: PathBuf,
}

impl FsModelLoader {
    /// Uses the platform cache directory as the store root.
    pub fn new() -> Result<Self, ModelError> {
        let root = dirs::cache_dir().ok_or(ModelError::NoCacheDir)?.join("hush");
        Ok(Self { root })
    }

    /// Uses an explicit store root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot(&self, model: &ModelDescriptor) -> PathBuf {
        self.root
            .join(format!("{}.v{}", model.storage_key, model.schema_version))
    }
}

#[async_trait]
impl ModelLoader for FsModelLoader {
    async fn load(&self, model: &ModelDescriptor) -> Result<PathBuf, ModelError> {
        match &model.content {
            ModelContent::Path(path) => {
                if tokio::fs::metadata(path).await.is_err() {
                    return Err(ModelError::NotFound(path.clone()));
                }
                Ok(path.clone())
            }
            ModelContent::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(ModelError::EmptyData(model.storage_key.clone()));
                }
                let dest = self.slot(model);
                if !model.overwrite && tokio::fs::try_exists(&dest).await? {
                    debug!(path = %dest.display(), "model already materialized");
                    return Ok(dest);
                }
                tokio::fs::create_dir_all(&self.root).await?;
                // Write-then-rename so a crashed write never leaves a
                // truncated artifact at the final path.
                let tmp = self
                    .root
                    .join(format!("{}.v{}.tmp", model.storage_key, model.schema_version));
                tokio::fs::write(&tmp, bytes).await?;
                tokio::fs::rename(&tmp, &dest).await?;
                debug!(path = %dest.display(), bytes = bytes.len(), "model materialized");
                Ok(dest)
            }
        }
    }
}
