//! Durable thumbnail storage.

use crate::registry::RendererId;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renderer or owner id cannot be used as a path component
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Persists renderer thumbnails.
pub trait ThumbnailStore: Send + Sync {
    /// Where the thumbnail of `renderer_id` is stored.
    fn location_for(&self, renderer_id: &RendererId, owner_id: &str)
        -> Result<String, StorageError>;

    /// Writes `encoded` as the thumbnail of `renderer_id`, replacing any
    /// previous one.
    fn update_image(
        &self,
        renderer_id: &RendererId,
        encoded: &[u8],
        owner_id: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Stores thumbnails as `<root>/<owner>/<renderer>.png`.
#[derive(Debug, Clone)]
pub struct DiskThumbnailStore {
    root: PathBuf,
}

impl DiskThumbnailStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a thumbnail would be written to.
    pub fn path_for(
        &self,
        renderer_id: &RendererId,
        owner_id: &str,
    ) -> Result<PathBuf, StorageError> {
        let owner = validate_component(owner_id)?;
        let renderer = validate_component(renderer_id.as_str())?;
        Ok(self.root.join(owner).join(format!("{}.png", renderer)))
    }
}

fn validate_component(key: &str) -> Result<&str, StorageError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(key)
    }
}

impl ThumbnailStore for DiskThumbnailStore {
    fn location_for(
        &self,
        renderer_id: &RendererId,
        owner_id: &str,
    ) -> Result<String, StorageError> {
        self.path_for(renderer_id, owner_id)
            .map(|path| path.display().to_string())
    }

    async fn update_image(
        &self,
        renderer_id: &RendererId,
        encoded: &[u8],
        owner_id: &str,
    ) -> Result<(), StorageError> {
        let path = self.path_for(renderer_id, owner_id)?;
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(parent))?;
        }

        // Write atomically via temp file
        let temp_path = path.with_extension("png.tmp");
        tokio::fs::write(&temp_path, encoded)
            .await
            .map_err(io_err(&temp_path))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(io_err(&path))?;

        debug!(
            renderer = %renderer_id,
            path = %path.display(),
            bytes = encoded.len(),
            "Thumbnail written"
        );
        Ok(())
    }
}
