//! JSON file snapshot store.
//!
//! The snapshot is a pretty-printed JSON object keyed by channel id:
//!
//! ```json
//! {
//!   "u1": { "userid": "u1", "name": "Alice", "subscribers": 12, "growth": 88 }
//! }
//! ```
//!
//! Saves write a sibling `.tmp` file, sync it to disk and rename it over
//! the target, so a crash or power loss leaves either the previous snapshot
//! or the new one, never a torn file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::types::ChannelMap;
use super::{ChannelStore, StoreError};

/// Default snapshot file name.
pub const DEFAULT_SNAPSHOT_FILE: &str = "channels.json";

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store writing to `path`. The parent directory is created on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store for `<dir>/channels.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_SNAPSHOT_FILE))
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn replace_with(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        write_synced(temp_path, bytes)
            .await
            .map_err(|e| StoreError::io(temp_path, e))?;
        tokio::fs::rename(temp_path, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        sync_parent_dir(&self.path).await
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Make the rename itself durable.
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    let dir = tokio::fs::File::open(parent)
        .await
        .map_err(|e| StoreError::io(parent, e))?;
    dir.sync_all().await.map_err(|e| StoreError::io(parent, e))
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[async_trait]
impl ChannelStore for JsonFileStore {
    async fn load(&self) -> Result<Option<ChannelMap>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let mut channels: ChannelMap = serde_json::from_slice(&bytes)?;

        // The map key is authoritative for identity.
        for (key, channel) in channels.iter_mut() {
            if channel.id != *key {
                tracing::warn!(
                    key = %key,
                    userid = %channel.id,
                    "Snapshot entry id does not match its key, using key"
                );
                channel.id = key.clone();
            }
        }

        Ok(Some(channels))
    }

    async fn save(&self, channels: &ChannelMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(channels)?;
        let temp_path = self.temp_path();

        let result = self.replace_with(&temp_path, &bytes).await;
        if result.is_err() {
            // Missing temp file is fine here.
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        result
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
