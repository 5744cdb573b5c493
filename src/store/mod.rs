//! Snapshot storage backends.
//!
//! A store persists the whole registry as one document. There is no
//! incremental format: every save replaces the previous snapshot.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use crate::types::ChannelMap;

/// Error type for snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing or creating the snapshot location failed.
    #[error("I/O failure on {path}: {source}")]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The snapshot could not be encoded or decoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Trait for snapshot storage backends.
///
/// Implementations treat `load` and `save` as all-or-nothing.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Read the persisted registry. `Ok(None)` means no snapshot exists yet.
    async fn load(&self) -> Result<Option<ChannelMap>, StoreError>;

    /// Replace the persisted registry with `channels`.
    async fn save(&self, channels: &ChannelMap) -> Result<(), StoreError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
