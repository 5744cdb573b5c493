//! In-memory snapshot store for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::ChannelMap;
use super::{ChannelStore, StoreError};

/// In-memory snapshot store for testing.
///
/// Keeps the last saved registry and counts saves so tests can assert
/// when persistence happened. An optional save delay stands in for a slow
/// disk.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: Mutex<Option<ChannelMap>>,
    saves: Mutex<u64>,
    save_delay: Mutex<Duration>,
    save_starts: Mutex<Vec<Instant>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot.
    pub fn with_snapshot(channels: ChannelMap) -> Self {
        Self {
            snapshot: Mutex::new(Some(channels)),
            ..Self::default()
        }
    }

    /// Make every save take `delay` before it completes.
    pub fn with_save_delay(self, delay: Duration) -> Self {
        self.set_save_delay(delay);
        self
    }

    /// Change the delay for saves that start from now on.
    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// The last saved registry, if any.
    pub fn snapshot(&self) -> Option<ChannelMap> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> u64 {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// When each save began, including ones still in flight.
    pub fn save_starts(&self) -> Vec<Instant> {
        self.save_starts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ChannelStore for InMemoryStore {
    async fn load(&self) -> Result<Option<ChannelMap>, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, channels: &ChannelMap) -> Result<(), StoreError> {
        self.save_starts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        let delay = *self.save_delay.lock().unwrap_or_else(|e| e.into_inner());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(channels.clone());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
