//! The channel registry: the single source of truth between snapshots.
//!
//! ## Concurrency
//!
//! All state sits behind one async mutex. Registration, growth addition,
//! conversion and clear each hold it for their whole duration, including
//! the snapshot save when they take one, so:
//!
//! - concurrent `add_growth` calls on one channel never lose an increment
//! - a conversion tick is never interleaved with another mutation
//! - saves are serialized and always write the state they were taken from
//!
//! Queries clone the channels under the lock and sort outside it.
//!
//! ## Persistence
//!
//! `register`, `clear` and `convert_tick` save before returning. `add_growth`
//! does not; its effect becomes durable on the next tick. A failed save is
//! logged and remembered in [`RegistryStats`], but memory is never rolled back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::canonical::canonical_hash_hex;
use crate::policy::GrowthPolicy;
use crate::ranking;
use crate::store::{ChannelStore, StoreError};
use crate::types::{Channel, ChannelId, ChannelMap};

/// Error type for registry operations.
///
/// None of these alter registry state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No channel with this id.
    #[error("Channel not found: {0}")]
    NotFound(ChannelId),
    /// A channel with this id is already registered.
    #[error("Channel already registered: {0}")]
    AlreadyExists(ChannelId),
    /// The operation needs more channels than are registered.
    #[error("Not enough channels: need {required}, have {available}")]
    InsufficientData {
        /// Channels required.
        required: usize,
        /// Channels registered.
        available: usize,
    },
}

/// Outcome of one conversion tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Channels that had growth to convert.
    pub converted: usize,
    /// Total growth moved into subscribers.
    pub subscribers_gained: u64,
    /// Whether the follow-up snapshot save succeeded.
    pub saved: bool,
}

/// Point-in-time registry statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Registered channels.
    pub channel_count: usize,
    /// Conversion ticks run to the end, save included, since the registry
    /// was opened.
    pub ticks_completed: u64,
    /// When the last tick finished.
    pub last_tick_at: Option<DateTime<Utc>>,
    /// When the last successful save finished.
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Error from the most recent save, cleared by the next successful one.
    pub last_save_error: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    channels: ChannelMap,
    ticks_completed: u64,
    last_tick_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
    last_save_error: Option<String>,
}

/// In-memory channel registry with snapshot persistence.
pub struct ChannelRegistry {
    state: Mutex<RegistryState>,
    store: Arc<dyn ChannelStore>,
    policy: GrowthPolicy,
}

impl ChannelRegistry {
    /// Load the registry from `store` and write it back once, so the
    /// snapshot exists from process start.
    ///
    /// A missing or unreadable snapshot yields an empty registry; the
    /// failure is logged, never propagated.
    pub async fn open(store: Arc<dyn ChannelStore>, policy: GrowthPolicy) -> Self {
        let channels = match store.load().await {
            Ok(Some(channels)) => {
                info!(
                    location = %store.describe(),
                    channel_count = channels.len(),
                    "Snapshot loaded"
                );
                channels
            }
            Ok(None) => {
                info!(location = %store.describe(), "No snapshot found, starting empty");
                ChannelMap::new()
            }
            Err(e) => {
                warn!(
                    location = %store.describe(),
                    error = %e,
                    "Snapshot could not be loaded, starting empty"
                );
                ChannelMap::new()
            }
        };

        let registry = Self::from_channels(store, policy, channels);
        // Failure is already logged and kept in stats.
        let _ = registry.persist().await;
        registry
    }

    /// Build a registry around existing contents without touching the store.
    pub fn from_channels(store: Arc<dyn ChannelStore>, policy: GrowthPolicy, channels: ChannelMap) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                channels,
                ..RegistryState::default()
            }),
            store,
            policy,
        }
    }

    /// The conversion policy in effect.
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Register a new channel with zero subscribers and zero growth.
    ///
    /// Saves before returning.
    pub async fn register(&self, id: ChannelId, name: impl Into<String>) -> Result<Channel, RegistryError> {
        let mut state = self.state.lock().await;

        if state.channels.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        let channel = Channel::new(id.clone(), name);
        state.channels.insert(id, channel.clone());
        info!(channel_id = %channel.id, name = %channel.name, "Channel registered");

        // Failure is logged and kept in stats; memory stays authoritative.
        let _ = self.save_locked(&mut state).await;
        Ok(channel)
    }

    /// Add `amount` to a channel's growth. Not saved until the next tick.
    pub async fn add_growth(&self, id: &ChannelId, amount: u64) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;

        let channel = state
            .channels
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        channel.growth = channel.growth.saturating_add(amount);

        debug!(channel_id = %id, amount, growth = channel.growth, "Growth added");
        Ok(())
    }

    /// Move a slice of every channel's growth into subscribers, then save.
    ///
    /// The save happens even if nothing changed, keeping the snapshot's
    /// modification time fresh.
    pub async fn convert_tick(&self) -> TickReport {
        let mut state = self.state.lock().await;
        let mut report = TickReport::default();

        for channel in state.channels.values_mut() {
            let moved = self.policy.apply(channel);
            if moved > 0 {
                report.converted += 1;
                report.subscribers_gained = report.subscribers_gained.saturating_add(moved);
            }
        }

        report.saved = self.save_locked(&mut state).await.is_ok();
        state.ticks_completed += 1;
        state.last_tick_at = Some(Utc::now());
        report
    }

    /// Remove every channel and save the empty registry. Irreversible.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let removed = state.channels.len();
        state.channels.clear();
        warn!(removed, "Registry cleared");
        let _ = self.save_locked(&mut state).await;
    }

    /// Fetch one channel.
    pub async fn get(&self, id: &ChannelId) -> Result<Channel, RegistryError> {
        let state = self.state.lock().await;
        state
            .channels
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Every channel, in id order.
    pub async fn all(&self) -> Vec<Channel> {
        let state = self.state.lock().await;
        state.channels.values().cloned().collect()
    }

    /// Number of registered channels.
    pub async fn len(&self) -> usize {
        self.state.lock().await.channels.len()
    }

    /// Check if the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.channels.is_empty()
    }

    /// Top `limit` channels by subscribers.
    pub async fn top_by_subscribers(&self, limit: usize) -> Vec<Channel> {
        ranking::top_by_subscribers(self.all().await, limit)
    }

    /// Top `limit` channels by growth.
    pub async fn top_by_growth(&self, limit: usize) -> Vec<Channel> {
        ranking::top_by_growth(self.all().await, limit)
    }

    /// The two channels with the closest subscriber counts.
    pub async fn nearest_pair(&self) -> Result<(Channel, Channel), RegistryError> {
        let channels = self.all().await;
        let available = channels.len();
        ranking::nearest_pair(channels).ok_or(RegistryError::InsufficientData {
            required: ranking::PAIR_SIZE,
            available,
        })
    }

    /// Channels whose name contains `query`, ignoring case.
    pub async fn search_by_name(&self, query: &str) -> Vec<Channel> {
        ranking::search_by_name(self.all().await, query)
    }

    /// Save the current state now.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        self.save_locked(&mut state).await
    }

    /// Current statistics.
    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.lock().await;
        RegistryStats {
            channel_count: state.channels.len(),
            ticks_completed: state.ticks_completed,
            last_tick_at: state.last_tick_at,
            last_saved_at: state.last_saved_at,
            last_save_error: state.last_save_error.clone(),
        }
    }

    /// xxHash64 of the canonical registry contents.
    pub async fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let state = self.state.lock().await;
        canonical_hash_hex(&state.channels)
    }

    async fn save_locked(&self, state: &mut RegistryState) -> Result<(), StoreError> {
        match self.store.save(&state.channels).await {
            Ok(()) => {
                state.last_saved_at = Some(Utc::now());
                state.last_save_error = None;
                debug!(channel_count = state.channels.len(), "Snapshot saved");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Snapshot save failed, in-memory registry remains authoritative");
                state.last_save_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("store", &self.store.describe())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
