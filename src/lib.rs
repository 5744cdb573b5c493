//! # channel-ranking
//!
//! Subscriber ranking for chat-driven channels.
//!
//! Each channel carries a durable `subscribers` count and a transient
//! `growth` accumulator. Chat commands add growth; a periodic tick bleeds
//! growth into subscribers so gains land over roughly an hour.
//!
//! ## Architecture
//!
//! ```text
//! HTTP routes ──┐
//!               ├──→ ChannelRegistry ──→ ChannelStore (JSON file or memory)
//! Scheduler ────┘          ↓
//!                       ranking (top-N, search, nearest pair)
//! ```
//!
//! ## Guarantees
//!
//! - Every mutation and every tick runs under one lock; no lost updates
//! - Each tick conserves `growth + subscribers` per channel
//! - A failed save never rolls back memory; a failed load starts empty

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod store;
pub mod registry;
pub mod ranking;
pub mod scheduler;
pub mod canonical;
pub mod config;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{Channel, ChannelId, ChannelMap};
pub use policy::{GrowthCommand, GrowthPolicy, DEFAULT_TICK_INTERVAL};
pub use store::{ChannelStore, InMemoryStore, JsonFileStore, StoreError};
pub use registry::{ChannelRegistry, RegistryError, RegistryStats, TickReport};
pub use ranking::DEFAULT_RANKING_LIMIT;
pub use scheduler::ConversionScheduler;
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use config::{LogFormat, ServiceConfig};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
