//! Service state management.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::registry::ChannelRegistry;

/// Shared service state.
///
/// Handlers only reach the registry through its public operations.
#[derive(Debug, Clone)]
pub struct ServiceState {
    /// The channel registry.
    pub registry: Arc<ChannelRegistry>,
    /// When the service started.
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// Create new service state around a registry.
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            started_at: Utc::now(),
        }
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
