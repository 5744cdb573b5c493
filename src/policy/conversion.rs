//! Growth conversion policy: how fast growth bleeds into subscribers.
//!
//! Each tick consumes `ceil(growth / ticks_per_hour)` from a channel's
//! growth and credits it to subscribers, so accumulated growth drains over
//! roughly one hour whatever the tick interval is.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Channel;

/// Seconds in the smoothing window.
const SMOOTHING_WINDOW_SECS: u64 = 3600;

/// Default tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Conversion policy derived from the scheduler's tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPolicy {
    /// Interval between conversion ticks.
    pub tick_interval: Duration,
}

impl GrowthPolicy {
    /// Create a policy for the given tick interval.
    pub fn new(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }

    /// Number of ticks expected per hour (720 at a 5 second interval).
    ///
    /// Never zero: intervals longer than an hour still convert at least
    /// the whole remaining growth per tick.
    pub fn ticks_per_hour(&self) -> u64 {
        let interval_ms = self.tick_interval.as_millis().max(1);
        let per_hour = (SMOOTHING_WINDOW_SECS as u128 * 1000) / interval_ms;
        per_hour.clamp(1, u64::MAX as u128) as u64
    }

    /// Amount one tick moves out of `growth`.
    pub fn consume_amount(&self, growth: u64) -> u64 {
        growth.div_ceil(self.ticks_per_hour())
    }

    /// Apply one tick to a channel. Returns the amount moved.
    ///
    /// `growth + subscribers` is preserved.
    pub fn apply(&self, channel: &mut Channel) -> u64 {
        if channel.growth == 0 {
            return 0;
        }
        let consume = self.consume_amount(channel.growth).min(channel.growth);
        channel.growth -= consume;
        channel.subscribers = channel.subscribers.saturating_add(consume);
        consume
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}
