//! Channel types for the ranking registry.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// External identifier of a channel (the chat platform's user id).
///
/// Implements `Ord` so registry iteration and tie-breaks are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a new ChannelId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A tracked channel.
///
/// `subscribers` only grows (except through an administrative clear);
/// `growth` is the not-yet-realized gain bled into `subscribers` by the
/// conversion tick. Both counters are unsigned, so neither can go negative.
///
/// Field names match the persisted document (`userid`), and absent or
/// `null` counters deserialize as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Immutable external identifier.
    #[serde(rename = "userid")]
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Durable subscriber count.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub subscribers: u64,
    /// Transient growth accumulator.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub growth: u64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

impl Channel {
    /// Create a freshly registered channel with both counters at zero.
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subscribers: 0,
            growth: 0,
        }
    }

    /// Create a channel with explicit counters.
    pub fn with_counts(id: ChannelId, name: impl Into<String>, subscribers: u64, growth: u64) -> Self {
        Self {
            id,
            name: name.into(),
            subscribers,
            growth,
        }
    }

    /// Growth rendered with thousands separators, e.g. `12,345`.
    pub fn formatted_growth(&self) -> String {
        group_thousands(self.growth)
    }
}

/// The full registry contents, keyed by identifier.
pub type ChannelMap = BTreeMap<ChannelId, Channel>;

/// Format an integer with `,` between groups of three digits.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
