//! Read-only ranking views over a set of channels.
//!
//! All functions take an owned copy of the registry contents, so callers
//! never observe a registry that is mid-tick.
//!
//! ## Ordering
//!
//! Ties on the sort counter are broken by channel id ascending, making
//! every view independent of storage order.

use std::cmp::Ordering;

use crate::types::Channel;

/// Default length of the ranking lists served to the overlay.
pub const DEFAULT_RANKING_LIMIT: usize = 105;

/// Minimum number of channels needed to form a pair.
pub const PAIR_SIZE: usize = 2;

fn by_desc(key: fn(&Channel) -> u64) -> impl Fn(&Channel, &Channel) -> Ordering {
    move |a: &Channel, b: &Channel| key(b).cmp(&key(a)).then_with(|| a.id.cmp(&b.id))
}

/// Channels sorted by subscribers descending, truncated to `limit`.
pub fn top_by_subscribers(mut channels: Vec<Channel>, limit: usize) -> Vec<Channel> {
    channels.sort_by(by_desc(|c| c.subscribers));
    channels.truncate(limit);
    channels
}

/// Channels sorted by growth descending, truncated to `limit`.
pub fn top_by_growth(mut channels: Vec<Channel>, limit: usize) -> Vec<Channel> {
    channels.sort_by(by_desc(|c| c.growth));
    channels.truncate(limit);
    channels
}

/// The two channels with the closest subscriber counts.
///
/// Sorting ascending makes the minimum gap occur between neighbours, so
/// only adjacent pairs are compared. The first minimal pair in sorted
/// order wins. Returns `None` with fewer than two channels.
pub fn nearest_pair(mut channels: Vec<Channel>) -> Option<(Channel, Channel)> {
    if channels.len() < PAIR_SIZE {
        return None;
    }

    channels.sort_by(|a, b| a.subscribers.cmp(&b.subscribers).then_with(|| a.id.cmp(&b.id)));

    let mut best = 0;
    let mut best_diff = u64::MAX;
    for (i, pair) in channels.windows(2).enumerate() {
        let diff = pair[1].subscribers - pair[0].subscribers;
        if diff < best_diff {
            best_diff = diff;
            best = i;
        }
    }

    let mut iter = channels.into_iter().skip(best);
    match (iter.next(), iter.next()) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    }
}

/// Channels whose name contains `query`, ignoring case. No limit.
///
/// Results are ordered by channel id.
pub fn search_by_name(mut channels: Vec<Channel>, query: &str) -> Vec<Channel> {
    let needle = query.to_lowercase();
    channels.retain(|c| c.name.to_lowercase().contains(&needle));
    channels.sort_by(|a, b| a.id.cmp(&b.id));
    channels
}
