//! Core types for the channel registry.

pub mod channel;

pub use channel::{Channel, ChannelId, ChannelMap, group_thousands};
