//! Chat commands that add growth, each with its own random amount range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// A growth-adding chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthCommand {
    /// `!video`: a regular upload.
    Video,
    /// `!short`: a short-form upload.
    Short,
    /// `!viral`: a video that took off.
    Viral,
    /// `!trend`: a trending video.
    Trend,
}

impl GrowthCommand {
    /// All commands, in route order.
    pub const ALL: [GrowthCommand; 4] = [Self::Video, Self::Short, Self::Viral, Self::Trend];

    /// Parse command from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "video" => Some(Self::Video),
            "short" => Some(Self::Short),
            "viral" => Some(Self::Viral),
            "trend" => Some(Self::Trend),
            _ => None,
        }
    }

    /// Inclusive range of growth this command can add.
    pub fn amount_range(&self) -> RangeInclusive<u64> {
        match self {
            Self::Video => 10..=150,
            Self::Short => 20..=200,
            Self::Viral => 50..=300,
            Self::Trend => 100..=500,
        }
    }

    /// Draw an amount uniformly from [`Self::amount_range`].
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(self.amount_range())
    }

    /// Reply sent back to chat on success.
    pub fn reply(&self) -> &'static str {
        match self {
            Self::Video => "Video posted!",
            Self::Short => "Posted Short Video",
            Self::Viral => "Posted Viral Video",
            Self::Trend => "Posted Trend Video",
        }
    }
}

impl fmt::Display for GrowthCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Short => write!(f, "short"),
            Self::Viral => write!(f, "viral"),
            Self::Trend => write!(f, "trend"),
        }
    }
}
