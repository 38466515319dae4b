//! Configuration type definitions

use heapless::Vec;
use ontime_protocol::MAX_CHANNELS;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Channels wired on the reference board
pub const DEFAULT_CHANNEL_COUNT: usize = 2;

/// Default poll and report interval
pub const DEFAULT_LOOP_DELAY_S: u32 = 60;

/// Accepted poll interval range (12 hours max)
pub const LOOP_DELAY_MIN_S: u32 = 1;
pub const LOOP_DELAY_MAX_S: u32 = 43_200;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Seconds between poll/report cycles
    pub loop_delay_s: u32,
    /// OFF threshold per channel
    pub floors: Vec<u16, MAX_CHANNELS>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::with_channels(DEFAULT_CHANNEL_COUNT)
    }
}

impl MonitorConfig {
    /// Defaults for `channels` inputs (capped at the document limit)
    pub fn with_channels(channels: usize) -> Self {
        Self {
            loop_delay_s: DEFAULT_LOOP_DELAY_S,
            floors: (0..channels.min(MAX_CHANNELS)).map(|_| 0).collect(),
        }
    }

    pub fn floor(&self, channel: usize) -> Option<u16> {
        self.floors.get(channel).copied()
    }
}
