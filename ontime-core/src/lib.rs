//! Board-agnostic core logic for the ontime monitor
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or a particular network stack:
//!
//! - Threshold classification of raw channel readings
//! - Per-channel runtime accumulation
//! - Shared-state guard with deadline-bounded acquisition
//! - Reconciliation of cumulative on-time with a remote store
//! - Sample source and remote store traits
//! - Configuration and remote settings validation
//!
//! Time is a monotonic millisecond count supplied by the caller; deadlines
//! are awaited through [`embedded_hal_async::delay::DelayNs`], so the same
//! code runs under the firmware executor and in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod guard;
pub mod reconcile;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::SampleOutcome;
pub use channel::{Channel, ChannelId, ChannelSnapshot, Millis};
pub use classifier::{classify, Classification};
pub use config::{MonitorConfig, Setting, SettingChange};
pub use guard::{Guard, LockBudget, LockTimeout};
pub use reconcile::{
    EventOutcome, FetchOutcome, FoldOutcome, LinkEvent, Monitor, MonitorError, MonitorState,
    PushSeq, ReportSummary,
};
pub use traits::{RemoteStore, SampleError, SampleSource, TransportError};
