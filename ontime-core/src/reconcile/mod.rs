//! Reconciliation of cumulative on-time with the remote store
//!
//! Accumulated ON time stays buffered as `unreported` until the store
//! acknowledges a push carrying it; only then is it folded into the
//! channel's baseline. A failed push loses nothing, it is simply carried
//! by the next report.

pub mod events;
pub mod monitor;
pub mod state;

pub use events::{FetchResult, LinkEvent, PushResult, PushSeq};
pub use monitor::{ChannelPoll, DesiredOutcome, EventOutcome, Monitor, ReportSummary};
pub use state::{
    BaselineSource, Epoch, FetchOutcome, FoldOutcome, MonitorState, ReportPlan, MAX_IN_FLIGHT,
};

use crate::channel::ChannelId;
use crate::guard::LockTimeout;
use crate::traits::TransportError;
use ontime_protocol::DocumentError;

/// Errors from monitor operations
///
/// None of these are fatal; the affected operation is skipped and retried
/// on a later cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError {
    /// Shared state was busy past the deadline
    LockTimeout(LockTimeout),
    /// No such channel
    UnknownChannel(ChannelId),
    /// Request could not be handed to the link
    Transport(TransportError),
    /// State document could not be built
    Document(DocumentError),
}

impl From<LockTimeout> for MonitorError {
    fn from(e: LockTimeout) -> Self {
        MonitorError::LockTimeout(e)
    }
}

impl From<TransportError> for MonitorError {
    fn from(e: TransportError) -> Self {
        MonitorError::Transport(e)
    }
}

impl From<DocumentError> for MonitorError {
    fn from(e: DocumentError) -> Self {
        MonitorError::Document(e)
    }
}
