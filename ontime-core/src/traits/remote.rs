//! Remote state store
//!
//! The store itself lives behind a network link. Calls here only dispatch
//! a request; results come back later as link events.

use crate::channel::ChannelId;
use crate::reconcile::PushSeq;
use ontime_protocol::{DesiredState, StateDocument};

/// A request could not be handed to the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Outgoing queue is full
    QueueFull,
    /// Link to the store is down
    Disconnected,
}

/// Asynchronous access to the remote state store
///
/// Every method returns as soon as the request is queued. Completion is
/// reported through [`crate::reconcile::LinkEvent`].
pub trait RemoteStore {
    /// Queue a state push; its completion carries `seq`
    fn push_state(&self, seq: PushSeq, document: &StateDocument) -> Result<(), TransportError>;

    /// Queue a read of the stored cumulative value for `channel`
    fn request_cumulative(&self, channel: ChannelId) -> Result<(), TransportError>;

    /// Queue a write of the desired-state document
    fn write_desired(&self, desired: DesiredState) -> Result<(), TransportError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn push_state(&self, seq: PushSeq, document: &StateDocument) -> Result<(), TransportError> {
        (**self).push_state(seq, document)
    }

    fn request_cumulative(&self, channel: ChannelId) -> Result<(), TransportError> {
        (**self).request_cumulative(channel)
    }

    fn write_desired(&self, desired: DesiredState) -> Result<(), TransportError> {
        (**self).write_desired(desired)
    }
}
