//! Remote store over the gateway link
//!
//! Requests are queued for the link TX task and never wait; the gateway's
//! answers come back through the link RX task as [`ontime_core::LinkEvent`]s.

use portable_atomic::Ordering;

use ontime_core::traits::{RemoteStore, TransportError};
use ontime_core::{ChannelId, PushSeq};
use ontime_protocol::{DesiredState, DeviceMessage, StateDocument};

use crate::channels::{LINK_UP, OUTBOX};

/// [`RemoteStore`] that forwards requests to the gateway
#[derive(Clone, Copy, Default)]
pub struct LinkTransport;

impl LinkTransport {
    fn send(&self, msg: DeviceMessage) -> Result<(), TransportError> {
        if !LINK_UP.load(Ordering::Acquire) {
            return Err(TransportError::Disconnected);
        }
        OUTBOX.try_send(msg).map_err(|_| TransportError::QueueFull)
    }
}

impl RemoteStore for LinkTransport {
    fn push_state(&self, seq: PushSeq, document: &StateDocument) -> Result<(), TransportError> {
        self.send(DeviceMessage::PushState {
            seq: seq.0,
            document: document.clone(),
        })
    }

    fn request_cumulative(&self, channel: ChannelId) -> Result<(), TransportError> {
        self.send(DeviceMessage::GetCumulative { channel: channel.0 })
    }

    fn write_desired(&self, desired: DesiredState) -> Result<(), TransportError> {
        self.send(DeviceMessage::SetDesired { desired })
    }
}
