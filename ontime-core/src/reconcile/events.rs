//! Link events delivered to the monitor
//!
//! Completions of requests made through [`crate::traits::RemoteStore`] and
//! notifications pushed by the store arrive here, on the link context.

use crate::channel::ChannelId;
use ontime_protocol::GatewayMessage;

/// Sequence number pairing a state push with its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PushSeq(pub u8);

/// Completion status of a state push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushResult {
    /// The store holds the pushed document
    Acked,
    /// The push was lost or rejected
    Failed,
}

/// Completion of a cumulative-value fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult<'a> {
    /// Encoded [`ontime_protocol::Cumulative`] value as stored remotely
    Payload(&'a [u8]),
    /// The read did not complete
    Failed,
}

/// Events from the remote store link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent<'a> {
    /// Link to the store came up
    Connected,
    /// Link to the store went down
    Disconnected,
    /// A state push completed
    PushCompleted { seq: PushSeq, result: PushResult },
    /// A cumulative fetch completed
    CumulativeFetched {
        channel: ChannelId,
        result: FetchResult<'a>,
    },
    /// Desired-state document, as raw bytes
    DesiredState { payload: &'a [u8] },
}

impl<'a> LinkEvent<'a> {
    /// Map a gateway message onto a monitor event
    ///
    /// Returns `None` for messages the monitor does not consume (settings).
    pub fn from_gateway(msg: &'a GatewayMessage) -> Option<Self> {
        let event = match msg {
            GatewayMessage::Connected => LinkEvent::Connected,
            GatewayMessage::Disconnected => LinkEvent::Disconnected,
            GatewayMessage::PushAck { seq } => LinkEvent::PushCompleted {
                seq: PushSeq(*seq),
                result: PushResult::Acked,
            },
            GatewayMessage::PushFailed { seq } => LinkEvent::PushCompleted {
                seq: PushSeq(*seq),
                result: PushResult::Failed,
            },
            GatewayMessage::Cumulative { channel, payload } => LinkEvent::CumulativeFetched {
                channel: ChannelId(*channel),
                result: FetchResult::Payload(payload.as_slice()),
            },
            GatewayMessage::FetchFailed { channel } => LinkEvent::CumulativeFetched {
                channel: ChannelId(*channel),
                result: FetchResult::Failed,
            },
            GatewayMessage::Desired { payload } => LinkEvent::DesiredState {
                payload: payload.as_slice(),
            },
            GatewayMessage::Setting { .. } => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use ontime_protocol::{RawPayload, SettingValue};

    #[test]
    fn test_push_completions() {
        assert_eq!(
            LinkEvent::from_gateway(&GatewayMessage::PushAck { seq: 9 }),
            Some(LinkEvent::PushCompleted {
                seq: PushSeq(9),
                result: PushResult::Acked
            })
        );
        assert_eq!(
            LinkEvent::from_gateway(&GatewayMessage::PushFailed { seq: 3 }),
            Some(LinkEvent::PushCompleted {
                seq: PushSeq(3),
                result: PushResult::Failed
            })
        );
    }

    #[test]
    fn test_cumulative_payload_borrowed() {
        let payload = RawPayload::from_slice(&[1, 42]).unwrap();
        let msg = GatewayMessage::Cumulative {
            channel: 1,
            payload,
        };
        assert_eq!(
            LinkEvent::from_gateway(&msg),
            Some(LinkEvent::CumulativeFetched {
                channel: ChannelId(1),
                result: FetchResult::Payload(&[1, 42]),
            })
        );
    }

    #[test]
    fn test_settings_not_consumed() {
        let msg = GatewayMessage::Setting {
            seq: 1,
            key: String::try_from("LOOP_DELAY_S").unwrap(),
            value: SettingValue::Int(30),
        };
        assert_eq!(LinkEvent::from_gateway(&msg), None);
    }
}
