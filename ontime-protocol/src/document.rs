//! Remote store documents
//!
//! The gateway maps these onto the cloud state store:
//!
//! - `StateDocument` is the device's reported state. Field names follow the
//!   remote document keys (`live_runtime`, `cumulative`); each entry is keyed
//!   by channel number (`ch0`, `ch1`, ... on the remote side).
//! - `Cumulative` is a single channel's stored cumulative on-time in
//!   milliseconds. `Absent` ("never synced") is distinct from `Value(0)`
//!   ("confirmed zero").
//! - `DesiredState` is the operator-writable document carrying the
//!   `reset_cumulative` request flag. A null document decodes to `None`.
//!
//! All documents are postcard-encoded on the link.

use heapless::Vec;
use serde::{Deserialize, Serialize};

/// Maximum channels a single document can describe
pub const MAX_CHANNELS: usize = 4;

/// Document encoding/decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DocumentError {
    /// Output buffer too small or a collection overflowed
    Encode,
    /// Payload is malformed or truncated
    Decode,
}

/// One channel's value in a state document (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelValue {
    pub channel: u8,
    pub millis: u64,
}

/// Reported device state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateDocument {
    /// Current contiguous ON span per channel
    pub live_runtime: Vec<ChannelValue, MAX_CHANNELS>,
    /// Cumulative ON time per channel; omitted until every baseline is loaded
    pub cumulative: Option<Vec<ChannelValue, MAX_CHANNELS>>,
}

impl StateDocument {
    /// Append a channel's live runtime
    pub fn push_live(&mut self, channel: u8, millis: u64) -> Result<(), DocumentError> {
        self.live_runtime
            .push(ChannelValue { channel, millis })
            .map_err(|_| DocumentError::Encode)
    }

    /// Append a channel's cumulative total, creating the section if needed
    pub fn push_cumulative(&mut self, channel: u8, millis: u64) -> Result<(), DocumentError> {
        self.cumulative
            .get_or_insert_with(Vec::new)
            .push(ChannelValue { channel, millis })
            .map_err(|_| DocumentError::Encode)
    }

    /// Live runtime reported for `channel`
    pub fn live(&self, channel: u8) -> Option<u64> {
        find(&self.live_runtime, channel)
    }

    /// Cumulative total reported for `channel`
    pub fn cumulative(&self, channel: u8) -> Option<u64> {
        self.cumulative.as_ref().and_then(|c| find(c, channel))
    }

    /// Serialize into `buf`, returning the used prefix
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], DocumentError> {
        postcard::to_slice(self, buf).map_err(|_| DocumentError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        postcard::from_bytes(bytes).map_err(|_| DocumentError::Decode)
    }
}

fn find(values: &[ChannelValue], channel: u8) -> Option<u64> {
    values
        .iter()
        .find(|v| v.channel == channel)
        .map(|v| v.millis)
}

/// Stored cumulative value for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cumulative {
    /// No value has ever been stored
    Absent,
    /// Stored value in milliseconds
    Value(u64),
}

impl Cumulative {
    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Option<u64> = postcard::from_bytes(bytes).map_err(|_| DocumentError::Decode)?;
        Ok(value.map_or(Cumulative::Absent, Cumulative::Value))
    }

    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], DocumentError> {
        let value = match *self {
            Cumulative::Absent => None,
            Cumulative::Value(v) => Some(v),
        };
        postcard::to_slice(&value, buf).map_err(|_| DocumentError::Encode)
    }
}

/// Operator-writable desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DesiredState {
    /// Request to zero the cumulative totals
    pub reset_cumulative: bool,
}

impl DesiredState {
    /// Decode a desired-state payload; `Ok(None)` is the null document
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, DocumentError> {
        postcard::from_bytes(bytes).map_err(|_| DocumentError::Decode)
    }

    /// Encode as a (non-null) desired-state payload
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], DocumentError> {
        postcard::to_slice(&Some(*self), buf).map_err(|_| DocumentError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_document_without_cumulative() {
        let mut doc = StateDocument::default();
        doc.push_live(0, 1500).unwrap();
        doc.push_live(1, 0).unwrap();

        let mut buf = [0u8; 64];
        let encoded = doc.encode(&mut buf).unwrap();
        let decoded = StateDocument::decode(encoded).unwrap();

        assert_eq!(decoded.live(0), Some(1500));
        assert_eq!(decoded.live(1), Some(0));
        assert_eq!(decoded.cumulative, None);
        assert_eq!(decoded.cumulative(0), None);
    }

    #[test]
    fn test_state_document_with_cumulative() {
        let mut doc = StateDocument::default();
        doc.push_live(0, 16).unwrap();
        doc.push_cumulative(0, 3_600_016).unwrap();

        let mut buf = [0u8; 64];
        let encoded = doc.encode(&mut buf).unwrap();
        let decoded = StateDocument::decode(encoded).unwrap();

        assert_eq!(decoded, doc);
        assert_eq!(decoded.cumulative(0), Some(3_600_016));
    }

    #[test]
    fn test_state_document_channel_limit() {
        let mut doc = StateDocument::default();
        for ch in 0..MAX_CHANNELS as u8 {
            doc.push_live(ch, 0).unwrap();
        }
        assert_eq!(doc.push_live(9, 0), Err(DocumentError::Encode));
    }

    #[test]
    fn test_cumulative_absent_is_not_zero() {
        let mut buf = [0u8; 16];
        let absent = Cumulative::Absent.encode(&mut buf).unwrap().len();
        let absent_decoded = Cumulative::decode(&buf[..absent]).unwrap();

        let mut buf2 = [0u8; 16];
        let zero = Cumulative::Value(0).encode(&mut buf2).unwrap().len();
        let zero_decoded = Cumulative::decode(&buf2[..zero]).unwrap();

        assert_eq!(absent_decoded, Cumulative::Absent);
        assert_eq!(zero_decoded, Cumulative::Value(0));
    }

    #[test]
    fn test_cumulative_malformed() {
        assert_eq!(Cumulative::decode(&[]), Err(DocumentError::Decode));
        // Option tag 1 with no varint following
        assert_eq!(Cumulative::decode(&[0x01]), Err(DocumentError::Decode));
    }

    #[test]
    fn test_desired_state_null_and_flag() {
        assert_eq!(DesiredState::decode(&[0x00]), Ok(None));

        let mut buf = [0u8; 8];
        let set = DesiredState {
            reset_cumulative: true,
        };
        let encoded = set.encode(&mut buf).unwrap();
        assert_eq!(DesiredState::decode(encoded), Ok(Some(set)));
    }

    #[test]
    fn test_desired_state_garbage() {
        assert_eq!(DesiredState::decode(&[0x07, 0x09]), Err(DocumentError::Decode));
    }
}
