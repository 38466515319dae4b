//! Message types for the gateway link
//!
//! Message types are divided into two categories:
//! - Device → Gateway: state pushes, cumulative reads, desired-state writes,
//!   setting results
//! - Gateway → Device: connection changes, push/fetch completions, desired
//!   state, settings

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::document::{DesiredState, StateDocument};
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

// Message type IDs: Device → Gateway
pub const MSG_PUSH_STATE: u8 = 0x10;
pub const MSG_GET_CUMULATIVE: u8 = 0x11;
pub const MSG_SET_DESIRED: u8 = 0x12;
pub const MSG_SETTING_STATUS: u8 = 0x13;

// Message type IDs: Gateway → Device
pub const MSG_CONNECTED: u8 = 0x40;
pub const MSG_DISCONNECTED: u8 = 0x41;
pub const MSG_PUSH_ACK: u8 = 0x42;
pub const MSG_PUSH_FAILED: u8 = 0x43;
pub const MSG_CUMULATIVE: u8 = 0x44;
pub const MSG_FETCH_FAILED: u8 = 0x45;
pub const MSG_DESIRED: u8 = 0x46;
pub const MSG_SETTING: u8 = 0x47;

/// Maximum setting key length
pub const SETTING_KEY_LEN: usize = 24;

/// Maximum raw document payload forwarded by the gateway
pub const MAX_RAW_PAYLOAD: usize = 32;

/// Raw document bytes as stored remotely
pub type RawPayload = Vec<u8, MAX_RAW_PAYLOAD>;

/// Result of applying a remote setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingCode {
    Success,
    KeyNotRecognized,
    ValueFormatNotValid,
    ValueOutsideRange,
}

impl SettingCode {
    pub fn to_byte(self) -> u8 {
        match self {
            SettingCode::Success => 0,
            SettingCode::KeyNotRecognized => 1,
            SettingCode::ValueFormatNotValid => 2,
            SettingCode::ValueOutsideRange => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(SettingCode::Success),
            1 => Some(SettingCode::KeyNotRecognized),
            2 => Some(SettingCode::ValueFormatNotValid),
            3 => Some(SettingCode::ValueOutsideRange),
            _ => None,
        }
    }
}

/// Typed value of a remote setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingValue {
    Int(i64),
    Bool(bool),
    Float(f32),
    Text(String<SETTING_KEY_LEN>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SettingUpdate {
    key: String<SETTING_KEY_LEN>,
    value: SettingValue,
}

/// Messages from the device to the gateway
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMessage {
    /// Write the reported state document; answered by PushAck/PushFailed with `seq`
    PushState { seq: u8, document: StateDocument },
    /// Read a channel's stored cumulative value
    GetCumulative { channel: u8 },
    /// Overwrite the desired-state document
    SetDesired { desired: DesiredState },
    /// Outcome of the setting request carrying `seq`
    SettingStatus { seq: u8, code: SettingCode },
}

impl DeviceMessage {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        match self {
            DeviceMessage::PushState { seq, document } => {
                let payload = document
                    .encode(&mut buf)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_PUSH_STATE, *seq, payload)
            }
            DeviceMessage::GetCumulative { channel } => {
                Frame::new(MSG_GET_CUMULATIVE, 0, &[*channel])
            }
            DeviceMessage::SetDesired { desired } => {
                let payload = desired
                    .encode(&mut buf)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_SET_DESIRED, 0, payload)
            }
            DeviceMessage::SettingStatus { seq, code } => {
                Frame::new(MSG_SETTING_STATUS, *seq, &[code.to_byte()])
            }
        }
    }

    /// Parse a device message from a frame (gateway side and tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_PUSH_STATE => Ok(DeviceMessage::PushState {
                seq: frame.seq,
                document: StateDocument::decode(&frame.payload)
                    .map_err(|_| FrameError::InvalidFrame)?,
            }),
            MSG_GET_CUMULATIVE => Ok(DeviceMessage::GetCumulative {
                channel: *frame.payload.first().ok_or(FrameError::InvalidFrame)?,
            }),
            MSG_SET_DESIRED => {
                let desired = DesiredState::decode(&frame.payload)
                    .map_err(|_| FrameError::InvalidFrame)?
                    .ok_or(FrameError::InvalidFrame)?;
                Ok(DeviceMessage::SetDesired { desired })
            }
            MSG_SETTING_STATUS => {
                let byte = *frame.payload.first().ok_or(FrameError::InvalidFrame)?;
                let code = SettingCode::from_byte(byte).ok_or(FrameError::InvalidFrame)?;
                Ok(DeviceMessage::SettingStatus {
                    seq: frame.seq,
                    code,
                })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

/// Messages from the gateway to the device
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatewayMessage {
    /// Cloud session established
    Connected,
    /// Cloud session lost
    Disconnected,
    /// State push `seq` was durably stored
    PushAck { seq: u8 },
    /// State push `seq` failed or timed out
    PushFailed { seq: u8 },
    /// Stored cumulative value for `channel`, as raw document bytes
    Cumulative { channel: u8, payload: RawPayload },
    /// Reading the cumulative value for `channel` failed
    FetchFailed { channel: u8 },
    /// Desired-state document changed, as raw document bytes
    Desired { payload: RawPayload },
    /// Remote setting update; answered by SettingStatus with `seq`
    Setting {
        seq: u8,
        key: String<SETTING_KEY_LEN>,
        value: SettingValue,
    },
}

impl GatewayMessage {
    /// Parse a gateway message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_CONNECTED => Ok(GatewayMessage::Connected),
            MSG_DISCONNECTED => Ok(GatewayMessage::Disconnected),
            MSG_PUSH_ACK => Ok(GatewayMessage::PushAck { seq: frame.seq }),
            MSG_PUSH_FAILED => Ok(GatewayMessage::PushFailed { seq: frame.seq }),
            MSG_CUMULATIVE => {
                let (&channel, raw) = frame
                    .payload
                    .split_first()
                    .ok_or(FrameError::InvalidFrame)?;
                Ok(GatewayMessage::Cumulative {
                    channel,
                    payload: raw_payload(raw)?,
                })
            }
            MSG_FETCH_FAILED => Ok(GatewayMessage::FetchFailed {
                channel: *frame.payload.first().ok_or(FrameError::InvalidFrame)?,
            }),
            MSG_DESIRED => Ok(GatewayMessage::Desired {
                payload: raw_payload(&frame.payload)?,
            }),
            MSG_SETTING => {
                let update: SettingUpdate =
                    postcard::from_bytes(&frame.payload).map_err(|_| FrameError::InvalidFrame)?;
                Ok(GatewayMessage::Setting {
                    seq: frame.seq,
                    key: update.key,
                    value: update.value,
                })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this message into a frame (for testing or simulation)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            GatewayMessage::Connected => Ok(Frame::empty(MSG_CONNECTED, 0)),
            GatewayMessage::Disconnected => Ok(Frame::empty(MSG_DISCONNECTED, 0)),
            GatewayMessage::PushAck { seq } => Ok(Frame::empty(MSG_PUSH_ACK, *seq)),
            GatewayMessage::PushFailed { seq } => Ok(Frame::empty(MSG_PUSH_FAILED, *seq)),
            GatewayMessage::Cumulative { channel, payload } => {
                let mut buf = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                buf.push(*channel).map_err(|_| FrameError::PayloadTooLarge)?;
                buf.extend_from_slice(payload)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_CUMULATIVE, 0, &buf)
            }
            GatewayMessage::FetchFailed { channel } => {
                Frame::new(MSG_FETCH_FAILED, 0, &[*channel])
            }
            GatewayMessage::Desired { payload } => Frame::new(MSG_DESIRED, 0, payload),
            GatewayMessage::Setting { seq, key, value } => {
                let update = SettingUpdate {
                    key: key.clone(),
                    value: value.clone(),
                };
                let mut buf = [0u8; MAX_PAYLOAD_SIZE];
                let payload =
                    postcard::to_slice(&update, &mut buf).map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_SETTING, *seq, payload)
            }
        }
    }
}

fn raw_payload(bytes: &[u8]) -> Result<RawPayload, FrameError> {
    Vec::from_slice(bytes).map_err(|_| FrameError::PayloadTooLarge)
}
