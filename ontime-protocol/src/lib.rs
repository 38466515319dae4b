//! Gateway link protocol
//!
//! This crate defines the UART-based protocol between the monitor MCU and the
//! network gateway (the co-processor that owns the cloud connection), and the
//! documents exchanged with the remote store through it.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬────────┬──────┬─────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ SEQ │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 1B  │ 0–250B      │ 1B       │
//! └───────┴────────┴──────┴─────┴─────────────┴──────────┘
//! ```
//!
//! The gateway is a thin bridge: it maps `PushState` onto the remote state
//! document, answers `GetCumulative` with the stored value, and forwards
//! desired-state changes and settings. Request/response pairs are matched by
//! the SEQ byte.

#![no_std]
#![deny(unsafe_code)]

pub mod document;
pub mod frame;
pub mod messages;

pub use document::{
    ChannelValue, Cumulative, DesiredState, DocumentError, StateDocument, MAX_CHANNELS,
};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use messages::{
    DeviceMessage, GatewayMessage, RawPayload, SettingCode, SettingValue, SETTING_KEY_LEN,
};
