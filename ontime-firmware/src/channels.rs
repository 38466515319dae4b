//! Inter-task communication
//!
//! Static queues and flags shared between the poll task and the gateway
//! link tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU32};

use ontime_core::config::DEFAULT_LOOP_DELAY_S;
use ontime_protocol::DeviceMessage;

use crate::CHANNELS;

/// Outgoing message queue depth
const OUTBOX_SIZE: usize = 8;

/// Messages waiting to be written to the gateway
pub static OUTBOX: Channel<CriticalSectionRawMutex, DeviceMessage, OUTBOX_SIZE> = Channel::new();

/// Wake the poll task before its delay elapses (settings changed)
pub static POLL_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Gateway reports a live connection to the remote store
pub static LINK_UP: AtomicBool = AtomicBool::new(false);

/// Seconds between poll cycles
pub static LOOP_DELAY_S: AtomicU32 = AtomicU32::new(DEFAULT_LOOP_DELAY_S);

/// Configured OFF threshold per channel, applied by the poll task
pub static FLOORS: [AtomicU16; CHANNELS] = [const { AtomicU16::new(0) }; CHANNELS];
