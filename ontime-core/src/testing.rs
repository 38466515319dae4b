//! Test doubles shared by the unit tests

use std::cell::{Cell, RefCell};
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use ontime_protocol::{Cumulative, DesiredState, StateDocument};

use crate::channel::ChannelId;
use crate::reconcile::PushSeq;
use crate::traits::{RemoteStore, SampleError, SampleSource, TransportError};

/// Delay that elapses immediately, so any contended lock times out
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDelay;

impl DelayNs for ImmediateDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Request captured by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Push { seq: PushSeq, document: StateDocument },
    Fetch(ChannelId),
    Desired(DesiredState),
}

/// Remote store that records requests instead of sending them
#[derive(Debug, Default)]
pub struct RecordingStore {
    requests: RefCell<Vec<Request>>,
    pub fail_push: Cell<bool>,
    pub fail_fetch: Cell<bool>,
    pub fail_desired: Cell<bool>,
}

impl RecordingStore {
    pub fn take(&self) -> Vec<Request> {
        self.requests.take()
    }

    fn record(&self, fail: &Cell<bool>, request: Request) -> Result<(), TransportError> {
        if fail.get() {
            return Err(TransportError::QueueFull);
        }
        self.requests.borrow_mut().push(request);
        Ok(())
    }
}

impl RemoteStore for RecordingStore {
    fn push_state(&self, seq: PushSeq, document: &StateDocument) -> Result<(), TransportError> {
        self.record(
            &self.fail_push,
            Request::Push {
                seq,
                document: document.clone(),
            },
        )
    }

    fn request_cumulative(&self, channel: ChannelId) -> Result<(), TransportError> {
        self.record(&self.fail_fetch, Request::Fetch(channel))
    }

    fn write_desired(&self, desired: DesiredState) -> Result<(), TransportError> {
        self.record(&self.fail_desired, Request::Desired(desired))
    }
}

/// Sample source returning fixed readings per channel
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    pub readings: Vec<Result<u16, SampleError>>,
}

impl SampleSource for FixedSource {
    fn read_raw(&mut self, channel: ChannelId) -> Result<u16, SampleError> {
        self.readings
            .get(channel.index())
            .copied()
            .unwrap_or(Err(SampleError::UnknownChannel))
    }
}

/// Encoded cumulative payload as the store would return it
pub fn cumulative_payload(value: Cumulative) -> Vec<u8> {
    let mut buf = [0u8; 16];
    let used = value.encode(&mut buf).unwrap().len();
    buf[..used].to_vec()
}

/// Encoded desired-state payload; `None` is the null document
pub fn desired_payload(desired: Option<DesiredState>) -> Vec<u8> {
    let Some(desired) = desired else {
        // Absent option tag
        return std::vec![0];
    };
    let mut buf = [0u8; 8];
    let used = desired.encode(&mut buf).unwrap().len();
    buf[..used].to_vec()
}
