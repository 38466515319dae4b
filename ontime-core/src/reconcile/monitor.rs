//! Reconciliation coordinator
//!
//! [`Monitor`] owns the guarded [`MonitorState`] and the remote store handle.
//! The poll task calls [`Monitor::poll_channel`] and [`Monitor::report`]; the
//! link task feeds completions through [`Monitor::handle_event`]. Every state
//! access is bounded by a [`LockBudget`], and no call waits on the network.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use ontime_protocol::DesiredState;

use super::events::{FetchResult, LinkEvent, PushResult, PushSeq};
use super::state::{Epoch, FetchOutcome, FoldOutcome, MonitorState};
use super::MonitorError;
use crate::accumulator::SampleOutcome;
use crate::channel::{ChannelId, ChannelSnapshot, Millis};
use crate::guard::{Guard, LockBudget};
use crate::traits::{RemoteStore, SampleError, SampleSource, TransportError};

/// Result of sampling one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPoll {
    Updated(SampleOutcome),
    /// The reading failed; the channel was left untouched
    SampleFailed(SampleError),
    /// The update was skipped this cycle
    Skipped(MonitorError),
}

/// What a dispatched report carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportSummary {
    pub seq: PushSeq,
    /// Cumulative totals were included and await acknowledgement
    pub cumulative_included: bool,
    /// Baseline fetches handed to the link
    pub fetches_requested: u8,
    /// First fetch request the link refused, if any
    pub fetch_error: Option<TransportError>,
}

/// Result of a desired-state update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesiredOutcome {
    /// Cumulative totals were zeroed and the request flag cleared
    ResetApplied { epoch: Epoch },
    /// The document asks for nothing
    NothingRequested,
    /// The document was null or unreadable and was rewritten with defaults
    RestoredDefaults { malformed: bool },
}

/// Result of handling a link event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventOutcome<const N: usize> {
    Connected { fetches_requested: u8 },
    Disconnected,
    Push(FoldOutcome<N>),
    Fetch(FetchOutcome),
    Desired(DesiredOutcome),
}

/// Channel monitor bound to a remote store
///
/// `M` selects the mutex flavour (`CriticalSectionRawMutex` on target,
/// `NoopRawMutex` in single-threaded tests), `D` times lock deadlines.
pub struct Monitor<M: RawMutex, T, D, const N: usize> {
    state: Guard<M, MonitorState<N>, D>,
    store: T,
}

impl<M, T, D, const N: usize> Monitor<M, T, D, N>
where
    M: RawMutex,
    T: RemoteStore,
    D: DelayNs + Clone,
{
    pub fn new(store: T, delay: D) -> Self {
        Self {
            state: Guard::new(MonitorState::new(), delay),
            store,
        }
    }

    /// Apply one raw reading to `channel`
    pub async fn update(
        &self,
        channel: ChannelId,
        raw_reading: u16,
        now: Millis,
    ) -> Result<SampleOutcome, MonitorError> {
        let mut state = self.state.lock_within(LockBudget::Routine).await?;
        state.record_sample(channel, raw_reading, now)
    }

    /// Read `channel` from `source` and apply the reading
    ///
    /// The ADC is read before the state is locked.
    pub async fn poll_channel<S: SampleSource>(
        &self,
        source: &mut S,
        channel: ChannelId,
        now: Millis,
    ) -> ChannelPoll {
        let raw = match source.read_raw(channel) {
            Ok(raw) => raw,
            Err(e) => return ChannelPoll::SampleFailed(e),
        };
        match self.update(channel, raw, now).await {
            Ok(outcome) => ChannelPoll::Updated(outcome),
            Err(e) => ChannelPoll::Skipped(e),
        }
    }

    /// Push the current state to the store
    ///
    /// The document is built under the guard and dispatched after it is
    /// released. Until every baseline is loaded the document carries live
    /// runtime only, and each unloaded channel gets a fetch request on every
    /// call. A refused push leaves all unreported time in place.
    pub async fn report(&self) -> Result<ReportSummary, MonitorError> {
        let plan = {
            let mut state = self.state.lock_within(LockBudget::Routine).await?;
            state.prepare_report()?
        };

        let mut fetches_requested = 0;
        let mut fetch_error = None;
        for &channel in &plan.fetches {
            match self.store.request_cumulative(channel) {
                Ok(()) => fetches_requested += 1,
                Err(e) => {
                    fetch_error.get_or_insert(e);
                }
            }
        }

        if let Err(e) = self.store.push_state(plan.seq, &plan.document) {
            if plan.tracked {
                // The push never left; drop its ticket if the state is free
                if let Ok(mut state) = self.state.lock_within(LockBudget::Routine).await {
                    state.abandon_push(plan.seq);
                }
            }
            return Err(e.into());
        }

        Ok(ReportSummary {
            seq: plan.seq,
            cumulative_included: plan.tracked,
            fetches_requested,
            fetch_error,
        })
    }

    /// Request the stored cumulative value for `channel`
    ///
    /// Reports and reconnects request fetches on their own; this is for
    /// callers that want a baseline re-read outside that cycle.
    pub async fn request_baseline_fetch(&self, channel: ChannelId) -> Result<(), MonitorError> {
        {
            let state = self.state.lock_within(LockBudget::Routine).await?;
            if state.channel(channel).is_none() {
                return Err(MonitorError::UnknownChannel(channel));
            }
        }
        self.store.request_cumulative(channel)?;
        Ok(())
    }

    /// Apply the completion of push `seq`
    pub async fn on_push_result(
        &self,
        seq: PushSeq,
        result: PushResult,
    ) -> Result<FoldOutcome<N>, MonitorError> {
        let mut state = self.state.lock_within(LockBudget::Routine).await?;
        Ok(state.complete_push(seq, result))
    }

    /// Apply a baseline fetch response for `channel`
    pub async fn on_fetch_result(
        &self,
        channel: ChannelId,
        result: FetchResult<'_>,
    ) -> Result<FetchOutcome, MonitorError> {
        let mut state = self.state.lock_within(LockBudget::Routine).await?;
        state.apply_fetch(channel, result)
    }

    /// Zero every channel's cumulative total
    ///
    /// Channels whose baseline was never fetched count as loaded at zero
    /// afterwards, so the value still held by the store is overwritten by
    /// the next push rather than fetched back.
    pub async fn reset(&self) -> Result<Epoch, MonitorError> {
        let mut state = self.state.lock_within(LockBudget::Reset).await?;
        Ok(state.reset_cumulative())
    }

    /// Act on a desired-state document
    ///
    /// A reset request is performed and then cleared remotely. If the reset
    /// cannot take the lock the flag is left set, so the request is
    /// delivered again. A null or unreadable document is restored to
    /// defaults without resetting.
    pub async fn on_desired_state(
        &self,
        payload: &[u8],
    ) -> Result<DesiredOutcome, MonitorError> {
        let outcome = match DesiredState::decode(payload) {
            Ok(Some(desired)) if desired.reset_cumulative => DesiredOutcome::ResetApplied {
                epoch: self.reset().await?,
            },
            Ok(Some(_)) => return Ok(DesiredOutcome::NothingRequested),
            Ok(None) => DesiredOutcome::RestoredDefaults { malformed: false },
            Err(_) => DesiredOutcome::RestoredDefaults { malformed: true },
        };
        self.store.write_desired(DesiredState::default())?;
        Ok(outcome)
    }

    /// Link came up: fetch every baseline not yet loaded
    pub async fn on_connected(&self) -> Result<u8, MonitorError> {
        let fetches = self
            .state
            .lock_within(LockBudget::Routine)
            .await?
            .unloaded_channels();
        let mut requested = 0;
        for &channel in &fetches {
            self.store.request_cumulative(channel)?;
            requested += 1;
        }
        Ok(requested)
    }

    /// Dispatch a link event
    pub async fn handle_event(
        &self,
        event: LinkEvent<'_>,
    ) -> Result<EventOutcome<N>, MonitorError> {
        match event {
            LinkEvent::Connected => Ok(EventOutcome::Connected {
                fetches_requested: self.on_connected().await?,
            }),
            // Unanswered fetches are asked again by the next report
            LinkEvent::Disconnected => Ok(EventOutcome::Disconnected),
            LinkEvent::PushCompleted { seq, result } => {
                Ok(EventOutcome::Push(self.on_push_result(seq, result).await?))
            }
            LinkEvent::CumulativeFetched { channel, result } => {
                Ok(EventOutcome::Fetch(self.on_fetch_result(channel, result).await?))
            }
            LinkEvent::DesiredState { payload } => {
                Ok(EventOutcome::Desired(self.on_desired_state(payload).await?))
            }
        }
    }

    /// Change the OFF threshold of `channel`
    pub async fn set_floor(&self, channel: ChannelId, floor: u16) -> Result<(), MonitorError> {
        let mut state = self.state.lock_within(LockBudget::Routine).await?;
        state.set_floor(channel, floor)
    }

    pub async fn snapshot(&self) -> Result<[ChannelSnapshot; N], MonitorError> {
        let state = self.state.lock_within(LockBudget::Routine).await?;
        Ok(state.snapshot())
    }
}
