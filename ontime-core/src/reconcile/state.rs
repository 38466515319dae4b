//! Guarded monitor state
//!
//! Everything the sampling and link paths share: the channels plus the
//! bookkeeping that pairs pushes with their acknowledgements. All methods
//! here are synchronous and run with the guard held.

use heapless::Vec;
use ontime_protocol::{Cumulative, DocumentError, StateDocument, MAX_CHANNELS};

use super::events::{FetchResult, PushResult, PushSeq};
use super::MonitorError;
use crate::accumulator::SampleOutcome;
use crate::channel::{Channel, ChannelId, ChannelSnapshot, Millis};

/// Maximum pushes awaiting acknowledgement
pub const MAX_IN_FLIGHT: usize = 4;

/// Count of cumulative resets since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Epoch(pub u32);

/// Totals carried by a push that has not been acknowledged yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PushTicket<const N: usize> {
    seq: PushSeq,
    totals: [u64; N],
}

/// A report ready to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPlan<const N: usize> {
    pub seq: PushSeq,
    pub document: StateDocument,
    /// The document carries cumulative totals and awaits acknowledgement
    pub tracked: bool,
    /// Channels whose baseline must be fetched
    pub fetches: Vec<ChannelId, N>,
}

/// Result of applying a push completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FoldOutcome<const N: usize> {
    /// Confirmed time moved from unreported into the baseline, per channel
    Folded { folded_ms: [u64; N] },
    /// Push failed; unreported time is kept for the next report
    Retained,
    /// No matching push (live-only, evicted, or issued before a reset)
    Untracked,
}

/// Where a loaded baseline came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaselineSource {
    /// Value held by the store
    Stored,
    /// The store has no value yet
    Absent,
    /// The stored value could not be decoded
    Malformed,
}

/// Result of applying a fetch completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchOutcome {
    Loaded {
        baseline_ms: u64,
        source: BaselineSource,
    },
    /// Baseline was already loaded (or reset); the response was ignored
    AlreadyLoaded,
    /// The fetch failed; it is retried on the next report
    Failed,
}

/// State shared between the poll and link contexts
#[derive(Debug, Clone)]
pub struct MonitorState<const N: usize> {
    channels: [Channel; N],
    epoch: Epoch,
    next_seq: u8,
    in_flight: Vec<PushTicket<N>, MAX_IN_FLIGHT>,
}

impl<const N: usize> Default for MonitorState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MonitorState<N> {
    const FITS_DOCUMENT: () = assert!(N <= MAX_CHANNELS, "too many channels for a state document");

    pub fn new() -> Self {
        let () = Self::FITS_DOCUMENT;
        Self {
            channels: core::array::from_fn(|i| Channel::new(ChannelId(i as u8))),
            epoch: Epoch::default(),
            next_seq: 0,
            in_flight: Vec::new(),
        }
    }

    pub fn channels(&self) -> &[Channel; N] {
        &self.channels
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.index())
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, MonitorError> {
        self.channels
            .get_mut(id.index())
            .ok_or(MonitorError::UnknownChannel(id))
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn all_baselines_loaded(&self) -> bool {
        self.channels.iter().all(Channel::baseline_loaded)
    }

    /// Channels still waiting for their stored baseline
    ///
    /// Every report asks again for all of these, so a lost response only
    /// delays the sync by one cycle.
    pub fn unloaded_channels(&self) -> Vec<ChannelId, N> {
        self.channels
            .iter()
            .filter(|ch| !ch.baseline_loaded())
            .map(Channel::id)
            .collect()
    }

    pub fn record_sample(
        &mut self,
        id: ChannelId,
        raw_reading: u16,
        now: Millis,
    ) -> Result<SampleOutcome, MonitorError> {
        Ok(self.channel_mut(id)?.record_sample(raw_reading, now))
    }

    pub fn set_floor(&mut self, id: ChannelId, floor: u16) -> Result<(), MonitorError> {
        self.channel_mut(id)?.set_floor(floor);
        Ok(())
    }

    /// Build the next state document
    ///
    /// Live runtime is always included. Cumulative totals are included only
    /// once every baseline is loaded, and the push is then tracked until its
    /// completion arrives. Otherwise the unloaded channels are returned for
    /// fetching.
    pub fn prepare_report(&mut self) -> Result<ReportPlan<N>, DocumentError> {
        let mut document = StateDocument::default();
        for ch in &self.channels {
            document.push_live(ch.id().0, ch.runtime_ms())?;
        }

        let seq = PushSeq(self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);

        if !self.all_baselines_loaded() {
            return Ok(ReportPlan {
                seq,
                document,
                tracked: false,
                fetches: self.unloaded_channels(),
            });
        }

        let mut totals = [0u64; N];
        for (total, ch) in totals.iter_mut().zip(&self.channels) {
            *total = ch.cumulative_ms();
            document.push_cumulative(ch.id().0, *total)?;
        }
        self.track(PushTicket { seq, totals });

        Ok(ReportPlan {
            seq,
            document,
            tracked: true,
            fetches: Vec::new(),
        })
    }

    fn track(&mut self, ticket: PushTicket<N>) {
        self.forget(ticket.seq);
        if self.in_flight.is_full() {
            self.in_flight.remove(0);
        }
        // Room was made above
        let _ = self.in_flight.push(ticket);
    }

    fn forget(&mut self, seq: PushSeq) -> Option<PushTicket<N>> {
        let pos = self.in_flight.iter().position(|t| t.seq == seq)?;
        Some(self.in_flight.remove(pos))
    }

    /// Drop a push that never reached the link
    pub fn abandon_push(&mut self, seq: PushSeq) {
        self.forget(seq);
    }

    /// Apply the completion of push `seq`
    pub fn complete_push(&mut self, seq: PushSeq, result: PushResult) -> FoldOutcome<N> {
        let ticket = self.forget(seq);
        match (result, ticket) {
            (PushResult::Failed, _) => FoldOutcome::Retained,
            (PushResult::Acked, None) => FoldOutcome::Untracked,
            (PushResult::Acked, Some(ticket)) => {
                let mut folded_ms = [0u64; N];
                for ((folded, ch), total) in folded_ms
                    .iter_mut()
                    .zip(self.channels.iter_mut())
                    .zip(ticket.totals)
                {
                    *folded = ch.fold_confirmed(total);
                }
                FoldOutcome::Folded { folded_ms }
            }
        }
    }

    /// Apply the completion of a baseline fetch for `id`
    ///
    /// A missing or undecodable stored value loads a zero baseline. A failed
    /// fetch leaves the channel unloaded for the next report to retry.
    pub fn apply_fetch(
        &mut self,
        id: ChannelId,
        result: FetchResult<'_>,
    ) -> Result<FetchOutcome, MonitorError> {
        let ch = self.channel_mut(id)?;
        let bytes = match result {
            FetchResult::Failed => return Ok(FetchOutcome::Failed),
            FetchResult::Payload(bytes) => bytes,
        };
        let (baseline_ms, source) = match Cumulative::decode(bytes) {
            Ok(Cumulative::Value(ms)) => (ms, BaselineSource::Stored),
            Ok(Cumulative::Absent) => (0, BaselineSource::Absent),
            Err(_) => (0, BaselineSource::Malformed),
        };
        if !ch.load_baseline(baseline_ms) {
            return Ok(FetchOutcome::AlreadyLoaded);
        }
        Ok(FetchOutcome::Loaded {
            baseline_ms,
            source,
        })
    }

    /// Zero every channel's cumulative total
    ///
    /// Starts a new epoch: pushes issued before it are no longer tracked.
    pub fn reset_cumulative(&mut self) -> Epoch {
        for ch in self.channels.iter_mut() {
            ch.reset_cumulative();
        }
        self.in_flight.clear();
        self.epoch = Epoch(self.epoch.0.wrapping_add(1));
        self.epoch
    }

    pub fn snapshot(&self) -> [ChannelSnapshot; N] {
        core::array::from_fn(|i| self.channels[i].snapshot())
    }
}
