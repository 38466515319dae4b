//! Per-channel accumulation state

/// Monotonic time in milliseconds since boot
pub type Millis = u64;

/// Index of a monitored channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Runtime and cumulative bookkeeping for one channel
///
/// The cumulative ON time known to this device is
/// `cloud_baseline_ms + unreported_ms`. The baseline is the last value the
/// remote store is known to hold; `unreported_ms` is ON time accrued since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    id: ChannelId,
    /// Readings at or below this are OFF
    floor: u16,
    /// Timestamp of the previous ON sample in the current span
    last_on: Option<Millis>,
    /// Length of the current contiguous ON span
    runtime_ms: u64,
    /// ON time not yet confirmed by the remote store
    unreported_ms: u64,
    /// Last cumulative value known to be held remotely
    cloud_baseline_ms: u64,
    /// Baseline has been fetched (or defaulted) since boot
    baseline_loaded: bool,
}

impl Channel {
    pub const fn new(id: ChannelId) -> Self {
        Self {
            id,
            floor: 0,
            last_on: None,
            runtime_ms: 0,
            unreported_ms: 0,
            cloud_baseline_ms: 0,
            baseline_loaded: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn floor(&self) -> u16 {
        self.floor
    }

    pub fn set_floor(&mut self, floor: u16) {
        self.floor = floor;
    }

    pub fn last_on(&self) -> Option<Millis> {
        self.last_on
    }

    pub fn runtime_ms(&self) -> u64 {
        self.runtime_ms
    }

    pub fn unreported_ms(&self) -> u64 {
        self.unreported_ms
    }

    pub fn cloud_baseline_ms(&self) -> u64 {
        self.cloud_baseline_ms
    }

    pub fn baseline_loaded(&self) -> bool {
        self.baseline_loaded
    }

    /// Cumulative ON time: remote baseline plus local unreported time
    pub fn cumulative_ms(&self) -> u64 {
        self.cloud_baseline_ms.saturating_add(self.unreported_ms)
    }

    /// Start or continue an ON span at `now`, returning the credited time
    pub(crate) fn credit_on(&mut self, now: Millis) -> u64 {
        // First ON sample of a span is credited 1 ms
        let duration = match self.last_on {
            Some(prev) => now.saturating_sub(prev),
            None => 1,
        };
        self.runtime_ms = self.runtime_ms.saturating_add(duration);
        self.unreported_ms = self.unreported_ms.saturating_add(duration);
        self.last_on = Some(now);
        duration
    }

    /// End the current ON span, returning its length
    pub(crate) fn end_span(&mut self) -> u64 {
        self.last_on = None;
        core::mem::take(&mut self.runtime_ms)
    }

    /// Adopt a fetched baseline
    ///
    /// Returns false (and changes nothing) when a baseline is already loaded.
    pub(crate) fn load_baseline(&mut self, baseline_ms: u64) -> bool {
        if self.baseline_loaded {
            return false;
        }
        self.cloud_baseline_ms = baseline_ms;
        self.baseline_loaded = true;
        true
    }

    /// Fold unreported time confirmed by a stored total into the baseline
    ///
    /// `stored_total` is the cumulative value the remote store acknowledged.
    /// Only the part above the current baseline is moved, capped at what is
    /// still unreported, so the cumulative total never changes.
    pub(crate) fn fold_confirmed(&mut self, stored_total: u64) -> u64 {
        let confirmed = stored_total
            .saturating_sub(self.cloud_baseline_ms)
            .min(self.unreported_ms);
        self.cloud_baseline_ms += confirmed;
        self.unreported_ms -= confirmed;
        confirmed
    }

    /// Zero the cumulative total
    ///
    /// The live span keeps running. An unloaded channel becomes loaded with
    /// a zero baseline; fetch responses after a reset are ignored.
    pub(crate) fn reset_cumulative(&mut self) {
        self.cloud_baseline_ms = 0;
        self.unreported_ms = 0;
        self.baseline_loaded = true;
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            id: self.id,
            floor: self.floor,
            on: self.last_on.is_some(),
            runtime_ms: self.runtime_ms,
            unreported_ms: self.unreported_ms,
            cloud_baseline_ms: self.cloud_baseline_ms,
            baseline_loaded: self.baseline_loaded,
        }
    }
}

/// Point-in-time copy of a channel, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub floor: u16,
    pub on: bool,
    pub runtime_ms: u64,
    pub unreported_ms: u64,
    pub cloud_baseline_ms: u64,
    pub baseline_loaded: bool,
}

impl ChannelSnapshot {
    pub fn cumulative_ms(&self) -> u64 {
        self.cloud_baseline_ms.saturating_add(self.unreported_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(baseline: u64, unreported: u64) -> Channel {
        let mut ch = Channel::new(ChannelId(0));
        ch.load_baseline(baseline);
        ch.unreported_ms = unreported;
        ch
    }

    #[test]
    fn test_new_channel_is_idle_and_unloaded() {
        let ch = Channel::new(ChannelId(1));
        assert_eq!(ch.id(), ChannelId(1));
        assert_eq!(ch.floor(), 0);
        assert_eq!(ch.last_on(), None);
        assert_eq!(ch.cumulative_ms(), 0);
        assert!(!ch.baseline_loaded());
    }

    #[test]
    fn test_load_baseline_once() {
        let mut ch = Channel::new(ChannelId(0));
        assert!(ch.load_baseline(5_000));
        assert!(!ch.load_baseline(9_000));
        assert_eq!(ch.cloud_baseline_ms(), 5_000);
    }

    #[test]
    fn test_fold_moves_confirmed_time() {
        let mut ch = loaded(10_000, 2_000);
        assert_eq!(ch.fold_confirmed(12_000), 2_000);
        assert_eq!(ch.cloud_baseline_ms(), 12_000);
        assert_eq!(ch.unreported_ms(), 0);
    }

    #[test]
    fn test_fold_keeps_time_accrued_after_push() {
        // Pushed 12_000, then 500 ms more accrued before the ack
        let mut ch = loaded(10_000, 2_500);
        assert_eq!(ch.fold_confirmed(12_000), 2_000);
        assert_eq!(ch.cloud_baseline_ms(), 12_000);
        assert_eq!(ch.unreported_ms(), 500);
        assert_eq!(ch.cumulative_ms(), 12_500);
    }

    #[test]
    fn test_fold_of_older_total_is_noop() {
        let mut ch = loaded(12_000, 500);
        assert_eq!(ch.fold_confirmed(11_000), 0);
        assert_eq!(ch.cumulative_ms(), 12_500);
    }

    #[test]
    fn test_reset_keeps_live_span() {
        let mut ch = loaded(10_000, 300);
        ch.credit_on(1_000);
        ch.reset_cumulative();
        assert_eq!(ch.cumulative_ms(), 0);
        assert_eq!(ch.runtime_ms(), 1);
        assert_eq!(ch.last_on(), Some(1_000));
        assert!(ch.baseline_loaded());
    }

    #[test]
    fn test_reset_before_load_marks_loaded() {
        let mut ch = Channel::new(ChannelId(0));
        ch.credit_on(0);
        ch.reset_cumulative();
        assert!(ch.baseline_loaded());
        assert!(!ch.load_baseline(40_000));
        assert_eq!(ch.cumulative_ms(), 0);
    }
}
