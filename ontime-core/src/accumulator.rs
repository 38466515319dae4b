//! Runtime accumulation
//!
//! Turns classified samples into ON spans and cumulative ON time.

use crate::channel::{Channel, Millis};
use crate::classifier::{classify, Classification};

/// Effect of one sample on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    /// Channel is ON; `credited_ms` was added to the span and the cumulative total
    On { credited_ms: u64 },
    /// Channel is OFF; any running span of `ended_span_ms` was closed
    Off { ended_span_ms: u64 },
}

impl Channel {
    /// Apply one raw reading taken at `now`
    ///
    /// An OFF reading ends the current span. An ON reading extends it by the
    /// time since the previous ON sample, or by 1 ms when it starts a new
    /// span. Cumulative time only grows here.
    pub fn record_sample(&mut self, raw_reading: u16, now: Millis) -> SampleOutcome {
        match classify(raw_reading, self.floor()) {
            Classification::Off => SampleOutcome::Off {
                ended_span_ms: self.end_span(),
            },
            Classification::On => SampleOutcome::On {
                credited_ms: self.credit_on(now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;
    use proptest::prelude::*;

    fn channel_with_floor(floor: u16) -> Channel {
        let mut ch = Channel::new(ChannelId(0));
        ch.set_floor(floor);
        ch
    }

    #[test]
    fn test_off_on_on_on_off_sequence() {
        let mut ch = channel_with_floor(100);

        assert_eq!(ch.record_sample(50, 0), SampleOutcome::Off { ended_span_ms: 0 });
        assert_eq!(ch.record_sample(200, 1_000), SampleOutcome::On { credited_ms: 1 });
        assert_eq!(ch.runtime_ms(), 1);
        assert_eq!(ch.unreported_ms(), 1);

        assert_eq!(ch.record_sample(200, 2_000), SampleOutcome::On { credited_ms: 1_000 });
        assert_eq!(ch.runtime_ms(), 1_001);
        assert_eq!(ch.unreported_ms(), 1_001);

        ch.record_sample(200, 3_500);
        assert_eq!(ch.runtime_ms(), 2_501);
        assert_eq!(ch.unreported_ms(), 2_501);

        assert_eq!(
            ch.record_sample(10, 4_000),
            SampleOutcome::Off { ended_span_ms: 2_501 }
        );
        assert_eq!(ch.runtime_ms(), 0);
        assert_eq!(ch.last_on(), None);
        assert_eq!(ch.unreported_ms(), 2_501);
    }

    #[test]
    fn test_new_span_after_off_starts_at_one() {
        let mut ch = channel_with_floor(0);
        ch.record_sample(5, 100);
        ch.record_sample(5, 200);
        ch.record_sample(0, 300);
        assert_eq!(ch.record_sample(5, 10_000), SampleOutcome::On { credited_ms: 1 });
        assert_eq!(ch.runtime_ms(), 1);
        assert_eq!(ch.unreported_ms(), 102);
    }

    #[test]
    fn test_clock_going_backwards_credits_nothing() {
        let mut ch = channel_with_floor(0);
        ch.record_sample(5, 1_000);
        assert_eq!(ch.record_sample(5, 900), SampleOutcome::On { credited_ms: 0 });
        assert_eq!(ch.runtime_ms(), 1);
    }

    proptest! {
        #[test]
        fn prop_cumulative_never_decreases(
            floor in 0u16..1000,
            samples in prop::collection::vec((0u16..2000, 0u64..5_000), 1..64),
        ) {
            let mut ch = channel_with_floor(floor);
            let mut now = 0u64;
            let mut prev_cumulative = 0u64;
            for (raw, step) in samples {
                now += step;
                ch.record_sample(raw, now);
                prop_assert!(ch.cumulative_ms() >= prev_cumulative);
                prev_cumulative = ch.cumulative_ms();
            }
        }

        #[test]
        fn prop_runtime_is_zero_iff_off(
            floor in 0u16..1000,
            samples in prop::collection::vec((0u16..2000, 0u64..5_000), 1..64),
        ) {
            let mut ch = channel_with_floor(floor);
            let mut now = 0u64;
            for (raw, step) in samples {
                now += step;
                ch.record_sample(raw, now);
                if raw <= floor {
                    prop_assert_eq!(ch.runtime_ms(), 0);
                    prop_assert_eq!(ch.last_on(), None);
                } else {
                    prop_assert!(ch.runtime_ms() > 0);
                    prop_assert_eq!(ch.last_on(), Some(now));
                }
            }
        }

        #[test]
        fn prop_span_runtime_matches_elapsed(
            start in 0u64..1_000_000,
            steps in prop::collection::vec(1u64..10_000, 0..32),
        ) {
            let mut ch = channel_with_floor(0);
            let mut now = start;
            ch.record_sample(1, now);
            for step in &steps {
                now += step;
                ch.record_sample(1, now);
            }
            prop_assert_eq!(ch.runtime_ms(), 1 + (now - start));
            prop_assert_eq!(ch.unreported_ms(), ch.runtime_ms());
        }
    }
}
