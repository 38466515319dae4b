//! Threshold classifier
//!
//! Decides whether a channel is ON or OFF from a single raw reading.

/// Binary state of a monitored channel for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Classification {
    On,
    Off,
}

/// Classify a raw reading against a channel floor
///
/// Readings at or below the floor are OFF.
pub fn classify(raw_reading: u16, floor: u16) -> Classification {
    if raw_reading <= floor {
        Classification::Off
    } else {
        Classification::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_at_floor_is_off() {
        assert_eq!(classify(100, 100), Classification::Off);
        assert_eq!(classify(101, 100), Classification::On);
    }

    #[test]
    fn test_zero_floor() {
        // Default floor: any nonzero reading counts as ON
        assert_eq!(classify(0, 0), Classification::Off);
        assert_eq!(classify(1, 0), Classification::On);
    }

    #[test]
    fn test_max_floor_never_on() {
        assert_eq!(classify(u16::MAX, u16::MAX), Classification::Off);
    }
}
