//! Remote setting updates
//!
//! Settings arrive from the gateway as key/value pairs. Each is validated
//! here and answered with a [`SettingCode`].
//!
//! | Key              | Range            | Default |
//! |------------------|------------------|---------|
//! | `LOOP_DELAY_S`   | 1..=43200        | 60      |
//! | `ADC_FLOOR_CH<n>`| 0..=65535        | 0       |

use ontime_protocol::{SettingCode, SettingValue};

use super::types::{MonitorConfig, LOOP_DELAY_MAX_S, LOOP_DELAY_MIN_S};
use crate::channel::ChannelId;

pub const LOOP_DELAY_KEY: &str = "LOOP_DELAY_S";
pub const FLOOR_KEY_PREFIX: &str = "ADC_FLOOR_CH";

/// A validated setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
    LoopDelay { seconds: u32 },
    Floor { channel: ChannelId, floor: u16 },
}

/// Whether applying a setting changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingChange {
    Unchanged,
    Changed,
}

impl Setting {
    /// Validate a key/value pair
    pub fn parse(key: &str, value: &SettingValue) -> Result<Self, SettingCode> {
        if key == LOOP_DELAY_KEY {
            let seconds = integer(value)?;
            return u32::try_from(seconds)
                .ok()
                .filter(|s| (LOOP_DELAY_MIN_S..=LOOP_DELAY_MAX_S).contains(s))
                .map(|seconds| Setting::LoopDelay { seconds })
                .ok_or(SettingCode::ValueOutsideRange);
        }

        if let Some(index) = key.strip_prefix(FLOOR_KEY_PREFIX) {
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SettingCode::KeyNotRecognized);
            }
            let channel = index
                .parse::<u8>()
                .map_err(|_| SettingCode::KeyNotRecognized)?;
            let floor =
                u16::try_from(integer(value)?).map_err(|_| SettingCode::ValueOutsideRange)?;
            return Ok(Setting::Floor {
                channel: ChannelId(channel),
                floor,
            });
        }

        Err(SettingCode::KeyNotRecognized)
    }
}

fn integer(value: &SettingValue) -> Result<i64, SettingCode> {
    match value {
        SettingValue::Int(v) => Ok(*v),
        _ => Err(SettingCode::ValueFormatNotValid),
    }
}

impl MonitorConfig {
    /// Apply a validated setting
    ///
    /// A floor for a channel this board does not have is an unknown key.
    pub fn apply(&mut self, setting: Setting) -> Result<SettingChange, SettingCode> {
        match setting {
            Setting::LoopDelay { seconds } => Ok(replace(&mut self.loop_delay_s, seconds)),
            Setting::Floor { channel, floor } => {
                let slot = self
                    .floors
                    .get_mut(channel.index())
                    .ok_or(SettingCode::KeyNotRecognized)?;
                Ok(replace(slot, floor))
            }
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> SettingChange {
    if *slot == value {
        return SettingChange::Unchanged;
    }
    *slot = value;
    SettingChange::Changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn text(s: &str) -> SettingValue {
        SettingValue::Text(String::try_from(s).unwrap())
    }

    #[test]
    fn test_loop_delay_range() {
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &SettingValue::Int(30)),
            Ok(Setting::LoopDelay { seconds: 30 })
        );
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &SettingValue::Int(43_200)),
            Ok(Setting::LoopDelay { seconds: 43_200 })
        );
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &SettingValue::Int(0)),
            Err(SettingCode::ValueOutsideRange)
        );
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &SettingValue::Int(43_201)),
            Err(SettingCode::ValueOutsideRange)
        );
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &SettingValue::Int(-5)),
            Err(SettingCode::ValueOutsideRange)
        );
    }

    #[test]
    fn test_floor_keys() {
        assert_eq!(
            Setting::parse("ADC_FLOOR_CH1", &SettingValue::Int(65_535)),
            Ok(Setting::Floor {
                channel: ChannelId(1),
                floor: 65_535
            })
        );
        assert_eq!(
            Setting::parse("ADC_FLOOR_CH0", &SettingValue::Int(65_536)),
            Err(SettingCode::ValueOutsideRange)
        );
        assert_eq!(
            Setting::parse("ADC_FLOOR_CH", &SettingValue::Int(1)),
            Err(SettingCode::KeyNotRecognized)
        );
        assert_eq!(
            Setting::parse("ADC_FLOOR_CH+1", &SettingValue::Int(1)),
            Err(SettingCode::KeyNotRecognized)
        );
    }

    #[test]
    fn test_wrong_value_type() {
        assert_eq!(
            Setting::parse("LOOP_DELAY_S", &text("60")),
            Err(SettingCode::ValueFormatNotValid)
        );
        assert_eq!(
            Setting::parse("ADC_FLOOR_CH0", &SettingValue::Bool(true)),
            Err(SettingCode::ValueFormatNotValid)
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            Setting::parse("FLOOR", &SettingValue::Int(1)),
            Err(SettingCode::KeyNotRecognized)
        );
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut config = MonitorConfig::default();
        assert_eq!(config.loop_delay_s, 60);
        assert_eq!(
            config.apply(Setting::LoopDelay { seconds: 60 }),
            Ok(SettingChange::Unchanged)
        );
        assert_eq!(
            config.apply(Setting::LoopDelay { seconds: 5 }),
            Ok(SettingChange::Changed)
        );
        assert_eq!(config.loop_delay_s, 5);

        let floor = Setting::Floor {
            channel: ChannelId(1),
            floor: 300,
        };
        assert_eq!(config.apply(floor), Ok(SettingChange::Changed));
        assert_eq!(config.apply(floor), Ok(SettingChange::Unchanged));
        assert_eq!(config.floor(1), Some(300));
    }

    #[test]
    fn test_apply_floor_for_missing_channel() {
        let mut config = MonitorConfig::default();
        assert_eq!(
            config.apply(Setting::Floor {
                channel: ChannelId(3),
                floor: 1
            }),
            Err(SettingCode::KeyNotRecognized)
        );
    }
}
