//! Raw channel sampling

use crate::channel::ChannelId;

/// Errors that can occur while sampling a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// No input is wired to this channel
    UnknownChannel,
    /// ADC conversion failed
    ConversionError,
}

/// Source of raw channel readings
///
/// Implementations wrap the board ADC. A failed read leaves the channel
/// untouched for that cycle.
pub trait SampleSource {
    /// Read the raw value of `channel`
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_raw(&mut self, channel: ChannelId) -> Result<u16, SampleError>;
}
