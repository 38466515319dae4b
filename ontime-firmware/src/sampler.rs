//! ADC channel sampling

use embassy_rp::adc::{Adc, Blocking, Channel};

use ontime_core::traits::{SampleError, SampleSource};
use ontime_core::ChannelId;

use crate::CHANNELS;

/// Reads the monitored inputs from the RP2040 ADC
pub struct AdcSampler {
    adc: Adc<'static, Blocking>,
    inputs: [Channel<'static>; CHANNELS],
}

impl AdcSampler {
    pub fn new(adc: Adc<'static, Blocking>, inputs: [Channel<'static>; CHANNELS]) -> Self {
        Self { adc, inputs }
    }
}

impl SampleSource for AdcSampler {
    fn read_raw(&mut self, channel: ChannelId) -> Result<u16, SampleError> {
        let input = self
            .inputs
            .get_mut(channel.index())
            .ok_or(SampleError::UnknownChannel)?;
        self.adc
            .blocking_read(input)
            .map_err(|_| SampleError::ConversionError)
    }
}
