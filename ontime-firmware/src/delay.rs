//! Lock deadline timer

use embassy_time::{Duration, Timer};
use embedded_hal_async::delay::DelayNs;

/// `DelayNs` backed by the embassy time driver
#[derive(Clone, Copy, Default)]
pub struct TimerDelay;

impl DelayNs for TimerDelay {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after(Duration::from_nanos(ns as u64)).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after(Duration::from_millis(ms as u64)).await
    }
}
