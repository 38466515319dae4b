//! Poll task
//!
//! Every loop delay: sample each channel, update its runtime, then report
//! to the remote store. A settings change wakes the loop early.

use defmt::*;
use embassy_futures::select::select;
use embassy_time::{Duration, Instant, Timer};
use portable_atomic::Ordering;

use ontime_core::reconcile::ChannelPoll;
use ontime_core::ChannelId;

use crate::channels::{FLOORS, LOOP_DELAY_S, POLL_WAKE};
use crate::sampler::AdcSampler;
use crate::{AppMonitor, CHANNELS};

#[embassy_executor::task]
pub async fn poll_task(monitor: &'static AppMonitor, mut sampler: AdcSampler) {
    info!("Poll task started");

    // Floors currently held by the monitor
    let mut applied: [Option<u16>; CHANNELS] = [None; CHANNELS];

    loop {
        sync_floors(monitor, &mut applied).await;

        let now = Instant::now().as_millis();
        for index in 0..CHANNELS {
            let channel = ChannelId(index as u8);
            match monitor.poll_channel(&mut sampler, channel, now).await {
                ChannelPoll::Updated(outcome) => trace!("ch{}: {:?}", index, outcome),
                ChannelPoll::SampleFailed(e) => warn!("ch{}: sample failed: {:?}", index, e),
                ChannelPoll::Skipped(e) => warn!("ch{}: update skipped: {:?}", index, e),
            }
        }

        match monitor.snapshot().await {
            Ok(channels) => {
                for ch in channels.iter() {
                    info!(
                        "ch{}: runtime={}ms cumulative={}ms synced={}",
                        ch.id.0,
                        ch.runtime_ms,
                        ch.cumulative_ms(),
                        ch.baseline_loaded
                    );
                }
            }
            Err(e) => debug!("Snapshot skipped: {:?}", e),
        }

        match monitor.report().await {
            Ok(summary) => {
                debug!(
                    "Report {} sent (cumulative={}, fetches={})",
                    summary.seq.0, summary.cumulative_included, summary.fetches_requested
                );
                if let Some(e) = summary.fetch_error {
                    warn!("Baseline fetch not sent: {:?}", e);
                }
            }
            Err(e) => warn!("Report skipped: {:?}", e),
        }

        let delay_s = LOOP_DELAY_S.load(Ordering::Relaxed);
        select(
            Timer::after(Duration::from_secs(delay_s as u64)),
            POLL_WAKE.wait(),
        )
        .await;
    }
}

/// Push changed floors into the monitor; failures retry next cycle
async fn sync_floors(monitor: &AppMonitor, applied: &mut [Option<u16>; CHANNELS]) {
    for (index, slot) in applied.iter_mut().enumerate() {
        let floor = FLOORS[index].load(Ordering::Relaxed);
        if *slot == Some(floor) {
            continue;
        }
        match monitor.set_floor(ChannelId(index as u8), floor).await {
            Ok(()) => {
                info!("ch{}: floor set to {}", index, floor);
                *slot = Some(floor);
            }
            Err(e) => warn!("ch{}: floor change deferred: {:?}", index, e),
        }
    }
}
