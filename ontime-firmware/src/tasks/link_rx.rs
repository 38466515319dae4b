//! Gateway UART receive task
//!
//! Parses frames from the gateway, feeds link events to the monitor and
//! answers setting updates.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use portable_atomic::Ordering;

use ontime_core::config::{MonitorConfig, Setting, SettingChange};
use ontime_core::reconcile::{DesiredOutcome, EventOutcome, FetchOutcome, FoldOutcome};
use ontime_core::LinkEvent;
use ontime_protocol::{DeviceMessage, FrameParser, GatewayMessage, SettingCode, SettingValue};

use crate::channels::{FLOORS, LINK_UP, LOOP_DELAY_S, OUTBOX, POLL_WAKE};
use crate::{AppMonitor, CHANNELS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx, monitor: &'static AppMonitor) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut config = MonitorConfig::with_channels(CHANNELS);
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match GatewayMessage::from_frame(&frame) {
                            Ok(msg) => handle_message(msg, monitor, &mut config).await,
                            Err(e) => warn!("Failed to parse gateway message: {:?}", e),
                        },
                        Ok(None) => {}
                        Err(e) => warn!("Frame parse error: {:?}", e),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("UART read error: {:?}", e),
        }
    }
}

async fn handle_message(msg: GatewayMessage, monitor: &AppMonitor, config: &mut MonitorConfig) {
    match &msg {
        GatewayMessage::Connected => {
            info!("Gateway connected");
            LINK_UP.store(true, Ordering::Release);
        }
        GatewayMessage::Disconnected => {
            warn!("Gateway disconnected, buffering on-time locally");
            LINK_UP.store(false, Ordering::Release);
        }
        GatewayMessage::Setting { seq, key, value } => {
            let code = handle_setting(key.as_str(), value, config);
            if OUTBOX
                .try_send(DeviceMessage::SettingStatus { seq: *seq, code })
                .is_err()
            {
                warn!("Outbox full, dropping setting status");
            }
            return;
        }
        _ => {}
    }

    let Some(event) = LinkEvent::from_gateway(&msg) else {
        return;
    };
    match monitor.handle_event(event).await {
        Ok(outcome) => log_outcome(outcome),
        Err(e) => warn!("Link event dropped: {:?}", e),
    }
}

fn handle_setting(key: &str, value: &SettingValue, config: &mut MonitorConfig) -> SettingCode {
    let setting = match Setting::parse(key, value) {
        Ok(setting) => setting,
        Err(code) => {
            warn!("Setting {} rejected: {:?}", key, code);
            return code;
        }
    };

    match config.apply(setting) {
        Ok(SettingChange::Unchanged) => {
            info!("Setting {} already matches", key);
        }
        Ok(SettingChange::Changed) => {
            match setting {
                Setting::LoopDelay { seconds } => {
                    info!("Loop delay set to {}s", seconds);
                    LOOP_DELAY_S.store(seconds, Ordering::Relaxed);
                }
                Setting::Floor { channel, floor } => {
                    if let Some(slot) = FLOORS.get(channel.index()) {
                        slot.store(floor, Ordering::Relaxed);
                    }
                }
            }
            POLL_WAKE.signal(());
        }
        Err(code) => {
            warn!("Setting {} rejected: {:?}", key, code);
            return code;
        }
    }
    SettingCode::Success
}

fn log_outcome(outcome: EventOutcome<CHANNELS>) {
    match outcome {
        EventOutcome::Connected { fetches_requested } => {
            info!("Requested {} baseline fetches", fetches_requested)
        }
        EventOutcome::Disconnected => {}
        EventOutcome::Push(FoldOutcome::Folded { folded_ms }) => {
            debug!("Push acknowledged, folded {:?} ms", folded_ms)
        }
        EventOutcome::Push(FoldOutcome::Retained) => {
            warn!("Push failed, on-time kept for next report")
        }
        EventOutcome::Push(FoldOutcome::Untracked) => trace!("Untracked push completion"),
        EventOutcome::Fetch(FetchOutcome::Loaded {
            baseline_ms,
            source,
        }) => info!("Baseline loaded: {}ms ({:?})", baseline_ms, source),
        EventOutcome::Fetch(FetchOutcome::AlreadyLoaded) => {
            debug!("Baseline already loaded, response ignored")
        }
        EventOutcome::Fetch(FetchOutcome::Failed) => warn!("Baseline fetch failed"),
        EventOutcome::Desired(DesiredOutcome::ResetApplied { epoch }) => {
            info!("Cumulative on-time reset (epoch {})", epoch.0)
        }
        EventOutcome::Desired(DesiredOutcome::NothingRequested) => {}
        EventOutcome::Desired(DesiredOutcome::RestoredDefaults { malformed }) => {
            warn!("Desired state restored to defaults (malformed={})", malformed)
        }
    }
}
