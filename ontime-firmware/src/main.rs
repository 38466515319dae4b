//! Ontime - Channel On-Time Monitor Firmware
//!
//! Samples two analog inputs, tracks how long each has been ON, and keeps
//! the cumulative on-time in step with a remote store reached through a
//! network gateway on UART0.
//!
//! Pin assignments:
//! - GPIO26 / ADC0: channel 0
//! - GPIO27 / ADC1: channel 1
//! - GPIO0 / GPIO1: UART0 TX / RX to the gateway (115200 baud)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ontime_core::Monitor;

mod channels;
mod delay;
mod sampler;
mod tasks;
mod transport;

use delay::TimerDelay;
use sampler::AdcSampler;
use transport::LinkTransport;

/// Monitored inputs on this board
pub const CHANNELS: usize = ontime_core::config::DEFAULT_CHANNEL_COUNT;

/// Monitor shared by the poll and link tasks
pub type AppMonitor = Monitor<CriticalSectionRawMutex, LinkTransport, TimerDelay, CHANNELS>;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static MONITOR: StaticCell<AppMonitor> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Ontime firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Gateway link
    let uart_config = UartConfig::default(); // 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized for gateway link");

    // Monitored inputs
    let adc = Adc::new_blocking(p.ADC, embassy_rp::adc::Config::default());
    let inputs = [
        Channel::new_pin(p.PIN_26, Pull::None),
        Channel::new_pin(p.PIN_27, Pull::None),
    ];
    let sampler = AdcSampler::new(adc, inputs);
    info!("ADC initialized ({} channels)", CHANNELS);

    let monitor: &'static AppMonitor = MONITOR.init(Monitor::new(LinkTransport, TimerDelay));

    spawner.spawn(unwrap!(tasks::link_tx_task(tx)));
    spawner.spawn(unwrap!(tasks::link_rx_task(rx, monitor)));
    spawner.spawn(unwrap!(tasks::poll_task(monitor, sampler)));

    info!("All tasks spawned, firmware running");
}
