//! Gateway UART transmit task
//!
//! Drains the outbox and writes each message as a frame.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use ontime_protocol::frame::MAX_FRAME_SIZE;

use crate::channels::OUTBOX;

#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];

    loop {
        let msg = OUTBOX.receive().await;

        let frame = match msg.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode message: {:?}", e);
                continue;
            }
        };

        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("UART write error: {:?}", e);
                } else {
                    trace!("TX: type=0x{:02x} seq={}", frame.msg_type, frame.seq);
                }
            }
            Err(e) => warn!("Failed to encode frame: {:?}", e),
        }
    }
}
