//! High-priority i-Bus byte receiver.
//!
//! Runs on an interrupt executor so it preempts the control loop. Each byte
//! read from the UART goes straight into the ring buffer through the
//! producer half; the receiver never waits on the consumer. Bytes that do
//! not fit are dropped and counted, and the count is published through an
//! atomic for the health task.
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 8: TX (commands to the audio module)
//! - GPIO 9: RX (i-Bus from the RC receiver)

use embassy_rp::uart::{Async, Error as UartError, UartRx};
use ibus_proto::{ByteProducer, ByteReceiver, RX_BUFFER_SIZE};
use portable_atomic::{AtomicU32, Ordering};

/// Moves i-Bus bytes from the UART into the ring buffer.
pub struct IbusUartReceiver<'d> {
    rx: UartRx<'d, Async>,
    receiver: ByteReceiver<'d, RX_BUFFER_SIZE>,
    dropped: &'d AtomicU32,
}

impl<'d> IbusUartReceiver<'d> {
    /// Create a receiver feeding `producer`, publishing drops to `dropped`.
    #[must_use]
    pub fn new(
        rx: UartRx<'d, Async>,
        producer: ByteProducer<'d, RX_BUFFER_SIZE>,
        dropped: &'d AtomicU32,
    ) -> Self {
        Self {
            rx,
            receiver: ByteReceiver::new(producer),
            dropped,
        }
    }

    /// Wait for one byte from the UART.
    pub async fn receive_byte(&mut self) -> Result<u8, UartError> {
        let mut byte = [0u8; 1];
        self.rx.read(&mut byte).await?;
        Ok(byte[0])
    }

    /// Receive forever.
    pub async fn run(&mut self) -> ! {
        loop {
            match self.receive_byte().await {
                Ok(byte) => {
                    if !self.receiver.on_byte(byte) {
                        self.dropped
                            .store(self.receiver.dropped(), Ordering::Relaxed);
                    }
                }
                // Framing recovers at the next header; nothing to do here
                Err(e) => defmt::trace!("i-Bus rx error: {}", e),
            }
        }
    }
}
