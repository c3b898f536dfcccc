//! Bit-banged UART receiver for the module's reply line.
//!
//! The module answers queries on a separate TX pin at 9600 baud, wired to a
//! plain GPIO. Bytes are recovered by timed sampling:
//!
//! 1. Poll the pin every `poll_us` until it reads low (start bit), giving up
//!    after a bounded number of polls.
//! 2. Wait half a bit to land in the middle of the start bit.
//! 3. Sample 8 data bits, LSB first, one full bit apart.
//! 4. Wait one more bit for the stop bit.
//!
//! # Real-time contract
//!
//! Steps 2 to 4 run inside a critical section: nothing may preempt the
//! sampler while a byte is on the wire, or the bit clock slips. Start-bit
//! polling runs with interrupts enabled. At 9600 baud one byte masks
//! interrupts for roughly 1 ms, so i-Bus bytes arriving meanwhile can be
//! lost; replies are read only during startup diagnostics.

use crate::player::ResponseSource;
use dfplayer_proto::{LineAssembler, NullPolicy};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

/// Reply line baud rate.
pub const REPLY_BAUDRATE: u32 = 9600;

/// Bit timing in microseconds, plus start-bit timeouts in polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Full bit period.
    pub bit_us: u32,
    /// Delay from start-bit detection to the first sample point.
    pub half_bit_us: u32,
    /// Start-bit polling interval.
    pub poll_us: u32,
    /// Polls to wait for the first byte of a line.
    pub first_byte_polls: u32,
    /// Polls to wait for each following byte.
    pub next_byte_polls: u32,
}

impl BitTiming {
    /// Timing for `baud` with the default 10 us poll.
    ///
    /// The first byte may take up to 100 ms to start; later bytes get about
    /// one character time. A `baud` of 0 is treated as 1.
    #[must_use]
    pub const fn from_baud(baud: u32) -> Self {
        let baud = if baud == 0 { 1 } else { baud };
        let bit_us = 1_000_000 / baud;
        Self {
            bit_us,
            half_bit_us: bit_us / 2,
            poll_us: 10,
            first_byte_polls: 10_000,
            // One character (10 bits) worth of 10 us polls
            next_byte_polls: bit_us,
        }
    }
}

impl Default for BitTiming {
    fn default() -> Self {
        Self::from_baud(REPLY_BAUDRATE)
    }
}

/// Error type for soft UART reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftUartError<E> {
    /// The pin could not be read.
    Pin(E),
}

/// Software UART receiver on one input pin.
pub struct SoftUartRx<P, D> {
    pin: P,
    delay: D,
    timing: BitTiming,
}

impl<P: InputPin, D: DelayNs> SoftUartRx<P, D> {
    /// Receiver at 9600 baud.
    pub fn new(pin: P, delay: D) -> Self {
        Self::with_timing(pin, delay, BitTiming::default())
    }

    /// Receiver with explicit timing.
    pub fn with_timing(pin: P, delay: D, timing: BitTiming) -> Self {
        Self { pin, delay, timing }
    }

    /// Current timing.
    #[must_use]
    pub fn timing(&self) -> BitTiming {
        self.timing
    }

    /// Receive one byte, waiting at most `polls` poll intervals for its
    /// start bit.
    ///
    /// Returns `Ok(None)` if no start bit arrived in time. A received `0x00`
    /// is returned as `Some(0)`.
    pub fn read_byte(&mut self, polls: u32) -> Result<Option<u8>, SoftUartError<P::Error>> {
        if !self.wait_for_start(polls)? {
            return Ok(None);
        }

        let Self { pin, delay, timing } = self;
        critical_section::with(|_| sample_byte(pin, delay, timing)).map(Some)
    }

    /// Receive bytes into `buf` until CR-LF, a full buffer, or a timeout.
    ///
    /// Returns the number of bytes stored, CR-LF included. Zero means the
    /// module did not answer.
    pub fn read_line(
        &mut self,
        buf: &mut [u8],
        nulls: NullPolicy,
    ) -> Result<usize, SoftUartError<P::Error>> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut line = LineAssembler::new(buf, nulls);
        let mut polls = self.timing.first_byte_polls;
        while let Some(byte) = self.read_byte(polls)? {
            if line.push(byte).is_done() {
                break;
            }
            polls = self.timing.next_byte_polls;
        }
        Ok(line.len())
    }

    /// Release the pin and delay.
    pub fn into_parts(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn wait_for_start(&mut self, polls: u32) -> Result<bool, SoftUartError<P::Error>> {
        for _ in 0..polls {
            if self.pin.is_low().map_err(SoftUartError::Pin)? {
                return Ok(true);
            }
            self.delay.delay_us(self.timing.poll_us);
        }
        Ok(false)
    }
}

/// Sample the data and stop bits of a byte whose start bit was just seen.
fn sample_byte<P: InputPin, D: DelayNs>(
    pin: &mut P,
    delay: &mut D,
    timing: &BitTiming,
) -> Result<u8, SoftUartError<P::Error>> {
    delay.delay_us(timing.half_bit_us);

    let mut byte = 0u8;
    for bit in 0..8 {
        delay.delay_us(timing.bit_us);
        if pin.is_high().map_err(SoftUartError::Pin)? {
            byte |= 1 << bit;
        }
    }

    // Stop bit
    delay.delay_us(timing.bit_us);
    Ok(byte)
}

impl<P: InputPin, D: DelayNs> ResponseSource for SoftUartRx<P, D> {
    type Error = SoftUartError<P::Error>;

    fn read_line(&mut self, buf: &mut [u8], nulls: NullPolicy) -> Result<usize, Self::Error> {
        SoftUartRx::read_line(self, buf, nulls)
    }
}
