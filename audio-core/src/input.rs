//! Frame source trait and the i-Bus ring-buffer adapter.

use ibus_proto::{ByteConsumer, Frame, FramerStats, IbusFramer};

/// Non-blocking source of validated i-Bus frames.
///
/// The control loop calls [`poll_frame`](Self::poll_frame) once per
/// iteration; `None` means no complete frame is buffered yet. Receive
/// errors stay with the byte receiver: a corrupted stream only costs frames,
/// which the framer recovers from at the next header.
pub trait FrameSource {
    /// Return the next complete frame, if one is available.
    fn poll_frame(&mut self) -> Option<Frame>;
}

/// Frames recovered from the consumer half of the receive ring buffer.
pub struct IbusInput<'a, const N: usize> {
    consumer: ByteConsumer<'a, N>,
    framer: IbusFramer,
}

impl<'a, const N: usize> IbusInput<'a, N> {
    /// Frame bytes from `consumer` with the default (checksum-ignoring) framer.
    pub fn new(consumer: ByteConsumer<'a, N>) -> Self {
        Self::with_framer(consumer, IbusFramer::new())
    }

    /// Frame bytes from `consumer` with a preconfigured framer.
    pub fn with_framer(consumer: ByteConsumer<'a, N>, framer: IbusFramer) -> Self {
        Self { consumer, framer }
    }

    /// Framer counters.
    #[must_use]
    pub fn stats(&self) -> FramerStats {
        self.framer.stats()
    }

    /// Bytes waiting in the ring buffer.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }
}

impl<const N: usize> FrameSource for IbusInput<'_, N> {
    #[inline]
    fn poll_frame(&mut self) -> Option<Frame> {
        self.framer.poll(&mut self.consumer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibus_proto::{RingBuffer, FRAME_LEN};

    #[test]
    fn test_ibus_input_frames_ring_bytes() {
        let mut ring: RingBuffer<64> = RingBuffer::new();
        let (mut producer, consumer) = ring.split();
        let mut input = IbusInput::new(consumer);

        let mut packet = [0x05u8; FRAME_LEN];
        packet[0] = 0x20;
        packet[1] = 0x40;

        assert_eq!(input.poll_frame(), None);

        for &b in &packet[..20] {
            producer.push(b);
        }
        assert_eq!(input.poll_frame(), None);
        assert_eq!(input.pending(), 0);

        for &b in &packet[20..] {
            producer.push(b);
        }
        let frame = input.poll_frame().unwrap();
        assert_eq!(frame.as_bytes(), &packet);
        assert_eq!(input.stats().frames, 1);
    }
}
