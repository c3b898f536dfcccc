//! i-Bus frame synchronization.
//!
//! The framer recovers 32-byte frames from an unsynchronized byte stream by
//! searching for the `0x20 0x40` header, accumulating the rest of the frame
//! and then rejecting frames that contain a second header pair inside them
//! (a sign that the first header was a false positive in channel data).
//!
//! A rejected frame is dropped as a whole. The bytes are not rescanned for a
//! header, so after a false lock the framer can skip up to one extra frame
//! before it resynchronizes.

use crate::frame::{Frame, FRAME_LEN};
use crate::ring::ByteConsumer;
use crate::{IBUS_HEADER1, IBUS_HEADER2};

/// Whether the trailing checksum is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumPolicy {
    /// Accept any structurally valid frame (checksum bytes are ignored).
    #[default]
    Ignore,
    /// Additionally drop frames whose checksum does not match.
    Verify,
}

/// Counters kept by the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    /// Frames emitted.
    pub frames: u32,
    /// Frames dropped because they contained an embedded header.
    pub rejected: u32,
    /// Frames dropped by [`ChecksumPolicy::Verify`].
    pub checksum_errors: u32,
}

/// Something the framer can pull bytes from, oldest first.
pub trait ByteSource {
    /// Take the next byte, or `None` if nothing is buffered right now.
    fn next_byte(&mut self) -> Option<u8>;
}

impl<const N: usize> ByteSource for ByteConsumer<'_, N> {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        self.pop()
    }
}

impl<I: Iterator<Item = u8>> ByteSource for core::iter::Fuse<I> {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum FramerState {
    SeekingHeader,
    Accumulating,
}

/// Stream-synchronizing i-Bus frame parser.
///
/// State persists across calls, so a frame split over several polls is
/// completed on the poll that delivers its last byte.
pub struct IbusFramer {
    buffer: [u8; FRAME_LEN],
    pos: usize,
    state: FramerState,
    checksum: ChecksumPolicy,
    stats: FramerStats,
}

impl IbusFramer {
    /// Create a framer that ignores the checksum trailer.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_checksum(ChecksumPolicy::Ignore)
    }

    /// Create a framer with an explicit checksum policy.
    #[must_use]
    pub const fn with_checksum(checksum: ChecksumPolicy) -> Self {
        Self {
            buffer: [0u8; FRAME_LEN],
            pos: 0,
            state: FramerState::SeekingHeader,
            checksum,
            stats: FramerStats {
                frames: 0,
                rejected: 0,
                checksum_errors: 0,
            },
        }
    }

    /// Drop any partial frame and go back to header search.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.state = FramerState::SeekingHeader;
    }

    /// Counters since creation.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Check whether the framer is between header and end of a frame.
    #[inline]
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.state == FramerState::Accumulating
    }

    /// Feed one byte.
    ///
    /// Returns `Some(frame)` when this byte completes a clean frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            FramerState::SeekingHeader => {
                if self.pos == 0 && byte == IBUS_HEADER1 {
                    self.buffer[0] = byte;
                    self.pos = 1;
                } else if self.pos == 1 && byte == IBUS_HEADER2 {
                    self.buffer[1] = byte;
                    self.pos = 2;
                    self.state = FramerState::Accumulating;
                } else {
                    // A failed match may itself start the next header.
                    self.pos = 0;
                    if byte == IBUS_HEADER1 {
                        self.buffer[0] = byte;
                        self.pos = 1;
                    }
                }
                None
            }
            FramerState::Accumulating => {
                self.buffer[self.pos] = byte;
                self.pos += 1;

                if self.pos < FRAME_LEN {
                    return None;
                }

                self.reset();
                self.finish_frame()
            }
        }
    }

    /// Drain `source` until a frame completes or the source runs dry.
    pub fn poll<S: ByteSource>(&mut self, source: &mut S) -> Option<Frame> {
        while let Some(byte) = source.next_byte() {
            if let Some(frame) = self.push_byte(byte) {
                return Some(frame);
            }
        }
        None
    }

    /// Validate a fully accumulated buffer.
    fn finish_frame(&mut self) -> Option<Frame> {
        if has_embedded_header(&self.buffer) {
            self.stats.rejected = self.stats.rejected.wrapping_add(1);
            return None;
        }

        let frame = Frame::from_bytes(self.buffer);
        if self.checksum == ChecksumPolicy::Verify && !frame.checksum_valid() {
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
            return None;
        }

        self.stats.frames = self.stats.frames.wrapping_add(1);
        Some(frame)
    }
}

impl Default for IbusFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Look for a `0x20 0x40` pair starting anywhere in positions 2..=30.
#[inline]
fn has_embedded_header(buffer: &[u8; FRAME_LEN]) -> bool {
    buffer[2..]
        .windows(2)
        .any(|pair| pair[0] == IBUS_HEADER1 && pair[1] == IBUS_HEADER2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingBuffer;
    use proptest::prelude::*;

    /// A clean frame whose channel bytes can never form a header pair.
    fn clean_packet(fill: u8) -> [u8; FRAME_LEN] {
        let mut bytes = [fill; FRAME_LEN];
        bytes[0] = IBUS_HEADER1;
        bytes[1] = IBUS_HEADER2;
        bytes
    }

    fn feed(framer: &mut IbusFramer, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| framer.push_byte(b)).collect()
    }

    #[test]
    fn test_clean_frame_is_emitted() {
        let mut framer = IbusFramer::new();
        let packet = clean_packet(0xDC);

        let frames = feed(&mut framer, &packet);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &packet);
        assert_eq!(framer.stats().frames, 1);
        assert!(!framer.is_synchronized());
    }

    #[test]
    fn test_embedded_header_rejects_frame() {
        let mut framer = IbusFramer::new();
        let mut packet = clean_packet(0x05);
        packet[10] = IBUS_HEADER1;
        packet[11] = IBUS_HEADER2;

        assert!(feed(&mut framer, &packet).is_empty());
        assert_eq!(framer.stats().rejected, 1);

        // Resumes seeking right after the rejected frame.
        let next = clean_packet(0x05);
        let frames = feed(&mut framer, &next);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &next);
    }

    #[test]
    fn test_embedded_header_at_last_pair_rejects_frame() {
        let mut framer = IbusFramer::new();
        let mut packet = clean_packet(0x05);
        packet[30] = IBUS_HEADER1;
        packet[31] = IBUS_HEADER2;
        assert!(feed(&mut framer, &packet).is_empty());
    }

    #[test]
    fn test_lone_header_byte_in_body_is_accepted() {
        let mut framer = IbusFramer::new();
        let mut packet = clean_packet(0x05);
        packet[15] = IBUS_HEADER1;
        packet[16] = IBUS_HEADER2 + 1;
        assert_eq!(feed(&mut framer, &packet).len(), 1);
    }

    #[test]
    fn test_garbage_before_header_is_skipped() {
        let mut framer = IbusFramer::new();
        let mut stream = vec![0x00, 0x40, 0x13, 0x20, 0x99];
        let packet = clean_packet(0xDC);
        stream.extend_from_slice(&packet);

        let frames = feed(&mut framer, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &packet);
    }

    #[test]
    fn test_repeated_header_start_byte_restarts_search() {
        // 0x20 0x20 0x40: the second 0x20 is a fresh header start.
        let mut framer = IbusFramer::new();
        let mut stream = vec![IBUS_HEADER1];
        let packet = clean_packet(0xDC);
        stream.extend_from_slice(&packet);

        let frames = feed(&mut framer, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &packet);
    }

    #[test]
    fn test_resumes_across_polls() {
        let mut ring: RingBuffer<64> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();
        let mut framer = IbusFramer::new();
        let packet = clean_packet(0xDC);

        for &b in &packet[..17] {
            assert!(producer.push(b));
        }
        assert!(framer.poll(&mut consumer).is_none());
        assert!(framer.is_synchronized());

        for &b in &packet[17..] {
            assert!(producer.push(b));
        }
        let frame = framer.poll(&mut consumer).unwrap();
        assert_eq!(frame.as_bytes(), &packet);
    }

    #[test]
    fn test_poll_stops_at_frame_boundary() {
        let mut framer = IbusFramer::new();
        let first = clean_packet(0x11);
        let second = clean_packet(0x22);
        let mut source = first.iter().chain(second.iter()).copied().fuse();

        assert_eq!(framer.poll(&mut source).unwrap().as_bytes(), &first);
        assert_eq!(framer.poll(&mut source).unwrap().as_bytes(), &second);
        assert!(framer.poll(&mut source).is_none());
    }

    #[test]
    fn test_checksum_policy_verify() {
        let mut framer = IbusFramer::with_checksum(ChecksumPolicy::Verify);
        let mut packet = clean_packet(0xDC);
        packet[30] = 0;
        packet[31] = 0;
        assert!(feed(&mut framer, &packet).is_empty());
        assert_eq!(framer.stats().checksum_errors, 1);

        let sum: u16 = packet[..30].iter().map(|&b| b as u16).sum();
        packet[30..32].copy_from_slice(&(0xFFFF - sum).to_le_bytes());
        assert_eq!(feed(&mut framer, &packet).len(), 1);
    }

    #[test]
    fn test_checksum_ignored_by_default() {
        let mut framer = IbusFramer::new();
        let mut packet = clean_packet(0xDC);
        packet[30] = 0;
        packet[31] = 0;
        assert_eq!(feed(&mut framer, &packet).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_clean_body_yields_exactly_one_frame(body in proptest::collection::vec(any::<u8>(), 30)) {
            let mut packet = [0u8; FRAME_LEN];
            packet[0] = IBUS_HEADER1;
            packet[1] = IBUS_HEADER2;
            packet[2..].copy_from_slice(&body);
            prop_assume!(!has_embedded_header(&packet));

            let mut framer = IbusFramer::new();
            let frames = feed(&mut framer, &packet);
            prop_assert_eq!(frames.len(), 1);
            prop_assert_eq!(frames[0].as_bytes(), &packet);
        }
    }
}
