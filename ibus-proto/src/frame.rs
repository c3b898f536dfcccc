//! Validated i-Bus frames and channel decoding.

/// Length of one i-Bus frame in bytes.
pub const FRAME_LEN: usize = 32;

/// Number of channel slots in a frame.
pub const CHANNEL_COUNT: u8 = 14;

/// Value reported for channel numbers outside `1..=CHANNEL_COUNT`.
pub const NEUTRAL_VALUE: u16 = 1500;

/// Byte offset of channel 1.
const CHANNEL_OFFSET: usize = 2;

/// Byte offset of the trailing checksum.
const CHECKSUM_OFFSET: usize = 30;

/// One complete, structurally validated i-Bus frame.
///
/// Only [`IbusFramer`](crate::IbusFramer) constructs frames from the wire;
/// [`Frame::from_bytes`] exists for tests and replay tooling.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Wrap raw frame bytes without validation.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw frame bytes, header included.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Value of a channel (1-based). See [`decode`].
    #[inline]
    #[must_use]
    pub fn channel(&self, channel: u8) -> u16 {
        decode(self, channel)
    }

    /// All 14 channel values in order.
    #[must_use]
    pub fn channels(&self) -> [u16; CHANNEL_COUNT as usize] {
        let mut out = [0u16; CHANNEL_COUNT as usize];
        for (i, slot) in out.iter_mut().enumerate() {
            let offset = CHANNEL_OFFSET + i * 2;
            *slot = u16::from_le_bytes([self.0[offset], self.0[offset + 1]]);
        }
        out
    }

    /// Checksum carried in the last two bytes (little-endian).
    #[inline]
    #[must_use]
    pub fn received_checksum(&self) -> u16 {
        u16::from_le_bytes([self.0[CHECKSUM_OFFSET], self.0[CHECKSUM_OFFSET + 1]])
    }

    /// Checksum computed over bytes 0..30: `0xFFFF` minus their sum.
    #[must_use]
    pub fn computed_checksum(&self) -> u16 {
        self.0[..CHECKSUM_OFFSET]
            .iter()
            .fold(0xFFFFu16, |acc, &b| acc.wrapping_sub(b as u16))
    }

    /// Check the trailing checksum.
    #[inline]
    #[must_use]
    pub fn checksum_valid(&self) -> bool {
        self.received_checksum() == self.computed_checksum()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self([0u8; FRAME_LEN])
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Frame").field(&self.channels()).finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame({=[?]})", &self.channels()[..]);
    }
}

/// Decode a channel value (1-based) from a frame.
///
/// Channel numbers outside `1..=14` return [`NEUTRAL_VALUE`] instead of an
/// error, so callers see "no signal" as a steady value.
#[inline]
#[must_use]
pub fn decode(frame: &Frame, channel: u8) -> u16 {
    if !(1..=CHANNEL_COUNT).contains(&channel) {
        return NEUTRAL_VALUE;
    }
    let offset = CHANNEL_OFFSET + (channel as usize - 1) * 2;
    u16::from_le_bytes([frame.0[offset], frame.0[offset + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(channel: u8, value: u16) -> Frame {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = 0x20;
        bytes[1] = 0x40;
        let offset = 2 + (channel as usize - 1) * 2;
        bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Frame::from_bytes(bytes)
    }

    #[test]
    fn test_decode_channel_5_little_endian() {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[10] = 0xE8;
        bytes[11] = 0x03;
        let frame = Frame::from_bytes(bytes);
        assert_eq!(decode(&frame, 5), 1000);
    }

    #[test]
    fn test_decode_straddling_bytes_split_between_channels() {
        // Channel 5 starts at offset 10; bytes 9 and 10 belong to ch4 and ch5.
        let mut bytes = [0u8; FRAME_LEN];
        bytes[9] = 0xE8;
        bytes[10] = 0x03;
        let frame = Frame::from_bytes(bytes);
        assert_eq!(decode(&frame, 4), 0xE800);
        assert_eq!(decode(&frame, 5), 0x0003);
    }

    #[test]
    fn test_decode_out_of_range_is_neutral() {
        let frame = frame_with(1, 2000);
        assert_eq!(decode(&frame, 0), NEUTRAL_VALUE);
        assert_eq!(decode(&frame, 15), NEUTRAL_VALUE);
        assert_eq!(decode(&frame, 255), NEUTRAL_VALUE);
    }

    #[test]
    fn test_decode_first_and_last_channel() {
        assert_eq!(frame_with(1, 1234).channel(1), 1234);
        assert_eq!(frame_with(14, 1987).channel(14), 1987);
    }

    #[test]
    fn test_channels_array_matches_decode() {
        let frame = frame_with(7, 1333);
        let channels = frame.channels();
        for ch in 1..=CHANNEL_COUNT {
            assert_eq!(channels[ch as usize - 1], decode(&frame, ch));
        }
    }

    #[test]
    fn test_checksum() {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = 0x20;
        bytes[1] = 0x40;
        for ch in 0..14 {
            let offset = 2 + ch * 2;
            bytes[offset..offset + 2].copy_from_slice(&1500u16.to_le_bytes());
        }
        let sum: u16 = bytes[..30].iter().map(|&b| b as u16).sum();
        bytes[30..32].copy_from_slice(&(0xFFFF - sum).to_le_bytes());

        let frame = Frame::from_bytes(bytes);
        assert!(frame.checksum_valid());

        bytes[4] ^= 0x01;
        assert!(!Frame::from_bytes(bytes).checksum_valid());
    }
}
