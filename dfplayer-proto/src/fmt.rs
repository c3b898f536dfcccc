//! No-std decimal formatting for command parameters.
//!
//! Parameters are plain decimal: no sign, no leading zeros, no padding.

/// Maximum digits of a `u16` ("65535").
pub const MAX_U16_DIGITS: usize = 5;

/// Write a u16 as an unsigned decimal string.
///
/// Returns the number of bytes written (1-5 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than the number of digits.
#[inline]
pub fn write_u16(buf: &mut [u8], value: u16) -> usize {
    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Digits come out least significant first
    let mut temp = [0u8; MAX_U16_DIGITS];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for (dst, src) in buf[..len].iter_mut().zip(temp[..len].iter().rev()) {
        *dst = *src;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: u16) -> ([u8; MAX_U16_DIGITS], usize) {
        let mut buf = [0u8; MAX_U16_DIGITS];
        let len = write_u16(&mut buf, value);
        (buf, len)
    }

    #[test]
    fn test_zero() {
        let (buf, len) = render(0);
        assert_eq!(&buf[..len], b"0");
    }

    #[test]
    fn test_no_leading_zeros() {
        let (buf, len) = render(6);
        assert_eq!(&buf[..len], b"6");
        let (buf, len) = render(30);
        assert_eq!(&buf[..len], b"30");
        let (buf, len) = render(105);
        assert_eq!(&buf[..len], b"105");
    }

    #[test]
    fn test_max() {
        let (buf, len) = render(u16::MAX);
        assert_eq!(&buf[..len], b"65535");
    }
}
