//! Reply line assembly and parsing.
//!
//! The module answers queries with a single ASCII line terminated by CR-LF.
//! Lines can carry stray null bytes when the receive pin idles low between
//! characters, so the assembler can filter them out.

/// What to do with received `0x00` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NullPolicy {
    /// Store null bytes like any other byte.
    #[default]
    Keep,
    /// Drop null bytes before they reach the buffer.
    Skip,
}

/// Result of pushing one byte into a [`LineAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineStatus {
    /// Keep reading.
    Pending,
    /// The buffer now ends with CR-LF.
    Complete,
    /// The buffer is full without a line terminator.
    Full,
}

impl LineStatus {
    /// Whether reading should stop.
    #[inline]
    #[must_use]
    pub const fn is_done(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Accumulates reply bytes into a caller-provided buffer.
///
/// The CR-LF terminator is stored with the line; use [`trim_line_end`] to
/// strip it.
pub struct LineAssembler<'a> {
    buf: &'a mut [u8],
    len: usize,
    nulls: NullPolicy,
}

impl<'a> LineAssembler<'a> {
    /// Wrap `buf`. Its length is the line limit.
    pub fn new(buf: &'a mut [u8], nulls: NullPolicy) -> Self {
        Self { buf, len: 0, nulls }
    }

    /// Store one byte and report whether the line is finished.
    ///
    /// Bytes pushed after the line is done are ignored.
    pub fn push(&mut self, byte: u8) -> LineStatus {
        let status = self.status();
        if status.is_done() {
            return status;
        }
        if byte == 0 && self.nulls == NullPolicy::Skip {
            return LineStatus::Pending;
        }

        self.buf[self.len] = byte;
        self.len += 1;
        self.status()
    }

    /// Current state without pushing anything.
    #[must_use]
    pub fn status(&self) -> LineStatus {
        if self.line().ends_with(b"\r\n") {
            LineStatus::Complete
        } else if self.len >= self.buf.len() {
            LineStatus::Full
        } else {
            LineStatus::Pending
        }
    }

    /// Bytes received so far.
    #[inline]
    #[must_use]
    pub fn line(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether nothing has been stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Strip a trailing CR-LF (or a lone CR or LF) from a line.
#[must_use]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse the first decimal number in a reply.
///
/// Leading non-digit bytes are skipped, then consecutive digits are
/// accumulated. Returns 0 if the reply contains no digits. Saturates at
/// `u32::MAX`.
#[must_use]
pub fn parse_number(reply: &[u8]) -> u32 {
    reply
        .iter()
        .skip_while(|b| !b.is_ascii_digit())
        .take_while(|b| b.is_ascii_digit())
        .fold(0u32, |acc, &b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}
