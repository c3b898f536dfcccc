//! AT command vocabulary and serialization.
//!
//! Every command is a single ASCII line terminated by CR-LF:
//!
//! ```text
//! AT+PLAYFILE=/tada.mp3\r\n
//! AT+PLAYNUM=1\r\n
//! AT+VOL=6\r\n
//! AT+PROMPT=OFF\r\n
//! AT+LED=OFF\r\n
//! AT+PLAYMODE=3\r\n
//! AT+QUERY=2\r\n
//! ```
//!
//! # Example
//!
//! ```
//! use dfplayer_proto::{Command, Serialize};
//!
//! let mut buf = [0u8; 64];
//! let len = Command::volume(42).serialize(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"AT+VOL=30\r\n");
//! ```

use crate::fmt::{write_u16, MAX_U16_DIGITS};

/// Highest volume level the module accepts.
pub const MAX_VOLUME: u8 = 30;

/// `AT+QUERY` argument: number of the file currently playing.
pub const QUERY_CURRENT_FILE: u8 = 1;

/// `AT+QUERY` argument: number of files on the card.
pub const QUERY_TOTAL_FILES: u8 = 2;

/// `AT+PLAYMODE` argument: play one file then pause.
pub const PLAYMODE_SINGLE: u8 = 3;

/// Largest serialized command this crate produces with the built-in file
/// lists. Longer file paths need a larger buffer.
pub const MAX_COMMAND_SIZE: usize = 64;

const LINE_END: &[u8] = b"\r\n";

/// One outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `AT+PLAYFILE=<path>`: play a file by path.
    PlayFile(&'static str),
    /// `AT+PLAYNUM=<n>`: play a file by number (1-based).
    PlayNumber(u16),
    /// `AT+VOL=<0-30>`: set volume, clamped to [`MAX_VOLUME`] on the wire.
    Volume(u8),
    /// `AT+PROMPT=OFF`: silence the module's voice prompts.
    PromptOff,
    /// `AT+LED=OFF`: switch the status LED off.
    LedOff,
    /// `AT+PLAYMODE=<n>`.
    PlayMode(u8),
    /// `AT+QUERY=<n>`: ask for a value; the module replies with a text line.
    Query(u8),
}

impl Command {
    /// Volume command with the level clamped to `0..=30`.
    #[inline]
    #[must_use]
    pub const fn volume(level: u8) -> Self {
        if level > MAX_VOLUME {
            Self::Volume(MAX_VOLUME)
        } else {
            Self::Volume(level)
        }
    }

    /// Whether the module answers this command with a reply line.
    #[inline]
    #[must_use]
    pub const fn expects_reply(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Upper bound on the serialized length.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        let body = match self {
            Self::PlayFile(path) => b"AT+PLAYFILE=".len() + path.len(),
            Self::PlayNumber(_) => b"AT+PLAYNUM=".len() + MAX_U16_DIGITS,
            Self::Volume(_) => b"AT+VOL=".len() + 2,
            Self::PromptOff => b"AT+PROMPT=OFF".len(),
            Self::LedOff => b"AT+LED=OFF".len(),
            Self::PlayMode(_) => b"AT+PLAYMODE=".len() + 3,
            Self::Query(_) => b"AT+QUERY=".len() + 3,
        };
        body + LINE_END.len()
    }
}

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized command.
    BufferTooSmall,
    /// A write operation failed (for I/O adapters).
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Bounds-checked cursor over the output buffer.
struct CommandBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> CommandBuf<'a> {
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) -> Result<(), SerializeError> {
        let end = self.pos + bytes.len();
        let dst = self
            .buf
            .get_mut(self.pos..end)
            .ok_or(SerializeError::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    #[inline]
    fn write_u16(&mut self, value: u16) -> Result<(), SerializeError> {
        let mut tmp = [0u8; MAX_U16_DIGITS];
        let len = write_u16(&mut tmp, value);
        self.write_slice(&tmp[..len])
    }

    /// Terminate the line and return its length.
    #[inline]
    fn finalize(mut self) -> Result<usize, SerializeError> {
        self.write_slice(LINE_END)?;
        Ok(self.pos)
    }
}

/// Extension trait for serializing commands.
pub trait Serialize {
    /// Serialize to the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError>;

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    #[cfg(feature = "heapless")]
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;

    /// Serialize to an `embedded_io::Write` implementation such as a UART.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;
}

impl Serialize for Command {
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        let mut cb = CommandBuf::new(buf);

        match *self {
            Self::PlayFile(path) => {
                cb.write_slice(b"AT+PLAYFILE=")?;
                cb.write_slice(path.as_bytes())?;
            }
            Self::PlayNumber(n) => {
                cb.write_slice(b"AT+PLAYNUM=")?;
                cb.write_u16(n)?;
            }
            Self::Volume(level) => {
                cb.write_slice(b"AT+VOL=")?;
                cb.write_u16(level.min(MAX_VOLUME) as u16)?;
            }
            Self::PromptOff => cb.write_slice(b"AT+PROMPT=OFF")?,
            Self::LedOff => cb.write_slice(b"AT+LED=OFF")?,
            Self::PlayMode(mode) => {
                cb.write_slice(b"AT+PLAYMODE=")?;
                cb.write_u16(mode as u16)?;
            }
            Self::Query(what) => {
                cb.write_slice(b"AT+QUERY=")?;
                cb.write_u16(what as u16)?;
            }
        }

        cb.finalize()
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_COMMAND_SIZE];
        let len = self.serialize(&mut buf)?;

        let s = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer.write_str(s).map_err(|_| SerializeError::WriteError)
    }

    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_COMMAND_SIZE];
        let len = self.serialize(&mut buf)?;
        writer
            .write_all(&buf[..len])
            .map_err(|_| SerializeError::WriteError)
    }
}
