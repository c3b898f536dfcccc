//! Command sink trait and error types.

use core::future::Future;
use dfplayer_proto::{Command, SerializeError};

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// UART/communication I/O error.
    Io,
    /// Command did not fit the serialization buffer.
    Encode,
}

impl From<SerializeError> for OutputError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::BufferTooSmall => OutputError::Encode,
            SerializeError::WriteError => OutputError::Io,
        }
    }
}

/// Async trait for the audio module's command link.
///
/// `send` completes once the whole command line has been handed to the
/// transmitter. Commands are never queued or reordered.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait CommandSink {
    /// Transmit one command.
    fn send(&mut self, command: &Command) -> impl Future<Output = Result<(), OutputError>>;
}
