//! Command sink on the UART transmit half.

use audio_core::{CommandSink, OutputError};
use dfplayer_proto::{Command, Serialize, MAX_COMMAND_SIZE};
use embassy_rp::uart::{Async, UartTx};

/// Sends AT commands to the audio module.
///
/// Each command is serialized into a stack buffer and written in one
/// transfer; `send` returns once the whole line has been handed to the UART.
pub struct UartCommandSink<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> UartCommandSink<'d> {
    /// Create a sink from the given UART transmitter.
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }
}

impl CommandSink for UartCommandSink<'_> {
    async fn send(&mut self, command: &Command) -> Result<(), OutputError> {
        let mut buf = [0u8; MAX_COMMAND_SIZE];
        let len = command.serialize(&mut buf)?;
        self.tx
            .write(&buf[..len])
            .await
            .map_err(|_| OutputError::Io)
    }
}
