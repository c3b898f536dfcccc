//! High-level driver for the audio module.

use crate::output::{CommandSink, OutputError};
use crate::profile::StartupSequence;
use dfplayer_proto::{parse_number, Command, NullPolicy, QUERY_CURRENT_FILE, QUERY_TOTAL_FILES};
use embedded_hal_async::delay::DelayNs;

/// Buffer size for numeric replies.
pub const NUMBER_REPLY_LEN: usize = 16;

/// Blocking source of reply lines from the module.
pub trait ResponseSource {
    type Error;

    /// Read one reply line into `buf`, returning the number of bytes stored.
    ///
    /// Returns `Ok(0)` when the module does not answer in time.
    fn read_line(&mut self, buf: &mut [u8], nulls: NullPolicy) -> Result<usize, Self::Error>;
}

/// Error type for player operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerError {
    /// A command could not be sent.
    Output(OutputError),
    /// The reply line could not be read.
    Response,
}

impl From<OutputError> for PlayerError {
    fn from(err: OutputError) -> Self {
        PlayerError::Output(err)
    }
}

/// Wraps a command sink with the module's operations.
pub struct AudioPlayer<S> {
    sink: S,
}

impl<S: CommandSink> AudioPlayer<S> {
    /// Create a player on top of a command sink.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Send one raw command.
    pub async fn send(&mut self, command: &Command) -> Result<(), OutputError> {
        trace!("send {}", command);
        self.sink.send(command).await
    }

    /// Play the sequence in order with its pauses.
    ///
    /// A failed command does not stop the sequence; the first failure is
    /// returned once every command has been attempted.
    pub async fn startup<D: DelayNs>(
        &mut self,
        sequence: &StartupSequence,
        delay: &mut D,
    ) -> Result<(), PlayerError> {
        delay.delay_ms(sequence.boot_wait_ms).await;

        let mut first_error = None;
        let last = sequence.commands.len().saturating_sub(1);
        for (i, command) in sequence.commands.iter().enumerate() {
            if let Err(e) = self.send(command).await {
                warn!("startup command {} failed: {}", i, e);
                first_error.get_or_insert(e);
            }
            let pause = if i == last {
                sequence.final_wait_ms
            } else {
                sequence.step_ms
            };
            delay.delay_ms(pause).await;
        }

        match first_error {
            Some(e) => Err(PlayerError::Output(e)),
            None => Ok(()),
        }
    }

    /// Play a file by its number on the card.
    pub async fn play_file_number(&mut self, number: u16) -> Result<(), PlayerError> {
        Ok(self.send(&Command::PlayNumber(number)).await?)
    }

    /// Play a file by path.
    pub async fn play_file(&mut self, path: &'static str) -> Result<(), PlayerError> {
        Ok(self.send(&Command::PlayFile(path)).await?)
    }

    /// Set the volume, clamped to 0..=30.
    pub async fn set_volume(&mut self, level: u8) -> Result<(), PlayerError> {
        Ok(self.send(&Command::volume(level)).await?)
    }

    /// Ask for the current file. The reply is left on the reply line; read
    /// it with [`read_filename`](Self::read_filename).
    pub async fn query_current_file(&mut self) -> Result<(), PlayerError> {
        Ok(self.send(&Command::Query(QUERY_CURRENT_FILE)).await?)
    }

    /// Ask for the number of files on the card and read the answer.
    ///
    /// The reader's start-bit timeout is the reply window. Returns 0 if the
    /// module stays silent or the reply holds no digits.
    pub async fn total_files<R: ResponseSource>(&mut self, reader: &mut R) -> Result<u32, PlayerError> {
        self.send(&Command::Query(QUERY_TOTAL_FILES)).await?;

        let mut buf = [0u8; NUMBER_REPLY_LEN];
        let len = reader
            .read_line(&mut buf, NullPolicy::Keep)
            .map_err(|_| PlayerError::Response)?;
        let count = parse_number(&buf[..len]);
        debug!("total files: {} ({} reply bytes)", count, len);
        Ok(count)
    }

    /// Read a file name reply, dropping stray null bytes.
    pub fn read_filename<R: ResponseSource>(
        &mut self,
        reader: &mut R,
        buf: &mut [u8],
    ) -> Result<usize, PlayerError> {
        reader
            .read_line(buf, NullPolicy::Skip)
            .map_err(|_| PlayerError::Response)
    }

    /// Get a reference to the command sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the command sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Release the command sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}
