//! AudioBridge: connects the frame source to the audio module.

use crate::dispatch::{ChannelBinding, Dispatcher};
use crate::input::FrameSource;
use crate::output::{CommandSink, OutputError};
use crate::player::AudioPlayer;
use crate::profile::LOOP_PACING_MS;
use embedded_hal_async::delay::DelayNs;
use ibus_proto::Frame;

/// The control loop: frames in, commands out.
///
/// Each iteration polls the frame source once. A complete frame is run
/// through the dispatcher binding by binding. Every changed binding gets
/// its settle pause before the next one is evaluated, after its command is
/// sent if the new value maps to one.
/// The iteration then pauses for the pacing interval.
///
/// # Error Handling
///
/// Errors never stop the loop. A failed send is logged, the binding's
/// value stays recorded, and the remaining bindings are still evaluated.
pub struct AudioBridge<'a, F, S, D> {
    source: F,
    player: AudioPlayer<S>,
    delay: D,
    dispatcher: Dispatcher<'a>,
    pacing_ms: u32,
}

impl<'a, F: FrameSource, S: CommandSink, D: DelayNs> AudioBridge<'a, F, S, D> {
    /// Create a bridge with the default 1 ms pacing.
    pub fn new(
        source: F,
        player: AudioPlayer<S>,
        delay: D,
        bindings: &'a [ChannelBinding],
    ) -> Self {
        Self {
            source,
            player,
            delay,
            dispatcher: Dispatcher::new(bindings),
            pacing_ms: LOOP_PACING_MS,
        }
    }

    /// Override the pause between iterations.
    #[must_use]
    pub fn with_pacing(mut self, pacing_ms: u32) -> Self {
        self.pacing_ms = pacing_ms;
        self
    }

    /// Run the bridge indefinitely.
    ///
    /// This method never returns under normal operation.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(_e) = self.process_one().await {
                warn!("bridge: {}", _e);
            }
        }
    }

    /// Run one loop iteration.
    ///
    /// Returns the number of commands sent, or the first error hit.
    pub async fn process_one(&mut self) -> Result<usize, BridgeError> {
        let result = match self.source.poll_frame() {
            Some(frame) => self.dispatch(&frame).await,
            None => Ok(0),
        };
        self.delay.delay_ms(self.pacing_ms).await;
        result
    }

    async fn dispatch(&mut self, frame: &Frame) -> Result<usize, BridgeError> {
        let mut sent = 0;
        let mut first_error = None;

        for slot in 0..self.dispatcher.len() {
            let Some(action) = self.dispatcher.evaluate(slot, frame) else {
                continue;
            };
            let Some(command) = action.command else {
                trace!("ch{} changed, nothing to send", action.channel);
                self.delay.delay_ms(action.settle_ms).await;
                continue;
            };
            debug!("ch{} -> {}", action.channel, command);

            match self.player.send(&command).await {
                Ok(()) => {
                    sent += 1;
                    self.delay.delay_ms(action.settle_ms).await;
                }
                Err(e) => {
                    warn!("ch{} send failed: {}", action.channel, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(BridgeError::Output(e)),
            None => Ok(sent),
        }
    }

    /// Get a reference to the frame source.
    pub fn source(&self) -> &F {
        &self.source
    }

    /// Get a mutable reference to the frame source.
    pub fn source_mut(&mut self) -> &mut F {
        &mut self.source
    }

    /// Get a reference to the player.
    pub fn player(&self) -> &AudioPlayer<S> {
        &self.player
    }

    /// Get a mutable reference to the player.
    pub fn player_mut(&mut self) -> &mut AudioPlayer<S> {
        &mut self.player
    }

    /// Decompose the bridge into its frame source and player.
    pub fn into_parts(self) -> (F, AudioPlayer<S>) {
        (self.source, self.player)
    }
}

/// Error type for bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Error from the command sink.
    Output(OutputError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ChannelRule;
    use crate::player::tests::{block_on, MockDelay, MockSink};
    use crate::profile::{EFFECT_SOUNDS, ROTATION, SWITCH};
    use dfplayer_proto::Command;
    use ibus_proto::FRAME_LEN;
    use std::collections::VecDeque;

    struct MockSource {
        frames: VecDeque<Option<Frame>>,
    }

    impl MockSource {
        fn new(frames: Vec<Option<Frame>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl FrameSource for MockSource {
        fn poll_frame(&mut self) -> Option<Frame> {
            self.frames.pop_front().flatten()
        }
    }

    fn frame_with(values: &[(u8, u16)]) -> Option<Frame> {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = 0x20;
        bytes[1] = 0x40;
        for &(channel, value) in values {
            let offset = 2 + (channel as usize - 1) * 2;
            bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        }
        Some(Frame::from_bytes(bytes))
    }

    #[test]
    fn test_no_frame_only_paces() {
        let delay = MockDelay::default();
        let pauses = delay.pauses.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![]),
            AudioPlayer::new(MockSink::new()),
            delay,
            SWITCH.bindings,
        );

        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(*pauses.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_switch_profile_sequence() {
        let sink = MockSink::new();
        let sent = sink.sent.clone();
        let delay = MockDelay::default();
        let pauses = delay.pauses.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![
                frame_with(&[(5, 1000)]),
                frame_with(&[(5, 1000)]),
                frame_with(&[(5, 2000)]),
            ]),
            AudioPlayer::new(sink),
            delay,
            SWITCH.bindings,
        );

        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(block_on(bridge.process_one()), Ok(1));

        assert_eq!(
            *sent.lock().unwrap(),
            vec![Command::PlayFile("/mp3/0003.mp3")]
        );
        // Pacing, pacing, settle then pacing
        assert_eq!(*pauses.lock().unwrap(), vec![1, 1, 2000, 1]);
    }

    #[test]
    fn test_rotation_profile_fires_in_binding_order() {
        let sink = MockSink::new();
        let sent = sink.sent.clone();
        let delay = MockDelay::default();
        let pauses = delay.pauses.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![
                frame_with(&[(5, 1000), (6, 1000), (7, 1000)]),
                frame_with(&[(5, 2000), (6, 2000), (7, 1500)]),
            ]),
            AudioPlayer::new(sink),
            delay,
            ROTATION.bindings,
        )
        .with_pacing(0);

        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(block_on(bridge.process_one()), Ok(3));

        assert_eq!(
            *sent.lock().unwrap(),
            vec![
                EFFECT_SOUNDS[0],
                Command::PlayFile("/grumbl02.mp3"),
                Command::Volume(15),
            ]
        );
        assert_eq!(*pauses.lock().unwrap(), vec![0, 100, 100, 50, 0]);
    }

    #[test]
    fn test_send_failure_does_not_stop_other_bindings() {
        let mut sink = MockSink::new();
        sink.fail_on.push(EFFECT_SOUNDS[0]);
        let sent = sink.sent.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![
                frame_with(&[(5, 1000), (7, 1000)]),
                frame_with(&[(5, 2000), (7, 2000)]),
                frame_with(&[(5, 1000), (7, 2000)]),
            ]),
            AudioPlayer::new(sink),
            MockDelay::default(),
            ROTATION.bindings,
        );

        block_on(bridge.process_one()).unwrap();
        assert_eq!(
            block_on(bridge.process_one()),
            Err(BridgeError::Output(OutputError::Io))
        );
        assert_eq!(*sent.lock().unwrap(), vec![Command::Volume(30)]);

        // The failed value was recorded and the rotation still advanced
        assert_eq!(block_on(bridge.process_one()), Ok(1));
        assert_eq!(sent.lock().unwrap()[1], EFFECT_SOUNDS[1]);
    }

    #[test]
    fn test_switch_midpoint_change_settles_without_sending() {
        let sink = MockSink::new();
        let sent = sink.sent.clone();
        let delay = MockDelay::default();
        let pauses = delay.pauses.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![
                frame_with(&[(5, 1000)]),
                frame_with(&[(5, 1500)]),
                frame_with(&[(5, 2000)]),
            ]),
            AudioPlayer::new(sink),
            delay,
            SWITCH.bindings,
        );

        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(block_on(bridge.process_one()), Ok(0));
        assert_eq!(block_on(bridge.process_one()), Ok(1));

        assert_eq!(
            *sent.lock().unwrap(),
            vec![Command::PlayFile("/mp3/0003.mp3")]
        );
        assert_eq!(*pauses.lock().unwrap(), vec![1, 2000, 1, 2000, 1]);
    }

    #[test]
    fn test_custom_bindings() {
        const BEEP: [Command; 1] = [Command::PlayNumber(9)];
        let bindings = [ChannelBinding {
            channel: 10,
            rule: ChannelRule::Rotation(&BEEP),
            settle_ms: 0,
        }];
        let sink = MockSink::new();
        let sent = sink.sent.clone();
        let mut bridge = AudioBridge::new(
            MockSource::new(vec![
                frame_with(&[(10, 1200)]),
                frame_with(&[(10, 1800)]),
                frame_with(&[(10, 1200)]),
            ]),
            AudioPlayer::new(sink),
            MockDelay::default(),
            &bindings,
        );

        for _ in 0..3 {
            block_on(bridge.process_one()).unwrap();
        }
        assert_eq!(
            *sent.lock().unwrap(),
            vec![Command::PlayNumber(9), Command::PlayNumber(9)]
        );
    }
}
