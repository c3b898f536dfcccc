//! Channel edge detection and command selection.
//!
//! Each [`ChannelBinding`] watches one i-Bus channel. The dispatcher keeps
//! the last observed value per binding and fires the binding's rule only
//! when the value changes. A stored value of 0 means "never observed": the
//! first reading is recorded without firing, so nothing plays at power-up.

use dfplayer_proto::{Command, MAX_VOLUME};
use ibus_proto::{decode, Frame, CHANNEL_COUNT};

/// Most bindings a dispatcher tracks. Extra bindings are ignored.
pub const MAX_BINDINGS: usize = CHANNEL_COUNT as usize;

/// Stick/switch value for the low end of travel.
pub const CHANNEL_MIN: u16 = 1000;

/// Stick/switch value for the high end of travel.
pub const CHANNEL_MAX: u16 = 2000;

/// What a channel does when its value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRule {
    /// Two-position switch: exactly 1000 sends `low`, exactly 2000 sends
    /// `high`. Anything in between sends nothing but still settles.
    Switch { low: Command, high: Command },
    /// Each change sends the next command in the list, wrapping around.
    Rotation(&'static [Command]),
    /// Each change sends a volume command scaled from the channel value.
    Volume,
}

/// One watched channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelBinding {
    /// Channel number, 1-based.
    pub channel: u8,
    /// Rule fired on change.
    pub rule: ChannelRule,
    /// Pause after sending, so the module can start playback.
    pub settle_ms: u32,
}

/// A channel change seen by the dispatcher.
///
/// `command` is `None` when the rule maps the new value to nothing, such as
/// a switch caught mid-travel. The settle pause applies either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Action {
    pub channel: u8,
    pub command: Option<Command>,
    pub settle_ms: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    last: u16,
    index: usize,
}

/// Per-binding change detection over successive frames.
pub struct Dispatcher<'a> {
    bindings: &'a [ChannelBinding],
    states: [ChannelState; MAX_BINDINGS],
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over at most [`MAX_BINDINGS`] bindings.
    pub fn new(bindings: &'a [ChannelBinding]) -> Self {
        let len = bindings.len().min(MAX_BINDINGS);
        Self {
            bindings: &bindings[..len],
            states: [ChannelState::default(); MAX_BINDINGS],
        }
    }

    /// Number of active bindings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether there are no bindings.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forget all observed values and rotation positions.
    pub fn reset(&mut self) {
        self.states = [ChannelState::default(); MAX_BINDINGS];
    }

    /// Evaluate binding `slot` against `frame`.
    ///
    /// Always records the new value. Returns an action for every change
    /// after the first observation. Slots are meant to be evaluated in
    /// order, with each returned action carried out before the next slot is
    /// evaluated.
    pub fn evaluate(&mut self, slot: usize, frame: &Frame) -> Option<Action> {
        let binding = self.bindings.get(slot)?;
        let state = &mut self.states[slot];

        let value = decode(frame, binding.channel);
        let previous = core::mem::replace(&mut state.last, value);
        if previous == 0 || previous == value {
            return None;
        }

        let command = match binding.rule {
            ChannelRule::Switch { low, high } => match value {
                CHANNEL_MIN => Some(low),
                CHANNEL_MAX => Some(high),
                _ => None,
            },
            ChannelRule::Rotation(list) => {
                let command = list.get(state.index).copied();
                if !list.is_empty() {
                    state.index = (state.index + 1) % list.len();
                }
                command
            }
            ChannelRule::Volume => Some(Command::volume(channel_to_volume(value))),
        };

        Some(Action {
            channel: binding.channel,
            command,
            settle_ms: binding.settle_ms,
        })
    }
}

/// Scale a channel value to a volume level.
///
/// The value is clamped to 1000..=2000 and mapped linearly onto 0..=30,
/// truncating.
#[must_use]
pub fn channel_to_volume(value: u16) -> u8 {
    let clamped = value.clamp(CHANNEL_MIN, CHANNEL_MAX);
    let span = u32::from(CHANNEL_MAX - CHANNEL_MIN);
    (u32::from(clamped - CHANNEL_MIN) * u32::from(MAX_VOLUME) / span) as u8
}
