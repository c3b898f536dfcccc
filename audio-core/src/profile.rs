//! Built-in channel mappings and startup sequences.
//!
//! A [`Profile`] is compile-time configuration in the same spirit as a
//! const mapping table: the firmware picks one with a Cargo feature.

use crate::dispatch::{ChannelBinding, ChannelRule};
use dfplayer_proto::{Command, PLAYMODE_SINGLE};

/// Main loop pacing between iterations.
pub const LOOP_PACING_MS: u32 = 1;

/// Volume applied by the rotation profile at startup.
pub const DEFAULT_VOLUME: u8 = 6;

/// Commands sent once after power-up, before channels are watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupSequence {
    /// Wait before the first command, while the module boots.
    pub boot_wait_ms: u32,
    /// Commands in send order.
    pub commands: &'static [Command],
    /// Pause after each command except the last.
    pub step_ms: u32,
    /// Pause after the last command.
    pub final_wait_ms: u32,
}

/// Startup sequence plus channel bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    pub name: &'static str,
    pub startup: StartupSequence,
    pub bindings: &'static [ChannelBinding],
}

/// Sound effects cycled by channel 5.
pub const EFFECT_SOUNDS: [Command; 6] = [
    Command::PlayFile("/tada.mp3"),
    Command::PlayFile("/3wah.mp3"),
    Command::PlayFile("/exclaim.mp3"),
    Command::PlayFile("/growl.mp3"),
    Command::PlayFile("/okay.mp3"),
    Command::PlayFile("/yes.mp3"),
];

/// Grumbles cycled by channel 6.
pub const GRUMBLE_SOUNDS: [Command; 4] = [
    Command::PlayFile("/grumbl02.mp3"),
    Command::PlayFile("/grumbl03.mp3"),
    Command::PlayFile("/grumbl04.mp3"),
    Command::PlayFile("/grumbl05.mp3"),
];

const ROTATION_STARTUP: [Command; 4] = [
    Command::LedOff,
    Command::volume(DEFAULT_VOLUME),
    Command::PlayMode(PLAYMODE_SINGLE),
    Command::PlayNumber(1),
];

const ROTATION_BINDINGS: [ChannelBinding; 3] = [
    ChannelBinding {
        channel: 5,
        rule: ChannelRule::Rotation(&EFFECT_SOUNDS),
        settle_ms: 100,
    },
    ChannelBinding {
        channel: 6,
        rule: ChannelRule::Rotation(&GRUMBLE_SOUNDS),
        settle_ms: 100,
    },
    ChannelBinding {
        channel: 7,
        rule: ChannelRule::Volume,
        settle_ms: 50,
    },
];

/// Two rotating sound banks on channels 5 and 6, volume knob on channel 7.
pub const ROTATION: Profile = Profile {
    name: "rotation",
    startup: StartupSequence {
        boot_wait_ms: 3000,
        commands: &ROTATION_STARTUP,
        step_ms: 1000,
        final_wait_ms: 2000,
    },
    bindings: &ROTATION_BINDINGS,
};

const SWITCH_STARTUP: [Command; 4] = [
    Command::PromptOff,
    Command::LedOff,
    Command::volume(27),
    Command::PlayFile("/mp3/0001.mp3"),
];

const SWITCH_BINDINGS: [ChannelBinding; 1] = [ChannelBinding {
    channel: 5,
    rule: ChannelRule::Switch {
        low: Command::PlayFile("/mp3/0002.mp3"),
        high: Command::PlayFile("/mp3/0003.mp3"),
    },
    settle_ms: 2000,
}];

/// One two-position switch on channel 5 selecting between two clips.
pub const SWITCH: Profile = Profile {
    name: "switch",
    startup: StartupSequence {
        boot_wait_ms: 3000,
        commands: &SWITCH_STARTUP,
        step_ms: 1000,
        final_wait_ms: 3000,
    },
    bindings: &SWITCH_BINDINGS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use dfplayer_proto::{Serialize, MAX_COMMAND_SIZE};

    #[test]
    fn test_all_profile_commands_fit_command_buffer() {
        for profile in [ROTATION, SWITCH] {
            let mut commands: Vec<Command> = profile.startup.commands.to_vec();
            for binding in profile.bindings {
                match binding.rule {
                    ChannelRule::Switch { low, high } => commands.extend([low, high]),
                    ChannelRule::Rotation(list) => commands.extend_from_slice(list),
                    ChannelRule::Volume => commands.push(Command::volume(30)),
                }
            }
            for command in commands {
                let mut buf = [0u8; MAX_COMMAND_SIZE];
                assert!(command.serialize(&mut buf).is_ok(), "{:?}", command);
            }
        }
    }

    #[test]
    fn test_rotation_profile_channels() {
        let channels: Vec<u8> = ROTATION.bindings.iter().map(|b| b.channel).collect();
        assert_eq!(channels, vec![5, 6, 7]);
        assert_eq!(ROTATION.startup.commands[1], Command::Volume(6));
    }
}
