//! Platform-agnostic RC channel to audio command bridge.
//!
//! This crate connects decoded i-Bus frames to a serial audio module without
//! any chip-specific dependencies. It can be used both in embedded `no_std`
//! environments and on host for testing.
//!
//! # Overview
//!
//! - [`input`]: Frame source trait ([`FrameSource`]) and the ring-buffer
//!   adapter ([`IbusInput`])
//! - [`output`]: Command sink trait ([`CommandSink`])
//! - [`dispatch`]: Per-channel change detection ([`Dispatcher`])
//! - [`profile`]: Built-in channel mappings ([`ROTATION`], [`SWITCH`])
//! - [`player`]: Module operations ([`AudioPlayer`])
//! - [`soft_uart`]: Bit-banged reply receiver ([`SoftUartRx`])
//! - [`bridge`]: The control loop ([`AudioBridge`])
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded use)

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod log;

pub mod bridge;
pub mod dispatch;
pub mod input;
pub mod output;
pub mod player;
pub mod profile;
pub mod soft_uart;

// Re-export main types at crate root
pub use bridge::{AudioBridge, BridgeError};
pub use dispatch::{channel_to_volume, Action, ChannelBinding, ChannelRule, Dispatcher};
pub use input::{FrameSource, IbusInput};
pub use output::{CommandSink, OutputError};
pub use player::{AudioPlayer, PlayerError, ResponseSource};
pub use profile::{Profile, StartupSequence, LOOP_PACING_MS, ROTATION, SWITCH};
pub use soft_uart::{BitTiming, SoftUartError, SoftUartRx};

pub use dfplayer_proto::Command;
pub use ibus_proto::Frame;
