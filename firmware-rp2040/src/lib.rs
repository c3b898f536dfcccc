//! i-Bus receiver to serial audio module bridge for RP2040.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives i-Bus frames from an RC receiver over UART (115200 baud, 8N1)
//! 2. Watches the configured channels for changes
//! 3. Sends AT commands to a DFPlayer-class audio module on the same UART
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Commands to the audio module |
//! | UART1 RX | 9    | i-Bus input from the RC receiver |
//! | Reply    | 10   | Audio module TX, 9600 baud (soft UART) |
//! | LED      | 25   | On-board LED (receive overflow indicator) |
//!
//! # Architecture
//!
//! - **Receiver task** (interrupt executor, high priority): moves UART bytes
//!   into the ring buffer ([`IbusUartReceiver`])
//! - **Main task**: startup sequence, optional diagnostics, then the
//!   [`AudioBridge`] control loop
//! - **Health task**: reports receive overflow
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`profile-rotation`** (default): Rotating sound banks on ch5/ch6, volume on ch7
//! - **`profile-switch`**: Two-position switch on ch5
//! - **`diagnostics`** (default): Query the file count at startup

#![no_std]

// Ensure exactly one channel profile is selected
#[cfg(all(feature = "profile-rotation", feature = "profile-switch"))]
compile_error!("Cannot enable both `profile-rotation` and `profile-switch` features - they define conflicting channel mappings");

#[cfg(not(any(feature = "profile-rotation", feature = "profile-switch")))]
compile_error!("Enable one of the `profile-rotation` or `profile-switch` features");

// Re-export core types for convenience
pub use audio_core::{
    AudioBridge, AudioPlayer, BridgeError, Command, CommandSink, FrameSource, IbusInput,
    OutputError, PlayerError, Profile, SoftUartRx,
};
pub use ibus_proto::{RingBuffer, IBUS_BAUDRATE, RX_BUFFER_SIZE};

pub mod receiver;
pub mod uart_output;

pub use receiver::IbusUartReceiver;
pub use uart_output::UartCommandSink;

/// Reply line receiver on a GPIO.
pub type ReplyReceiver<'d> = SoftUartRx<embassy_rp::gpio::Input<'d>, embassy_time::Delay>;

/// Channel mapping selected at build time.
#[cfg(feature = "profile-rotation")]
pub const PROFILE: Profile = audio_core::ROTATION;

/// Channel mapping selected at build time.
#[cfg(all(feature = "profile-switch", not(feature = "profile-rotation")))]
pub const PROFILE: Profile = audio_core::SWITCH;
