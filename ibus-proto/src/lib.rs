//! FlySky i-Bus receive path: byte buffering, framing and channel decoding.
//!
//! This crate provides the chip-agnostic half of an i-Bus receiver. It is
//! designed to sit between a UART receive interrupt and a single consumer
//! loop, and is fully testable on host.
//!
//! # Overview
//!
//! - [`ring`]: Lock-free single-producer/single-consumer byte queue
//!   ([`RingBuffer`], [`ByteProducer`], [`ByteConsumer`]) and the
//!   interrupt-side [`ByteReceiver`]
//! - [`framer`]: Stream-synchronizing frame recovery ([`IbusFramer`])
//! - [`frame`]: Validated 32-byte frames and the channel decoder ([`decode`])
//!
//! # Example
//!
//! ```
//! use ibus_proto::{decode, IbusFramer, RingBuffer};
//!
//! let mut ring: RingBuffer<64> = RingBuffer::new();
//! let (mut producer, mut consumer) = ring.split();
//! let mut framer = IbusFramer::new();
//!
//! // Interrupt side: push bytes as they arrive
//! let mut packet = [0u8; 32];
//! packet[0] = 0x20;
//! packet[1] = 0x40;
//! packet[10..12].copy_from_slice(&1500u16.to_le_bytes());
//! for &b in &packet {
//!     assert!(producer.push(b));
//! }
//!
//! // Main loop side: drain and frame
//! let frame = framer.poll(&mut consumer).unwrap();
//! assert_eq!(decode(&frame, 5), 1500);
//! ```
//!
//! # Wire format
//!
//! ```text
//! 0x20 0x40 | ch1 lo ch1 hi | ... | ch14 lo ch14 hi | chk lo chk hi
//! ```
//!
//! i-Bus runs at 115200 baud, 8N1, one frame every 7 ms.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod frame;
pub mod framer;
pub mod ring;

pub use frame::{decode, Frame, CHANNEL_COUNT, FRAME_LEN, NEUTRAL_VALUE};
pub use framer::{ByteSource, ChecksumPolicy, FramerStats, IbusFramer};
pub use ring::{ByteConsumer, ByteProducer, ByteReceiver, RingBuffer, RX_BUFFER_SIZE};

/// First header byte (frame length, 0x20 = 32).
pub const IBUS_HEADER1: u8 = 0x20;

/// Second header byte (command code, 0x40 = servo channels).
pub const IBUS_HEADER2: u8 = 0x40;

/// i-Bus baud rate.
pub const IBUS_BAUDRATE: u32 = 115_200;
