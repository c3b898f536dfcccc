//! AT command protocol for DFPlayer-class serial audio modules.
//!
//! - [`command`]: Outbound command vocabulary ([`Command`]) and the
//!   [`Serialize`] trait
//! - [`response`]: Reply line assembly ([`LineAssembler`]) and numeric
//!   reply parsing ([`parse_number`])
//!
//! # Example
//!
//! ```
//! use dfplayer_proto::{parse_number, Command, Serialize, QUERY_TOTAL_FILES};
//!
//! let mut buf = [0u8; 16];
//! let len = Command::Query(QUERY_TOTAL_FILES).serialize(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"AT+QUERY=2\r\n");
//!
//! assert_eq!(parse_number(b"17\r\n"), 17);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod command;
mod fmt;
pub mod response;

pub use command::{
    Command, Serialize, SerializeError, MAX_COMMAND_SIZE, MAX_VOLUME, PLAYMODE_SINGLE,
    QUERY_CURRENT_FILE, QUERY_TOTAL_FILES,
};
pub use response::{parse_number, trim_line_end, LineAssembler, LineStatus, NullPolicy};

/// Default command link baud rate (shared with the i-Bus receive line).
pub const COMMAND_BAUDRATE: u32 = 115_200;
