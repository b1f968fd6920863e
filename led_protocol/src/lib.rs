//! # led_protocol
//!
//! The vocabulary shared by both ends of the pinch-to-LED link:
//!
//! * [`LedCount`]: how many LEDs should be lit (0–5).
//! * [`CommandToken`]: the newline-terminated ASCII word that carries a
//!   count over the serial line, and [`parse_line`] which turns a received
//!   line back into a [`Parsed`] value.
//! * [`Thresholds`]: the calibration that quantizes a thumb–index distance
//!   into a [`LedCount`].
//!
//! The crate is `no_std` so the device firmware can link it unchanged.
//!
//! ## Wire format
//!
//! | Count | Sent | Also accepted |
//! |---|---|---|
//! | 0 | `ZERO\n` | `0…\n` |
//! | 1 | `ONE\n` | |
//! | 2 | `TWO\n` | |
//! | 3 | `THREE\n` | |
//! | 4 | `FOUR\n` | |
//! | 5 | `FIVE\n` | |
//!
//! Received lines are prefix-matched, so `THREE\r` or `FIVEISH` still decode.
//!
//! ## Quick start
//!
//! ```rust
//! use led_protocol::{parse_line, CommandToken, Parsed, Thresholds};
//!
//! let thresholds = Thresholds::default();       // 15px → 200px
//! let count = thresholds.quantize(120.0);
//! let token = CommandToken::from_count(count);
//! assert_eq!(token.line(), "TWO\n");
//! assert_eq!(parse_line(token.line().as_bytes()), Parsed::Count(count));
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod count;
pub mod error;
pub mod quantize;
pub mod token;

pub use count::LedCount;
pub use error::ProtocolError;
pub use quantize::Thresholds;
pub use token::{parse_line, CommandToken, Parsed, LINE_TERMINATOR};
