//! # led_actuator
//!
//! The receiving end of the pinch-to-LED link. A single polling loop:
//!
//! ```text
//!   every tick ──▶ drain transport bytes into RxQueue
//!                  └─ complete line queued? ──no──▶ Report::Idle
//!                                 │yes
//!                                 ▼
//!                      parse_line ─▶ Unknown ─▶ Report::Unknown (bank unchanged)
//!                                 └─▶ Count(n) ─▶ first n LEDs ON ─▶ Report::Applied
//! ```
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`bank`] | LED Bank State and the fixed logical → physical pin map |
//! | [`pins`] | Pin drivers: `embedded-hal` output pins or an in-memory recorder |
//! | [`rx`] | Bounded receive queue that yields whole lines |
//! | [`actuator`] | The tick-driven decode-and-drive loop |
//!
//! The library is `no_std`; the `led_bench` binary (feature `bench`) runs
//! the same loop on a host against a serial port or stdin.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod actuator;
pub mod bank;
pub mod pins;
pub mod rx;

pub use actuator::{Actuator, ByteSource, Report, TickConfig};
pub use bank::{LedBank, LED_COUNT, PIN_MAP};
pub use pins::{ActiveLevel, HalPins, PinDriver, RecordingPins};
pub use rx::{RxQueue, RX_CAPACITY};
