//! The tick-driven decode-and-drive loop.
//!
//! Each [`Actuator::tick`] performs at most one bounded unit of work:
//! a non-blocking pull of whatever bytes the transport has pending, then at
//! most one line taken from the queue, parsed, and applied. The caller owns
//! the schedule (a timer interrupt, a `loop` with a delay, a test).

use core::fmt;
use core::time::Duration;

use led_protocol::{parse_line, LedCount, Parsed};

use crate::bank::{LedBank, PIN_MAP};
use crate::pins::PinDriver;
use crate::rx::{Line, RxQueue, RX_CAPACITY};

/// Non-blocking byte input (a UART, a serial port, a test buffer).
pub trait ByteSource {
    /// Copy pending bytes into `buf` and return how many were copied.
    /// Returns 0 immediately when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_available(buf)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Report
// ════════════════════════════════════════════════════════════════════════════

/// What one tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Report {
    /// No complete line was waiting.
    Idle,
    /// A command was applied; the first `count` LEDs are now ON.
    Applied { count: LedCount },
    /// A line matched no command word. The bank is unchanged.
    Unknown { line: Line },
}

impl Report {
    pub fn is_idle(&self) -> bool {
        matches!(self, Report::Idle)
    }
}

/// The advisory echo line the device prints.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Idle => f.write_str("Idle"),
            Report::Applied { count } => write!(f, "LEDs: {}", count),
            Report::Unknown { line } => {
                f.write_str("Unknown message: ")?;
                for &b in line.iter() {
                    write!(f, "{}", core::ascii::escape_default(b))?;
                }
                Ok(())
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TickConfig
// ════════════════════════════════════════════════════════════════════════════

/// Polling schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickConfig {
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        TickConfig { period: Duration::from_millis(100) }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Actuator
// ════════════════════════════════════════════════════════════════════════════

/// Owns the LED bank; the only place that changes it.
pub struct Actuator<S: ByteSource, D: PinDriver> {
    source: S,
    driver: D,
    bank: LedBank,
    rx: RxQueue,
}

impl<S: ByteSource, D: PinDriver> Actuator<S, D> {
    /// Start with every LED OFF.
    pub fn new(source: S, driver: D) -> Self {
        let mut actuator = Actuator {
            source,
            driver,
            bank: LedBank::all_off(),
            rx: RxQueue::new(),
        };
        actuator.drive_bank();
        actuator
    }

    /// Run one polling step.
    pub fn tick(&mut self) -> Report {
        let free = self.rx.free();
        if free > 0 {
            let mut buf = [0u8; RX_CAPACITY];
            let n = self.source.read_available(&mut buf[..free]).min(free);
            self.rx.push_bytes(&buf[..n]);
        }

        match self.rx.pop_line() {
            Some(line) => self.handle_line(line),
            None => Report::Idle,
        }
    }

    /// Parse one line, then act on the result.
    pub fn handle_line(&mut self, line: Line) -> Report {
        match parse_line(&line) {
            Parsed::Count(count) => {
                self.apply(count);
                Report::Applied { count }
            }
            Parsed::Unknown => Report::Unknown { line },
        }
    }

    /// Set the bank to "first `count` ON" and drive every pin.
    pub fn apply(&mut self, count: LedCount) {
        self.bank.set(count);
        self.drive_bank();
    }

    fn drive_bank(&mut self) {
        for (i, &pin) in PIN_MAP.iter().enumerate() {
            self.driver.drive(i, pin, self.bank.is_on(i));
        }
    }

    #[inline]
    pub fn bank(&self) -> &LedBank {
        &self.bank
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Bytes waiting in the receive queue (complete or not).
    #[inline]
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Bytes lost to receive-queue overflow.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.rx.dropped()
    }

    pub fn into_parts(self) -> (S, D) {
        (self.source, self.driver)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
