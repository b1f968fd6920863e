//! Bounded receive queue that hands out whole lines.
//!
//! Mirrors a UART receive ring: bytes are appended as they arrive, excess
//! bytes are dropped once the ring is full, and the consumer takes at most
//! one complete line at a time. A partial line stays queued until its
//! terminator arrives.
//!
//! A line longer than the ring is handed out once, truncated, and the rest
//! of it is discarded up to and including its terminator, so a fragment of
//! an overlong line is never read as a line of its own.

use heapless::{Deque, Vec};
use led_protocol::LINE_TERMINATOR;

/// Default ring size, matching a typical microcontroller serial buffer.
pub const RX_CAPACITY: usize = 64;

/// One received line, terminator stripped.
pub type Line<const N: usize = RX_CAPACITY> = Vec<u8, N>;

pub struct RxQueue<const N: usize = RX_CAPACITY> {
    bytes: Deque<u8, N>,
    dropped: usize,
    /// Inside the tail of an overlong line.
    discarding: bool,
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        RxQueue { bytes: Deque::new(), dropped: 0, discarding: false }
    }

    /// Append incoming bytes. Returns how many were consumed (queued, or
    /// discarded as the tail of an overlong line); the rest are counted in
    /// [`dropped`](Self::dropped).
    pub fn push_bytes(&mut self, data: &[u8]) -> usize {
        let mut accepted = 0;
        for &b in data {
            if self.discarding {
                if b == LINE_TERMINATOR {
                    self.discarding = false;
                }
                accepted += 1;
                continue;
            }
            if self.bytes.push_back(b).is_err() {
                self.dropped += data.len() - accepted;
                break;
            }
            accepted += 1;
            if self.bytes.is_full() && !self.contains_terminator() {
                self.discarding = true;
            }
        }
        accepted
    }

    fn contains_terminator(&self) -> bool {
        self.bytes.iter().any(|&b| b == LINE_TERMINATOR)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Free space left in the ring.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.bytes.len()
    }

    /// Bytes lost to overflow since creation.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// A complete line can be taken. A full ring without a terminator also
    /// counts: it can never complete, so it is handed out as one line.
    pub fn has_line(&self) -> bool {
        self.contains_terminator() || self.bytes.is_full()
    }

    /// Take exactly one line off the front of the queue.
    pub fn pop_line(&mut self) -> Option<Line<N>> {
        let len = match self.bytes.iter().position(|&b| b == LINE_TERMINATOR) {
            Some(pos) => pos,
            None if self.bytes.is_full() => N,
            None => return None,
        };

        let mut line = Line::<N>::new();
        for _ in 0..len {
            if let Some(b) = self.bytes.pop_front() {
                // `len <= N`, so the line never overflows.
                let _ = line.push(b);
            }
        }
        if self.bytes.front() == Some(&LINE_TERMINATOR) {
            self.bytes.pop_front();
        }
        Some(line)
    }
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
