//! [`LedCount`]: the number of lit LEDs, always within `0..=5`.

use core::fmt;

use crate::error::ProtocolError;

/// Number of LEDs to light, guaranteed to be in `0..=5`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedCount(u8);

impl LedCount {
    pub const ZERO: LedCount = LedCount(0);
    pub const MAX: LedCount = LedCount(5);

    /// Every count in ascending order.
    pub const ALL: [LedCount; 6] = [
        LedCount(0),
        LedCount(1),
        LedCount(2),
        LedCount(3),
        LedCount(4),
        LedCount(5),
    ];

    /// `None` when `n > 5`.
    pub const fn new(n: u8) -> Option<Self> {
        if n <= Self::MAX.0 {
            Some(LedCount(n))
        } else {
            None
        }
    }

    /// Raw value (0–5).
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for LedCount {
    type Error = ProtocolError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        LedCount::new(n).ok_or(ProtocolError::CountOutOfRange(n))
    }
}

impl From<LedCount> for u8 {
    fn from(c: LedCount) -> u8 {
        c.0
    }
}

impl fmt::Display for LedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
