//! LED Bank State.

use led_protocol::LedCount;

/// Number of LEDs in the bank.
pub const LED_COUNT: usize = 5;

/// Physical pin for each logical LED index.
pub const PIN_MAP: [u8; LED_COUNT] = [2, 4, 8, 10, 12];

/// ON/OFF state of the five LEDs, in logical index order.
///
/// Always of the shape "first N ON, rest OFF".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedBank {
    states: [bool; LED_COUNT],
}

impl LedBank {
    pub const fn all_off() -> Self {
        LedBank { states: [false; LED_COUNT] }
    }

    /// The pattern a given count produces.
    pub fn pattern(count: LedCount) -> Self {
        let mut states = [false; LED_COUNT];
        for s in states.iter_mut().take(count.as_usize()) {
            *s = true;
        }
        LedBank { states }
    }

    pub(crate) fn set(&mut self, count: LedCount) {
        *self = LedBank::pattern(count);
    }

    #[inline]
    pub fn states(&self) -> &[bool; LED_COUNT] {
        &self.states
    }

    #[inline]
    pub fn is_on(&self, index: usize) -> bool {
        self.states.get(index).copied().unwrap_or(false)
    }

    /// Number of LEDs currently ON.
    pub fn lit(&self) -> usize {
        self.states.iter().filter(|&&s| s).count()
    }

    /// `(physical_pin, on)` pairs in logical order.
    pub fn pins(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        PIN_MAP.iter().copied().zip(self.states.iter().copied())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_all_off() {
        let bank = LedBank::default();
        assert_eq!(bank, LedBank::all_off());
        assert_eq!(bank.lit(), 0);
    }

    #[test]
    fn pattern_lights_prefix() {
        for count in LedCount::ALL {
            let bank = LedBank::pattern(count);
            assert_eq!(bank.lit(), count.as_usize());
            for i in 0..LED_COUNT {
                assert_eq!(bank.is_on(i), i < count.as_usize(), "count {} index {}", count, i);
            }
        }
    }

    #[test]
    fn zero_and_five_are_extremes() {
        assert_eq!(LedBank::pattern(LedCount::ZERO).states(), &[false; 5]);
        assert_eq!(LedBank::pattern(LedCount::MAX).states(), &[true; 5]);
    }

    #[test]
    fn pins_follow_pin_map() {
        let bank = LedBank::pattern(LedCount::new(2).unwrap());
        let mut pins = bank.pins();
        assert_eq!(pins.next(), Some((2, true)));
        assert_eq!(pins.next(), Some((4, true)));
        assert_eq!(pins.next(), Some((8, false)));
        assert_eq!(pins.next(), Some((10, false)));
        assert_eq!(pins.next(), Some((12, false)));
        assert_eq!(pins.next(), None);
    }

    #[test]
    fn out_of_range_index_is_off() {
        assert!(!LedBank::pattern(LedCount::MAX).is_on(7));
    }
}
