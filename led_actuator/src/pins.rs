//! Pin drivers for the LED bank.
//!
//! [`PinDriver`] is the seam between LED Bank State and hardware. On a board
//! use [`HalPins`] over any `embedded-hal` output pin; on a host use
//! [`RecordingPins`], which just remembers the last level per pin.

use embedded_hal::digital::OutputPin;

use crate::bank::{LED_COUNT, PIN_MAP};

/// Drives one logical LED.
pub trait PinDriver {
    /// Set LED `index` (physical pin `pin`) ON or OFF.
    fn drive(&mut self, index: usize, pin: u8, on: bool);
}

/// Whether the LEDs are driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

// ════════════════════════════════════════════════════════════════════════════
// HalPins
// ════════════════════════════════════════════════════════════════════════════

/// Five `embedded-hal` output pins, in [`PIN_MAP`] order.
pub struct HalPins<P: OutputPin> {
    pins: [P; LED_COUNT],
    active: ActiveLevel,
}

impl<P: OutputPin> HalPins<P> {
    /// Take ownership of the pins and drive them all OFF.
    pub fn new(pins: [P; LED_COUNT], active: ActiveLevel) -> Self {
        let mut bank = HalPins { pins, active };
        for (i, &pin) in PIN_MAP.iter().enumerate() {
            bank.drive(i, pin, false);
        }
        bank
    }

    pub fn active_high(pins: [P; LED_COUNT]) -> Self {
        Self::new(pins, ActiveLevel::High)
    }

    pub fn active_low(pins: [P; LED_COUNT]) -> Self {
        Self::new(pins, ActiveLevel::Low)
    }

    pub fn free(self) -> [P; LED_COUNT] {
        self.pins
    }
}

impl<P: OutputPin> PinDriver for HalPins<P> {
    fn drive(&mut self, index: usize, _pin: u8, on: bool) {
        let Some(pin) = self.pins.get_mut(index) else { return };
        match (self.active, on) {
            (ActiveLevel::High, true) => pin.set_high().ok(),
            (ActiveLevel::High, false) => pin.set_low().ok(),
            (ActiveLevel::Low, true) => pin.set_low().ok(),
            (ActiveLevel::Low, false) => pin.set_high().ok(),
        };
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingPins
// ════════════════════════════════════════════════════════════════════════════

/// In-memory driver: records the last level written to each pin and how
/// many writes happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingPins {
    levels: [bool; LED_COUNT],
    writes: usize,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn levels(&self) -> &[bool; LED_COUNT] {
        &self.levels
    }

    /// Level last written to physical pin `pin`, if it belongs to the bank.
    pub fn level_of(&self, pin: u8) -> Option<bool> {
        PIN_MAP.iter().position(|&p| p == pin).map(|i| self.levels[i])
    }

    #[inline]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PinDriver for RecordingPins {
    fn drive(&mut self, index: usize, _pin: u8, on: bool) {
        if let Some(level) = self.levels.get_mut(index) {
            *level = on;
            self.writes += 1;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
