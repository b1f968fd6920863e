//! Distance → [`LedCount`] quantization.
//!
//! Five non-decreasing breakpoints split `[0, ∞)` into six buckets. A
//! distance lights as many LEDs as there are breakpoints at or below it:
//!
//! ```text
//!   0      b1      b2      b3      b4      b5
//!   |──0───|───1───|───2───|───3───|───4───|───5──────▶ distance
//! ```

use core::cmp::Ordering;

use crate::count::LedCount;
use crate::error::ProtocolError;

/// Lower end of the default calibration, in pixels.
pub const DEFAULT_MIN_DISTANCE: f32 = 15.0;
/// Upper end of the default calibration, in pixels.
pub const DEFAULT_MAX_DISTANCE: f32 = 200.0;

/// Calibration breakpoints for [`Thresholds::quantize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    breakpoints: [f32; 5],
}

impl Thresholds {
    /// Build from explicit breakpoints. Each must be finite and `>= 0`,
    /// and no breakpoint may be smaller than the one before it.
    pub fn new(breakpoints: [f32; 5]) -> Result<Self, ProtocolError> {
        for (index, &value) in breakpoints.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ProtocolError::InvalidThreshold { index, value });
            }
            if index > 0 && value < breakpoints[index - 1] {
                return Err(ProtocolError::DecreasingThresholds { index });
            }
        }
        Ok(Thresholds { breakpoints })
    }

    /// Evenly spaced breakpoints: `min` maps to 0 LEDs and every further
    /// fifth of `max - min` lights one more, reaching 5 at `max`.
    pub fn linear(min: f32, max: f32) -> Result<Self, ProtocolError> {
        // Unordered (NaN) bounds are an empty range too.
        if !matches!(min.partial_cmp(&max), Some(Ordering::Less)) {
            return Err(ProtocolError::EmptyRange { min, max });
        }
        let step = (max - min) / 5.0;
        let mut breakpoints = [0.0f32; 5];
        for (k, b) in breakpoints.iter_mut().enumerate() {
            *b = min + step * (k as f32 + 1.0);
        }
        // Pin the top breakpoint so `max` itself always reaches 5.
        breakpoints[4] = max;
        Thresholds::new(breakpoints)
    }

    #[inline]
    pub fn breakpoints(&self) -> &[f32; 5] {
        &self.breakpoints
    }

    /// Map a distance onto `0..=5`. NaN and negative distances give 0.
    pub fn quantize(&self, distance: f32) -> LedCount {
        let lit = self.breakpoints.iter().filter(|&&b| b <= distance).count();
        LedCount::new(lit as u8).unwrap_or(LedCount::MAX)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        let step = (DEFAULT_MAX_DISTANCE - DEFAULT_MIN_DISTANCE) / 5.0;
        Thresholds {
            breakpoints: [
                DEFAULT_MIN_DISTANCE + step,
                DEFAULT_MIN_DISTANCE + step * 2.0,
                DEFAULT_MIN_DISTANCE + step * 3.0,
                DEFAULT_MIN_DISTANCE + step * 4.0,
                DEFAULT_MAX_DISTANCE,
            ],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_linear_15_200() {
        assert_eq!(Thresholds::default(), Thresholds::linear(15.0, 200.0).unwrap());
        assert_eq!(Thresholds::default().breakpoints(), &[52.0, 89.0, 126.0, 163.0, 200.0]);
    }

    #[test]
    fn below_min_is_zero() {
        let t = Thresholds::default();
        assert_eq!(t.quantize(0.0), LedCount::ZERO);
        assert_eq!(t.quantize(15.0), LedCount::ZERO);
        assert_eq!(t.quantize(51.9), LedCount::ZERO);
    }

    #[test]
    fn bucket_edges() {
        let t = Thresholds::default();
        let expect = [(52.0, 1), (88.9, 1), (89.0, 2), (126.0, 3), (163.0, 4), (199.9, 4)];
        for (d, n) in expect {
            assert_eq!(t.quantize(d).get(), n, "distance {}", d);
        }
    }

    #[test]
    fn max_and_beyond_is_five() {
        let t = Thresholds::default();
        assert_eq!(t.quantize(200.0), LedCount::MAX);
        assert_eq!(t.quantize(10_000.0), LedCount::MAX);
        assert_eq!(t.quantize(f32::INFINITY), LedCount::MAX);
    }

    #[test]
    fn nan_and_negative_are_zero() {
        let t = Thresholds::default();
        assert_eq!(t.quantize(f32::NAN), LedCount::ZERO);
        assert_eq!(t.quantize(-3.0), LedCount::ZERO);
    }

    #[test]
    fn equal_breakpoints_skip_a_bucket() {
        let t = Thresholds::new([1.0, 2.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.quantize(1.5).get(), 1);
        assert_eq!(t.quantize(2.0).get(), 3);
    }

    #[test]
    fn new_rejects_bad_breakpoints() {
        assert_eq!(
            Thresholds::new([1.0, 0.5, 2.0, 3.0, 4.0]),
            Err(ProtocolError::DecreasingThresholds { index: 1 })
        );
        assert!(matches!(
            Thresholds::new([-1.0, 0.5, 2.0, 3.0, 4.0]),
            Err(ProtocolError::InvalidThreshold { index: 0, .. })
        ));
        assert!(matches!(
            Thresholds::new([0.0, 1.0, f32::NAN, 3.0, 4.0]),
            Err(ProtocolError::InvalidThreshold { index: 2, .. })
        ));
    }

    #[test]
    fn linear_rejects_empty_range() {
        assert!(matches!(Thresholds::linear(5.0, 5.0), Err(ProtocolError::EmptyRange { .. })));
        assert!(matches!(Thresholds::linear(9.0, 1.0), Err(ProtocolError::EmptyRange { .. })));
    }

    #[test]
    fn linear_rejects_nan_bounds() {
        for (min, max) in [(f32::NAN, 10.0), (0.0, f32::NAN), (f32::NAN, f32::NAN)] {
            assert!(matches!(Thresholds::linear(min, max), Err(ProtocolError::EmptyRange { .. })));
        }
    }

    #[test]
    fn linear_normalized_range() {
        let t = Thresholds::linear(0.0, 0.5).unwrap();
        assert_eq!(t.quantize(0.05).get(), 0);
        assert_eq!(t.quantize(0.25).get(), 2);
        assert_eq!(t.quantize(0.5).get(), 5);
    }
}
