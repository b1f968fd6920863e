//! Error types for the LED protocol.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ProtocolError {
    #[error("LED count out of range: {0} (expected 0-5)")]
    CountOutOfRange(u8),

    #[error("Invalid threshold #{index}: {value} (must be finite and >= 0)")]
    InvalidThreshold { index: usize, value: f32 },

    #[error("Threshold #{index} is smaller than the one before it")]
    DecreasingThresholds { index: usize },

    #[error("Empty calibration range: min {min} must be below max {max}")]
    EmptyRange { min: f32, max: f32 },
}
