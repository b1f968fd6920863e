//! The perception step: frame → pinch distance → LED count → command.
//!
//! [`Perception::observe`] is pure; [`Perception::step`] adds the send and
//! the bookkeeping around it. A failed send is reported and the caller
//! simply moves on to the next frame.
//!
//! In [`PerceptionMode::Fingers`] the count is the number of extended
//! digits instead of the quantized pinch distance; the pinch is still
//! measured for the overlay.

use led_protocol::{CommandToken, LedCount, Thresholds};
use tracing::{debug, info, warn};

use crate::landmark::{FrameGeometry, HandFrame, Pinch};
use crate::link::{CommandSink, LinkError};

/// When to transmit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmitPolicy {
    /// Only when the token differs from the last one successfully sent.
    #[default]
    OnChange,
    /// On every frame that has a hand.
    EveryFrame,
}

/// What turns a hand into an LED count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PerceptionMode {
    /// Thumb–index distance through the calibration thresholds.
    #[default]
    Pinch,
    /// Number of extended digits, thumb included.
    Fingers,
}

impl PerceptionMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pinch" => Some(PerceptionMode::Pinch),
            "fingers" => Some(PerceptionMode::Fingers),
            _ => None,
        }
    }
}

/// What a frame measured, before anything is sent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Observation {
    NoHand,
    Measured { pinch: Pinch, count: LedCount, token: CommandToken },
}

/// What [`Perception::step`] did with a frame.
#[derive(Debug)]
pub enum Step {
    /// No usable hand; nothing sent, the board keeps its LEDs.
    Skipped,
    /// Same token as last time under [`EmitPolicy::OnChange`].
    Unchanged(CommandToken),
    Sent(CommandToken),
    SendFailed(CommandToken, LinkError),
}

/// Per-run counters for the status line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub frames: u64,
    pub misses: u64,
    pub sent: u64,
    pub failures: u64,
}

pub struct Perception {
    thresholds: Thresholds,
    geometry: FrameGeometry,
    policy: EmitPolicy,
    mode: PerceptionMode,
    last_sent: Option<CommandToken>,
    last_observation: Observation,
    stats: Stats,
}

impl Perception {
    pub fn new(thresholds: Thresholds, geometry: FrameGeometry, policy: EmitPolicy) -> Self {
        Perception {
            thresholds,
            geometry,
            policy,
            mode: PerceptionMode::default(),
            last_sent: None,
            last_observation: Observation::NoHand,
            stats: Stats::default(),
        }
    }

    pub fn with_mode(mut self, mode: PerceptionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Measure a frame without side effects.
    pub fn observe(&self, frame: &HandFrame) -> Observation {
        let Some(hand) = frame.primary() else {
            return Observation::NoHand;
        };
        let Some(pinch) = hand.pinch(self.geometry) else {
            return Observation::NoHand;
        };
        let count = match self.mode {
            PerceptionMode::Pinch => self.thresholds.quantize(pinch.distance),
            PerceptionMode::Fingers => match hand.extended_fingers().and_then(LedCount::new) {
                Some(count) => count,
                None => return Observation::NoHand,
            },
        };
        Observation::Measured { pinch, count, token: CommandToken::from_count(count) }
    }

    /// Process one frame, sending through `sink` when the policy says so.
    pub fn step(&mut self, frame: &HandFrame, sink: &mut dyn CommandSink) -> Step {
        self.stats.frames += 1;
        let observation = self.observe(frame);
        self.last_observation = observation;

        let token = match observation {
            Observation::NoHand => {
                self.stats.misses += 1;
                return Step::Skipped;
            }
            Observation::Measured { pinch, count, token } => {
                debug!("distance {:.1}px → {} LEDs", pinch.distance, count);
                token
            }
        };

        if self.policy == EmitPolicy::OnChange && self.last_sent == Some(token) {
            return Step::Unchanged(token);
        }

        match sink.send(token) {
            Ok(()) => {
                info!("Sent: {}", token);
                self.last_sent = Some(token);
                self.stats.sent += 1;
                Step::Sent(token)
            }
            Err(e) => {
                warn!("serial port error: {}", e);
                self.stats.failures += 1;
                Step::SendFailed(token, e)
            }
        }
    }

    #[inline]
    pub fn last_sent(&self) -> Option<CommandToken> {
        self.last_sent
    }

    #[inline]
    pub fn last_observation(&self) -> Observation {
        self.last_observation
    }

    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    #[inline]
    pub fn mode(&self) -> PerceptionMode {
        self.mode
    }

    #[inline]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[inline]
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
