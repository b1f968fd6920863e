//! # gesture_led
//!
//! Host side of the pinch-to-LED pipeline: watches the distance between the
//! thumb tip and the index fingertip, turns it into a count of lit LEDs, and
//! sends that count to the LED board as a command word over a serial line.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Hand landmarks (detector process, stdin, LeapMotion or mouse) | [`source`] | [`landmark::HandFrame`] |
//! | Thumb–index distance in frame pixels | [`landmark`] | [`landmark::Pinch`] |
//! | Distance (or extended fingers with `--mode fingers`) → 0..=5 → command word | [`perception`] | [`led_protocol::CommandToken`] |
//! | Serial write (or dry run) | [`link`] | `"THREE\n"` on the wire |
//! | Overlay window | [`visualizer`] | markers, LED bar, thresholds |
//!
//! ## Calibration
//!
//! By default 15 px maps to zero LEDs and 200 px to all five, in even steps.
//! `--range MIN,MAX` moves the endpoints and `--thresholds a,b,c,d,e` sets
//! the five breakpoints directly.
//!
//! ## Feature flags
//!
//! * (default): external detector, piped landmarks, or **simulation mode**
//!   where holding the left mouse button in the overlay moves the index tip.
//! * `leap`: **hardware mode**, polls a real LeapMotion controller via LeapC.

pub mod app;
pub mod cli;
pub mod landmark;
pub mod link;
pub mod perception;
pub mod source;
pub mod visualizer;
