//! Host perception → in-memory serial line → device actuator.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gesture_led::landmark::{FrameGeometry, Hand, HandFrame, Landmark};
use gesture_led::link::{CommandSink, LinkError};
use gesture_led::perception::{EmitPolicy, Perception, Step};
use led_actuator::{Actuator, ByteSource, RecordingPins, Report, PIN_MAP};
use led_protocol::{CommandToken, LedCount, Thresholds};

/// Both ends of a loss-free serial line.
#[derive(Clone, Default)]
struct Wire(Rc<RefCell<VecDeque<u8>>>);

impl Wire {
    fn inject(&self, bytes: &[u8]) {
        self.0.borrow_mut().extend(bytes.iter().copied());
    }

    fn pending(&self) -> usize {
        self.0.borrow().len()
    }
}

impl CommandSink for Wire {
    fn send(&mut self, token: CommandToken) -> Result<(), LinkError> {
        self.inject(token.line().as_bytes());
        Ok(())
    }

    fn name(&self) -> &str {
        "wire"
    }
}

impl ByteSource for Wire {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let mut q = self.0.borrow_mut();
        let n = buf.len().min(q.len());
        for (slot, b) in buf.iter_mut().zip(q.drain(..n)) {
            *slot = b;
        }
        n
    }
}

struct Rig {
    wire: Wire,
    perception: Perception,
    device: Actuator<Wire, RecordingPins>,
}

impl Rig {
    fn new(policy: EmitPolicy) -> Self {
        let wire = Wire::default();
        Rig {
            device: Actuator::new(wire.clone(), RecordingPins::new()),
            perception: Perception::new(Thresholds::default(), FrameGeometry::default(), policy),
            wire,
        }
    }

    fn frame(&mut self, frame: &HandFrame) -> Step {
        let mut sink = self.wire.clone();
        self.perception.step(frame, &mut sink)
    }

    /// Tick until the device reports idle; returns the non-idle reports.
    fn settle(&mut self) -> Vec<Report> {
        let mut reports = Vec::new();
        loop {
            let r = self.device.tick();
            if r.is_idle() {
                return reports;
            }
            reports.push(r);
        }
    }

    fn lit(&self) -> usize {
        self.device.bank().lit()
    }
}

/// Thumb at the frame origin, index tip `px` pixels straight below it.
fn pinch(px: f32) -> HandFrame {
    let g = FrameGeometry::default();
    HandFrame::single(Hand::from_tips(Landmark::new(0.0, 0.0), g.to_normalized(0.0, px)))
}

fn applied(n: u8) -> Report {
    Report::Applied { count: LedCount::new(n).unwrap() }
}

#[test]
fn opening_the_pinch_lights_leds_in_order() {
    let mut rig = Rig::new(EmitPolicy::OnChange);
    let mut seen = Vec::new();

    for px in (0..=240).step_by(2) {
        if let Step::Sent(token) = rig.frame(&pinch(px as f32)) {
            seen.push(token);
        }
        for report in rig.settle() {
            if let Report::Applied { count } = report {
                assert_eq!(count.as_usize(), rig.lit());
            }
        }
    }

    assert_eq!(seen, CommandToken::ALL.to_vec());
    assert_eq!(rig.lit(), 5);
    for pin in PIN_MAP {
        assert_eq!(rig.device.driver().level_of(pin), Some(true));
    }
}

#[test]
fn closing_the_pinch_turns_leds_off() {
    let mut rig = Rig::new(EmitPolicy::OnChange);
    rig.frame(&pinch(250.0));
    rig.settle();
    assert_eq!(rig.lit(), 5);

    rig.frame(&pinch(100.0));
    assert_eq!(rig.settle(), vec![applied(2)]);
    assert_eq!(rig.device.driver().levels(), &[true, true, false, false, false]);

    rig.frame(&pinch(5.0));
    assert_eq!(rig.settle(), vec![applied(0)]);
    assert_eq!(rig.device.driver().levels(), &[false; 5]);
}

#[test]
fn line_split_across_ticks() {
    let mut rig = Rig::new(EmitPolicy::OnChange);
    rig.wire.inject(b"TW");
    assert_eq!(rig.device.tick(), Report::Idle);
    assert_eq!(rig.lit(), 0);

    rig.wire.inject(b"O\n");
    assert_eq!(rig.device.tick(), applied(2));
    assert_eq!(rig.lit(), 2);
}

#[test]
fn unknown_word_leaves_bank_alone() {
    let mut rig = Rig::new(EmitPolicy::OnChange);
    rig.frame(&pinch(140.0));
    assert_eq!(rig.settle(), vec![applied(3)]);

    rig.wire.inject(b"BANANA\n");
    let reports = rig.settle();
    assert_eq!(reports.len(), 1);
    assert!(matches!(reports[0], Report::Unknown { .. }));
    assert_eq!(reports[0].to_string(), "Unknown message: BANANA");
    assert_eq!(rig.lit(), 3);
}

#[test]
fn zero_alias_clears_bank() {
    let mut rig = Rig::new(EmitPolicy::OnChange);
    rig.frame(&pinch(180.0));
    rig.settle();
    assert_eq!(rig.lit(), 4);

    rig.wire.inject(b"0\n");
    assert_eq!(rig.settle(), vec![applied(0)]);
    assert_eq!(rig.lit(), 0);
}

#[test]
fn lost_hand_sends_nothing_and_keeps_leds() {
    let mut rig = Rig::new(EmitPolicy::EveryFrame);
    rig.frame(&pinch(100.0));
    rig.settle();

    for _ in 0..5 {
        assert!(matches!(rig.frame(&HandFrame::empty()), Step::Skipped));
    }
    assert_eq!(rig.wire.pending(), 0);
    assert!(rig.settle().is_empty());
    assert_eq!(rig.lit(), 2);
}

#[test]
fn burst_is_applied_one_line_per_tick() {
    let mut rig = Rig::new(EmitPolicy::EveryFrame);
    for px in [10.0, 60.0, 100.0, 140.0, 180.0, 220.0] {
        rig.frame(&pinch(px));
    }
    let reports = rig.settle();
    assert_eq!(reports, (0..=5).map(applied).collect::<Vec<_>>());
    assert_eq!(rig.device.dropped(), 0);
    assert_eq!(rig.perception.stats().sent, 6);
}
