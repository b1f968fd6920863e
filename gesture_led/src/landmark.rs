//! Hand landmarks and the thumb–index "pinch" measurement.
//!
//! Landmarks arrive normalized to `0.0..=1.0` of the frame. Distances are
//! measured in pixels of a [`FrameGeometry`], so calibration thresholds are
//! independent of how the detector normalizes.

use serde::Deserialize;

/// Hand landmark indices (21-point hand model convention).
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Number of landmarks in a complete hand.
    pub const COUNT: usize = 21;

    /// Each digit's tip paired with the joint just below it, thumb first.
    pub const TIP_AND_JOINT: [(usize, usize); 5] = [
        (THUMB_TIP, THUMB_IP),
        (INDEX_FINGER_TIP, INDEX_FINGER_DIP),
        (MIDDLE_FINGER_TIP, MIDDLE_FINGER_DIP),
        (RING_FINGER_TIP, RING_FINGER_DIP),
        (PINKY_TIP, PINKY_DIP),
    ];
}

/// A single landmark, normalized to the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y }
    }
}

/// One detected hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    /// A hand with only the thumb and index tips set; the other landmarks
    /// sit at the origin. Used by the simulators.
    pub fn from_tips(thumb: Landmark, index: Landmark) -> Self {
        let mut lm = vec![Landmark::default(); landmarks::COUNT];
        lm[landmarks::THUMB_TIP] = thumb;
        lm[landmarks::INDEX_FINGER_TIP] = index;
        Hand { landmarks: lm }
    }

    pub fn thumb_tip(&self) -> Option<Landmark> {
        self.landmarks.get(landmarks::THUMB_TIP).copied()
    }

    pub fn index_tip(&self) -> Option<Landmark> {
        self.landmarks.get(landmarks::INDEX_FINGER_TIP).copied()
    }

    /// Measure the thumb–index pinch. `None` for an incomplete hand.
    pub fn pinch(&self, geometry: FrameGeometry) -> Option<Pinch> {
        if self.landmarks.len() < landmarks::COUNT {
            return None;
        }
        let thumb = geometry.to_pixels(self.thumb_tip()?);
        let index = geometry.to_pixels(self.index_tip()?);
        Some(Pinch::between(thumb, index))
    }

    /// How many digits (thumb included) count as extended: a digit is
    /// extended when its tip lies further along +x in the image than the
    /// joint below it. `None` for an incomplete hand.
    pub fn extended_fingers(&self) -> Option<u8> {
        if self.landmarks.len() < landmarks::COUNT {
            return None;
        }
        let extended = landmarks::TIP_AND_JOINT
            .iter()
            .filter(|&&(tip, joint)| self.landmarks[tip].x > self.landmarks[joint].x)
            .count();
        Some(extended as u8)
    }
}

/// All hands reported for one frame; the first one drives the LEDs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<Hand>,
}

impl HandFrame {
    pub fn empty() -> Self {
        HandFrame::default()
    }

    pub fn single(hand: Hand) -> Self {
        HandFrame { hands: vec![hand] }
    }

    pub fn primary(&self) -> Option<&Hand> {
        self.hands.first()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// Pixel size of the camera frame the landmarks were normalized against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        FrameGeometry { width: 640, height: 480 }
    }
}

impl FrameGeometry {
    pub fn to_pixels(&self, lm: Landmark) -> (f32, f32) {
        (lm.x * self.width as f32, lm.y * self.height as f32)
    }

    pub fn to_normalized(&self, x: f32, y: f32) -> Landmark {
        Landmark::new(x / self.width.max(1) as f32, y / self.height.max(1) as f32)
    }
}

/// Thumb and index tips in pixels, their midpoint, and the distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pinch {
    pub thumb: (f32, f32),
    pub index: (f32, f32),
    pub midpoint: (f32, f32),
    pub distance: f32,
}

impl Pinch {
    pub fn between(thumb: (f32, f32), index: (f32, f32)) -> Self {
        Pinch {
            thumb,
            index,
            midpoint: ((thumb.0 + index.0) / 2.0, (thumb.1 + index.1) / 2.0),
            distance: (thumb.0 - index.0).hypot(thumb.1 - index.1),
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
    fn pinch_distance_in_pixels() {
        let hand = Hand::from_tips(Landmark::new(0.0, 0.0), Landmark::new(0.0, 0.5));
        let pinch = hand.pinch(FrameGeometry::default()).unwrap();
        assert_eq!(pinch.distance, 240.0);
        assert_eq!(pinch.midpoint, (0.0, 120.0));
    }

    #[test]
    fn pinch_is_euclidean() {
        let g = FrameGeometry { width: 100, height: 100 };
        let hand = Hand::from_tips(Landmark::new(0.1, 0.1), Landmark::new(0.4, 0.5));
        let d = hand.pinch(g).unwrap().distance;
        assert!((d - 50.0).abs() < 1e-3, "distance {}", d);
    }

    #[test]
    fn incomplete_hand_has_no_pinch() {
        let hand = Hand { landmarks: vec![Landmark::default(); 5] };
        assert_eq!(hand.pinch(FrameGeometry::default()), None);
    }

    /// Complete hand whose first `n` digits point right, the rest left.
    fn hand_with_extended(n: usize) -> Hand {
        let mut lm = vec![Landmark::new(0.5, 0.5); landmarks::COUNT];
        for (k, &(tip, _)) in landmarks::TIP_AND_JOINT.iter().enumerate() {
            lm[tip].x = if k < n { 0.6 } else { 0.4 };
        }
        Hand { landmarks: lm }
    }

    #[test]
    fn extended_fingers_counts_each_digit() {
        for n in 0..=5 {
            assert_eq!(hand_with_extended(n).extended_fingers(), Some(n as u8));
        }
    }

    #[test]
    fn tip_level_with_joint_is_not_extended() {
        let hand = Hand { landmarks: vec![Landmark::new(0.5, 0.5); landmarks::COUNT] };
        assert_eq!(hand.extended_fingers(), Some(0));
    }

    #[test]
    fn extended_fingers_needs_complete_hand() {
        let hand = Hand { landmarks: vec![Landmark::new(0.9, 0.1); 8] };
        assert_eq!(hand.extended_fingers(), None);
    }

    #[test]
    fn primary_is_first_hand() {
        let a = Hand::from_tips(Landmark::new(0.1, 0.1), Landmark::new(0.2, 0.2));
        let b = Hand::from_tips(Landmark::new(0.9, 0.9), Landmark::new(0.8, 0.8));
        let frame = HandFrame { hands: vec![a.clone(), b] };
        assert_eq!(frame.primary(), Some(&a));
        assert_eq!(HandFrame::empty().primary(), None);
    }

    #[test]
    fn normalize_round_trip() {
        let g = FrameGeometry::default();
        let lm = g.to_normalized(320.0, 240.0);
        assert_eq!(lm, Landmark::new(0.5, 0.5));
        assert_eq!(g.to_pixels(lm), (320.0, 240.0));
    }
}
