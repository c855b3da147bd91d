//! Hand landmark topology and per-frame geometry.
//!
//! Frames follow the 21-keypoint hand model: one wrist point plus four
//! joints for the thumb and each finger. Coordinates are normalized image
//! coordinates with the origin at the top-left corner, so a larger `y`
//! means lower on screen.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of landmarks in a fully detected hand.
pub const LANDMARK_COUNT: usize = 21;

/// Named landmark positions within a 21-point hand frame.
///
/// The discriminant of each variant is its index into the landmark slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    /// Index of this landmark within a frame's landmark slice.
    pub fn idx(&self) -> usize {
        *self as usize
    }
}

/// A single hand keypoint from the landmark oracle.
///
/// Only `x` and `y` are required; depth and detection confidence are
/// carried through when the oracle provides them but never drive
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position (normalized, 0 = left edge)
    pub x: f32,
    /// Vertical position (normalized, 0 = top edge)
    pub y: f32,
    /// Depth relative to the wrist, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Landmark visibility score, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
    /// Landmark presence score, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<f32>,
}

impl Landmark {
    /// Create a landmark from planar coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
            presence: None,
        }
    }
}

/// One classification input: the landmarks the oracle produced for a
/// single camera frame, stamped when it was handed to the engine.
///
/// A frame with fewer than [`LANDMARK_COUNT`] landmarks (including an
/// empty one, meaning no hand was detected) is undetermined and never
/// classifies as clenched.
#[derive(Debug, Clone)]
pub struct HandFrame {
    /// Detected landmarks, in topology order
    pub landmarks: Vec<Landmark>,
    /// When the frame entered the engine
    pub captured_at: Instant,
}

impl HandFrame {
    /// Create a frame stamped with the current time.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            captured_at: Instant::now(),
        }
    }

    /// Create a frame with an explicit timestamp.
    pub fn at(landmarks: Vec<Landmark>, captured_at: Instant) -> Self {
        Self {
            landmarks,
            captured_at,
        }
    }

    /// Whether the frame contains a fully detected hand.
    pub fn has_full_hand(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }

    /// Get a landmark by name, if present in this frame.
    pub fn get(&self, landmark: HandLandmark) -> Option<&Landmark> {
        self.landmarks.get(landmark.idx())
    }
}

/// Planar distance between two landmarks.
///
/// Depth is deliberately ignored: the oracle's `z` estimates are too
/// noisy to gate gameplay on.
pub fn distance(a: &Landmark, b: &Landmark) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Planar midpoint between two landmarks.
pub fn midpoint(a: &Landmark, b: &Landmark) -> (f32, f32) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Interior angle in degrees at `vertex` between rays toward `a` and `b`.
///
/// A degenerate ray (zero length) resolves to 180 degrees, i.e. a fully
/// straightened joint.
pub fn interior_angle_deg(vertex: &Landmark, a: &Landmark, b: &Landmark) -> f32 {
    let va = (a.x - vertex.x, a.y - vertex.y);
    let vb = (b.x - vertex.x, b.y - vertex.y);

    let na = (va.0 * va.0 + va.1 * va.1).sqrt();
    let nb = (vb.0 * vb.0 + vb.1 * vb.1).sqrt();
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 180.0;
    }

    let cos = ((va.0 * vb.0 + va.1 * vb.1) / (na * nb)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
