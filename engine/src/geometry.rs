//! Geometric primitives over hand landmarks.
//!
//! Pure, allocation-free helpers shared by the single-hand and two-hand
//! classifiers. Distances are in raw landmark units (not normalized).

use crate::hand::{Finger, HandLandmark, HandObservation, Handedness, Landmark};

/// Euclidean distance between two landmarks in 3-D.
pub fn distance(a: Landmark, b: Landmark) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = b.z - a.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Vector from `a` to `b`.
pub fn vector(a: Landmark, b: Landmark) -> [f32; 3] {
    [b.x - a.x, b.y - a.y, b.z - a.z]
}

pub fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

/// Unsigned angle between two vectors in degrees. Zero-length input yields 0.
pub fn angle_deg(a: [f32; 3], b: [f32; 3]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Mean of the four base knuckles (landmarks 5, 9, 13, 17).
pub fn palm_center(hand: &HandObservation) -> Landmark {
    let mut sum = [0.0f32; 3];
    for finger in Finger::FOUR {
        let p = hand.point(finger.base());
        sum[0] += p.x;
        sum[1] += p.y;
        sum[2] += p.z;
    }
    Landmark::new(sum[0] / 4.0, sum[1] / 4.0, sum[2] / 4.0)
}

/// Unit normal of the palm plane, using the hand's own label.
pub fn palm_normal(hand: &HandObservation) -> [f32; 3] {
    palm_normal_as(hand, hand.handedness)
}

/// Unit normal of the palm plane for a hand taken to be `handedness`.
///
/// Computed as `(wrist -> index knuckle) x (wrist -> pinky knuckle)` and
/// negated for left hands, which are mirror images of right hands. A palm
/// facing the camera then points towards +z for either hand, and two palms
/// pressed together have normals with a dot product near -1. `None` keeps
/// the right-hand sign. A degenerate palm yields the zero vector.
pub fn palm_normal_as(hand: &HandObservation, handedness: Option<Handedness>) -> [f32; 3] {
    let wrist = hand.wrist();
    let to_index = vector(wrist, hand.point(HandLandmark::IndexMcp));
    let to_pinky = vector(wrist, hand.point(HandLandmark::PinkyMcp));
    let n = cross(to_index, to_pinky);
    let len = norm(n);
    if len <= f32::EPSILON {
        return [0.0; 3];
    }
    let sign = match handedness {
        Some(Handedness::Left) => -1.0,
        _ => 1.0,
    };
    [sign * n[0] / len, sign * n[1] / len, sign * n[2] / len]
}

/// Screen-space extension test: the tip sits above its proximal joint by
/// more than `tolerance` (y grows downwards).
pub fn finger_extended(hand: &HandObservation, finger: Finger, tolerance: f32) -> bool {
    hand.point(finger.tip()).y < hand.point(finger.proximal()).y - tolerance
}

/// The tip is at or below its proximal joint, allowing `margin` of slack.
pub fn finger_curled(hand: &HandObservation, finger: Finger, margin: f32) -> bool {
    hand.point(finger.tip()).y >= hand.point(finger.proximal()).y - margin
}

/// Radial thumb test: the thumb tip is further from the wrist than the
/// thumb's MCP joint.
pub fn thumb_extended(hand: &HandObservation) -> bool {
    let wrist = hand.wrist();
    distance(wrist, hand.point(HandLandmark::ThumbTip))
        > distance(wrist, hand.point(HandLandmark::ThumbMcp))
}

/// Index-to-pinky knuckle span, used to normalize shape metrics.
pub fn knuckle_span(hand: &HandObservation) -> f32 {
    distance(
        hand.point(HandLandmark::IndexMcp),
        hand.point(HandLandmark::PinkyMcp),
    )
}

/// Segment-length straightness: `|tip - pip| >= ratio * |base - pip|`.
pub fn finger_straight(hand: &HandObservation, finger: Finger, ratio: f32) -> bool {
    let pip = hand.point(finger.proximal());
    distance(hand.point(finger.tip()), pip) >= ratio * distance(hand.point(finger.base()), pip)
}
