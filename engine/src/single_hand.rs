//! Static single-hand classifier.
//!
//! Maps one hand's landmarks to a gesture through an ordered rule table.
//! Rules are evaluated top to bottom and the first match wins, so the
//! table order is the tie-break policy for degenerate input that satisfies
//! several shapes at once.

use tracing::trace;

use crate::config::SingleHandConfig;
use crate::geometry::{
    angle_deg, distance, finger_curled, finger_extended, finger_straight, knuckle_span,
    palm_center, palm_normal, thumb_extended, vector,
};
use crate::gesture::{Gesture, GestureCandidate};
use crate::hand::{Finger, HandLandmark, HandObservation, Handedness, Landmark};

// ── Hand shape features ────────────────────────────────────

/// Per-hand features computed once and shared by every rule.
pub struct HandShape<'a> {
    pub hand: &'a HandObservation,
    /// Vertical extension of index, middle, ring, pinky.
    pub fingers: [bool; 4],
    /// Radial thumb extension.
    pub thumb: bool,
    /// Extended digits, 0-5.
    pub extended_count: usize,
}

impl<'a> HandShape<'a> {
    pub fn new(hand: &'a HandObservation, config: &SingleHandConfig) -> Self {
        let mut fingers = [false; 4];
        for (slot, finger) in fingers.iter_mut().zip(Finger::FOUR) {
            *slot = finger_extended(hand, finger, config.extension_tolerance);
        }
        let thumb = thumb_extended(hand);
        let extended_count = fingers.iter().filter(|e| **e).count() + usize::from(thumb);
        Self {
            hand,
            fingers,
            thumb,
            extended_count,
        }
    }

    pub fn index(&self) -> bool {
        self.fingers[0]
    }

    pub fn middle(&self) -> bool {
        self.fingers[1]
    }

    pub fn ring(&self) -> bool {
        self.fingers[2]
    }

    pub fn pinky(&self) -> bool {
        self.fingers[3]
    }

    /// Only the pinky is up (used by the namaste pattern variant).
    pub fn pinky_only(&self) -> bool {
        self.pinky() && !self.index() && !self.middle() && !self.ring() && !self.thumb
    }

    fn on_right_half(&self, config: &SingleHandConfig) -> bool {
        self.hand.wrist().x > config.frame_midline_x
    }
}

// ── Rule table ─────────────────────────────────────────────

/// One row of the rule table.
pub struct Rule {
    pub gesture: Gesture,
    pub confidence: f32,
    predicate: fn(&HandShape<'_>, &SingleHandConfig) -> bool,
}

/// Rules in evaluation order.
pub const RULES: [Rule; 8] = [
    Rule {
        gesture: Gesture::Fist,
        confidence: 0.92,
        predicate: is_fist,
    },
    Rule {
        gesture: Gesture::ThumbsUp,
        confidence: 0.90,
        predicate: is_thumbs_up,
    },
    Rule {
        gesture: Gesture::Pointing,
        confidence: 0.88,
        predicate: is_pointing,
    },
    Rule {
        gesture: Gesture::Victory,
        confidence: 0.90,
        predicate: is_victory,
    },
    Rule {
        gesture: Gesture::Backhand,
        confidence: 0.85,
        predicate: is_backhand,
    },
    Rule {
        gesture: Gesture::OpenPalm,
        confidence: 0.90,
        predicate: is_open_palm,
    },
    Rule {
        gesture: Gesture::Stop,
        confidence: 0.90,
        predicate: is_stop,
    },
    Rule {
        gesture: Gesture::Wave,
        confidence: 0.80,
        predicate: is_static_wave,
    },
];

fn tips(hand: &HandObservation) -> [Landmark; 5] {
    Finger::ALL.map(|f| hand.point(f.tip()))
}

/// Curled digits, compact tips, and a narrow tip cluster. Scale-free:
/// both metrics are divided by the knuckle span.
fn is_fist(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    let hand = shape.hand;
    let curled = Finger::ALL
        .iter()
        .filter(|f| finger_curled(hand, **f, config.curl_margin))
        .count();
    if curled < config.fist_min_curled {
        return false;
    }

    let span = knuckle_span(hand);
    if span <= f32::EPSILON {
        return false;
    }

    let center = palm_center(hand);
    let tips = tips(hand);
    let compactness = tips.iter().map(|t| distance(*t, center)).sum::<f32>() / 5.0 / span;

    let mut spread = 0.0f32;
    for (i, a) in tips.iter().enumerate() {
        for b in &tips[i + 1..] {
            spread = spread.max(distance(*a, *b));
        }
    }
    let spread = spread / span;

    trace!(curled, compactness, spread, "fist metrics");
    compactness < config.fist_compactness && spread < config.fist_spread
}

fn is_thumbs_up(shape: &HandShape<'_>, _config: &SingleHandConfig) -> bool {
    shape.thumb && shape.extended_count == 1
}

/// Index up, thumb tucked, and none of the other three clearly raised.
/// The other fingers are judged with a relaxed tolerance so a slightly
/// lifted middle finger does not spoil the shape.
fn is_pointing(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    let hand = shape.hand;
    if !shape.index() || shape.thumb {
        return false;
    }
    let others_raised = [Finger::Middle, Finger::Ring, Finger::Pinky]
        .iter()
        .any(|f| finger_extended(hand, *f, config.pointing_relaxed_tolerance));
    if others_raised || (shape.middle() && shape.ring() && shape.pinky()) {
        return false;
    }

    let knuckle = hand.point(HandLandmark::IndexMcp);
    let palm_len = distance(hand.wrist(), knuckle);
    if palm_len <= f32::EPSILON {
        return false;
    }
    let ratio = distance(knuckle, hand.point(HandLandmark::IndexTip)) / palm_len;
    (config.index_length_min..=config.index_length_max).contains(&ratio)
}

fn is_victory(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    let hand = shape.hand;
    if !(shape.index() && shape.middle()) || shape.ring() || shape.pinky() || shape.thumb {
        return false;
    }
    if !finger_straight(hand, Finger::Index, config.victory_segment_ratio)
        || !finger_straight(hand, Finger::Middle, config.victory_segment_ratio)
    {
        return false;
    }

    let span = knuckle_span(hand);
    let index_tip = hand.point(HandLandmark::IndexTip);
    let middle_tip = hand.point(HandLandmark::MiddleTip);
    if span <= f32::EPSILON || distance(index_tip, middle_tip) / span < config.victory_min_spread {
        return false;
    }

    let angle = angle_deg(
        vector(hand.point(HandLandmark::IndexMcp), index_tip),
        vector(hand.point(HandLandmark::MiddleMcp), middle_tip),
    );
    if angle < config.victory_min_angle_deg || angle > config.victory_max_angle_deg {
        return false;
    }

    // Index sits towards the frame center from the middle finger.
    if shape.on_right_half(config) {
        index_tip.x < middle_tip.x
    } else {
        index_tip.x > middle_tip.x
    }
}

fn is_backhand(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    is_open_palm(shape, config) && palm_normal(shape.hand)[2] < config.backhand_normal_z
}

fn is_open_palm(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    shape.extended_count == 5 && shape.on_right_half(config)
}

fn is_stop(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    shape.extended_count == 5 && !shape.on_right_half(config)
}

fn is_static_wave(shape: &HandShape<'_>, config: &SingleHandConfig) -> bool {
    shape.extended_count >= config.wave_min_extended
}

// ── Classifier ─────────────────────────────────────────────

/// Static single-hand classifier.
#[derive(Debug, Clone, Default)]
pub struct SingleHandClassifier {
    pub config: SingleHandConfig,
}

impl SingleHandClassifier {
    pub fn new(config: SingleHandConfig) -> Self {
        Self { config }
    }

    /// Classify a validated hand. Returns `None` if no rule matches.
    pub fn classify(&self, hand: &HandObservation, timestamp_ms: f64) -> Option<GestureCandidate> {
        let shape = HandShape::new(hand, &self.config);
        RULES
            .iter()
            .find(|rule| (rule.predicate)(&shape, &self.config))
            .map(|rule| GestureCandidate::new(rule.gesture, rule.confidence, timestamp_ms))
    }

    /// Classify raw landmarks. Anything but 21 finite points yields `None`.
    pub fn classify_points(
        &self,
        points: &[Landmark],
        handedness: Option<Handedness>,
        timestamp_ms: f64,
    ) -> Option<GestureCandidate> {
        let hand = HandObservation::new(points, handedness, 1.0).ok()?;
        self.classify(&hand, timestamp_ms)
    }
}

// ── Tests ──────────────────────────────────────────────────
