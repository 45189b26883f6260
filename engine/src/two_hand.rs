//! Relational two-hand classifier.
//!
//! Maps a pair of hands to a gesture from inter-hand distances, palm
//! orientation, and crossing tests. Like the single-hand classifier it is
//! an ordered table where the first matching row wins. When nothing
//! matches the caller falls back to classifying each hand on its own.

use tracing::trace;

use crate::config::{SingleHandConfig, TwoHandConfig};
use crate::geometry::{distance, dot, palm_center, palm_normal_as};
use crate::gesture::{Gesture, GestureCandidate};
use crate::hand::{Finger, HandLandmark, HandObservation, Handedness, Landmark};
use crate::single_hand::HandShape;

// ── Context ────────────────────────────────────────────────

/// State of the auxiliary transient source for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corroboration {
    /// No source attached; clap falls back to vision only.
    Unavailable,
    /// A transient was heard within the corroboration window.
    Observed,
    /// A source is attached but heard nothing nearby.
    Missing,
}

impl Corroboration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Observed => "observed",
            Self::Missing => "missing",
        }
    }
}

/// Temporal and auxiliary inputs for one pair evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContext {
    /// Palm distance drop over the clap lookback, if history exists.
    pub closing_delta: Option<f32>,
    /// When the current contact began with a rapid closure. Kept while
    /// the palms stay in contact.
    pub closure_ms: Option<f64>,
    pub corroboration: Corroboration,
}

impl Default for PairContext {
    fn default() -> Self {
        Self {
            closing_delta: None,
            closure_ms: None,
            corroboration: Corroboration::Unavailable,
        }
    }
}

/// Handedness used to orient each palm of a pair.
///
/// Opposite labels are trusted. A single label implies the other hand.
/// Without usable labels the hand with the smaller wrist x is taken as
/// the left hand.
pub fn pair_handedness(a: &HandObservation, b: &HandObservation) -> (Handedness, Handedness) {
    use Handedness::{Left, Right};
    match (a.handedness, b.handedness) {
        (Some(Left), Some(Right)) | (Some(Left), None) | (None, Some(Right)) => (Left, Right),
        (Some(Right), Some(Left)) | (Some(Right), None) | (None, Some(Left)) => (Right, Left),
        _ if a.wrist().x <= b.wrist().x => (Left, Right),
        _ => (Right, Left),
    }
}

/// Distance between the two palm centers.
pub fn palm_distance(a: &HandObservation, b: &HandObservation) -> f32 {
    distance(palm_center(a), palm_center(b))
}

// ── Rule table ─────────────────────────────────────────────

/// Everything a pair rule may look at.
pub struct PairView<'a> {
    pub a: &'a HandObservation,
    pub b: &'a HandObservation,
    pub a_shape: HandShape<'a>,
    pub b_shape: HandShape<'a>,
    pub context: PairContext,
}

struct PairRule {
    gesture: Gesture,
    confidence: f32,
    predicate: fn(&PairView<'_>, &TwoHandConfig) -> bool,
}

const RULES: [PairRule; 5] = [
    PairRule {
        gesture: Gesture::Namaste,
        confidence: 0.95,
        predicate: is_namaste,
    },
    PairRule {
        gesture: Gesture::Clap,
        confidence: 0.96,
        predicate: is_heard_clap,
    },
    PairRule {
        gesture: Gesture::Clap,
        confidence: 0.90,
        predicate: is_seen_clap,
    },
    PairRule {
        gesture: Gesture::CrossHands,
        confidence: 0.88,
        predicate: is_crossed,
    },
    PairRule {
        gesture: Gesture::RaiseBothHands,
        confidence: 0.90,
        predicate: is_both_raised,
    },
];

fn is_namaste(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    if config.namaste_pinky_pattern && !(view.a_shape.pinky_only() && view.b_shape.pinky_only()) {
        return false;
    }
    let (a, b) = (view.a, view.b);
    let palms = palm_distance(a, b);
    let wrists = distance(a.wrist(), b.wrist());
    let tips = Finger::ALL
        .iter()
        .map(|f| distance(a.point(f.tip()), b.point(f.tip())))
        .fold(0.0f32, f32::max);
    let (a_side, b_side) = pair_handedness(a, b);
    let facing = dot(palm_normal_as(a, Some(a_side)), palm_normal_as(b, Some(b_side)));
    trace!(palms, wrists, tips, facing, "namaste metrics");
    palms < config.namaste_palm_distance
        && wrists < config.namaste_wrist_distance
        && tips < config.namaste_tip_distance
        && facing < config.namaste_max_normal_dot
}

/// Palms in contact after closing fast enough, either on this frame or
/// at the start of the current contact.
fn palms_clapped(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    if palm_distance(view.a, view.b) >= config.clap_distance {
        return false;
    }
    if !config.clap_require_closure {
        return true;
    }
    view.context.closure_ms.is_some()
        || view
            .context
            .closing_delta
            .is_some_and(|delta| delta > config.clap_closing_delta)
}

fn is_heard_clap(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    view.context.corroboration == Corroboration::Observed && palms_clapped(view, config)
}

fn is_seen_clap(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    view.context.corroboration == Corroboration::Unavailable && palms_clapped(view, config)
}

/// With opposite handedness labels, the hand reported `Right` lies left of
/// the one reported `Left`. Without usable labels, the first hand's wrist
/// lies right of the second's.
fn is_crossed(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    let (a, b) = (view.a, view.b);
    let (right, left) = match (a.handedness, b.handedness) {
        (Some(Handedness::Right), Some(Handedness::Left)) => (a, b),
        (Some(Handedness::Left), Some(Handedness::Right)) => (b, a),
        _ => return a.wrist().x > b.wrist().x + config.cross_margin,
    };
    right.wrist().x < left.wrist().x - config.cross_margin
}

fn is_both_raised(view: &PairView<'_>, config: &TwoHandConfig) -> bool {
    let raised = |hand: &HandObservation| {
        hand.wrist().y < hand.point(HandLandmark::MiddleMcp).y - config.raise_margin
    };
    raised(view.a) && raised(view.b)
}

// ── Classifier ─────────────────────────────────────────────

/// Relational two-hand classifier.
#[derive(Debug, Clone, Default)]
pub struct TwoHandClassifier {
    pub config: TwoHandConfig,
    /// Digit-pattern settings shared with the single-hand rules.
    pub shape_config: SingleHandConfig,
}

impl TwoHandClassifier {
    pub fn new(config: TwoHandConfig, shape_config: SingleHandConfig) -> Self {
        Self {
            config,
            shape_config,
        }
    }

    /// Classify a validated pair. Returns `None` if no rule matches.
    pub fn classify(
        &self,
        a: &HandObservation,
        b: &HandObservation,
        context: PairContext,
        timestamp_ms: f64,
    ) -> Option<GestureCandidate> {
        let view = PairView {
            a,
            b,
            a_shape: HandShape::new(a, &self.shape_config),
            b_shape: HandShape::new(b, &self.shape_config),
            context,
        };
        RULES
            .iter()
            .find(|rule| (rule.predicate)(&view, &self.config))
            .map(|rule| GestureCandidate::new(rule.gesture, rule.confidence, timestamp_ms))
    }

    /// Classify raw landmark slices; either hand malformed yields `None`.
    pub fn classify_points(
        &self,
        a: (&[Landmark], Option<Handedness>),
        b: (&[Landmark], Option<Handedness>),
        context: PairContext,
        timestamp_ms: f64,
    ) -> Option<GestureCandidate> {
        let a = HandObservation::new(a.0, a.1, 1.0).ok()?;
        let b = HandObservation::new(b.0, b.1, 1.0).ok()?;
        self.classify(&a, &b, context, timestamp_ms)
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{namaste_pair, HandBuilder, Pose};

    fn classify_with(
        classifier: &TwoHandClassifier,
        a: HandBuilder,
        b: HandBuilder,
        context: PairContext,
    ) -> Option<GestureCandidate> {
        classifier.classify(&a.build(), &b.build(), context, 100.0)
    }

    fn classify(a: HandBuilder, b: HandBuilder, context: PairContext) -> Option<Gesture> {
        classify_with(&TwoHandClassifier::default(), a, b, context).map(|c| c.gesture)
    }

    fn closing(delta: f32, corroboration: Corroboration) -> PairContext {
        PairContext {
            closing_delta: Some(delta),
            closure_ms: None,
            corroboration,
        }
    }

    fn labelled_namaste_pair(pose: Pose) -> (HandBuilder, HandBuilder) {
        let (a, b) = namaste_pair(pose);
        (a.handedness(Handedness::Left), b.handedness(Handedness::Right))
    }

    #[test]
    fn test_malformed_pair_returns_none() {
        let classifier = TwoHandClassifier::default();
        let good = HandBuilder::new(Pose::OpenPalm).points();
        for n in [0, 20, 22] {
            let mut bad = good.clone();
            bad.resize(n, Landmark::default());
            assert!(classifier
                .classify_points((&bad, None), (&good, None), PairContext::default(), 0.0)
                .is_none());
            assert!(classifier
                .classify_points((&good, None), (&bad, None), PairContext::default(), 0.0)
                .is_none());
        }
    }

    #[test]
    fn test_namaste_detection() {
        let (a, b) = labelled_namaste_pair(Pose::OpenPalm);
        assert_eq!(
            classify(a, b, PairContext::default()),
            Some(Gesture::Namaste)
        );
    }

    #[test]
    fn test_namaste_without_handedness() {
        let (a, b) = namaste_pair(Pose::OpenPalm);
        assert_eq!(
            classify(a.clone(), b.clone(), PairContext::default()),
            Some(Gesture::Namaste)
        );
        // Detector order does not matter.
        assert_eq!(
            classify(b, a, PairContext::default()),
            Some(Gesture::Namaste)
        );
    }

    #[test]
    fn test_namaste_with_one_label() {
        let (a, b) = namaste_pair(Pose::OpenPalm);
        assert_eq!(
            classify(a, b.handedness(Handedness::Right), PairContext::default()),
            Some(Gesture::Namaste)
        );
    }

    #[test]
    fn test_namaste_requires_facing_palms() {
        // Side by side, both palms to the camera.
        let a = HandBuilder::new(Pose::OpenPalm).mirrored().wrist(0.49, 0.8);
        let b = HandBuilder::new(Pose::OpenPalm).wrist(0.51, 0.8);
        assert_eq!(classify(a.clone(), b.clone(), PairContext::default()), None);
        let a = a.handedness(Handedness::Left);
        let b = b.handedness(Handedness::Right);
        assert_eq!(classify(a, b, PairContext::default()), None);
    }

    #[test]
    fn test_pair_handedness() {
        use Handedness::{Left, Right};
        let at = |x: f32| HandBuilder::new(Pose::Fist).wrist(x, 0.6);
        let (l, r) = (at(0.3).build(), at(0.7).build());
        assert_eq!(pair_handedness(&l, &r), (Left, Right));
        assert_eq!(pair_handedness(&r, &l), (Right, Left));

        // Labels win over position; one label implies the other.
        let rl = at(0.3).handedness(Right).build();
        assert_eq!(pair_handedness(&rl, &r), (Right, Left));
        let ll = at(0.7).handedness(Left).build();
        assert_eq!(pair_handedness(&l, &ll), (Right, Left));

        // Duplicate labels fall back to position.
        let r1 = at(0.3).handedness(Right).build();
        let r2 = at(0.7).handedness(Right).build();
        assert_eq!(pair_handedness(&r1, &r2), (Left, Right));
    }

    #[test]
    fn test_namaste_requires_proximity() {
        let (a, b) = labelled_namaste_pair(Pose::OpenPalm);
        let b = b.wrist(0.75, 0.8);
        assert_ne!(
            classify(a, b, PairContext::default()),
            Some(Gesture::Namaste)
        );
    }

    #[test]
    fn test_namaste_pinky_pattern_variant() {
        let mut classifier = TwoHandClassifier::default();
        classifier.config.namaste_pinky_pattern = true;

        let (a, b) = namaste_pair(Pose::OpenPalm);
        assert_eq!(
            classify_with(&classifier, a, b, PairContext::default()),
            None
        );

        let (a, b) = namaste_pair(Pose::PinkyOnly);
        assert_eq!(
            classify_with(&classifier, a, b, PairContext::default()).map(|c| c.gesture),
            Some(Gesture::Namaste)
        );
    }

    /// Left and right palms to the camera, in contact.
    fn clap_pair() -> (HandBuilder, HandBuilder) {
        (
            HandBuilder::new(Pose::OpenPalm).mirrored().wrist(0.46, 0.8),
            HandBuilder::new(Pose::OpenPalm).wrist(0.54, 0.8),
        )
    }

    #[test]
    fn test_clap_held_after_closure() {
        let (a, b) = clap_pair();
        let context = PairContext {
            closing_delta: Some(0.02),
            closure_ms: Some(40.0),
            corroboration: Corroboration::Observed,
        };
        let got = classify_with(&TwoHandClassifier::default(), a, b, context).unwrap();
        assert_eq!(got.gesture, Gesture::Clap);
        assert_eq!(got.confidence, 0.96);
    }

    #[test]
    fn test_clap_vision_only() {
        let (a, b) = clap_pair();
        let got = classify_with(
            &TwoHandClassifier::default(),
            a,
            b,
            closing(0.22, Corroboration::Unavailable),
        )
        .unwrap();
        assert_eq!(got.gesture, Gesture::Clap);
        assert_eq!(got.confidence, 0.90);
    }

    #[test]
    fn test_clap_with_audio() {
        let (a, b) = clap_pair();
        let got = classify_with(
            &TwoHandClassifier::default(),
            a,
            b,
            closing(0.22, Corroboration::Observed),
        )
        .unwrap();
        assert_eq!(got.gesture, Gesture::Clap);
        assert_eq!(got.confidence, 0.96);
    }

    #[test]
    fn test_clap_rejected_without_transient() {
        let (a, b) = clap_pair();
        assert_eq!(classify(a, b, closing(0.22, Corroboration::Missing)), None);
    }

    #[test]
    fn test_clap_requires_rapid_closure() {
        let (a, b) = clap_pair();
        assert_eq!(
            classify(a.clone(), b.clone(), closing(0.05, Corroboration::Unavailable)),
            None
        );
        assert_eq!(classify(a, b, PairContext::default()), None);
    }

    #[test]
    fn test_clap_contact_only_variant() {
        let mut classifier = TwoHandClassifier::default();
        classifier.config.clap_require_closure = false;
        let (a, b) = clap_pair();
        let got = classify_with(&classifier, a, b, PairContext::default());
        assert_eq!(got.map(|c| c.gesture), Some(Gesture::Clap));
    }

    #[test]
    fn test_clap_requires_contact() {
        let a = HandBuilder::new(Pose::OpenPalm).wrist(0.3, 0.8);
        let b = HandBuilder::new(Pose::OpenPalm).wrist(0.7, 0.8);
        assert_eq!(classify(a, b, closing(0.3, Corroboration::Unavailable)), None);
    }

    #[test]
    fn test_cross_by_handedness() {
        let a = HandBuilder::new(Pose::Fist)
            .wrist(0.3, 0.6)
            .handedness(Handedness::Right);
        let b = HandBuilder::new(Pose::Fist)
            .wrist(0.7, 0.6)
            .handedness(Handedness::Left);
        assert_eq!(
            classify(a.clone(), b.clone(), PairContext::default()),
            Some(Gesture::CrossHands)
        );
        // Argument order does not matter when labels are present.
        assert_eq!(
            classify(b, a, PairContext::default()),
            Some(Gesture::CrossHands)
        );
    }

    #[test]
    fn test_uncrossed_by_handedness() {
        let a = HandBuilder::new(Pose::Fist)
            .wrist(0.3, 0.6)
            .handedness(Handedness::Left);
        let b = HandBuilder::new(Pose::Fist)
            .wrist(0.7, 0.6)
            .handedness(Handedness::Right);
        assert_eq!(classify(a, b, PairContext::default()), None);
    }

    #[test]
    fn test_cross_without_handedness() {
        let left = HandBuilder::new(Pose::Fist).wrist(0.3, 0.6);
        let right = HandBuilder::new(Pose::Fist).wrist(0.7, 0.6);
        assert_eq!(
            classify(right.clone(), left.clone(), PairContext::default()),
            Some(Gesture::CrossHands)
        );
        assert_eq!(classify(left, right, PairContext::default()), None);
    }

    #[test]
    fn test_raise_both_hands() {
        let a = HandBuilder::new(Pose::OpenPalm)
            .pointing_down()
            .wrist(0.3, 0.3)
            .handedness(Handedness::Left);
        let b = HandBuilder::new(Pose::OpenPalm)
            .pointing_down()
            .wrist(0.7, 0.3)
            .handedness(Handedness::Right);
        assert_eq!(
            classify(a.clone(), b, PairContext::default()),
            Some(Gesture::RaiseBothHands)
        );

        let upright = HandBuilder::new(Pose::OpenPalm)
            .wrist(0.7, 0.3)
            .handedness(Handedness::Right);
        assert_eq!(classify(a, upright, PairContext::default()), None);
    }

    #[test]
    fn test_corroboration_as_str() {
        assert_eq!(Corroboration::Unavailable.as_str(), "unavailable");
        assert_eq!(Corroboration::Observed.as_str(), "observed");
        assert_eq!(Corroboration::Missing.as_str(), "missing");
    }
}
