//! Gesture labels, per-frame candidates, and confirmed events.

use serde::Serialize;

// ── Gesture labels ─────────────────────────────────────────

/// Every gesture the engine can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gesture {
    /// All digits curled into a compact ball.
    Fist,
    /// Thumb extended, fingers curled.
    ThumbsUp,
    /// Index finger extended, others curled.
    Pointing,
    /// Index and middle extended in a V.
    Victory,
    /// Five digits extended, palm to camera, right half of the frame.
    OpenPalm,
    /// Open hand with the back of the hand to the camera.
    Backhand,
    /// Five digits extended on the left half of the frame.
    Stop,
    /// Open hand, either oscillating or the static four-finger fallback.
    Wave,
    /// One hand held high for several frames.
    RaiseHand,
    /// Palms pressed together.
    Namaste,
    /// Palms closing rapidly into contact.
    Clap,
    /// Hands crossed over each other.
    CrossHands,
    /// Both hands raised.
    RaiseBothHands,
}

impl Gesture {
    /// String representation for output and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fist => "fist",
            Self::ThumbsUp => "thumbs-up",
            Self::Pointing => "pointing",
            Self::Victory => "victory",
            Self::OpenPalm => "open-palm",
            Self::Backhand => "backhand",
            Self::Stop => "stop",
            Self::Wave => "wave",
            Self::RaiseHand => "raise-hand",
            Self::Namaste => "namaste",
            Self::Clap => "clap",
            Self::CrossHands => "cross-hands",
            Self::RaiseBothHands => "raise-both-hands",
        }
    }

    /// Shapes with all fingers up that temporal rules may upgrade.
    pub fn is_open_hand(&self) -> bool {
        matches!(self, Self::OpenPalm | Self::Stop | Self::Wave)
    }

    /// Whether this gesture needs two hands.
    pub fn is_two_handed(&self) -> bool {
        matches!(
            self,
            Self::Namaste | Self::Clap | Self::CrossHands | Self::RaiseBothHands
        )
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Candidates and events ──────────────────────────────────

/// An unconfirmed per-frame classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureCandidate {
    pub gesture: Gesture,
    /// Fixed per-rule confidence in (0, 1].
    pub confidence: f32,
    pub timestamp_ms: f64,
}

impl GestureCandidate {
    pub fn new(gesture: Gesture, confidence: f32, timestamp_ms: f64) -> Self {
        Self {
            gesture,
            confidence,
            timestamp_ms,
        }
    }
}

/// A debounce-confirmed gesture, the engine's only external output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub confidence: f32,
    /// Frame time at which the stability window was satisfied.
    pub timestamp_ms: f64,
}

impl GestureEvent {
    /// Render as an s-expression.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:gesture \"{}\" :confidence {:.2} :timestamp-ms {:.0})",
            self.gesture.as_str(),
            self.confidence,
            self.timestamp_ms,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_as_str() {
        assert_eq!(Gesture::Fist.as_str(), "fist");
        assert_eq!(Gesture::ThumbsUp.as_str(), "thumbs-up");
        assert_eq!(Gesture::OpenPalm.as_str(), "open-palm");
        assert_eq!(Gesture::RaiseBothHands.as_str(), "raise-both-hands");
        assert_eq!(Gesture::CrossHands.to_string(), "cross-hands");
    }

    #[test]
    fn test_serialize_matches_as_str() {
        for g in [Gesture::ThumbsUp, Gesture::RaiseHand, Gesture::Namaste] {
            let json = serde_json::to_string(&g).unwrap();
            assert_eq!(json, format!("\"{}\"", g.as_str()));
        }
    }

    #[test]
    fn test_open_hand_shapes() {
        assert!(Gesture::OpenPalm.is_open_hand());
        assert!(Gesture::Stop.is_open_hand());
        assert!(Gesture::Wave.is_open_hand());
        assert!(!Gesture::Backhand.is_open_hand());
        assert!(!Gesture::Fist.is_open_hand());
    }

    #[test]
    fn test_two_handed() {
        assert!(Gesture::Clap.is_two_handed());
        assert!(!Gesture::RaiseHand.is_two_handed());
    }

    #[test]
    fn test_event_sexp() {
        let evt = GestureEvent {
            gesture: Gesture::Clap,
            confidence: 0.96,
            timestamp_ms: 1234.0,
        };
        assert_eq!(
            evt.to_sexp(),
            "(:gesture \"clap\" :confidence 0.96 :timestamp-ms 1234)"
        );
    }
}
