//! Hand observation data model and the frame adapter.
//!
//! Models the 21 landmarks per hand reported by the external pose
//! estimator, validates raw detector output at the boundary, and turns it
//! into fixed-size `HandObservation`s grouped into `Frame`s.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

// ── Landmark definitions ───────────────────────────────────

/// The 21 anatomical hand landmarks, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

/// The five digits, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
    ];

    /// The four non-thumb fingers.
    pub const FOUR: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    /// Knuckle joint. For the thumb this is the CMC joint.
    pub fn base(&self) -> HandLandmark {
        match self {
            Self::Thumb => HandLandmark::ThumbCmc,
            Self::Index => HandLandmark::IndexMcp,
            Self::Middle => HandLandmark::MiddleMcp,
            Self::Ring => HandLandmark::RingMcp,
            Self::Pinky => HandLandmark::PinkyMcp,
        }
    }

    /// Proximal joint (landmarks 2/6/10/14/18).
    pub fn proximal(&self) -> HandLandmark {
        match self {
            Self::Thumb => HandLandmark::ThumbMcp,
            Self::Index => HandLandmark::IndexPip,
            Self::Middle => HandLandmark::MiddlePip,
            Self::Ring => HandLandmark::RingPip,
            Self::Pinky => HandLandmark::PinkyPip,
        }
    }

    /// Fingertip (landmarks 4/8/12/16/20).
    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Thumb => HandLandmark::ThumbTip,
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Handedness label as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }

    /// Parse a detector label. Accepts "Left"/"Right" in any case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

// ── Landmark point ─────────────────────────────────────────

/// A single landmark in normalized image coordinates.
///
/// `x` and `y` lie roughly in `[0, 1]` with `y` growing downwards;
/// `z` is relative depth, smaller is closer to the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from(p: [f32; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

// ── Errors ─────────────────────────────────────────────────

/// Reasons a raw detection is rejected at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("expected {expected} landmarks, got {got}")]
    LandmarkCount { expected: usize, got: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

// ── Hand observation ───────────────────────────────────────

/// One detected hand: exactly 21 landmarks plus detector metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: [Landmark; LANDMARK_COUNT],
    /// Handedness label, if the detector reported one.
    pub handedness: Option<Handedness>,
    /// Detector confidence (0.0-1.0).
    pub score: f32,
}

impl HandObservation {
    /// Validate a landmark slice and build an observation.
    ///
    /// Anything other than exactly 21 finite points is rejected.
    pub fn new(
        points: &[Landmark],
        handedness: Option<Handedness>,
        score: f32,
    ) -> Result<Self, FrameError> {
        let landmarks: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| FrameError::LandmarkCount {
                expected: LANDMARK_COUNT,
                got: points.len(),
            })?;
        if let Some(index) = landmarks.iter().position(|p| !p.is_finite()) {
            return Err(FrameError::NonFinite { index });
        }
        Ok(Self {
            landmarks,
            handedness,
            score,
        })
    }

    /// Position of a landmark.
    pub fn point(&self, landmark: HandLandmark) -> Landmark {
        self.landmarks[landmark.index()]
    }

    pub fn wrist(&self) -> Landmark {
        self.point(HandLandmark::Wrist)
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }
}

impl TryFrom<RawHand> for HandObservation {
    type Error = FrameError;

    fn try_from(raw: RawHand) -> Result<Self, Self::Error> {
        let points: Vec<Landmark> = raw.landmarks.into_iter().map(Landmark::from).collect();
        let handedness = raw.label.as_deref().and_then(|label| {
            let parsed = Handedness::parse(label);
            if parsed.is_none() {
                debug!("ignoring unknown handedness label {:?}", label);
            }
            parsed
        });
        Self::new(&points, handedness, raw.score.unwrap_or(1.0))
    }
}

// ── Frame ──────────────────────────────────────────────────

/// Hand observations delivered together by one detector callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Capture time in milliseconds on the caller's clock.
    pub timestamp_ms: f64,
    /// Zero or more validated hands.
    pub hands: Vec<HandObservation>,
    /// Number of raw hands dropped by the adapter.
    pub rejected: usize,
}

impl Frame {
    pub fn new(timestamp_ms: f64, hands: Vec<HandObservation>) -> Self {
        Self {
            timestamp_ms,
            hands,
            rejected: 0,
        }
    }

    /// Adapt a raw detector result, dropping hands that fail validation.
    pub fn from_raw(raw: RawFrame) -> Self {
        let mut hands = Vec::with_capacity(raw.hands.len());
        let mut rejected = 0;
        for (slot, raw_hand) in raw.hands.into_iter().enumerate() {
            match HandObservation::try_from(raw_hand) {
                Ok(hand) => hands.push(hand),
                Err(e) => {
                    warn!(slot, t_ms = raw.t_ms, "dropping hand: {}", e);
                    rejected += 1;
                }
            }
        }
        Self {
            timestamp_ms: raw.t_ms,
            hands,
            rejected,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

// ── Raw detector input ─────────────────────────────────────

/// One hand as emitted by the external detector, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHand {
    /// Landmark triples `[x, y, z]`.
    #[serde(default)]
    pub landmarks: Vec<[f32; 3]>,
    /// "Left" or "Right".
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

/// One detector callback, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    pub t_ms: f64,
    #[serde(default)]
    pub hands: Vec<RawHand>,
}

// ── Tests ──────────────────────────────────────────────────
