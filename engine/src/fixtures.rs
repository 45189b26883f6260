//! Synthetic hand builders shared by the unit tests.
//!
//! Hands are laid out in a local frame (wrist at the origin, fingers
//! pointing towards -y) and then scaled, optionally mirrored, and placed
//! at a wrist position in normalized image coordinates.

use crate::hand::{Frame, HandObservation, Handedness, Landmark, LANDMARK_COUNT};

/// Canned hand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// All five digits extended.
    OpenPalm,
    /// Four fingers extended, thumb tucked.
    FourFingers,
    /// Everything curled into the palm.
    Fist,
    /// Thumb extended, fingers curled.
    ThumbsUp,
    /// Index extended, rest curled.
    Pointing,
    /// Index and middle extended in a V.
    Victory,
    /// Index and middle spread 120 degrees apart.
    OpenVictory,
    /// Index and middle spread 130 degrees apart.
    WideVictory,
    /// Index and middle extended side by side.
    TwoUp,
    /// Only the pinky extended.
    PinkyOnly,
}

#[derive(Debug, Clone, Copy)]
enum Digit {
    Extended(f32),
    Curled,
}

const KNUCKLES: [(f32, f32); 4] = [(-0.06, -0.18), (-0.02, -0.19), (0.02, -0.18), (0.06, -0.16)];

impl Pose {
    fn thumb_extended(&self) -> bool {
        matches!(self, Self::OpenPalm | Self::ThumbsUp)
    }

    fn digits(&self) -> [Digit; 4] {
        use Digit::{Curled as C, Extended as E};
        match self {
            Self::OpenPalm | Self::FourFingers => [E(0.0), E(0.0), E(0.0), E(0.0)],
            Self::Fist | Self::ThumbsUp => [C, C, C, C],
            Self::Pointing => [E(0.0), C, C, C],
            Self::Victory => [E(-30.0), E(30.0), C, C],
            Self::OpenVictory => [E(-70.0), E(50.0), C, C],
            Self::WideVictory => [E(-80.0), E(50.0), C, C],
            Self::TwoUp => [E(0.0), E(0.0), C, C],
            Self::PinkyOnly => [C, C, C, E(0.0)],
        }
    }

    /// Landmarks in the local hand frame.
    fn local_points(&self) -> [(f32, f32); LANDMARK_COUNT] {
        let mut pts = [(0.0, 0.0); LANDMARK_COUNT];
        pts[1] = (-0.05, -0.05);
        pts[2] = (-0.09, -0.09);
        if self.thumb_extended() {
            pts[3] = (-0.12, -0.19);
            pts[4] = (-0.14, -0.26);
        } else {
            pts[3] = (-0.06, -0.14);
            pts[4] = (-0.02, -0.12);
        }
        for (i, (digit, (mx, my))) in self.digits().iter().zip(KNUCKLES).enumerate() {
            let base = 5 + i * 4;
            pts[base] = (mx, my);
            match *digit {
                Digit::Extended(angle) => {
                    let (s, c) = angle.to_radians().sin_cos();
                    pts[base + 1] = (mx + 0.06 * s, my - 0.06 * c);
                    pts[base + 2] = (mx + 0.10 * s, my - 0.10 * c);
                    pts[base + 3] = (mx + 0.13 * s, my - 0.13 * c);
                }
                Digit::Curled => {
                    pts[base + 1] = (mx, my - 0.05);
                    pts[base + 2] = (mx * 0.6, -0.16);
                    pts[base + 3] = (mx * 0.3, -0.12);
                }
            }
        }
        pts
    }
}

/// Builder for a synthetic `HandObservation`.
#[derive(Debug, Clone)]
pub struct HandBuilder {
    pose: Pose,
    wrist: (f32, f32),
    z: f32,
    scale: f32,
    mirrored: bool,
    pointing_down: bool,
    yaw_deg: f32,
    handedness: Option<Handedness>,
    score: f32,
}

impl HandBuilder {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            wrist: (0.7, 0.8),
            z: 0.0,
            scale: 0.5,
            mirrored: false,
            pointing_down: false,
            yaw_deg: 0.0,
            handedness: None,
            score: 0.95,
        }
    }

    pub fn wrist(mut self, x: f32, y: f32) -> Self {
        self.wrist = (x, y);
        self
    }

    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Mirror horizontally around the wrist (back of the hand to camera).
    pub fn mirrored(mut self) -> Self {
        self.mirrored = true;
        self
    }

    /// Flip vertically so the fingers point down.
    pub fn pointing_down(mut self) -> Self {
        self.pointing_down = true;
        self
    }

    /// Turn the hand about the vertical axis through the wrist. At +90 a
    /// right palm faces -x; at -90 a mirrored (left) palm faces +x.
    pub fn yaw(mut self, degrees: f32) -> Self {
        self.yaw_deg = degrees;
        self
    }

    pub fn handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = Some(handedness);
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn points(&self) -> Vec<Landmark> {
        let mx = if self.mirrored { -1.0 } else { 1.0 };
        let my = if self.pointing_down { -1.0 } else { 1.0 };
        let (sin, cos) = self.yaw_deg.to_radians().sin_cos();
        self.pose
            .local_points()
            .iter()
            .map(|&(x, y)| {
                let x = x * mx;
                Landmark::new(
                    self.wrist.0 + self.scale * x * cos,
                    self.wrist.1 + self.scale * y * my,
                    self.z + self.scale * x * sin,
                )
            })
            .collect()
    }

    pub fn build(&self) -> HandObservation {
        HandObservation::new(&self.points(), self.handedness, self.score).unwrap()
    }
}

/// Two hands pressed palm to palm, unlabelled: a mirrored (left) hand
/// turned to face +x just left of a right hand turned to face -x.
pub fn namaste_pair(pose: Pose) -> (HandBuilder, HandBuilder) {
    (
        HandBuilder::new(pose).mirrored().yaw(-75.0).wrist(0.49, 0.8),
        HandBuilder::new(pose).yaw(75.0).wrist(0.51, 0.8),
    )
}

/// Frame holding the given hands.
pub fn frame(t_ms: f64, hands: Vec<HandObservation>) -> Frame {
    Frame::new(t_ms, hands)
}
