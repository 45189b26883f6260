//! Temporal history of wrist and palm positions.
//!
//! Keeps a bounded ring of recent samples per hand label and a ring of
//! palm-to-palm distances for the current two-hand pair. Motion-dependent
//! gestures (wave, sustained raise, clap closure) are read from here.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::config::TemporalConfig;
use crate::geometry::palm_center;
use crate::gesture::{Gesture, GestureCandidate};
use crate::hand::{HandObservation, Handedness, Landmark};

/// Confidence of a wave recognized from motion.
const WAVE_CONFIDENCE: f32 = 0.90;
/// Confidence of a sustained single-hand raise.
const RAISE_CONFIDENCE: f32 = 0.85;

// ── Keys and samples ───────────────────────────────────────

/// Identity of a tracked hand within a session.
///
/// Labelled hands are keyed by handedness; unlabelled hands fall back to
/// their position in the frame. Keys carry no identity across absences.
/// Use [`frame_keys`] to key every hand of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandKey {
    Labeled(Handedness),
    Slot(usize),
}

impl HandKey {
    pub fn for_hand(hand: &HandObservation, slot: usize) -> Self {
        match hand.handedness {
            Some(h) => Self::Labeled(h),
            None => Self::Slot(slot),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Labeled(h) => h.as_str().to_string(),
            Self::Slot(i) => format!("slot-{i}"),
        }
    }
}

/// Keys for the hands of one frame, in order.
///
/// When two hands would share a key (the detector reported the same
/// label twice) the whole frame is keyed by slot instead, so two hands
/// never feed one track.
pub fn frame_keys(hands: &[&HandObservation]) -> Vec<HandKey> {
    let keys: Vec<HandKey> = hands
        .iter()
        .enumerate()
        .map(|(slot, hand)| HandKey::for_hand(hand, slot))
        .collect();
    let repeated = keys
        .iter()
        .enumerate()
        .any(|(i, key)| keys[..i].contains(key));
    if repeated {
        debug!("duplicate hand labels in frame, keying by slot");
        (0..hands.len()).map(HandKey::Slot).collect()
    } else {
        keys
    }
}

/// One history entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    pub timestamp_ms: f64,
    pub wrist: Landmark,
    pub palm_center: Landmark,
}

/// Ring of recent samples for one hand label.
#[derive(Debug, Clone)]
pub struct HandTrack {
    samples: VecDeque<HandSample>,
    capacity: usize,
}

impl HandTrack {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, sample: HandSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&HandSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &HandSample> {
        self.samples.iter()
    }

    /// Count of horizontal direction changes of the wrist, ignoring steps
    /// no larger than `jitter`.
    pub fn direction_reversals(&self, jitter: f32) -> usize {
        let mut reversals = 0;
        let mut last_sign = 0.0f32;
        let xs: Vec<f32> = self.samples.iter().map(|s| s.wrist.x).collect();
        for pair in xs.windows(2) {
            let dx = pair[1] - pair[0];
            if dx.abs() <= jitter {
                continue;
            }
            let sign = dx.signum();
            if last_sign != 0.0 && sign != last_sign {
                reversals += 1;
            }
            last_sign = sign;
        }
        reversals
    }

    /// Peak-to-peak wrist x over the window.
    pub fn horizontal_amplitude(&self) -> f32 {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for s in &self.samples {
            min = min.min(s.wrist.x);
            max = max.max(s.wrist.x);
        }
        if self.samples.is_empty() {
            0.0
        } else {
            max - min
        }
    }

    /// The last `frames` samples all have the wrist above `max_y`.
    pub fn held_high(&self, frames: usize, max_y: f32) -> bool {
        frames > 0
            && self.samples.len() >= frames
            && self
                .samples
                .iter()
                .rev()
                .take(frames)
                .all(|s| s.wrist.y < max_y)
    }
}

// ── Pair history ───────────────────────────────────────────

/// Palm-to-palm distances for the current pair of hands.
#[derive(Debug, Clone)]
pub struct PairTrack {
    distances: VecDeque<(f64, f32)>,
    capacity: usize,
    closed_at_ms: Option<f64>,
}

impl PairTrack {
    fn new(capacity: usize) -> Self {
        Self {
            distances: VecDeque::with_capacity(capacity),
            capacity,
            closed_at_ms: None,
        }
    }

    fn push(&mut self, timestamp_ms: f64, distance: f32) {
        if self.distances.len() == self.capacity {
            self.distances.pop_front();
        }
        self.distances.push_back((timestamp_ms, distance));
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Drop in palm distance between `lookback` samples ago (or the oldest
    /// sample, if fewer are held) and now. Positive means closing.
    pub fn closing_delta(&self, lookback: usize) -> Option<f32> {
        let n = self.distances.len();
        if n < 2 {
            return None;
        }
        let (_, current) = self.distances[n - 1];
        let (_, earlier) = self.distances[n - 1 - lookback.min(n - 1)];
        Some(earlier - current)
    }

    /// Time of the rapid closure that started the current contact, if any.
    pub fn closed_at_ms(&self) -> Option<f64> {
        self.closed_at_ms
    }

    /// Mark the latest sample as a closure when the palms are in contact
    /// and closed by more than `min_delta` over `lookback`. The mark holds
    /// while contact lasts and is dropped once the palms separate.
    fn update_closure(&mut self, contact_distance: f32, min_delta: f32, lookback: usize) {
        let Some(&(t_ms, current)) = self.distances.back() else {
            self.closed_at_ms = None;
            return;
        };
        if current >= contact_distance {
            self.closed_at_ms = None;
        } else if self.closed_at_ms.is_none()
            && self.closing_delta(lookback).is_some_and(|d| d > min_delta)
        {
            self.closed_at_ms = Some(t_ms);
        }
    }
}

// ── Tracker ────────────────────────────────────────────────

/// Per-label motion history plus the pair-distance ring.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    pub config: TemporalConfig,
    tracks: HashMap<HandKey, HandTrack>,
    pair: PairTrack,
}

impl HistoryTracker {
    pub fn new(config: TemporalConfig) -> Self {
        let capacity = config.history_len.max(1);
        Self {
            config,
            tracks: HashMap::new(),
            pair: PairTrack::new(capacity),
        }
    }

    /// Append one sample for `key`.
    pub fn observe(&mut self, key: HandKey, hand: &HandObservation, timestamp_ms: f64) {
        let capacity = self.config.history_len.max(1);
        let track = self.tracks.entry(key).or_insert_with(|| {
            debug!("tracking new hand label {}", key.as_string());
            HandTrack::new(capacity)
        });
        track.push(HandSample {
            timestamp_ms,
            wrist: hand.wrist(),
            palm_center: palm_center(hand),
        });
    }

    /// Record the palm distance of the current pair.
    pub fn observe_pair(&mut self, timestamp_ms: f64, distance: f32) {
        self.pair.push(timestamp_ms, distance);
    }

    /// Refresh the closure mark after [`observe_pair`](Self::observe_pair)
    /// and return it.
    pub fn update_closure(
        &mut self,
        contact_distance: f32,
        min_delta: f32,
        lookback: usize,
    ) -> Option<f64> {
        self.pair.update_closure(contact_distance, min_delta, lookback);
        self.pair.closed_at_ms()
    }

    /// Forget the pair ring; the next pair starts fresh.
    pub fn clear_pair(&mut self) {
        self.pair = PairTrack::new(self.config.history_len.max(1));
    }

    pub fn track(&self, key: HandKey) -> Option<&HandTrack> {
        self.tracks.get(&key)
    }

    pub fn pair(&self) -> &PairTrack {
        &self.pair
    }

    pub fn tracked_labels(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_waving(&self, key: HandKey) -> bool {
        self.track(key).is_some_and(|t| {
            t.direction_reversals(self.config.wave_jitter) >= self.config.wave_min_reversals
                && t.horizontal_amplitude() > self.config.wave_min_amplitude
        })
    }

    pub fn is_raised(&self, key: HandKey) -> bool {
        self.track(key).is_some_and(|t| {
            t.held_high(self.config.raise_frames, self.config.raise_max_wrist_y)
        })
    }

    /// Apply the motion-dependent upgrades to a static guess.
    ///
    /// An open-hand shape that oscillates becomes `Wave`. Otherwise an
    /// open hand, or a hand with no static match, held high becomes
    /// `RaiseHand`. Anything else passes through.
    pub fn upgrade(
        &self,
        key: HandKey,
        candidate: Option<GestureCandidate>,
        timestamp_ms: f64,
    ) -> Option<GestureCandidate> {
        let open = candidate.map_or(true, |c| c.gesture.is_open_hand());
        if candidate.is_some() && open && self.is_waving(key) {
            return Some(GestureCandidate::new(
                Gesture::Wave,
                WAVE_CONFIDENCE,
                timestamp_ms,
            ));
        }
        if open && self.is_raised(key) {
            return Some(GestureCandidate::new(
                Gesture::RaiseHand,
                RAISE_CONFIDENCE,
                timestamp_ms,
            ));
        }
        candidate
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
        self.clear_pair();
    }
}

// ── Tests ──────────────────────────────────────────────────
