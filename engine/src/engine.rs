//! Per-frame gesture pipeline.
//!
//! Each frame runs to completion before the next is accepted:
//!
//! 1. score gate (keep the best two hands, in detector order)
//! 2. history update per hand label, plus the pair distance ring
//! 3. relational classification for a pair, falling back to per-hand
//!    static classification with the temporal upgrades
//! 4. one debounce transition
//!
//! The engine owns all mutable state; there are no globals.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::{corroboration, TransientCell};
use crate::config::{EngineConfig, MAX_HANDS};
use crate::debounce::{DebounceState, Step};
use crate::gesture::{Gesture, GestureCandidate, GestureEvent};
use crate::hand::{Frame, HandObservation};
use crate::history::{frame_keys, HandKey, HistoryTracker};
use crate::single_hand::SingleHandClassifier;
use crate::two_hand::{palm_distance, PairContext, TwoHandClassifier};

/// Callback receiving every confirmed event.
pub type GestureListener = Box<dyn FnMut(&GestureEvent) + Send>;

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub frames: u64,
    /// Frames with no usable hands.
    pub idle_frames: u64,
    /// Frames ignored because their timestamp went backwards.
    pub out_of_order_frames: u64,
    /// Hands dropped at the adapter boundary.
    pub hands_rejected: u64,
    /// Hands ignored for a low detector score or beyond the hand limit.
    pub hands_ignored: u64,
    pub candidates: u64,
    pub events: u64,
    /// Repeats of the active gesture swallowed by the cooldown.
    pub suppressed: u64,
}

pub struct GestureEngine {
    config: EngineConfig,
    single: SingleHandClassifier,
    pair: TwoHandClassifier,
    history: HistoryTracker,
    debounce: DebounceState,
    transients: Option<TransientCell>,
    listener: Option<GestureListener>,
    stats: EngineStats,
    last_frame_ms: Option<f64>,
    last_candidate: Option<GestureCandidate>,
    last_event: Option<GestureEvent>,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GestureEngine {
    pub fn new(config: EngineConfig) -> Self {
        info!(
            stability_ms = config.debounce.stability_ms,
            cooldown_ms = config.debounce.cooldown_ms,
            "gesture engine initialized"
        );
        Self {
            single: SingleHandClassifier::new(config.single_hand.clone()),
            pair: TwoHandClassifier::new(config.two_hand.clone(), config.single_hand.clone()),
            history: HistoryTracker::new(config.temporal.clone()),
            debounce: DebounceState::new(),
            transients: None,
            listener: None,
            stats: EngineStats::default(),
            last_frame_ms: None,
            last_candidate: None,
            last_event: None,
            config,
        }
    }

    /// Attach the shared cell written by a transient detector. Ignored when
    /// audio is disabled in the configuration.
    pub fn attach_transients(&mut self, cell: TransientCell) {
        if self.config.audio.enabled {
            info!("audio corroboration attached");
            self.transients = Some(cell);
        } else {
            debug!("audio disabled, not attaching transient source");
        }
    }

    pub fn detach_transients(&mut self) {
        self.transients = None;
    }

    /// Register the callback that receives confirmed events.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&GestureEvent) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Candidate produced by the most recent frame.
    pub fn last_candidate(&self) -> Option<GestureCandidate> {
        self.last_candidate
    }

    pub fn last_event(&self) -> Option<GestureEvent> {
        self.last_event
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    /// Drop all history and debounce state. Counters are kept.
    pub fn reset(&mut self) {
        self.history.reset();
        self.debounce = DebounceState::new();
        self.last_frame_ms = None;
        self.last_candidate = None;
        info!("gesture engine reset");
    }

    // ── Frame processing ───────────────────────────────────

    /// Process one frame. Returns the event confirmed by this frame, if any.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<GestureEvent> {
        if !self.config.enabled {
            return None;
        }
        let now = frame.timestamp_ms;
        if !now.is_finite() || self.last_frame_ms.is_some_and(|last| now < last) {
            warn!(t_ms = now, "ignoring out-of-order frame");
            self.stats.out_of_order_frames += 1;
            return None;
        }
        self.last_frame_ms = Some(now);
        self.stats.frames += 1;
        self.stats.hands_rejected += frame.rejected as u64;

        let hands = self.select_hands(frame);
        if hands.is_empty() {
            self.stats.idle_frames += 1;
            self.history.clear_pair();
        }
        let keys = frame_keys(&hands);
        for (key, hand) in keys.iter().zip(&hands) {
            self.history.observe(*key, hand, now);
        }

        let candidate = match hands.as_slice() {
            [] => None,
            [a, b] => {
                let clap = &self.config.two_hand;
                self.history.observe_pair(now, palm_distance(a, b));
                self.history.update_closure(
                    clap.clap_distance,
                    clap.clap_closing_delta,
                    clap.clap_lookback_frames,
                );
                self.classify_pair(a, b, now)
                    .or_else(|| self.classify_singles(&hands, &keys, now))
            }
            _ => {
                self.history.clear_pair();
                self.classify_singles(&hands, &keys, now)
            }
        };
        if let Some(c) = candidate {
            self.stats.candidates += 1;
            debug!(gesture = %c.gesture, confidence = c.confidence, t_ms = now, "candidate");
        }
        self.last_candidate = candidate;

        let (next, step) = self.debounce.advance(candidate.as_ref(), now, &self.config.debounce);
        self.debounce = next;
        match step {
            Step::Emitted(event) => {
                self.emit(event);
                Some(event)
            }
            Step::Suppressed => {
                self.stats.suppressed += 1;
                None
            }
            Step::Idle | Step::Held => None,
        }
    }

    /// Hands above the score gate; at most two, highest score first, then
    /// returned in detector order.
    fn select_hands<'f>(&mut self, frame: &'f Frame) -> Vec<&'f HandObservation> {
        let mut ranked: Vec<(usize, &HandObservation)> = frame
            .hands
            .iter()
            .enumerate()
            .filter(|(_, h)| h.score >= self.config.min_hand_score)
            .collect();
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        let ignored = frame.hands.len() - ranked.len().min(MAX_HANDS);
        if ignored > 0 {
            debug!(ignored, "hands below score gate or over limit");
            self.stats.hands_ignored += ignored as u64;
        }
        ranked.truncate(MAX_HANDS);
        ranked.sort_by_key(|(i, _)| *i);
        ranked.into_iter().map(|(_, h)| h).collect()
    }

    fn classify_pair(
        &self,
        a: &HandObservation,
        b: &HandObservation,
        now: f64,
    ) -> Option<GestureCandidate> {
        let pair = self.history.pair();
        let closure_ms = pair.closed_at_ms();
        // A transient corroborates the closure that began this contact,
        // however long the palms stay together afterwards.
        let context = PairContext {
            closing_delta: pair.closing_delta(self.config.two_hand.clap_lookback_frames),
            closure_ms,
            corroboration: corroboration(
                self.transients.as_ref(),
                closure_ms.unwrap_or(now),
                self.config.audio.corroboration_window_ms,
            ),
        };
        self.pair.classify(a, b, context, now)
    }

    /// Best upgraded single-hand candidate; the earlier hand wins ties.
    fn classify_singles(
        &self,
        hands: &[&HandObservation],
        keys: &[HandKey],
        now: f64,
    ) -> Option<GestureCandidate> {
        hands
            .iter()
            .zip(keys)
            .filter_map(|(hand, key)| {
                self.history.upgrade(*key, self.single.classify(hand, now), now)
            })
            .fold(None, |best: Option<GestureCandidate>, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            })
    }

    fn emit(&mut self, event: GestureEvent) {
        self.stats.events += 1;
        self.last_event = Some(event);
        info!(
            gesture = %event.gesture,
            confidence = event.confidence,
            t_ms = event.timestamp_ms,
            "gesture detected"
        );
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    // ── Diagnostics ────────────────────────────────────────

    /// Generate s-expression describing the engine state at `now_ms`.
    pub fn status_sexp(&self, now_ms: f64) -> String {
        let label = |g: Option<Gesture>| {
            g.map(|g| format!("\"{}\"", g.as_str()))
                .unwrap_or_else(|| "nil".to_string())
        };
        let transient = self
            .transients
            .as_ref()
            .and_then(|c| c.last())
            .map(|t| format!("{t:.0}"))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:enabled {} :phase {} :pending {} :cooldown {} :last-event {} :frames {} :candidates {} :events {} :suppressed {} :hands-rejected {} :hands-ignored {} :tracked-hands {} :audio {} :last-transient-ms {})",
            if self.config.enabled { "t" } else { "nil" },
            self.debounce.phase(now_ms).as_str(),
            label(self.debounce.pending_gesture()),
            label(self.debounce.cooling_gesture(now_ms)),
            label(self.last_event.map(|e| e.gesture)),
            self.stats.frames,
            self.stats.candidates,
            self.stats.events,
            self.stats.suppressed,
            self.stats.hands_rejected,
            self.stats.hands_ignored,
            self.history.tracked_labels(),
            if self.transients.is_some() { "t" } else { "nil" },
            transient,
        )
    }

    /// Generate s-expression for the active configuration.
    pub fn config_sexp(&self) -> String {
        self.config.to_sexp()
    }
}

// ── Tests ──────────────────────────────────────────────────
