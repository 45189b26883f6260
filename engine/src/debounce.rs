//! Confirmation state machine turning noisy per-frame candidates into
//! discrete gesture events.
//!
//! The state is a plain value: `advance` consumes it together with the
//! frame's candidate and returns the successor, so a scripted sequence of
//! timestamps replays deterministically. One instance is global to the
//! engine; two hands cannot hold two different gestures at once.

use crate::config::DebounceConfig;
use crate::gesture::{Gesture, GestureCandidate, GestureEvent};

/// Externally visible phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending,
    Cooldown,
}

impl DebouncePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Cooldown => "cooldown",
        }
    }
}

/// What one `advance` call did with its candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// No candidate this frame.
    Idle,
    /// Candidate held, waiting for the stability window.
    Held,
    /// Candidate confirmed.
    Emitted(GestureEvent),
    /// Repeat of the last emitted label during its cooldown.
    Suppressed,
}

impl Step {
    pub fn event(&self) -> Option<GestureEvent> {
        match self {
            Self::Emitted(event) => Some(*event),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingGesture {
    gesture: Gesture,
    confidence: f32,
    since_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cooldown {
    gesture: Gesture,
    until_ms: f64,
}

/// Debounce state value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebounceState {
    pending: Option<PendingGesture>,
    cooldown: Option<Cooldown>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's candidate (or its absence) at time `now_ms`.
    pub fn advance(
        self,
        candidate: Option<&GestureCandidate>,
        now_ms: f64,
        config: &DebounceConfig,
    ) -> (Self, Step) {
        let cooldown = self.cooldown.filter(|c| now_ms < c.until_ms);

        let Some(candidate) = candidate else {
            return (
                Self {
                    pending: None,
                    cooldown,
                },
                Step::Idle,
            );
        };

        if cooldown.is_some_and(|c| c.gesture == candidate.gesture) {
            return (
                Self {
                    pending: None,
                    cooldown,
                },
                Step::Suppressed,
            );
        }

        let pending = match self.pending {
            Some(p) if p.gesture == candidate.gesture => PendingGesture {
                confidence: candidate.confidence,
                ..p
            },
            _ => PendingGesture {
                gesture: candidate.gesture,
                confidence: candidate.confidence,
                since_ms: now_ms,
            },
        };

        if now_ms - pending.since_ms >= config.stability_ms {
            let event = GestureEvent {
                gesture: pending.gesture,
                confidence: pending.confidence,
                timestamp_ms: now_ms,
            };
            let next = Self {
                pending: None,
                cooldown: Some(Cooldown {
                    gesture: pending.gesture,
                    until_ms: now_ms + config.cooldown_ms,
                }),
            };
            return (next, Step::Emitted(event));
        }

        (
            Self {
                pending: Some(pending),
                cooldown,
            },
            Step::Held,
        )
    }

    pub fn phase(&self, now_ms: f64) -> DebouncePhase {
        if self.pending.is_some() {
            DebouncePhase::Pending
        } else if self.cooldown.is_some_and(|c| now_ms < c.until_ms) {
            DebouncePhase::Cooldown
        } else {
            DebouncePhase::Idle
        }
    }

    /// Label currently held for confirmation.
    pub fn pending_gesture(&self) -> Option<Gesture> {
        self.pending.map(|p| p.gesture)
    }

    /// Label suppressed at `now_ms`, if any.
    pub fn cooling_gesture(&self, now_ms: f64) -> Option<Gesture> {
        self.cooldown
            .filter(|c| now_ms < c.until_ms)
            .map(|c| c.gesture)
    }
}

// ── Tests ──────────────────────────────────────────────────
