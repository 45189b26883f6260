//! Gesture engine: rule-based hand gesture recognition.
//!
//! Consumes frames of 21-point hand landmarks from an external detector,
//! classifies single- and two-hand gestures with ordered geometric rules,
//! upgrades them with short motion history, and confirms them through a
//! stability/cooldown state machine before emitting events.

pub mod audio;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod frame_slot;
pub mod geometry;
pub mod gesture;
pub mod hand;
pub mod history;
pub mod recording;
pub mod single_hand;
pub mod two_hand;

#[cfg(test)]
mod fixtures;

pub use audio::{spawn_sampler, SampleSource, TransientCell, TransientDetector};
pub use config::EngineConfig;
pub use debounce::{DebouncePhase, DebounceState};
pub use engine::{EngineStats, GestureEngine};
pub use frame_slot::LatestFrame;
pub use gesture::{Gesture, GestureCandidate, GestureEvent};
pub use hand::{Frame, FrameError, HandObservation, Handedness, Landmark, RawFrame, RawHand};
