//! Latest-frame mailbox between the detector callback and the engine.
//!
//! Classification is a snapshot operation, so a producer that outruns the
//! consumer overwrites the unread frame instead of queueing it.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::hand::Frame;

/// Single-slot mailbox holding only the most recent frame.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Frame>>,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame`, replacing any frame not yet taken.
    pub fn publish(&self, frame: Frame) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let stale = self.slot.lock().replace(frame);
        if let Some(stale) = stale {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(t_ms = stale.timestamp_ms, "dropping stale frame");
        }
    }

    /// Take the pending frame, leaving the slot empty.
    pub fn take(&self) -> Option<Frame> {
        self.slot.lock().take()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Frames overwritten before the consumer got to them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
