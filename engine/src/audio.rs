//! Auxiliary transient source used to corroborate claps.
//!
//! A `TransientDetector` scans blocks of samples for peaks above a
//! threshold and writes the time of the last hit into a `TransientCell`.
//! The cell is a single atomic shared with the engine, which reads it
//! without blocking. A stale read can only cost a corroboration.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::two_hand::Corroboration;

/// All-ones NaN payload; marks an empty cell.
const EMPTY: u64 = u64::MAX;

// ── Shared cell ────────────────────────────────────────────

/// Last transient timestamp, shared between the sampler and the engine.
#[derive(Debug, Clone)]
pub struct TransientCell {
    bits: Arc<AtomicU64>,
}

impl Default for TransientCell {
    fn default() -> Self {
        Self::new()
    }
}

impl TransientCell {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(EMPTY)),
        }
    }

    pub fn record(&self, timestamp_ms: f64) {
        self.bits.store(timestamp_ms.to_bits(), Ordering::Release);
    }

    pub fn last(&self) -> Option<f64> {
        match self.bits.load(Ordering::Acquire) {
            EMPTY => None,
            bits => Some(f64::from_bits(bits)),
        }
    }

    pub fn clear(&self) {
        self.bits.store(EMPTY, Ordering::Release);
    }

    /// Whether a transient was recorded within `window_ms` of `now_ms`.
    pub fn corroborates(&self, now_ms: f64, window_ms: f64) -> bool {
        self.last()
            .is_some_and(|t| (now_ms - t).abs() <= window_ms)
    }
}

/// Corroboration state for a frame at `now_ms`.
pub fn corroboration(cell: Option<&TransientCell>, now_ms: f64, window_ms: f64) -> Corroboration {
    match cell {
        None => Corroboration::Unavailable,
        Some(cell) if cell.corroborates(now_ms, window_ms) => Corroboration::Observed,
        Some(_) => Corroboration::Missing,
    }
}

// ── Detector ───────────────────────────────────────────────

/// Peak-amplitude transient detector with a refractory period.
#[derive(Debug, Clone)]
pub struct TransientDetector {
    pub peak_threshold: f32,
    pub refractory_ms: f64,
    cell: TransientCell,
    last_hit_ms: Option<f64>,
    hits: u64,
}

impl TransientDetector {
    pub fn new(config: &AudioConfig, cell: TransientCell) -> Self {
        Self {
            peak_threshold: config.peak_threshold,
            refractory_ms: config.refractory_ms,
            cell,
            last_hit_ms: None,
            hits: 0,
        }
    }

    pub fn cell(&self) -> &TransientCell {
        &self.cell
    }

    /// Transients reported so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Scan one block captured at `timestamp_ms`. Returns true when a new
    /// transient was recorded.
    pub fn process(&mut self, timestamp_ms: f64, samples: &[f32]) -> bool {
        let peak = samples
            .iter()
            .filter(|s| s.is_finite())
            .fold(0.0f32, |m, s| m.max(s.abs()));
        if peak < self.peak_threshold {
            return false;
        }
        if self
            .last_hit_ms
            .is_some_and(|last| timestamp_ms - last < self.refractory_ms)
        {
            return false;
        }
        debug!(peak, t_ms = timestamp_ms, "audio transient");
        self.last_hit_ms = Some(timestamp_ms);
        self.hits += 1;
        self.cell.record(timestamp_ms);
        true
    }
}

// ── Sampling thread ────────────────────────────────────────

/// A stream of timestamped sample blocks.
pub trait SampleSource: Send + 'static {
    /// Next block, or `None` when the stream has ended.
    fn next_block(&mut self) -> Option<(f64, Vec<f32>)>;
}

impl SampleSource for std::vec::IntoIter<(f64, Vec<f32>)> {
    fn next_block(&mut self) -> Option<(f64, Vec<f32>)> {
        self.next()
    }
}

/// Run `detector` over `source` on a dedicated thread until the source
/// ends or `stop` is raised. The handle yields the number of transients.
pub fn spawn_sampler<S: SampleSource>(
    mut source: S,
    mut detector: TransientDetector,
    stop: Arc<AtomicBool>,
) -> std::io::Result<thread::JoinHandle<u64>> {
    thread::Builder::new()
        .name("transient-sampler".into())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let Some((t_ms, block)) = source.next_block() else {
                    break;
                };
                detector.process(t_ms, &block);
            }
            info!(hits = detector.hits(), "transient sampler stopped");
            detector.hits()
        })
}

// ── Tests ──────────────────────────────────────────────────
