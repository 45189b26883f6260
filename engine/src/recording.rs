//! JSON-lines recordings of detector output and audio blocks.
//!
//! One JSON object per line:
//!
//! ```text
//! {"t_ms": 0.0, "hands": [{"landmarks": [[x, y, z], ...], "label": "Right", "score": 0.97}]}
//! {"t_ms": 16.0, "audio": [0.01, -0.02, ...]}
//! ```
//!
//! A line may carry both; its audio block is replayed first. Blank lines
//! and lines starting with `#` are skipped.

use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::audio::TransientDetector;
use crate::engine::GestureEngine;
use crate::gesture::GestureEvent;
use crate::hand::{Frame, RawFrame, RawHand};

#[derive(Debug, Deserialize)]
struct Record {
    t_ms: f64,
    #[serde(default)]
    hands: Option<Vec<RawHand>>,
    #[serde(default)]
    audio: Option<Vec<f32>>,
}

/// One replayable input.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Frame(Frame),
    Audio { t_ms: f64, samples: Vec<f32> },
}

impl Entry {
    pub fn timestamp_ms(&self) -> f64 {
        match self {
            Self::Frame(frame) => frame.timestamp_ms,
            Self::Audio { t_ms, .. } => *t_ms,
        }
    }
}

/// Parse one line. Blank and comment lines yield no entries.
pub fn parse_line(line: &str) -> anyhow::Result<Vec<Entry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }
    let record: Record = serde_json::from_str(line)?;
    let mut entries = Vec::with_capacity(2);
    let audio_only = record.hands.is_none() && record.audio.is_some();
    if let Some(samples) = record.audio {
        entries.push(Entry::Audio {
            t_ms: record.t_ms,
            samples,
        });
    }
    if !audio_only {
        entries.push(Entry::Frame(Frame::from_raw(RawFrame {
            t_ms: record.t_ms,
            hands: record.hands.unwrap_or_default(),
        })));
    }
    Ok(entries)
}

pub fn read_recording<R: BufRead>(reader: R) -> anyhow::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", n + 1))?;
        let parsed = parse_line(&line).with_context(|| format!("line {}", n + 1))?;
        entries.extend(parsed);
    }
    debug!(entries = entries.len(), "recording parsed");
    Ok(entries)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening recording {}", path.display()))?;
    read_recording(std::io::BufReader::new(file))
        .with_context(|| format!("parsing recording {}", path.display()))
}

/// Feed `entries` through the engine in order. Audio blocks go to
/// `detector` when one is given and are skipped otherwise.
pub fn replay(
    entries: &[Entry],
    engine: &mut GestureEngine,
    mut detector: Option<&mut TransientDetector>,
) -> Vec<GestureEvent> {
    let mut events = Vec::new();
    for entry in entries {
        match entry {
            Entry::Audio { t_ms, samples } => {
                if let Some(detector) = detector.as_deref_mut() {
                    detector.process(*t_ms, samples);
                }
            }
            Entry::Frame(frame) => events.extend(engine.process_frame(frame)),
        }
    }
    events
}
