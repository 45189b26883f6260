//! Engine configuration: debounce timing and per-rule thresholds.
//!
//! All values are start-up constants. Defaults live in the `Default`
//! impls; a TOML file may override any subset of them.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Maximum number of hands considered per frame.
pub const MAX_HANDS: usize = 2;

// ── Debounce ───────────────────────────────────────────────

/// Stability and suppression windows for the confirmation state machine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// How long a candidate must persist before it is emitted (ms).
    pub stability_ms: f64,
    /// How long the emitted label is suppressed afterwards (ms).
    pub cooldown_ms: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            stability_ms: 200.0,
            cooldown_ms: 1900.0,
        }
    }
}

// ── Single hand ────────────────────────────────────────────

/// Thresholds for the static single-hand rules.
///
/// Shape metrics (`fist_*`, `victory_min_spread`) are normalized by the
/// index-to-pinky knuckle span.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SingleHandConfig {
    /// Slack for the vertical extension test.
    pub extension_tolerance: f32,
    /// Slack for the "tip at or below proximal joint" curl test.
    pub curl_margin: f32,
    /// Curled digits (of 5) required for a fist.
    pub fist_min_curled: usize,
    /// Max normalized mean tip-to-palm distance for a fist.
    pub fist_compactness: f32,
    /// Max normalized tip-to-tip spread for a fist.
    pub fist_spread: f32,
    /// Margin a non-index finger must clear to spoil a pointing hand.
    pub pointing_relaxed_tolerance: f32,
    /// Index length (knuckle to tip) relative to wrist-to-knuckle, lower bound.
    pub index_length_min: f32,
    /// Index length relative to wrist-to-knuckle, upper bound.
    pub index_length_max: f32,
    /// Tip-to-pip over base-to-pip ratio for a straight finger.
    pub victory_segment_ratio: f32,
    /// Minimum normalized distance between the V fingertips.
    pub victory_min_spread: f32,
    pub victory_min_angle_deg: f32,
    pub victory_max_angle_deg: f32,
    /// Palm normal z below which an open hand is a backhand.
    pub backhand_normal_z: f32,
    /// Vertical line splitting the frame into left and right halves.
    pub frame_midline_x: f32,
    /// Extended digits needed for the static wave fallback.
    pub wave_min_extended: usize,
}

impl Default for SingleHandConfig {
    fn default() -> Self {
        Self {
            extension_tolerance: 0.0,
            curl_margin: 0.01,
            fist_min_curled: 4,
            fist_compactness: 0.6,
            fist_spread: 0.45,
            pointing_relaxed_tolerance: 0.02,
            index_length_min: 0.25,
            index_length_max: 1.6,
            victory_segment_ratio: 0.98,
            victory_min_spread: 0.3,
            victory_min_angle_deg: 45.0,
            victory_max_angle_deg: 125.0,
            backhand_normal_z: -0.5,
            frame_midline_x: 0.5,
            wave_min_extended: 4,
        }
    }
}

// ── Two hands ──────────────────────────────────────────────

/// Thresholds for the relational two-hand rules, in landmark units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TwoHandConfig {
    pub namaste_palm_distance: f32,
    pub namaste_wrist_distance: f32,
    /// Max distance between any pair of corresponding fingertips.
    pub namaste_tip_distance: f32,
    /// Palm normals must have a dot product below this.
    pub namaste_max_normal_dot: f32,
    /// Also require the pinky-only digit pattern on both hands.
    pub namaste_pinky_pattern: bool,
    /// Palm centers closer than this count as contact.
    pub clap_distance: f32,
    /// Required drop in palm distance over the lookback.
    pub clap_closing_delta: f32,
    /// Frames to look back when measuring closure.
    pub clap_lookback_frames: usize,
    /// Require observed rapid closure, not just contact.
    pub clap_require_closure: bool,
    /// Horizontal margin for the crossing test.
    pub cross_margin: f32,
    /// How far above its middle knuckle each wrist must be.
    pub raise_margin: f32,
}

impl Default for TwoHandConfig {
    fn default() -> Self {
        Self {
            namaste_palm_distance: 0.10,
            namaste_wrist_distance: 0.12,
            namaste_tip_distance: 0.10,
            namaste_max_normal_dot: -0.2,
            namaste_pinky_pattern: false,
            clap_distance: 0.12,
            clap_closing_delta: 0.12,
            clap_lookback_frames: 5,
            clap_require_closure: true,
            cross_margin: 0.02,
            raise_margin: 0.02,
        }
    }
}

// ── Temporal ───────────────────────────────────────────────

/// History depth and motion thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Samples kept per hand label.
    pub history_len: usize,
    /// Horizontal direction reversals that make a wave.
    pub wave_min_reversals: usize,
    /// Minimum peak-to-peak wrist x for a wave.
    pub wave_min_amplitude: f32,
    /// Per-step motion ignored when counting reversals.
    pub wave_jitter: f32,
    /// Consecutive samples the wrist must stay high.
    pub raise_frames: usize,
    /// Wrist y below which the hand counts as raised.
    pub raise_max_wrist_y: f32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            history_len: 30,
            wave_min_reversals: 2,
            wave_min_amplitude: 0.1,
            wave_jitter: 0.005,
            raise_frames: 6,
            raise_max_wrist_y: 0.35,
        }
    }
}

// ── Audio ──────────────────────────────────────────────────

/// Transient detector and corroboration window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Attach the transient source when one is available.
    pub enabled: bool,
    /// Absolute sample peak that counts as a transient.
    pub peak_threshold: f32,
    /// Minimum spacing between reported transients (ms).
    pub refractory_ms: f64,
    /// A transient within this distance of the visual closure corroborates it (ms).
    pub corroboration_window_ms: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            peak_threshold: 0.6,
            refractory_ms: 150.0,
            corroboration_window_ms: 800.0,
        }
    }
}

// ── Engine ─────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable gesture recognition.
    pub enabled: bool,
    /// Minimum detector score for a hand to be classified.
    pub min_hand_score: f32,
    pub debounce: DebounceConfig,
    pub single_hand: SingleHandConfig,
    pub two_hand: TwoHandConfig,
    pub temporal: TemporalConfig,
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_hand_score: 0.5,
            debounce: DebounceConfig::default(),
            single_hand: SingleHandConfig::default(),
            two_hand: TwoHandConfig::default(),
            temporal: TemporalConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("invalid engine config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.debounce.stability_ms >= 0.0 && self.debounce.cooldown_ms >= 0.0,
            "debounce windows must be non-negative"
        );
        anyhow::ensure!(
            self.temporal.history_len >= self.temporal.raise_frames.max(2),
            "temporal.history_len must cover raise_frames"
        );
        anyhow::ensure!(
            self.two_hand.clap_lookback_frames >= 1,
            "two_hand.clap_lookback_frames must be at least 1"
        );
        Ok(())
    }

    /// Generate s-expression describing the active configuration.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:enabled {} :min-hand-score {:.2} :max-hands {} :stability-ms {:.0} :cooldown-ms {:.0} :fist-compactness {:.2} :fist-spread {:.2} :curl-margin {:.3} :clap-distance {:.3} :clap-closing-delta {:.3} :audio {} :corroboration-window-ms {:.0} :history-len {})",
            if self.enabled { "t" } else { "nil" },
            self.min_hand_score,
            MAX_HANDS,
            self.debounce.stability_ms,
            self.debounce.cooldown_ms,
            self.single_hand.fist_compactness,
            self.single_hand.fist_spread,
            self.single_hand.curl_margin,
            self.two_hand.clap_distance,
            self.two_hand.clap_closing_delta,
            if self.audio.enabled { "t" } else { "nil" },
            self.audio.corroboration_window_ms,
            self.temporal.history_len,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
