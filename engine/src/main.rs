//! gesture-engine - replay hand-landmark recordings through the engine
//!
//! Reads a JSON-lines recording of detector frames and audio blocks and
//! prints every confirmed gesture event.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use gesture_engine::recording::{self, Entry};
use gesture_engine::{
    spawn_sampler, EngineConfig, GestureEngine, GestureEvent, LatestFrame, SampleSource,
    TransientCell, TransientDetector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Sexp,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "gesture-engine", about = "Replay hand-landmark recordings through the gesture engine")]
struct Cli {
    /// JSON-lines recording to replay
    recording: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the stability window (ms)
    #[arg(long)]
    stability_ms: Option<f64>,

    /// Override the cooldown window (ms)
    #[arg(long)]
    cooldown_ms: Option<f64>,

    /// Ignore audio blocks; claps are matched on vision alone
    #[arg(long)]
    no_audio: bool,

    /// Pace the replay by its timestamps, dropping frames the engine misses
    #[arg(long)]
    realtime: bool,

    /// Event output format
    #[arg(long, value_enum, default_value = "sexp")]
    format: OutputFormat,

    /// Print the active configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gesture_engine=debug"
    } else {
        "gesture_engine=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = cli.stability_ms {
        config.debounce.stability_ms = ms;
    }
    if let Some(ms) = cli.cooldown_ms {
        config.debounce.cooldown_ms = ms;
    }
    if cli.no_audio {
        config.audio.enabled = false;
    }

    if cli.print_config {
        println!("{}", config.to_sexp());
        return Ok(());
    }

    let Some(path) = cli.recording.as_deref() else {
        anyhow::bail!("no recording given (see --help)");
    };

    info!("gesture-engine v{} starting", env!("CARGO_PKG_VERSION"));
    let entries = recording::load(path)?;
    info!(entries = entries.len(), "loaded {}", path.display());

    let has_audio = entries.iter().any(|e| matches!(e, Entry::Audio { .. }));
    let detector = (config.audio.enabled && has_audio).then(|| {
        TransientDetector::new(&config.audio, TransientCell::new())
    });

    let mut engine = GestureEngine::new(config);
    if let Some(detector) = &detector {
        engine.attach_transients(detector.cell().clone());
    }

    let format = cli.format;
    engine.set_listener(move |event| {
        if let Err(e) = print_event(event, format) {
            warn!("failed to write event: {}", e);
        }
    });

    let last_t = entries.last().map(Entry::timestamp_ms).unwrap_or(0.0);
    if cli.realtime {
        replay_realtime(entries, &mut engine, detector)?;
    } else {
        let mut detector = detector;
        recording::replay(&entries, &mut engine, detector.as_mut());
    }

    let stats = engine.stats();
    info!(
        frames = stats.frames,
        events = stats.events,
        suppressed = stats.suppressed,
        "replay finished"
    );
    match cli.format {
        OutputFormat::Sexp => eprintln!("{}", engine.status_sexp(last_t)),
        OutputFormat::Json => eprintln!("{}", serde_json::to_string(&stats)?),
    }
    Ok(())
}

fn print_event(event: &GestureEvent, format: OutputFormat) -> anyhow::Result<()> {
    let line = match format {
        OutputFormat::Sexp => event.to_sexp(),
        OutputFormat::Json => serde_json::to_string(event)?,
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

// ── Real-time replay ───────────────────────────────────────

/// Audio blocks released on the recording's clock.
struct PacedBlocks {
    blocks: std::vec::IntoIter<(f64, Vec<f32>)>,
    start: Instant,
}

impl SampleSource for PacedBlocks {
    fn next_block(&mut self) -> Option<(f64, Vec<f32>)> {
        let (t_ms, block) = self.blocks.next()?;
        sleep_until(self.start, t_ms);
        Some((t_ms, block))
    }
}

fn sleep_until(start: Instant, t_ms: f64) {
    let due = Duration::from_secs_f64(t_ms.max(0.0) / 1000.0);
    if let Some(wait) = due.checked_sub(start.elapsed()) {
        thread::sleep(wait);
    }
}

/// Frames are published into a latest-frame slot on their own thread and
/// audio runs on the sampler thread, so a slow engine skips stale frames.
fn replay_realtime(
    entries: Vec<Entry>,
    engine: &mut GestureEngine,
    detector: Option<TransientDetector>,
) -> anyhow::Result<()> {
    let mut frames = Vec::new();
    let mut blocks = Vec::new();
    for entry in entries {
        match entry {
            Entry::Frame(frame) => frames.push(frame),
            Entry::Audio { t_ms, samples } => blocks.push((t_ms, samples)),
        }
    }

    let start = Instant::now();
    let stop = Arc::new(AtomicBool::new(false));
    let sampler = match detector {
        Some(detector) => Some(
            spawn_sampler(
                PacedBlocks {
                    blocks: blocks.into_iter(),
                    start,
                },
                detector,
                Arc::clone(&stop),
            )
            .context("spawning audio sampler")?,
        ),
        None => None,
    };

    let slot = LatestFrame::new();
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            for frame in frames {
                sleep_until(start, frame.timestamp_ms);
                slot.publish(frame);
            }
            done.store(true, Ordering::Release);
        });
        loop {
            match slot.take() {
                Some(frame) => {
                    engine.process_frame(&frame);
                }
                None if done.load(Ordering::Acquire) => {
                    // Catch a frame published just before the flag.
                    if let Some(frame) = slot.take() {
                        engine.process_frame(&frame);
                    }
                    break;
                }
                None => thread::sleep(Duration::from_millis(1)),
            }
        }
    });

    stop.store(true, Ordering::Relaxed);
    if let Some(handle) = sampler {
        if let Ok(hits) = handle.join() {
            info!(hits, "audio sampler joined");
        }
    }
    info!(
        published = slot.published(),
        dropped = slot.dropped(),
        "real-time replay finished"
    );
    Ok(())
}
