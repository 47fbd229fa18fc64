//! SignStream session tool - Main Entry Point
//!
//! Inspects saved session recordings and replays them in real time,
//! logging every dispatched event.
//!
//! Usage:
//!     signstream inspect keynote.json
//!     signstream markers keynote.json
//!     signstream replay keynote.json --speed 2 --from-marker "q&a"

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use signstream_session::{
    clock::{QueuedTickScheduler, SystemClock},
    config::SessionConfig,
    session::{PlaybackHandler, PlaybackProgress, PlaybackState, SessionPlayer, SessionRecording},
    types::{Sign, TranscriptSegment},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "signstream")]
#[command(about = "Inspect and replay recorded interpretation sessions")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print metadata and statistics of a recording
    Inspect {
        /// Recording file (JSON)
        file: PathBuf,
    },

    /// List the markers of a recording
    Markers {
        /// Recording file (JSON)
        file: PathBuf,
    },

    /// Replay a recording, logging each event as it is dispatched
    Replay {
        /// Recording file (JSON)
        file: PathBuf,

        /// Playback speed multiplier (0.25 to 4)
        #[arg(short, long)]
        speed: Option<f64>,

        /// Start at the first marker with this label
        #[arg(long)]
        from_marker: Option<String>,

        /// Player settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,signstream_session=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Inspect { file } => inspect(&file),
        Command::Markers { file } => list_markers(&file),
        Command::Replay {
            file,
            speed,
            from_marker,
            config,
        } => replay(&file, speed, from_marker.as_deref(), config.as_deref()),
    }
}

fn load(path: &Path) -> anyhow::Result<SessionRecording> {
    SessionRecording::load_from_file(path)
        .with_context(|| format!("Could not open recording {}", path.display()))
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let recording = load(path)?;
    let metadata = &recording.metadata;
    let stats = &metadata.stats;

    println!("Session:      {} ({})", metadata.name, metadata.id);
    if let Some(event_name) = &metadata.event_name {
        println!("Event:        {}", event_name);
    }
    if let Some(venue) = &metadata.venue {
        println!("Venue:        {}", venue);
    }
    println!("Language:     {}", metadata.language);
    println!("Version:      {}", metadata.version);
    println!("Duration:     {}", format_time(recording.duration()));
    println!("Events:       {}", recording.event_count());
    println!();
    println!("Words:        {}", stats.total_words);
    println!("Signs:        {}", stats.total_signs);
    println!("Errors:       {}", stats.total_errors);
    println!("Transcripts:  {}", stats.transcription_count);
    println!("Avg latency:  {:.1} ms", stats.average_latency);
    println!("Peak latency: {} ms", stats.peak_latency);
    println!();
    println!(
        "Stats match events: {}",
        if recording.stats_consistent() { "yes" } else { "no" }
    );
    if !recording.is_ordered() {
        println!("Warning: event timestamps are out of order");
    }

    Ok(())
}

fn list_markers(path: &Path) -> anyhow::Result<()> {
    let recording = load(path)?;
    let markers = recording.markers();
    if markers.is_empty() {
        println!("No markers");
        return Ok(());
    }

    for marker in markers {
        match marker.notes {
            Some(notes) => println!(
                "{}  {}  ({})",
                format_time(marker.timestamp),
                marker.label,
                notes
            ),
            None => println!("{}  {}", format_time(marker.timestamp), marker.label),
        }
    }
    Ok(())
}

fn replay(
    path: &Path,
    speed: Option<f64>,
    from_marker: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(p) => SessionConfig::load(p)?,
        None => SessionConfig::default(),
    };
    let recording = load(path)?;
    let interval = Duration::from_millis(config.player.tick_interval_ms.max(1));

    let host = QueuedTickScheduler::new();
    let mut player = SessionPlayer::with_config(config.player, SystemClock::new(), host.clone());
    player.set_handler(LogHandler::default());
    player.load(recording);

    if let Some(speed) = speed {
        player.set_speed(speed);
    }
    if let Some(label) = from_marker {
        if !player.seek_to_marker(label) {
            bail!("No marker labelled {:?}", label);
        }
    }

    tracing::info!(
        "Replaying {} at {}x from {}",
        path.display(),
        player.speed(),
        format_time(player.current_time() as u64)
    );
    player.play();

    while host.take_due() {
        std::thread::sleep(interval);
        player.tick();
    }

    tracing::info!("Replay finished");
    Ok(())
}

/// Logs replayed events
#[derive(Default)]
struct LogHandler {
    last_second: u64,
}

impl PlaybackHandler for LogHandler {
    fn on_transcription(&mut self, segment: &TranscriptSegment) {
        let kind = if segment.is_final { "final" } else { "partial" };
        tracing::info!("[caption/{}] {}", kind, segment.text);
    }

    fn on_translation(&mut self, signs: &[Sign], source_text: &str) {
        let glosses: Vec<&str> = signs.iter().map(|s| s.gloss.as_str()).collect();
        tracing::info!("[translation] {:?} -> {}", source_text, glosses.join(" "));
    }

    fn on_sign_start(&mut self, sign: &Sign, index: usize) {
        tracing::debug!("[avatar] start #{} {}", index, sign.gloss);
    }

    fn on_sign_end(&mut self, sign: &Sign, index: usize) {
        tracing::debug!("[avatar] end #{} {}", index, sign.gloss);
    }

    fn on_marker(&mut self, label: &str, notes: Option<&str>) {
        tracing::info!("[marker] {} {}", label, notes.unwrap_or(""));
    }

    fn on_error(&mut self, code: &str, message: &str) {
        tracing::warn!("[error] {}: {}", code, message);
    }

    fn on_state_change(&mut self, state: PlaybackState) {
        tracing::info!("Playback {}", state.display_name());
    }

    fn on_progress(&mut self, progress: PlaybackProgress) {
        let second = progress.current_time as u64 / 1000;
        if second != self.last_second {
            self.last_second = second;
            tracing::debug!(
                "{} / {} ({:.0}%)",
                format_time(progress.current_time as u64),
                format_time(progress.duration),
                progress.progress * 100.0
            );
        }
    }
}

/// Format milliseconds as mm:ss.mmm
fn format_time(ms: u64) -> String {
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}
