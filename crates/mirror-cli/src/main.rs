use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mirror_core::{lexicon, LogStore, MirrorConfig, OnnxEmotionClassifier, Pipeline};
use mirror_core::{Presenter, UiEvent};
use mirror_hw::{Camera, CameraSource};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mirror", about = "AI Mood Mirror CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame, detect the emotion and log it
    Capture,
    /// Show the emotion log
    Log {
        /// Only show the most recent N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the mood entry for an emotion label
    Lookup {
        /// Emotion label (e.g., "happy"); omit to list the whole lexicon
        label: Option<String>,
    },
    /// List video capture devices
    Devices,
    /// Run camera diagnostics
    Test {
        /// Save the test frame as a JPEG
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Prints events as they happen, so the countdown is visible live.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn emit(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info { text } | UiEvent::Status { text } | UiEvent::Success { text } => {
                println!("{text}")
            }
            UiEvent::Image { path, caption } => println!("{caption}: {}", path.display()),
            UiEvent::Mood {
                emoji,
                label,
                message,
            } => {
                println!();
                println!("{emoji}");
                println!("🧠 Detected Emotion: {label}");
                println!("{message}");
            }
            UiEvent::Error { text } => eprintln!("{text}"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = MirrorConfig::from_env();

    match cli.command {
        Commands::Capture => capture(&config),
        Commands::Log { limit } => show_log(&config, limit),
        Commands::Lookup { label } => {
            lookup(label.as_deref());
            Ok(())
        }
        Commands::Devices => {
            list_devices();
            Ok(())
        }
        Commands::Test { output } => camera_test(&config, output),
    }
}

fn capture(config: &MirrorConfig) -> Result<()> {
    tracing::info!(
        device = %config.camera_device,
        log_path = %config.log_path.display(),
        "capture requested"
    );
    let classifier =
        OnnxEmotionClassifier::load(&config.detector_model_path(), &config.emotion_model_path())
            .context("loading emotion models")?;
    let source = CameraSource::new(config.camera_device.clone());
    let mut pipeline = Pipeline::new(source, classifier, config.pipeline_settings());

    // The run has already reported its own error; just set the exit status.
    if let Err(e) = pipeline.run(&mut ConsolePresenter) {
        tracing::debug!(error = %e, "capture failed, exiting with status 1");
        std::process::exit(1);
    }
    Ok(())
}

fn show_log(config: &MirrorConfig, limit: Option<usize>) -> Result<()> {
    let store = LogStore::new(config.log_path.clone());
    let rows = store
        .read_all()
        .with_context(|| format!("reading {}", config.log_path.display()))?;

    tracing::debug!(log_path = %config.log_path.display(), rows = rows.len(), "emotion log read");

    if rows.is_empty() {
        println!("No emotions logged yet");
        return Ok(());
    }

    let skip = tail_start(rows.len(), limit);
    println!("{:<20}  {}", "Timestamp", "Detected Emotion");
    for row in rows.iter().skip(skip) {
        println!(
            "{:<20}  {}",
            row.timestamp.format(mirror_core::log_store::TIMESTAMP_FORMAT),
            row.detected_emotion
        );
    }
    Ok(())
}

/// Index of the first row to show when only the last `limit` rows are wanted.
fn tail_start(len: usize, limit: Option<usize>) -> usize {
    limit.map_or(0, |n| len.saturating_sub(n))
}

fn lookup(label: Option<&str>) {
    match label {
        Some(label) => {
            let entry = lexicon::lookup(label);
            println!("{} {}", entry.emoji, entry.message);
        }
        None => {
            for (label, entry) in lexicon::entries() {
                println!("{label:<10} {} {}", entry.emoji, entry.message);
            }
            let fallback = lexicon::DEFAULT_ENTRY;
            println!("{:<10} {} {}", "(other)", fallback.emoji, fallback.message);
        }
    }
}

fn list_devices() {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("No video capture devices found");
        return;
    }
    for dev in devices {
        println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
    }
}

fn camera_test(config: &MirrorConfig, output: Option<PathBuf>) -> Result<()> {
    tracing::info!(device = %config.camera_device, "camera diagnostics");
    println!("Running camera diagnostics on {}...", config.camera_device);

    let camera = Camera::open(&config.camera_device)
        .with_context(|| format!("opening {}", config.camera_device))?;
    println!(
        "  format: {:?} {}x{} ({:?})",
        camera.fourcc,
        camera.width,
        camera.height,
        camera.pixel_format()
    );

    let frame = camera.capture_frame().context("capturing test frame")?;
    drop(camera);
    if frame.is_dark {
        tracing::warn!(brightness = frame.avg_brightness(), "test frame is mostly dark");
    }

    println!("  sequence: {}", frame.sequence);
    println!("  brightness: {:.1}", frame.avg_brightness());
    println!("  dark: {}", if frame.is_dark { "yes" } else { "no" });

    if let Some(path) = output {
        let image = frame
            .into_rgb_image()
            .context("frame data does not match its dimensions")?;
        image
            .save_with_format(&path, image::ImageFormat::Jpeg)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  saved: {}", path.display());
    }

    Ok(())
}
