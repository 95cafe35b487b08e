//! Capture → classify → log pipeline.
//!
//! One call to [`Pipeline::run`] is one user-triggered run: countdown,
//! acquire a single frame, persist it, classify it, resolve the mood entry,
//! render it and append a log record. Every failure ends up in a single
//! error boundary that reports to the presenter; nothing is retried or
//! rolled back.

use crate::classifier::{ClassifierError, Detection, EmotionClassifier};
use crate::emotion::EmotionLabel;
use crate::lexicon::{self, MoodEntry};
use crate::log_store::{LogError, LogRecord, LogStore};
use crate::present::{Presenter, UiEvent};
use image::RgbImage;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Number of countdown steps shown before capture.
pub const COUNTDOWN_STEPS: u32 = 3;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("cannot open camera: {0}")]
    Open(String),
    #[error("no frame returned: {0}")]
    NoFrame(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("failed to write {path}: {source}")]
    PersistFrame {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Log(#[from] LogError),
}

impl PipelineError {
    /// Text shown to the user when a run fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Capture(e) => format!("❌ Camera unavailable: {e}"),
            other => format!("❌ Error: {other}"),
        }
    }
}

/// Source of a single still frame. Implementations acquire and release
/// their device within each call.
pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbImage, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running,
}

/// Paths and pacing, fixed for the life of a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub capture_path: PathBuf,
    pub log_path: PathBuf,
    pub countdown_tick: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct MoodReading {
    pub label: EmotionLabel,
    pub entry: MoodEntry,
    pub record: LogRecord,
    pub image_path: PathBuf,
    pub face_found: bool,
}

pub struct Pipeline<S, C> {
    source: S,
    classifier: C,
    log: LogStore,
    capture_path: PathBuf,
    countdown_tick: Duration,
}

impl<S: FrameSource, C: EmotionClassifier> Pipeline<S, C> {
    pub fn new(source: S, classifier: C, settings: PipelineSettings) -> Self {
        Self {
            source,
            classifier,
            log: LogStore::new(settings.log_path),
            capture_path: settings.capture_path,
            countdown_tick: settings.countdown_tick,
        }
    }

    pub fn log_store(&self) -> &LogStore {
        &self.log
    }

    /// Run the pipeline once. Errors are reported to `presenter` as a single
    /// error event and also returned to the caller.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> Result<MoodReading, PipelineError> {
        let span = tracing::info_span!("capture_run", run_id = %Uuid::new_v4());
        let _enter = span.enter();

        let result = self.run_steps(presenter);
        match &result {
            Ok(reading) => tracing::info!(
                emotion = %reading.label,
                face_found = reading.face_found,
                "run complete"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "run failed");
                presenter.emit(UiEvent::error(e.user_message()));
            }
        }
        result
    }

    fn run_steps(&mut self, presenter: &mut dyn Presenter) -> Result<MoodReading, PipelineError> {
        self.countdown(presenter);

        let frame = self.source.capture()?;
        tracing::debug!(width = frame.width(), height = frame.height(), "frame acquired");

        frame
            .save_with_format(&self.capture_path, image::ImageFormat::Jpeg)
            .map_err(|source| PipelineError::PersistFrame {
                path: self.capture_path.display().to_string(),
                source,
            })?;
        presenter.emit(UiEvent::success("📸 Image captured!"));
        presenter.emit(UiEvent::Image {
            path: self.capture_path.clone(),
            caption: "Captured Image".to_string(),
        });

        let analysis = self
            .classifier
            .analyze(&self.capture_path, Detection::BestEffort)?;
        let label = analysis.dominant;
        let entry = lexicon::lookup(label.as_str());
        presenter.emit(UiEvent::mood(&label, entry));

        let record = LogRecord::now(&label);
        self.log.append(&record)?;

        Ok(MoodReading {
            label,
            entry,
            record,
            image_path: self.capture_path.clone(),
            face_found: analysis.face.is_some(),
        })
    }

    fn countdown(&self, presenter: &mut dyn Presenter) {
        presenter.emit(UiEvent::info(format!(
            "Get ready! Capturing in {COUNTDOWN_STEPS} seconds..."
        )));
        for i in (1..=COUNTDOWN_STEPS).rev() {
            presenter.emit(UiEvent::status(format!("⏳ Capturing in {i}...")));
            if !self.countdown_tick.is_zero() {
                std::thread::sleep(self.countdown_tick);
            }
        }
    }
}
