//! mirror-core — Emotion classification, mood lexicon and capture log.
//!
//! Uses UltraFace for face detection and FER+ for emotion classification,
//! both running via ONNX Runtime for CPU inference. The capture pipeline
//! ties a frame source, the classifier and the log store together.

pub mod classifier;
pub mod config;
pub mod detector;
pub mod emotion;
pub mod lexicon;
pub mod log_store;
pub mod pipeline;
pub mod present;
pub mod types;

pub use classifier::{Detection, EmotionAnalysis, EmotionClassifier, OnnxEmotionClassifier};
pub use config::{default_model_dir, MirrorConfig};
pub use emotion::{EmotionLabel, EmotionScores};
pub use lexicon::MoodEntry;
pub use log_store::{LogRecord, LogStore};
pub use pipeline::{FrameSource, MoodReading, Pipeline, PipelineSettings, PipelineState};
pub use present::{Presenter, Transcript, UiEvent};
pub use types::BoundingBox;
