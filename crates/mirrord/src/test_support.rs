//! Camera and classifier stand-ins shared by the daemon's tests.

use image::RgbImage;
use mirror_core::classifier::{ClassifierError, Detection, EmotionAnalysis};
use mirror_core::pipeline::CaptureError;
use mirror_core::{EmotionClassifier, EmotionLabel, EmotionScores, FrameSource, PipelineSettings};
use std::path::Path;
use std::time::Duration;

pub struct StillSource;

impl FrameSource for StillSource {
    fn capture(&mut self) -> Result<RgbImage, CaptureError> {
        Ok(RgbImage::from_pixel(16, 16, image::Rgb([200, 180, 160])))
    }
}

pub struct FixedClassifier(pub &'static str);

impl EmotionClassifier for FixedClassifier {
    fn analyze(
        &mut self,
        _image_path: &Path,
        _detection: Detection,
    ) -> Result<EmotionAnalysis, ClassifierError> {
        let dominant = EmotionLabel::parse(self.0);
        Ok(EmotionAnalysis {
            scores: EmotionScores::new(vec![(dominant.clone(), 1.0)]),
            dominant,
            face: None,
        })
    }
}

/// Settings rooted in `dir` with no countdown delay.
pub fn settings_in(dir: &Path) -> PipelineSettings {
    PipelineSettings {
        capture_path: dir.join("captured.jpg"),
        log_path: dir.join("emotion_log.csv"),
        countdown_tick: Duration::ZERO,
    }
}
