//! Emotion classification: face detection followed by FER+ emotion scoring.
//!
//! The FER+ model takes a 64x64 grayscale face crop as raw pixel values and
//! returns eight logits. They are softmaxed and mapped onto [`EmotionLabel`].

use crate::detector::{DetectorError, FaceDetector};
use crate::emotion::{EmotionLabel, EmotionScores};
use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::{GrayImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

const FERPLUS_INPUT_SIZE: u32 = 64;
const FERPLUS_CLASSES: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];
/// Fraction of the face box added on each side before cropping.
const FACE_MARGIN: f32 = 0.1;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0} — download emotion-ferplus-8.onnx and place it in the model directory")]
    ModelNotFound(String),
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("face could not be detected in the image")]
    NoFaceDetected,
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// How to treat images in which no face is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Fail with [`ClassifierError::NoFaceDetected`].
    Enforce,
    /// Classify the whole frame instead.
    BestEffort,
}

/// Classifier output for one image.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionAnalysis {
    pub scores: EmotionScores,
    pub dominant: EmotionLabel,
    /// Face region used for classification, if one was found.
    pub face: Option<BoundingBox>,
}

/// Strategy for classifying the emotion shown in an image file.
pub trait EmotionClassifier {
    fn analyze(
        &mut self,
        image_path: &Path,
        detection: Detection,
    ) -> Result<EmotionAnalysis, ClassifierError>;
}

/// UltraFace + FER+ classifier running on ONNX Runtime.
pub struct OnnxEmotionClassifier {
    detector: FaceDetector,
    session: Session,
}

impl OnnxEmotionClassifier {
    /// Load the face detector and the FER+ emotion model.
    pub fn load(detector_path: &Path, emotion_path: &Path) -> Result<Self, ClassifierError> {
        let detector = FaceDetector::load(detector_path)?;

        if !emotion_path.exists() {
            return Err(ClassifierError::ModelNotFound(
                emotion_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(emotion_path)?;

        tracing::info!(
            path = %emotion_path.display(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded FER+ model"
        );

        Ok(Self { detector, session })
    }

    fn classify_crop(&mut self, face: &GrayImage) -> Result<EmotionScores, ClassifierError> {
        let input = preprocess(face);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("emotion logits: {e}")))?;

        scores_from_logits(logits)
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn analyze(
        &mut self,
        image_path: &Path,
        detection: Detection,
    ) -> Result<EmotionAnalysis, ClassifierError> {
        let image = image::open(image_path)
            .map_err(|source| ClassifierError::ImageRead {
                path: image_path.display().to_string(),
                source,
            })?
            .to_rgb8();

        let face = self.detector.detect(&image)?.into_iter().next();
        if face.is_none() {
            match detection {
                Detection::Enforce => return Err(ClassifierError::NoFaceDetected),
                Detection::BestEffort => {
                    tracing::debug!("no face found; classifying the whole frame");
                }
            }
        }

        let crop = crop_face(&image, face.as_ref());
        let scores = self.classify_crop(&crop)?;
        let dominant = scores
            .dominant()
            .cloned()
            .ok_or_else(|| ClassifierError::InferenceFailed("no usable emotion scores".into()))?;

        tracing::debug!(
            emotion = %dominant,
            face_confidence = face.as_ref().map(|f| f.confidence),
            "emotion classified"
        );

        Ok(EmotionAnalysis {
            scores,
            dominant,
            face,
        })
    }
}

/// Grayscale crop of the face region (with margin), or the whole frame.
fn crop_face(image: &RgbImage, face: Option<&BoundingBox>) -> GrayImage {
    let region = face.and_then(|f| f.expand_within(FACE_MARGIN, image.width(), image.height()));
    match region {
        Some(r) => {
            let crop = image::imageops::crop_imm(image, r.x, r.y, r.width, r.height).to_image();
            image::imageops::grayscale(&crop)
        }
        None => image::imageops::grayscale(image),
    }
}

/// Resize to 64x64 and lay out as a 1x1x64x64 tensor of raw pixel values.
fn preprocess(face: &GrayImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        face,
        FERPLUS_INPUT_SIZE,
        FERPLUS_INPUT_SIZE,
        FilterType::Triangle,
    );
    let size = FERPLUS_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 1, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32;
    }
    tensor
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Map a FER+ class name onto the lexicon's label vocabulary.
fn ferplus_label(class: &str) -> EmotionLabel {
    match class {
        "happiness" => EmotionLabel::Happy,
        "sadness" => EmotionLabel::Sad,
        "anger" => EmotionLabel::Angry,
        other => EmotionLabel::parse(other),
    }
}

fn scores_from_logits(logits: &[f32]) -> Result<EmotionScores, ClassifierError> {
    if logits.len() != FERPLUS_CLASSES.len() {
        return Err(ClassifierError::InferenceFailed(format!(
            "expected {} emotion logits, got {}",
            FERPLUS_CLASSES.len(),
            logits.len()
        )));
    }
    let probs = softmax(logits);
    Ok(EmotionScores::new(
        FERPLUS_CLASSES
            .iter()
            .zip(probs)
            .map(|(class, p)| (ferplus_label(class), p))
            .collect(),
    ))
}
