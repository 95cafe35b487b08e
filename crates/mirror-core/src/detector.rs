//! UltraFace face detector via ONNX Runtime.
//!
//! Runs the Ultra-Light-Fast-Generic-Face-Detector (RFB-320) model. The model
//! emits per-prior class scores and corner boxes already normalized to the
//! input frame, so decoding is a threshold plus NMS.

use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const ULTRAFACE_INPUT_WIDTH: u32 = 320;
const ULTRAFACE_INPUT_HEIGHT: u32 = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_CONFIDENCE_THRESHOLD: f32 = 0.7;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.3;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download version-RFB-320.onnx and place it in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// UltraFace-based face detector.
pub struct FaceDetector {
    session: Session,
    /// Output indices (scores, boxes), discovered by name at load time.
    output_indices: (usize, usize),
}

impl FaceDetector {
    /// Load the UltraFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded UltraFace model"
        );

        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "UltraFace model requires 2 outputs (scores, boxes), got {}",
                output_names.len()
            )));
        }

        let output_indices = discover_output_indices(&output_names);
        tracing::debug!(?output_indices, "UltraFace output tensor mapping");

        Ok(Self {
            session,
            output_indices,
        })
    }

    /// Detect faces in an RGB image, returning boxes sorted by confidence.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, DetectorError> {
        let input = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (scores_idx, boxes_idx) = self.output_indices;
        let (_, scores) = outputs[scores_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[boxes_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let detections = decode(
            scores,
            boxes,
            image.width(),
            image.height(),
            ULTRAFACE_CONFIDENCE_THRESHOLD,
        )?;

        let mut result = nms(detections, ULTRAFACE_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(faces = result.len(), "UltraFace detection done");
        Ok(result)
    }
}

/// Find the `scores` and `boxes` outputs by name, falling back to the
/// exported order (scores first).
fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let scores = names.iter().position(|n| n == "scores");
    let boxes = names.iter().position(|n| n == "boxes");
    match (scores, boxes) {
        (Some(s), Some(b)) => (s, b),
        _ => (0, 1),
    }
}

/// Resize to the 320x240 model input (no letterbox: boxes are normalized)
/// and normalize into a NCHW float tensor.
fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        ULTRAFACE_INPUT_WIDTH,
        ULTRAFACE_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let (w, h) = (
        ULTRAFACE_INPUT_WIDTH as usize,
        ULTRAFACE_INPUT_HEIGHT as usize,
    );
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = (pixel.0[c] as f32 - ULTRAFACE_MEAN) / ULTRAFACE_STD;
        }
    }
    tensor
}

/// Decode raw outputs into boxes in source-image pixels.
///
/// `scores` holds `[background, face]` pairs per prior; `boxes` holds
/// normalized `[x1, y1, x2, y2]` per prior.
fn decode(
    scores: &[f32],
    boxes: &[f32],
    image_width: u32,
    image_height: u32,
    threshold: f32,
) -> Result<Vec<BoundingBox>, DetectorError> {
    let priors = scores.len() / 2;
    if boxes.len() < priors * 4 {
        return Err(DetectorError::InferenceFailed(format!(
            "box tensor too short: {} values for {priors} priors",
            boxes.len()
        )));
    }

    let (w, h) = (image_width as f32, image_height as f32);
    let mut detections = Vec::new();

    for i in 0..priors {
        let confidence = scores[i * 2 + 1];
        if confidence < threshold {
            continue;
        }
        let b = &boxes[i * 4..i * 4 + 4];
        let x1 = (b[0] * w).clamp(0.0, w);
        let y1 = (b[1] * h).clamp(0.0, h);
        let x2 = (b[2] * w).clamp(0.0, w);
        let y2 = (b[3] * h).clamp(0.0, h);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }
        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence,
        });
    }

    Ok(detections)
}

/// Greedy non-maximum suppression.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<BoundingBox> = Vec::with_capacity(detections.len());
    for det in detections {
        if keep.iter().all(|k| k.iou(&det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_output_shape() {
        let image = RgbImage::from_pixel(640, 480, image::Rgb([127, 127, 127]));
        let tensor = preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 240, 320]);
        assert!(tensor[[0, 0, 10, 10]].abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_channel_order() {
        let image = RgbImage::from_pixel(320, 240, image::Rgb([255, 127, 0]));
        let tensor = preprocess(&image);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 0, 0]].abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] + 127.0 / 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_scales_to_image() {
        // Two priors: one background, one face covering the centre quarter.
        let scores = [0.9, 0.1, 0.05, 0.95];
        let boxes = [0.0, 0.0, 0.1, 0.1, 0.25, 0.25, 0.75, 0.75];
        let dets = decode(&scores, &boxes, 640, 480, 0.7).unwrap();
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert!((d.x - 160.0).abs() < 1e-3);
        assert!((d.y - 120.0).abs() < 1e-3);
        assert!((d.width - 320.0).abs() < 1e-3);
        assert!((d.height - 240.0).abs() < 1e-3);
        assert!((d.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_short_boxes() {
        let scores = [0.1, 0.9, 0.1, 0.9];
        let boxes = [0.0, 0.0, 0.5, 0.5];
        assert!(decode(&scores, &boxes, 100, 100, 0.7).is_err());
    }

    #[test]
    fn test_decode_skips_inverted_boxes() {
        let scores = [0.0, 0.99];
        let boxes = [0.6, 0.6, 0.4, 0.4];
        assert!(decode(&scores, &boxes, 100, 100, 0.7).unwrap().is_empty());
    }

    #[test]
    fn test_nms_suppresses_overlap() {
        let a = BoundingBox { x: 0.0, y: 0.0, width: 100.0, height: 100.0, confidence: 0.8 };
        let b = BoundingBox { x: 5.0, y: 5.0, width: 100.0, height: 100.0, confidence: 0.95 };
        let c = BoundingBox { x: 300.0, y: 300.0, width: 50.0, height: 50.0, confidence: 0.75 };
        let kept = nms(vec![a, b.clone(), c.clone()], 0.3);
        assert_eq!(kept, vec![b, c]);
    }

    #[test]
    fn test_discover_output_indices() {
        let named = vec!["boxes".to_string(), "scores".to_string()];
        assert_eq!(discover_output_indices(&named), (1, 0));
        let generic = vec!["460".to_string(), "461".to_string()];
        assert_eq!(discover_output_indices(&generic), (0, 1));
    }

    #[test]
    fn test_load_missing_model() {
        let result = FaceDetector::load(Path::new("/nonexistent/version-RFB-320.onnx"));
        assert!(matches!(result, Err(DetectorError::ModelNotFound(_))));
    }
}
