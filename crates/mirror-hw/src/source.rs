//! Camera-backed frame source for the capture pipeline.

use crate::camera::{Camera, CameraError};
use image::RgbImage;
use mirror_core::pipeline::{CaptureError, FrameSource};

/// Opens the camera, reads one frame and releases the device on every call.
/// The device is never held between runs.
pub struct CameraSource {
    device_path: String,
}

impl CameraSource {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<RgbImage, CaptureError> {
        let frame = {
            let camera = Camera::open(&self.device_path).map_err(open_error)?;
            camera
                .capture_frame()
                .map_err(|e| CaptureError::NoFrame(e.to_string()))?
        };
        tracing::debug!(device = %self.device_path, "camera released");

        if frame.is_dark {
            tracing::warn!(
                device = %self.device_path,
                brightness = frame.avg_brightness(),
                "captured frame is mostly dark"
            );
        }

        frame.into_rgb_image().ok_or_else(|| {
            CaptureError::NoFrame("frame data does not match its dimensions".to_string())
        })
    }
}

fn open_error(e: CameraError) -> CaptureError {
    CaptureError::Open(e.to_string())
}
