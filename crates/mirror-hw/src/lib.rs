//! mirror-hw — Hardware abstraction for webcam capture.
//!
//! Provides V4L2-based camera access, RGB frame conversion and a
//! [`CameraSource`] that plugs the camera into the capture pipeline.

pub mod camera;
pub mod frame;
pub mod source;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use frame::Frame;
pub use source::CameraSource;
