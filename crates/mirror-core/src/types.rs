use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in source image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Integer crop rectangle clamped to image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Grow the box by `margin` (fraction of its size) on every side and clamp
    /// it to a `max_w` × `max_h` image.
    ///
    /// Returns `None` if the clamped region is empty.
    pub fn expand_within(&self, margin: f32, max_w: u32, max_h: u32) -> Option<CropRect> {
        let dx = self.width * margin;
        let dy = self.height * margin;

        let x0 = (self.x - dx).floor().clamp(0.0, max_w as f32) as u32;
        let y0 = (self.y - dy).floor().clamp(0.0, max_h as f32) as u32;
        let x1 = (self.x + self.width + dx).ceil().clamp(0.0, max_w as f32) as u32;
        let y1 = (self.y + self.height + dy).ceil().clamp(0.0, max_h as f32) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(CropRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}
