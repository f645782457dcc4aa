//! Region detection over ID card photos.

mod yolo;

pub use yolo::YoloDetector;

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Axis-aligned detection rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box width in pixels.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Box height in pixels.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.width() * self.height() + other.width() * other.height() - inter;

        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Integer pixel rectangle clamped to the given image dimensions.
    ///
    /// Returns (x, y, width, height) with width and height at least 1.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let x1 = (self.x1.max(0.0) as u32).min(image_width.saturating_sub(1));
        let y1 = (self.y1.max(0.0) as u32).min(image_height.saturating_sub(1));
        let x2 = (self.x2.max(0.0) as u32).min(image_width);
        let y2 = (self.y2.max(0.0) as u32).min(image_height);

        let w = x2.saturating_sub(x1).max(1);
        let h = y2.saturating_sub(y1).max(1);
        (x1, y1, w, h)
    }
}

/// A single detector hit: labelled box with a confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Class label as the detector emits it.
    pub label: String,

    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Axis-aligned box in the coordinates of the image that was scanned.
    pub bbox: BBox,
}

/// Capability interface for the region detector.
///
/// The rotation search, the cardinal-orientation vote and the field
/// extraction all consume the same contract; deterministic stand-ins can be
/// substituted in tests.
pub trait ObjectDetector: Send + Sync {
    /// Detect labelled regions with confidence at or above `confidence_floor`.
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_floor: f32,
    ) -> Result<Vec<Detection>, DetectError>;
}

/// Crop the region covered by a detection box out of an image.
pub fn crop_box(image: &DynamicImage, bbox: &BBox) -> DynamicImage {
    let (x, y, w, h) = bbox.to_pixel_rect(image.width(), image.height());
    image.crop_imm(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_disjoint_and_identical() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_rect_clamps_to_image() {
        let b = BBox::new(-5.0, 3.0, 700.0, 12.0);
        let (x, y, w, h) = b.to_pixel_rect(640, 640);
        assert_eq!((x, y), (0, 3));
        assert_eq!(w, 640);
        assert_eq!(h, 9);
    }

    #[test]
    fn test_pixel_rect_never_degenerates() {
        let b = BBox::new(10.0, 10.0, 10.0, 10.0);
        let (_, _, w, h) = b.to_pixel_rect(640, 640);
        assert!(w >= 1 && h >= 1);
    }
}
