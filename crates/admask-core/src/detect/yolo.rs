//! YOLOv8 detector for Aadhaar card field regions.

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use tracing::debug;

use admask_inference::InferenceBackend;

use crate::error::DetectError;

use super::{BBox, Detection, ObjectDetector};

/// Region detector decoding a single-scale YOLOv8 head.
pub struct YoloDetector<B: InferenceBackend> {
    backend: B,
    class_names: Vec<String>,
    input_size: u32,
    iou_threshold: f32,
}

impl<B: InferenceBackend> YoloDetector<B> {
    /// Create a new detector with the given backend and class-name table.
    pub fn new(backend: B, class_names: Vec<String>) -> Self {
        Self {
            backend,
            class_names,
            input_size: 640,
            iou_threshold: 0.45,
        }
    }

    /// Set the square model input size.
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Set the NMS IoU threshold.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Resize to the square model input and build a normalized NCHW tensor.
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = image.resize_exact(size, size, image::imageops::FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for y in 0..size {
            for x in 0..size {
                let pixel = rgb.get_pixel(x, y);
                for c in 0..3 {
                    tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                }
            }
        }

        tensor
    }

    /// Decode the raw [1, 4 + classes, anchors] head into scored boxes.
    fn decode(
        &self,
        output: &ndarray::ArrayD<f32>,
        confidence_floor: f32,
        orig_size: (u32, u32),
    ) -> Result<Vec<Detection>, DetectError> {
        let shape = output.shape();
        if shape.len() != 3 {
            return Err(DetectError::InvalidOutput(format!(
                "expected [1, attrs, anchors] output, got {:?}",
                shape
            )));
        }

        let attrs = shape[1];
        let anchors = shape[2];
        if attrs < 5 {
            return Err(DetectError::InvalidOutput(format!(
                "expected at least 5 attributes per anchor, got {}",
                attrs
            )));
        }
        let num_classes = attrs - 4;

        let scale_x = orig_size.0 as f32 / self.input_size as f32;
        let scale_y = orig_size.1 as f32 / self.input_size as f32;

        let mut candidates = Vec::new();

        for a in 0..anchors {
            // Best class for this anchor.
            let mut best_class = 0;
            let mut best_score = 0.0f32;
            for c in 0..num_classes {
                let score = output[[0, 4 + c, a]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }

            if best_score < confidence_floor {
                continue;
            }

            let cx = output[[0, 0, a]];
            let cy = output[[0, 1, a]];
            let w = output[[0, 2, a]];
            let h = output[[0, 3, a]];

            let bbox = BBox::new(
                (cx - w / 2.0) * scale_x,
                (cy - h / 2.0) * scale_y,
                (cx + w / 2.0) * scale_x,
                (cy + h / 2.0) * scale_y,
            );

            let label = self
                .class_names
                .get(best_class)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", best_class));

            candidates.push(Detection {
                label,
                confidence: best_score,
                bbox,
            });
        }

        Ok(self.non_maximum_suppression(candidates))
    }

    /// Greedy per-class non-maximum suppression.
    fn non_maximum_suppression(&self, mut candidates: Vec<Detection>) -> Vec<Detection> {
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut kept: Vec<Detection> = Vec::new();

        for candidate in candidates {
            let suppressed = kept.iter().any(|k| {
                k.label == candidate.label && k.bbox.iou(&candidate.bbox) > self.iou_threshold
            });
            if !suppressed {
                kept.push(candidate);
            }
        }

        kept
    }
}

impl<B: InferenceBackend> ObjectDetector for YoloDetector<B> {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_floor: f32,
    ) -> Result<Vec<Detection>, DetectError> {
        let tensor = self.preprocess(image);
        let input_name = self
            .backend
            .input_names()
            .first()
            .cloned()
            .unwrap_or_else(|| "images".to_string());

        let outputs = self
            .backend
            .run(&[(&input_name, tensor.into_dyn())])
            .map_err(|e| DetectError::Detection(e.to_string()))?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| DetectError::InvalidOutput("no output from model".to_string()))?
            .1;

        let detections = self.decode(&output, confidence_floor, (image.width(), image.height()))?;

        debug!(
            "Detected {} regions above confidence {:.2}",
            detections.len(),
            confidence_floor
        );

        Ok(detections)
    }
}
