//! End-to-end redaction pipeline: rotation search, orientation-vote
//! fallback, field extraction and number masking.

pub mod fields;
pub mod patterns;
pub mod search;
pub mod vote;

#[cfg(test)]
pub(crate) mod testing;

pub use fields::{ExtractedFields, FieldRole, LABEL_REMAP};
pub use search::{SearchMatch, SearchOutcome};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use tracing::{debug, info, warn};

use admask_inference::OrtBackend;

use crate::config::AdmaskConfig;
use crate::detect::{ObjectDetector, YoloDetector};
use crate::error::{AdmaskError, Result};
use crate::geometry;
use crate::mask;
use crate::recognize::{CrnnRecognizer, TextRecognizer};

/// Wall-time breakdown of a single redaction request, in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    /// Input decode and normalization time.
    pub preprocessing_ms: u64,

    /// Rotation-search time (detector and OCR passes).
    pub detection_ms: u64,

    /// Alias of `detection_ms`, kept as a separate bucket for response
    /// compatibility.
    pub detection_total_ms: u64,

    /// Masking and field extraction time, including the whole fallback
    /// path when the rotation search found nothing.
    pub postprocessing_ms: u64,
}

/// Image handed to the pipeline, decoded or still on disk.
#[derive(Debug)]
pub enum ImageInput {
    /// An already-decoded image.
    Memory(DynamicImage),
    /// A path to an image file, decoded lazily.
    Path(PathBuf),
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Memory(image)
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl ImageInput {
    fn into_image(self) -> Result<DynamicImage> {
        match self {
            Self::Memory(image) => Ok(image),
            Self::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(AdmaskError::NoInput);
                }
                Ok(image::open(&path)?)
            }
        }
    }
}

/// Outcome of one redaction request.
#[derive(Debug)]
pub struct PipelineResult {
    /// Extracted field values plus search metadata.
    pub fields: ExtractedFields,

    /// The redacted image. On a rotation-search match this is the rotated
    /// image with the number box masked; on the fallback path it is the
    /// working-resolution image with the number crop pre-redacted.
    pub image: DynamicImage,

    /// Timing breakdown.
    pub metrics: Metrics,
}

/// The redaction service: models loaded once, shared across requests.
///
/// The detector is optional; without one every request degrades to the
/// not-detected outcome instead of failing. Once the input image decodes,
/// `redact` is total: detector and OCR failures downgrade to empty results,
/// never to errors.
pub struct ModelService<D, R> {
    detector: Option<D>,
    recognizer: R,
    config: AdmaskConfig,
    usage: AtomicU64,
}

impl<D, R> ModelService<D, R>
where
    D: ObjectDetector,
    R: TextRecognizer,
{
    /// Create a service around already-loaded models.
    pub fn new(detector: Option<D>, recognizer: R, config: AdmaskConfig) -> Self {
        Self {
            detector,
            recognizer,
            config,
            usage: AtomicU64::new(0),
        }
    }

    /// Number of redaction requests served so far.
    pub fn usage_count(&self) -> u64 {
        self.usage.load(Ordering::Relaxed)
    }

    /// The active configuration.
    pub fn config(&self) -> &AdmaskConfig {
        &self.config
    }

    /// Redact the Aadhaar number in `input`.
    ///
    /// The primary path rotates the image looking for a pattern-validated
    /// number box and masks the leading portion of it. When that finds
    /// nothing, the fallback votes on a cardinal orientation, extracts all
    /// card fields and pre-redacts the number crop instead. `thorough`
    /// enables the fine-grained second search stage.
    pub fn redact(&self, input: ImageInput, thorough: bool) -> Result<PipelineResult> {
        let request = self.usage.fetch_add(1, Ordering::Relaxed) + 1;
        let mut metrics = Metrics::default();

        let pre_start = Instant::now();
        let image = input.into_image()?;
        metrics.preprocessing_ms = pre_start.elapsed().as_millis() as u64;

        debug!(
            "Request {}: {}x{} input, thorough={}",
            request,
            image.width(),
            image.height(),
            thorough
        );

        let outcome = search::find_number_region(
            self.detector.as_ref(),
            &self.recognizer,
            &image,
            thorough,
            &self.config.detection,
        );
        metrics.detection_ms = outcome.elapsed_ms;
        metrics.detection_total_ms = outcome.elapsed_ms;

        let post_start = Instant::now();
        let (fields, redacted) = match outcome.matched {
            Some(m) => {
                let masked = mask::mask_region(&m.rotated, &m.bbox, self.config.masking.mask_ratio);
                let fields = ExtractedFields {
                    aadhar_number: Some(mask::format_masked_display(&m.raw_text)),
                    confidence: Some(m.confidence),
                    rotation_angle: Some(m.angle),
                    ..Default::default()
                };
                (fields, masked)
            }
            None => self.fallback(&image),
        };
        metrics.postprocessing_ms = post_start.elapsed().as_millis() as u64;

        info!(
            "Request {}: number {} in {} ms",
            request,
            fields
                .aadhar_number
                .as_deref()
                .unwrap_or(mask::NOT_DETECTED),
            metrics.detection_ms + metrics.postprocessing_ms
        );

        Ok(PipelineResult {
            fields,
            image: redacted,
            metrics,
        })
    }

    /// Orientation-vote fallback when no rotation produced a validated box.
    fn fallback(&self, image: &DynamicImage) -> (ExtractedFields, DynamicImage) {
        let size = self.config.detection.working_resolution;

        let Some(detector) = self.detector.as_ref() else {
            let mut fields = ExtractedFields::default();
            fields.aadhar_number = Some(mask::NOT_DETECTED.to_string());
            return (fields, geometry::resize_square(image, size));
        };

        let (oriented, angle) = vote::best_orientation(detector, image, &self.config.detection);
        debug!("Fallback field extraction at {}°", angle);

        let (mut fields, redacted) = fields::extract_fields(
            detector,
            &self.recognizer,
            &oriented,
            &self.config.detection,
            &self.config.masking,
        );

        fields.aadhar_number = match fields.aadhar_number.take() {
            Some(text) if !text.is_empty() => Some(mask::format_masked_display(&text)),
            _ => Some(mask::NOT_DETECTED.to_string()),
        };

        (fields, redacted)
    }
}

/// The ONNX-backed service the CLI runs.
pub type OnnxService = ModelService<YoloDetector<OrtBackend>, CrnnRecognizer<OrtBackend>>;

/// Load models from the configured model directory and build a service.
///
/// A missing detector model degrades to a detector-less service with a
/// warning. A missing recognition model is a configuration error. A missing
/// dictionary file falls back to the built-in character set.
pub fn service_from_dir(config: AdmaskConfig) -> Result<OnnxService> {
    let detector_path = config.model_path(&config.models.detector_model);
    let detector = if detector_path.exists() {
        let backend = OrtBackend::from_file(&detector_path)?;
        Some(
            YoloDetector::new(backend, config.models.class_names.clone())
                .with_input_size(config.detection.working_resolution)
                .with_iou_threshold(config.detection.nms_iou),
        )
    } else {
        warn!(
            "Detector model not found at {}; serving degraded results",
            detector_path.display()
        );
        None
    };

    let recognition_path = config.model_path(&config.models.recognition_model);
    if !recognition_path.exists() {
        return Err(AdmaskError::Config(format!(
            "recognition model not found at {}",
            recognition_path.display()
        )));
    }
    let recognition_backend = OrtBackend::from_file(&recognition_path)?;

    let dictionary_path = config.model_path(&config.models.dictionary);
    let dictionary = if dictionary_path.exists() {
        CrnnRecognizer::<OrtBackend>::load_dictionary(&dictionary_path)?
    } else {
        debug!("No dictionary file, using the built-in character set");
        CrnnRecognizer::<OrtBackend>::default_dictionary()
    };

    let recognizer = CrnnRecognizer::new(recognition_backend, dictionary);
    Ok(ModelService::new(detector, recognizer, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, Detection};
    use crate::pipeline::testing::{EchoRecognizer, StubDetector};
    use image::GenericImageView;
    use pretty_assertions::assert_eq;

    fn white_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            w,
            h,
            image::Rgb([255, 255, 255]),
        ))
    }

    #[test]
    fn test_redact_without_detector_degrades_to_sentinel() {
        let service = ModelService::new(
            None::<StubDetector>,
            EchoRecognizer::new(""),
            AdmaskConfig::default(),
        );

        let result = service
            .redact(white_image(100, 50).into(), true)
            .unwrap();

        assert_eq!(
            result.fields.aadhar_number.as_deref(),
            Some(mask::NOT_DETECTED)
        );
        assert_eq!(result.fields.confidence, None);
        assert_eq!(result.fields.rotation_angle, None);
        assert_eq!(result.fields.name, None);
        // The image is still a valid working-resolution frame.
        assert_eq!((result.image.width(), result.image.height()), (640, 640));
        assert_eq!(result.metrics.detection_ms, 0);
        assert_eq!(service.usage_count(), 1);
    }

    #[test]
    fn test_redact_masks_matched_number_box() {
        let detector = StubDetector::at_angles(vec![(
            0,
            vec![Detection {
                label: "AADHAR_NUMBER".to_string(),
                confidence: 0.92,
                bbox: BBox::new(100.0, 100.0, 300.0, 140.0),
            }],
        )]);
        let service = ModelService::new(
            Some(detector),
            EchoRecognizer::new("1234 5678 9012"),
            AdmaskConfig::default(),
        );

        let result = service
            .redact(white_image(640, 640).into(), false)
            .unwrap();

        assert_eq!(
            result.fields.aadhar_number.as_deref(),
            Some("XXXX XXXX 9012")
        );
        assert_eq!(result.fields.confidence, Some(0.92));
        assert_eq!(result.fields.rotation_angle, Some(0));

        // 65% of the 200px box masked: columns 100..230 black.
        assert_eq!(result.image.get_pixel(100, 120).0[..3], [0, 0, 0]);
        assert_eq!(result.image.get_pixel(229, 120).0[..3], [0, 0, 0]);
        assert_eq!(result.image.get_pixel(230, 120).0[..3], [255, 255, 255]);
    }

    #[test]
    fn test_redact_reports_angle_of_thorough_match() {
        let detector = StubDetector::at_angles(vec![(
            45,
            vec![Detection {
                label: "AADHAR_NUMBER".to_string(),
                confidence: 0.92,
                bbox: BBox::new(100.0, 100.0, 300.0, 140.0),
            }],
        )]);
        let service = ModelService::new(
            Some(detector),
            EchoRecognizer::new("1234 5678 9012"),
            AdmaskConfig::default(),
        );

        let result = service
            .redact(white_image(640, 640).into(), true)
            .unwrap();

        assert_eq!(result.fields.rotation_angle, Some(45));
        assert_eq!(result.fields.confidence, Some(0.92));

        // The mask lands on the rotated canvas: left 65% of the box width,
        // full box height.
        assert_eq!(result.image.get_pixel(100, 100).0[..3], [0, 0, 0]);
        assert_eq!(result.image.get_pixel(229, 139).0[..3], [0, 0, 0]);
        assert_eq!(result.image.get_pixel(230, 120).0[..3], [255, 255, 255]);
    }

    #[test]
    fn test_redact_falls_back_to_field_extraction() {
        // Boxes whose text never validates: the search fails, the vote and
        // field extraction take over.
        let detector = StubDetector::fixed(vec![Detection {
            label: "GENDER".to_string(), // remaps to AADHAR_NUMBER
            confidence: 0.8,
            bbox: BBox::new(100.0, 100.0, 300.0, 140.0),
        }]);
        let service = ModelService::new(
            Some(detector),
            EchoRecognizer::new("GOVT OF INDIA"),
            AdmaskConfig::default(),
        );

        let result = service
            .redact(white_image(640, 640).into(), false)
            .unwrap();

        // Fewer than 12 digits recognized: fixed placeholder, no search
        // metadata.
        assert_eq!(
            result.fields.aadhar_number.as_deref(),
            Some(mask::MASKED_PLACEHOLDER)
        );
        assert_eq!(result.fields.confidence, None);
        assert_eq!(result.fields.rotation_angle, None);

        // The number crop was pre-redacted in the returned image.
        assert_eq!(result.image.get_pixel(100, 120).0[..3], [0, 0, 0]);
    }

    #[test]
    fn test_usage_count_increments_per_request() {
        let service = ModelService::new(
            None::<StubDetector>,
            EchoRecognizer::new(""),
            AdmaskConfig::default(),
        );

        for _ in 0..3 {
            service.redact(white_image(32, 32).into(), false).unwrap();
        }

        assert_eq!(service.usage_count(), 3);
    }

    #[test]
    fn test_empty_path_is_rejected_as_no_input() {
        let service = ModelService::new(
            None::<StubDetector>,
            EchoRecognizer::new(""),
            AdmaskConfig::default(),
        );

        let result = service.redact(PathBuf::new().into(), false);
        assert!(matches!(result, Err(AdmaskError::NoInput)));
    }

    #[test]
    fn test_fields_serialize_with_card_label_keys() {
        let fields = ExtractedFields {
            aadhar_number: Some("XXXX XXXX 9012".to_string()),
            gender: Some("MALE".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value["AADHAR_NUMBER"], "XXXX XXXX 9012");
        assert_eq!(value["GENDER"], "MALE");
        // Absent fields are omitted, not null.
        assert!(value.get("NAME").is_none());
        assert!(value.get("confidence").is_none());
    }
}
