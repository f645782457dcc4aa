//! Two-stage rotation search for the Aadhaar number region.

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::DetectionConfig;
use crate::detect::{BBox, ObjectDetector, crop_box};
use crate::geometry;
use crate::recognize::{LayoutMode, TextRecognizer};

use super::patterns::contains_aadhaar_number;

/// The four cardinal angles checked by the fast first stage.
const STAGE1_ANGLES: [u32; 4] = [0, 90, 180, 270];

/// A pattern-validated detection found by the rotation search.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Detector confidence of the matched box.
    pub confidence: f32,

    /// Rotation angle (degrees) at which the match was found.
    pub angle: i32,

    /// Matched box in the rotated image's coordinates.
    pub bbox: BBox,

    /// Raw OCR text from the matched box.
    pub raw_text: String,

    /// The rotated image the box coordinates refer to.
    pub rotated: DynamicImage,
}

/// Result of a full rotation search, matched or not.
#[derive(Debug)]
pub struct SearchOutcome {
    /// The winning candidate, if any box validated against the pattern.
    pub matched: Option<SearchMatch>,

    /// Wall time spent scanning, in milliseconds.
    pub elapsed_ms: u64,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            matched: None,
            elapsed_ms: 0,
        }
    }
}

/// Scan rotations of `image` for a box whose OCR text validates as a
/// 12-digit Aadhaar number.
///
/// Stage 1 checks the four cardinal angles in fixed order and returns the
/// first validated box immediately. Stage 2 (only when `thorough` is set)
/// sweeps the remaining 15-degree steps keeping the strictly highest
/// confidence candidate, with an early exit between angles once the best
/// confidence clears the configured threshold.
///
/// A missing detector yields an empty outcome with zero elapsed time; it is
/// not an error.
pub fn find_number_region<D, R>(
    detector: Option<&D>,
    recognizer: &R,
    image: &DynamicImage,
    thorough: bool,
    config: &DetectionConfig,
) -> SearchOutcome
where
    D: ObjectDetector,
    R: TextRecognizer,
{
    let Some(detector) = detector else {
        return SearchOutcome::empty();
    };

    let start = Instant::now();

    // Stage 1: cardinal angles, first validated box wins.
    debug!("Stage 1: checking {} cardinal angles", STAGE1_ANGLES.len());

    for &angle in &STAGE1_ANGLES {
        let rotated = if angle == 0 {
            image.clone()
        } else {
            geometry::rotate(image, angle as f32)
        };

        for candidate in detect_or_empty(detector, &rotated, config.primary_confidence) {
            let text = ocr_box(recognizer, &rotated, &candidate.bbox);
            if contains_aadhaar_number(&text) {
                info!(
                    "Stage 1 match at {}° with confidence {:.2}",
                    angle, candidate.confidence
                );
                return SearchOutcome {
                    matched: Some(SearchMatch {
                        confidence: candidate.confidence,
                        angle: angle as i32,
                        bbox: candidate.bbox,
                        raw_text: text,
                        rotated,
                    }),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
            }
        }
    }

    debug!("Stage 1 found nothing in the cardinal angles");

    let mut best: Option<SearchMatch> = None;

    // Stage 2: remaining angles in ascending order, best confidence wins.
    if thorough {
        let step = config.rotation_step.max(1);
        let angles: Vec<u32> = (step..360)
            .step_by(step as usize)
            .filter(|angle| !STAGE1_ANGLES.contains(angle))
            .collect();

        debug!("Stage 2: checking {} remaining angles", angles.len());

        for angle in angles {
            let rotated = geometry::rotate(image, angle as f32);

            for candidate in detect_or_empty(detector, &rotated, config.primary_confidence) {
                let text = ocr_box(recognizer, &rotated, &candidate.bbox);
                let beats_best = best
                    .as_ref()
                    .map(|b| candidate.confidence > b.confidence)
                    .unwrap_or(true);

                if contains_aadhaar_number(&text) && beats_best {
                    best = Some(SearchMatch {
                        confidence: candidate.confidence,
                        angle: angle as i32,
                        bbox: candidate.bbox,
                        raw_text: text,
                        rotated: rotated.clone(),
                    });
                }
            }

            // Confident early exit, checked between angles only.
            if let Some(b) = &best {
                if b.confidence > config.early_exit_confidence {
                    info!(
                        "Stage 2 early exit at {}° with confidence {:.2}",
                        b.angle, b.confidence
                    );
                    break;
                }
            }
        }
    }

    if let Some(b) = &best {
        info!(
            "Stage 2 best match at {}° with confidence {:.2}",
            b.angle, b.confidence
        );
    } else {
        debug!("No Aadhaar number found at any angle");
    }

    SearchOutcome {
        matched: best,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

/// Run the detector, degrading inference failures to an empty box list.
fn detect_or_empty<D: ObjectDetector>(
    detector: &D,
    image: &DynamicImage,
    confidence_floor: f32,
) -> Vec<crate::detect::Detection> {
    match detector.detect(image, confidence_floor) {
        Ok(detections) => detections,
        Err(e) => {
            warn!("Detector failed, treating as no detections: {}", e);
            Vec::new()
        }
    }
}

/// OCR a detection box in block mode; failures yield empty text.
fn ocr_box<R: TextRecognizer>(recognizer: &R, image: &DynamicImage, bbox: &BBox) -> String {
    let crop = crop_box(image, bbox);
    recognizer
        .recognize(&crop, LayoutMode::Block)
        .unwrap_or_default()
        .trim()
        .to_string()
}
