//! Per-field extraction and normalization on the fallback path.

use image::{DynamicImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DetectionConfig, MaskingConfig};
use crate::detect::{ObjectDetector, crop_box};
use crate::mask;
use crate::recognize::{LayoutMode, TextRecognizer};

use super::patterns::{DATE_OF_BIRTH, PUNCTUATION};

/// Detector label remap table.
///
/// The detector was trained with its label set shifted by one logical
/// position: a box it reports as GENDER actually covers the Aadhaar number,
/// and so on through a fixed cycle. The table compensates for that shift;
/// it is deliberately a constant lookup, not conditional logic, and is
/// pinned by a unit test. Whether the shift papers over an upstream
/// labelling bug or is itself a defect is unresolved upstream — preserve
/// the mapping as is.
pub const LABEL_REMAP: [(&str, &str); 4] = [
    ("GENDER", "AADHAR_NUMBER"),
    ("AADHAR_NUMBER", "DATE_OF_BIRTH"),
    ("NAME", "GENDER"),
    ("DATE_OF_BIRTH", "NAME"),
];

/// Resolve a raw detector label through [`LABEL_REMAP`].
///
/// Unmapped labels pass through unchanged.
pub fn remap_label(raw: &str) -> &str {
    LABEL_REMAP
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw)
}

/// The role a resolved label plays on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Gender,
    AadharNumber,
    Name,
    DateOfBirth,
}

impl FieldRole {
    /// Parse a resolved label; labels outside the four fixed keys yield
    /// `None` and are dropped by the extraction loop.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "GENDER" => Some(Self::Gender),
            "AADHAR_NUMBER" => Some(Self::AadharNumber),
            "NAME" => Some(Self::Name),
            "DATE_OF_BIRTH" => Some(Self::DateOfBirth),
            _ => None,
        }
    }
}

/// The four card fields plus search metadata.
///
/// `aadhar_number` is always populated by the time a pipeline result is
/// returned: either a masked display string or the "Not detected" sentinel.
/// `confidence` and `rotation_angle` appear only when the primary rotation
/// search produced the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(rename = "GENDER", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "AADHAR_NUMBER")]
    pub aadhar_number: Option<String>,

    #[serde(rename = "NAME", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "DATE_OF_BIRTH", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_angle: Option<i32>,
}

impl ExtractedFields {
    fn get_mut(&mut self, role: FieldRole) -> &mut Option<String> {
        match role {
            FieldRole::Gender => &mut self.gender,
            FieldRole::AadharNumber => &mut self.aadhar_number,
            FieldRole::Name => &mut self.name,
            FieldRole::DateOfBirth => &mut self.date_of_birth,
        }
    }
}

/// Extract the four card fields from a working-resolution image.
///
/// Re-runs detection at the fallback confidence floor, resolves labels
/// through [`LABEL_REMAP`], pre-redacts Aadhaar-number crops before OCR and
/// cleans each value per role. Returns the fields and the output image
/// (the input copy with the number region pre-redacted in place).
pub fn extract_fields<D, R>(
    detector: &D,
    recognizer: &R,
    image: &DynamicImage,
    detection: &DetectionConfig,
    masking: &MaskingConfig,
) -> (ExtractedFields, DynamicImage)
where
    D: ObjectDetector,
    R: TextRecognizer,
{
    let mut fields = ExtractedFields::default();
    let mut canvas = image.to_rgb8();

    let detections = match detector.detect(image, detection.fallback_confidence) {
        Ok(detections) => detections,
        Err(e) => {
            warn!("Field detection failed: {}", e);
            Vec::new()
        }
    };

    if detections.is_empty() {
        debug!("No field detections found");
    }

    for det in &detections {
        let label = remap_label(&det.label);
        let Some(role) = FieldRole::from_label(label) else {
            debug!("Dropping unmapped label {}", det.label);
            continue;
        };

        let mut crop = crop_box(image, &det.bbox);

        // The recognizer must never see the leading digits: blank all but
        // the trailing portion of the number crop, and bake the redaction
        // into the returned image.
        if role == FieldRole::AadharNumber {
            crop = mask::redact_leading(&crop, masking.preredact_keep_ratio);
            let (x, y, _, _) = det.bbox.to_pixel_rect(canvas.width(), canvas.height());
            image::imageops::replace(&mut canvas, &crop.to_rgb8(), x as i64, y as i64);
        }

        let binarized = binarize(&crop, masking.binarize_threshold);

        let mode = if role == FieldRole::DateOfBirth {
            LayoutMode::SingleLine
        } else {
            LayoutMode::Block
        };

        // Per-box OCR failures substitute empty text, never propagate.
        let raw = recognizer.recognize(&binarized, mode).unwrap_or_default();
        let cleaned = clean_field(&raw, role);

        debug!(
            "Field {:?} (raw label {}), conf {:.2}: {:?}",
            role, det.label, det.confidence, cleaned
        );

        let slot = fields.get_mut(role);
        if slot.is_none() {
            *slot = cleaned;
        }
    }

    (fields, DynamicImage::ImageRgb8(canvas))
}

/// Clean raw OCR output for a field role.
///
/// The date of birth must match `DD[-/]MM[-/]YYYY` or the field stays
/// absent; every other role has punctuation replaced by spaces and
/// surrounding whitespace trimmed.
fn clean_field(raw: &str, role: FieldRole) -> Option<String> {
    match role {
        FieldRole::DateOfBirth => DATE_OF_BIRTH
            .find(raw)
            .map(|m| m.as_str().to_string()),
        _ => {
            let cleaned = PUNCTUATION.replace_all(raw, " ").trim().to_string();
            Some(cleaned)
        }
    }
}

/// Grayscale and fixed-threshold binarization applied before OCR.
fn binarize(image: &DynamicImage, threshold: u8) -> DynamicImage {
    let gray = image.to_luma8();
    let mut out = gray.clone();

    for pixel in out.pixels_mut() {
        *pixel = if pixel[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        };
    }

    DynamicImage::ImageLuma8(out)
}
