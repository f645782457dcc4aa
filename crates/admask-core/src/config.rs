//! Configuration structures for the redaction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the admask pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmaskConfig {
    /// Detection and rotation-search configuration.
    pub detection: DetectionConfig,

    /// Masking and OCR preprocessing configuration.
    pub masking: MaskingConfig,

    /// Model file configuration.
    pub models: ModelConfig,
}

impl Default for AdmaskConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            masking: MaskingConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

/// Detection and rotation-search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Confidence floor for the primary rotation search (0.0 - 1.0).
    pub primary_confidence: f32,

    /// Confidence floor for the cardinal-vote fallback and field
    /// extraction (0.0 - 1.0).
    pub fallback_confidence: f32,

    /// Best-confidence threshold above which the thorough scan stops
    /// trying further angles.
    pub early_exit_confidence: f32,

    /// Angle increment for the thorough scan, in degrees.
    pub rotation_step: u32,

    /// Square working resolution for the fallback path and the detector
    /// input.
    pub working_resolution: u32,

    /// IoU threshold for detector non-maximum suppression.
    pub nms_iou: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            primary_confidence: 0.6,
            fallback_confidence: 0.6,
            early_exit_confidence: 0.85,
            rotation_step: 15,
            working_resolution: 640,
            nms_iou: 0.45,
        }
    }
}

/// Masking and OCR preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Fraction of the matched box width covered by the final black
    /// rectangle, from the left edge.
    pub mask_ratio: f32,

    /// Fraction of an Aadhaar-number crop kept visible (trailing edge)
    /// when pre-redacting before OCR.
    pub preredact_keep_ratio: f32,

    /// Fixed grayscale threshold applied to crops before OCR.
    pub binarize_threshold: u8,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            mask_ratio: 0.65,
            preredact_keep_ratio: 0.35,
            binarize_threshold: 150,
        }
    }
}

/// Model file paths and detector label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Region detector model file name.
    pub detector_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name for the recognizer.
    pub dictionary: String,

    /// Detector class names, indexed by class id.
    ///
    /// These are the labels as the detector emits them; the pipeline maps
    /// them to field roles through a separate remap table.
    pub class_names: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detector_model: "aadhaar_det.onnx".to_string(),
            recognition_model: "rec.onnx".to_string(),
            dictionary: "dict.txt".to_string(),
            class_names: vec![
                "AADHAR_NUMBER".to_string(),
                "DATE_OF_BIRTH".to_string(),
                "GENDER".to_string(),
                "NAME".to_string(),
            ],
        }
    }
}

impl AdmaskConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }
}
