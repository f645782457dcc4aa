//! Core library for Aadhaar card number redaction.
//!
//! This crate provides:
//! - Two-stage rotation search for the Aadhaar number region
//! - Cardinal-orientation vote fallback with per-field extraction
//! - Geometric masking of the number box and masked display formatting
//! - ONNX detector and CRNN recognizer behind capability traits

pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod pipeline;
pub mod recognize;

pub use config::{AdmaskConfig, DetectionConfig, MaskingConfig, ModelConfig};
pub use detect::{BBox, Detection, ObjectDetector, YoloDetector};
pub use error::{AdmaskError, Result};
pub use pipeline::{
    ExtractedFields, ImageInput, Metrics, ModelService, OnnxService, PipelineResult,
    service_from_dir,
};
pub use recognize::{CrnnRecognizer, LayoutMode, TextRecognizer};

/// Re-export inference types.
pub use admask_inference::{InferenceBackend, OrtBackend};
