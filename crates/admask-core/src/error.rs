//! Error types for the admask-core library.

use thiserror::Error;

/// Main error type for the admask library.
#[derive(Error, Debug)]
pub enum AdmaskError {
    /// Region detection error.
    #[error("detection error: {0}")]
    Detect(#[from] DetectError),

    /// Text recognition error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Inference error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] admask_inference::InferenceError),

    /// Image decoding or processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No input image was supplied.
    #[error("no input image supplied")]
    NoInput,
}

/// Errors related to region detection.
#[derive(Error, Debug)]
pub enum DetectError {
    /// Failed to load detector weights.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Detector inference failed.
    #[error("detection failed: {0}")]
    Detection(String),

    /// The detector produced an output we cannot decode.
    #[error("invalid detector output: {0}")]
    InvalidOutput(String),
}

/// Errors related to text recognition.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load recognizer weights or dictionary.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Crop preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Text recognition failed.
    #[error("recognition failed: {0}")]
    Recognition(String),
}

/// Result type for the admask library.
pub type Result<T> = std::result::Result<T, AdmaskError>;
