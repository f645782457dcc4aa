//! Text recognition over cropped card regions.

mod crnn;

pub use crnn::CrnnRecognizer;

use image::DynamicImage;

use crate::error::OcrError;

/// OCR layout hint for a cropped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Uniform block of text, possibly several lines.
    Block,
    /// A single line of text (used for the date-of-birth crop).
    SingleLine,
}

/// Capability interface for the text recognizer.
///
/// Callers treat failures as recoverable: a per-box error is substituted
/// with empty text and never propagated out of the pipeline.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in a cropped region.
    fn recognize(&self, region: &DynamicImage, mode: LayoutMode) -> Result<String, OcrError>;
}
