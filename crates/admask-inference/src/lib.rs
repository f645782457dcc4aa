//! ONNX inference abstraction for the admask vision models.
//!
//! The detector and recognizer are plain float32 NCHW models, so the
//! backend trait works directly with `ndarray` float tensors instead of a
//! multi-dtype tensor enum. The only backend is ONNX Runtime (`ort`) with
//! the XNNPACK execution provider.

mod backend;
mod error;

pub use backend::{InferenceBackend, ort::OrtBackend};
pub use error::InferenceError;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
