//! Error types for the f32-only inference layer.

use thiserror::Error;

/// Errors the ONNX backend can produce.
///
/// The backend deals in a single tensor type, so conversion failures carry
/// the offending detail as a message rather than a dtype taxonomy.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model bytes could not be parsed into a session.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Session or execution-provider setup failed.
    #[error("session setup failed: {0}")]
    SessionCreate(String),

    /// An input array could not be converted into a session tensor.
    #[error("invalid input tensor: {0}")]
    InvalidInput(String),

    /// The session run itself failed.
    #[error("inference run failed: {0}")]
    InferenceFailed(String),

    /// A session output could not be read back as an f32 array.
    #[error("output extraction failed: {0}")]
    OutputExtraction(String),

    /// I/O error reading a model file from disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_failing_stage() {
        let e = InferenceError::ModelLoad("bad protobuf".to_string());
        assert_eq!(e.to_string(), "model load failed: bad protobuf");

        let e = InferenceError::InvalidInput("shape mismatch".to_string());
        assert_eq!(e.to_string(), "invalid input tensor: shape mismatch");

        let e = InferenceError::OutputExtraction("not f32".to_string());
        assert_eq!(e.to_string(), "output extraction failed: not f32");
    }

    #[test]
    fn test_io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing model");
        let e = InferenceError::from(io);
        assert!(matches!(e, InferenceError::Io(_)));
        assert!(e.to_string().contains("missing model"));
    }
}
