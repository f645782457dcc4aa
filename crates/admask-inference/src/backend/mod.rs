//! Inference backend implementations.

pub mod ort;

use ndarray::ArrayD;

use crate::Result;

/// Trait for float32 ONNX inference backends.
///
/// Both admask models (the region detector and the text recognizer) take a
/// single NCHW float32 tensor and emit float32 tensors, so the trait stays
/// monomorphic in the element type. Implementations must be safe to call
/// concurrently from multiple request threads.
pub trait InferenceBackend: Send + Sync {
    /// Run inference with the given named input tensors.
    ///
    /// Returns the model's named output tensors.
    fn run(&self, inputs: &[(&str, ArrayD<f32>)]) -> Result<Vec<(String, ArrayD<f32>)>>;

    /// Get the input names expected by the model.
    fn input_names(&self) -> &[String];

    /// Get the output names produced by the model.
    fn output_names(&self) -> &[String];
}
