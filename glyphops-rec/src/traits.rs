//! Core traits for recognition pipeline components.

use crate::error::Result;
use crate::types::{ModelOutput, StepOutput};
use image::DynamicImage;
use ndarray::{Array3, ArrayView1, ArrayView2, ArrayView4};

/// Converts a decoded image into the network's input layout.
pub trait Preprocessor {
    /// Produce a `(channels, height, width)` tensor for one image.
    fn preprocess(&self, image: &DynamicImage) -> Result<Array3<f32>>;
}

/// Recognition network that maps an image batch to per-step class scores.
///
/// This trait abstracts over the exported network (single graph, or encoder
/// plus step decoder) while providing a uniform interface for the pipeline.
pub trait RecognitionModel {
    /// Run inference on a `(batch, channels, height, width)` image tensor.
    ///
    /// `text` has shape `(batch, steps)`; its first column holds the start
    /// token. Classification heads ignore it. Returned logits have shape
    /// `(batch, time, num_classes)`.
    ///
    /// Note: Takes `&mut self` because ONNX Runtime's Session::run requires it.
    fn forward(&mut self, images: ArrayView4<f32>, text: ArrayView2<i64>) -> Result<ModelOutput>;
}

/// Attention decoder exported as a single step, driven by the caller.
pub trait AttentionStep {
    /// Encode a new image batch and reset the decoder state.
    fn encode(&mut self, images: ArrayView4<f32>) -> Result<()>;

    /// Run one decoding step from the previous token of every sample.
    fn step(&mut self, prev_tokens: ArrayView1<i64>) -> Result<StepOutput>;
}
