//! Error types for glyphops-rec organized by processing stage.

use crate::config::PredictionHead;
use ndarray::ShapeError;
use ndarray_stats::errors::MinMaxError;
use std::path::PathBuf;
use thiserror::Error;

/// Recognition pipeline error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Image loading stage error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Model inference stage error
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Configuration errors (vocabulary, architecture, decoding options).
///
/// All of these are raised before the first batch is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Charset name outside the known tiers
    #[error("unsupported charset: {0} (expected one of CN-s, CN-m, CN-l, CN-xl)")]
    UnsupportedCharset(String),

    /// Charset produced no characters
    #[error("charset is empty")]
    EmptyCharset,

    /// Charset file could not be read
    #[error("failed to read charset file {path:?}")]
    CharsetFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Prediction head is neither CTC nor Attn
    #[error("unsupported prediction stage: {0} (expected CTC or Attn)")]
    UnsupportedPrediction(String),

    /// Transformation stage is neither None nor TPS
    #[error("unsupported transformation stage: {0} (expected None or TPS)")]
    UnsupportedTransformation(String),

    /// Unknown feature extractor
    #[error("unsupported feature extraction stage: {0}")]
    UnsupportedFeatureExtraction(String),

    /// Sequence modeling stage is neither None nor BiLSTM
    #[error("unsupported sequence modeling stage: {0} (expected None or BiLSTM)")]
    UnsupportedSequenceModeling(String),

    /// Page orientation outside horizontal/vertical/single
    #[error("unsupported page orientation: {0}")]
    UnsupportedOrientation(String),

    /// Top-k outside `1..=num_classes`
    #[error("invalid top-k: {k} (must be between 1 and {num_classes})")]
    InvalidTopK { k: usize, num_classes: usize },

    /// Vocabulary built for a different head than the model
    #[error("vocabulary is built for {vocab} but the model predicts with {model}")]
    HeadMismatch {
        vocab: PredictionHead,
        model: PredictionHead,
    },

    /// Maximum label length of zero
    #[error("batch max length must be at least 1")]
    InvalidMaxLength,
}

/// Image loading and preprocessing errors.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Image has a zero-sized dimension
    #[error("empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Batch with no images
    #[error("empty image batch")]
    EmptyBatch,

    /// Sample names do not line up with the image batch
    #[error("{ids} sample names for a batch of {images} images")]
    IdCountMismatch { images: usize, ids: usize },

    /// IO error during image discovery
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error(transparent)]
    Decode(#[from] image::ImageError),
}

/// Model inference errors (ONNX, ndarray operations).
#[derive(Debug, Error)]
pub enum ModelError {
    /// Missing expected output tensor
    #[error("missing model output: {name}")]
    MissingOutput { name: String },

    /// Class dimension of the model output disagrees with the vocabulary
    #[error("model emits {got} classes but the vocabulary has {expected}")]
    ClassCountMismatch { expected: usize, got: usize },

    /// Model emitted NaN or infinite scores
    #[error("model emitted {count} non-finite logits")]
    NonFiniteOutput { count: usize },

    /// Model returned fewer samples than were fed
    #[error("model returned {got} samples for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, got: usize },

    /// ONNX Runtime error
    #[error(transparent)]
    Ort(#[from] ort::Error),

    /// ndarray shape error
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// ndarray-stats min/max error
    #[error(transparent)]
    MinMax(#[from] MinMaxError),
}

/// Result type alias for glyphops-rec operations.
pub type Result<T> = std::result::Result<T, Error>;

// Nested From implementations for automatic error conversion chains

// image::ImageError → ImageError → Error
impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(ImageError::Decode(e))
    }
}

// std::io::Error → ImageError → Error
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Image(ImageError::Io(e))
    }
}

// ort::Error → ModelError → Error
impl From<ort::Error> for Error {
    fn from(e: ort::Error) -> Self {
        Error::Model(ModelError::Ort(e))
    }
}

// ShapeError → ModelError → Error
impl From<ShapeError> for Error {
    fn from(e: ShapeError) -> Self {
        Error::Model(ModelError::Shape(e))
    }
}

// MinMaxError → ModelError → Error
impl From<MinMaxError> for Error {
    fn from(e: MinMaxError) -> Self {
        Error::Model(ModelError::MinMax(e))
    }
}
