//! Recognition network implementations.

pub mod onnx;
pub mod stepwise;

use crate::config::Architecture;
use crate::error::Result;
use crate::traits::RecognitionModel;
use crate::types::{ModelOutput, ModelRepo};
use eyre::WrapErr;
use ndarray::{ArrayView2, ArrayView4};
use onnx::{DEFAULT_HIDDEN_SIZE, OnnxAttentionStep, OnnxRecognizer};
use ort::session::builder::SessionBuilder;
use stepwise::GreedyUnroll;

const WHOLE_MODEL_FILES: &[&str] = &["model.onnx", "recognizer.onnx", "model.int8.onnx"];
const ENCODER_FILES: &[&str] = &["encoder.onnx", "encoder.int8.onnx"];
const DECODER_STEP_FILES: &[&str] = &["decoder_step.onnx", "decoder_step.int8.onnx"];

/// ONNX-backed recognition network in either export layout.
pub enum OnnxModel {
    /// Single graph
    Whole(OnnxRecognizer),
    /// Encoder plus step decoder, unrolled greedily
    Stepwise(GreedyUnroll<OnnxAttentionStep>),
}

impl OnnxModel {
    /// Load the network from a model repository.
    ///
    /// Attention heads prefer the encoder/step-decoder pair when both files
    /// exist and fall back to a single graph otherwise.
    pub fn from_repo(
        repo: &ModelRepo,
        architecture: &Architecture,
        session_builder: SessionBuilder,
    ) -> eyre::Result<Self> {
        tracing::info!(
            transformation = ?architecture.transformation,
            feature_extraction = ?architecture.feature_extraction,
            sequence_modeling = ?architecture.sequence_modeling,
            prediction = %architecture.prediction,
            "model architecture"
        );

        if architecture.prediction == crate::config::PredictionHead::Attn
            && let Ok(encoder_path) = repo.resolve_any(ENCODER_FILES)
            && let Ok(decoder_path) = repo.resolve_any(DECODER_STEP_FILES)
        {
            tracing::info!(encoder = ?encoder_path.display(), decoder = ?decoder_path.display(), "loading stepwise model");

            let encoder = session_builder
                .clone()
                .commit_from_file(&encoder_path)
                .wrap_err("failed to load encoder session")?;

            let decoder_step = session_builder
                .commit_from_file(&decoder_path)
                .wrap_err("failed to load decoder step session")?;

            let step = OnnxAttentionStep::new(encoder, decoder_step, DEFAULT_HIDDEN_SIZE);
            return Ok(OnnxModel::Stepwise(GreedyUnroll::new(step)));
        }

        let model_path = repo.resolve_any(WHOLE_MODEL_FILES)?;

        tracing::info!(path = ?model_path.display(), "loading model");

        let session = session_builder
            .commit_from_file(&model_path)
            .wrap_err("failed to load recognizer session")?;

        Ok(OnnxModel::Whole(OnnxRecognizer::new(
            session,
            architecture.prediction,
        )))
    }
}

impl RecognitionModel for OnnxModel {
    fn forward(&mut self, images: ArrayView4<f32>, text: ArrayView2<i64>) -> Result<ModelOutput> {
        match self {
            OnnxModel::Whole(model) => model.forward(images, text),
            OnnxModel::Stepwise(model) => model.forward(images, text),
        }
    }
}
