//! ONNX inference for exported recognition networks.

use crate::config::PredictionHead;
use crate::error::{ModelError, Result};
use crate::traits::{AttentionStep, RecognitionModel};
use crate::types::{ModelOutput, StepOutput};
use ndarray::prelude::*;
use ort::session::Session;
use ort::value::{DynValue, Tensor};
use ort::inputs;

/// Hidden size of the attention LSTM cell.
pub const DEFAULT_HIDDEN_SIZE: usize = 256;

fn missing(name: &str) -> ModelError {
    ModelError::MissingOutput {
        name: name.to_string(),
    }
}

/// Whole network exported as one graph.
///
/// Inputs `image` (and `text` for attention heads); outputs `logits` and,
/// for attention heads, optionally `alphas`.
pub struct OnnxRecognizer {
    pub session: Session,
    pub head: PredictionHead,
}

impl OnnxRecognizer {
    pub fn new(session: Session, head: PredictionHead) -> Self {
        Self { session, head }
    }
}

impl RecognitionModel for OnnxRecognizer {
    fn forward(&mut self, images: ArrayView4<f32>, text: ArrayView2<i64>) -> Result<ModelOutput> {
        let image = Tensor::from_array(images.to_owned())?;

        let mut outputs = match self.head {
            PredictionHead::Ctc => self.session.run(inputs!("image" => image))?,
            PredictionHead::Attn => {
                let text = Tensor::from_array(text.to_owned())?;
                self.session.run(inputs!(
                    "image" => image,
                    "text" => text,
                ))?
            }
        };

        let logits = outputs.remove("logits").ok_or_else(|| missing("logits"))?;
        let logits = logits
            .try_extract_array::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix3>()?;

        let alphas = match outputs.remove("alphas") {
            Some(alphas) => Some(
                alphas
                    .try_extract_array::<f32>()?
                    .to_owned()
                    .into_dimensionality::<Ix3>()?,
            ),
            None => None,
        };

        Ok(ModelOutput { logits, alphas })
    }
}

/// Attention network exported as an encoder plus a one-step decoder.
///
/// The encoder maps `image` to contextual `features`. The step graph takes
/// `features`, `prev_token` and the LSTM state (`hidden_h`, `hidden_c`) and
/// returns `logits`, `alpha` and the next state.
pub struct OnnxAttentionStep {
    pub encoder: Session,
    pub decoder_step: Session,
    pub hidden_size: usize,
    features: Option<DynValue>,
    hidden_h: Option<DynValue>,
    hidden_c: Option<DynValue>,
}

impl OnnxAttentionStep {
    pub fn new(encoder: Session, decoder_step: Session, hidden_size: usize) -> Self {
        Self {
            encoder,
            decoder_step,
            hidden_size,
            features: None,
            hidden_h: None,
            hidden_c: None,
        }
    }
}

impl AttentionStep for OnnxAttentionStep {
    fn encode(&mut self, images: ArrayView4<f32>) -> Result<()> {
        let batch = images.len_of(Axis(0));
        let image = Tensor::from_array(images.to_owned())?;

        let mut outputs = self.encoder.run(inputs!("image" => image))?;
        let features = outputs.remove("features").ok_or_else(|| missing("features"))?;

        let state = Array2::<f32>::zeros((batch, self.hidden_size));

        self.features = Some(features);
        self.hidden_h = Some(Tensor::from_array(state.clone())?.into_dyn());
        self.hidden_c = Some(Tensor::from_array(state)?.into_dyn());

        Ok(())
    }

    fn step(&mut self, prev_tokens: ArrayView1<i64>) -> Result<StepOutput> {
        let (Some(features), Some(hidden_h), Some(hidden_c)) =
            (&self.features, &self.hidden_h, &self.hidden_c)
        else {
            return Err(missing("features").into());
        };

        let prev_token = Tensor::from_array(prev_tokens.to_owned())?;

        let mut outputs = self.decoder_step.run(inputs!(
            "features" => features,
            "prev_token" => prev_token,
            "hidden_h" => hidden_h,
            "hidden_c" => hidden_c,
        ))?;

        let logits = outputs
            .remove("logits")
            .ok_or_else(|| missing("logits"))?
            .try_extract_array::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix2>()?;

        let alpha = match outputs.remove("alpha") {
            Some(alpha) => {
                let alpha = alpha.try_extract_array::<f32>()?.to_owned();
                // Exported as (batch, positions, 1)
                let batch = alpha.shape()[0];
                let positions = alpha.len() / batch.max(1);
                Some(alpha.into_shape_with_order((batch, positions))?)
            }
            None => None,
        };

        // Update LSTM states for next token prediction
        let hidden_h = outputs
            .remove("hidden_h_out")
            .ok_or_else(|| missing("hidden_h_out"))?;
        let hidden_c = outputs
            .remove("hidden_c_out")
            .ok_or_else(|| missing("hidden_c_out"))?;

        self.hidden_h = Some(hidden_h);
        self.hidden_c = Some(hidden_c);

        Ok(StepOutput { logits, alpha })
    }
}
