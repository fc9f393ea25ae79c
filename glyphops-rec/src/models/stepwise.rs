//! Greedy autoregressive driving of a single-step attention decoder.

use crate::error::{ModelError, Result};
use crate::traits::{AttentionStep, RecognitionModel};
use crate::types::{ModelOutput, StepOutput};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

/// Unrolls an [`AttentionStep`] for as many steps as `text` has columns.
///
/// Each step feeds back only the most probable token of the previous step.
/// Lower-ranked classes are reported by the top-k selection afterwards but
/// never explored, so this is greedy decoding, not beam search.
pub struct GreedyUnroll<S> {
    step: S,
}

impl<S: AttentionStep> GreedyUnroll<S> {
    pub fn new(step: S) -> Self {
        Self { step }
    }

    pub fn into_inner(self) -> S {
        self.step
    }
}

impl<S: AttentionStep> RecognitionModel for GreedyUnroll<S> {
    fn forward(&mut self, images: ArrayView4<f32>, text: ArrayView2<i64>) -> Result<ModelOutput> {
        let (batch, num_steps) = text.dim();

        self.step.encode(images)?;

        let mut prev = text.column(0).to_owned();
        let mut logits = Vec::with_capacity(num_steps);
        let mut alphas = Vec::with_capacity(num_steps);

        for t in 0..num_steps {
            let StepOutput {
                logits: step_logits,
                alpha,
            } = self.step.step(prev.view())?;

            if step_logits.nrows() != batch {
                return Err(ModelError::BatchSizeMismatch {
                    expected: batch,
                    got: step_logits.nrows(),
                }
                .into());
            }

            for (b, row) in step_logits.outer_iter().enumerate() {
                prev[b] = row.argmax()? as i64;
            }

            tracing::trace!(step = t, tokens = ?prev.as_slice(), "decoded step");

            logits.push(step_logits);
            alphas.extend(alpha);
        }

        let logits = stack_steps(&logits)?;
        let alphas = if alphas.len() == num_steps {
            Some(stack_steps(&alphas)?)
        } else {
            None
        };

        Ok(ModelOutput { logits, alphas })
    }
}

/// Stack `steps` arrays of `(batch, n)` into `(batch, steps, n)`.
fn stack_steps(steps: &[Array2<f32>]) -> Result<Array3<f32>> {
    let views: Vec<_> = steps.iter().map(|a| a.view()).collect();
    Ok(ndarray::stack(Axis(1), &views)?)
}
