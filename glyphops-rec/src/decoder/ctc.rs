//! Alignment-free (CTC) greedy decoding.

use crate::config::CtcConfidence;
use crate::decoder::{Candidate, Decode, Decoded};
use crate::vocab::Vocabulary;
use ndarray::{ArrayView1, ArrayView2, Axis};
use std::sync::Arc;

/// Collapses repeated indices and drops blanks.
#[derive(Clone, Debug)]
pub struct CtcDecoder {
    vocab: Arc<Vocabulary>,
    confidence: CtcConfidence,
}

impl CtcDecoder {
    pub fn new(vocab: Arc<Vocabulary>, confidence: CtcConfidence) -> Self {
        Self { vocab, confidence }
    }

    /// Decode one timestep-ordered index sequence with its probabilities.
    ///
    /// Each maximal run of equal indices emits one token unless the run is
    /// blank.
    pub fn decode_path(&self, indices: ArrayView1<usize>, probs: ArrayView1<f32>) -> Candidate {
        let blank = self.vocab.blank_index();
        let mut tokens = Vec::new();
        let mut emitted = Vec::new();
        let mut prev = None;

        for (&index, &p) in indices.iter().zip(probs.iter()) {
            if prev != Some(index)
                && index != blank
                && let Some(token) = self.vocab.token(index)
            {
                tokens.push(token.to_string());
                emitted.push(p);
            }
            prev = Some(index);
        }

        let probs = match self.confidence {
            CtcConfidence::Emitted => emitted,
            CtcConfidence::Prefix => probs.iter().take(tokens.len()).copied().collect(),
        };

        Candidate::new(tokens, probs)
    }
}

impl Decode for CtcDecoder {
    fn decode_sample(&self, indices: ArrayView2<usize>, probs: ArrayView2<f32>) -> Decoded {
        let candidates = indices
            .axis_iter(Axis(1))
            .zip(probs.axis_iter(Axis(1)))
            .map(|(indices, probs)| self.decode_path(indices, probs))
            .collect();

        Decoded::Line(candidates)
    }
}
