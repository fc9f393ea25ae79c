//! Decoding of top-k class indices into text candidates.
//!
//! The decoding strategy is fixed when the [`Decoder`] is built from the
//! prediction head and maximum label length; callers only see
//! [`Decoder::decode`].

pub mod attn;
pub mod ctc;

use crate::config::{CtcConfidence, PredictionHead};
use crate::confidence::confidence;
use crate::topk::TopK;
use crate::vocab::Vocabulary;
use ndarray::ArrayView2;
use std::sync::Arc;

pub use attn::{AttnDecoder, SingleCharDecoder};
pub use ctc::CtcDecoder;

/// One decoded reading of a sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Decoded text
    pub text: String,
    /// Display form of each decoded token, in order
    pub tokens: Vec<String>,
    /// Probabilities feeding the confidence score
    pub probs: Vec<f32>,
}

impl Candidate {
    pub fn new(tokens: Vec<String>, probs: Vec<f32>) -> Self {
        Self {
            text: tokens.concat(),
            tokens,
            probs,
        }
    }

    pub fn confidence(&self) -> f32 {
        confidence(&self.probs)
    }
}

/// Decoded output for one sample.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Text line readings, best first
    Line(Vec<Candidate>),
    /// Single character alternatives `(token, probability)`, best first
    Chars(Vec<(String, f32)>),
}

/// Decoding strategy over one sample's `(time, k)` top-k slices.
pub trait Decode {
    fn decode_sample(&self, indices: ArrayView2<usize>, probs: ArrayView2<f32>) -> Decoded;

    /// Decode every sample of a batch.
    fn decode(&self, topk: &TopK) -> Vec<Decoded> {
        (0..topk.batch_size())
            .map(|b| self.decode_sample(topk.sample_indices(b), topk.sample_probs(b)))
            .collect()
    }
}

/// Decoder selected once from the prediction head.
#[derive(Clone, Debug)]
pub enum Decoder {
    Classification(CtcDecoder),
    Attention(AttnDecoder),
    SingleChar(SingleCharDecoder),
}

impl Decoder {
    /// Pick the strategy for `vocab`'s head.
    ///
    /// An attention head with `batch_max_length == 1` reads single characters.
    pub fn new(
        vocab: Arc<Vocabulary>,
        batch_max_length: usize,
        ctc_confidence: CtcConfidence,
    ) -> Self {
        match vocab.head() {
            PredictionHead::Ctc => Decoder::Classification(CtcDecoder::new(vocab, ctc_confidence)),
            PredictionHead::Attn if batch_max_length == 1 => {
                Decoder::SingleChar(SingleCharDecoder::new(vocab))
            }
            PredictionHead::Attn => Decoder::Attention(AttnDecoder::new(vocab)),
        }
    }

    pub fn is_single_char(&self) -> bool {
        matches!(self, Decoder::SingleChar(_))
    }

    pub fn decode(&self, topk: &TopK) -> Vec<Decoded> {
        match self {
            Decoder::Classification(d) => d.decode(topk),
            Decoder::Attention(d) => d.decode(topk),
            Decoder::SingleChar(d) => d.decode(topk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(head: PredictionHead) -> Arc<Vocabulary> {
        Arc::new(Vocabulary::new("abc", head).unwrap())
    }

    #[test]
    fn selects_strategy_from_head_and_length() {
        let ctc = Decoder::new(vocab(PredictionHead::Ctc), 25, CtcConfidence::Emitted);
        let attn = Decoder::new(vocab(PredictionHead::Attn), 25, CtcConfidence::Emitted);
        let single = Decoder::new(vocab(PredictionHead::Attn), 1, CtcConfidence::Emitted);
        let ctc_single = Decoder::new(vocab(PredictionHead::Ctc), 1, CtcConfidence::Emitted);

        assert!(matches!(ctc, Decoder::Classification(_)));
        assert!(matches!(attn, Decoder::Attention(_)));
        assert!(single.is_single_char());
        assert!(matches!(ctc_single, Decoder::Classification(_)));
    }

    #[test]
    fn candidate_text_joins_tokens() {
        let candidate = Candidate::new(vec!["a".into(), "[s]".into()], vec![0.5, 0.5]);

        assert_eq!(candidate.text, "a[s]");
        assert_eq!(candidate.confidence(), 0.25);
    }
}
