//! Attention decoding: end-of-sequence pruning and single character readout.

use crate::decoder::{Candidate, Decode, Decoded};
use crate::vocab::Vocabulary;
use ndarray::{ArrayView2, Axis, s};
use std::sync::Arc;

/// Reads tokens step by step up to the first `[s]`.
///
/// Repeated tokens are kept as they are: consecutive equal outputs are
/// legitimate characters for an attention head.
#[derive(Clone, Debug)]
pub struct AttnDecoder {
    vocab: Arc<Vocabulary>,
    eos: usize,
}

impl AttnDecoder {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        let eos = vocab.eos_index().unwrap_or(usize::MAX);
        Self { vocab, eos }
    }

    /// Number of steps before the first `[s]` of the best reading.
    ///
    /// All candidates of a sample are cut at this length. Without any `[s]`
    /// the full sequence is kept.
    pub fn eos_position(&self, indices: ArrayView2<usize>) -> usize {
        let best = indices.column(0);
        best.iter()
            .position(|&index| index == self.eos)
            .unwrap_or(best.len())
    }
}

impl Decode for AttnDecoder {
    fn decode_sample(&self, indices: ArrayView2<usize>, probs: ArrayView2<f32>) -> Decoded {
        let end = self.eos_position(indices);

        tracing::trace!(end, steps = indices.nrows(), "pruned at end of sequence");

        let indices = indices.slice(s![..end, ..]);
        let probs = probs.slice(s![..end, ..]);

        let candidates = indices
            .axis_iter(Axis(1))
            .zip(probs.axis_iter(Axis(1)))
            .map(|(indices, probs)| {
                let tokens = indices
                    .iter()
                    .filter_map(|&index| self.vocab.token(index))
                    .map(str::to_string)
                    .collect();
                Candidate::new(tokens, probs.to_vec())
            })
            .collect();

        Decoded::Line(candidates)
    }
}

/// Reads the k alternatives of the first step as separate characters.
#[derive(Clone, Debug)]
pub struct SingleCharDecoder {
    vocab: Arc<Vocabulary>,
}

impl SingleCharDecoder {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }
}

impl Decode for SingleCharDecoder {
    fn decode_sample(&self, indices: ArrayView2<usize>, probs: ArrayView2<f32>) -> Decoded {
        let chars = indices
            .row(0)
            .iter()
            .zip(probs.row(0).iter())
            .map(|(&index, &p)| (self.vocab.token(index).unwrap_or_default().to_string(), p))
            .collect();

        Decoded::Chars(chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictionHead;
    use crate::topk::select_topk;
    use ndarray::{Array2, Array3, array};

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::new("abctxyz", PredictionHead::Attn).unwrap())
    }

    /// `(steps, 1)` index column for `text`, `[s]` spelled as `#`.
    fn column(vocab: &Vocabulary, text: &str) -> Array2<usize> {
        let indices: Vec<usize> = text
            .chars()
            .map(|c| match c {
                '#' => vocab.eos_index().unwrap(),
                c => vocab.char_to_index(c).unwrap(),
            })
            .collect();
        Array2::from_shape_vec((indices.len(), 1), indices).unwrap()
    }

    #[test]
    fn prunes_at_first_end_of_sequence() {
        let vocab = vocab();
        let decoder = AttnDecoder::new(vocab.clone());
        let indices = column(&vocab, "cat#xyz");
        let probs = Array2::from_shape_vec((7, 1), vec![0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3]).unwrap();

        let Decoded::Line(candidates) = decoder.decode_sample(indices.view(), probs.view()) else {
            panic!("expected line output");
        };

        assert_eq!(candidates[0].text, "cat");
        assert_eq!(candidates[0].probs, vec![0.9f32, 0.8, 0.7]);
        assert!((candidates[0].confidence() - 0.504).abs() < 1e-6);
    }

    #[test]
    fn keeps_repeated_characters() {
        let vocab = vocab();
        let decoder = AttnDecoder::new(vocab.clone());
        let indices = column(&vocab, "aab#");
        let probs = Array2::from_elem((4, 1), 1.0f32);

        let Decoded::Line(candidates) = decoder.decode_sample(indices.view(), probs.view()) else {
            panic!("expected line output");
        };

        assert_eq!(candidates[0].text, "aab");
    }

    #[test]
    fn keeps_everything_without_end_of_sequence() {
        let vocab = vocab();
        let decoder = AttnDecoder::new(vocab.clone());
        let indices = column(&vocab, "abc");

        assert_eq!(decoder.eos_position(indices.view()), 3);
    }

    #[test]
    fn immediate_end_of_sequence_scores_zero() {
        let vocab = vocab();
        let decoder = AttnDecoder::new(vocab.clone());
        let indices = column(&vocab, "#ab");
        let probs = Array2::from_elem((3, 1), 0.9f32);

        let Decoded::Line(candidates) = decoder.decode_sample(indices.view(), probs.view()) else {
            panic!("expected line output");
        };

        assert_eq!(candidates[0].text, "");
        assert_eq!(candidates[0].confidence(), 0.0);
    }

    #[test]
    fn all_candidates_share_best_truncation() {
        let vocab = vocab();
        let decoder = AttnDecoder::new(vocab.clone());
        let a = vocab.char_to_index('a').unwrap();
        let b = vocab.char_to_index('b').unwrap();
        let c = vocab.char_to_index('c').unwrap();
        let eos = vocab.eos_index().unwrap();
        // Best reading "ab[s]", second reading "bca" never ends.
        let indices = array![[a, b], [b, c], [eos, a]];
        let probs = array![[0.9f32, 0.1], [0.8, 0.2], [0.7, 0.3]];

        let Decoded::Line(candidates) = decoder.decode_sample(indices.view(), probs.view()) else {
            panic!("expected line output");
        };

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "ab");
        assert_eq!(candidates[1].text, "bc");
        assert_eq!(candidates[1].probs, vec![0.1f32, 0.2]);
    }

    #[test]
    fn single_char_mode_yields_k_pairs() {
        let vocab = vocab();
        let decoder = SingleCharDecoder::new(vocab.clone());
        let mut probs = Array3::<f32>::zeros((2, 2, vocab.len()));
        probs[[0, 0, vocab.char_to_index('x').unwrap()]] = 0.6;
        probs[[0, 0, vocab.char_to_index('y').unwrap()]] = 0.3;
        probs[[0, 0, vocab.char_to_index('z').unwrap()]] = 0.1;
        probs[[1, 0, vocab.char_to_index('a').unwrap()]] = 1.0;
        let topk = select_topk(probs.view(), 3).unwrap();

        let decoded = decoder.decode(&topk);

        assert_eq!(decoded.len(), 2);
        for sample in &decoded {
            let Decoded::Chars(chars) = sample else {
                panic!("expected single character output");
            };
            assert_eq!(chars.len(), 3);
        }
        let Decoded::Chars(first) = &decoded[0] else {
            unreachable!()
        };
        assert_eq!(first[0], ("x".to_string(), 0.6));
        assert_eq!(first[1], ("y".to_string(), 0.3));
    }
}
