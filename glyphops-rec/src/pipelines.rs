//! High-level recognition pipeline.

use crate::config::{PredictionHead, RecognizerConfig};
use crate::decoder::{Decoded, Decoder};
use crate::error::{ConfigError, ImageError, ModelError, Result};
use crate::preprocessor::LinePreprocessor;
use crate::topk::{select_topk, softmax};
use crate::traits::RecognitionModel;
use crate::types::{CharPrediction, LinePrediction, Prediction};
use crate::vocab::Vocabulary;
use ndarray::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Default number of images per forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 192;

/// Image-to-text recognizer.
///
/// Owns the network, the vocabulary it was trained with, and the decoder
/// selected from the prediction head. Batches are processed one at a time.
pub struct Recognizer<M> {
    model: M,
    vocab: Arc<Vocabulary>,
    decoder: Decoder,
    preprocessor: LinePreprocessor,
    config: RecognizerConfig,
}

impl<M: RecognitionModel> Recognizer<M> {
    /// Build a recognizer, validating the configuration against `vocab`.
    pub fn new(model: M, vocab: Vocabulary, config: RecognizerConfig) -> Result<Self> {
        config.validate(vocab.len())?;

        if vocab.head() != config.architecture.prediction {
            return Err(ConfigError::HeadMismatch {
                vocab: vocab.head(),
                model: config.architecture.prediction,
            }
            .into());
        }

        let vocab = Arc::new(vocab);
        let decoder = Decoder::new(
            vocab.clone(),
            config.batch_max_length,
            config.ctc_confidence,
        );
        let preprocessor = LinePreprocessor::from_config(&config);

        tracing::debug!(
            %vocab,
            orientation = ?config.orientation,
            single_char = decoder.is_single_char(),
            "recognizer ready"
        );

        Ok(Self {
            model,
            vocab,
            decoder,
            preprocessor,
            config,
        })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn preprocessor(&self) -> &LinePreprocessor {
        &self.preprocessor
    }

    /// Whether predictions are single character alternatives.
    pub fn is_single_char(&self) -> bool {
        self.decoder.is_single_char()
    }

    /// Token sequence fed alongside the images, start token in every slot.
    fn initial_tokens(&self, batch: usize) -> Array2<i64> {
        let start = match self.vocab.head() {
            PredictionHead::Ctc => self.vocab.blank_index(),
            PredictionHead::Attn => self.vocab.go_index().unwrap_or(0),
        };
        Array2::from_elem((batch, self.config.num_steps()), start as i64)
    }

    /// Recognize a preprocessed `(batch, channels, height, width)` tensor.
    ///
    /// `ids` names each sample in the output records, one per image.
    pub fn recognize(&mut self, images: ArrayView4<f32>, ids: &[String]) -> Result<Vec<Prediction>> {
        let batch = images.len_of(Axis(0));
        if ids.len() != batch {
            return Err(ImageError::IdCountMismatch {
                images: batch,
                ids: ids.len(),
            }
            .into());
        }

        let text = self.initial_tokens(batch);

        let output = self.model.forward(images, text.view())?;
        let (got_batch, steps, num_classes) = output.logits.dim();

        if got_batch != batch {
            return Err(ModelError::BatchSizeMismatch {
                expected: batch,
                got: got_batch,
            }
            .into());
        }
        if num_classes != self.vocab.len() {
            return Err(ModelError::ClassCountMismatch {
                expected: self.vocab.len(),
                got: num_classes,
            }
            .into());
        }

        let non_finite = output.logits.iter().filter(|x| !x.is_finite()).count();
        if non_finite > 0 {
            return Err(ModelError::NonFiniteOutput { count: non_finite }.into());
        }

        tracing::debug!(batch, steps, num_classes, "decoding batch");

        let probs = softmax(output.logits.view());
        let topk = select_topk(probs.view(), self.config.top_k)?;
        let decoded = self.decoder.decode(&topk);

        Ok(ids
            .iter()
            .zip(decoded)
            .map(|(id, decoded)| to_prediction(id.clone(), decoded))
            .collect())
    }

    /// Load, preprocess and recognize image files in batches of `batch_size`.
    pub fn recognize_files(
        &mut self,
        paths: &[PathBuf],
        batch_size: usize,
    ) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(paths.len());

        for (i, chunk) in paths.chunks(batch_size.max(1)).enumerate() {
            tracing::debug!(batch = i + 1, images = chunk.len(), "recognizing batch");

            let images = self.preprocessor.load_batch(chunk)?;
            let ids: Vec<String> = chunk.iter().map(|p| p.display().to_string()).collect();

            predictions.extend(self.recognize(images.view(), &ids)?);
        }

        Ok(predictions)
    }
}

fn to_prediction(image: String, decoded: Decoded) -> Prediction {
    match decoded {
        Decoded::Line(candidates) => {
            let (text, confidence) = candidates
                .first()
                .map(|best| (best.text.clone(), best.confidence()))
                .unwrap_or_default();
            Prediction::Line(LinePrediction {
                image,
                text,
                confidence,
                candidates,
            })
        }
        Decoded::Chars(pairs) => {
            let (chars, probs) = pairs.into_iter().unzip();
            Prediction::Char(CharPrediction {
                image,
                chars,
                probs,
            })
        }
    }
}
