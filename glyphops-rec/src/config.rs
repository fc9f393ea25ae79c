//! Recognizer configuration: network stages and decoding options.
//!
//! Stage names are parsed with [`FromStr`] so that an unsupported name fails
//! at startup with a [`ConfigError`], before any image is touched.

use crate::error::ConfigError;
use crate::preprocessor::ResizeMode;
use std::fmt;
use std::str::FromStr;

/// Default text line height fed to the network.
pub const DEFAULT_IMG_H: u32 = 32;

/// Default text line width fed to the network.
pub const DEFAULT_IMG_W: u32 = 100;

/// Default maximum label length.
pub const DEFAULT_BATCH_MAX_LENGTH: usize = 25;

/// Prediction stage, which also selects the decoding strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictionHead {
    /// Alignment-free classification over every timestep
    Ctc,
    /// Step-wise attention decoder
    Attn,
}

impl PredictionHead {
    /// Number of reserved control tokens at the front of the vocabulary.
    pub fn reserved_tokens(self) -> usize {
        match self {
            PredictionHead::Ctc => 1,
            PredictionHead::Attn => 3,
        }
    }
}

impl FromStr for PredictionHead {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CTC" => Ok(PredictionHead::Ctc),
            "Attn" => Ok(PredictionHead::Attn),
            _ => Err(ConfigError::UnsupportedPrediction(s.to_string())),
        }
    }
}

impl fmt::Display for PredictionHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionHead::Ctc => f.write_str("CTC"),
            PredictionHead::Attn => f.write_str("Attn"),
        }
    }
}

/// Geometric rectification stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transformation {
    None,
    /// Thin-plate-spline spatial transformer
    Tps { num_fiducial: usize },
}

impl FromStr for Transformation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Transformation::None),
            "TPS" => Ok(Transformation::Tps { num_fiducial: 20 }),
            _ => Err(ConfigError::UnsupportedTransformation(s.to_string())),
        }
    }
}

/// Convolutional feature extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureExtraction {
    Vgg,
    Rcnn,
    ResNet,
    ResNet29,
    ResNet50,
    ResNet100,
}

impl FromStr for FeatureExtraction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VGG" => Ok(FeatureExtraction::Vgg),
            "RCNN" => Ok(FeatureExtraction::Rcnn),
            "ResNet" => Ok(FeatureExtraction::ResNet),
            "ResNet29" => Ok(FeatureExtraction::ResNet29),
            "ResNet50" => Ok(FeatureExtraction::ResNet50),
            "ResNet100" => Ok(FeatureExtraction::ResNet100),
            _ => Err(ConfigError::UnsupportedFeatureExtraction(s.to_string())),
        }
    }
}

/// Contextual sequence modeling stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceModeling {
    None,
    BiLstm,
}

impl FromStr for SequenceModeling {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(SequenceModeling::None),
            "BiLSTM" => Ok(SequenceModeling::BiLstm),
            _ => Err(ConfigError::UnsupportedSequenceModeling(s.to_string())),
        }
    }
}

/// Reading direction of the cropped text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageOrientation {
    #[default]
    Horizontal,
    Vertical,
    /// Single character crops
    Single,
}

impl FromStr for PageOrientation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(PageOrientation::Horizontal),
            "vertical" => Ok(PageOrientation::Vertical),
            "single" => Ok(PageOrientation::Single),
            _ => Err(ConfigError::UnsupportedOrientation(s.to_string())),
        }
    }
}

/// The four network stages.
///
/// Only [`Architecture::prediction`] changes what the core does; the other
/// stages are baked into the exported graph and are recorded for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Architecture {
    pub transformation: Transformation,
    pub feature_extraction: FeatureExtraction,
    pub sequence_modeling: SequenceModeling,
    pub prediction: PredictionHead,
}

impl Architecture {
    /// Parse all four stages from their names.
    pub fn parse(
        transformation: &str,
        feature_extraction: &str,
        sequence_modeling: &str,
        prediction: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transformation: transformation.parse()?,
            feature_extraction: feature_extraction.parse()?,
            sequence_modeling: sequence_modeling.parse()?,
            prediction: prediction.parse()?,
        })
    }
}

/// Which per-timestep probabilities feed a CTC candidate's confidence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CtcConfidence {
    /// The first `n` timestep probabilities, `n` being the decoded length
    #[default]
    Prefix,
    /// Probability at the first timestep of every emitted run
    Emitted,
}

/// Immutable recognizer configuration, passed in at construction.
#[derive(Clone, Debug)]
pub struct RecognizerConfig {
    pub architecture: Architecture,
    pub orientation: PageOrientation,
    pub img_h: u32,
    pub img_w: u32,
    /// Three-channel input instead of grayscale
    pub rgb: bool,
    pub resize: ResizeMode,
    pub batch_max_length: usize,
    pub top_k: usize,
    pub ctc_confidence: CtcConfidence,
}

impl RecognizerConfig {
    /// Configuration with default geometry and decoding options.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            orientation: PageOrientation::default(),
            img_h: DEFAULT_IMG_H,
            img_w: DEFAULT_IMG_W,
            rgb: false,
            resize: ResizeMode::default(),
            batch_max_length: DEFAULT_BATCH_MAX_LENGTH,
            top_k: 1,
            ctc_confidence: CtcConfidence::default(),
        }
    }

    /// Decoding steps run by an attention head (`batch_max_length + 1`).
    pub fn num_steps(&self) -> usize {
        self.batch_max_length + 1
    }

    /// Reject option combinations that cannot produce predictions for a
    /// vocabulary of `num_classes`.
    pub fn validate(&self, num_classes: usize) -> Result<(), ConfigError> {
        if self.batch_max_length == 0 {
            return Err(ConfigError::InvalidMaxLength);
        }
        if self.top_k == 0 || self.top_k > num_classes {
            return Err(ConfigError::InvalidTopK {
                k: self.top_k,
                num_classes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_architecture() {
        let arch = Architecture::parse("TPS", "ResNet", "BiLSTM", "Attn").unwrap();

        assert_eq!(arch.transformation, Transformation::Tps { num_fiducial: 20 });
        assert_eq!(arch.feature_extraction, FeatureExtraction::ResNet);
        assert_eq!(arch.sequence_modeling, SequenceModeling::BiLstm);
        assert_eq!(arch.prediction, PredictionHead::Attn);
    }

    #[test]
    fn rejects_unknown_prediction_head() {
        let err = Architecture::parse("None", "VGG", "None", "Transformer").unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedPrediction(name) if name == "Transformer"));
    }

    #[test]
    fn rejects_unknown_feature_extractor() {
        let err = "ResNet18".parse::<FeatureExtraction>().unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedFeatureExtraction(_)));
    }

    #[test]
    fn reserved_tokens_per_head() {
        assert_eq!(PredictionHead::Ctc.reserved_tokens(), 1);
        assert_eq!(PredictionHead::Attn.reserved_tokens(), 3);
    }

    #[test]
    fn validate_rejects_zero_length() {
        let arch = Architecture::parse("None", "VGG", "BiLSTM", "CTC").unwrap();
        let mut config = RecognizerConfig::new(arch);
        config.batch_max_length = 0;

        assert!(matches!(
            config.validate(37),
            Err(ConfigError::InvalidMaxLength)
        ));
    }

    #[test]
    fn validate_rejects_topk_beyond_vocabulary() {
        let arch = Architecture::parse("None", "VGG", "BiLSTM", "CTC").unwrap();
        let mut config = RecognizerConfig::new(arch);
        config.top_k = 5;

        assert!(config.validate(5).is_ok());
        assert!(matches!(
            config.validate(4),
            Err(ConfigError::InvalidTopK { k: 5, num_classes: 4 })
        ));
    }
}
