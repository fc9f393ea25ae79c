//! glyphops-rec: scene-text line recognition with trait-based model access.
//!
//! This crate turns per-step class distributions from a text recognition
//! network into strings and confidence scores, for alignment-free (CTC) and
//! attention heads.
//!
//! # Architecture
//!
//! - [`vocab::Vocabulary`]: character/index mapping with reserved control tokens
//! - [`topk::select_topk`]: k best classes per timestep
//! - [`decoder::Decoder`]: CTC collapsing, attention end-of-sequence pruning,
//!   or single character readout, selected once from the prediction head
//! - [`confidence::confidence`]: cumulative product of character probabilities
//! - [`traits::RecognitionModel`]: the network, realized by [`models::OnnxModel`]
//!
//! # Quick Start
//!
//! ```ignore
//! use glyphops_rec::config::{Architecture, RecognizerConfig};
//! use glyphops_rec::models::OnnxModel;
//! use glyphops_rec::pipelines::Recognizer;
//! use glyphops_rec::types::ModelRepo;
//! use glyphops_rec::vocab::{DEFAULT_ALPHABET, Vocabulary};
//! use ort::session::Session;
//!
//! let arch = Architecture::parse("TPS", "ResNet", "BiLSTM", "Attn")?;
//! let vocab = Vocabulary::new(DEFAULT_ALPHABET, arch.prediction)?;
//! let repo = ModelRepo::Path("model_dir".into());
//! let model = OnnxModel::from_repo(&repo, &arch, Session::builder()?)?;
//!
//! let mut recognizer = Recognizer::new(model, vocab, RecognizerConfig::new(arch))?;
//! let predictions = recognizer.recognize_files(&["word.png".into()], 192)?;
//! ```

pub mod confidence;
pub mod config;
pub mod decoder;
pub mod error;
pub mod models;
pub mod pipelines;
pub mod preprocessor;
pub mod topk;
pub mod traits;
pub mod types;
pub mod vocab;
