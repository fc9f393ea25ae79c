//! Core types for glyphops-rec

use crate::decoder::Candidate;
use eyre::{Result, WrapErr};
use hf_hub::CacheRepo;
use hf_hub::api::sync::ApiRepo;
use ndarray::{Array2, Array3};
use std::path::PathBuf;

/// Raw network output for one batch.
#[derive(Clone, Debug)]
pub struct ModelOutput {
    /// Class scores `(batch, time, num_classes)`
    pub logits: Array3<f32>,
    /// Attention weights `(batch, steps, positions)`, attention heads only
    pub alphas: Option<Array3<f32>>,
}

/// Output of a single attention decoding step.
#[derive(Clone, Debug)]
pub struct StepOutput {
    /// Class scores `(batch, num_classes)`
    pub logits: Array2<f32>,
    /// Attention weights `(batch, positions)`
    pub alpha: Option<Array2<f32>>,
}

/// Text line reading for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePrediction {
    pub image: String,
    /// Best reading
    pub text: String,
    /// Confidence of the best reading
    pub confidence: f32,
    /// All k readings, best first
    pub candidates: Vec<Candidate>,
}

/// Top-k single character reading for one image.
#[derive(Clone, Debug, PartialEq)]
pub struct CharPrediction {
    pub image: String,
    pub chars: Vec<String>,
    pub probs: Vec<f32>,
}

/// Per-image output record.
#[derive(Clone, Debug, PartialEq)]
pub enum Prediction {
    Line(LinePrediction),
    Char(CharPrediction),
}

impl Prediction {
    pub fn image(&self) -> &str {
        match self {
            Prediction::Line(p) => &p.image,
            Prediction::Char(p) => &p.image,
        }
    }
}

/// Model repository sources.
#[derive(Debug)]
pub enum ModelRepo {
    /// Local filesystem path
    Path(PathBuf),
    /// HuggingFace cache repository
    Cache(CacheRepo),
    /// HuggingFace API repository
    Api(ApiRepo),
}

impl ModelRepo {
    /// Resolve a file name to its full path in this repository.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        match self {
            ModelRepo::Path(path) => path
                .join(file_name)
                .canonicalize()
                .wrap_err(format!("failed to resolve model: {file_name}")),
            ModelRepo::Cache(cache_repo) => {
                use eyre::OptionExt;
                cache_repo
                    .get(file_name)
                    .ok_or_eyre(format!("model not found in cache: {file_name}"))
            }
            ModelRepo::Api(api_repo) => api_repo
                .get(file_name)
                .wrap_err(format!("failed to download from api: {file_name}")),
        }
    }

    /// Try resolving multiple file names, return first successful match.
    pub fn resolve_any(&self, candidates: &[&str]) -> Result<PathBuf> {
        use eyre::OptionExt;
        candidates
            .iter()
            .find_map(|name| self.resolve(name).ok())
            .ok_or_eyre("no model found from candidates")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_local_files() {
        let dir = std::env::temp_dir().join("glyphops-repo-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("model.onnx"), b"").unwrap();

        let repo = ModelRepo::Path(dir);

        assert!(repo.resolve("model.onnx").is_ok());
        assert!(repo.resolve("missing.onnx").is_err());
        assert!(
            repo.resolve_any(&["missing.onnx", "model.onnx"])
                .unwrap()
                .ends_with("model.onnx")
        );
        assert!(repo.resolve_any(&["missing.onnx"]).is_err());
    }
}
