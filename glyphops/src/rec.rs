//! Rec subcommand - recognize text line crops in an image folder.

use crate::cli::{CharsetArgs, ConfidenceSource, ModelArgs};
use crate::config::ModelConfig;
use crate::report;
use color_eyre::Section;
use eyre::{Context, Result, eyre};
use glyphops_rec::config::{
    Architecture, FeatureExtraction, PageOrientation, PredictionHead, RecognizerConfig,
    SequenceModeling, Transformation,
};
use glyphops_rec::models::OnnxModel;
use glyphops_rec::pipelines::{DEFAULT_BATCH_SIZE, Recognizer};
use glyphops_rec::preprocessor::{ResizeMode, discover_images};
use glyphops_rec::vocab::{CharsetSource, Vocabulary};
#[allow(unused_imports)]
use ort::execution_providers::*;
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// CLI arguments for text recognition.
#[derive(clap::Args, Debug)]
pub struct Args {
    /// Folder with cropped text line images
    pub image_folder: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Transformation stage (None or TPS)
    #[arg(long, default_value = "TPS")]
    pub transformation: Transformation,

    /// Feature extraction stage (VGG, RCNN, ResNet, ResNet29, ResNet50, ResNet100)
    #[arg(long, default_value = "ResNet")]
    pub feature_extraction: FeatureExtraction,

    /// Sequence modeling stage (None or BiLSTM)
    #[arg(long, default_value = "BiLSTM")]
    pub sequence_modeling: SequenceModeling,

    /// Prediction stage (CTC or Attn)
    #[arg(long, default_value = "Attn")]
    pub prediction: PredictionHead,

    #[command(flatten)]
    pub charset: CharsetArgs,

    /// Feed three-channel images
    #[arg(long)]
    pub rgb: bool,

    /// Keep the aspect ratio and pad instead of stretching
    #[arg(long)]
    pub pad: bool,

    /// Input height
    #[arg(long, default_value_t = glyphops_rec::config::DEFAULT_IMG_H)]
    pub img_h: u32,

    /// Input width
    #[arg(long, default_value_t = glyphops_rec::config::DEFAULT_IMG_W)]
    pub img_w: u32,

    /// Maximum label length; 1 reads single characters
    #[arg(long, default_value_t = glyphops_rec::config::DEFAULT_BATCH_MAX_LENGTH)]
    pub batch_max_length: usize,

    /// Images per forward pass
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Number of candidates per image
    #[arg(long, default_value_t = 1)]
    pub top_k: usize,

    /// Reading direction (horizontal, vertical, single)
    #[arg(long, default_value = "horizontal")]
    pub page_orient: PageOrientation,

    /// Probabilities that feed a CTC confidence score
    #[arg(long, value_enum, default_value_t)]
    pub ctc_confidence: ConfidenceSource,

    /// Append the report to this file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

/// Resolved configuration for text recognition.
#[derive(Debug)]
pub struct Config {
    pub image_folder: PathBuf,
    pub model: ModelConfig,
    pub charset: CharsetSource,
    pub recognizer: RecognizerConfig,
    pub batch_size: usize,
    pub log: Option<PathBuf>,
}

impl TryFrom<Args> for Config {
    type Error = eyre::Error;

    fn try_from(args: Args) -> Result<Self> {
        let architecture = Architecture {
            transformation: args.transformation,
            feature_extraction: args.feature_extraction,
            sequence_modeling: args.sequence_modeling,
            prediction: args.prediction,
        };

        let mut recognizer = RecognizerConfig::new(architecture);
        recognizer.orientation = args.page_orient;
        recognizer.img_h = args.img_h;
        recognizer.img_w = args.img_w;
        recognizer.rgb = args.rgb;
        recognizer.resize = if args.pad {
            ResizeMode::KeepRatioPad
        } else {
            ResizeMode::Stretch
        };
        recognizer.batch_max_length = args.batch_max_length;
        recognizer.top_k = args.top_k;
        recognizer.ctc_confidence = args.ctc_confidence.into();

        Ok(Self {
            image_folder: args.image_folder,
            model: args.model.try_into()?,
            charset: args.charset.try_into()?,
            recognizer,
            batch_size: args.batch_size,
            log: args.log,
        })
    }
}

pub fn execute(config: Config) -> Result<()> {
    let paths = discover_images(&config.image_folder).wrap_err_with(|| {
        format!("failed to scan images: {:?}", config.image_folder.display())
    })?;

    if paths.is_empty() {
        let e = eyre!("no images found in {:?}", config.image_folder.display())
            .suggestion("supported extensions are jpg, jpeg and png");
        return Err(e);
    }

    tracing::info!(
        folder = ?config.image_folder.display(),
        images = paths.len(),
        orientation = ?config.recognizer.orientation,
        "recognizing text"
    );

    let architecture = config.recognizer.architecture;
    let top_k = config.recognizer.top_k;

    let vocab = Vocabulary::from_source(&config.charset, architecture.prediction)
        .wrap_err("failed to build vocabulary")?;

    tracing::info!(classes = vocab.len(), head = %vocab.head(), "vocabulary loaded");

    let s = Instant::now();

    let model = OnnxModel::from_repo(&config.model.repo, &architecture, session_builder()?)?;
    let mut recognizer = Recognizer::new(model, vocab, config.recognizer)?;

    let d = s.elapsed();
    tracing::info!(duration = %format_secs(d.as_secs_f32()), "model loaded");

    let s = Instant::now();

    let predictions = recognizer
        .recognize_files(&paths, config.batch_size)
        .wrap_err("recognition failed")?;

    let d = s.elapsed();
    tracing::info!(duration = %format_secs(d.as_secs_f32()), "inference completed");

    let report = report::render(&predictions, recognizer.is_single_char(), top_k > 1);

    print!("{report}");

    if let Some(log) = config.log.as_deref() {
        append_log(log, &report)?;
    }

    Ok(())
}

/// Append a rendered report to the result log.
fn append_log(path: &Path, report: &str) -> Result<()> {
    tracing::info!(path = ?path.display(), "append result log");

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(report.as_bytes()))
        .wrap_err_with(|| format!("failed to write log: {:?}", path.display()))
}

/// Session builder shared by every recognition graph of a run.
///
/// Providers compiled in through the `cuda`, `tensorrt`, `openvino`,
/// `directml` and `coreml` features are tried in that order before CPU.
fn session_builder() -> Result<SessionBuilder> {
    let builder = Session::builder()?.with_execution_providers([
        #[cfg(feature = "cuda")]
        CUDAExecutionProvider::default().build(),
        #[cfg(feature = "tensorrt")]
        TensorRTExecutionProvider::default().build(),
        #[cfg(feature = "openvino")]
        OpenVINOExecutionProvider::default()
            .with_device_type("HETERO:GPU,CPU")
            .with_cache_dir(".cache/ort")
            .build(),
        #[cfg(feature = "directml")]
        DirectMLExecutionProvider::default().build(),
        #[cfg(feature = "coreml")]
        CoreMLExecutionProvider::default().build(),
    ])?;

    Ok(builder)
}

/// Format seconds as a string with two decimal places.
fn format_secs(secs: f32) -> String {
    format!("{:.2}s", secs)
}
