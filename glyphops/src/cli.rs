//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use eyre::Result;
use glyphops_rec::config::CtcConfidence;
use glyphops_rec::vocab::DEFAULT_ALPHABET;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "glyph")]
#[command(about = "Scene-text line recognition tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recognize text in every image of a folder
    Rec(crate::rec::Args),
}

/// Where to look up the model repository.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ModelSource {
    /// Local directory if it exists, otherwise the Hugging Face Hub
    #[default]
    Auto,
    /// Local directory
    Path,
    /// Hugging Face cache only
    Cache,
    /// Hugging Face Hub
    Api,
}

/// Model location arguments.
#[derive(clap::Args, Debug)]
pub struct ModelArgs {
    /// Model directory or Hugging Face repository id
    #[arg(short, long = "model")]
    pub model_id: String,

    #[arg(long, value_enum, default_value_t)]
    pub model_source: ModelSource,
}

/// Character set arguments.
#[derive(clap::Args, Debug)]
pub struct CharsetArgs {
    /// Alphabet, or a charset tier name (CN-s, CN-m, CN-l, CN-xl)
    #[arg(long, default_value = DEFAULT_ALPHABET)]
    pub character: String,

    /// Directory holding charset tier files
    #[arg(long, default_value = "charset")]
    pub charset_dir: PathBuf,

    /// Use the 94 printable ASCII characters
    #[arg(long)]
    pub sensitive: bool,
}

/// Probabilities that feed a CTC confidence score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfidenceSource {
    /// First n timesteps, n being the decoded length
    #[default]
    Prefix,
    /// First timestep of each emitted character
    Emitted,
}

impl From<ConfidenceSource> for CtcConfidence {
    fn from(source: ConfidenceSource) -> Self {
        match source {
            ConfidenceSource::Emitted => CtcConfidence::Emitted,
            ConfidenceSource::Prefix => CtcConfidence::Prefix,
        }
    }
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Rec(args) => crate::rec::execute(args.try_into()?),
    }
}
