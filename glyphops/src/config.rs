//! Resolution of model and charset arguments for `glyph rec`.

use crate::cli::{CharsetArgs, ModelArgs, ModelSource};
use eyre::Result;
use glyphops_rec::types::ModelRepo;
use glyphops_rec::vocab::CharsetSource;
use hf_hub::Cache;
use hf_hub::api::sync::Api;
use std::path::PathBuf;

/// Where the exported recognition graphs are read from.
#[derive(Debug)]
pub struct ModelConfig {
    pub repo: ModelRepo,
}

impl TryFrom<ModelArgs> for ModelConfig {
    type Error = eyre::Error;

    fn try_from(args: ModelArgs) -> Result<Self> {
        let ModelArgs {
            model_id,
            model_source,
        } = args;

        let repo = match model_source {
            ModelSource::Auto if PathBuf::from(&model_id).is_dir() => {
                ModelRepo::Path(model_id.into())
            }
            ModelSource::Path => ModelRepo::Path(model_id.into()),
            ModelSource::Cache => ModelRepo::Cache(Cache::from_env().model(model_id)),
            ModelSource::Auto | ModelSource::Api => ModelRepo::Api(Api::new()?.model(model_id)),
        };

        tracing::debug!(?repo, "model repository");

        Ok(Self { repo })
    }
}

/// Prefix marking a charset tier name instead of a literal alphabet.
const TIER_PREFIX: &str = "CN-";

impl TryFrom<CharsetArgs> for CharsetSource {
    type Error = eyre::Error;

    /// A tier name wins over `--sensitive`, which wins over a literal alphabet.
    fn try_from(args: CharsetArgs) -> Result<Self> {
        if args.character.starts_with(TIER_PREFIX) {
            return Ok(CharsetSource::Tier {
                tier: args.character.parse()?,
                dir: args.charset_dir,
            });
        }

        if args.sensitive {
            return Ok(CharsetSource::Sensitive);
        }

        Ok(CharsetSource::Alphabet(args.character))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphops_rec::vocab::CharsetTier;

    fn charset(character: &str, sensitive: bool) -> CharsetArgs {
        CharsetArgs {
            character: character.to_string(),
            charset_dir: PathBuf::from("charset"),
            sensitive,
        }
    }

    #[test]
    fn resolves_literal_alphabet() {
        let source = CharsetSource::try_from(charset("abc", false)).unwrap();

        assert_eq!(source, CharsetSource::Alphabet("abc".to_string()));
    }

    #[test]
    fn resolves_charset_tier() {
        let source = CharsetSource::try_from(charset("CN-l", false)).unwrap();

        assert_eq!(
            source,
            CharsetSource::Tier {
                tier: CharsetTier::Large,
                dir: PathBuf::from("charset"),
            }
        );
    }

    #[test]
    fn rejects_unknown_tier() {
        assert!(CharsetSource::try_from(charset("CN-xxl", false)).is_err());
    }

    #[test]
    fn tier_takes_precedence_over_sensitive() {
        let source = CharsetSource::try_from(charset("CN-s", true)).unwrap();

        assert_eq!(
            source,
            CharsetSource::Tier {
                tier: CharsetTier::Small,
                dir: PathBuf::from("charset"),
            }
        );
    }

    #[test]
    fn sensitive_overrides_literal_alphabet() {
        let source = CharsetSource::try_from(charset("abc", true)).unwrap();

        assert_eq!(source, CharsetSource::Sensitive);
    }

    #[test]
    fn resolves_local_model_path() {
        let args = ModelArgs {
            model_id: "model_dir".to_string(),
            model_source: ModelSource::Path,
        };

        let config = ModelConfig::try_from(args).unwrap();

        assert!(matches!(config.repo, ModelRepo::Path(p) if p == PathBuf::from("model_dir")));
    }
}
