//! Character vocabulary shared by training and inference.
//!
//! Index layout must match the checkpoint exactly. Reserved control tokens
//! occupy the lowest indices and characters follow in source order:
//!
//! | head | 0            | 1      | 2     | 3..          |
//! |------|--------------|--------|-------|--------------|
//! | CTC  | `[CTCblank]` | chars  |       |              |
//! | Attn | `[PAD]`      | `[GO]` | `[s]` | chars        |

use crate::config::PredictionHead;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CTC_BLANK: &str = "[CTCblank]";
pub const PAD: &str = "[PAD]";
pub const GO: &str = "[GO]";
pub const EOS: &str = "[s]";

/// Default alphabet: digits and lowercase latin letters.
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Named charset file tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharsetTier {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl CharsetTier {
    /// File name of this tier inside a charset directory.
    pub fn file_name(self) -> &'static str {
        match self {
            CharsetTier::Small => "charset_s.txt",
            CharsetTier::Medium => "charset_m.txt",
            CharsetTier::Large => "charset_l.txt",
            CharsetTier::ExtraLarge => "charset_xl.txt",
        }
    }
}

impl FromStr for CharsetTier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CN-s" => Ok(CharsetTier::Small),
            "CN-m" => Ok(CharsetTier::Medium),
            "CN-l" => Ok(CharsetTier::Large),
            "CN-xl" => Ok(CharsetTier::ExtraLarge),
            _ => Err(ConfigError::UnsupportedCharset(s.to_string())),
        }
    }
}

/// Where the character list comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharsetSource {
    /// Explicit alphabet string
    Alphabet(String),
    /// Tiered charset file inside `dir`
    Tier { tier: CharsetTier, dir: PathBuf },
    /// 94 printable ASCII characters
    Sensitive,
}

impl CharsetSource {
    /// Resolve the source to its ordered character list.
    pub fn load(&self) -> Result<String, ConfigError> {
        match self {
            CharsetSource::Alphabet(alphabet) => Ok(alphabet.clone()),
            CharsetSource::Tier { tier, dir } => read_charset_file(&dir.join(tier.file_name())),
            CharsetSource::Sensitive => Ok(sensitive_alphabet()),
        }
    }
}

/// Printable ASCII without the trailing whitespace characters, in
/// digits, lowercase, uppercase, punctuation order.
pub fn sensitive_alphabet() -> String {
    let digits = '0'..='9';
    let lower = 'a'..='z';
    let upper = 'A'..='Z';
    let punctuation = (b'!'..=b'~')
        .map(char::from)
        .filter(|c| c.is_ascii_punctuation());

    digits.chain(lower).chain(upper).chain(punctuation).collect()
}

/// Read a charset file: one entry per line, whitespace stripped, lines
/// concatenated in file order.
pub fn read_charset_file(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CharsetFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content.lines().map(str::trim).collect())
}

/// Bidirectional mapping between characters and class indices.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    head: PredictionHead,
    tokens: Vec<String>,
    index: HashMap<char, usize>,
}

impl Vocabulary {
    /// Build a vocabulary for `head` from an ordered alphabet.
    ///
    /// Repeated characters keep their first position.
    pub fn new(alphabet: &str, head: PredictionHead) -> Result<Self, ConfigError> {
        let mut tokens: Vec<String> = match head {
            PredictionHead::Ctc => vec![CTC_BLANK.to_string()],
            PredictionHead::Attn => vec![PAD.to_string(), GO.to_string(), EOS.to_string()],
        };
        let mut index = HashMap::new();

        for c in alphabet.chars() {
            if !index.contains_key(&c) {
                index.insert(c, tokens.len());
                tokens.push(c.to_string());
            }
        }

        if index.is_empty() {
            return Err(ConfigError::EmptyCharset);
        }

        tracing::debug!(%head, size = tokens.len(), "built vocabulary");

        Ok(Self {
            head,
            tokens,
            index,
        })
    }

    /// Build a vocabulary from a configured charset source.
    pub fn from_source(source: &CharsetSource, head: PredictionHead) -> Result<Self, ConfigError> {
        Self::new(&source.load()?, head)
    }

    /// Build a vocabulary from a charset file.
    pub fn from_file(path: impl AsRef<Path>, head: PredictionHead) -> Result<Self, ConfigError> {
        Self::new(&read_charset_file(path.as_ref())?, head)
    }

    pub fn head(&self) -> PredictionHead {
        self.head
    }

    /// Number of classes, control tokens included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Character at `index`, or `None` for control tokens and out-of-range indices.
    pub fn index_to_char(&self, index: usize) -> Option<char> {
        if index < self.head.reserved_tokens() {
            return None;
        }
        self.tokens.get(index)?.chars().next()
    }

    pub fn char_to_index(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    /// Display form of `index`, control tokens rendered by name.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Blank index of a CTC vocabulary, pad index of an attention one.
    pub fn blank_index(&self) -> usize {
        0
    }

    /// Start token fed to the first attention step.
    pub fn go_index(&self) -> Option<usize> {
        match self.head {
            PredictionHead::Ctc => None,
            PredictionHead::Attn => Some(1),
        }
    }

    /// End-of-sequence token of an attention vocabulary.
    pub fn eos_index(&self) -> Option<usize> {
        match self.head {
            PredictionHead::Ctc => None,
            PredictionHead::Attn => Some(2),
        }
    }

    /// Iterate over the characters in index order, control tokens excluded.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.tokens[self.head.reserved_tokens()..]
            .iter()
            .filter_map(|t| t.chars().next())
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vocabulary ({} classes)", self.head, self.len())
    }
}
