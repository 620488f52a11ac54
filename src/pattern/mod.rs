//! Pattern matching
//!
//! Patterns are either string literals or regular expressions (`regex`
//! syntax). Matches are anchored at the cursor, run over the text the source
//! exposes up to its next gap, and stop short of the innermost lexical
//! guard. An empty match counts as no match.

mod guard;

use smol_str::SmolStr;
use thiserror::Error;

pub use guard::find_guarded;

/// Pattern syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("invalid pattern `{pattern}`: {message}")]
    Invalid { pattern: SmolStr, message: String },
}

/// A compiled regex, anchored at the start of the text it is run on.
#[derive(Debug, Clone)]
pub struct Regex {
    source: SmolStr,
    anchored: regex::Regex,
}

impl Regex {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        let anchored =
            regex::Regex::new(&format!("^(?:{source})")).map_err(|error| PatternError::Invalid {
                pattern: source.into(),
                message: error.to_string(),
            })?;
        Ok(Self {
            source: source.into(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Regex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Regex {}

/// Something a source position can be matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Literal(SmolStr),
    Regex(Regex),
}

impl Pattern {
    pub fn literal(text: impl Into<SmolStr>) -> Self {
        Pattern::Literal(text.into())
    }

    pub fn regex(source: &str) -> Result<Self, PatternError> {
        Regex::new(source).map(Pattern::Regex)
    }

    /// The non-empty prefix of `text` this pattern matches.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        let len = match self {
            Pattern::Literal(literal) => text
                .starts_with(literal.as_str())
                .then_some(literal.len())?,
            Pattern::Regex(regex) => regex.anchored.find(text)?.end(),
        };
        (len > 0).then(|| &text[..len])
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Literal(text) => write!(f, "{text:?}"),
            Pattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
