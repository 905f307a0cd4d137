//! Style engine errors

use stacker_attr::AttrError;
use stacker_dom::DomError;
use stacker_rules::{RuleError, SelectorError};

/// Result type for style engine operations
pub type StyleResult<T> = Result<T, StyleError>;

/// Any failure surfaced by the style engine API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error(transparent)]
    Attr(#[from] AttrError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl StyleError {
    /// Negative integer code of the underlying error
    pub fn code(&self) -> i32 {
        match self {
            Self::Attr(e) => e.code(),
            Self::Selector(e) => e.code(),
            Self::Rule(e) => e.code(),
            Self::Dom(e) => e.code(),
        }
    }
}
