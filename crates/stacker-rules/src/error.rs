//! Selector and rule errors

use stacker_attr::AttrError;

/// Selector parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    /// Misplaced comma or an empty clause
    #[error("ill-formed selector")]
    IllFormed,
    /// Too many parts in a clause, or too many qualifiers on a part
    #[error("selector clause too long")]
    TooLong,
    #[error("missing class name after '.' or ':'")]
    MissingClass,
    #[error("invalid character {ch:?} at offset {offset}")]
    InvalidChar { offset: usize, ch: char },
}

impl SelectorError {
    pub fn code(self) -> i32 {
        match self {
            Self::Empty => -7,
            Self::IllFormed => -8,
            Self::TooLong => -9,
            Self::MissingClass => -10,
            Self::InvalidChar { .. } => -11,
        }
    }
}

/// Rule operation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Attr(#[from] AttrError),
    /// A rule was created without a selector
    #[error("rule has no selector")]
    MissingSelector,
    /// The handle refers to a destroyed rule
    #[error("no such rule")]
    NoSuchRule,
}

impl RuleError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Selector(e) => e.code(),
            Self::Attr(e) => e.code(),
            Self::MissingSelector => -12,
            Self::NoSuchRule => -13,
        }
    }
}

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;
