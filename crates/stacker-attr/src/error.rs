//! Attribute errors
//!
//! All failures are values. A failed store leaves the target buffer untouched.

/// Result type for attribute operations
pub type AttrResult<T> = Result<T, AttrError>;

/// Attribute validation and folding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    /// Unknown attribute name
    #[error("no such attribute")]
    NoSuchAttribute,
    /// Operator not supported by the attribute's semantic
    #[error("invalid operation for attribute")]
    InvalidOperation,
    /// Value type does not fit the attribute
    #[error("type mismatch")]
    TypeMismatch,
    /// Value outside the permitted range
    #[error("value out of bounds")]
    OutOfBounds,
    /// The two operations cannot be composed into one record
    #[error("cannot fold operations")]
    CannotFold,
    /// A record header or payload could not be decoded
    #[error("malformed attribute record")]
    Malformed,
}

impl AttrError {
    /// Negative integer code for hosts using the "<= 0 is failure" convention
    pub fn code(self) -> i32 {
        match self {
            Self::NoSuchAttribute => -1,
            Self::InvalidOperation => -2,
            Self::TypeMismatch => -3,
            Self::OutOfBounds => -4,
            Self::CannotFold => -5,
            Self::Malformed => -6,
        }
    }
}
