//! Tree operation errors

/// Result type for tree operations
pub type DomResult<T> = Result<T, DomError>;

/// Tree operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node does not exist or was destroyed
    #[error("node not found")]
    NotFound,
    /// Insertion would create a cycle, or the parent cannot hold children
    #[error("hierarchy request error")]
    HierarchyRequest,
    /// Reference node is not a child of the given parent
    #[error("node is not a child")]
    NotAChild,
}

impl DomError {
    pub fn code(self) -> i32 {
        match self {
            Self::NotFound => -14,
            Self::HierarchyRequest => -15,
            Self::NotAChild => -16,
        }
    }
}
