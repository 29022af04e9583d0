//! Error types for Horizon Interact core data holders.

use std::fmt;

/// Errors that can occur while working with data nodes and property lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The node ID is invalid or the node has been removed from its storage.
    InvalidNodeId,
    /// The property was not found.
    PropertyNotFound(String),
    /// The property exists but holds a value of a different type.
    PropertyTypeMismatch {
        /// The property name.
        name: String,
        /// The expected type name.
        expected: &'static str,
        /// The type name actually stored.
        got: &'static str,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeId => write!(f, "Invalid or removed node ID"),
            Self::PropertyNotFound(name) => write!(f, "Property '{name}' not found"),
            Self::PropertyTypeMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Property '{name}' type mismatch: expected {expected}, got {got}"
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// A specialized Result type for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
