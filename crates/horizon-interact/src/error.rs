//! Error types for the interaction engine.

use std::path::PathBuf;

/// Result type alias for interaction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading interaction resources.
///
/// Dispatch never produces errors: an event that cannot be handled is an
/// ordinary `false` from `handle_event`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A behavior or configuration resource could not be located.
    ///
    /// This is a packaging problem and the only fatal load-time error.
    #[error("Resource '{path}' not found in module '{module}'")]
    ResourceNotFound { module: String, path: String },

    /// A resource exists but could not be read.
    #[error("Failed to read resource '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML document is not well formed.
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// The behavior document is well formed but describes an invalid graph.
    #[error("Invalid behavior '{name}': {message}")]
    InvalidBehavior { name: String, message: String },

    /// An event variant names an event class the factory cannot create.
    #[error("Unknown event class '{0}'")]
    UnknownEventClass(String),

    /// An event variant attribute has a value the factory does not understand.
    #[error("Invalid value '{value}' for event attribute '{name}'")]
    InvalidAttribute { name: String, value: String },
}

impl Error {
    /// Create a resource-not-found error.
    pub fn resource_not_found(module: impl Into<String>, path: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            module: module.into(),
            path: path.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an XML syntax error.
    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid-behavior error.
    pub fn invalid_behavior(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBehavior {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-attribute error.
    pub fn invalid_attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether this error must abort loading instead of being reported as a
    /// recoverable parse failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}
