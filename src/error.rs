//! Error types for the flexcodec library.
//!
//! All fallible operations return [`Result`], whose error side is [`FlexCodecError`].
//! Dispatch failures ([`FlexCodecError::MalformedFieldTag`],
//! [`FlexCodecError::UnknownStrategyTag`], [`FlexCodecError::EmptyRegistry`]) carry the
//! field and the namespace involved so a misconfigured field name can be diagnosed from
//! the message alone.
//!
//! # Examples
//!
//! ```
//! use flexcodec::error::{FlexCodecError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(FlexCodecError::invalid_config("no strategies enabled"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::codec::namespace::FormatNamespace;
use crate::codec::tag::MalformedTagReason;

/// The main error type for flexcodec operations.
#[derive(Error, Debug)]
pub enum FlexCodecError {
    /// The field identifier does not carry a well-formed tag for the namespace.
    #[error("Malformed {namespace} tag in field '{field}': {reason}")]
    MalformedFieldTag {
        field: String,
        namespace: FormatNamespace,
        reason: MalformedTagReason,
    },

    /// The extracted tag has no registered strategy.
    #[error("Unknown {namespace} strategy tag '{tag}'{}", field_suffix(.field))]
    UnknownStrategyTag {
        namespace: FormatNamespace,
        tag: String,
        field: Option<String>,
    },

    /// A registry was constructed without any strategy.
    #[error("Empty {namespace} format registry")]
    EmptyRegistry { namespace: FormatNamespace },

    /// The same tag was registered twice in one namespace.
    #[error("Duplicate {namespace} strategy tag '{tag}'")]
    DuplicateStrategyTag {
        namespace: FormatNamespace,
        tag: String,
    },

    /// A reader resolved a different strategy than the one the writer recorded.
    #[error(
        "Field '{field}' was written with {namespace} format '{recorded}' but resolves to '{resolved}'"
    )]
    FormatMismatch {
        field: String,
        namespace: FormatNamespace,
        recorded: String,
        resolved: String,
    },

    /// A segment was written by a different codec than the one opening it.
    #[error("Segment written by codec '{found}', expected '{expected}'")]
    CodecMismatch { expected: String, found: String },

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoded data failed validation (bad magic, checksum, truncated payload).
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Field-related errors
    #[error("Field error: {0}")]
    Field(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" in field '{field}'"),
        None => String::new(),
    }
}

/// Result type alias for operations that may fail with FlexCodecError.
pub type Result<T> = std::result::Result<T, FlexCodecError>;

impl FlexCodecError {
    /// Create a new corrupt data error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        FlexCodecError::Corrupt(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        FlexCodecError::Storage(msg.into())
    }

    /// Create a new field error.
    pub fn field<S: Into<String>>(msg: S) -> Self {
        FlexCodecError::Field(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        FlexCodecError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FlexCodecError::Other(msg.into())
    }

    /// Attach the field being processed to an [`FlexCodecError::UnknownStrategyTag`].
    ///
    /// Other variants are returned unchanged.
    pub fn with_field(self, field: &str) -> Self {
        match self {
            FlexCodecError::UnknownStrategyTag {
                namespace,
                tag,
                field: None,
            } => FlexCodecError::UnknownStrategyTag {
                namespace,
                tag,
                field: Some(field.to_string()),
            },
            other => other,
        }
    }

    /// The namespace a dispatch error belongs to, if any.
    pub fn namespace(&self) -> Option<FormatNamespace> {
        match self {
            FlexCodecError::MalformedFieldTag { namespace, .. }
            | FlexCodecError::UnknownStrategyTag { namespace, .. }
            | FlexCodecError::EmptyRegistry { namespace }
            | FlexCodecError::DuplicateStrategyTag { namespace, .. }
            | FlexCodecError::FormatMismatch { namespace, .. } => Some(*namespace),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FlexCodecError::corrupt("bad magic");
        assert_eq!(error.to_string(), "Corrupt data: bad magic");

        let error = FlexCodecError::invalid_config("no strategies");
        assert_eq!(error.to_string(), "Invalid configuration: no strategies");
    }

    #[test]
    fn test_dispatch_error_messages_name_field_and_namespace() {
        let error = FlexCodecError::MalformedFieldTag {
            field: "plain_field".to_string(),
            namespace: FormatNamespace::Postings,
            reason: MalformedTagReason::MissingDelimiters,
        };
        let message = error.to_string();
        assert!(message.contains("plain_field"));
        assert!(message.contains("postings"));

        let error = FlexCodecError::UnknownStrategyTag {
            namespace: FormatNamespace::DocValues,
            tag: "nope".to_string(),
            field: None,
        }
        .with_field("x[nope]");
        assert_eq!(
            error.to_string(),
            "Unknown doc-values strategy tag 'nope' in field 'x[nope]'"
        );
        assert_eq!(error.namespace(), Some(FormatNamespace::DocValues));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = FlexCodecError::from(io_error);

        match error {
            FlexCodecError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
