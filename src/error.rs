//! Error types for xsdcheck
//!
//! Schema-construction failures ([`SchemaError`]) and document-validation
//! failures ([`ValidationError`]) live in `validators::exceptions`; this module
//! wraps them, together with I/O and parsing failures, in the crate-level
//! [`Error`].

use std::fmt;
use thiserror::Error;

use crate::validators::exceptions::{SchemaError, ValidationError};

/// Result type alias using xsdcheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdcheck operations
#[derive(Error, Debug)]
pub enum Error {
    /// The document does not conform to the schema
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The schema could not be composed or compiled
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A schema source could not be read
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Error raised while reading a schema source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Schema component the error refers to (e.g. `complexType 'activityType'`)
    pub location: Option<String>,
    /// Name of the schema source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource: {}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("unsupported schema component 'xs:attribute'")
            .with_location("complexType 'activityType'")
            .with_source("stgpx-schema-1.0.xsd");

        let msg = format!("{}", err);
        assert!(msg.contains("unsupported schema component"));
        assert!(msg.contains("Location: complexType 'activityType'"));
        assert!(msg.contains("Source: stgpx-schema-1.0.xsd"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = SchemaError::MissingRoot {
            name: QName::local("activity"),
        }
        .into();
        assert!(matches!(err, Error::Schema(_)));

        let err: Error = ParseError::new("bad").into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
