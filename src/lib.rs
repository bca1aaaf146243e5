//! # xsdcheck
//!
//! Structural XML validation against composable schemas.
//!
//! A base schema declares a root element, nested content models and
//! extension points (`xs:any`); extension schemas contribute the elements
//! those extension points accept. The composed schema validates document
//! trees and reports the first point of divergence.
//!
//! ## Features
//!
//! - XSD subset reader (sequence, choice, occurrence bounds, `xs:any`,
//!   string/enumeration/dateTime simple types)
//! - Schema composition with extension points
//! - Deterministic content models with Unique Particle Attribution checks
//! - First-divergence diagnostics, renderable as text or JSON
//! - Limits on input size, nesting depth and content-model size
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdcheck::{Document, SchemaComposer, SchemaSource};
//!
//! let base = SchemaSource::from_str("base.xsd", &std::fs::read_to_string("base.xsd")?)?;
//! let extension = SchemaSource::from_str("extension.xsd", &std::fs::read_to_string("extension.xsd")?)?;
//! let schema = SchemaComposer::new(base).with_extension(extension).compose()?;
//!
//! let doc = Document::from_string(&std::fs::read_to_string("activity.xml")?)?;
//! match schema.validate(doc.root()) {
//!     Ok(()) => println!("The XML document is valid."),
//!     Err(err) => println!("The XML document is invalid:\n{}", err),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and locations
pub mod namespaces;
pub mod names;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// Schemas and validation
pub mod validators;

// Re-exports for convenience
pub use documents::{Document, DocumentNode, SchemaLocationHint};
pub use error::{Error, ParseError, Result};
pub use limits::Limits;
pub use loaders::{load_schema, Loader};
pub use locations::Location;
pub use namespaces::{NamespaceContext, QName};
pub use validators::{
    Schema, SchemaComposer, SchemaError, SchemaSource, SimpleTypeConstraint, ValidationError,
    ValidationReason,
};

/// Version of the xsdcheck library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
