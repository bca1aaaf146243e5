//! Schema-construction and document-validation errors
//!
//! Two classes, handled differently: a [`SchemaError`] means the schema
//! itself must be fixed and is reported before any document is read; a
//! [`ValidationError`] is the ordinary result of validating a document that
//! does not conform, and is returned as data.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::namespaces::QName;

use super::complex_types::TypeRef;
use super::particles::Occurs;
use super::simple_types::SimpleTypeConstraint;

/// Fatal error while composing or compiling a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A type name used by an element or particle is not declared
    #[error("type '{type_name}' referenced by {referenced_by} is not declared")]
    UnresolvedType {
        /// The missing type
        type_name: QName,
        /// The component that referenced it
        referenced_by: String,
    },

    /// A type handle points outside the type arena
    #[error("type handle {type_ref} referenced by {referenced_by} does not resolve")]
    UnresolvedTypeRef {
        /// The dangling handle
        type_ref: TypeRef,
        /// The component that referenced it
        referenced_by: String,
    },

    /// A type name is declared twice
    #[error("type '{name}' from '{origin}' redefines an existing type")]
    DuplicateType {
        /// The colliding type name
        name: QName,
        /// Schema source that attempted the redefinition
        origin: String,
    },

    /// A global element name is declared twice
    #[error("element '{name}' from '{origin}' redefines an existing element")]
    DuplicateElement {
        /// The colliding element name
        name: QName,
        /// Schema source that attempted the redefinition
        origin: String,
    },

    /// Two particles reachable from the same point accept the same tag
    #[error("content model of type '{type_name}' is ambiguous: more than one particle accepts '{tag}'")]
    AmbiguousContentModel {
        /// Type owning the content model
        type_name: QName,
        /// Tag accepted by more than one particle
        tag: QName,
    },

    /// Some reachable point of the content model can never be completed
    #[error("content model of type '{type_name}' cannot be satisfied by any child sequence")]
    UnsatisfiableContentModel {
        /// Type owning the content model
        type_name: QName,
    },

    /// Unrolled occurrence bounds exceed the configured limit
    #[error("content model of type '{type_name}' needs {positions} positions, limit is {limit}")]
    ContentModelTooLarge {
        /// Type owning the content model
        type_name: QName,
        /// Positions required so far
        positions: usize,
        /// Configured maximum
        limit: usize,
    },

    /// minOccurs is greater than maxOccurs
    #[error("particle in type '{type_name}' has inconsistent bounds ({occurs})")]
    InvalidOccurs {
        /// Type owning the particle
        type_name: QName,
        /// Offending bounds
        occurs: Occurs,
    },

    /// The designated root element is not declared
    #[error("root element '{name}' is not declared")]
    MissingRoot {
        /// The designated root name
        name: QName,
    },

    /// The base schema declares no global element to use as root
    #[error("schema '{origin}' declares no global element")]
    NoRootElement {
        /// Schema source without elements
        origin: String,
    },

    /// The composed schema is larger than the configured limit
    #[error("schema has {count} components, limit is {limit}")]
    TooManyComponents {
        /// Types plus elements
        count: usize,
        /// Configured maximum
        limit: usize,
    },
}

/// The particle a document was missing when its children ran out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum ExpectedParticle {
    /// A named element
    Element(QName),
    /// Any element contributed by an extension schema
    Extension,
}

impl fmt::Display for ExpectedParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(name) => write!(f, "Tag '{}' expected.", name),
            Self::Extension => write!(f, "An extension element expected."),
        }
    }
}

/// Why a document failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ValidationReason {
    /// A child that no particle at the current point accepts
    UnexpectedChild {
        /// The child's tag
        tag: QName,
        /// Zero-based index of the child among its siblings
        position: usize,
        /// True if the rejecting point offered a resolved extension point
        in_wildcard: bool,
    },
    /// The children ran out before the content model was complete
    MissingRequiredChild {
        /// Element whose content is incomplete
        parent: QName,
        /// First particle of the shortest completion
        expected: ExpectedParticle,
    },
    /// The document root is not the schema's root element
    TagMismatch {
        /// Declared root
        expected: QName,
        /// Actual root tag
        actual: QName,
    },
    /// Leaf text violates the element's simple type
    LeafConstraintViolation {
        /// Offending element
        element: QName,
        /// Text as found (empty if absent)
        value: String,
        /// The violated constraint
        constraint: SimpleTypeConstraint,
        /// Human-readable detail
        detail: String,
    },
    /// Character data inside an element-only type
    UnexpectedText {
        /// Offending element
        element: QName,
        /// The trimmed text
        text: String,
    },
    /// The document nests deeper than the configured limit
    DepthLimitExceeded {
        /// Configured maximum depth
        limit: usize,
    },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChild {
                tag,
                in_wildcard: true,
                ..
            } => write!(f, "element '{}' not found", tag),
            Self::UnexpectedChild { tag, position, .. } => write!(
                f,
                "Unexpected child with tag '{}' at position {}.",
                tag,
                position + 1
            ),
            Self::MissingRequiredChild { parent, expected } => write!(
                f,
                "The content of element '{}' is not complete. {}",
                parent, expected
            ),
            Self::TagMismatch { expected, actual } => write!(
                f,
                "Unexpected root element '{}', expected '{}'.",
                actual, expected
            ),
            Self::LeafConstraintViolation {
                element,
                value,
                detail,
                ..
            } => write!(
                f,
                "invalid value '{}' for element '{}': {}",
                value, element, detail
            ),
            Self::UnexpectedText { element, text } => write!(
                f,
                "character data '{}' not allowed in element '{}'",
                text, element
            ),
            Self::DepthLimitExceeded { limit } => {
                write!(f, "document nesting exceeds the maximum depth of {}", limit)
            }
        }
    }
}

/// First point where a document diverges from the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Tags from the root to the node the reason refers to
    pub path: Vec<QName>,
    /// What went wrong
    pub reason: ValidationReason,
}

impl ValidationError {
    /// Create a new validation error at `path`
    pub fn new(path: Vec<QName>, reason: ValidationReason) -> Self {
        Self { path, reason }
    }

    /// The rendered reason, in the historical message shapes
    pub fn message(&self) -> String {
        self.reason.to_string()
    }

    /// Index of the offending child, for child-sequence failures
    pub fn position(&self) -> Option<usize> {
        match self.reason {
            ValidationReason::UnexpectedChild { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Path rendered with local names, e.g. `/activity/extension`
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        self.path
            .iter()
            .map(|name| format!("/{}", name.local_name))
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        write!(f, "\n\nPath: {}", self.path_string())
    }
}

impl std::error::Error for ValidationError {}
