//! Global element declarations

use crate::namespaces::QName;

use super::complex_types::TypeRef;

/// A named, reusable element definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    /// Element name
    pub name: QName,
    /// Type of the element's content
    pub type_ref: TypeRef,
}

impl ElementDecl {
    /// Create a new element declaration
    pub fn new(name: QName, type_ref: TypeRef) -> Self {
        Self { name, type_ref }
    }
}
