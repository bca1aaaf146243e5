//! Schema sources: the parsed, not yet composed, form of one schema document
//!
//! A source names its types and elements by [`QName`]; type references are
//! resolved only when the composer merges sources into a
//! [`Schema`](super::schemas::Schema).

use indexmap::IndexMap;

use crate::error::Result;
use crate::namespaces::QName;

use super::complex_types::TypeContent;
use super::particles::Particle;
use super::simple_types::SimpleTypeConstraint;

/// Declarations of one schema document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSource {
    /// Label used in diagnostics (usually the file name)
    pub name: String,
    /// Target namespace of the declared components
    pub target_namespace: Option<String>,
    /// Named (or synthetic anonymous) types in declaration order
    pub types: IndexMap<QName, TypeContent<QName>>,
    /// Global elements and the names of their types, in declaration order
    pub elements: IndexMap<QName, QName>,
    /// Designated root element; defaults to the first global element
    pub root: Option<QName>,
}

impl SchemaSource {
    /// Create an empty source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Read an XSD-subset document
    pub fn from_str(name: impl Into<String>, xsd: &str) -> Result<Self> {
        super::parsing::parse_schema(name, xsd)
    }

    /// Set the target namespace
    pub fn with_target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// A name in this source's target namespace
    pub fn qname(&self, local_name: impl Into<String>) -> QName {
        QName::new(self.target_namespace.clone(), local_name)
    }

    /// Declare a type with element content
    pub fn with_complex_type(mut self, name: QName, model: impl Into<Particle<QName>>) -> Self {
        self.types.insert(name, TypeContent::Elements(model.into()));
        self
    }

    /// Declare a simple type
    pub fn with_simple_type(mut self, name: QName, constraint: SimpleTypeConstraint) -> Self {
        self.types.insert(name, TypeContent::Simple(constraint));
        self
    }

    /// Declare a global element of the named type
    pub fn with_element(mut self, name: QName, type_name: QName) -> Self {
        self.elements.insert(name, type_name);
        self
    }

    /// Designate the root element
    pub fn with_root(mut self, name: QName) -> Self {
        self.root = Some(name);
        self
    }

    /// The designated root, or the first global element
    pub fn root_element(&self) -> Option<&QName> {
        self.root.as_ref().or_else(|| self.elements.keys().next())
    }

    /// Number of wildcard extension points across all types
    pub fn extension_point_count(&self) -> usize {
        let mut count = 0;
        for content in self.types.values() {
            if let TypeContent::Elements(model) = content {
                model.walk(&mut |p| {
                    if matches!(p, Particle::Wildcard(_)) {
                        count += 1;
                    }
                });
            }
        }
        count
    }
}
