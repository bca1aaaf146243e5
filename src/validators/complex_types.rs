//! Schema types and the handles that refer to them
//!
//! Types live in an arena owned by the [`Schema`](super::schemas::Schema) and
//! are referred to by [`TypeRef`]. Content models point at other types only
//! through handles, so recursive and mutually recursive types need no
//! structural embedding.

use std::fmt;

use serde::Serialize;

use crate::namespaces::QName;

use super::groups::GroupParticle;
use super::particles::Particle;
use super::simple_types::SimpleTypeConstraint;

/// Handle of a type in the schema's type arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeRef(pub(crate) usize);

impl TypeRef {
    /// Position of the type in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a type allows inside an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeContent<R = TypeRef> {
    /// Text only, checked against a constraint
    Simple(SimpleTypeConstraint),
    /// Child elements only, described by a content model
    Elements(Particle<R>),
}

impl<R> TypeContent<R> {
    /// Element-only content with no allowed children
    pub fn empty() -> Self {
        Self::Elements(GroupParticle::empty().into())
    }

    /// The content model, if the type has element content
    pub fn model(&self) -> Option<&Particle<R>> {
        match self {
            Self::Elements(model) => Some(model),
            Self::Simple(_) => None,
        }
    }

    /// The leaf constraint, if the type is simple
    pub fn constraint(&self) -> Option<&SimpleTypeConstraint> {
        match self {
            Self::Simple(constraint) => Some(constraint),
            Self::Elements(_) => None,
        }
    }
}

/// A named type in the composed schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdType {
    /// Declared name, or a synthetic `element@type` name for anonymous types
    pub name: QName,
    /// Allowed content
    pub content: TypeContent,
}

impl XsdType {
    /// Create a new type
    pub fn new(name: QName, content: TypeContent) -> Self {
        Self { name, content }
    }

    /// True if the type validates leaf text
    pub fn is_simple(&self) -> bool {
        matches!(self.content, TypeContent::Simple(_))
    }

    /// Every type handle the content model refers to, in declaration order
    pub fn referenced_types(&self) -> Vec<TypeRef> {
        let mut refs = Vec::new();
        if let TypeContent::Elements(model) = &self.content {
            model.walk(&mut |particle| match particle {
                Particle::Element(e) => refs.push(e.type_ref),
                Particle::Wildcard(w) => refs.extend(w.slots.values().copied()),
                Particle::Group(_) => {}
            });
        }
        refs
    }
}
