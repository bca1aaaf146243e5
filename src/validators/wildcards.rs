//! Wildcard extension points
//!
//! An `xs:any` in a base schema is an extension point. It carries no
//! namespace or processContents rules of its own: what it accepts is exactly
//! the ordered set of element slots the composer appends from extension
//! schemas. With no extension schemas the slot list stays empty and the
//! wildcard accepts nothing.

use indexmap::IndexMap;

use crate::namespaces::QName;

use super::particles::Occurs;

/// Extension-point particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardParticle<R> {
    /// Accepted element names and the type each one is validated against,
    /// in composition order
    pub slots: IndexMap<QName, R>,
    /// Occurrence constraints
    pub occurs: Occurs,
}

impl<R> WildcardParticle<R> {
    /// Create an unresolved extension point
    pub fn new(occurs: Occurs) -> Self {
        Self {
            slots: IndexMap::new(),
            occurs,
        }
    }

    /// True until the composer has added at least one slot
    pub fn is_unresolved(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a slot; an existing slot for the same name is kept
    pub fn add_slot(&mut self, name: QName, type_ref: R) -> bool {
        if self.slots.contains_key(&name) {
            return false;
        }
        self.slots.insert(name, type_ref);
        true
    }

    /// Resolve a child tag to the type of the slot that accepts it
    pub fn resolve(&self, tag: &QName) -> Option<&R> {
        self.slots.get(tag)
    }

    /// True if some slot accepts the tag
    pub fn matches(&self, tag: &QName) -> bool {
        self.slots.contains_key(tag)
    }
}
