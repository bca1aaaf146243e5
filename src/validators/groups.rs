//! Model groups and element particles
//!
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use std::fmt;

use crate::namespaces::QName;

use super::particles::{Occurs, Particle};

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
}

impl ModelType {
    /// Parse from an XSD compositor local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
        }
    }
}

/// Element particle in a model group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementParticle<R> {
    /// Element name
    pub name: QName,
    /// Type the matched child is validated against
    pub type_ref: R,
    /// Occurrence constraints
    pub occurs: Occurs,
}

impl<R> ElementParticle<R> {
    /// Create a new element particle
    pub fn new(name: QName, type_ref: R, occurs: Occurs) -> Self {
        Self {
            name,
            type_ref,
            occurs,
        }
    }
}

/// Sequence or choice of particles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParticle<R> {
    /// Compositor
    pub model: ModelType,
    /// Particles in declaration order
    pub particles: Vec<Particle<R>>,
    /// Occurrence constraints
    pub occurs: Occurs,
}

impl<R> GroupParticle<R> {
    /// Create a group that occurs exactly once
    pub fn new(model: ModelType, particles: Vec<Particle<R>>) -> Self {
        Self {
            model,
            particles,
            occurs: Occurs::once(),
        }
    }

    /// An empty sequence: the content model of a type without child elements
    pub fn empty() -> Self {
        Self::new(ModelType::Sequence, Vec::new())
    }

    /// Set the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Number of direct particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True if the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// True if one pass over the group can match nothing, ignoring the
    /// group's own minOccurs.
    pub fn is_content_emptiable(&self) -> bool {
        match self.model {
            ModelType::Sequence => self.particles.iter().all(Particle::is_emptiable),
            // An empty choice matches nothing, not even the empty sequence.
            ModelType::Choice => self.particles.iter().any(Particle::is_emptiable),
        }
    }
}
