//! Content-model particles
//!
//! A particle is one node of a content model: an element, a wildcard
//! extension point, or a sequence/choice group, each carrying occurrence
//! bounds. [`Particle`] is generic over how it refers to types so that the
//! same shape serves schema sources (`QName` references, resolved later) and
//! the composed schema ([`TypeRef`] handles).
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use std::fmt;

use crate::error::{ParseError, Result};

use super::complex_types::TypeRef;
use super::groups::{ElementParticle, GroupParticle};
use super::wildcards::WildcardParticle;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if particle has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if maxOccurs is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Check if the bounds are consistent (minOccurs <= maxOccurs)
    pub fn is_consistent(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "minOccurs={} maxOccurs={}", self.min, max),
            None => write!(f, "minOccurs={} maxOccurs=unbounded", self.min),
        }
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    match max_occurs.map(str::trim) {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseError::new(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?;
            if occurs.min > max {
                return Err(ParseError::new(
                    "maxOccurs must be 'unbounded' or greater than minOccurs",
                )
                .into());
            }
            occurs.max = Some(max);
        }
        None if occurs.min > 1 => {
            return Err(
                ParseError::new("minOccurs must be lesser or equal than maxOccurs").into(),
            );
        }
        None => {}
    }

    Ok(occurs)
}

/// A node in a content model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Particle<R = TypeRef> {
    /// A named child element of a declared type
    Element(ElementParticle<R>),
    /// An extension point accepting elements contributed by extension schemas
    Wildcard(WildcardParticle<R>),
    /// A nested sequence or choice
    Group(GroupParticle<R>),
}

impl<R> Particle<R> {
    /// Get the occurrence bounds
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Element(e) => e.occurs,
            Self::Wildcard(w) => w.occurs,
            Self::Group(g) => g.occurs,
        }
    }

    /// True if the particle can match an empty child sequence
    pub fn is_emptiable(&self) -> bool {
        match self {
            Self::Element(e) => e.occurs.is_emptiable(),
            Self::Wildcard(w) => w.occurs.is_emptiable(),
            Self::Group(g) => g.occurs.is_emptiable() || g.is_content_emptiable(),
        }
    }

    /// Convert every type reference, stopping at the first failure.
    pub fn try_map_refs<S, E, F>(&self, f: &mut F) -> std::result::Result<Particle<S>, E>
    where
        F: FnMut(&R) -> std::result::Result<S, E>,
    {
        Ok(match self {
            Self::Element(e) => Particle::Element(ElementParticle {
                name: e.name.clone(),
                type_ref: f(&e.type_ref)?,
                occurs: e.occurs,
            }),
            Self::Wildcard(w) => {
                let mut slots = indexmap::IndexMap::with_capacity(w.slots.len());
                for (name, type_ref) in &w.slots {
                    slots.insert(name.clone(), f(type_ref)?);
                }
                Particle::Wildcard(WildcardParticle {
                    slots,
                    occurs: w.occurs,
                })
            }
            Self::Group(g) => {
                let mut particles = Vec::with_capacity(g.particles.len());
                for p in &g.particles {
                    particles.push(p.try_map_refs(f)?);
                }
                Particle::Group(GroupParticle {
                    model: g.model,
                    particles,
                    occurs: g.occurs,
                })
            }
        })
    }

    /// Visit every wildcard in the model, depth-first in declaration order.
    pub fn for_each_wildcard_mut(&mut self, f: &mut impl FnMut(&mut WildcardParticle<R>)) {
        match self {
            Self::Element(_) => {}
            Self::Wildcard(w) => f(w),
            Self::Group(g) => {
                for p in &mut g.particles {
                    p.for_each_wildcard_mut(f);
                }
            }
        }
    }

    /// Visit every particle (including `self`), depth-first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Particle<R>)) {
        f(self);
        if let Self::Group(g) = self {
            for p in &g.particles {
                p.walk(f);
            }
        }
    }
}

impl<R> From<ElementParticle<R>> for Particle<R> {
    fn from(p: ElementParticle<R>) -> Self {
        Self::Element(p)
    }
}

impl<R> From<WildcardParticle<R>> for Particle<R> {
    fn from(p: WildcardParticle<R>) -> Self {
        Self::Wildcard(p)
    }
}

impl<R> From<GroupParticle<R>> for Particle<R> {
    fn from(p: GroupParticle<R>) -> Self {
        Self::Group(p)
    }
}
