//! Schema model, composition and validation
//!
//! Leaves first: particles and types describe a schema, the composer merges
//! schema sources into an immutable [`Schema`], content models are compiled
//! into deterministic automata, and the document validator walks a tree
//! against them.

// Schema model
pub mod particles;
pub mod groups;
pub mod wildcards;
pub mod simple_types;
pub mod complex_types;
pub mod elements;
pub mod schemas;

// Sources and composition
pub mod sources;
pub mod parsing;
pub mod composer;

// Matching and validation
pub mod models;
pub mod document_validation;
pub mod exceptions;

// Re-exports
pub use complex_types::{TypeContent, TypeRef, XsdType};
pub use composer::SchemaComposer;
pub use document_validation::DocumentValidator;
pub use elements::ElementDecl;
pub use exceptions::{ExpectedParticle, SchemaError, ValidationError, ValidationReason};
pub use groups::{ElementParticle, GroupParticle, ModelType};
pub use models::{Attribution, ContentModel, MatchedParticle, Rejection, RejectionKind};
pub use parsing::{parse_schema, parse_schema_with_limits};
pub use particles::{Occurs, Particle};
pub use schemas::Schema;
pub use simple_types::SimpleTypeConstraint;
pub use sources::SchemaSource;
pub use wildcards::WildcardParticle;
