//! Limits and constraints for schema composition and validation
//!
//! Bounds on document nesting, input size and content-model size so that
//! neither a hostile document nor an oversized `maxOccurs` can exhaust the
//! stack or memory.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth walked by the validator
    pub max_depth: usize,

    /// Maximum size of a loaded schema or document, in bytes
    pub max_source_size: usize,

    /// Maximum number of automaton positions in one compiled content model
    pub max_model_positions: usize,

    /// Maximum number of types plus elements in a composed schema
    pub max_schema_components: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_source_size: 100 * 1024 * 1024, // 100 MB
            max_model_positions: 10_000,
            max_schema_components: 100_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_source_size: 10 * 1024 * 1024, // 10 MB
            max_model_positions: 1_000,
            max_schema_components: 10_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 10_000,
            max_source_size: 1024 * 1024 * 1024, // 1 GB
            max_model_positions: 1_000_000,
            max_schema_components: 1_000_000,
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum content-model size
    pub fn with_max_model_positions(mut self, positions: usize) -> Self {
        self.max_model_positions = positions;
        self
    }

    /// Check if a source size is within limits
    pub fn check_source_size(&self, size: usize) -> Result<()> {
        if size > self.max_source_size {
            Err(Error::LimitExceeded(format!(
                "source size {} bytes exceeds maximum {} bytes",
                size, self.max_source_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a document nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "element depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }
}
