//! Resource loading utilities
//!
//! Loads schema sources and documents from local files, enforcing the size
//! limit. Remote locations are refused: the engine performs no network I/O.

use std::fs;

use tracing::debug;

use crate::documents::{Document, SchemaLocationHint};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use crate::validators::parsing::parse_schema_with_limits;
use crate::validators::sources::SchemaSource;

/// Resource loader for schemas and documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits applied to loaded resources
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                let metadata = fs::metadata(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;
                self.limits
                    .check_source_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX))?;

                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;
                self.limits.check_source_size(content.len())?;

                debug!(location = %location, bytes = content.len(), "loaded resource");
                Ok(content)
            }
            Location::Url(url) => Err(Error::Resource(format!(
                "Remote resource '{}' cannot be loaded; use a local copy",
                url
            ))),
        }
    }

    /// Load and parse a schema source, labelled with its file name
    pub fn load_schema(&self, location: &Location) -> Result<SchemaSource> {
        let xsd = self.load(location)?;
        parse_schema_with_limits(location.file_name(), &xsd, &self.limits)
    }

    /// Load and parse a document
    pub fn load_document(&self, location: &Location) -> Result<Document> {
        let xml = self.load(location)?;
        Document::parse_with_limits(xml.as_bytes(), &self.limits)
    }

    /// Load the extension schemas a hint names, resolved against the
    /// location of the document carrying it
    pub fn load_hinted_extensions(
        &self,
        document: &Location,
        hint: &SchemaLocationHint,
    ) -> Result<Vec<SchemaSource>> {
        hint.extension_locations()
            .iter()
            .map(|reference| self.load_schema(&document.resolve(reference)?))
            .collect()
    }
}

/// Load and parse a schema source with default limits
pub fn load_schema(location: &Location) -> Result<SchemaSource> {
    Loader::new().load_schema(location)
}
