//! Schema composition
//!
//! Merges one base [`SchemaSource`] with an ordered list of extension
//! sources into a single immutable [`Schema`]. The base schema supplies the
//! root element and its types unchanged; extension sources contribute types
//! and global elements, and every global element of every extension becomes
//! a slot of each extension point (`xs:any`) declared by the base schema.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::limits::Limits;
use crate::namespaces::QName;

use super::complex_types::{TypeContent, TypeRef, XsdType};
use super::elements::ElementDecl;
use super::exceptions::SchemaError;
use super::schemas::Schema;
use super::simple_types::{builtin_constraint, SimpleTypeConstraint};
use super::sources::SchemaSource;

/// Builder that composes base and extension sources
#[derive(Debug, Clone)]
pub struct SchemaComposer {
    base: SchemaSource,
    extensions: Vec<SchemaSource>,
    limits: Limits,
}

impl SchemaComposer {
    /// Start composing from a base source
    pub fn new(base: SchemaSource) -> Self {
        Self {
            base,
            extensions: Vec::new(),
            limits: Limits::default(),
        }
    }

    /// Append an extension source
    pub fn with_extension(mut self, extension: SchemaSource) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Append extension sources in order
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = SchemaSource>) -> Self {
        self.extensions.extend(extensions);
        self
    }

    /// Set the limits for compilation and later validation
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The base source
    pub fn base(&self) -> &SchemaSource {
        &self.base
    }

    /// Extension sources in composition order
    pub fn extensions(&self) -> &[SchemaSource] {
        &self.extensions
    }

    /// Merge all sources into a schema
    pub fn compose(self) -> Result<Schema, SchemaError> {
        let root = self
            .base
            .root_element()
            .cloned()
            .ok_or_else(|| SchemaError::NoRootElement {
                origin: self.base.name.clone(),
            })?;

        debug!(
            base = %self.base.name,
            extensions = self.extensions.len(),
            root = %root,
            "composing schema"
        );

        let mut registry = Registry::default();
        let mut declared: Vec<(QName, TypeContent<QName>, &str)> = Vec::new();

        for source in std::iter::once(&self.base).chain(&self.extensions) {
            for (name, content) in &source.types {
                if registry.index.contains_key(name) {
                    return Err(SchemaError::DuplicateType {
                        name: name.clone(),
                        origin: source.name.clone(),
                    });
                }
                registry.index.insert(name.clone(), TypeRef(declared.len()));
                declared.push((name.clone(), content.clone(), &source.name));
            }
        }
        registry.declared = declared.len();

        let mut element_types: IndexMap<QName, (QName, &str)> = IndexMap::new();
        for source in std::iter::once(&self.base).chain(&self.extensions) {
            for (name, type_name) in &source.elements {
                if element_types.contains_key(name) {
                    return Err(SchemaError::DuplicateElement {
                        name: name.clone(),
                        origin: source.name.clone(),
                    });
                }
                element_types.insert(name.clone(), (type_name.clone(), &source.name));
            }
        }

        // Slots are added while types are still named by QName; resolution
        // below then covers slot types like any other reference.
        let mut slots_added = 0;
        for (_, content, _) in declared.iter_mut().take(self.base.types.len()) {
            if let TypeContent::Elements(model) = content {
                model.for_each_wildcard_mut(&mut |wildcard| {
                    for extension in &self.extensions {
                        for (name, type_name) in &extension.elements {
                            if wildcard.add_slot(name.clone(), type_name.clone()) {
                                slots_added += 1;
                            }
                        }
                    }
                });
            }
        }
        debug!(slots = slots_added, "resolved extension points");

        let mut elements = IndexMap::with_capacity(element_types.len());
        for (name, (type_name, origin)) in &element_types {
            let type_ref = registry.resolve(type_name, || {
                format!("element '{}' in '{}'", name, origin)
            })?;
            elements.insert(name.clone(), ElementDecl::new(name.clone(), type_ref));
        }

        let mut types = Vec::with_capacity(declared.len());
        for (name, content, origin) in &declared {
            let content = match content {
                TypeContent::Simple(constraint) => TypeContent::Simple(constraint.clone()),
                TypeContent::Elements(model) => TypeContent::Elements(model.try_map_refs(
                    &mut |type_name: &QName| {
                        registry.resolve(type_name, || format!("type '{}' in '{}'", name, origin))
                    },
                )?),
            };
            types.push(XsdType::new(name.clone(), content));
        }
        for (name, constraint) in registry.builtins {
            types.push(XsdType::new(name, TypeContent::Simple(constraint)));
        }

        let schema = Schema::new(types, elements, root, self.limits)?;
        debug!(schema = %schema, "schema composed");
        Ok(schema)
    }
}

/// Declared type handles plus lazily registered built-ins
#[derive(Default)]
struct Registry {
    index: HashMap<QName, TypeRef>,
    declared: usize,
    builtins: IndexMap<QName, SimpleTypeConstraint>,
}

impl Registry {
    fn resolve(
        &mut self,
        name: &QName,
        referenced_by: impl FnOnce() -> String,
    ) -> Result<TypeRef, SchemaError> {
        if let Some(type_ref) = self.index.get(name) {
            return Ok(*type_ref);
        }
        if let Some(i) = self.builtins.get_index_of(name) {
            return Ok(TypeRef(self.declared + i));
        }
        match builtin_constraint(name) {
            Some(constraint) => {
                let (i, _) = self.builtins.insert_full(name.clone(), constraint);
                Ok(TypeRef(self.declared + i))
            }
            None => Err(SchemaError::UnresolvedType {
                type_name: name.clone(),
                referenced_by: referenced_by(),
            }),
        }
    }
}
