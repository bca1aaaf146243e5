//! The composed schema
//!
//! A [`Schema`] owns the type arena, the global element declarations, the
//! designated root element and one compiled [`ContentModel`] per
//! element-content type. It is built once (normally by the
//! [`SchemaComposer`](super::composer::SchemaComposer)) and only read
//! afterwards, so one instance can validate any number of documents, from
//! any number of threads.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::documents::DocumentNode;
use crate::limits::Limits;
use crate::namespaces::QName;

use super::complex_types::{TypeContent, TypeRef, XsdType};
use super::document_validation::DocumentValidator;
use super::elements::ElementDecl;
use super::exceptions::{SchemaError, ValidationError};
use super::models::ContentModel;

/// Immutable, composed schema
#[derive(Debug, Clone)]
pub struct Schema {
    types: Vec<XsdType>,
    type_index: HashMap<QName, TypeRef>,
    elements: IndexMap<QName, ElementDecl>,
    root: QName,
    models: Vec<Option<ContentModel>>,
    limits: Limits,
}

impl Schema {
    /// Assemble a schema, checking every reference and compiling every
    /// content model.
    pub fn new(
        types: Vec<XsdType>,
        elements: IndexMap<QName, ElementDecl>,
        root: QName,
        limits: Limits,
    ) -> Result<Self, SchemaError> {
        let count = types.len() + elements.len();
        if count > limits.max_schema_components {
            return Err(SchemaError::TooManyComponents {
                count,
                limit: limits.max_schema_components,
            });
        }

        let check = |type_ref: TypeRef, referenced_by: &dyn Fn() -> String| {
            if type_ref.index() < types.len() {
                Ok(())
            } else {
                Err(SchemaError::UnresolvedTypeRef {
                    type_ref,
                    referenced_by: referenced_by(),
                })
            }
        };

        for decl in elements.values() {
            check(decl.type_ref, &|| format!("element '{}'", decl.name))?;
        }
        for ty in &types {
            for type_ref in ty.referenced_types() {
                check(type_ref, &|| format!("type '{}'", ty.name))?;
            }
        }
        if !elements.contains_key(&root) {
            return Err(SchemaError::MissingRoot { name: root });
        }

        let mut models = Vec::with_capacity(types.len());
        for ty in &types {
            models.push(match &ty.content {
                TypeContent::Elements(model) => {
                    Some(ContentModel::compile(&ty.name, model, &limits)?)
                }
                TypeContent::Simple(_) => None,
            });
        }

        let type_index = types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name.clone(), TypeRef(i)))
            .collect();

        Ok(Self {
            types,
            type_index,
            elements,
            root,
            models,
            limits,
        })
    }

    /// Declaration of the designated root element
    pub fn root_element(&self) -> &ElementDecl {
        // Presence is checked in `Schema::new`.
        &self.elements[&self.root]
    }

    /// Name of the designated root element
    pub fn root_name(&self) -> &QName {
        &self.root
    }

    /// Look up a global element
    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// Global elements in composition order
    pub fn elements(&self) -> impl Iterator<Item = &ElementDecl> {
        self.elements.values()
    }

    /// Resolve a type handle
    pub fn get_type(&self, type_ref: TypeRef) -> Option<&XsdType> {
        self.types.get(type_ref.index())
    }

    /// Type behind a handle issued by this schema
    pub(crate) fn type_of(&self, type_ref: TypeRef) -> &XsdType {
        &self.types[type_ref.index()]
    }

    /// Find a type by name
    pub fn lookup_type(&self, name: &QName) -> Option<TypeRef> {
        self.type_index.get(name).copied()
    }

    /// All types with their handles, in arena order
    pub fn types(&self) -> impl Iterator<Item = (TypeRef, &XsdType)> {
        self.types.iter().enumerate().map(|(i, ty)| (TypeRef(i), ty))
    }

    /// Compiled content model of an element-content type
    pub fn content_model(&self, type_ref: TypeRef) -> Option<&ContentModel> {
        self.models.get(type_ref.index()).and_then(Option::as_ref)
    }

    /// Limits the schema was composed with; also used when validating
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate a document tree, stopping at the first divergence
    pub fn validate(&self, root: &DocumentNode) -> Result<(), ValidationError> {
        DocumentValidator::new(self).validate(root)
    }

    /// True if the document tree conforms
    pub fn is_valid(&self, root: &DocumentNode) -> bool {
        self.validate(root).is_ok()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema(root='{}', elements={}, types={})",
            self.root,
            self.elements.len(),
            self.types.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::groups::{ElementParticle, GroupParticle, ModelType};
    use crate::validators::particles::Occurs;
    use crate::validators::simple_types::SimpleTypeConstraint;

    fn q(local: &str) -> QName {
        QName::namespaced("urn:test", local)
    }

    fn node_type(child_type: TypeRef) -> XsdType {
        XsdType::new(
            q("nodeType"),
            TypeContent::Elements(
                GroupParticle::new(
                    ModelType::Sequence,
                    vec![ElementParticle::new(q("node"), child_type, Occurs::zero_or_more()).into()],
                )
                .into(),
            ),
        )
    }

    #[test]
    fn test_recursive_type() {
        // nodeType contains node elements of nodeType.
        let types = vec![node_type(TypeRef(0))];
        let mut elements = IndexMap::new();
        elements.insert(q("node"), ElementDecl::new(q("node"), TypeRef(0)));

        let schema = Schema::new(types, elements, q("node"), Limits::default()).unwrap();
        assert_eq!(schema.root_element().type_ref, TypeRef(0));
        assert_eq!(schema.lookup_type(&q("nodeType")), Some(TypeRef(0)));
        assert!(schema.content_model(TypeRef(0)).is_some());
        assert_eq!(
            schema.to_string(),
            "Schema(root='{urn:test}node', elements=1, types=1)"
        );
    }

    #[test]
    fn test_dangling_type_ref() {
        let types = vec![node_type(TypeRef(5))];
        let mut elements = IndexMap::new();
        elements.insert(q("node"), ElementDecl::new(q("node"), TypeRef(0)));

        let err = Schema::new(types, elements, q("node"), Limits::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedTypeRef {
                type_ref: TypeRef(5),
                referenced_by: "type '{urn:test}nodeType'".to_string()
            }
        );
    }

    #[test]
    fn test_missing_root() {
        let types = vec![XsdType::new(
            q("text"),
            TypeContent::Simple(SimpleTypeConstraint::AnyString),
        )];
        let err = Schema::new(types, IndexMap::new(), q("node"), Limits::default()).unwrap_err();
        assert_eq!(err, SchemaError::MissingRoot { name: q("node") });
    }

    #[test]
    fn test_simple_types_have_no_model() {
        let types = vec![XsdType::new(
            q("text"),
            TypeContent::Simple(SimpleTypeConstraint::AnyString),
        )];
        let mut elements = IndexMap::new();
        elements.insert(q("note"), ElementDecl::new(q("note"), TypeRef(0)));
        let schema = Schema::new(types, elements, q("note"), Limits::default()).unwrap();
        assert!(schema.content_model(TypeRef(0)).is_none());
        assert!(schema.get_type(TypeRef(0)).unwrap().is_simple());
        assert!(schema.get_type(TypeRef(1)).is_none());
    }

    #[test]
    fn test_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
