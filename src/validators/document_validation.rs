//! Document validation
//!
//! Walks a [`DocumentNode`] tree depth-first against a composed [`Schema`].
//! Child sequences are checked by the compiled content models; leaf text by
//! the simple-type constraints. The walk stops at the first divergence and
//! reports it with the path of tags leading to it.

use tracing::trace;

use crate::documents::{Document, DocumentNode};
use crate::namespaces::QName;

use super::complex_types::{TypeContent, TypeRef};
use super::exceptions::{ValidationError, ValidationReason};
use super::models::{ContentModel, RejectionKind};
use super::schemas::Schema;
use super::simple_types::SimpleTypeConstraint;

/// Validates document trees against one schema
#[derive(Debug, Clone, Copy)]
pub struct DocumentValidator<'s> {
    schema: &'s Schema,
    max_depth: usize,
}

impl<'s> DocumentValidator<'s> {
    /// Create a validator using the schema's depth limit
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            max_depth: schema.limits().max_depth,
        }
    }

    /// Override the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate a parsed document
    pub fn validate_document(&self, doc: &Document) -> Result<(), ValidationError> {
        self.validate(&doc.root)
    }

    /// Validate a tree, stopping at the first divergence
    pub fn validate(&self, root: &DocumentNode) -> Result<(), ValidationError> {
        let decl = self.schema.root_element();
        if root.tag != decl.name {
            return Err(ValidationError::new(
                vec![root.tag.clone()],
                ValidationReason::TagMismatch {
                    expected: decl.name.clone(),
                    actual: root.tag.clone(),
                },
            ));
        }

        let mut path = Vec::new();
        self.validate_node(root, decl.type_ref, &mut path)
    }

    fn validate_node(
        &self,
        node: &DocumentNode,
        type_ref: TypeRef,
        path: &mut Vec<QName>,
    ) -> Result<(), ValidationError> {
        path.push(node.tag.clone());
        if path.len() > self.max_depth {
            return Err(fail(
                path,
                ValidationReason::DepthLimitExceeded {
                    limit: self.max_depth,
                },
            ));
        }

        let ty = self.schema.type_of(type_ref);
        trace!(tag = %node.tag, type_name = %ty.name, depth = path.len(), "validating element");

        match (&ty.content, self.schema.content_model(type_ref)) {
            (TypeContent::Simple(constraint), _) => validate_leaf(node, constraint, path)?,
            (TypeContent::Elements(_), Some(model)) => self.validate_children(node, model, path)?,
            (TypeContent::Elements(_), None) => {
                unreachable!("Schema::new compiles every element-content model")
            }
        }

        path.pop();
        Ok(())
    }

    fn validate_children(
        &self,
        node: &DocumentNode,
        model: &ContentModel,
        path: &mut Vec<QName>,
    ) -> Result<(), ValidationError> {
        if let Some(text) = node.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return Err(fail(
                    path,
                    ValidationReason::UnexpectedText {
                        element: node.tag.clone(),
                        text: text.to_string(),
                    },
                ));
            }
        }

        let attributions = model.match_children(node.child_tags()).map_err(|rejection| {
            let reason = match rejection.kind {
                RejectionKind::UnexpectedChild { tag, in_wildcard } => {
                    ValidationReason::UnexpectedChild {
                        tag,
                        position: rejection.position,
                        in_wildcard,
                    }
                }
                RejectionKind::MissingRequiredChild(expected) => {
                    ValidationReason::MissingRequiredChild {
                        parent: node.tag.clone(),
                        expected,
                    }
                }
            };
            fail(path, reason)
        })?;

        for (child, attribution) in node.children.iter().zip(attributions) {
            self.validate_node(child, attribution.type_ref, path)?;
        }
        Ok(())
    }
}

fn validate_leaf(
    node: &DocumentNode,
    constraint: &SimpleTypeConstraint,
    path: &[QName],
) -> Result<(), ValidationError> {
    if let Some(child) = node.children.first() {
        return Err(fail(
            path,
            ValidationReason::UnexpectedChild {
                tag: child.tag.clone(),
                position: 0,
                in_wildcard: false,
            },
        ));
    }

    let value = node.text.as_deref().unwrap_or_default();
    constraint.validate_value(value).map_err(|detail| {
        fail(
            path,
            ValidationReason::LeafConstraintViolation {
                element: node.tag.clone(),
                value: value.to_string(),
                constraint: constraint.clone(),
                detail,
            },
        )
    })
}

fn fail(path: &[QName], reason: ValidationReason) -> ValidationError {
    ValidationError::new(path.to_vec(), reason)
}
