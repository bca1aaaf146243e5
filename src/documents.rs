//! XML document reading
//!
//! Parses an XML document into a [`DocumentNode`] tree with every element
//! and attribute name resolved against the in-scope namespace declarations.
//! Whitespace-only character data is dropped; other text is kept verbatim.

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use crate::XSI_NAMESPACE;

/// Element node of a document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    /// Resolved element name
    pub tag: QName,
    /// Character data, if any non-whitespace text was present
    pub text: Option<String>,
    /// Child elements in document order
    pub children: Vec<DocumentNode>,
    /// Attributes by resolved name (namespace declarations excluded)
    pub attributes: IndexMap<QName, String>,
    /// Namespace declarations in scope at this element
    pub namespaces: NamespaceContext,
}

impl DocumentNode {
    /// Create an element node without text or children
    pub fn new(tag: QName) -> Self {
        Self {
            tag,
            text: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append child elements in order
    pub fn with_children(mut self, children: impl IntoIterator<Item = DocumentNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.tag.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.tag.namespace()
    }

    /// Get an attribute value by resolved name
    pub fn get_attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Tags of the child elements, in order
    pub fn child_tags(&self) -> impl Iterator<Item = &QName> {
        self.children.iter().map(|c| &c.tag)
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&DocumentNode> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }
}

/// The `xsi:schemaLocation` hint of a document
///
/// Read as a namespace followed by the base schema location and then any
/// number of extension schema locations, e.g.
/// `https://www.w3schools.com ../schema/base.xsd ./extension.xsd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLocationHint {
    /// Namespace the schemas describe
    pub namespace: String,
    /// Base location first, then extension locations
    pub locations: Vec<String>,
}

impl SchemaLocationHint {
    /// Parse the attribute value
    pub fn parse(value: &str) -> Result<Self> {
        let mut tokens = value.split_whitespace();
        let namespace = tokens
            .next()
            .ok_or_else(|| Error::Resource("xsi:schemaLocation is empty".to_string()))?;
        let locations: Vec<String> = tokens.map(str::to_string).collect();
        if locations.is_empty() {
            return Err(Error::Resource(format!(
                "xsi:schemaLocation names no schema for namespace '{}'",
                namespace
            )));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            locations,
        })
    }

    /// Location of the base schema
    pub fn base_location(&self) -> &str {
        &self.locations[0]
    }

    /// Locations of the extension schemas, in order
    pub fn extension_locations(&self) -> &[String] {
        &self.locations[1..]
    }
}

/// Parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root element of the document
    pub root: DocumentNode,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document, enforcing size and depth limits
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_source_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        let mut stack: Vec<(DocumentNode, String)> = Vec::new();
        let mut root: Option<DocumentNode> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let node = Self::parse_element(&e, stack.last().map(|(n, _)| &n.namespaces))?;
                    limits.check_depth(stack.len() + 1)?;
                    Self::check_single_root(&root, &stack, &node)?;
                    stack.push((node, String::new()));
                }
                Ok(Event::End(_)) => {
                    if let Some((mut node, text)) = stack.pop() {
                        if !text.trim().is_empty() {
                            node.text = Some(text);
                        }
                        match stack.last_mut() {
                            Some((parent, _)) => parent.children.push(node),
                            None => root = Some(node),
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let node = Self::parse_element(&e, stack.last().map(|(n, _)| &n.namespaces))?;
                    limits.check_depth(stack.len() + 1)?;
                    Self::check_single_root(&root, &stack, &node)?;
                    match stack.last_mut() {
                        Some((parent, _)) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    match stack.last_mut() {
                        Some((_, buffer)) => buffer.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(Error::Xml(
                                "character data outside the root element".to_string(),
                            ))
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some((_, buffer)) = stack.last_mut() {
                        let text = std::str::from_utf8(&e)
                            .map_err(|e| Error::Xml(format!("Invalid CDATA section: {}", e)))?;
                        buffer.push_str(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Declarations, comments, processing instructions, doctypes
            }
            buf.clear();
        }

        if let Some((node, _)) = stack.last() {
            return Err(Error::Xml(format!(
                "unexpected end of document inside element '{}'",
                node.tag
            )));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| Error::Xml("document has no root element".to_string()))
    }

    fn check_single_root(
        root: &Option<DocumentNode>,
        stack: &[(DocumentNode, String)],
        node: &DocumentNode,
    ) -> Result<()> {
        if stack.is_empty() && root.is_some() {
            return Err(Error::Xml(format!(
                "element '{}' follows the root element",
                node.tag
            )));
        }
        Ok(())
    }

    /// Build a node from a start tag, resolving names against the parent's
    /// namespace context extended with this element's declarations
    fn parse_element(start: &BytesStart, parent: Option<&NamespaceContext>) -> Result<DocumentNode> {
        let mut namespaces = parent.cloned().unwrap_or_default();
        let mut raw_attributes = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut node = DocumentNode::new(namespaces.resolve(name)?);
        for (name, value) in raw_attributes {
            node.attributes
                .insert(namespaces.resolve_attribute(&name)?, value);
        }
        node.namespaces = namespaces;
        Ok(node)
    }

    /// Get the root element
    pub fn root(&self) -> &DocumentNode {
        &self.root
    }

    /// The root element's `xsi:schemaLocation` hint, if present
    pub fn schema_location_hint(&self) -> Result<Option<SchemaLocationHint>> {
        self.root
            .get_attribute(&QName::namespaced(XSI_NAMESPACE, "schemaLocation"))
            .map(SchemaLocationHint::parse)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://www.w3schools.com";

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        assert_eq!(doc.root.local_name(), "root");
        assert_eq!(doc.root.children.len(), 1);
        assert_eq!(doc.root.children[0].local_name(), "child");
        assert_eq!(doc.root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_default_namespace_is_inherited() {
        let xml = r#"<activity xmlns="https://www.w3schools.com"><gpx>a.gpx</gpx></activity>"#;
        let doc = Document::from_string(xml).unwrap();

        assert_eq!(doc.root.tag, QName::namespaced(NS, "activity"));
        assert_eq!(doc.root.children[0].tag, QName::namespaced(NS, "gpx"));
        assert_eq!(doc.root.children[0].namespace(), Some(NS));
    }

    #[test]
    fn test_prefixed_names_and_undeclared_default() {
        let xml = r#"<a:root xmlns:a="urn:a" xmlns="urn:d"><inner xmlns=""/><a:leaf/></a:root>"#;
        let doc = Document::from_string(xml).unwrap();

        assert_eq!(doc.root.tag, QName::namespaced("urn:a", "root"));
        assert_eq!(doc.root.children[0].tag, QName::local("inner"));
        assert_eq!(doc.root.children[1].tag, QName::namespaced("urn:a", "leaf"));
    }

    #[test]
    fn test_unknown_prefix() {
        let result = Document::from_string("<x:root/>");
        assert!(matches!(result, Err(Error::Namespace(_))));
    }

    #[test]
    fn test_whitespace_only_text_is_dropped() {
        let xml = "<root>\n    <child>  value  </child>\n</root>";
        let doc = Document::from_string(xml).unwrap();

        assert_eq!(doc.root.text, None);
        assert_eq!(doc.root.children[0].text.as_deref(), Some("  value  "));
    }

    #[test]
    fn test_attributes_are_resolved() {
        let xml = r#"<root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="1" xsi:nil="false"/>"#;
        let doc = Document::from_string(xml).unwrap();

        assert_eq!(doc.root.get_attribute(&QName::local("id")), Some("1"));
        assert_eq!(
            doc.root
                .get_attribute(&QName::namespaced(XSI_NAMESPACE, "nil")),
            Some("false")
        );
        assert_eq!(doc.root.attributes.len(), 2);
    }

    #[test]
    fn test_schema_location_hint() {
        let xml = r#"<activity xmlns="https://www.w3schools.com"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                xsi:schemaLocation="https://www.w3schools.com ../../schema/base.xsd ./extension.xsd"/>"#;
        let doc = Document::from_string(xml).unwrap();
        let hint = doc.schema_location_hint().unwrap().unwrap();

        assert_eq!(hint.namespace, NS);
        assert_eq!(hint.base_location(), "../../schema/base.xsd");
        assert_eq!(hint.extension_locations(), ["./extension.xsd".to_string()]);
    }

    #[test]
    fn test_schema_location_hint_absent_or_empty() {
        let doc = Document::from_string("<root/>").unwrap();
        assert_eq!(doc.schema_location_hint().unwrap(), None);

        assert!(SchemaLocationHint::parse("urn:only-namespace").is_err());
        assert!(SchemaLocationHint::parse("   ").is_err());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(Document::from_string("").is_err());
        assert!(Document::from_string("<root>").is_err());
        assert!(Document::from_string("<a/><b/>").is_err());
        assert!(Document::from_string("<a></b>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a><a><a><a/></a></a></a>";
        let limits = Limits::default().with_max_depth(3);
        let result = Document::parse_with_limits(xml.as_bytes(), &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));

        let limits = Limits::default().with_max_depth(4);
        assert!(Document::parse_with_limits(xml.as_bytes(), &limits).is_ok());
    }

    #[test]
    fn test_node_builders() {
        let node = DocumentNode::new(QName::local("root"))
            .with_child(DocumentNode::new(QName::local("a")).with_text("1"))
            .with_children([DocumentNode::new(QName::local("b"))]);
        let tags: Vec<_> = node.child_tags().map(|t| t.local_name.as_str()).collect();
        assert_eq!(tags, ["a", "b"]);
        assert_eq!(node.find_children("a").len(), 1);
    }
}
