//! XSD subset parsing
//!
//! Reads an XSD document into a [`SchemaSource`]. The supported subset is
//! what structural validation needs: global and local element declarations
//! (by `type`, by `ref`, or with an inline anonymous type), named and
//! anonymous complex types built from nested `xs:sequence`/`xs:choice`
//! groups and `xs:any` extension points, and simple types restricting
//! `xs:string` (optionally by enumeration) or `xs:dateTime`.
//!
//! Attribute declarations are skipped with a warning; any other component is
//! rejected with a [`ParseError`] naming it.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::documents::{Document, DocumentNode};
use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names::{validate_ncname, validate_qname};
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

use super::complex_types::TypeContent;
use super::groups::{ElementParticle, GroupParticle, ModelType};
use super::particles::{parse_occurs, Occurs, Particle};
use super::simple_types::{builtin_constraint, SimpleTypeConstraint};
use super::sources::SchemaSource;
use super::wildcards::WildcardParticle;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ANY: &str = "any";
    pub const ANNOTATION: &str = "annotation";
    pub const RESTRICTION: &str = "restriction";
    pub const ENUMERATION: &str = "enumeration";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const FORM: &str = "form";
    pub const MIXED: &str = "mixed";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
}

/// Parse an XSD-subset document with default limits
pub fn parse_schema(name: impl Into<String>, xsd: &str) -> Result<SchemaSource> {
    parse_schema_with_limits(name, xsd, &Limits::default())
}

/// Parse an XSD-subset document
pub fn parse_schema_with_limits(
    name: impl Into<String>,
    xsd: &str,
    limits: &Limits,
) -> Result<SchemaSource> {
    let name = name.into();
    let doc = Document::parse_with_limits(xsd.as_bytes(), limits)?;
    let source = parse_document(&name, &doc.root).map_err(|err| match err {
        Error::Parse(err) => Error::Parse(err.with_source(name.clone())),
        other => other,
    })?;
    debug!(
        source = %source.name,
        types = source.types.len(),
        elements = source.elements.len(),
        "parsed schema source"
    );
    Ok(source)
}

fn parse_document(name: &str, root: &DocumentNode) -> Result<SchemaSource> {
    if !is_xsd(root, xsd_elements::SCHEMA) {
        return Err(ParseError::new(format!(
            "root element '{}' is not xs:schema",
            root.tag
        ))
        .into());
    }

    let mut source = SchemaSource::new(name);
    if let Some(ns) = attr(root, xsd_attrs::TARGET_NAMESPACE) {
        if !ns.is_empty() {
            source.target_namespace = Some(ns.to_string());
        }
    }
    let qualified = match attr(root, xsd_attrs::ELEMENT_FORM_DEFAULT) {
        None | Some("unqualified") => false,
        Some("qualified") => true,
        Some(other) => {
            return Err(ParseError::new(format!(
                "elementFormDefault value '{}' is not 'qualified' or 'unqualified'",
                other
            ))
            .into())
        }
    };

    let mut parser = SchemaParser {
        source,
        qualified,
        global_types: IndexMap::new(),
    };
    parser.collect_global_elements(root)?;

    for child in components(root) {
        match child.local_name() {
            xsd_elements::ELEMENT => parser.parse_global_element(child)?,
            xsd_elements::COMPLEX_TYPE => {
                let name = parser.declared_name(child, "complexType")?;
                let content = parser.parse_complex_type(child, &name)?;
                parser.add_type(name, content)?;
            }
            xsd_elements::SIMPLE_TYPE => {
                let name = parser.declared_name(child, "simpleType")?;
                let constraint = parse_simple_type(child)
                    .map_err(|e| locate(e, format!("simpleType '{}'", name)))?;
                parser.add_type(name, TypeContent::Simple(constraint))?;
            }
            other => return Err(unsupported(other, "schema")),
        }
    }

    Ok(parser.source)
}

struct SchemaParser {
    source: SchemaSource,
    /// Local elements are qualified with the target namespace
    qualified: bool,
    /// Type name of every global element, for `ref` resolution
    global_types: IndexMap<QName, QName>,
}

impl SchemaParser {
    /// First pass: record each global element's type name so that `ref`
    /// particles can be resolved regardless of declaration order.
    fn collect_global_elements(&mut self, root: &DocumentNode) -> Result<()> {
        for child in components(root) {
            if child.local_name() != xsd_elements::ELEMENT {
                continue;
            }
            let name = self.declared_name(child, "element")?;
            let type_name = match attr(child, xsd_attrs::TYPE) {
                Some(type_attr) => resolve_qname(child, type_attr)?,
                None => anonymous_type_name(&name, None),
            };
            if self.global_types.insert(name.clone(), type_name).is_some() {
                return Err(ParseError::new(format!("duplicate global element '{}'", name)).into());
            }
        }
        Ok(())
    }

    fn parse_global_element(&mut self, node: &DocumentNode) -> Result<()> {
        let name = self.declared_name(node, "element")?;
        let type_name = self
            .inline_type(node, &name, None)
            .map_err(|e| locate(e, format!("element '{}'", name)))?;
        self.source.elements.insert(name, type_name);
        Ok(())
    }

    /// Resolve the type of an element declaration, parsing an inline
    /// anonymous type if there is one.
    fn inline_type(
        &mut self,
        node: &DocumentNode,
        element: &QName,
        owner: Option<&QName>,
    ) -> Result<QName> {
        let mut inline = None;
        for child in components(node) {
            match child.local_name() {
                xsd_elements::COMPLEX_TYPE | xsd_elements::SIMPLE_TYPE if inline.is_none() => {
                    inline = Some(child)
                }
                other => return Err(unsupported(other, "element")),
            }
        }

        match (attr(node, xsd_attrs::TYPE), inline) {
            (Some(_), Some(_)) => Err(ParseError::new(
                "element declares both a 'type' attribute and an inline type",
            )
            .into()),
            (Some(type_attr), None) => resolve_qname(node, type_attr),
            (None, Some(inline)) => {
                let mut type_name = anonymous_type_name(element, owner);
                let base = type_name.local_name.clone();
                let mut n = 2;
                while self.source.types.contains_key(&type_name) {
                    type_name.local_name = format!("{}{}", base, n);
                    n += 1;
                }
                let content = if inline.local_name() == xsd_elements::COMPLEX_TYPE {
                    self.parse_complex_type(inline, &type_name)?
                } else {
                    TypeContent::Simple(parse_simple_type(inline)?)
                };
                self.add_type(type_name.clone(), content)?;
                Ok(type_name)
            }
            (None, None) => Err(ParseError::new(
                "element has neither a 'type' attribute nor an inline type",
            )
            .into()),
        }
    }

    fn parse_complex_type(
        &mut self,
        node: &DocumentNode,
        type_name: &QName,
    ) -> Result<TypeContent<QName>> {
        if attr(node, xsd_attrs::MIXED) == Some("true") {
            return Err(locate(
                ParseError::new("mixed content is not supported").into(),
                format!("complexType '{}'", type_name),
            ));
        }

        let mut model = None;
        for child in components(node) {
            match child.local_name() {
                xsd_elements::SEQUENCE | xsd_elements::CHOICE if model.is_none() => {
                    model = Some(self.parse_group(child, type_name)?);
                }
                name @ (xsd_elements::ATTRIBUTE
                | xsd_elements::ATTRIBUTE_GROUP
                | xsd_elements::ANY_ATTRIBUTE) => {
                    warn!(type_name = %type_name, component = name, "ignoring attribute declaration");
                }
                other => {
                    return Err(locate(
                        unsupported(other, "complexType"),
                        format!("complexType '{}'", type_name),
                    ))
                }
            }
        }

        Ok(match model {
            Some(group) => TypeContent::Elements(group.into()),
            None => TypeContent::empty(),
        })
    }

    fn parse_group(&mut self, node: &DocumentNode, owner: &QName) -> Result<GroupParticle<QName>> {
        let model = ModelType::from_local_name(node.local_name())
            .ok_or_else(|| unsupported(node.local_name(), "complexType"))?;
        let occurs = occurs_of(node)?;

        let mut particles = Vec::new();
        for child in components(node) {
            let particle: Particle<QName> = match child.local_name() {
                xsd_elements::ELEMENT => self.parse_local_element(child, owner)?.into(),
                xsd_elements::SEQUENCE | xsd_elements::CHOICE => {
                    self.parse_group(child, owner)?.into()
                }
                xsd_elements::ANY => WildcardParticle::new(occurs_of(child)?).into(),
                other => return Err(unsupported(other, node.local_name())),
            };
            particles.push(particle);
        }

        Ok(GroupParticle::new(model, particles).with_occurs(occurs))
    }

    fn parse_local_element(
        &mut self,
        node: &DocumentNode,
        owner: &QName,
    ) -> Result<ElementParticle<QName>> {
        let occurs = occurs_of(node)?;

        if let Some(reference) = attr(node, xsd_attrs::REF) {
            let name = resolve_qname(node, reference)?;
            let type_name = self.global_types.get(&name).cloned().ok_or_else(|| {
                ParseError::new(format!(
                    "element reference '{}' does not name a global element",
                    name
                ))
                .with_location(format!("complexType '{}'", owner))
            })?;
            return Ok(ElementParticle::new(name, type_name, occurs));
        }

        let local = attr(node, xsd_attrs::NAME).ok_or_else(|| {
            ParseError::new("local element has neither 'name' nor 'ref'")
                .with_location(format!("complexType '{}'", owner))
        })?;
        validate_ncname(local)?;
        let qualified = match attr(node, xsd_attrs::FORM) {
            Some("qualified") => true,
            Some("unqualified") => false,
            _ => self.qualified,
        };
        let name = if qualified {
            self.source.qname(local)
        } else {
            QName::local(local)
        };

        let type_name = self
            .inline_type(node, &name, Some(owner))
            .map_err(|e| locate(e, format!("element '{}' in complexType '{}'", name, owner)))?;
        Ok(ElementParticle::new(name, type_name, occurs))
    }

    /// Name of a global component, qualified with the target namespace
    fn declared_name(&self, node: &DocumentNode, component: &str) -> Result<QName> {
        let local = attr(node, xsd_attrs::NAME).ok_or_else(|| {
            ParseError::new(format!("global {} has no 'name' attribute", component))
        })?;
        validate_ncname(local)?;
        Ok(self.source.qname(local))
    }

    fn add_type(&mut self, name: QName, content: TypeContent<QName>) -> Result<()> {
        if self.source.types.contains_key(&name) {
            return Err(ParseError::new(format!("duplicate type '{}'", name)).into());
        }
        self.source.types.insert(name, content);
        Ok(())
    }
}

fn parse_simple_type(node: &DocumentNode) -> Result<SimpleTypeConstraint> {
    let mut restriction = None;
    for child in components(node) {
        match child.local_name() {
            xsd_elements::RESTRICTION if restriction.is_none() => restriction = Some(child),
            other => return Err(unsupported(other, "simpleType")),
        }
    }
    let restriction = restriction
        .ok_or_else(|| ParseError::new("simpleType must contain an xs:restriction"))?;

    let base = attr(restriction, xsd_attrs::BASE)
        .ok_or_else(|| ParseError::new("xs:restriction has no 'base' attribute"))
        .and_then(|base| {
            resolve_qname(restriction, base).map_err(|e| ParseError::new(e.to_string()))
        })?;
    let constraint = builtin_constraint(&base).ok_or_else(|| {
        ParseError::new(format!(
            "restriction base '{}' is not a supported built-in type",
            base
        ))
    })?;

    let mut literals = Vec::new();
    for child in components(restriction) {
        match child.local_name() {
            xsd_elements::ENUMERATION => {
                let value = attr(child, xsd_attrs::VALUE)
                    .ok_or_else(|| ParseError::new("xs:enumeration has no 'value' attribute"))?;
                literals.push(value.to_string());
            }
            other => {
                return Err(ParseError::new(format!("facet 'xs:{}' is not supported", other)).into())
            }
        }
    }

    match constraint {
        SimpleTypeConstraint::AnyString if !literals.is_empty() => {
            Ok(SimpleTypeConstraint::enumeration(literals))
        }
        _ if !literals.is_empty() => Err(ParseError::new(format!(
            "enumeration of '{}' values is not supported",
            base
        ))
        .into()),
        constraint => Ok(constraint),
    }
}

/// Children of a schema node, minus annotations
fn components(node: &DocumentNode) -> impl Iterator<Item = &DocumentNode> {
    node.children
        .iter()
        .filter(|c| c.local_name() != xsd_elements::ANNOTATION || !c.tag.is_in(XSD_NAMESPACE))
}

fn is_xsd(node: &DocumentNode, local_name: &str) -> bool {
    node.tag.is_in(XSD_NAMESPACE) && node.local_name() == local_name
}

fn attr<'a>(node: &'a DocumentNode, name: &str) -> Option<&'a str> {
    node.get_attribute(&QName::local(name))
}

fn resolve_qname(node: &DocumentNode, value: &str) -> Result<QName> {
    let value = value.trim();
    validate_qname(value)?;
    node.namespaces.resolve(value)
}

fn occurs_of(node: &DocumentNode) -> Result<Occurs> {
    parse_occurs(attr(node, xsd_attrs::MIN_OCCURS), attr(node, xsd_attrs::MAX_OCCURS))
}

/// Synthetic name of an anonymous type; `@` keeps it out of the NCName space
fn anonymous_type_name(element: &QName, owner: Option<&QName>) -> QName {
    let local_name = match owner {
        Some(owner) => format!("{}/{}@type", owner.local_name, element.local_name),
        None => format!("{}@type", element.local_name),
    };
    QName::new(element.namespace.clone(), local_name)
}

fn unsupported(component: &str, parent: &str) -> Error {
    ParseError::new(format!(
        "unsupported schema component 'xs:{}' in xs:{}",
        component, parent
    ))
    .into()
}

/// Attach a component location to a parse error that has none yet
fn locate(err: Error, location: String) -> Error {
    match err {
        Error::Parse(parse) if parse.location.is_none() => {
            Error::Parse(parse.with_location(location))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NS: &str = "https://www.w3schools.com";

    fn q(local: &str) -> QName {
        QName::namespaced(NS, local)
    }

    fn xs(local: &str) -> QName {
        QName::namespaced(XSD_NAMESPACE, local)
    }

    const ACTIVITY_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="https://www.w3schools.com"
           targetNamespace="https://www.w3schools.com"
           elementFormDefault="qualified">
  <xs:annotation><xs:documentation>Activity</xs:documentation></xs:annotation>
  <xs:element name="activity" type="activityType"/>
  <xs:complexType name="activityType">
    <xs:sequence>
      <xs:element name="gpx" type="xs:string" minOccurs="0"/>
      <xs:element name="started" type="xs:dateTime" minOccurs="0"/>
      <xs:element name="type" type="activityKind" minOccurs="0"/>
      <xs:element name="extension" type="extensionType" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="activityKind">
    <xs:restriction base="xs:string">
      <xs:enumeration value="Running"/>
      <xs:enumeration value="Walking"/>
      <xs:enumeration value="Cycling"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:complexType name="extensionType">
    <xs:sequence>
      <xs:any minOccurs="0" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    #[test]
    fn test_parse_activity_schema() {
        let source = parse_schema("base.xsd", ACTIVITY_XSD).unwrap();

        assert_eq!(source.target_namespace.as_deref(), Some(NS));
        assert_eq!(source.root_element(), Some(&q("activity")));
        assert_eq!(source.elements.get(&q("activity")), Some(&q("activityType")));
        assert_eq!(source.extension_point_count(), 1);
        assert_eq!(
            source.types.get(&q("activityKind")),
            Some(&TypeContent::Simple(SimpleTypeConstraint::enumeration([
                "Running", "Walking", "Cycling"
            ])))
        );

        let model = source.types[&q("activityType")].model().unwrap();
        let mut names = Vec::new();
        model.walk(&mut |p| {
            if let Particle::Element(e) = p {
                names.push((e.name.clone(), e.type_ref.clone(), e.occurs));
            }
        });
        assert_eq!(
            names,
            vec![
                (q("gpx"), xs("string"), Occurs::optional()),
                (q("started"), xs("dateTime"), Occurs::optional()),
                (q("type"), q("activityKind"), Occurs::optional()),
                (q("extension"), q("extensionType"), Occurs::optional()),
            ]
        );
    }

    #[test]
    fn test_anonymous_types_and_refs() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                       xmlns:t="urn:t" targetNamespace="urn:t">
          <xs:element name="root">
            <xs:complexType>
              <xs:choice maxOccurs="unbounded">
                <xs:element ref="t:note"/>
                <xs:element name="when">
                  <xs:simpleType>
                    <xs:restriction base="xs:dateTime"/>
                  </xs:simpleType>
                </xs:element>
              </xs:choice>
            </xs:complexType>
          </xs:element>
          <xs:element name="note" type="xs:string"/>
        </xs:schema>"#;
        let source = parse_schema("anon.xsd", xsd).unwrap();

        let root_type = QName::namespaced("urn:t", "root@type");
        assert_eq!(
            source.elements.get(&QName::namespaced("urn:t", "root")),
            Some(&root_type)
        );
        assert_eq!(
            source.types.get(&QName::local("root@type/when@type")),
            Some(&TypeContent::Simple(SimpleTypeConstraint::DateTime))
        );

        match source.types[&root_type].model().unwrap() {
            Particle::Group(g) => {
                assert_eq!(g.model, ModelType::Choice);
                assert_eq!(g.occurs, Occurs::one_or_more());
                match &g.particles[0] {
                    Particle::Element(e) => {
                        assert_eq!(e.name, QName::namespaced("urn:t", "note"));
                        assert_eq!(e.type_ref, xs("string"));
                    }
                    other => panic!("unexpected particle {:?}", other),
                }
                match &g.particles[1] {
                    // elementFormDefault is unqualified by default.
                    Particle::Element(e) => assert_eq!(e.name, QName::local("when")),
                    other => panic!("unexpected particle {:?}", other),
                }
            }
            other => panic!("unexpected model {:?}", other),
        }
    }

    #[test]
    fn test_empty_complex_type_and_ignored_attributes() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="marker" type="markerType"/>
          <xs:complexType name="markerType">
            <xs:attribute name="id" type="xs:string"/>
          </xs:complexType>
        </xs:schema>"#;
        let source = parse_schema("empty.xsd", xsd).unwrap();
        assert_eq!(
            source.types.get(&QName::local("markerType")),
            Some(&TypeContent::empty())
        );
    }

    #[test]
    fn test_unsupported_components() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:complexType name="t"><xs:all/></xs:complexType>
        </xs:schema>"#;
        match parse_schema("all.xsd", xsd) {
            Err(Error::Parse(err)) => {
                assert!(err.message.contains("'xs:all'"));
                assert_eq!(err.location.as_deref(), Some("complexType 't'"));
                assert_eq!(err.source.as_deref(), Some("all.xsd"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:simpleType name="code">
            <xs:restriction base="xs:string"><xs:pattern value="[A-Z]+"/></xs:restriction>
          </xs:simpleType>
        </xs:schema>"#;
        assert!(matches!(parse_schema("facet.xsd", xsd), Err(Error::Parse(_))));

        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:simpleType name="n"><xs:restriction base="xs:integer"/></xs:simpleType>
        </xs:schema>"#;
        assert!(matches!(parse_schema("int.xsd", xsd), Err(Error::Parse(_))));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            parse_schema("x.xsd", "<schema/>"),
            Err(Error::Parse(_))
        ));
        assert!(parse_schema("x.xsd", "<xs:schema").is_err());

        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="a" type="xs:string"/>
          <xs:element name="a" type="xs:string"/>
        </xs:schema>"#;
        assert!(matches!(parse_schema("dup.xsd", xsd), Err(Error::Parse(_))));

        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="1bad" type="xs:string"/>
        </xs:schema>"#;
        assert!(matches!(parse_schema("name.xsd", xsd), Err(Error::Name(_))));
    }

    #[test]
    fn test_dangling_ref() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:complexType name="t">
            <xs:sequence><xs:element ref="missing"/></xs:sequence>
          </xs:complexType>
        </xs:schema>"#;
        match parse_schema("ref.xsd", xsd) {
            Err(Error::Parse(err)) => assert!(err.message.contains("'missing'")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
