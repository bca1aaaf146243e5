//! End-to-end validation of activity documents
//!
//! Schemas are read from `tests/fixtures`, composed, and used to validate
//! documents parsed from text, the way the command-line tool does it.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use xsdcheck::validators::{ExpectedParticle, SchemaError};
use xsdcheck::{
    Document, Loader, Location, QName, Schema, SchemaComposer, SchemaSource, ValidationReason,
};

const NS: &str = "https://www.w3schools.com";

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn q(local: &str) -> QName {
    QName::namespaced(NS, local)
}

fn base_source() -> SchemaSource {
    let path = fixtures_dir().join("schema").join("stgpx-schema-1.0.xsd");
    SchemaSource::from_str("stgpx-schema-1.0.xsd", &fs::read_to_string(path).unwrap()).unwrap()
}

fn extension_source() -> SchemaSource {
    let path = fixtures_dir().join("samples").join("extension.xsd");
    SchemaSource::from_str("extension.xsd", &fs::read_to_string(path).unwrap()).unwrap()
}

fn base_schema() -> Schema {
    SchemaComposer::new(base_source()).compose().unwrap()
}

fn combined_schema() -> Schema {
    SchemaComposer::new(base_source())
        .with_extension(extension_source())
        .compose()
        .unwrap()
}

fn activity(children: &str) -> Document {
    let xml = format!(
        r#"<?xml version="1.0"?>
<activity xmlns="https://www.w3schools.com"
          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
          xsi:schemaLocation="https://www.w3schools.com ../schema/stgpx-schema-1.0.xsd">{}</activity>"#,
        children
    );
    Document::from_string(&xml).unwrap()
}

#[test]
fn test_empty_root_is_valid() {
    assert_eq!(base_schema().validate(activity("").root()), Ok(()));
}

#[test]
fn test_leaves_in_order_are_valid() {
    let doc = activity(
        "<gpx>boris.gpx</gpx><started>2023-10-01T12:00:00Z</started><type>Running</type>",
    );
    assert_eq!(base_schema().validate(doc.root()), Ok(()));
}

#[test]
fn test_trailing_unknown_child() {
    let doc = activity(
        "<gpx>boris.gpx</gpx><started>2023-10-01T12:00:00Z</started><type>Running</type>\
         <unknown>x</unknown>",
    );
    let err = base_schema().validate(doc.root()).unwrap_err();

    assert_eq!(err.position(), Some(3));
    assert_eq!(
        err.reason,
        ValidationReason::UnexpectedChild {
            tag: q("unknown"),
            position: 3,
            in_wildcard: false
        }
    );
    assert!(err
        .message()
        .contains("Unexpected child with tag '{https://www.w3schools.com}unknown'"));
}

#[test]
fn test_duplicate_gpx() {
    let doc = activity("<gpx>a</gpx><gpx>b</gpx>");
    let err = base_schema().validate(doc.root()).unwrap_err();

    assert_eq!(err.position(), Some(1));
    assert!(matches!(
        err.reason,
        ValidationReason::UnexpectedChild { ref tag, .. } if *tag == q("gpx")
    ));
}

#[test]
fn test_extension_without_extension_schema() {
    let doc = activity("<extension><someExtension>v</someExtension></extension>");
    let err = base_schema().validate(doc.root()).unwrap_err();

    assert_eq!(err.path, vec![q("activity"), q("extension")]);
    assert_eq!(
        err.reason,
        ValidationReason::UnexpectedChild {
            tag: q("someExtension"),
            position: 0,
            in_wildcard: false
        }
    );
}

#[test]
fn test_type_outside_enumeration() {
    let doc = activity("<type>Sprinting</type>");
    let err = base_schema().validate(doc.root()).unwrap_err();

    assert_eq!(err.path, vec![q("activity"), q("type")]);
    match err.reason {
        ValidationReason::LeafConstraintViolation { value, .. } => assert_eq!(value, "Sprinting"),
        other => panic!("expected a leaf violation, got {:?}", other),
    }
}

#[test]
fn test_extension_with_extension_schema() {
    let doc = activity("<extension><someExtension>v</someExtension></extension>");
    assert_eq!(combined_schema().validate(doc.root()), Ok(()));
}

#[test]
fn test_historical_success_cases() {
    let schema = combined_schema();
    let cases = [
        ("minimal", "minimal.xml"),
        ("maximal with whitespace", "maximal.xml"),
    ];
    for (name, file) in cases {
        let xml = fs::read_to_string(fixtures_dir().join("samples").join(file)).unwrap();
        let doc = Document::from_string(&xml).unwrap();
        assert_eq!(schema.validate(doc.root()), Ok(()), "case '{}'", name);
    }

    let compact = activity(
        "<gpx>boris.gpx</gpx><started>2023-10-01T12:00:00Z</started><type>Running</type>\
         <extension><someExtension>Some value</someExtension></extension>",
    );
    assert_eq!(schema.validate(compact.root()), Ok(()));
}

#[test]
fn test_historical_failure_cases() {
    let schema = combined_schema();
    let cases = [
        (
            "unknown with whitespace",
            "\n        <gpx>boris.gpx</gpx>\n        <started>2023-10-01T12:00:00Z</started>\n        \
             <type>Running</type>\n        <unknown>What is this?</unknown>\n",
            "Unexpected child with tag '{https://www.w3schools.com}unknown'",
        ),
        (
            "duplicate started",
            "<gpx>boris.gpx</gpx><started>2023-10-01T12:00:00Z</started>\
             <started>2023-10-01T12:00:01Z</started><type>Running</type>",
            "Unexpected child with tag '{https://www.w3schools.com}started",
        ),
        (
            "duplicate type",
            "<gpx>boris.gpx</gpx><started>2023-10-01T12:00:00Z</started>\
             <type>Walking</type><type>Running</type>",
            "Unexpected child with tag '{https://www.w3schools.com}type",
        ),
    ];
    for (name, children, cause) in cases {
        let err = schema.validate(activity(children).root()).unwrap_err();
        assert!(
            err.message().contains(cause),
            "case '{}': expected '{}' in '{}'",
            name,
            cause,
            err.message()
        );
    }

    let xml = fs::read_to_string(fixtures_dir().join("samples").join("duplicate-gpx.xml")).unwrap();
    let err = schema
        .validate(Document::from_string(&xml).unwrap().root())
        .unwrap_err();
    assert!(err
        .message()
        .contains("Unexpected child with tag '{https://www.w3schools.com}gpx"));
}

#[test]
fn test_unknown_extension_element() {
    let xml =
        fs::read_to_string(fixtures_dir().join("samples").join("unknown-extension.xml")).unwrap();
    let doc = Document::from_string(&xml).unwrap();
    let err = combined_schema().validate(doc.root()).unwrap_err();

    assert_eq!(
        err.message(),
        "element '{https://www.w3schools.com}noIdea' not found"
    );
    assert_eq!(err.path_string(), "/activity/extension");
    assert_eq!(
        err.to_string(),
        "element '{https://www.w3schools.com}noIdea' not found\n\nPath: /activity/extension"
    );
}

#[test]
fn test_invalid_timestamps() {
    let schema = base_schema();
    for value in [
        "2023-10-01 12:00:00Z",
        "2023-10-01T12:00:00",
        "2023-10-01T12:00:00+02:00",
        "2023-02-30T12:00:00Z",
        "2023-10-01T24:00:00Z",
        "",
    ] {
        let doc = activity(&format!("<started>{}</started>", value));
        let err = schema.validate(doc.root()).unwrap_err();
        assert!(
            matches!(err.reason, ValidationReason::LeafConstraintViolation { .. }),
            "value '{}' should be rejected",
            value
        );
    }

    let doc = activity("<started>\n  2024-02-29T23:59:59Z\n</started>");
    assert_eq!(schema.validate(doc.root()), Ok(()));
}

#[test]
fn test_wrong_root() {
    let doc = Document::from_string(r#"<workout xmlns="https://www.w3schools.com"/>"#).unwrap();
    let err = base_schema().validate(doc.root()).unwrap_err();
    assert_eq!(
        err.message(),
        "Unexpected root element '{https://www.w3schools.com}workout', \
         expected '{https://www.w3schools.com}activity'."
    );
}

#[test]
fn test_unqualified_children_are_rejected() {
    let doc = Document::from_string(
        r#"<a:activity xmlns:a="https://www.w3schools.com"><gpx>x</gpx></a:activity>"#,
    )
    .unwrap();
    let err = base_schema().validate(doc.root()).unwrap_err();
    assert_eq!(
        err.reason,
        ValidationReason::UnexpectedChild {
            tag: QName::local("gpx"),
            position: 0,
            in_wildcard: false
        }
    );
}

#[test]
fn test_hint_drives_composition() {
    let location = Location::path(fixtures_dir().join("samples").join("maximal.xml"));
    let loader = Loader::new();
    let doc = loader.load_document(&location).unwrap();
    let hint = doc.schema_location_hint().unwrap().unwrap();

    let base = loader
        .load_schema(&location.resolve(hint.base_location()).unwrap())
        .unwrap();
    let extensions = loader.load_hinted_extensions(&location, &hint).unwrap();
    assert_eq!(extensions.len(), 1);

    let schema = SchemaComposer::new(base)
        .with_extensions(extensions)
        .compose()
        .unwrap();
    assert_eq!(schema.validate(doc.root()), Ok(()));
}

#[test]
fn test_required_child_rendering() {
    let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            xmlns="https://www.w3schools.com"
            targetNamespace="https://www.w3schools.com" elementFormDefault="qualified">
          <xs:element name="activity">
            <xs:complexType>
              <xs:sequence>
                <xs:element name="gpx" type="xs:string"/>
                <xs:element name="started" type="xs:dateTime" minOccurs="2" maxOccurs="3"/>
              </xs:sequence>
            </xs:complexType>
          </xs:element>
        </xs:schema>"#;
    let schema = SchemaComposer::new(SchemaSource::from_str("strict.xsd", xsd).unwrap())
        .compose()
        .unwrap();

    let err = schema.validate(activity("").root()).unwrap_err();
    assert_eq!(
        err.reason,
        ValidationReason::MissingRequiredChild {
            parent: q("activity"),
            expected: ExpectedParticle::Element(q("gpx"))
        }
    );
    assert_eq!(
        err.message(),
        "The content of element '{https://www.w3schools.com}activity' is not complete. \
         Tag '{https://www.w3schools.com}gpx' expected."
    );

    let doc = activity("<gpx>a</gpx><started>2023-10-01T12:00:00Z</started>");
    let err = schema.validate(doc.root()).unwrap_err();
    assert_eq!(
        err.reason,
        ValidationReason::MissingRequiredChild {
            parent: q("activity"),
            expected: ExpectedParticle::Element(q("started"))
        }
    );

    let three = "<started>2023-10-01T12:00:00Z</started>".repeat(3);
    assert!(schema.is_valid(activity(&format!("<gpx>a</gpx>{}", three)).root()));
    let four = "<started>2023-10-01T12:00:00Z</started>".repeat(4);
    let err = schema
        .validate(activity(&format!("<gpx>a</gpx>{}", four)).root())
        .unwrap_err();
    assert_eq!(err.position(), Some(4));
}

#[test]
fn test_colliding_extension_is_rejected() {
    let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            targetNamespace="https://www.w3schools.com">
          <xs:element name="activity" type="xs:string"/>
        </xs:schema>"#;
    let err = SchemaComposer::new(base_source())
        .with_extension(SchemaSource::from_str("clash.xsd", xsd).unwrap())
        .compose()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::DuplicateElement {
            name: q("activity"),
            origin: "clash.xsd".to_string()
        }
    );
}

#[test]
fn test_schema_shared_across_threads() {
    let schema = std::sync::Arc::new(combined_schema());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = std::sync::Arc::clone(&schema);
            std::thread::spawn(move || {
                let doc = if i % 2 == 0 {
                    activity("<gpx>a</gpx>")
                } else {
                    activity("<gpx>a</gpx><gpx>b</gpx>")
                };
                schema.is_valid(doc.root())
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![true, false, true, false]);
}
