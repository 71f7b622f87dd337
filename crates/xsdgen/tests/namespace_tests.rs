//! Namespace handling across include and import.
//!
//! These tests verify that:
//! 1. Imported declarations keep their own target namespace
//! 2. Included schemas without a namespace adopt the includer's (chameleon include)
//! 3. A file whose targetNamespace contradicts the directive is rejected

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use xsdgen::proto_tree::{
    Field, FieldKind, FieldType, Import, NamedKind, ProtoTree, StructDecl, TypeDecl,
};
use xsdgen::qname::XML_NS;
use xsdgen::{generator_for, parse, Lang, ParseOptions, QName, XsdError};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> PathBuf {
    Path::new(FIXTURES).join(name)
}

fn extract(options: ParseOptions) -> xsdgen::Result<ProtoTree> {
    Ok(parse(options.with_extract(true))?.tree)
}

fn find_struct<'a>(tree: &'a ProtoTree, name: &str) -> &'a StructDecl {
    match tree.get(name) {
        Some(TypeDecl::Struct(s)) => s,
        other => panic!("expected struct {name}, got {other:?}"),
    }
}

fn find_field<'a>(s: &'a StructDecl, kind: FieldKind, name: &str) -> &'a Field {
    s.fields
        .iter()
        .find(|f| f.kind == kind && f.name == name)
        .unwrap_or_else(|| panic!("no {kind:?} field {name} in {}", s.name))
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_imported_types_keep_their_namespace() {
    let options = ParseOptions::new(fixture("import/main.xsd"), FIXTURES, "unused", "go");
    let tree = extract(options).expect("import fixture should parse");

    assert_eq!(tree.target_namespace, "urn:example:main");
    let names: Vec<_> = tree.decls.iter().map(|d| d.name().clone()).collect();
    assert_eq!(names, [QName::new("urn:example:main", "Customer")]);

    let customer = find_struct(&tree, "Customer");
    assert_eq!(
        find_field(customer, FieldKind::Element, "address").ty,
        FieldType::Named {
            name: QName::new("urn:example:address", "Address"),
            kind: NamedKind::Struct,
        }
    );

    let country = find_field(customer, FieldKind::Element, "country");
    assert_eq!(country.namespace.as_deref(), Some("urn:example:address"));
    assert!(country.optional);

    let name = find_field(customer, FieldKind::Element, "name");
    assert_eq!(name.namespace, None);
}

#[test]
fn test_xml_namespace_attribute_needs_no_schema() {
    let options = ParseOptions::new(fixture("import/main.xsd"), FIXTURES, "unused", "go");
    let tree = extract(options).expect("import fixture should parse");

    let lang = find_field(find_struct(&tree, "Customer"), FieldKind::Attribute, "lang");
    assert_eq!(lang.namespace.as_deref(), Some(XML_NS));
    assert!(lang.optional);
}

#[test]
fn test_imported_types_are_listed_per_file() {
    let options = ParseOptions::new(fixture("import/main.xsd"), FIXTURES, "unused", "go");
    let tree = extract(options).expect("import fixture should parse");

    assert_eq!(
        tree.imports,
        vec![Import {
            source: PathBuf::from("address.xsd"),
            names: vec![QName::new("urn:example:address", "Address")],
        }]
    );

    let ts = generator_for(Lang::TypeScript).generate(&tree).unwrap();
    assert!(ts.contains("\nimport { Address } from \"./address.xsd\";\n"), "{ts}");
    let c = generator_for(Lang::C).generate(&tree).unwrap();
    assert!(c.contains("#include <stdint.h>\n#include \"address.xsd.h\"\n"), "{c}");
    let go = generator_for(Lang::Go).generate(&tree).unwrap();
    assert!(go.contains("\n// From address.xsd: Address\n"), "{go}");
}

#[test]
fn test_import_namespace_mismatch() {
    let options = ParseOptions::new(fixture("import/wrong_namespace.xsd"), FIXTURES, "unused", "go");
    match extract(options) {
        Err(XsdError::Resolution { location, reason, .. }) => {
            assert!(location.ends_with("address.xsd"), "location was {location}");
            assert!(reason.contains("urn:example:elsewhere"), "reason was {reason}");
        }
        other => panic!("expected a resolution error, got {other:?}"),
    }
}

#[test]
fn test_import_without_location_must_be_satisfied() {
    let options = ParseOptions::new(fixture("import/missing_location.xsd"), FIXTURES, "unused", "go");
    match extract(options) {
        Err(XsdError::Resolution { location, .. }) => assert_eq!(location, "urn:example:nowhere"),
        other => panic!("expected a resolution error, got {other:?}"),
    }
}

#[test]
fn test_import_without_location_satisfied_by_sibling_import() {
    let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                              xmlns:addr="urn:example:address"
                              targetNamespace="urn:example:main">
        <xs:import namespace="urn:example:address"/>
        <xs:import namespace="urn:example:address" schemaLocation="address.xsd"/>
        <xs:complexType name="Shipment">
            <xs:sequence>
                <xs:element name="to" type="addr:Address"/>
            </xs:sequence>
        </xs:complexType>
    </xs:schema>"#;
    let options = ParseOptions::new(fixture("import/shipment.xsd"), FIXTURES, "unused", "go")
        .with_schema(schema);
    let tree = extract(options).expect("deferred import should resolve");

    let to = find_field(find_struct(&tree, "Shipment"), FieldKind::Element, "to");
    assert_eq!(
        to.ty,
        FieldType::Named {
            name: QName::new("urn:example:address", "Address"),
            kind: NamedKind::Struct,
        }
    );
}

// ============================================================================
// Include
// ============================================================================

#[test]
fn test_chameleon_include_adopts_namespace() {
    let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                              xmlns:c="urn:example:chameleon"
                              targetNamespace="urn:example:chameleon">
        <xs:include schemaLocation="common.xsd"/>
        <xs:complexType name="Wrapper">
            <xs:sequence>
                <xs:element name="code" type="c:Code"/>
            </xs:sequence>
        </xs:complexType>
    </xs:schema>"#;
    let options = ParseOptions::new(fixture("nested/chameleon.xsd"), FIXTURES, "unused", "go")
        .with_schema(schema);
    let tree = extract(options).expect("chameleon include should resolve");

    let code = find_field(find_struct(&tree, "Wrapper"), FieldKind::Element, "code");
    assert_eq!(
        code.ty,
        FieldType::Named {
            name: QName::new("urn:example:chameleon", "Code"),
            kind: NamedKind::Alias,
        }
    );
}

#[test]
fn test_include_namespace_mismatch() {
    let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                              targetNamespace="urn:example:main">
        <xs:include schemaLocation="address.xsd"/>
    </xs:schema>"#;
    let options = ParseOptions::new(fixture("import/including.xsd"), FIXTURES, "unused", "go")
        .with_schema(schema);
    match extract(options) {
        Err(XsdError::Resolution { reason, .. }) => {
            assert!(reason.contains("urn:example:address"), "reason was {reason}");
        }
        other => panic!("expected a resolution error, got {other:?}"),
    }
}
