//! Go emitter: `encoding/xml` tagged structs.

use super::naming::enum_variant_identifiers;
use super::{
    doc_lines, enum_values, field_identifiers, import_comments, type_identifier, type_name,
    CodeGenerator, Shape, HEADER,
};
use crate::options::Lang;
use crate::proto_tree::{
    AliasDecl, EnumDecl, Field, FieldKind, FieldType, ProtoTree, StructDecl, TypeDecl,
};
use crate::qname::QName;
use crate::Result;
use std::collections::HashSet;

const ANY_ELEMENT: &str = "AnyElement";

pub struct GoGenerator;

impl CodeGenerator for GoGenerator {
    fn lang(&self) -> Lang {
        Lang::Go
    }

    fn generate(&self, tree: &ProtoTree) -> Result<String> {
        let mut output = format!("// {HEADER}\n\npackage schema\n");

        if needs_xml_import(tree) {
            output.push_str("\nimport (\n\t\"encoding/xml\"\n)\n");
        }
        if !tree.imports.is_empty() {
            output.push('\n');
            output.push_str(&import_comments(tree));
        }

        let mut taken: HashSet<String> = tree
            .decls
            .iter()
            .map(|d| type_identifier(d.name()))
            .collect();
        taken.insert(ANY_ELEMENT.to_string());

        for decl in &tree.decls {
            output.push('\n');
            match decl {
                TypeDecl::Struct(s) => output.push_str(&render_struct(s)),
                TypeDecl::Enum(e) => output.push_str(&render_enum(e)),
                TypeDecl::Alias(a) => output.push_str(&render_alias(a)),
            }
            if let Some(wrapper) = element_wrapper(decl, &mut taken) {
                output.push('\n');
                output.push_str(&wrapper);
            }
        }

        if uses_any_element(tree) {
            output.push_str(&format!(
                "\n// {ANY_ELEMENT} holds an element matched by a wildcard.\n\
                 type {ANY_ELEMENT} struct {{\n\
                 \tXMLName xml.Name\n\
                 \tAttrs []xml.Attr `xml:\",any,attr\"`\n\
                 \tContent string `xml:\",innerxml\"`\n\
                 }}\n"
            ));
        }
        Ok(output)
    }
}

fn needs_xml_import(tree: &ProtoTree) -> bool {
    tree.decls.iter().any(|d| match d {
        TypeDecl::Struct(s) => {
            s.element.is_some()
                || s.fields
                    .iter()
                    .any(|f| matches!(f.kind, FieldKind::AnyElement | FieldKind::AnyAttribute))
        }
        TypeDecl::Alias(a) => a.element.is_some() && !a.collection,
        TypeDecl::Enum(e) => e.element.is_some(),
    })
}

/// A struct carrying the element name of a declaration that cannot carry it
/// itself: a named type also used by other declarations, or an enum.
///
/// Complex content is embedded; simple content becomes character data.
fn element_wrapper(decl: &TypeDecl, taken: &mut HashSet<String>) -> Option<String> {
    let element = decl.element()?;
    let simple = match decl {
        TypeDecl::Struct(_) if element.shared => false,
        TypeDecl::Alias(a) if element.shared && !a.collection => true,
        TypeDecl::Enum(_) => true,
        _ => return None,
    };
    let inner = type_identifier(decl.name());
    let base = format!("{inner}Element");
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{base}{n}");
        n += 1;
    }

    let mut out = format!("// {name} is the {} element.
", element.name.local);
    out.push_str(&format!("type {name} struct {{
"));
    out.push_str(&xml_name_field(&element.name));
    if simple {
        out.push_str(&format!("\tValue {inner} `xml:\",chardata\"`\n"));
    } else {
        out.push_str(&format!("\t{inner}\n"));
    }
    out.push_str("}\n");
    Some(out)
}

fn uses_any_element(tree: &ProtoTree) -> bool {
    tree.structs()
        .any(|s| s.fields.iter().any(|f| f.kind == FieldKind::AnyElement))
}

fn comment(out: &mut String, doc: Option<&str>, indent: &str) {
    for line in doc_lines(doc) {
        out.push_str(&format!("{indent}// {line}\n"));
    }
}

fn xml_name_field(element: &QName) -> String {
    format!("\tXMLName xml.Name `xml:\"{}\"`\n", qualified(element))
}

fn qualified(name: &QName) -> String {
    if name.namespace.is_empty() {
        name.local.clone()
    } else {
        format!("{} {}", name.namespace, name.local)
    }
}

fn render_struct(s: &StructDecl) -> String {
    let mut out = String::new();
    comment(&mut out, s.doc.as_deref(), "");
    out.push_str(&format!("type {} struct {{\n", type_identifier(&s.name)));
    if let Some(element) = s.element.as_ref().filter(|e| !e.shared) {
        out.push_str(&xml_name_field(&element.name));
    }
    for (field, name) in s.fields.iter().zip(field_identifiers(&s.fields)) {
        comment(&mut out, field.doc.as_deref(), "\t");
        out.push_str(&format!(
            "\t{} {} `xml:\"{}\"`\n",
            name,
            field_type(field),
            tag(field)
        ));
    }
    out.push_str("}\n");
    out
}

fn field_type(field: &Field) -> String {
    match field.kind {
        FieldKind::AnyElement => return format!("[]{ANY_ELEMENT}"),
        FieldKind::AnyAttribute => return "[]xml.Attr".to_string(),
        _ => {}
    }
    let base = go_type(&field.ty);
    match Shape::of(field) {
        Shape::Many | Shape::OptionalMany => format!("[]{base}"),
        Shape::Optional if !is_reference(&base) => format!("*{base}"),
        Shape::Optional | Shape::One => base,
    }
}

fn go_type(ty: &FieldType) -> String {
    type_name(ty, |p| p.go)
}

/// Slices and interfaces already have a nil value.
fn is_reference(go: &str) -> bool {
    go.starts_with("[]") || go == "interface{}"
}

/// The struct tag for `field`. Element order in the struct is document
/// order, so `xml.Marshal` reproduces the sequence.
fn tag(field: &Field) -> String {
    let name = match &field.namespace {
        Some(ns) => format!("{ns} {}", field.name),
        None => field.name.clone(),
    };
    let omitempty = if field.optional { ",omitempty" } else { "" };
    match field.kind {
        FieldKind::Element => format!("{name}{omitempty}"),
        FieldKind::Attribute => format!("{name},attr{omitempty}"),
        FieldKind::Text => ",chardata".to_string(),
        FieldKind::AnyElement => ",any".to_string(),
        FieldKind::AnyAttribute => ",any,attr".to_string(),
    }
}

fn render_enum(e: &EnumDecl) -> String {
    let mut out = String::new();
    let name = type_identifier(&e.name);
    let (base, values) = match enum_values(e) {
        Some(values) => (super::primitives::primitive(e.base).go, values),
        None => ("string", e.literals.iter().map(|l| quote(l)).collect()),
    };
    comment(&mut out, e.doc.as_deref(), "");
    out.push_str(&format!("type {name} {base}\n\nconst (\n"));
    let variants = enum_variant_identifiers(&e.literals);
    for (variant, value) in variants.iter().zip(&values) {
        out.push_str(&format!("\t{name}{variant} {name} = {value}\n"));
    }
    out.push_str(")\n");
    out
}

fn render_alias(a: &AliasDecl) -> String {
    let mut out = String::new();
    let name = type_identifier(&a.name);
    comment(&mut out, a.doc.as_deref(), "");
    for facet in &a.facets {
        out.push_str(&format!("// {facet}\n"));
    }
    let target = go_type(&a.target);
    match &a.element {
        // A top-level element needs a struct to carry its name.
        Some(element) if !element.shared && !a.collection => {
            out.push_str(&format!("type {name} struct {{\n"));
            out.push_str(&xml_name_field(&element.name));
            out.push_str(&format!("\tValue {target} `xml:\",chardata\"`\n}}\n"));
        }
        _ if a.collection => out.push_str(&format!("type {name} []{target}\n")),
        _ => out.push_str(&format!("type {name} {target}\n")),
    }
    out
}

fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
