//! Rust emitter: `serde` data types in the `quick-xml` naming convention
//! (`@name` for attributes, `$text` for character data).

use super::naming::{enum_variant_identifiers, uniquify};
use super::{
    doc_lines, field_identifier, import_comments, type_identifier, type_name, CodeGenerator,
    Shape, HEADER,
};
use crate::options::Lang;
use crate::proto_tree::{AliasDecl, EnumDecl, Field, FieldKind, ProtoTree, StructDecl, TypeDecl};
use crate::Result;
use heck::ToSnakeCase;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["crate", "self", "super", "Self"];

pub struct RustGenerator;

impl CodeGenerator for RustGenerator {
    fn lang(&self) -> Lang {
        Lang::Rust
    }

    fn generate(&self, tree: &ProtoTree) -> Result<String> {
        let mut output = format!("// {HEADER}\n\nuse serde::{{Deserialize, Serialize}};\n");
        if !tree.imports.is_empty() {
            output.push('\n');
            output.push_str(&import_comments(tree));
        }
        for decl in &tree.decls {
            output.push('\n');
            match decl {
                TypeDecl::Struct(s) => output.push_str(&render_struct(s)),
                TypeDecl::Enum(e) => output.push_str(&render_enum(e)),
                TypeDecl::Alias(a) => output.push_str(&render_alias(a)),
            }
        }
        Ok(output)
    }
}

/// snake_case field names of a struct, distinct in field order and escaped
/// where they collide with a keyword.
pub fn field_names(fields: &[Field]) -> Vec<String> {
    uniquify(fields.iter().map(|f| field_identifier(f).to_snake_case()))
        .into_iter()
        .map(|name| {
            if KEYWORDS.contains(&name.as_str()) {
                format!("r#{name}")
            } else if RESERVED.contains(&name.as_str()) {
                format!("{name}_")
            } else {
                name
            }
        })
        .collect()
}

fn doc_comment(out: &mut String, doc: Option<&str>, indent: &str) {
    for line in doc_lines(doc) {
        out.push_str(&format!("{indent}/// {line}\n"));
    }
}

fn render_struct(s: &StructDecl) -> String {
    let mut out = String::new();
    doc_comment(&mut out, s.doc.as_deref(), "");
    out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    if let Some(element) = &s.element {
        out.push_str(&format!("#[serde(rename = \"{}\")]\n", element.name.local));
    }
    out.push_str(&format!("pub struct {} {{\n", type_identifier(&s.name)));
    for (field, name) in s.fields.iter().zip(field_names(&s.fields)) {
        doc_comment(&mut out, field.doc.as_deref(), "    ");
        out.push_str(&format!("    {}\n", serde_attribute(field)));
        out.push_str(&format!("    pub {}: {},\n", name, field_type(field)));
    }
    out.push_str("}\n");
    out
}

fn serde_attribute(field: &Field) -> String {
    let rename = match field.kind {
        FieldKind::Element => field.name.clone(),
        FieldKind::Attribute => format!("@{}", field.name),
        FieldKind::Text => "$text".to_string(),
        FieldKind::AnyElement => "$value".to_string(),
        FieldKind::AnyAttribute => return "#[serde(flatten)]".to_string(),
    };
    let extra = match Shape::of(field) {
        Shape::One => "",
        Shape::Optional => ", default, skip_serializing_if = \"Option::is_none\"",
        Shape::Many | Shape::OptionalMany => ", default",
    };
    format!("#[serde(rename = \"{rename}\"{extra})]")
}

fn field_type(field: &Field) -> String {
    if field.kind == FieldKind::AnyAttribute {
        return "std::collections::HashMap<String, String>".to_string();
    }
    let base = type_name(&field.ty, |p| p.rust);
    match Shape::of(field) {
        Shape::One => base,
        Shape::Optional if field.ty.is_struct() => format!("Option<Box<{base}>>"),
        Shape::Optional => format!("Option<{base}>"),
        Shape::Many | Shape::OptionalMany => format!("Vec<{base}>"),
    }
}

fn render_enum(e: &EnumDecl) -> String {
    let mut out = String::new();
    doc_comment(&mut out, e.doc.as_deref(), "");
    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
    out.push_str(&format!("pub enum {} {{\n", type_identifier(&e.name)));
    let variants = enum_variant_identifiers(&e.literals);
    for (variant, literal) in variants.iter().zip(&e.literals) {
        out.push_str(&format!("    #[serde(rename = {literal:?})]\n    {variant},\n"));
    }
    out.push_str("}\n");
    out
}

fn render_alias(a: &AliasDecl) -> String {
    let mut out = String::new();
    doc_comment(&mut out, a.doc.as_deref(), "");
    for facet in &a.facets {
        out.push_str(&format!("// {facet}\n"));
    }
    let target = type_name(&a.target, |p| p.rust);
    let target = if a.collection {
        format!("Vec<{target}>")
    } else {
        target
    };
    out.push_str(&format!("pub type {} = {};\n", type_identifier(&a.name), target));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto_tree::{Builtin, ElementBinding, FieldType, NamedKind};
    use crate::qname::QName;
    use pretty_assertions::assert_eq;

    fn field(kind: FieldKind, name: &str, ty: FieldType, optional: bool, collection: bool) -> Field {
        Field {
            name: name.to_string(),
            namespace: None,
            kind,
            ty,
            optional,
            collection,
            default: None,
            doc: None,
        }
    }

    #[test]
    fn test_struct_with_renames() {
        let s = StructDecl {
            name: QName::new("", "order"),
            doc: Some("An order.".to_string()),
            element: Some(ElementBinding::own(QName::new("", "order"))),
            fields: vec![
                field(FieldKind::Attribute, "type", FieldType::builtin(Builtin::String), false, false),
                field(
                    FieldKind::Element,
                    "parent",
                    FieldType::Named {
                        name: QName::new("", "order"),
                        kind: NamedKind::Struct,
                    },
                    true,
                    false,
                ),
                field(FieldKind::Element, "line-item", FieldType::builtin(Builtin::Int), false, true),
                Field::text(FieldType::builtin(Builtin::String)),
            ],
        };
        let expected = "\
/// An order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = \"order\")]
pub struct Order {
    #[serde(rename = \"@type\")]
    pub type_attr: String,
    #[serde(rename = \"parent\", default, skip_serializing_if = \"Option::is_none\")]
    pub parent: Option<Box<Order>>,
    #[serde(rename = \"line-item\", default)]
    pub line_item: Vec<i32>,
    #[serde(rename = \"$text\")]
    pub value: String,
}
";
        assert_eq!(render_struct(&s), expected);
    }

    #[test]
    fn test_keyword_fields_are_escaped() {
        let string = FieldType::builtin(Builtin::String);
        let fields = [
            field(FieldKind::Element, "type", string.clone(), false, false),
            field(FieldKind::Element, "self", string, false, false),
        ];
        assert_eq!(field_names(&fields), ["r#type", "self_"]);
    }

    #[test]
    fn test_field_names_are_distinct() {
        let string = FieldType::builtin(Builtin::String);
        let fields = [
            field(FieldKind::Element, "value", string.clone(), false, false),
            field(FieldKind::Element, "any", string.clone(), true, false),
            field(FieldKind::AnyElement, "", FieldType::builtin(Builtin::AnyType), true, true),
            Field::text(string),
        ];
        assert_eq!(field_names(&fields), ["value", "any", "any2", "value2"]);
    }

    #[test]
    fn test_enum_renames_literals() {
        let code = render_enum(&EnumDecl {
            name: QName::new("", "status"),
            doc: None,
            base: Builtin::String,
            literals: vec!["in-progress".to_string()],
            element: None,
        });
        assert!(code.contains("    #[serde(rename = \"in-progress\")]\n    InProgress,\n"));
    }
}
