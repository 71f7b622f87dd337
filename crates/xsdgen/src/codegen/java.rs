//! Java emitter: package-private classes with public fields.

use super::naming::enum_variant_identifiers;
use super::primitives::primitive;
use super::{
    doc_lines, enum_values, field_identifiers, import_comments, type_identifier, type_name,
    CodeGenerator, Shape, HEADER,
};
use crate::options::Lang;
use crate::proto_tree::{AliasDecl, Builtin, EnumDecl, Field, FieldType, ProtoTree, StructDecl, TypeDecl};
use crate::Result;

pub struct JavaGenerator;

impl CodeGenerator for JavaGenerator {
    fn lang(&self) -> Lang {
        Lang::Java
    }

    fn generate(&self, tree: &ProtoTree) -> Result<String> {
        let mut output = format!("// {HEADER}\n");
        if !tree.imports.is_empty() {
            output.push('\n');
            output.push_str(&import_comments(tree));
        }
        for decl in &tree.decls {
            output.push('\n');
            match decl {
                TypeDecl::Struct(s) => output.push_str(&render_class(s)),
                TypeDecl::Enum(e) => output.push_str(&render_enum(e)),
                TypeDecl::Alias(a) => output.push_str(&render_alias(a)),
            }
        }
        Ok(output)
    }
}

fn javadoc(out: &mut String, doc: Option<&str>, indent: &str) {
    let lines = doc_lines(doc);
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("{indent}/**\n"));
    for line in lines {
        out.push_str(&format!("{indent} * {line}\n"));
    }
    out.push_str(&format!("{indent} */\n"));
}

fn render_class(s: &StructDecl) -> String {
    let mut out = String::new();
    javadoc(&mut out, s.doc.as_deref(), "");
    if let Some(element) = &s.element {
        out.push_str(&format!("// XML element: {}\n", element.name));
    }
    out.push_str(&format!("class {} {{\n", type_identifier(&s.name)));
    for (field, name) in s.fields.iter().zip(field_identifiers(&s.fields)) {
        javadoc(&mut out, field.doc.as_deref(), "    ");
        out.push_str(&format!("    public {} {};\n", field_type(field), name));
    }
    out.push_str("}\n");
    out
}

fn field_type(field: &Field) -> String {
    match Shape::of(field) {
        Shape::One => java_type(&field.ty, false),
        Shape::Optional => java_type(&field.ty, true),
        Shape::Many | Shape::OptionalMany => {
            format!("java.util.List<{}>", java_type(&field.ty, true))
        }
    }
}

/// Primitive or boxed spelling of `ty`; named types are classes already.
fn java_type(ty: &FieldType, boxed: bool) -> String {
    if boxed {
        type_name(ty, |p| p.java_boxed)
    } else {
        type_name(ty, |p| p.java)
    }
}

fn render_enum(e: &EnumDecl) -> String {
    let mut out = String::new();
    let name = type_identifier(&e.name);
    // Only literals Java can spell without a suffix or cast stay numeric.
    let typed = match e.base {
        Builtin::Int | Builtin::Double | Builtin::Boolean => enum_values(e),
        _ => None,
    };
    let (value_type, values) = match typed {
        Some(values) => (primitive(e.base).java, values),
        None => ("String", e.literals.iter().map(|l| format!("{l:?}")).collect()),
    };
    javadoc(&mut out, e.doc.as_deref(), "");
    if let Some(element) = &e.element {
        out.push_str(&format!("// XML element: {}\n", element.name));
    }
    out.push_str(&format!("enum {name} {{\n"));
    let variants = enum_variant_identifiers(&e.literals);
    let entries: Vec<String> = variants
        .iter()
        .zip(&values)
        .map(|(variant, value)| format!("    {variant}({value})"))
        .collect();
    out.push_str(&entries.join(",\n"));
    out.push_str(";\n\n");
    out.push_str(&format!("    public final {value_type} value;\n\n"));
    out.push_str(&format!(
        "    {name}({value_type} value) {{\n        this.value = value;\n    }}\n"
    ));
    out.push_str("}\n");
    out
}

/// Java has no type aliases: a simple type becomes a single-value class.
fn render_alias(a: &AliasDecl) -> String {
    let mut out = String::new();
    javadoc(&mut out, a.doc.as_deref(), "");
    for facet in &a.facets {
        out.push_str(&format!("// {facet}\n"));
    }
    if let Some(element) = &a.element {
        out.push_str(&format!("// XML element: {}\n", element.name));
    }
    let value = if a.collection {
        format!("java.util.List<{}>", java_type(&a.target, true))
    } else {
        java_type(&a.target, false)
    };
    out.push_str(&format!(
        "class {} {{\n    public {} value;\n}}\n",
        type_identifier(&a.name),
        value
    ));
    out
}
