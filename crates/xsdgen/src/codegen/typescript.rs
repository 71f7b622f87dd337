//! TypeScript emitter: exported interfaces, enums and type aliases.

use super::naming::enum_variant_identifiers;
use super::{
    doc_lines, enum_values, field_identifiers, import_source, imported_identifiers,
    type_identifier, type_name, CodeGenerator, Shape, HEADER,
};
use crate::options::Lang;
use crate::proto_tree::{AliasDecl, EnumDecl, Field, FieldKind, ProtoTree, StructDecl, TypeDecl};
use crate::Result;

pub struct TypeScriptGenerator;

impl CodeGenerator for TypeScriptGenerator {
    fn lang(&self) -> Lang {
        Lang::TypeScript
    }

    fn generate(&self, tree: &ProtoTree) -> Result<String> {
        let mut output = format!("// {HEADER}\n");
        if !tree.imports.is_empty() {
            output.push('\n');
        }
        for import in &tree.imports {
            let source = import_source(import);
            let module = if source.starts_with("../") {
                source
            } else {
                format!("./{source}")
            };
            output.push_str(&format!(
                "import {{ {} }} from \"{module}\";\n",
                imported_identifiers(import).join(", ")
            ));
        }
        for decl in &tree.decls {
            output.push('\n');
            match decl {
                TypeDecl::Struct(s) => output.push_str(&render_interface(s)),
                TypeDecl::Enum(e) => output.push_str(&render_enum(e)),
                TypeDecl::Alias(a) => output.push_str(&render_alias(a)),
            }
        }
        Ok(output)
    }
}

fn jsdoc(out: &mut String, doc: Option<&str>, indent: &str) {
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

fn render_interface(s: &StructDecl) -> String {
    let mut out = String::new();
    jsdoc(&mut out, s.doc.as_deref(), "");
    out.push_str(&format!("export interface {} {{\n", type_identifier(&s.name)));
    for (field, name) in s.fields.iter().zip(field_identifiers(&s.fields)) {
        jsdoc(&mut out, field.doc.as_deref(), "  ");
        let marker = if field.optional { "?" } else { "" };
        out.push_str(&format!("  {}{}: {};\n", name, marker, field_type(field)));
    }
    out.push_str("}\n");
    out
}

fn field_type(field: &Field) -> String {
    if field.kind == FieldKind::AnyAttribute {
        return "Record<string, string>".to_string();
    }
    let base = type_name(&field.ty, |p| p.typescript);
    if Shape::of(field).is_many() {
        format!("{base}[]")
    } else {
        base
    }
}

fn render_enum(e: &EnumDecl) -> String {
    let mut out = String::new();
    jsdoc(&mut out, e.doc.as_deref(), "");
    out.push_str(&format!("export enum {} {{\n", type_identifier(&e.name)));
    // TypeScript enum members are numbers or strings only.
    let values = match enum_values(e) {
        Some(values) if e.base.is_numeric() => values,
        _ => e.literals.iter().map(|l| format!("{l:?}")).collect(),
    };
    let variants = enum_variant_identifiers(&e.literals);
    for (variant, value) in variants.iter().zip(&values) {
        out.push_str(&format!("  {variant} = {value},\n"));
    }
    out.push_str("}\n");
    out
}

fn render_alias(a: &AliasDecl) -> String {
    let mut out = String::new();
    jsdoc(&mut out, a.doc.as_deref(), "");
    for facet in &a.facets {
        out.push_str(&format!("// {facet}\n"));
    }
    let target = type_name(&a.target, |p| p.typescript);
    let suffix = if a.collection { "[]" } else { "" };
    out.push_str(&format!(
        "export type {} = {}{};\n",
        type_identifier(&a.name),
        target,
        suffix
    ));
    out
}
