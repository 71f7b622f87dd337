//! C emitter: a self-contained header.
//!
//! Enumerations come first, then forward `typedef`s so that structs may point
//! at each other in any order, then aliases with every alias after the alias
//! it names, then the struct bodies. Struct-typed and optional members are
//! pointers; collections are a pointer plus a `Len` count.

use super::naming::enum_variant_identifiers;
use super::{
    doc_lines, enum_values, field_identifiers, import_source, type_identifier, type_name,
    with_extension, CodeGenerator, Shape, HEADER,
};
use crate::options::Lang;
use crate::proto_tree::{
    AliasDecl, EnumDecl, Field, FieldType, NamedKind, ProtoTree, StructDecl, TypeDecl,
};
use crate::qname::QName;
use crate::Result;
use heck::ToShoutySnakeCase;
use std::collections::{HashMap, HashSet};

pub struct CGenerator;

impl CodeGenerator for CGenerator {
    fn lang(&self) -> Lang {
        Lang::C
    }

    fn generate(&self, tree: &ProtoTree) -> Result<String> {
        let stem = tree
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schema".to_string());
        let guard = include_guard(&stem);

        let mut output = format!("// {HEADER}\n\n#ifndef {guard}\n#define {guard}\n\n");
        output.push_str("#include <stdbool.h>\n#include <stddef.h>\n#include <stdint.h>\n");
        for import in &tree.imports {
            let header = with_extension(&import_source(import), Lang::C.extension());
            output.push_str(&format!("#include \"{header}\"\n"));
        }

        for decl in &tree.decls {
            if let TypeDecl::Enum(e) = decl {
                output.push_str(&format!("\n{}", render_enum(e)));
            }
        }

        let structs: Vec<&StructDecl> = tree.structs().collect();
        if !structs.is_empty() {
            output.push('\n');
            for s in &structs {
                let name = type_identifier(&s.name);
                output.push_str(&format!("typedef struct {name} {name};\n"));
            }
        }
        for a in aliases_in_dependency_order(tree) {
            output.push_str(&format!("\n{}", render_alias(a)));
        }
        for s in structs {
            output.push_str(&format!("\n{}", render_struct(s)));
        }

        output.push_str(&format!("\n#endif // {guard}\n"));
        Ok(output)
    }
}

/// `<FILE_NAME>_H`, restricted to characters valid in a macro name.
fn include_guard(file_name: &str) -> String {
    let guard: String = format!("{}_H", file_name.to_shouty_snake_case())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        format!("XSD_{guard}")
    } else {
        guard
    }
}

/// Aliases in document order, except that an alias of another alias always
/// follows it.
fn aliases_in_dependency_order(tree: &ProtoTree) -> Vec<&AliasDecl> {
    let aliases: HashMap<&QName, &AliasDecl> = tree
        .decls
        .iter()
        .filter_map(|d| match d {
            TypeDecl::Alias(a) => Some((&a.name, a)),
            _ => None,
        })
        .collect();

    fn visit<'t>(
        alias: &'t AliasDecl,
        aliases: &HashMap<&QName, &'t AliasDecl>,
        visited: &mut HashSet<&'t QName>,
        ordered: &mut Vec<&'t AliasDecl>,
    ) {
        if !visited.insert(&alias.name) {
            return;
        }
        if let FieldType::Named {
            name,
            kind: NamedKind::Alias,
        } = &alias.target
        {
            if let Some(target) = aliases.get(name) {
                visit(target, aliases, visited, ordered);
            }
        }
        ordered.push(alias);
    }

    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    for decl in &tree.decls {
        if let TypeDecl::Alias(a) = decl {
            visit(a, &aliases, &mut visited, &mut ordered);
        }
    }
    ordered
}

fn comment(out: &mut String, doc: Option<&str>, indent: &str) {
    for line in doc_lines(doc) {
        out.push_str(&format!("{indent}// {line}\n"));
    }
}

fn c_type(ty: &FieldType) -> String {
    type_name(ty, |p| p.c)
}

/// `type name` with the pointer star attached to the name.
fn declaration(ty: &str, name: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

fn pointer(ty: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}*")
    } else {
        format!("{ty} *")
    }
}

fn render_struct(s: &StructDecl) -> String {
    let mut out = String::new();
    comment(&mut out, s.doc.as_deref(), "");
    if let Some(element) = &s.element {
        out.push_str(&format!("// XML element: {}\n", element.name));
    }
    out.push_str(&format!("struct {} {{\n", type_identifier(&s.name)));
    for (field, name) in s.fields.iter().zip(field_identifiers(&s.fields)) {
        comment(&mut out, field.doc.as_deref(), "    ");
        out.push_str(&render_member(field, &name));
    }
    out.push_str("};\n");
    out
}

fn render_member(field: &Field, name: &str) -> String {
    let base = c_type(&field.ty);
    match Shape::of(field) {
        Shape::Many | Shape::OptionalMany => format!(
            "    {};\n    size_t {}Len;\n",
            declaration(&pointer(&base), &name),
            name
        ),
        Shape::Optional if base.ends_with('*') => {
            format!("    {}; // optional\n", declaration(&base, &name))
        }
        Shape::Optional => format!("    {}; // optional\n", declaration(&pointer(&base), &name)),
        Shape::One if field.ty.is_struct() => {
            format!("    {};\n", declaration(&pointer(&base), &name))
        }
        Shape::One => format!("    {};\n", declaration(&base, &name)),
    }
}

fn render_enum(e: &EnumDecl) -> String {
    let mut out = String::new();
    let name = type_identifier(&e.name);
    comment(&mut out, e.doc.as_deref(), "");
    out.push_str("typedef enum {\n");
    // Enumerator values must be integer constants.
    let values = enum_values(e).filter(|values| values.iter().all(|v| v.parse::<i64>().is_ok()));
    let variants = enum_variant_identifiers(&e.literals);
    for (i, (variant, literal)) in variants.iter().zip(&e.literals).enumerate() {
        match &values {
            Some(values) => out.push_str(&format!("    {name}_{variant} = {},\n", values[i])),
            None => out.push_str(&format!("    {name}_{variant}, // {literal:?}\n")),
        }
    }
    out.push_str(&format!("}} {name};\n"));
    out
}

fn render_alias(a: &AliasDecl) -> String {
    let mut out = String::new();
    comment(&mut out, a.doc.as_deref(), "");
    for facet in &a.facets {
        out.push_str(&format!("// {facet}\n"));
    }
    let target = c_type(&a.target);
    let name = type_identifier(&a.name);
    let target = if a.collection || a.target.is_struct() {
        pointer(&target)
    } else {
        target
    };
    out.push_str(&format!("typedef {};\n", declaration(&target, &name)));
    out
}
