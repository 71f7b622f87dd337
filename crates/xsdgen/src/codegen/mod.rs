//! Code generation from a [`ProtoTree`].
//!
//! Each target language implements [`CodeGenerator`]. Type mapping
//! ([`primitives`]), field shape and identifier derivation ([`naming`]) are
//! shared so that every language exposes the same fields with the same
//! optionality; the language modules only template syntax.

pub mod c;
pub mod go;
pub mod java;
pub mod naming;
pub mod primitives;
pub mod rust;
pub mod typescript;

pub use naming::with_extension;

use crate::options::Lang;
use crate::proto_tree::{Builtin, EnumDecl, Field, FieldKind, FieldType, Import, ProtoTree};
use crate::qname::QName;
use crate::Result;
use itertools::Itertools;
use naming::{identifier, uniquify};
use primitives::{primitive, Primitive};

/// First line of every generated file, as a comment.
pub const HEADER: &str = "Code generated by xsdgen. DO NOT EDIT.";

pub trait CodeGenerator {
    fn lang(&self) -> Lang;

    /// Render the whole tree as one source file.
    fn generate(&self, tree: &ProtoTree) -> Result<String>;
}

pub fn generator_for(lang: Lang) -> Box<dyn CodeGenerator> {
    match lang {
        Lang::Go => Box::new(go::GoGenerator),
        Lang::TypeScript => Box::new(typescript::TypeScriptGenerator),
        Lang::C => Box::new(c::CGenerator),
        Lang::Java => Box::new(java::JavaGenerator),
        Lang::Rust => Box::new(rust::RustGenerator),
    }
}

/// Cardinality of a field as seen by the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    One,
    Optional,
    Many,
    OptionalMany,
}

impl Shape {
    pub fn of(field: &Field) -> Shape {
        match (field.optional, field.collection) {
            (false, false) => Shape::One,
            (true, false) => Shape::Optional,
            (false, true) => Shape::Many,
            (true, true) => Shape::OptionalMany,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, Shape::Many | Shape::OptionalMany)
    }
}

pub fn type_identifier(name: &QName) -> String {
    identifier(&name.local)
}

/// PascalCase field identifier. Attributes carry an `Attr` suffix so they
/// never clash with a child element of the same name.
pub fn field_identifier(field: &Field) -> String {
    match field.kind {
        FieldKind::Element => identifier(&field.name),
        FieldKind::Attribute => format!("{}Attr", identifier(&field.name)),
        FieldKind::Text => "Value".to_string(),
        FieldKind::AnyElement => "Any".to_string(),
        FieldKind::AnyAttribute => "AnyAttr".to_string(),
    }
}

/// [`field_identifier`] for every field of a struct, made distinct in field
/// order: text content next to a `value` element yields `Value` and `Value2`.
pub fn field_identifiers(fields: &[Field]) -> Vec<String> {
    uniquify(fields.iter().map(field_identifier))
}

/// Literals of a numeric or boolean enumeration as constants every target
/// language accepts (`07` is `7`, `1` is `true`).
///
/// `None` when the base is not numeric or boolean, or when any literal has
/// no such spelling; the enumeration is then carried as strings.
pub fn enum_values(e: &EnumDecl) -> Option<Vec<String>> {
    e.literals
        .iter()
        .map(|literal| canonical_literal(e.base, literal))
        .collect()
}

fn canonical_literal(base: Builtin, literal: &str) -> Option<String> {
    let literal = literal.trim();
    match base {
        Builtin::Boolean => match literal {
            "true" | "1" => Some("true".to_string()),
            "false" | "0" => Some("false".to_string()),
            _ => None,
        },
        Builtin::Decimal | Builtin::Float | Builtin::Double => {
            let value: f64 = literal.parse().ok()?;
            value.is_finite().then(|| value.to_string())
        }
        _ => {
            let (min, max) = integer_range(base)?;
            let value: i128 = literal.strip_prefix('+').unwrap_or(literal).parse().ok()?;
            (min..=max).contains(&value).then(|| value.to_string())
        }
    }
}

/// Value range of the native type an integer builtin maps to.
fn integer_range(base: Builtin) -> Option<(i128, i128)> {
    let range: (i128, i128) = match base {
        Builtin::Integer | Builtin::Long => (i64::MIN.into(), i64::MAX.into()),
        Builtin::Int => (i32::MIN.into(), i32::MAX.into()),
        Builtin::Short => (i16::MIN.into(), i16::MAX.into()),
        Builtin::Byte => (i8::MIN.into(), i8::MAX.into()),
        Builtin::UnsignedLong => (0, u64::MAX.into()),
        Builtin::UnsignedInt => (0, u32::MAX.into()),
        Builtin::UnsignedShort => (0, u16::MAX.into()),
        Builtin::UnsignedByte => (0, u8::MAX.into()),
        _ => return None,
    };
    Some(range)
}

/// The declaring file of an import, `/`-separated.
pub(crate) fn import_source(import: &Import) -> String {
    import
        .source
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .join("/")
}

/// Type identifiers an import brings in, without repeats.
pub(crate) fn imported_identifiers(import: &Import) -> Vec<String> {
    import.names.iter().map(type_identifier).unique().collect()
}

/// One comment line per import, for languages whose generated files share
/// a package and need no import statement.
pub(crate) fn import_comments(tree: &ProtoTree) -> String {
    tree.imports
        .iter()
        .map(|import| {
            format!(
                "// From {}: {}\n",
                import_source(import),
                imported_identifiers(import).join(", ")
            )
        })
        .collect()
}

/// Native spelling of `ty` given a primitive column and a named-type mapper.
pub(crate) fn type_name(
    ty: &FieldType,
    column: impl Fn(Primitive) -> &'static str,
) -> String {
    match ty {
        FieldType::Builtin { builtin } => column(primitive(*builtin)).to_string(),
        FieldType::Named { name, .. } => type_identifier(name),
    }
}

/// Documentation split into lines, empty when absent.
pub(crate) fn doc_lines(doc: Option<&str>) -> Vec<&str> {
    doc.map(|d| d.lines().collect()).unwrap_or_default()
}
