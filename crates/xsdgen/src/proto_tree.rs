//! The prototype tree: a resolved, language-agnostic view of one schema file.
//!
//! Every reference in a [`ProtoTree`] has already been checked against the
//! whole include/import closure, and cardinality has been folded into each
//! [`Field`]. Code generators only have to template syntax.

use crate::qname::QName;
use crate::schema_model::Facet;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;

/// XSD builtin datatypes, collapsed to the distinctions generators care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Builtin {
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    /// Unbounded `xs:integer` and its sign-restricted subtypes.
    Integer,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    DateTime,
    Date,
    Time,
    Duration,
    Base64Binary,
    HexBinary,
    AnyUri,
    QName,
    AnySimpleType,
    /// Opaque content: `xs:anyType`, wildcards and unknown builtins.
    AnyType,
}

impl Builtin {
    /// Map a local name in the XSD namespace, `None` when it is not a builtin.
    pub fn from_local(local: &str) -> Option<Self> {
        let builtin = match local {
            "string" | "normalizedString" | "token" | "language" | "Name" | "NCName" | "ID"
            | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "NMTOKEN" | "NMTOKENS" | "NOTATION" => {
                Builtin::String
            }
            "boolean" => Builtin::Boolean,
            "decimal" => Builtin::Decimal,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "integer" | "nonNegativeInteger" | "positiveInteger" | "nonPositiveInteger"
            | "negativeInteger" => Builtin::Integer,
            "long" => Builtin::Long,
            "int" => Builtin::Int,
            "short" => Builtin::Short,
            "byte" => Builtin::Byte,
            "unsignedLong" => Builtin::UnsignedLong,
            "unsignedInt" => Builtin::UnsignedInt,
            "unsignedShort" => Builtin::UnsignedShort,
            "unsignedByte" => Builtin::UnsignedByte,
            "dateTime" | "dateTimeStamp" => Builtin::DateTime,
            "date" | "gYear" | "gYearMonth" | "gMonth" | "gMonthDay" | "gDay" => Builtin::Date,
            "time" => Builtin::Time,
            "duration" | "dayTimeDuration" | "yearMonthDuration" => Builtin::Duration,
            "base64Binary" => Builtin::Base64Binary,
            "hexBinary" => Builtin::HexBinary,
            "anyURI" => Builtin::AnyUri,
            "QName" => Builtin::QName,
            "anySimpleType" | "anyAtomicType" => Builtin::AnySimpleType,
            "anyType" => Builtin::AnyType,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Builtin::Decimal
                | Builtin::Float
                | Builtin::Double
                | Builtin::Integer
                | Builtin::Long
                | Builtin::Int
                | Builtin::Short
                | Builtin::Byte
                | Builtin::UnsignedLong
                | Builtin::UnsignedInt
                | Builtin::UnsignedShort
                | Builtin::UnsignedByte
        )
    }
}

/// What a named field type refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NamedKind {
    Struct,
    Enum,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Builtin { builtin: Builtin },
    Named { name: QName, kind: NamedKind },
}

impl FieldType {
    pub fn builtin(builtin: Builtin) -> Self {
        FieldType::Builtin { builtin }
    }

    pub fn is_struct(&self) -> bool {
        matches!(
            self,
            FieldType::Named {
                kind: NamedKind::Struct,
                ..
            }
        )
    }
}

/// Where a field lives in the XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    Element,
    Attribute,
    /// Character data of a simple-content or mixed type.
    Text,
    /// `xs:any`
    AnyElement,
    /// `xs:anyAttribute`
    AnyAttribute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// XML local name (empty for text content and wildcards).
    pub name: String,
    /// Namespace of a referenced global element or attribute from another namespace.
    pub namespace: Option<String>,
    pub kind: FieldKind,
    pub ty: FieldType,
    pub optional: bool,
    pub collection: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
}

impl Field {
    pub fn text(ty: FieldType) -> Self {
        Field {
            name: String::new(),
            namespace: None,
            kind: FieldKind::Text,
            ty,
            optional: false,
            collection: false,
            default: None,
            doc: None,
        }
    }
}

/// A top-level element represented by a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementBinding {
    pub name: QName,
    /// The declaration is also a named type that other declarations use, so
    /// the element name must not be fixed on it.
    pub shared: bool,
}

impl ElementBinding {
    /// The declaration exists only for this element.
    pub fn own(name: QName) -> Self {
        ElementBinding {
            name,
            shared: false,
        }
    }

    pub fn shared(name: QName) -> Self {
        ElementBinding { name, shared: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: QName,
    pub doc: Option<String>,
    /// Set when the struct also stands for a top-level element.
    pub element: Option<ElementBinding>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: QName,
    pub doc: Option<String>,
    /// Value space of the literals.
    pub base: Builtin,
    pub literals: Vec<String>,
    pub element: Option<ElementBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasDecl {
    pub name: QName,
    pub doc: Option<String>,
    pub target: FieldType,
    /// An `xs:list` type: a whitespace-separated sequence of `target`.
    pub collection: bool,
    pub facets: Vec<Facet>,
    /// Set when the alias stands for a top-level element of simple type.
    pub element: Option<ElementBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDecl {
    Struct(StructDecl),
    Enum(EnumDecl),
    Alias(AliasDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &QName {
        match self {
            TypeDecl::Struct(s) => &s.name,
            TypeDecl::Enum(e) => &e.name,
            TypeDecl::Alias(a) => &a.name,
        }
    }

    pub fn element(&self) -> Option<&ElementBinding> {
        match self {
            TypeDecl::Struct(s) => s.element.as_ref(),
            TypeDecl::Enum(e) => e.element.as_ref(),
            TypeDecl::Alias(a) => a.element.as_ref(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            TypeDecl::Struct(s) => s.doc.as_deref(),
            TypeDecl::Enum(e) => e.doc.as_deref(),
            TypeDecl::Alias(a) => a.doc.as_deref(),
        }
    }
}

/// Declarations the tree refers to but another file of the closure declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    /// The declaring file, relative to the root file's directory.
    pub source: PathBuf,
    /// Referenced declarations, in order of first use.
    pub names: Vec<QName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtoTree {
    /// The root schema file.
    pub source: PathBuf,
    pub target_namespace: String,
    pub imports: Vec<Import>,
    pub decls: Vec<TypeDecl>,
}

impl ProtoTree {
    pub fn get(&self, local: &str) -> Option<&TypeDecl> {
        self.decls.iter().find(|d| d.name().local == local)
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.decls.iter().filter_map(|d| match d {
            TypeDecl::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(Builtin::from_local("token"), Some(Builtin::String));
        assert_eq!(Builtin::from_local("positiveInteger"), Some(Builtin::Integer));
        assert_eq!(Builtin::from_local("gYear"), Some(Builtin::Date));
        assert_eq!(Builtin::from_local("anyType"), Some(Builtin::AnyType));
        assert_eq!(Builtin::from_local("notABuiltin"), None);
    }

    #[test]
    fn test_tree_serializes_to_json() {
        let tree = ProtoTree {
            source: PathBuf::from("book.xsd"),
            target_namespace: "urn:book".to_string(),
            imports: Vec::new(),
            decls: vec![TypeDecl::Struct(StructDecl {
                name: QName::new("urn:book", "Book"),
                doc: None,
                element: None,
                fields: vec![Field {
                    name: "title".to_string(),
                    namespace: None,
                    kind: FieldKind::Element,
                    ty: FieldType::builtin(Builtin::String),
                    optional: false,
                    collection: false,
                    default: None,
                    doc: None,
                }],
            })],
        };
        let json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
        assert_eq!(json["decls"][0]["kind"], "struct");
        assert_eq!(json["decls"][0]["fields"][0]["ty"]["builtin"], "String");
        assert!(tree.get("Book").is_some());
        assert_eq!(tree.structs().count(), 1);
    }
}
