//! Raw XSD declarations as harvested from a single document.
//!
//! Every relationship is a name reference ([`RawRef`]), never a link: XSD
//! allows forward references and references into files that have not been
//! parsed yet, so resolution waits until the whole include/import closure is
//! known (see [`crate::tree_builder`]).

use crate::qname::QName;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// XSD keeps a separate naming scope per kind of top-level component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SymbolSpace {
    Type,
    Element,
    Attribute,
    Group,
    AttributeGroup,
    /// Types synthesized for inline `<xs:complexType>`/`<xs:simpleType>`.
    AnonymousType,
}

impl fmt::Display for SymbolSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolSpace::Type => "type",
            SymbolSpace::Element => "element",
            SymbolSpace::Attribute => "attribute",
            SymbolSpace::Group => "group",
            SymbolSpace::AttributeGroup => "attributeGroup",
            SymbolSpace::AnonymousType => "anonymous type",
        };
        f.write_str(s)
    }
}

/// A reference to a named component, as written in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRef {
    pub name: QName,
    /// True when the namespace came from a prefix or a default `xmlns`;
    /// false when it was assumed from the document's target namespace and may
    /// be disambiguated later through the local-name map.
    pub explicit: bool,
    /// Points at a synthesized anonymous type rather than a named one.
    pub anonymous: bool,
}

impl RawRef {
    pub fn explicit(name: QName) -> Self {
        Self {
            name,
            explicit: true,
            anonymous: false,
        }
    }

    pub fn assumed(name: QName) -> Self {
        Self {
            name,
            explicit: false,
            anonymous: false,
        }
    }

    pub fn anonymous(name: QName) -> Self {
        Self {
            name,
            explicit: true,
            anonymous: true,
        }
    }

    pub fn builtin(local: &str) -> Self {
        Self::explicit(QName::new(crate::qname::XS_NS, local))
    }
}

/// Upper bound of an occurrence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

/// `minOccurs`/`maxOccurs` of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONCE
    }
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// `maxOccurs="0"`: the particle may not appear at all.
    pub fn is_prohibited(&self) -> bool {
        self.max == MaxOccurs::Bounded(0)
    }

    pub fn is_multiple(&self) -> bool {
        match self.max {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(n) => n > 1,
        }
    }

    /// Occurrence of a particle nested in a compositor (or group reference)
    /// that itself occurs `outer` times. Members of a `choice` are never
    /// individually required.
    pub fn within(self, outer: Occurs, in_choice: bool) -> Occurs {
        let min = if in_choice { 0 } else { self.min.saturating_mul(outer.min) };
        let max = match (self.max, outer.max) {
            (MaxOccurs::Bounded(0), _) | (_, MaxOccurs::Bounded(0)) => MaxOccurs::Bounded(0),
            (MaxOccurs::Unbounded, _) | (_, MaxOccurs::Unbounded) => MaxOccurs::Unbounded,
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.saturating_mul(b)),
        };
        Occurs { min, max }
    }
}

/// Constraining facets kept for documentation purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum Facet {
    Pattern(String),
    Length(String),
    MinLength(String),
    MaxLength(String),
    MinInclusive(String),
    MaxInclusive(String),
    MinExclusive(String),
    MaxExclusive(String),
    TotalDigits(String),
    FractionDigits(String),
    WhiteSpace(String),
}

impl Facet {
    pub fn from_tag(tag: &str, value: &str) -> Option<Self> {
        let value = value.to_string();
        let facet = match tag {
            "pattern" => Facet::Pattern(value),
            "length" => Facet::Length(value),
            "minLength" => Facet::MinLength(value),
            "maxLength" => Facet::MaxLength(value),
            "minInclusive" => Facet::MinInclusive(value),
            "maxInclusive" => Facet::MaxInclusive(value),
            "minExclusive" => Facet::MinExclusive(value),
            "maxExclusive" => Facet::MaxExclusive(value),
            "totalDigits" => Facet::TotalDigits(value),
            "fractionDigits" => Facet::FractionDigits(value),
            "whiteSpace" => Facet::WhiteSpace(value),
            _ => return None,
        };
        Some(facet)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = match self {
            Facet::Pattern(v) => ("pattern", v),
            Facet::Length(v) => ("length", v),
            Facet::MinLength(v) => ("minLength", v),
            Facet::MaxLength(v) => ("maxLength", v),
            Facet::MinInclusive(v) => ("minInclusive", v),
            Facet::MaxInclusive(v) => ("maxInclusive", v),
            Facet::MinExclusive(v) => ("minExclusive", v),
            Facet::MaxExclusive(v) => ("maxExclusive", v),
            Facet::TotalDigits(v) => ("totalDigits", v),
            Facet::FractionDigits(v) => ("fractionDigits", v),
            Facet::WhiteSpace(v) => ("whiteSpace", v),
        };
        write!(f, "{name}: {value}")
    }
}

/// Variety of a simple type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimpleType {
    /// `<xs:restriction base="...">`, an enumeration when `enumeration` is non-empty.
    Restriction {
        base: RawRef,
        enumeration: Vec<String>,
        facets: Vec<Facet>,
    },
    List { item: RawRef },
    Union { members: Vec<RawRef> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DerivationMethod {
    Extension,
    Restriction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub method: DerivationMethod,
    pub base: RawRef,
    /// Derived through `<xs:simpleContent>`: the base supplies a text value.
    pub simple_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexType {
    pub derivation: Option<Derivation>,
    pub particles: Vec<Particle>,
    pub mixed: bool,
    pub is_abstract: bool,
}

/// An element declared inline inside a content model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalElement {
    pub name: String,
    pub ty: RawRef,
    pub occurs: Occurs,
    pub nillable: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
}

/// An attribute declared inline inside a complex type or attribute group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAttribute {
    pub name: String,
    pub ty: RawRef,
    pub required: bool,
    pub prohibited: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
}

/// A member of a complex type's (flattened) content model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Particle {
    Element(LocalElement),
    ElementRef { target: RawRef, occurs: Occurs },
    Attribute(LocalAttribute),
    AttributeRef { target: RawRef, required: bool },
    GroupRef { target: RawRef, occurs: Occurs },
    AttributeGroupRef { target: RawRef },
    Any { occurs: Occurs },
    AnyAttribute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDecl {
    pub ty: RawRef,
    pub nillable: bool,
    pub is_abstract: bool,
    pub substitution_group: Option<RawRef>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDecl {
    pub ty: RawRef,
    pub default: Option<String>,
}

/// Payload of a schema entity, one variant per top-level XSD construct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EntityKind {
    SimpleType(SimpleType),
    ComplexType(ComplexType),
    Element(ElementDecl),
    Attribute(AttributeDecl),
    /// `<xs:group name="...">`: a reusable content model.
    Group(Vec<Particle>),
    /// `<xs:attributeGroup name="...">`: attributes and nested group refs.
    AttributeGroup(Vec<Particle>),
}

/// A named (or synthesized) top-level schema component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub name: QName,
    pub source: PathBuf,
    pub doc: Option<String>,
    pub anonymous: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn space(&self) -> SymbolSpace {
        if self.anonymous {
            return SymbolSpace::AnonymousType;
        }
        match self.kind {
            EntityKind::SimpleType(_) | EntityKind::ComplexType(_) => SymbolSpace::Type,
            EntityKind::Element(_) => SymbolSpace::Element,
            EntityKind::Attribute(_) => SymbolSpace::Attribute,
            EntityKind::Group(_) => SymbolSpace::Group,
            EntityKind::AttributeGroup(_) => SymbolSpace::AttributeGroup,
        }
    }

    /// The XSD element name this entity was declared with.
    pub fn node_kind(&self) -> &'static str {
        match self.kind {
            EntityKind::SimpleType(_) => "simpleType",
            EntityKind::ComplexType(_) => "complexType",
            EntityKind::Element(_) => "element",
            EntityKind::Attribute(_) => "attribute",
            EntityKind::Group(_) => "group",
            EntityKind::AttributeGroup(_) => "attributeGroup",
        }
    }
}
