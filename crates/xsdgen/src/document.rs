//! Single-document XSD parser.
//!
//! Walks the element tree of one `<xs:schema>` and harvests its top-level
//! declarations (in document order) and its include/import directives.
//! Nothing is resolved here: references stay qualified names.

use crate::options::UnsupportedPolicy;
use crate::qname::{QName, XML_NS, XS_NS};
use crate::resolver::Directive;
use crate::schema_model::{
    AttributeDecl, ComplexType, Derivation, DerivationMethod, ElementDecl, Entity, EntityKind,
    Facet, LocalAttribute, LocalElement, MaxOccurs, Occurs, Particle, RawRef, SimpleType,
};
use crate::{Result, UnsupportedConstruct, XsdError};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Constraining facets; `enumeration` is collected separately.
const FACETS: &[&str] = &[
    "enumeration",
    "pattern",
    "length",
    "minLength",
    "maxLength",
    "minInclusive",
    "maxInclusive",
    "minExclusive",
    "maxExclusive",
    "totalDigits",
    "fractionDigits",
    "whiteSpace",
];

/// What one XSD document contributes to the closure.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The `targetNamespace` attribute as written, if any.
    pub declared_namespace: Option<String>,
    /// Namespace applied to the declarations (declared or inherited).
    pub target_namespace: String,
    pub entities: Vec<Entity>,
    pub directives: Vec<Directive>,
    pub warnings: Vec<UnsupportedConstruct>,
}

/// Parse one XSD document on its own.
///
/// `inherited_namespace` is the includer's target namespace; it applies when
/// the document declares none (chameleon include).
pub fn parse_document(
    text: &str,
    path: &Path,
    inherited_namespace: Option<&str>,
    policy: UnsupportedPolicy,
) -> Result<ParsedDocument> {
    parse_document_in(text, path, inherited_namespace, policy, &mut HashSet::new())
}

/// Parse one XSD document of a closure.
///
/// `anonymous_names` holds the names already given to anonymous types by
/// earlier documents, so two files sharing a namespace never synthesize the
/// same name.
pub fn parse_document_in(
    text: &str,
    path: &Path,
    inherited_namespace: Option<&str>,
    policy: UnsupportedPolicy,
    anonymous_names: &mut HashSet<QName>,
) -> Result<ParsedDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let xml_opts = ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(text, xml_opts)
        .map_err(|e| XsdError::xml(path, e.to_string()))?;
    let root = doc.root_element();

    if root.tag_name().name() != "schema" || root.tag_name().namespace() != Some(XS_NS) {
        return Err(XsdError::xml(path, "root element must be xs:schema"));
    }

    let declared_namespace = root
        .attribute("targetNamespace")
        .filter(|ns| !ns.is_empty())
        .map(str::to_string);
    let target_namespace = declared_namespace
        .clone()
        .or_else(|| inherited_namespace.map(str::to_string))
        .unwrap_or_default();

    let mut parser = DocumentParser {
        path: path.to_path_buf(),
        target_ns: target_namespace.clone(),
        policy,
        entities: Vec::new(),
        directives: Vec::new(),
        warnings: Vec::new(),
        synthesized: anonymous_names,
        pending: Vec::new(),
    };
    parser.parse_schema(root)?;

    Ok(ParsedDocument {
        declared_namespace,
        target_namespace,
        entities: parser.entities,
        directives: parser.directives,
        warnings: parser.warnings,
    })
}

struct DocumentParser<'r> {
    path: PathBuf,
    target_ns: String,
    policy: UnsupportedPolicy,
    entities: Vec<Entity>,
    directives: Vec<Directive>,
    warnings: Vec<UnsupportedConstruct>,
    /// Names already handed out to anonymous types.
    synthesized: &'r mut HashSet<QName>,
    /// Anonymous types of the declaration being parsed, in pre-order.
    pending: Vec<Option<Entity>>,
}

impl DocumentParser<'_> {
    fn parse_schema(&mut self, root: Node) -> Result<()> {
        for child in element_children(root) {
            if child.tag_name().namespace() != Some(XS_NS) {
                self.unsupported(child)?;
                continue;
            }
            match child.tag_name().name() {
                "annotation" => {}
                "include" => match child.attribute("schemaLocation") {
                    Some(location) => self.directives.push(Directive::Include {
                        location: location.to_string(),
                    }),
                    None => self.malformed(child, "xs:include without schemaLocation")?,
                },
                "import" => self.directives.push(Directive::Import {
                    namespace: child.attribute("namespace").map(str::to_string),
                    location: child.attribute("schemaLocation").map(str::to_string),
                }),
                "element" => self.top_element(child)?,
                "complexType" => self.top_complex_type(child)?,
                "simpleType" => self.top_simple_type(child)?,
                "attribute" => self.top_attribute(child)?,
                "group" => self.top_group(child)?,
                "attributeGroup" => self.top_attribute_group(child)?,
                _ => self.unsupported(child)?,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Top-level declarations
    // ========================================================================

    fn top_element(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let ty = self.element_type(node, name)?;
        let decl = ElementDecl {
            ty,
            nillable: node.attribute("nillable") == Some("true"),
            is_abstract: node.attribute("abstract") == Some("true"),
            substitution_group: node
                .attribute("substitutionGroup")
                .map(|r| self.reference(node, r))
                .transpose()?,
            default: default_value(node),
        };
        self.push(node, name, EntityKind::Element(decl));
        Ok(())
    }

    fn top_complex_type(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let ct = self.complex_type(node, name)?;
        self.push(node, name, EntityKind::ComplexType(ct));
        Ok(())
    }

    fn top_simple_type(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let st = self.simple_type(node, name)?;
        self.push(node, name, EntityKind::SimpleType(st));
        Ok(())
    }

    fn top_attribute(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let ty = self.attribute_type(node, name)?;
        let decl = AttributeDecl {
            ty,
            default: default_value(node),
        };
        self.push(node, name, EntityKind::Attribute(decl));
        Ok(())
    }

    fn top_group(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let mut particles = Vec::new();
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation") => {}
                Some("sequence" | "choice" | "all") => {
                    self.compositor(child, name, Occurs::ONCE, false, &mut particles)?
                }
                _ => self.unsupported(child)?,
            }
        }
        self.push(node, name, EntityKind::Group(particles));
        Ok(())
    }

    fn top_attribute_group(&mut self, node: Node) -> Result<()> {
        let Some(name) = self.required_name(node)? else {
            return Ok(());
        };
        let mut particles = Vec::new();
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation") => {}
                Some("attribute" | "attributeGroup" | "anyAttribute") => {
                    self.attribute_particle(child, name, &mut particles)?
                }
                _ => self.unsupported(child)?,
            }
        }
        self.push(node, name, EntityKind::AttributeGroup(particles));
        Ok(())
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn complex_type(&mut self, node: Node, owner: &str) -> Result<ComplexType> {
        let mut ct = ComplexType {
            derivation: None,
            particles: Vec::new(),
            mixed: node.attribute("mixed") == Some("true"),
            is_abstract: node.attribute("abstract") == Some("true"),
        };
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation") => {}
                Some("sequence" | "choice" | "all") => {
                    self.compositor(child, owner, Occurs::ONCE, false, &mut ct.particles)?
                }
                Some("group") => {
                    let particle = self.group_ref(child, Occurs::ONCE, false)?;
                    ct.particles.extend(particle);
                }
                Some("attribute" | "attributeGroup" | "anyAttribute") => {
                    self.attribute_particle(child, owner, &mut ct.particles)?
                }
                Some("simpleContent" | "complexContent") => {
                    self.content_derivation(child, owner, &mut ct)?
                }
                _ => self.unsupported(child)?,
            }
        }
        Ok(ct)
    }

    /// `<xs:simpleContent>` / `<xs:complexContent>` with an extension or restriction.
    fn content_derivation(&mut self, node: Node, owner: &str, ct: &mut ComplexType) -> Result<()> {
        let simple_content = xs_name(node) == Some("simpleContent");
        if node.attribute("mixed") == Some("true") {
            ct.mixed = true;
        }
        for child in element_children(node) {
            let method = match xs_name(child) {
                Some("annotation") => continue,
                Some("extension") => DerivationMethod::Extension,
                Some("restriction") => DerivationMethod::Restriction,
                _ => {
                    self.unsupported(child)?;
                    continue;
                }
            };
            let base = match child.attribute("base") {
                Some(base) => self.reference(child, base)?,
                None => {
                    self.malformed(child, "derivation without base")?;
                    RawRef::builtin("anyType")
                }
            };
            ct.derivation = Some(Derivation {
                method,
                base,
                simple_content,
            });

            for member in element_children(child) {
                match xs_name(member) {
                    Some("annotation") => {}
                    Some("sequence" | "choice" | "all") => {
                        self.compositor(member, owner, Occurs::ONCE, false, &mut ct.particles)?
                    }
                    Some("group") => {
                        let particle = self.group_ref(member, Occurs::ONCE, false)?;
                        ct.particles.extend(particle);
                    }
                    Some("attribute" | "attributeGroup" | "anyAttribute") => {
                        self.attribute_particle(member, owner, &mut ct.particles)?
                    }
                    // Facets and an inline base only narrow the text value.
                    Some(facet) if simple_content && (facet == "simpleType" || FACETS.contains(&facet)) => {}
                    _ => self.unsupported(member)?,
                }
            }
        }
        Ok(())
    }

    fn simple_type(&mut self, node: Node, owner: &str) -> Result<SimpleType> {
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation") => {}
                Some("restriction") => return self.restriction(child, owner),
                Some("list") => {
                    let item = match child.attribute("itemType") {
                        Some(item) => self.reference(child, item)?,
                        None => self.inline_simple_type(child, &format!("{owner}_item"))?,
                    };
                    return Ok(SimpleType::List { item });
                }
                Some("union") => {
                    let mut members: Vec<RawRef> = child
                        .attribute("memberTypes")
                        .unwrap_or_default()
                        .split_whitespace()
                        .map(|m| self.reference(child, m))
                        .collect::<Result<_>>()?;
                    for (i, inline) in element_children(child)
                        .filter(|n| xs_name(*n) == Some("simpleType"))
                        .enumerate()
                    {
                        let name = format!("{owner}_member{}", i + 1);
                        members.push(self.synthesize_simple(inline, &name)?);
                    }
                    return Ok(SimpleType::Union { members });
                }
                _ => self.unsupported(child)?,
            }
        }
        self.malformed(node, "xs:simpleType without restriction, list or union")?;
        Ok(SimpleType::Restriction {
            base: RawRef::builtin("anySimpleType"),
            enumeration: Vec::new(),
            facets: Vec::new(),
        })
    }

    fn restriction(&mut self, node: Node, owner: &str) -> Result<SimpleType> {
        let base = match node.attribute("base") {
            Some(base) => self.reference(node, base)?,
            None => self.inline_simple_type(node, &format!("{owner}_base"))?,
        };
        let mut enumeration = Vec::new();
        let mut facets = Vec::new();
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation" | "simpleType") => {}
                Some("enumeration") => {
                    enumeration.push(child.attribute("value").unwrap_or_default().to_string())
                }
                Some(tag) if FACETS.contains(&tag) => {
                    if let Some(facet) = Facet::from_tag(tag, child.attribute("value").unwrap_or_default()) {
                        facets.push(facet);
                    }
                }
                _ => self.unsupported(child)?,
            }
        }
        Ok(SimpleType::Restriction {
            base,
            enumeration,
            facets,
        })
    }

    /// The inline `<xs:simpleType>` child of `node`, or `anySimpleType`.
    fn inline_simple_type(&mut self, node: Node, name: &str) -> Result<RawRef> {
        match element_children(node).find(|n| xs_name(*n) == Some("simpleType")) {
            Some(inline) => self.synthesize_simple(inline, name),
            None => Ok(RawRef::builtin("anySimpleType")),
        }
    }

    // ========================================================================
    // Content models
    // ========================================================================

    /// Flatten a `sequence`/`choice`/`all` into `out`, composing occurrence.
    fn compositor(
        &mut self,
        node: Node,
        owner: &str,
        outer: Occurs,
        in_choice: bool,
        out: &mut Vec<Particle>,
    ) -> Result<()> {
        let own = self.occurs(node)?.within(outer, in_choice);
        let choice = xs_name(node) == Some("choice");
        for child in element_children(node) {
            match xs_name(child) {
                Some("annotation") => {}
                Some("element") => {
                    if let Some(particle) = self.local_element(child, owner, own, choice)? {
                        out.push(particle);
                    }
                }
                Some("sequence" | "choice" | "all") => {
                    self.compositor(child, owner, own, choice, out)?
                }
                Some("group") => out.extend(self.group_ref(child, own, choice)?),
                Some("any") => {
                    let occurs = self.occurs(child)?.within(own, choice);
                    if !occurs.is_prohibited() {
                        out.push(Particle::Any { occurs });
                    }
                }
                _ => self.unsupported(child)?,
            }
        }
        Ok(())
    }

    fn local_element(
        &mut self,
        node: Node,
        owner: &str,
        outer: Occurs,
        in_choice: bool,
    ) -> Result<Option<Particle>> {
        let occurs = self.occurs(node)?.within(outer, in_choice);
        if occurs.is_prohibited() {
            return Ok(None);
        }
        if let Some(target) = node.attribute("ref") {
            return Ok(Some(Particle::ElementRef {
                target: self.reference(node, target)?,
                occurs,
            }));
        }
        let Some(name) = self.required_name(node)? else {
            return Ok(None);
        };
        let ty = self.element_type(node, &format!("{owner}_{name}"))?;
        Ok(Some(Particle::Element(LocalElement {
            name: name.to_string(),
            ty,
            occurs,
            nillable: node.attribute("nillable") == Some("true"),
            default: default_value(node),
            doc: documentation(node),
        })))
    }

    fn group_ref(&mut self, node: Node, outer: Occurs, in_choice: bool) -> Result<Option<Particle>> {
        match node.attribute("ref") {
            Some(target) => {
                let occurs = self.occurs(node)?.within(outer, in_choice);
                if occurs.is_prohibited() {
                    return Ok(None);
                }
                Ok(Some(Particle::GroupRef {
                    target: self.reference(node, target)?,
                    occurs,
                }))
            }
            None => {
                self.malformed(node, "local xs:group without ref")?;
                Ok(None)
            }
        }
    }

    fn attribute_particle(&mut self, node: Node, owner: &str, out: &mut Vec<Particle>) -> Result<()> {
        match xs_name(node) {
            Some("anyAttribute") => out.push(Particle::AnyAttribute),
            Some("attributeGroup") => match node.attribute("ref") {
                Some(target) => out.push(Particle::AttributeGroupRef {
                    target: self.reference(node, target)?,
                }),
                None => self.malformed(node, "local xs:attributeGroup without ref")?,
            },
            _ => {
                let usage = node.attribute("use").unwrap_or("optional");
                if let Some(target) = node.attribute("ref") {
                    if usage != "prohibited" {
                        out.push(Particle::AttributeRef {
                            target: self.reference(node, target)?,
                            required: usage == "required",
                        });
                    }
                    return Ok(());
                }
                let Some(name) = self.required_name(node)? else {
                    return Ok(());
                };
                let ty = self.attribute_type(node, &format!("{owner}_{name}"))?;
                out.push(Particle::Attribute(LocalAttribute {
                    name: name.to_string(),
                    ty,
                    required: usage == "required",
                    prohibited: usage == "prohibited",
                    default: default_value(node),
                    doc: documentation(node),
                }));
            }
        }
        Ok(())
    }

    /// Type of an element: `type=`, an inline type, or `anyType`.
    fn element_type(&mut self, node: Node, anonymous_name: &str) -> Result<RawRef> {
        self.identity_constraints(node)?;
        if let Some(ty) = node.attribute("type") {
            return self.reference(node, ty);
        }
        for child in element_children(node) {
            match xs_name(child) {
                Some("complexType") => return self.synthesize_complex(child, anonymous_name),
                Some("simpleType") => return self.synthesize_simple(child, anonymous_name),
                _ => {}
            }
        }
        Ok(RawRef::builtin("anyType"))
    }

    fn attribute_type(&mut self, node: Node, anonymous_name: &str) -> Result<RawRef> {
        if let Some(ty) = node.attribute("type") {
            return self.reference(node, ty);
        }
        self.inline_simple_type(node, anonymous_name)
    }

    /// Identity constraints and type alternatives have no structural form.
    fn identity_constraints(&mut self, node: Node) -> Result<()> {
        for child in element_children(node) {
            if matches!(xs_name(child), Some("key" | "keyref" | "unique" | "alternative")) {
                self.unsupported(child)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Anonymous types
    // ========================================================================

    fn synthesize_complex(&mut self, node: Node, name: &str) -> Result<RawRef> {
        let (slot, qname) = self.reserve(name);
        let ct = self.complex_type(node, &qname.local)?;
        self.fill(slot, node, qname.clone(), EntityKind::ComplexType(ct));
        Ok(RawRef::anonymous(qname))
    }

    fn synthesize_simple(&mut self, node: Node, name: &str) -> Result<RawRef> {
        let (slot, qname) = self.reserve(name);
        let st = self.simple_type(node, &qname.local)?;
        self.fill(slot, node, qname.clone(), EntityKind::SimpleType(st));
        Ok(RawRef::anonymous(qname))
    }

    /// Claim a unique anonymous name and a position in pre-order.
    fn reserve(&mut self, name: &str) -> (usize, QName) {
        let mut qname = QName::new(&self.target_ns, name);
        let mut n = 2;
        while !self.synthesized.insert(qname.clone()) {
            qname = QName::new(&self.target_ns, format!("{name}{n}"));
            n += 1;
        }
        self.pending.push(None);
        (self.pending.len() - 1, qname)
    }

    fn fill(&mut self, slot: usize, node: Node, name: QName, kind: EntityKind) {
        self.pending[slot] = Some(Entity {
            name,
            source: self.path.clone(),
            doc: documentation(node),
            anonymous: true,
            kind,
        });
    }

    /// Append a top-level declaration followed by the anonymous types it owns.
    fn push(&mut self, node: Node, name: &str, kind: EntityKind) {
        self.entities.push(Entity {
            name: QName::new(&self.target_ns, name),
            source: self.path.clone(),
            doc: documentation(node),
            anonymous: false,
            kind,
        });
        self.entities.extend(self.pending.drain(..).flatten());
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Resolve a `prefix:local` reference against the namespaces in scope at
    /// `node`.
    ///
    /// The `xml` prefix is bound implicitly. Without a prefix the default
    /// namespace applies; when none is declared the document's target
    /// namespace is assumed. An undeclared prefix is an error.
    fn reference(&self, node: Node, value: &str) -> Result<RawRef> {
        let value = value.trim();
        let (prefix, local) = match value.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, value),
        };
        if prefix == Some("xml") {
            return Ok(RawRef::explicit(QName::new(XML_NS, local)));
        }
        match (prefix, node.lookup_namespace_uri(prefix)) {
            (_, Some(ns)) => Ok(RawRef::explicit(QName::new(ns, local))),
            (None, None) => Ok(RawRef::assumed(QName::new(&self.target_ns, local))),
            (Some(prefix), None) => {
                let pos = node.document().text_pos_at(node.range().start);
                Err(XsdError::xml(
                    &self.path,
                    format!(
                        "undeclared namespace prefix '{prefix}' in '{value}' at {}:{}",
                        pos.row, pos.col
                    ),
                ))
            }
        }
    }

    fn occurs(&mut self, node: Node) -> Result<Occurs> {
        let min = match node.attribute("minOccurs") {
            None => Some(1),
            Some(v) => v.trim().parse().ok(),
        };
        let max = match node.attribute("maxOccurs").map(str::trim) {
            None => Some(MaxOccurs::Bounded(1)),
            Some("unbounded") => Some(MaxOccurs::Unbounded),
            Some(v) => v.parse().ok().map(MaxOccurs::Bounded),
        };
        match (min, max) {
            (Some(min), Some(max)) => Ok(Occurs { min, max }),
            _ => {
                self.malformed(node, "invalid minOccurs/maxOccurs")?;
                Ok(Occurs::ONCE)
            }
        }
    }

    fn required_name<'a>(&mut self, node: Node<'a, '_>) -> Result<Option<&'a str>> {
        match node.attribute("name") {
            Some(name) => Ok(Some(name)),
            None => {
                let what = format!("xs:{} without name", node.tag_name().name());
                self.malformed(node, &what)?;
                Ok(None)
            }
        }
    }

    fn unsupported(&mut self, node: Node) -> Result<()> {
        let construct = match node.tag_name().namespace() {
            Some(XS_NS) => format!("xs:{}", node.tag_name().name()),
            Some(ns) => format!("{{{ns}}}{}", node.tag_name().name()),
            None => node.tag_name().name().to_string(),
        };
        self.report(node, construct)
    }

    fn malformed(&mut self, node: Node, what: &str) -> Result<()> {
        self.report(node, what.to_string())
    }

    fn report(&mut self, node: Node, construct: String) -> Result<()> {
        let pos = node.document().text_pos_at(node.range().start);
        let issue = UnsupportedConstruct {
            construct,
            path: self.path.clone(),
            line: pos.row,
            column: pos.col,
        };
        match self.policy {
            UnsupportedPolicy::Fail => Err(issue.into()),
            UnsupportedPolicy::Collect => {
                warn!("{}", issue);
                self.warnings.push(issue);
                Ok(())
            }
        }
    }
}

/// Element children, skipping text, comments and processing instructions.
fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Local name of an element in the XSD namespace.
fn xs_name<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    (node.tag_name().namespace() == Some(XS_NS)).then(|| node.tag_name().name())
}

fn default_value(node: Node) -> Option<String> {
    node.attribute("default")
        .or_else(|| node.attribute("fixed"))
        .map(str::to_string)
}

/// Text of the `xs:annotation/xs:documentation` children of `node`.
fn documentation(node: Node) -> Option<String> {
    let text = element_children(node)
        .filter(|n| xs_name(*n) == Some("annotation"))
        .flat_map(element_children)
        .filter(|n| xs_name(*n) == Some("documentation"))
        .flat_map(|n| n.descendants().filter(|d| d.is_text()))
        .filter_map(|n| n.text())
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xsd: &str) -> ParsedDocument {
        parse_document(xsd, Path::new("test.xsd"), None, UnsupportedPolicy::Fail).unwrap()
    }

    #[test]
    fn test_declarations_keep_document_order() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
                <xs:simpleType name="zeta"><xs:restriction base="xs:string"/></xs:simpleType>
                <xs:complexType name="alpha"><xs:sequence/></xs:complexType>
                <xs:element name="middle" type="xs:int"/>
            </xs:schema>"#,
        );
        let names: Vec<_> = doc.entities.iter().map(|e| e.name.local.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "middle"]);
        assert!(doc.entities.iter().all(|e| e.name.namespace == "urn:t"));
        assert_eq!(doc.declared_namespace.as_deref(), Some("urn:t"));
    }

    #[test]
    fn test_directives() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:include schemaLocation="common.xsd"/>
                <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
                <xs:import namespace="urn:elsewhere"/>
            </xs:schema>"#,
        );
        assert_eq!(
            doc.directives,
            vec![
                Directive::Include {
                    location: "common.xsd".to_string()
                },
                Directive::Import {
                    namespace: Some("urn:other".to_string()),
                    location: Some("other.xsd".to_string())
                },
                Directive::Import {
                    namespace: Some("urn:elsewhere".to_string()),
                    location: None
                },
            ]
        );
    }

    #[test]
    fn test_references_use_in_scope_prefixes() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:o="urn:other" targetNamespace="urn:t">
                <xs:complexType name="holder">
                    <xs:sequence>
                        <xs:element name="a" type="o:thing"/>
                        <xs:element name="b" type="local"/>
                        <xs:element ref="o:shared" minOccurs="0" maxOccurs="unbounded"/>
                    </xs:sequence>
                    <xs:attribute ref="xml:lang"/>
                </xs:complexType>
            </xs:schema>"#,
        );
        let EntityKind::ComplexType(ct) = &doc.entities[0].kind else {
            panic!("expected complex type");
        };
        let Particle::Element(a) = &ct.particles[0] else { panic!() };
        assert_eq!(a.ty, RawRef::explicit(QName::new("urn:other", "thing")));
        let Particle::Element(b) = &ct.particles[1] else { panic!() };
        assert_eq!(b.ty, RawRef::assumed(QName::new("urn:t", "local")));
        let Particle::ElementRef { target, occurs } = &ct.particles[2] else { panic!() };
        assert_eq!(target.name, QName::new("urn:other", "shared"));
        assert!(occurs.is_optional() && occurs.is_multiple());
        let Particle::AttributeRef { target, required } = &ct.particles[3] else { panic!() };
        assert_eq!(target.name, QName::new(XML_NS, "lang"));
        assert!(!required);
    }

    #[test]
    fn test_xml_prefix_needs_no_declaration() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="note">
                    <xs:attribute ref="xml:space"/>
                    <xs:attribute name="lang" type="xml:lang"/>
                </xs:complexType>
            </xs:schema>"#,
        );
        let EntityKind::ComplexType(ct) = &doc.entities[0].kind else { panic!() };
        let Particle::AttributeRef { target, .. } = &ct.particles[0] else { panic!() };
        assert_eq!(target, &RawRef::explicit(QName::new(XML_NS, "space")));
        let Particle::Attribute(lang) = &ct.particles[1] else { panic!() };
        assert_eq!(lang.ty, RawRef::explicit(QName::new(XML_NS, "lang")));
    }

    #[test]
    fn test_undeclared_prefix_is_an_error() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
    <xs:complexType name="holder">
        <xs:sequence>
            <xs:element name="a" type="missing:thing"/>
        </xs:sequence>
    </xs:complexType>
</xs:schema>"#;
        let err = parse_document(xsd, Path::new("holder.xsd"), None, UnsupportedPolicy::Collect)
            .unwrap_err();
        let XsdError::Xml { path, message } = err else {
            panic!("expected an XML error, got {err:?}");
        };
        assert_eq!(path, PathBuf::from("holder.xsd"));
        assert!(message.contains("'missing'"), "message was {message}");
        assert!(message.contains("at 4:13"), "message was {message}");
    }

    #[test]
    fn test_prohibited_particles_are_dropped() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:group name="extras">
                    <xs:sequence>
                        <xs:element name="extra" type="xs:string"/>
                    </xs:sequence>
                </xs:group>
                <xs:complexType name="slim">
                    <xs:sequence>
                        <xs:element name="kept" type="xs:string"/>
                        <xs:element name="gone" type="xs:string" minOccurs="0" maxOccurs="0"/>
                        <xs:any minOccurs="0" maxOccurs="0"/>
                        <xs:group ref="extras" minOccurs="0" maxOccurs="0"/>
                        <xs:sequence minOccurs="0" maxOccurs="0">
                            <xs:element name="inner" type="xs:string"/>
                        </xs:sequence>
                    </xs:sequence>
                </xs:complexType>
            </xs:schema>"#,
        );
        let EntityKind::ComplexType(ct) = &doc.entities[1].kind else { panic!() };
        assert_eq!(ct.particles.len(), 1);
        let Particle::Element(kept) = &ct.particles[0] else { panic!() };
        assert_eq!(kept.name, "kept");
    }

    #[test]
    fn test_anonymous_names_are_unique_across_documents() {
        let mut names = HashSet::new();
        let first = parse_document_in(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
                <xs:element name="order">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="line"><xs:complexType/></xs:element>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
            Path::new("a.xsd"),
            None,
            UnsupportedPolicy::Fail,
            &mut names,
        )
        .unwrap();
        let second = parse_document_in(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="order">
                    <xs:sequence>
                        <xs:element name="line"><xs:complexType/></xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:schema>"#,
            Path::new("b.xsd"),
            Some("urn:t"),
            UnsupportedPolicy::Fail,
            &mut names,
        )
        .unwrap();

        let anonymous = |doc: &ParsedDocument| -> Vec<String> {
            doc.entities
                .iter()
                .filter(|e| e.anonymous)
                .map(|e| e.name.local.clone())
                .collect()
        };
        assert_eq!(anonymous(&first), ["order", "order_line"]);
        assert_eq!(anonymous(&second), ["order_line2"]);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_choice_members_are_optional() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="shape">
                    <xs:choice maxOccurs="unbounded">
                        <xs:element name="circle" type="xs:string"/>
                        <xs:element name="square" type="xs:string"/>
                    </xs:choice>
                </xs:complexType>
            </xs:schema>"#,
        );
        let EntityKind::ComplexType(ct) = &doc.entities[0].kind else { panic!() };
        for particle in &ct.particles {
            let Particle::Element(e) = particle else { panic!() };
            assert!(e.occurs.is_optional());
            assert!(e.occurs.is_multiple());
        }
    }

    #[test]
    fn test_anonymous_types_follow_their_owner() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
                <xs:element name="topLevel">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="nested">
                                <xs:complexType>
                                    <xs:attribute name="id" type="xs:ID"/>
                                </xs:complexType>
                            </xs:element>
                            <xs:element name="color">
                                <xs:simpleType>
                                    <xs:restriction base="xs:string">
                                        <xs:enumeration value="red"/>
                                        <xs:enumeration value="green"/>
                                    </xs:restriction>
                                </xs:simpleType>
                            </xs:element>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        let names: Vec<_> = doc
            .entities
            .iter()
            .map(|e| (e.name.local.as_str(), e.anonymous))
            .collect();
        assert_eq!(
            names,
            [
                ("topLevel", false),
                ("topLevel", true),
                ("topLevel_nested", true),
                ("topLevel_color", true),
            ]
        );
        let EntityKind::Element(decl) = &doc.entities[0].kind else { panic!() };
        assert_eq!(decl.ty, RawRef::anonymous(QName::new("urn:t", "topLevel")));
        let EntityKind::SimpleType(SimpleType::Restriction { enumeration, .. }) = &doc.entities[3].kind
        else {
            panic!()
        };
        assert_eq!(enumeration, &["red", "green"]);
    }

    #[test]
    fn test_extension_and_documentation() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="Derived">
                    <xs:annotation>
                        <xs:documentation>
                            A derived type.
                        </xs:documentation>
                    </xs:annotation>
                    <xs:complexContent>
                        <xs:extension base="Base">
                            <xs:sequence>
                                <xs:element name="b" type="xs:int" minOccurs="0"/>
                            </xs:sequence>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
            </xs:schema>"#,
        );
        let entity = &doc.entities[0];
        assert_eq!(entity.doc.as_deref(), Some("A derived type."));
        let EntityKind::ComplexType(ct) = &entity.kind else { panic!() };
        let derivation = ct.derivation.as_ref().unwrap();
        assert_eq!(derivation.method, DerivationMethod::Extension);
        assert_eq!(derivation.base.name.local, "Base");
        assert!(!derivation.simple_content);
        assert_eq!(ct.particles.len(), 1);
    }

    #[test]
    fn test_chameleon_include_inherits_namespace() {
        let doc = parse_document(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="common"/>
            </xs:schema>"#,
            Path::new("common.xsd"),
            Some("urn:main"),
            UnsupportedPolicy::Fail,
        )
        .unwrap();
        assert_eq!(doc.declared_namespace, None);
        assert_eq!(doc.entities[0].name, QName::new("urn:main", "common"));
    }

    #[test]
    fn test_unsupported_construct_fails_by_default() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="order" type="xs:string">
        <xs:key name="orderKey">
            <xs:selector xpath="."/>
            <xs:field xpath="@id"/>
        </xs:key>
    </xs:element>
</xs:schema>"#;
        let err = parse_document(xsd, Path::new("order.xsd"), None, UnsupportedPolicy::Fail)
            .unwrap_err();
        let XsdError::UnsupportedConstruct(issue) = err else {
            panic!("expected unsupported construct, got {err:?}");
        };
        assert_eq!(issue.construct, "xs:key");
        assert_eq!(issue.line, 3);
    }

    #[test]
    fn test_unsupported_construct_collected_on_request() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:redefine schemaLocation="base.xsd"/>
            <xs:element name="order" type="xs:string"/>
        </xs:schema>"#;
        let doc = parse_document(xsd, Path::new("order.xsd"), None, UnsupportedPolicy::Collect)
            .unwrap();
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].construct, "xs:redefine");
        assert_eq!(doc.entities.len(), 1);
    }

    #[test]
    fn test_root_must_be_schema() {
        let err = parse_document("<root/>", Path::new("bad.xsd"), None, UnsupportedPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, XsdError::Xml { .. }));

        let err = parse_document("<xs:schema", Path::new("bad.xsd"), None, UnsupportedPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, XsdError::Xml { .. }));
    }
}
