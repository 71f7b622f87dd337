//! Builds the [`ProtoTree`] for a root schema file.
//!
//! The declarations of every file in the closure are merged into a single
//! arena keyed by `(symbol space, qualified name)`. All references are then
//! checked, derivation chains are tested for cycles, and finally the root
//! file's declarations are lowered into resolved, flattened type declarations.

use crate::codegen::naming::identifier;
use crate::proto_tree::{
    AliasDecl, Builtin, ElementBinding, EnumDecl, Field, FieldKind, FieldType, Import, NamedKind,
    ProtoTree, StructDecl, TypeDecl,
};
use crate::qname::QName;
use crate::resolver::ResolverState;
use crate::schema_model::{
    ComplexType, DerivationMethod, Entity, EntityKind, Particle, RawRef, SimpleType, SymbolSpace,
};
use crate::{Result, XsdError};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

type Key = (SymbolSpace, QName);

/// A type reference after resolution.
#[derive(Clone, Copy)]
enum TypeRef<'a> {
    Builtin(Builtin),
    Entity(&'a Entity),
}

/// Merge the closure recorded in `state` and lower the declarations of `root`.
pub fn build_tree(state: &ResolverState, root: &Path) -> Result<ProtoTree> {
    let builder = TreeBuilder::merge(state)?;
    builder.check_references()?;
    builder.check_cycles()?;

    let root_entities = state
        .parse_file_map
        .get(root)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let tree = builder.lower(root, root_entities)?;
    debug!(
        "built tree for {} with {} declarations",
        root.display(),
        tree.decls.len()
    );
    Ok(tree)
}

struct TreeBuilder<'a> {
    entities: IndexMap<Key, &'a Entity>,
    local_names: &'a HashMap<String, String>,
}

impl<'a> TreeBuilder<'a> {
    fn merge(state: &'a ResolverState) -> Result<Self> {
        let mut entities: IndexMap<Key, &'a Entity> = IndexMap::new();
        for path in &state.parse_file_list {
            for entity in state.parse_file_map.get(path).into_iter().flatten() {
                let key = (entity.space(), entity.name.clone());
                if let Some(first) = entities.get(&key) {
                    return Err(XsdError::DuplicateDefinition {
                        space: key.0,
                        name: key.1,
                        first: first.source.clone(),
                        second: entity.source.clone(),
                    });
                }
                entities.insert(key, entity);
            }
        }
        Ok(Self {
            entities,
            local_names: &state.local_name_ns_map,
        })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn find(&self, space: SymbolSpace, r: &RawRef) -> Option<&'a Entity> {
        if r.anonymous {
            return self
                .entities
                .get(&(SymbolSpace::AnonymousType, r.name.clone()))
                .copied();
        }
        if let Some(entity) = self.entities.get(&(space, r.name.clone())) {
            return Some(entity);
        }
        if r.explicit {
            return None;
        }
        // Unqualified reference: fall back to whichever namespace declared the
        // local name, then to no namespace.
        let local = &r.name.local;
        self.local_names
            .get(local)
            .and_then(|ns| self.entities.get(&(space, QName::new(ns, local))))
            .or_else(|| self.entities.get(&(space, QName::new("", local))))
            .copied()
    }

    fn find_or_fail(&self, space: SymbolSpace, r: &RawRef, from: &Entity) -> Result<&'a Entity> {
        self.find(space, r)
            .ok_or_else(|| unresolved(space, r, from))
    }

    fn resolve_type(&self, r: &RawRef, from: &Entity) -> Result<TypeRef<'a>> {
        if r.name.is_xsd() && !r.anonymous {
            if let Some(builtin) = Builtin::from_local(&r.name.local) {
                return Ok(TypeRef::Builtin(builtin));
            }
            // A schema whose default namespace is XSD may still name its own
            // types without a prefix.
            let local = RawRef::assumed(QName::new("", r.name.local.clone()));
            return Ok(match self.find(SymbolSpace::Type, &local) {
                Some(entity) => TypeRef::Entity(entity),
                None => TypeRef::Builtin(Builtin::AnyType),
            });
        }
        self.find_or_fail(SymbolSpace::Type, r, from)
            .map(TypeRef::Entity)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn check_references(&self) -> Result<()> {
        for entity in self.entities.values() {
            for (space, r) in references(entity) {
                match space {
                    SymbolSpace::Type => {
                        self.resolve_type(r, entity)?;
                    }
                    SymbolSpace::Attribute if r.name.is_xml() => {}
                    _ => {
                        self.find_or_fail(space, r, entity)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Complex derivation and simple restriction chains must end.
    fn check_cycles(&self) -> Result<()> {
        for (key, entity) in &self.entities {
            let mut seen = vec![key.clone()];
            let mut current = *entity;
            while let Some(base) = derivation_base(current) {
                let TypeRef::Entity(next) = self.resolve_type(base, current)? else {
                    break;
                };
                let next_key = (next.space(), next.name.clone());
                if let Some(pos) = seen.iter().position(|k| *k == next_key) {
                    let mut chain: Vec<QName> = seen[pos..].iter().map(|k| k.1.clone()).collect();
                    chain.push(next_key.1);
                    return Err(XsdError::CyclicType { chain });
                }
                seen.push(next_key);
                current = next;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Lowering
    // ========================================================================

    fn lower(&self, root: &Path, entities: &'a [Entity]) -> Result<ProtoTree> {
        let target_namespace = entities
            .iter()
            .find(|e| !e.anonymous)
            .map(|e| e.name.namespace.clone())
            .unwrap_or_default();

        // Types declared by this file, by identifier.
        let emitted: HashMap<String, &QName> = entities
            .iter()
            .filter(|e| !e.anonymous)
            .filter(|e| matches!(e.kind, EntityKind::ComplexType(_) | EntityKind::SimpleType(_)))
            .map(|e| (identifier(&e.name.local), &e.name))
            .collect();

        let mut decls = Vec::new();
        // Anonymous types emitted under their element's name.
        let mut consumed: HashSet<&QName> = HashSet::new();
        // Type name -> element merged into it.
        let mut merged: HashMap<QName, QName> = HashMap::new();

        for entity in entities {
            if consumed.contains(&entity.name) && entity.anonymous {
                continue;
            }
            match &entity.kind {
                EntityKind::ComplexType(ct) => {
                    decls.push(TypeDecl::Struct(self.lower_struct(entity, ct, &entity.name, None)?));
                }
                EntityKind::SimpleType(st) => {
                    decls.push(self.lower_simple(entity, st, &entity.name, None)?);
                }
                EntityKind::Element(decl) => match self.resolve_type(&decl.ty, entity)? {
                    TypeRef::Entity(ty) if decl.ty.anonymous => {
                        consumed.insert(&ty.name);
                        let doc = entity.doc.clone().or_else(|| ty.doc.clone());
                        let element = Some(ElementBinding::own(entity.name.clone()));
                        let lowered = match &ty.kind {
                            EntityKind::ComplexType(ct) => {
                                TypeDecl::Struct(self.lower_struct(ty, ct, &entity.name, element)?)
                            }
                            EntityKind::SimpleType(st) => {
                                self.lower_simple(ty, st, &entity.name, element)?
                            }
                            _ => continue,
                        };
                        decls.push(with_doc(lowered, doc));
                    }
                    TypeRef::Entity(ty)
                        if emitted.get(&identifier(&entity.name.local)) == Some(&&ty.name) =>
                    {
                        merged.insert(ty.name.clone(), entity.name.clone());
                    }
                    TypeRef::Entity(ty) => {
                        let element = Some(ElementBinding::own(entity.name.clone()));
                        let lowered = match &ty.kind {
                            EntityKind::ComplexType(ct) => {
                                let mut s = self.lower_struct(ty, ct, &entity.name, element)?;
                                s.doc = entity.doc.clone().or_else(|| ty.doc.clone());
                                TypeDecl::Struct(s)
                            }
                            _ => TypeDecl::Alias(AliasDecl {
                                name: entity.name.clone(),
                                doc: entity.doc.clone(),
                                target: self.field_type(&decl.ty, entity)?,
                                collection: false,
                                facets: Vec::new(),
                                element,
                            }),
                        };
                        decls.push(lowered);
                    }
                    TypeRef::Builtin(builtin) => decls.push(TypeDecl::Alias(AliasDecl {
                        name: entity.name.clone(),
                        doc: entity.doc.clone(),
                        target: FieldType::builtin(builtin),
                        collection: false,
                        facets: Vec::new(),
                        element: Some(ElementBinding::own(entity.name.clone())),
                    })),
                },
                // Consumed through references only.
                EntityKind::Attribute(_) | EntityKind::Group(_) | EntityKind::AttributeGroup(_) => {}
            }
        }

        for decl in &mut decls {
            let Some(element) = merged.get(decl.name()) else {
                continue;
            };
            let binding = Some(ElementBinding::shared(element.clone()));
            match decl {
                TypeDecl::Struct(s) => s.element = binding,
                TypeDecl::Enum(e) => e.element = binding,
                TypeDecl::Alias(a) => a.element = binding,
            }
        }

        Ok(ProtoTree {
            source: root.to_path_buf(),
            target_namespace,
            imports: self.imports(root, &decls),
            decls,
        })
    }

    /// Named types the declarations use that another file declares, grouped
    /// by that file.
    fn imports(&self, root: &Path, decls: &[TypeDecl]) -> Vec<Import> {
        let local: HashSet<&QName> = decls.iter().map(TypeDecl::name).collect();
        let root_dir = root.parent().unwrap_or_else(|| Path::new(""));
        let mut by_file: IndexMap<&Path, Vec<QName>> = IndexMap::new();

        for name in decls.iter().flat_map(named_types) {
            if local.contains(name) {
                continue;
            }
            let entity = self
                .entities
                .get(&(SymbolSpace::Type, name.clone()))
                .or_else(|| self.entities.get(&(SymbolSpace::AnonymousType, name.clone())));
            let Some(entity) = entity.filter(|e| e.source != root) else {
                continue;
            };
            let names = by_file.entry(entity.source.as_path()).or_default();
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        by_file
            .into_iter()
            .map(|(source, names)| Import {
                source: relative_path(source, root_dir),
                names,
            })
            .collect()
    }

    fn lower_struct(
        &self,
        entity: &Entity,
        ct: &ComplexType,
        name: &QName,
        element: Option<ElementBinding>,
    ) -> Result<StructDecl> {
        Ok(StructDecl {
            name: name.clone(),
            doc: entity.doc.clone(),
            element,
            fields: self.complex_fields(entity, ct)?,
        })
    }

    fn lower_simple(
        &self,
        entity: &Entity,
        st: &SimpleType,
        name: &QName,
        element: Option<ElementBinding>,
    ) -> Result<TypeDecl> {
        let decl = match st {
            SimpleType::Restriction {
                base, enumeration, ..
            } if !enumeration.is_empty() => TypeDecl::Enum(EnumDecl {
                name: name.clone(),
                doc: entity.doc.clone(),
                base: self.value_builtin(base, entity)?,
                literals: enumeration.clone(),
                element,
            }),
            SimpleType::Restriction { base, facets, .. } => TypeDecl::Alias(AliasDecl {
                name: name.clone(),
                doc: entity.doc.clone(),
                target: self.field_type(base, entity)?,
                collection: false,
                facets: facets.clone(),
                element,
            }),
            SimpleType::List { item } => TypeDecl::Alias(AliasDecl {
                name: name.clone(),
                doc: entity.doc.clone(),
                target: self.field_type(item, entity)?,
                collection: true,
                facets: Vec::new(),
                element,
            }),
            SimpleType::Union { .. } => TypeDecl::Alias(AliasDecl {
                name: name.clone(),
                doc: entity.doc.clone(),
                target: FieldType::builtin(Builtin::String),
                collection: false,
                facets: Vec::new(),
                element,
            }),
        };
        Ok(decl)
    }

    /// Fields of a complex type, inherited ones first.
    fn complex_fields(&self, entity: &Entity, ct: &ComplexType) -> Result<Vec<Field>> {
        let mut own = Vec::new();
        self.particle_fields(entity, &ct.particles, &mut Vec::new(), &mut own)?;

        let mut fields = Vec::new();
        if let Some(derivation) = &ct.derivation {
            let base = self.resolve_type(&derivation.base, entity)?;
            let inherited = match base {
                TypeRef::Entity(base_entity) => match &base_entity.kind {
                    EntityKind::ComplexType(base_ct) => self.complex_fields(base_entity, base_ct)?,
                    _ => vec![Field::text(self.field_type(&derivation.base, entity)?)],
                },
                TypeRef::Builtin(Builtin::AnyType) if !derivation.simple_content => Vec::new(),
                TypeRef::Builtin(builtin) => vec![Field::text(FieldType::builtin(builtin))],
            };
            match derivation.method {
                DerivationMethod::Extension => fields.extend(inherited),
                DerivationMethod::Restriction => {
                    // Restated content replaces the base's; attributes and
                    // text carry over unless redeclared.
                    fields.extend(inherited.into_iter().filter(|f| {
                        matches!(f.kind, FieldKind::Attribute | FieldKind::AnyAttribute | FieldKind::Text)
                            && !own.iter().any(|o| o.kind == f.kind && o.name == f.name)
                    }));
                }
            }
        }
        for field in own {
            push_field(&mut fields, field);
        }
        if ct.mixed && !fields.iter().any(|f| f.kind == FieldKind::Text) {
            fields.push(Field::text(FieldType::builtin(Builtin::String)));
        }
        Ok(fields)
    }

    /// Flatten `particles` into `out`, inlining group references.
    ///
    /// `groups` is the chain of groups being expanded, used to reject
    /// self-referencing groups.
    fn particle_fields(
        &self,
        entity: &Entity,
        particles: &[Particle],
        groups: &mut Vec<QName>,
        out: &mut Vec<Field>,
    ) -> Result<()> {
        for particle in particles {
            match particle {
                Particle::Element(e) => push_field(
                    out,
                    Field {
                        name: e.name.clone(),
                        namespace: None,
                        kind: FieldKind::Element,
                        ty: self.field_type(&e.ty, entity)?,
                        optional: e.occurs.is_optional() || e.nillable,
                        collection: e.occurs.is_multiple(),
                        default: e.default.clone(),
                        doc: e.doc.clone(),
                    },
                ),
                Particle::ElementRef { target, occurs } => {
                    let global = self.find_or_fail(SymbolSpace::Element, target, entity)?;
                    let EntityKind::Element(decl) = &global.kind else {
                        continue;
                    };
                    push_field(
                        out,
                        Field {
                            name: global.name.local.clone(),
                            namespace: foreign_namespace(&global.name, entity),
                            kind: FieldKind::Element,
                            ty: self.field_type(&decl.ty, global)?,
                            optional: occurs.is_optional() || decl.nillable,
                            collection: occurs.is_multiple(),
                            default: decl.default.clone(),
                            doc: global.doc.clone(),
                        },
                    );
                }
                Particle::Attribute(a) if a.prohibited => {}
                Particle::Attribute(a) => push_field(
                    out,
                    Field {
                        name: a.name.clone(),
                        namespace: None,
                        kind: FieldKind::Attribute,
                        ty: self.field_type(&a.ty, entity)?,
                        optional: !a.required,
                        collection: false,
                        default: a.default.clone(),
                        doc: a.doc.clone(),
                    },
                ),
                Particle::AttributeRef { target, required } => {
                    let field = if target.name.is_xml() {
                        Field {
                            name: target.name.local.clone(),
                            namespace: Some(target.name.namespace.clone()),
                            kind: FieldKind::Attribute,
                            ty: FieldType::builtin(Builtin::String),
                            optional: !required,
                            collection: false,
                            default: None,
                            doc: None,
                        }
                    } else {
                        let global = self.find_or_fail(SymbolSpace::Attribute, target, entity)?;
                        let EntityKind::Attribute(decl) = &global.kind else {
                            continue;
                        };
                        Field {
                            name: global.name.local.clone(),
                            namespace: foreign_namespace(&global.name, entity),
                            kind: FieldKind::Attribute,
                            ty: self.field_type(&decl.ty, global)?,
                            optional: !required,
                            collection: false,
                            default: decl.default.clone(),
                            doc: global.doc.clone(),
                        }
                    };
                    push_field(out, field);
                }
                Particle::GroupRef { target, occurs } => {
                    let group = self.find_or_fail(SymbolSpace::Group, target, entity)?;
                    let EntityKind::Group(members) = &group.kind else {
                        continue;
                    };
                    let mut inner = Vec::new();
                    self.expand_group(group, members, groups, &mut inner)?;
                    for mut field in inner {
                        field.optional |= occurs.is_optional();
                        field.collection |= occurs.is_multiple();
                        push_field(out, field);
                    }
                }
                Particle::AttributeGroupRef { target } => {
                    let group = self.find_or_fail(SymbolSpace::AttributeGroup, target, entity)?;
                    let EntityKind::AttributeGroup(members) = &group.kind else {
                        continue;
                    };
                    self.expand_group(group, members, groups, out)?;
                }
                Particle::Any { occurs } => push_field(
                    out,
                    Field {
                        name: String::new(),
                        namespace: None,
                        kind: FieldKind::AnyElement,
                        ty: FieldType::builtin(Builtin::AnyType),
                        optional: occurs.is_optional(),
                        collection: occurs.is_multiple(),
                        default: None,
                        doc: None,
                    },
                ),
                Particle::AnyAttribute => push_field(
                    out,
                    Field {
                        name: String::new(),
                        namespace: None,
                        kind: FieldKind::AnyAttribute,
                        ty: FieldType::builtin(Builtin::AnyType),
                        optional: false,
                        collection: true,
                        default: None,
                        doc: None,
                    },
                ),
            }
        }
        Ok(())
    }

    fn expand_group(
        &self,
        group: &Entity,
        members: &[Particle],
        groups: &mut Vec<QName>,
        out: &mut Vec<Field>,
    ) -> Result<()> {
        if let Some(pos) = groups.iter().position(|g| *g == group.name) {
            let mut chain = groups[pos..].to_vec();
            chain.push(group.name.clone());
            return Err(XsdError::CyclicType { chain });
        }
        groups.push(group.name.clone());
        self.particle_fields(group, members, groups, out)?;
        groups.pop();
        Ok(())
    }

    fn field_type(&self, r: &RawRef, from: &Entity) -> Result<FieldType> {
        Ok(match self.resolve_type(r, from)? {
            TypeRef::Builtin(builtin) => FieldType::builtin(builtin),
            TypeRef::Entity(entity) => FieldType::Named {
                name: entity.name.clone(),
                kind: named_kind(entity),
            },
        })
    }

    /// The builtin a simple type's values are ultimately drawn from.
    fn value_builtin(&self, r: &RawRef, from: &Entity) -> Result<Builtin> {
        let mut current = self.resolve_type(r, from)?;
        loop {
            match current {
                TypeRef::Builtin(builtin) => return Ok(builtin),
                TypeRef::Entity(entity) => match &entity.kind {
                    EntityKind::SimpleType(SimpleType::Restriction { base, .. }) => {
                        current = self.resolve_type(base, entity)?;
                    }
                    _ => return Ok(Builtin::String),
                },
            }
        }
    }
}

/// Every reference an entity makes, with the symbol space it points into.
fn references(entity: &Entity) -> Vec<(SymbolSpace, &RawRef)> {
    let mut refs = Vec::new();
    match &entity.kind {
        EntityKind::SimpleType(st) => match st {
            SimpleType::Restriction { base, .. } => refs.push((SymbolSpace::Type, base)),
            SimpleType::List { item } => refs.push((SymbolSpace::Type, item)),
            SimpleType::Union { members } => {
                refs.extend(members.iter().map(|m| (SymbolSpace::Type, m)))
            }
        },
        EntityKind::ComplexType(ct) => {
            if let Some(derivation) = &ct.derivation {
                refs.push((SymbolSpace::Type, &derivation.base));
            }
            particle_references(&ct.particles, &mut refs);
        }
        EntityKind::Element(decl) => {
            refs.push((SymbolSpace::Type, &decl.ty));
            if let Some(head) = &decl.substitution_group {
                refs.push((SymbolSpace::Element, head));
            }
        }
        EntityKind::Attribute(decl) => refs.push((SymbolSpace::Type, &decl.ty)),
        EntityKind::Group(particles) | EntityKind::AttributeGroup(particles) => {
            particle_references(particles, &mut refs)
        }
    }
    refs
}

fn particle_references<'e>(particles: &'e [Particle], refs: &mut Vec<(SymbolSpace, &'e RawRef)>) {
    for particle in particles {
        let r = match particle {
            Particle::Element(e) => (SymbolSpace::Type, &e.ty),
            Particle::Attribute(a) => (SymbolSpace::Type, &a.ty),
            Particle::ElementRef { target, .. } => (SymbolSpace::Element, target),
            Particle::AttributeRef { target, .. } => (SymbolSpace::Attribute, target),
            Particle::GroupRef { target, .. } => (SymbolSpace::Group, target),
            Particle::AttributeGroupRef { target } => (SymbolSpace::AttributeGroup, target),
            Particle::Any { .. } | Particle::AnyAttribute => continue,
        };
        refs.push(r);
    }
}

fn derivation_base(entity: &Entity) -> Option<&RawRef> {
    match &entity.kind {
        EntityKind::ComplexType(ct) => ct.derivation.as_ref().map(|d| &d.base),
        EntityKind::SimpleType(SimpleType::Restriction { base, .. }) => Some(base),
        _ => None,
    }
}

fn named_kind(entity: &Entity) -> NamedKind {
    match &entity.kind {
        EntityKind::ComplexType(_) => NamedKind::Struct,
        EntityKind::SimpleType(SimpleType::Restriction { enumeration, .. })
            if !enumeration.is_empty() =>
        {
            NamedKind::Enum
        }
        _ => NamedKind::Alias,
    }
}

fn foreign_namespace(name: &QName, owner: &Entity) -> Option<String> {
    (!name.namespace.is_empty() && name.namespace != owner.name.namespace)
        .then(|| name.namespace.clone())
}

/// Append `field`, folding a repeated particle into a collection.
fn push_field(fields: &mut Vec<Field>, field: Field) {
    match fields
        .iter_mut()
        .find(|f| f.kind == field.kind && f.name == field.name)
    {
        Some(existing) => existing.collection = true,
        None => fields.push(field),
    }
}

/// Named types a declaration refers to.
fn named_types(decl: &TypeDecl) -> Vec<&QName> {
    let types: Vec<&FieldType> = match decl {
        TypeDecl::Struct(s) => s.fields.iter().map(|f| &f.ty).collect(),
        TypeDecl::Alias(a) => vec![&a.target],
        TypeDecl::Enum(_) => Vec::new(),
    };
    types
        .into_iter()
        .filter_map(|ty| match ty {
            FieldType::Named { name, .. } => Some(name),
            FieldType::Builtin { .. } => None,
        })
        .collect()
}

/// `path` relative to the directory `base`, climbing with `..` as needed.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() != base.is_absolute() {
        return path.to_path_buf();
    }
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part);
    }
    relative
}

fn with_doc(mut decl: TypeDecl, doc: Option<String>) -> TypeDecl {
    match &mut decl {
        TypeDecl::Struct(s) => s.doc = doc,
        TypeDecl::Enum(e) => e.doc = doc,
        TypeDecl::Alias(a) => a.doc = doc,
    }
    decl
}

fn unresolved(space: SymbolSpace, r: &RawRef, from: &Entity) -> XsdError {
    XsdError::UnresolvedReference {
        space,
        name: r.name.clone(),
        source_file: from.source.clone(),
    }
}
