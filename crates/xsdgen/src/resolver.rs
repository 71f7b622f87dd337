//! Namespace & include resolution.
//!
//! [`ResolverState`] holds the bookkeeping one parse invocation threads
//! through every recursive document parse: which files were already parsed,
//! which namespace owns a local name, where each namespace's schema lives, and
//! the raw declarations harvested per file.

use crate::qname::{QName, XML_NS, XS_NS};
use crate::schema_model::Entity;
use crate::{Result, XsdError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An `xs:include` or `xs:import` found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Include {
        location: String,
    },
    Import {
        namespace: Option<String>,
        location: Option<String>,
    },
}

/// How a file entered the closure, used to check its `targetNamespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Root,
    /// Included from a document whose target namespace is `namespace`.
    Include { namespace: Option<String> },
    /// Imported for `namespace`.
    Import { namespace: Option<String> },
}

/// A location-less import that must be satisfied by some file in the closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImport {
    pub namespace: String,
    pub from: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    /// Files already parsed (canonical paths).
    pub include_map: HashSet<PathBuf>,
    /// Local name → namespace of its first declaration.
    pub local_name_ns_map: HashMap<String, String>,
    /// Namespace → schema file that declares it.
    pub ns_schema_location_map: HashMap<String, PathBuf>,
    /// Parsed files in parse order.
    pub parse_file_list: Vec<PathBuf>,
    /// Raw declarations per parsed file.
    pub parse_file_map: HashMap<PathBuf, Vec<Entity>>,
    pub parsed_namespaces: HashSet<String>,
    pub pending_imports: Vec<PendingImport>,
    /// Names given to anonymous types anywhere in the closure.
    pub anonymous_names: HashSet<QName>,
}

impl ResolverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as being parsed. Returns false when it was seen before,
    /// in which case the caller must not parse it again.
    pub fn begin_file(&mut self, path: &Path) -> bool {
        self.include_map.insert(path.to_path_buf())
    }

    /// Store the declarations harvested from `path`.
    pub fn record_file(&mut self, path: PathBuf, target_namespace: &str, entities: Vec<Entity>) {
        for entity in &entities {
            if entity.anonymous {
                continue;
            }
            self.local_name_ns_map
                .entry(entity.name.local.clone())
                .or_insert_with(|| entity.name.namespace.clone());
        }
        self.parsed_namespaces.insert(target_namespace.to_string());
        self.ns_schema_location_map
            .entry(target_namespace.to_string())
            .or_insert_with(|| path.clone());
        self.parse_file_list.push(path.clone());
        self.parse_file_map.insert(path, entities);
    }

    /// Resolve a directive found in `from` (whose target namespace is
    /// `from_namespace`) to the file that should be parsed next.
    ///
    /// Returns `None` when there is nothing to parse: well-known namespaces,
    /// and location-less imports whose schema is not known yet (those are
    /// checked by [`ResolverState::check_pending_imports`]).
    pub fn resolve(
        &mut self,
        directive: &Directive,
        from: &Path,
        from_namespace: &str,
        input_dir: &Path,
    ) -> Result<Option<(PathBuf, Origin)>> {
        match directive {
            Directive::Include { location } => {
                let path = locate(location, from, input_dir)?;
                debug!("include {} -> {}", location, path.display());
                let namespace = (!from_namespace.is_empty()).then(|| from_namespace.to_string());
                Ok(Some((path, Origin::Include { namespace })))
            }
            Directive::Import {
                namespace,
                location,
            } => {
                let ns = namespace.clone().unwrap_or_default();
                if ns == XS_NS || ns == XML_NS {
                    return Ok(None);
                }
                let origin = Origin::Import {
                    namespace: namespace.clone(),
                };
                if let Some(location) = location {
                    let path = locate(location, from, input_dir)?;
                    debug!("import {} ({}) -> {}", location, ns, path.display());
                    self.ns_schema_location_map
                        .entry(ns)
                        .or_insert_with(|| path.clone());
                    return Ok(Some((path, origin)));
                }
                if let Some(path) = self.ns_schema_location_map.get(&ns) {
                    debug!("import of {} resolved through known location {}", ns, path.display());
                    return Ok(Some((path.clone(), origin)));
                }
                debug!("import of {} without schemaLocation deferred", ns);
                self.pending_imports.push(PendingImport {
                    namespace: ns,
                    from: from.to_path_buf(),
                });
                Ok(None)
            }
        }
    }

    /// Fail for any location-less import whose namespace no file in the
    /// closure declares.
    pub fn check_pending_imports(&self) -> Result<()> {
        for pending in &self.pending_imports {
            if self.parsed_namespaces.contains(&pending.namespace)
                || self.ns_schema_location_map.contains_key(&pending.namespace)
            {
                continue;
            }
            return Err(XsdError::Resolution {
                location: pending.namespace.clone(),
                from: pending.from.clone(),
                reason: "no schema in the include/import closure declares this namespace"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Find the file a `schemaLocation` points at: relative to the referencing
/// document first, then to the input directory.
pub fn locate(location: &str, from: &Path, input_dir: &Path) -> Result<PathBuf> {
    let relative = if is_remote(location) {
        location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(location)
    } else {
        location
    };

    let mut candidates = Vec::new();
    if let Some(dir) = from.parent() {
        candidates.push(dir.join(relative));
    }
    candidates.push(input_dir.join(relative));

    candidates
        .into_iter()
        .find(|p| p.is_file())
        .map(|p| canonical(&p))
        .ok_or_else(|| XsdError::Resolution {
            location: location.to_string(),
            from: from.to_path_buf(),
            reason: if is_remote(location) {
                "remote schemas are not fetched and no local copy was found".to_string()
            } else {
                "file not found".to_string()
            },
        })
}

/// Canonical form of `path` used as the identity of a physical file.
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
