//! # xsdgen
//!
//! XSD to data-binding code generator.
//!
//! This crate parses XML Schema Definition documents, follows their
//! `xs:include`/`xs:import` closure, resolves every type reference into a
//! language-agnostic prototype tree, and emits type declarations for Go,
//! TypeScript, C, Java or Rust.
//!
//! ## Architecture
//!
//! 1. **Resolve** - `resolver` maps include/import directives to files and
//!    guarantees each physical file is parsed once
//! 2. **Parse** - `document` turns one XSD document into raw declarations
//! 3. **Build** - `tree_builder` merges, resolves and flattens them into a
//!    [`ProtoTree`]
//! 4. **Generate** - `codegen` renders the tree for the selected language
//!
//! [`Parser`] drives the whole pipeline for one root schema file.
//!
//! ## Usage
//!
//! ```no_run
//! use xsdgen::{ParseOptions, Parser};
//!
//! let options = ParseOptions::new("schemas/order.xsd", "schemas", "generated", "Go");
//! let report = Parser::new(options).parse()?;
//! println!("wrote {:?}", report.output);
//! # Ok::<(), xsdgen::XsdError>(())
//! ```

pub mod codegen;
pub mod document;
pub mod options;
pub mod parser;
pub mod proto_tree;
pub mod qname;
pub mod resolver;
pub mod schema_model;
pub mod tree_builder;

use itertools::Itertools;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use codegen::{generator_for, with_extension, CodeGenerator};
pub use options::{Lang, ParseOptions, UnsupportedPolicy};
pub use parser::{parse, ParseReport, Parser};
pub use proto_tree::ProtoTree;
pub use qname::QName;
pub use resolver::ResolverState;
pub use schema_model::SymbolSpace;

/// Configuration problems detected before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("file path must not be empty")]
    EmptyFilePath,

    #[error("output directory must not be empty")]
    EmptyOutputDir,

    #[error("input directory must not be empty when no in-memory schema is given")]
    EmptyInputDir,

    #[error("target language must not be empty")]
    EmptyLang,

    #[error("unknown target language '{0}' (expected Go, TypeScript, C, Java or Rust)")]
    UnknownLang(String),
}

/// A recognized XSD construct that has no structural representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedConstruct {
    /// The construct, e.g. `xs:keyref`.
    pub construct: String,
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for UnsupportedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported construct <{}> at {}:{}:{}",
            self.construct,
            self.path.display(),
            self.line,
            self.column
        )
    }
}

impl std::error::Error for UnsupportedConstruct {}

#[derive(Debug, Error)]
pub enum XsdError {
    #[error("invalid options: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot resolve '{location}' referenced from {}: {reason}", from.display())]
    Resolution {
        location: String,
        from: PathBuf,
        reason: String,
    },

    #[error("duplicate {space} definition {name} in {} (first defined in {})", second.display(), first.display())]
    DuplicateDefinition {
        space: SymbolSpace,
        name: QName,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("unresolved {space} reference {name} in {}", source_file.display())]
    UnresolvedReference {
        space: SymbolSpace,
        name: QName,
        source_file: PathBuf,
    },

    #[error("cyclic definition: {}", chain.iter().join(" -> "))]
    CyclicType { chain: Vec<QName> },

    #[error(transparent)]
    UnsupportedConstruct(#[from] UnsupportedConstruct),

    #[error("XML error in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XsdError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, XsdError>;
