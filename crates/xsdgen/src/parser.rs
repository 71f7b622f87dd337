//! Parse orchestration.
//!
//! [`Parser`] validates its [`ParseOptions`], walks the include/import closure
//! of the root schema, builds the [`ProtoTree`] and hands it to the generator
//! of the selected language.

use crate::codegen::{generator_for, with_extension};
use crate::document::parse_document_in;
use crate::options::{Lang, ParseOptions};
use crate::proto_tree::ProtoTree;
use crate::resolver::{canonical, Origin};
use crate::tree_builder::build_tree;
use crate::{Result, UnsupportedConstruct, XsdError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a successful parse.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub tree: ProtoTree,
    /// The written file; `None` in extract mode.
    pub output: Option<PathBuf>,
    /// Constructs skipped under [`crate::UnsupportedPolicy::Collect`].
    pub warnings: Vec<UnsupportedConstruct>,
}

pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the root schema and, unless in extract mode, write the generated
    /// code. Nothing is written when any step fails.
    pub fn parse(&mut self) -> Result<ParseReport> {
        let lang = self.options.validate()?;

        let root = canonical(&self.options.file_path);
        let mut warnings = Vec::new();
        self.walk(&root, Origin::Root, &mut warnings)?;
        self.options.state.check_pending_imports()?;

        let tree = build_tree(&self.options.state, &root)?;
        info!(
            "parsed {} ({} files, {} declarations)",
            self.options.file_path.display(),
            self.options.state.parse_file_list.len(),
            tree.decls.len()
        );

        if self.options.extract {
            return Ok(ParseReport {
                tree,
                output: None,
                warnings,
            });
        }

        let code = generator_for(lang).generate(&tree)?;
        let output = self.output_path(lang);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| XsdError::io(parent, e))?;
        }
        fs::write(&output, code).map_err(|e| XsdError::io(&output, e))?;
        info!("wrote {} code to {}", lang, output.display());

        Ok(ParseReport {
            tree,
            output: Some(output),
            warnings,
        })
    }

    /// Parse `path` and, recursively, everything it includes or imports.
    fn walk(
        &mut self,
        path: &Path,
        origin: Origin,
        warnings: &mut Vec<UnsupportedConstruct>,
    ) -> Result<()> {
        if !self.options.state.begin_file(path) {
            debug!("skipping already parsed {}", path.display());
            return Ok(());
        }
        debug!("parsing {}", path.display());

        let bytes = match (&origin, &self.options.schema) {
            (Origin::Root, Some(schema)) => schema.clone(),
            _ => fs::read(path).map_err(|e| XsdError::io(path, e))?,
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| XsdError::xml(path, format!("invalid UTF-8: {e}")))?;

        let inherited = match &origin {
            Origin::Include { namespace } => namespace.as_deref(),
            _ => None,
        };
        let doc = parse_document_in(
            text,
            path,
            inherited,
            self.options.unsupported,
            &mut self.options.state.anonymous_names,
        )?;
        check_namespace(path, &origin, doc.declared_namespace.as_deref())?;
        warnings.extend(doc.warnings);

        self.options
            .state
            .record_file(path.to_path_buf(), &doc.target_namespace, doc.entities);

        for directive in &doc.directives {
            let input_dir = self.options.input_dir.clone();
            let next = self
                .options
                .state
                .resolve(directive, path, &doc.target_namespace, &input_dir)?;
            if let Some((next_path, next_origin)) = next {
                self.walk(&next_path, next_origin, warnings)?;
            }
        }
        Ok(())
    }

    /// `output_dir` joined with the input path relative to `input_dir`
    /// (or just its file name), with the language extension appended.
    fn output_path(&self, lang: Lang) -> PathBuf {
        let file = &self.options.file_path;
        let relative = file
            .strip_prefix(&self.options.input_dir)
            .ok()
            .filter(|r| !r.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| file.file_name().map(PathBuf::from))
            .unwrap_or_else(|| file.clone());
        let name = with_extension(&relative.to_string_lossy(), lang.extension());
        self.options.output_dir.join(name)
    }
}

/// Parse with a fresh [`Parser`].
pub fn parse(options: ParseOptions) -> Result<ParseReport> {
    Parser::new(options).parse()
}

/// An imported file must declare the namespace it was imported for, and an
/// included file must share the includer's (or declare none).
fn check_namespace(path: &Path, origin: &Origin, declared: Option<&str>) -> Result<()> {
    let mismatch = |expected: &str| XsdError::Resolution {
        location: path.display().to_string(),
        from: path.to_path_buf(),
        reason: format!(
            "targetNamespace '{}' does not match expected '{}'",
            declared.unwrap_or_default(),
            expected
        ),
    };
    match origin {
        Origin::Root => Ok(()),
        Origin::Include { namespace } => match (declared, namespace.as_deref()) {
            (Some(declared), Some(expected)) if declared != expected => Err(mismatch(expected)),
            (Some(_), None) => Err(mismatch("")),
            _ => Ok(()),
        },
        Origin::Import { namespace } => {
            let expected = namespace.as_deref().unwrap_or_default();
            if declared.unwrap_or_default() != expected {
                return Err(mismatch(expected));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn test_validation_precedes_io() {
        // The file does not exist; validation must fail first.
        let options = ParseOptions::new("/does/not/exist.xsd", "/does/not", "", "go");
        let err = parse(options).unwrap_err();
        assert!(matches!(
            err,
            XsdError::Validation(ValidationError::EmptyOutputDir)
        ));
    }

    #[test]
    fn test_output_path_mirrors_input_layout() {
        let parser = Parser::new(ParseOptions::new(
            "schemas/orders/order.xsd",
            "schemas",
            "out",
            "java",
        ));
        assert_eq!(
            parser.output_path(Lang::Java),
            PathBuf::from("out/orders/order.xsd.java")
        );

        let parser = Parser::new(ParseOptions::new("/elsewhere/a.xsd", "schemas", "out", "go"));
        assert_eq!(parser.output_path(Lang::Go), PathBuf::from("out/a.xsd.go"));
    }

    #[test]
    fn test_namespace_checks() {
        let path = Path::new("common.xsd");
        let include = Origin::Include {
            namespace: Some("urn:a".to_string()),
        };
        assert!(check_namespace(path, &include, None).is_ok());
        assert!(check_namespace(path, &include, Some("urn:a")).is_ok());
        assert!(check_namespace(path, &include, Some("urn:b")).is_err());

        let import = Origin::Import {
            namespace: Some("urn:b".to_string()),
        };
        assert!(check_namespace(path, &import, Some("urn:b")).is_ok());
        assert!(check_namespace(path, &import, None).is_err());
    }
}
