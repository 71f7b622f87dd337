//! Parse configuration.

use crate::resolver::ResolverState;
use crate::ValidationError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target language of the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Go,
    TypeScript,
    C,
    Java,
    Rust,
}

impl Lang {
    pub const ALL: [Lang; 5] = [Lang::Go, Lang::TypeScript, Lang::C, Lang::Java, Lang::Rust];

    /// File extension of generated files, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Lang::Go => "go",
            Lang::TypeScript => "ts",
            Lang::C => "h",
            Lang::Java => "java",
            Lang::Rust => "rs",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lang::Go => "Go",
            Lang::TypeScript => "TypeScript",
            Lang::C => "C",
            Lang::Java => "Java",
            Lang::Rust => "Rust",
        };
        f.write_str(name)
    }
}

impl FromStr for Lang {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(ValidationError::EmptyLang),
            "go" => Ok(Lang::Go),
            "typescript" | "ts" => Ok(Lang::TypeScript),
            "c" => Ok(Lang::C),
            "java" => Ok(Lang::Java),
            "rust" | "rs" => Ok(Lang::Rust),
            _ => Err(ValidationError::UnknownLang(s.to_string())),
        }
    }
}

/// What to do when the parser meets a construct it cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    /// Abort the parse with [`crate::XsdError::UnsupportedConstruct`].
    #[default]
    Fail,
    /// Keep going and report the construct in [`crate::ParseReport::warnings`].
    Collect,
}

/// Everything one `parse` invocation needs.
///
/// The resolver bookkeeping in [`ParseOptions::state`] is mutated while the
/// closure is walked, so an instance must not be reused for a second parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Root schema file.
    pub file_path: PathBuf,
    /// In-memory bytes replacing the read of `file_path` (root only).
    pub schema: Option<Vec<u8>>,
    /// Root for relative includes and for mirroring output paths.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Target language name, see [`Lang`].
    pub lang: String,
    /// Parse and validate only; nothing is generated or written.
    pub extract: bool,
    pub unsupported: UnsupportedPolicy,
    pub state: ResolverState,
}

impl ParseOptions {
    pub fn new(
        file_path: impl Into<PathBuf>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            lang: lang.into(),
            ..Default::default()
        }
    }

    /// Parse `schema` instead of reading the root file from disk.
    pub fn with_schema(mut self, schema: impl Into<Vec<u8>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_unsupported(mut self, policy: UnsupportedPolicy) -> Self {
        self.unsupported = policy;
        self
    }

    /// Check the configuration, returning the parsed target language.
    pub fn validate(&self) -> Result<Lang, ValidationError> {
        if is_empty(&self.file_path) {
            return Err(ValidationError::EmptyFilePath);
        }
        if is_empty(&self.output_dir) {
            return Err(ValidationError::EmptyOutputDir);
        }
        if self.schema.is_none() && is_empty(&self.input_dir) {
            return Err(ValidationError::EmptyInputDir);
        }
        self.lang.parse()
    }
}

fn is_empty(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ParseOptions {
        ParseOptions::new("some file", "some input", "some dir", "go")
    }

    #[test]
    fn test_valid_options() {
        assert_eq!(valid().validate(), Ok(Lang::Go));
    }

    #[test]
    fn test_empty_file_path() {
        let opt = ParseOptions {
            file_path: PathBuf::new(),
            ..valid()
        };
        assert_eq!(opt.validate(), Err(ValidationError::EmptyFilePath));
    }

    #[test]
    fn test_empty_output_dir() {
        let opt = ParseOptions {
            output_dir: PathBuf::new(),
            ..valid()
        };
        assert_eq!(opt.validate(), Err(ValidationError::EmptyOutputDir));
    }

    #[test]
    fn test_empty_input_dir() {
        let opt = ParseOptions {
            input_dir: PathBuf::new(),
            ..valid()
        };
        assert_eq!(opt.validate(), Err(ValidationError::EmptyInputDir));

        // An in-memory schema does not need an input directory.
        let opt = opt.with_schema("<xs:schema/>");
        assert_eq!(opt.validate(), Ok(Lang::Go));
    }

    #[test]
    fn test_empty_lang() {
        let opt = ParseOptions {
            lang: String::new(),
            ..valid()
        };
        assert_eq!(opt.validate(), Err(ValidationError::EmptyLang));
    }

    #[test]
    fn test_unknown_lang() {
        let opt = ParseOptions {
            lang: "cobol".to_string(),
            ..valid()
        };
        assert_eq!(
            opt.validate(),
            Err(ValidationError::UnknownLang("cobol".to_string()))
        );
    }

    #[test]
    fn test_lang_names() {
        assert_eq!("TypeScript".parse::<Lang>(), Ok(Lang::TypeScript));
        assert_eq!("ts".parse::<Lang>(), Ok(Lang::TypeScript));
        assert_eq!("RUST".parse::<Lang>(), Ok(Lang::Rust));
        for lang in Lang::ALL {
            assert_eq!(lang.to_string().parse::<Lang>(), Ok(lang));
        }
    }

    #[test]
    fn test_extensions() {
        let exts: Vec<_> = Lang::ALL.iter().map(|l| l.extension()).collect();
        assert_eq!(exts, ["go", "ts", "h", "java", "rs"]);
    }
}
