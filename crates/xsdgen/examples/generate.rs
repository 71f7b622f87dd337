//! Example: Generate code from an XSD schema
//!
//! Parses one root schema (following its includes and imports) and writes
//! the generated declarations under the output directory.
//!
//! Run with:
//! ```
//! cargo run --example generate -- path/to/schema.xsd [input-dir] [output-dir] [lang]
//! ```
//!
//! `lang` is one of `go`, `ts`, `c`, `java`, `rust`; pass `extract` as the
//! language to print the prototype tree as JSON instead.

use anyhow::Context;
use std::env;
use std::path::Path;
use xsdgen::{ParseOptions, Parser, UnsupportedPolicy};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(file) = args.first() else {
        println!("Usage: cargo run --example generate -- <schema.xsd> [input-dir] [output-dir] [lang]");
        return Ok(());
    };

    let input_dir = args.get(1).cloned().unwrap_or_else(|| {
        Path::new(file)
            .parent()
            .map(|p| p.display().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string())
    });
    let output_dir = args.get(2).map(String::as_str).unwrap_or("generated");
    let lang = args.get(3).map(String::as_str).unwrap_or("go");
    let extract = lang == "extract";

    let options = ParseOptions::new(file, &input_dir, output_dir, if extract { "go" } else { lang })
        .with_extract(extract)
        .with_unsupported(UnsupportedPolicy::Collect);

    let mut parser = Parser::new(options);
    let report = parser
        .parse()
        .with_context(|| format!("failed to generate code for {file}"))?;

    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    if extract {
        println!("{}", report.tree.to_json()?);
    } else if let Some(output) = &report.output {
        println!(
            "Wrote {} declarations to {}",
            report.tree.decls.len(),
            output.display()
        );
    }

    Ok(())
}
