//! Identifier derivation shared by every generator.

use std::collections::HashSet;

/// Upper-case the first letter of every whitespace-separated word.
///
/// Unicode-aware and idempotent: `"привет мир"` becomes `"Привет Мир"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && !c.is_whitespace() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// Join the alphanumeric runs of `s`, each title-cased.
fn pascal_parts(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(title_case)
        .collect()
}

/// A type or field identifier valid in all target languages.
///
/// `"personType"` becomes `"PersonType"`, `"first-name"` becomes
/// `"FirstName"`; a leading digit is prefixed with `N`.
pub fn identifier(name: &str) -> String {
    let id = pascal_parts(name);
    match id.chars().next() {
        Some(c) if c.is_numeric() => format!("N{id}"),
        _ => id,
    }
}

/// Distinct variant identifiers for enumeration literals, in literal order.
///
/// Literals that collapse to the same identifier (differing only in case or
/// punctuation) get numeric suffixes; literals without letters are prefixed
/// with `Value`.
pub fn enum_variant_identifiers(literals: &[String]) -> Vec<String> {
    uniquify(literals.iter().map(|literal| {
        let base = pascal_parts(literal);
        match base.chars().next() {
            None => "Value".to_string(),
            Some(c) if c.is_numeric() => format!("Value{base}"),
            Some(_) => base,
        }
    }))
}

/// Make `names` distinct by suffixing later repeats with `2`, `3`, ...
pub fn uniquify(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used = HashSet::new();
    names
        .into_iter()
        .map(|base| {
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base}{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Append `ext` to `file` with exactly one dot, unless `file` already ends
/// with it.
///
/// ```
/// use xsdgen::with_extension;
///
/// assert_eq!(with_extension("foo", ".go"), "foo.go");
/// assert_eq!(with_extension("foo.go", "go"), "foo.go");
/// assert_eq!(with_extension("foo.bar", ".java"), "foo.bar.java");
/// ```
pub fn with_extension(file: &str, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() || file.ends_with(&format!(".{ext}")) {
        return file.to_string();
    }
    format!("{}.{}", file.trim_end_matches('.'), ext)
}
