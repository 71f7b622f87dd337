//! Qualified names.

use serde::Serialize;
use std::fmt;

/// The XML Schema namespace.
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// The `xml:` namespace (`xml:lang`, `xml:space`, ...).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A (namespace URI, local name) pair. The empty namespace means "no namespace".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    pub fn is_xsd(&self) -> bool {
        self.namespace == XS_NS
    }

    pub fn is_xml(&self) -> bool {
        self.namespace == XML_NS
    }

    /// Parse Clark notation: `{http://example.com/ns}localName`.
    ///
    /// A name without braces is taken to be in no namespace.
    pub fn from_clark(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix('{') {
            if let Some(end) = rest.find('}') {
                return Self::new(&rest[..end], &rest[end + 1..]);
            }
        }
        Self::new("", name)
    }
}

impl fmt::Display for QName {
    /// Formats in Clark notation, omitting the braces for no-namespace names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clark_notation() {
        let name = QName::from_clark("{http://example.com/book}personType");
        assert_eq!(name.namespace, "http://example.com/book");
        assert_eq!(name.local, "personType");
        assert_eq!(name.to_string(), "{http://example.com/book}personType");
    }

    #[test]
    fn test_no_namespace() {
        let name = QName::from_clark("book");
        assert_eq!(name, QName::new("", "book"));
        assert_eq!(name.to_string(), "book");
    }

    #[test]
    fn test_well_known_namespaces() {
        assert!(QName::new(XS_NS, "string").is_xsd());
        assert!(QName::new(XML_NS, "lang").is_xml());
        assert!(!QName::new("urn:x", "string").is_xsd());
    }
}
