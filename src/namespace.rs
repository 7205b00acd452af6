use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AtomError, Result};

/// An XML namespace: a required URI plus an optional serialization prefix.
///
/// Two namespaces are equal when their URIs match; the prefix only decides
/// how elements in the namespace are written (`<dc:subject>` vs
/// `<subject xmlns="...">`). A namespace also compares equal to a bare URI
/// string.
#[derive(Debug, Clone)]
pub struct Namespace {
    prefix: Option<Cow<'static, str>>,
    uri: Cow<'static, str>,
}

impl Namespace {
    /// Atom 1.0
    pub const ATOM: Namespace = Namespace::constant(None, "http://www.w3.org/2005/Atom");
    pub const ATOM_WITH_PREFIX: Namespace =
        Namespace::constant(Some("atom"), "http://www.w3.org/2005/Atom");
    /// Atom 0.3
    pub const OBSOLETE_ATOM: Namespace = Namespace::constant(None, "http://purl.org/atom/ns#");
    pub const OBSOLETE_ATOM_WITH_PREFIX: Namespace =
        Namespace::constant(Some("atom"), "http://purl.org/atom/ns#");
    /// AtomPub
    pub const APP: Namespace = Namespace::constant(None, "http://www.w3.org/2007/app");
    pub const APP_WITH_PREFIX: Namespace =
        Namespace::constant(Some("app"), "http://www.w3.org/2007/app");
    pub const OBSOLETE_APP: Namespace = Namespace::constant(None, "http://purl.org/atom/app#");
    pub const OBSOLETE_APP_WITH_PREFIX: Namespace =
        Namespace::constant(Some("app"), "http://purl.org/atom/app#");
    /// Dublin Core
    pub const DC: Namespace = Namespace::constant(Some("dc"), "http://purl.org/dc/elements/1.1/");
    /// OpenSearch pagination
    pub const OPEN_SEARCH: Namespace = Namespace::constant(
        Some("openSearch"),
        "http://a9.com/-/spec/opensearchrss/1.1/",
    );
    pub const RDF: Namespace = Namespace::constant(
        Some("rdf"),
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
    );
    pub const FOAF: Namespace = Namespace::constant(Some("foaf"), "http://xmlns.com/foaf/0.1");
    /// Atom Threading Extensions (RFC 4685)
    pub const THR: Namespace =
        Namespace::constant(Some("thr"), "http://purl.org/syndication/thread/1.0");
    pub const XHTML: Namespace = Namespace::constant(None, "http://www.w3.org/1999/xhtml");
    /// Bound to the `xml` prefix by definition; never declared.
    pub const XML: Namespace =
        Namespace::constant(Some("xml"), "http://www.w3.org/XML/1998/namespace");

    const fn constant(prefix: Option<&'static str>, uri: &'static str) -> Self {
        let prefix = match prefix {
            Some(p) => Some(Cow::Borrowed(p)),
            None => None,
        };
        Namespace {
            prefix,
            uri: Cow::Borrowed(uri),
        }
    }

    /// The namespace conventionally bound to `prefix` in Atom documents
    /// (`atom`, `app`, `thr`, `openSearch`, `dc`, `rdf`, `foaf`, `xml`).
    pub fn well_known(prefix: &str) -> Option<Namespace> {
        [
            Namespace::ATOM_WITH_PREFIX,
            Namespace::APP_WITH_PREFIX,
            Namespace::THR,
            Namespace::OPEN_SEARCH,
            Namespace::DC,
            Namespace::RDF,
            Namespace::FOAF,
            Namespace::XML,
        ]
        .into_iter()
        .find(|ns| ns.prefix() == Some(prefix))
    }

    /// Creates a namespace, rejecting an empty URI. An empty prefix is
    /// treated as no prefix.
    pub fn new(uri: impl Into<String>, prefix: Option<&str>) -> Result<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(AtomError::Validation("namespace URI is required".into()));
        }
        Ok(Namespace {
            prefix: prefix
                .filter(|p| !p.is_empty())
                .map(|p| Cow::Owned(p.to_string())),
            uri: Cow::Owned(uri),
        })
    }

    /// Builds a namespace from parts already known to be valid, as found on
    /// a parsed node. A missing URI maps to the empty (no-namespace) URI.
    pub(crate) fn from_parts(uri: Option<&str>, prefix: Option<&str>) -> Self {
        Namespace {
            prefix: prefix.map(|p| Cow::Owned(p.to_string())),
            uri: Cow::Owned(uri.unwrap_or_default().to_string()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The same namespace with a different prefix.
    pub fn with_prefix(&self, prefix: Option<&str>) -> Namespace {
        Namespace {
            prefix: prefix.map(|p| Cow::Owned(p.to_string())),
            uri: self.uri.clone(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Namespace {}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl PartialEq<str> for Namespace {
    fn eq(&self, other: &str) -> bool {
        self.uri == other
    }
}

impl PartialEq<&str> for Namespace {
    fn eq(&self, other: &&str) -> bool {
        self.uri == *other
    }
}

impl PartialEq<Namespace> for str {
    fn eq(&self, other: &Namespace) -> bool {
        other == self
    }
}

impl PartialEq<Namespace> for &str {
    fn eq(&self, other: &Namespace) -> bool {
        other == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ns = Namespace::new("http://example.org/ns", Some("ex")).unwrap();
        assert_eq!(ns.prefix(), Some("ex"));
        assert_eq!(ns.uri(), "http://example.org/ns");
        assert_eq!(ns.to_string(), "http://example.org/ns");
    }

    #[test]
    fn test_empty_uri_rejected() {
        let err = Namespace::new("", None).unwrap_err();
        assert!(matches!(err, AtomError::Validation(_)));
    }

    #[test]
    fn test_well_known_constants() {
        assert_eq!(Namespace::ATOM.prefix(), None);
        assert_eq!(Namespace::ATOM.uri(), "http://www.w3.org/2005/Atom");
        assert_eq!(Namespace::ATOM_WITH_PREFIX.prefix(), Some("atom"));
        assert_eq!(Namespace::OBSOLETE_ATOM.uri(), "http://purl.org/atom/ns#");
        assert_eq!(Namespace::APP_WITH_PREFIX.prefix(), Some("app"));
        assert_eq!(Namespace::OBSOLETE_APP.uri(), "http://purl.org/atom/app#");
        assert_eq!(Namespace::OPEN_SEARCH.prefix(), Some("openSearch"));
        assert_eq!(Namespace::FOAF.uri(), "http://xmlns.com/foaf/0.1");
        assert_eq!(Namespace::DC.uri(), "http://purl.org/dc/elements/1.1/");
        assert_eq!(Namespace::RDF.prefix(), Some("rdf"));
        assert_eq!(Namespace::THR.prefix(), Some("thr"));
    }

    #[test]
    fn test_equality_ignores_prefix() {
        assert_eq!(Namespace::ATOM, Namespace::ATOM_WITH_PREFIX);
        assert_ne!(Namespace::ATOM, Namespace::OBSOLETE_ATOM);
    }

    #[test]
    fn test_equality_with_raw_uri() {
        assert!(Namespace::APP == "http://www.w3.org/2007/app");
        assert!("http://www.w3.org/2007/app" == Namespace::APP_WITH_PREFIX);
        assert!(Namespace::APP != "http://purl.org/atom/app#");
    }
}
