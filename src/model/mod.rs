//! Typed Atom and AtomPub elements.
//!
//! # Architecture
//!
//! Every type here is a thin view over an [`XmlElement`]: it holds a handle
//! to one node and reads or writes through to it. There is no second copy of
//! the data, so a child obtained from an accessor (a feed's entries, an
//! entry's authors) edits the tree it came from.
//!
//! - [`AtomElement`] is implemented by every element type. It carries the
//!   element's name and default namespace, construction from a node or from
//!   key/value options, and the generic `get`/`set`/`add` family used both by
//!   the typed accessors and for foreign extension elements.
//! - [`RootElement`] adds document entry points (`parse`, `from_file`,
//!   `to_bytes`) to the four document types.
//! - [`CoreElement`] holds what [`Feed`] and [`Entry`] share: identity,
//!   timestamps, people, categories, and the `rel`-filtered link accessors.
//!
//! An element's working namespace is the namespace of its own node, so a
//! document in the obsolete Atom 0.3 namespace is read with the same
//! accessors as an Atom 1.0 one.

mod category;
mod content;
mod core_element;
mod entry;
mod feed;
mod link;
mod person;
mod service;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};

use crate::config::Config;
use crate::error::{AtomError, Result};
use crate::namespace::Namespace;
use crate::source::{ByteSource, FileSource};
use crate::xml::{self, ChildValue, XmlElement};

pub use self::category::{Categories, Category};
pub use self::content::Content;
pub use self::core_element::CoreElement;
pub use self::entry::{Control, Entry, ReplyTarget};
pub use self::feed::{Feed, Generator};
pub use self::link::{Link, LinkLike, Relation, RepliesLink, TypedLink};
pub use self::person::{Author, Contributor, Person, PersonConstruct};
pub use self::service::{Collection, Service, Workspace};

// ============================================================================
// AtomElement
// ============================================================================

/// A typed view over one XML element.
pub trait AtomElement: Sized {
    /// Local name of the element this type models.
    const NAME: &'static str;

    /// Namespace a freshly built element is created in.
    const NAMESPACE: Namespace = Namespace::ATOM;

    /// Wraps `element` without checking its name.
    fn from_element_unchecked(element: XmlElement) -> Self;

    /// The node this view reads and writes.
    fn element(&self) -> &XmlElement;

    /// Applies one construction option, by accessor name.
    ///
    /// # Errors
    ///
    /// [`AtomError::Validation`] for a key the type does not recognize, or a
    /// format error when the value does not parse for that accessor.
    fn set_option(&mut self, key: &str, value: &str) -> Result<()>;

    /// Whether `element` can be viewed as this type: same local name, and
    /// the type's namespace or its obsolete predecessor.
    fn accepts(element: &XmlElement) -> bool {
        element.local_name() == Self::NAME && in_namespace(element, &Self::NAMESPACE)
    }

    /// A new, empty element.
    fn new() -> Self {
        Self::from_element_unchecked(XmlElement::new(&Self::NAMESPACE, Self::NAME))
    }

    /// Adopts an existing node.
    ///
    /// # Errors
    ///
    /// [`AtomError::UnexpectedElement`] when the node is not this element.
    fn from_element(element: XmlElement) -> Result<Self> {
        if !Self::accepts(&element) {
            return Err(AtomError::UnexpectedElement {
                expected: Self::NAME.to_string(),
                found: element.qualified_name(),
            });
        }
        Ok(Self::from_element_unchecked(element))
    }

    /// Builds a new element and applies each `(accessor, value)` pair in order.
    ///
    /// ```
    /// use atomutil::{AtomElement, Category};
    ///
    /// let cat = Category::with_options([("term", "joke"), ("label", "Joke")]).unwrap();
    /// assert_eq!(cat.term().as_deref(), Some("joke"));
    /// assert!(Category::with_options([("colour", "red")]).is_err());
    /// ```
    fn with_options<'a, I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut element = Self::new();
        for (key, value) in options {
            element.set_option(key, value)?;
        }
        Ok(element)
    }

    /// The working namespace: the node's own, falling back to the type's.
    fn namespace(&self) -> Namespace {
        let ns = self.element().namespace();
        if ns.uri().is_empty() {
            Self::NAMESPACE
        } else {
            ns
        }
    }

    // ------------------------------------------------------------------------
    // Generic child access
    // ------------------------------------------------------------------------

    /// First child named `local` in `ns`.
    fn get(&self, ns: &Namespace, local: &str) -> Option<XmlElement> {
        self.element().find_child(ns, local)
    }

    /// All children named `local` in `ns`, in document order.
    fn get_all(&self, ns: &Namespace, local: &str) -> Vec<XmlElement> {
        self.element().find_children(ns, local)
    }

    /// Text of the first child named `local` in `ns`.
    fn get_text(&self, ns: &Namespace, local: &str) -> Option<String> {
        self.get(ns, local).and_then(|e| e.text())
    }

    /// Replaces every `local` child in `ns` with one built from `value`.
    fn set(&self, ns: &Namespace, local: &str, value: impl Into<ChildValue>) -> XmlElement {
        self.element().set_child(ns, local, value.into(), &[])
    }

    /// Like [`set`](Self::set), also setting attributes on the new child.
    fn set_with_attrs(
        &self,
        ns: &Namespace,
        local: &str,
        value: impl Into<ChildValue>,
        attrs: &[(&str, &str)],
    ) -> XmlElement {
        self.element().set_child(ns, local, value.into(), attrs)
    }

    /// Appends a `local` child in `ns`, keeping existing ones.
    fn add(&self, ns: &Namespace, local: &str, value: impl Into<ChildValue>) -> XmlElement {
        self.element().add_child(ns, local, value.into(), &[])
    }

    fn add_with_attrs(
        &self,
        ns: &Namespace,
        local: &str,
        value: impl Into<ChildValue>,
        attrs: &[(&str, &str)],
    ) -> XmlElement {
        self.element().add_child(ns, local, value.into(), attrs)
    }

    /// Removes every `local` child in `ns`; returns how many were removed.
    fn remove(&self, ns: &Namespace, local: &str) -> usize {
        self.element().remove_children(ns, local)
    }

    /// First `local` child in `ns`, viewed as `T`.
    fn get_object<T: AtomElement>(&self, ns: &Namespace, local: &str) -> Option<T> {
        self.get(ns, local).map(T::from_element_unchecked)
    }

    /// All `local` children in `ns`, viewed as `T`.
    fn get_objects<T: AtomElement>(&self, ns: &Namespace, local: &str) -> Vec<T> {
        self.get_all(ns, local)
            .into_iter()
            .map(T::from_element_unchecked)
            .collect()
    }

    /// This element as a value for [`set`](Self::set)/[`add`](Self::add) on
    /// another element: its attributes and children are copied.
    fn to_child(&self) -> ChildValue {
        ChildValue::Element(self.element().clone())
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    fn attr(&self, name: &str) -> Option<String> {
        self.element().attr(name)
    }

    fn set_attr(&self, name: &str, value: &str) {
        self.element().set_attr(name, value);
    }

    /// Text of a child in the working namespace.
    fn child_text(&self, local: &str) -> Option<String> {
        self.get_text(&self.namespace(), local)
    }

    fn set_child_text(&self, local: &str, value: &str) {
        self.set(&self.namespace(), local, value);
    }

    /// An RFC 3339 timestamp child.
    ///
    /// # Errors
    ///
    /// [`AtomError::Timestamp`] when the text is not a valid timestamp.
    fn get_datetime(&self, ns: &Namespace, local: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_text(ns, local)
            .map(|text| parse_datetime(&text))
            .transpose()
    }

    fn set_datetime<Tz>(&self, ns: &Namespace, local: &str, value: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.set(ns, local, format_datetime(value));
    }

    /// An integer child.
    ///
    /// # Errors
    ///
    /// [`AtomError::Integer`] when the text is not an integer.
    fn get_integer(&self, ns: &Namespace, local: &str) -> Result<Option<i64>> {
        self.get_text(ns, local)
            .map(|text| parse_integer(&text))
            .transpose()
    }

    fn set_integer(&self, ns: &Namespace, local: &str, value: i64) {
        self.set(ns, local, value.to_string());
    }

    /// The element serialized as a standalone document.
    fn to_xml_string(&self) -> Result<String> {
        self.element().to_xml_string()
    }
}

// ============================================================================
// RootElement
// ============================================================================

/// Elements that can be the root of a document.
pub trait RootElement: AtomElement {
    /// Parses a document whose root is this element.
    fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_config(bytes, &Config::default())
    }

    fn parse_with_config(bytes: &[u8], config: &Config) -> Result<Self> {
        let root = xml::parse(bytes, config)?;
        Self::from_element(root)
    }

    /// Reads and parses a document from the filesystem.
    fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = FileSource::default().read(path)?;
        Self::parse(&bytes)
    }

    /// Reads and parses a document through `source`.
    fn from_source<S>(source: &S, location: &str) -> Result<Self>
    where
        S: ByteSource + ?Sized,
    {
        let bytes = source.open(location)?;
        Self::parse(&bytes)
    }

    /// The serialized document, as UTF-8 bytes.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_xml_string().map(String::into_bytes)
    }
}

// ============================================================================
// Document dispatch
// ============================================================================

/// Any Atom or AtomPub document.
#[derive(Debug, Clone)]
pub enum Document {
    Feed(Feed),
    Entry(Entry),
    Service(Service),
    Categories(Categories),
}

impl Document {
    /// Parses `bytes`, choosing the type from the root element.
    ///
    /// # Errors
    ///
    /// [`AtomError::UnexpectedElement`] when the root is not an Atom `feed`
    /// or `entry` or an AtomPub `service` or `categories`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_config(bytes, &Config::default())
    }

    pub fn parse_with_config(bytes: &[u8], config: &Config) -> Result<Self> {
        let root = xml::parse(bytes, config)?;
        let is_atom = in_namespace(&root, &Namespace::ATOM);
        let is_app = in_namespace(&root, &Namespace::APP);

        let document = match root.local_name().as_str() {
            "feed" if is_atom => Document::Feed(Feed::from_element_unchecked(root)),
            "entry" if is_atom => Document::Entry(Entry::from_element_unchecked(root)),
            "service" if is_app => Document::Service(Service::from_element_unchecked(root)),
            "categories" if is_app => {
                Document::Categories(Categories::from_element_unchecked(root))
            }
            _ => {
                return Err(AtomError::UnexpectedElement {
                    expected: "feed, entry, service or categories".to_string(),
                    found: root.qualified_name(),
                })
            }
        };
        tracing::debug!(kind = document.kind(), "Parsed document");
        Ok(document)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Document::Feed(_) => "feed",
            Document::Entry(_) => "entry",
            Document::Service(_) => "service",
            Document::Categories(_) => "categories",
        }
    }

    pub fn element(&self) -> &XmlElement {
        match self {
            Document::Feed(f) => f.element(),
            Document::Entry(e) => e.element(),
            Document::Service(s) => s.element(),
            Document::Categories(c) => c.element(),
        }
    }

    pub fn to_xml_string(&self) -> Result<String> {
        self.element().to_xml_string()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_xml_string().map(String::into_bytes)
    }
}

impl FromStr for Document {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self> {
        Document::parse(s.as_bytes())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whether `element` is in `ns`, treating the Atom 0.3 and pre-RFC AtomPub
/// namespaces as their successors.
pub(crate) fn in_namespace(element: &XmlElement, ns: &Namespace) -> bool {
    let uri = element.namespace_uri().unwrap_or_default();
    if uri == ns.uri() {
        return true;
    }
    match ns.uri() {
        u if u == Namespace::ATOM.uri() => uri == Namespace::OBSOLETE_ATOM.uri(),
        u if u == Namespace::APP.uri() => uri == Namespace::OBSOLETE_APP.uri(),
        _ => false,
    }
}

pub(crate) fn parse_datetime(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).map_err(|e| AtomError::timestamp(text, e))
}

pub(crate) fn format_datetime<Tz>(value: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_integer(text: &str) -> Result<i64> {
    let text = text.trim();
    text.parse::<i64>().map_err(|e| AtomError::integer(text, e))
}

pub(crate) fn unknown_option<T: AtomElement>(key: &str) -> AtomError {
    AtomError::Validation(format!("unknown option '{}' for <{}>", key, T::NAME))
}

/// `FromStr` for document types: parses with the default configuration.
macro_rules! impl_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = AtomError;

                fn from_str(s: &str) -> Result<Self> {
                    <$ty as RootElement>::parse(s.as_bytes())
                }
            }
        )*
    };
}

impl_from_str!(Feed, Entry, Service, Categories);
