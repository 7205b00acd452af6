//! Atom (RFC 4287) and AtomPub (RFC 5023) documents as a mutable,
//! namespace-aware element tree.
//!
//! Parsed documents keep everything they contained, including foreign
//! extension elements, so a feed read and written back out loses nothing.
//! Typed views ([`Feed`], [`Entry`], [`Service`], ...) read and edit that
//! tree in place.
//!
//! ```
//! use atomutil::{AtomElement, CoreElement, Entry, Feed, RootElement};
//!
//! let feed = Feed::with_options([("title", "Example Feed")])?;
//! let entry = Entry::with_options([("id", "urn:uuid:1225c695"), ("content", "Hello")])?;
//! feed.add_entry(&entry);
//!
//! let parsed = Feed::parse(&feed.to_bytes()?)?;
//! assert_eq!(parsed.entries()[0].content().and_then(|c| c.body()).as_deref(), Some("Hello"));
//! # Ok::<(), atomutil::AtomError>(())
//! ```
//!
//! Values are single-threaded: element handles share nodes through `Rc`.

pub mod config;
pub mod error;
pub mod media_type;
pub mod model;
pub mod namespace;
pub mod publish;
pub mod source;
pub mod util;
pub mod xml;

pub use config::Config;
pub use error::{AtomError, Result};
pub use media_type::MediaType;
pub use model::{
    AtomElement, Author, Categories, Category, Collection, Content, Contributor, Control,
    CoreElement, Document, Entry, Feed, Generator, Link, LinkLike, Person, PersonConstruct,
    Relation, RepliesLink, ReplyTarget, RootElement, Service, TypedLink, Workspace,
};
pub use namespace::Namespace;
pub use publish::{CategoriesResolver, ServiceInfo, ServiceStore};
pub use source::{ByteSource, FileSource};
pub use xml::{ChildValue, XmlElement};
