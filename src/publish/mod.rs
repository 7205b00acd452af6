//! Publishing metadata derived from AtomPub service documents.
//!
//! # Architecture
//!
//! - [`ServiceInfo`] answers the two questions asked before publishing to a
//!   collection: is this category allowed, and is this media type accepted.
//!   Both answers are derived from the collection on first use and memoized.
//! - [`ServiceStore`] maps collection URIs to their `ServiceInfo`. It is an
//!   ordinary value owned by whoever drives publishing (a client session),
//!   not a global; entries live as long as the store.
//! - [`CategoriesResolver`] fetches out-of-line categories documents
//!   (`<categories href="..."/>`) while a collection is being stored.

mod service_info;

pub use service_info::{CategoriesResolver, ServiceInfo, ServiceStore};
