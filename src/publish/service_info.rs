use std::cell::OnceCell;
use std::collections::HashMap;

use crate::error::Result;
use crate::media_type::MediaType;
use crate::model::{AtomElement, Categories, Category, Collection};
use crate::util::resolve_href;

/// Fetches an out-of-line categories document.
pub trait CategoriesResolver {
    fn resolve(&self, href: &str) -> Result<Categories>;
}

impl<F> CategoriesResolver for F
where
    F: Fn(&str) -> Result<Categories>,
{
    fn resolve(&self, href: &str) -> Result<Categories> {
        self(href)
    }
}

// ============================================================================
// ServiceInfo
// ============================================================================

/// `(term, scheme)` pairs a fixed category list allows.
type AllowedCategories = Vec<(String, Option<String>)>;

/// Publishing rules of one collection.
#[derive(Debug)]
pub struct ServiceInfo {
    collection: Collection,
    /// `None` when any category is allowed.
    allowed_categories: OnceCell<Option<AllowedCategories>>,
    accepted_types: OnceCell<Vec<MediaType>>,
}

impl ServiceInfo {
    pub fn new(collection: Collection) -> Self {
        ServiceInfo {
            collection,
            allowed_categories: OnceCell::new(),
            accepted_types: OnceCell::new(),
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Whether an entry may carry `category`.
    ///
    /// Without a fixed category list, anything goes. Otherwise the category
    /// must match the term of some listed category, and its scheme when the
    /// listed one has a scheme (its own, or its list's default).
    pub fn allows_category(&self, category: &Category) -> bool {
        let allowed = self
            .allowed_categories
            .get_or_init(|| derive_allowed_categories(&self.collection));
        let Some(allowed) = allowed else {
            return true;
        };

        let term = category.term();
        let scheme = category.scheme();
        allowed.iter().any(|(allowed_term, allowed_scheme)| {
            term.as_deref() == Some(allowed_term.as_str())
                && allowed_scheme
                    .as_deref()
                    .map_or(true, |s| scheme.as_deref() == Some(s))
        })
    }

    /// Whether the collection accepts a member of `content_type`.
    ///
    /// A collection without `accept` elements accepts Atom entries only. An
    /// unparseable `content_type` is never accepted.
    pub fn accepts_media_type(&self, content_type: &str) -> bool {
        let accepted = self
            .accepted_types
            .get_or_init(|| derive_accepted_types(&self.collection));
        match MediaType::parse(content_type) {
            Ok(candidate) => accepted.iter().any(|pattern| candidate.matches(pattern)),
            Err(e) => {
                tracing::debug!(content_type = %content_type, error = %e, "Rejecting media type");
                false
            }
        }
    }
}

fn derive_allowed_categories(collection: &Collection) -> Option<AllowedCategories> {
    let fixed: Vec<Categories> = collection
        .categories_list()
        .into_iter()
        .filter(Categories::is_fixed)
        .collect();
    if fixed.is_empty() {
        return None;
    }

    let mut allowed = Vec::new();
    for list in &fixed {
        let default_scheme = list.scheme();
        for category in list.categories() {
            let Some(term) = category.term() else {
                continue;
            };
            allowed.push((term, category.scheme().or_else(|| default_scheme.clone())));
        }
    }
    Some(allowed)
}

fn derive_accepted_types(collection: &Collection) -> Vec<MediaType> {
    let accepts = collection.accepts();
    if accepts.is_empty() {
        return vec![MediaType::ENTRY];
    }

    accepts
        .iter()
        .flat_map(|value| split_accept(value))
        .filter_map(|range| match MediaType::parse(&range) {
            Ok(media_type) => Some(media_type),
            Err(e) => {
                tracing::warn!(accept = %range, error = %e, "Ignoring unparseable accept value");
                None
            }
        })
        .collect()
}

/// Splits an `accept` value on whitespace and commas, keeping parameters
/// written after a space (`application/atom+xml; type=entry`) with their
/// media range.
fn split_accept(value: &str) -> Vec<String> {
    let mut ranges: Vec<String> = Vec::new();
    let tokens = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());
    for token in tokens {
        let is_parameter = !token.contains('/') && (token.starts_with(';') || token.contains('='));
        match ranges.last_mut() {
            Some(last) if is_parameter => {
                if !last.ends_with(';') && !token.starts_with(';') {
                    last.push(';');
                }
                last.push_str(token);
            }
            _ => ranges.push(token.to_string()),
        }
    }
    ranges
}

// ============================================================================
// ServiceStore
// ============================================================================

/// Publishing rules keyed by collection URI.
#[derive(Debug, Default)]
pub struct ServiceStore {
    entries: HashMap<String, ServiceInfo>,
}

impl ServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> Option<&ServiceInfo> {
        self.entries.get(uri)
    }

    /// Stores the rules of `collection` under `uri`, replacing any earlier
    /// entry.
    ///
    /// The collection is copied, so later edits to the service document do
    /// not leak into the store. Inline categories are copied as they are;
    /// `href` categories are fetched through `resolver`, relative hrefs being
    /// resolved against the collection's own href. Without a resolver, or
    /// when fetching fails, referenced categories are left out.
    pub fn put(
        &mut self,
        uri: &str,
        collection: &Collection,
        resolver: Option<&dyn CategoriesResolver>,
    ) -> &ServiceInfo {
        let copy = copy_collection(collection, resolver);
        tracing::debug!(
            uri = %uri,
            accepts = copy.accepts().len(),
            categories = copy.categories_list().len(),
            "Stored collection publishing rules"
        );
        self.entries.insert(uri.to_string(), ServiceInfo::new(copy));
        &self.entries[uri]
    }

    pub fn remove(&mut self, uri: &str) -> Option<ServiceInfo> {
        self.entries.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn copy_collection(collection: &Collection, resolver: Option<&dyn CategoriesResolver>) -> Collection {
    let copy = Collection::new();
    if let Some(title) = collection.title() {
        copy.set_title(&title);
    }
    let href = collection.href();
    if let Some(href) = &href {
        copy.set_href(href);
    }
    for accept in collection.accepts() {
        copy.add_accept(&accept);
    }

    for categories in collection.categories_list() {
        let Some(target) = categories.href() else {
            copy.add_categories(&categories);
            continue;
        };
        let target = resolve_href(href.as_deref(), &target);
        let Some(resolver) = resolver else {
            tracing::debug!(href = %target, "No resolver for referenced categories, skipping");
            continue;
        };
        match resolver.resolve(&target) {
            Ok(resolved) => {
                copy.add_categories(&resolved);
            }
            Err(e) => {
                tracing::warn!(href = %target, error = %e, "Failed to resolve categories document");
            }
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtomError;
    use crate::model::RootElement;
    use std::cell::RefCell;

    fn category(term: &str, scheme: Option<&str>) -> Category {
        let category = Category::new();
        category.set_term(term);
        if let Some(scheme) = scheme {
            category.set_scheme(scheme);
        }
        category
    }

    fn fixed_categories(scheme: Option<&str>, terms: &[(&str, Option<&str>)]) -> Categories {
        let cats = Categories::new();
        cats.set_fixed("yes");
        if let Some(scheme) = scheme {
            cats.set_scheme(scheme);
        }
        for (term, scheme) in terms {
            cats.add_category(&category(term, *scheme));
        }
        cats
    }

    #[test]
    fn test_defaults_without_categories_or_accept() {
        let info = ServiceInfo::new(Collection::new());
        assert!(info.allows_category(&category("anything", None)));
        assert!(info.accepts_media_type("application/atom+xml;type=entry"));
        assert!(!info.accepts_media_type("application/atom+xml;type=feed"));
        assert!(!info.accepts_media_type("image/png"));
    }

    #[test]
    fn test_open_categories_allow_anything() {
        let collection = Collection::new();
        let cats = Categories::new();
        cats.add_category(&category("joke", None));
        collection.add_categories(&cats);

        let info = ServiceInfo::new(collection);
        assert!(info.allows_category(&category("serious", None)));
    }

    #[test]
    fn test_fixed_categories_restrict() {
        let collection = Collection::new();
        collection.add_categories(&fixed_categories(
            Some("http://example.org/extra-cats/"),
            &[("joke", None), ("serious", Some("http://example.org/other/"))],
        ));
        let info = ServiceInfo::new(collection);

        assert!(info.allows_category(&category("joke", Some("http://example.org/extra-cats/"))));
        assert!(!info.allows_category(&category("joke", None)));
        assert!(info.allows_category(&category("serious", Some("http://example.org/other/"))));
        assert!(!info.allows_category(&category("serious", Some("http://example.org/extra-cats/"))));
        assert!(!info.allows_category(&category("silly", Some("http://example.org/extra-cats/"))));
    }

    #[test]
    fn test_fixed_category_without_scheme_matches_any_scheme() {
        let collection = Collection::new();
        collection.add_categories(&fixed_categories(None, &[("joke", None)]));
        let info = ServiceInfo::new(collection);
        assert!(info.allows_category(&category("joke", None)));
        assert!(info.allows_category(&category("joke", Some("http://anything/"))));
    }

    #[test]
    fn test_empty_fixed_list_allows_nothing() {
        let collection = Collection::new();
        collection.add_categories(&fixed_categories(None, &[]));
        let info = ServiceInfo::new(collection);
        assert!(!info.allows_category(&category("joke", None)));
    }

    #[test]
    fn test_accept_lists_and_wildcards() {
        let collection = Collection::new();
        collection.add_accept("image/png, image/jpeg");
        collection.add_accept("text/*");
        let info = ServiceInfo::new(collection);

        assert!(info.accepts_media_type("image/png"));
        assert!(info.accepts_media_type("image/jpeg"));
        assert!(info.accepts_media_type("text/html"));
        assert!(!info.accepts_media_type("image/gif"));
        assert!(!info.accepts_media_type("application/atom+xml;type=entry"));
        assert!(!info.accepts_media_type("garbage"));
    }

    #[test]
    fn test_accept_with_spaced_parameters() {
        assert_eq!(
            split_accept("application/atom+xml; type=entry  image/*"),
            vec!["application/atom+xml;type=entry", "image/*"]
        );
    }

    #[test]
    fn test_empty_accept_accepts_nothing() {
        let collection = Collection::new();
        collection.add_accept("");
        let info = ServiceInfo::new(collection);
        assert!(!info.accepts_media_type("application/atom+xml;type=entry"));
    }

    #[test]
    fn test_store_copies_collection() {
        let collection = Collection::with_options([
            ("href", "http://example.org/blog/pic"),
            ("title", "Pictures"),
        ])
        .unwrap();
        collection.add_accept("image/png");
        collection.add_categories(&fixed_categories(None, &[("a", None)]));
        collection.add_categories(&fixed_categories(None, &[("b", None)]));

        let mut store = ServiceStore::new();
        assert!(store.is_empty());
        store.put("http://example.org/blog/pic", &collection, None);

        // Later edits do not reach the stored copy
        collection.set_accept("image/gif");

        let info = store.get("http://example.org/blog/pic").unwrap();
        assert_eq!(info.collection().title().as_deref(), Some("Pictures"));
        assert!(info.accepts_media_type("image/png"));
        assert!(!info.accepts_media_type("image/gif"));
        assert_eq!(info.collection().categories_list().len(), 2);
        assert!(info.allows_category(&category("a", None)));
        assert!(info.allows_category(&category("b", None)));
        assert!(store.get("http://example.org/other").is_none());
    }

    #[test]
    fn test_store_resolves_referenced_categories() {
        let collection = Collection::with_options([("href", "http://example.org/blog/main")]).unwrap();
        let reference = Categories::new();
        reference.set_href("cats/main.cats");
        collection.add_categories(&reference);

        let requested = RefCell::new(Vec::new());
        let resolver = |href: &str| -> Result<Categories> {
            requested.borrow_mut().push(href.to_string());
            Categories::parse(
                br#"<categories xmlns="http://www.w3.org/2007/app" xmlns:atom="http://www.w3.org/2005/Atom" fixed="yes"><atom:category term="joke"/></categories>"#,
            )
        };

        let mut store = ServiceStore::new();
        let info = store.put("http://example.org/blog/main", &collection, Some(&resolver));
        assert!(info.allows_category(&category("joke", None)));
        assert!(!info.allows_category(&category("serious", None)));
        assert_eq!(
            requested.borrow().as_slice(),
            ["http://example.org/blog/cats/main.cats".to_string()]
        );
    }

    #[test]
    fn test_store_skips_unresolvable_categories() {
        let collection = Collection::with_options([("href", "http://example.org/blog/main")]).unwrap();
        let reference = Categories::new();
        reference.set_href("http://example.org/cats");
        collection.add_categories(&reference);

        let failing = |_: &str| -> Result<Categories> {
            Err(AtomError::Validation("unreachable".into()))
        };
        let mut store = ServiceStore::new();
        let info = store.put("a", &collection, Some(&failing));
        assert!(info.collection().categories_list().is_empty());
        assert!(info.allows_category(&category("anything", None)));

        let info = store.put("b", &collection, None);
        assert!(info.collection().categories_list().is_empty());
        assert_eq!(store.len(), 2);
    }
}
