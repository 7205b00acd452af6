//! Integration tests for AtomPub service documents and the publishing rules
//! derived from them.

use std::cell::Cell;

use atomutil::{
    AtomElement, AtomError, Categories, Category, CategoriesResolver, Document, RootElement,
    Service, ServiceStore,
};
use pretty_assertions::assert_eq;

fn service() -> Service {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Service::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service.xml")).unwrap()
}

fn category(scheme: &str, term: &str) -> Category {
    Category::with_options([("scheme", scheme), ("term", term)]).unwrap()
}

const MAIN_CATS: &str = r#"<app:categories xmlns:app="http://www.w3.org/2007/app" xmlns="http://www.w3.org/2005/Atom" fixed="yes" scheme="http://example.com/cats/big3">
  <category term="animal"/>
  <category term="vegetable"/>
  <category term="mineral"/>
</app:categories>"#;

#[test]
fn test_service_structure() {
    let service = service();
    let titles: Vec<_> = service
        .workspaces()
        .iter()
        .filter_map(|w| w.title())
        .collect();
    assert_eq!(titles, vec!["Main Site", "Sidebar Blog"]);
    assert_eq!(service.collections().len(), 4);

    let document = Document::parse(&service.to_bytes().unwrap()).unwrap();
    assert_eq!(document.kind(), "service");
}

#[test]
fn test_register_without_resolver() {
    let service = service();
    let mut store = ServiceStore::new();
    assert_eq!(service.register_collections(&mut store, None), 3);
    assert_eq!(store.len(), 3);

    // No accept elements: entries only; referenced categories skipped
    let main = store.get("http://example.org/blog/main").unwrap();
    assert!(main.accepts_media_type("application/atom+xml;type=entry"));
    assert!(!main.accepts_media_type("image/png"));
    assert!(main.allows_category(&category("http://example.org/any", "anything")));

    let pictures = store.get("http://example.org/blog/pic").unwrap();
    assert!(pictures.accepts_media_type("image/png"));
    assert!(pictures.accepts_media_type("image/gif"));
    assert!(!pictures.accepts_media_type("application/atom+xml;type=entry"));

    let sidebar = store.get("http://example.org/sidebar/list").unwrap();
    assert!(sidebar.allows_category(&category("http://example.org/extra-cats/", "joke")));
    assert!(!sidebar.allows_category(&category("http://example.org/extra-cats/", "silly")));
    assert!(!sidebar.allows_category(&category("http://example.org/other/", "joke")));
}

#[test]
fn test_register_with_resolver() {
    let service = service();
    let calls = Cell::new(0);
    let resolver = |href: &str| -> atomutil::Result<Categories> {
        calls.set(calls.get() + 1);
        assert_eq!(href, "http://example.com/cats/forMain.cats");
        Categories::parse(MAIN_CATS.as_bytes())
    };

    let mut store = ServiceStore::new();
    service.register_collections(&mut store, Some(&resolver as &dyn CategoriesResolver));
    assert_eq!(calls.get(), 1);

    let main = store.get("http://example.org/blog/main").unwrap();
    assert!(main.allows_category(&category("http://example.com/cats/big3", "animal")));
    assert!(!main.allows_category(&category("http://example.com/cats/big3", "fungus")));
}

#[test]
fn test_resolver_failure_leaves_collection_open() {
    let service = service();
    let resolver =
        |_: &str| -> atomutil::Result<Categories> { Err(AtomError::Validation("offline".into())) };

    let mut store = ServiceStore::new();
    service.register_collections(&mut store, Some(&resolver as &dyn CategoriesResolver));
    let main = store.get("http://example.org/blog/main").unwrap();
    assert!(main.allows_category(&category("http://example.org/any", "anything")));
}

#[test]
fn test_store_is_detached_from_document() {
    let service = service();
    let mut store = ServiceStore::new();
    service.register_collections(&mut store, None);

    for collection in service.collections() {
        collection.set_accept("text/plain");
    }

    let pictures = store.get("http://example.org/blog/pic").unwrap();
    assert!(pictures.accepts_media_type("image/png"));
    assert!(!pictures.accepts_media_type("text/plain"));
}
