use super::{unknown_option, AtomElement, Categories, RootElement};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::publish::{CategoriesResolver, ServiceStore};
use crate::xml::XmlElement;

/// An AtomPub service document.
#[derive(Debug, Clone)]
pub struct Service {
    elem: XmlElement,
}

impl AtomElement for Service {
    const NAME: &'static str = "service";
    const NAMESPACE: Namespace = Namespace::APP;

    fn from_element_unchecked(element: XmlElement) -> Self {
        Service { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, _value: &str) -> Result<()> {
        Err(unknown_option::<Self>(key))
    }
}

impl RootElement for Service {}

impl Service {
    pub fn workspace(&self) -> Option<Workspace> {
        self.get_object(&self.namespace(), "workspace")
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.get_objects(&self.namespace(), "workspace")
    }

    pub fn add_workspace(&self, workspace: &Workspace) -> Workspace {
        Workspace::from_element_unchecked(self.add(
            &self.namespace(),
            "workspace",
            workspace.to_child(),
        ))
    }

    pub fn set_workspace(&self, workspace: &Workspace) -> Workspace {
        Workspace::from_element_unchecked(self.set(
            &self.namespace(),
            "workspace",
            workspace.to_child(),
        ))
    }

    /// Every collection of every workspace, in document order.
    pub fn collections(&self) -> Vec<Collection> {
        self.workspaces()
            .iter()
            .flat_map(Workspace::collections)
            .collect()
    }

    /// Registers each collection that has an `href` in `store`; returns how
    /// many were registered.
    pub fn register_collections(
        &self,
        store: &mut ServiceStore,
        resolver: Option<&dyn CategoriesResolver>,
    ) -> usize {
        let mut registered = 0;
        for collection in self.collections() {
            let Some(href) = collection.href() else {
                tracing::debug!(title = ?collection.title(), "Skipping collection without href");
                continue;
            };
            store.put(&href, &collection, resolver);
            registered += 1;
        }
        registered
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// A group of collections, titled with `atom:title`.
#[derive(Debug, Clone)]
pub struct Workspace {
    elem: XmlElement,
}

impl AtomElement for Workspace {
    const NAME: &'static str = "workspace";
    const NAMESPACE: Namespace = Namespace::APP;

    fn from_element_unchecked(element: XmlElement) -> Self {
        Workspace { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "title" => self.set_title(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Workspace {
    pub fn title(&self) -> Option<String> {
        self.get_text(&Namespace::ATOM_WITH_PREFIX, "title")
    }

    pub fn set_title(&self, title: &str) {
        self.set(&Namespace::ATOM_WITH_PREFIX, "title", title);
    }

    pub fn collection(&self) -> Option<Collection> {
        self.get_object(&self.namespace(), "collection")
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.get_objects(&self.namespace(), "collection")
    }

    pub fn add_collection(&self, collection: &Collection) -> Collection {
        Collection::from_element_unchecked(self.add(
            &self.namespace(),
            "collection",
            collection.to_child(),
        ))
    }

    pub fn set_collection(&self, collection: &Collection) -> Collection {
        Collection::from_element_unchecked(self.set(
            &self.namespace(),
            "collection",
            collection.to_child(),
        ))
    }
}

// ============================================================================
// Collection
// ============================================================================

/// A publishable collection: its URI, accepted media types, and category
/// documents.
#[derive(Debug, Clone)]
pub struct Collection {
    elem: XmlElement,
}

impl AtomElement for Collection {
    const NAME: &'static str = "collection";
    const NAMESPACE: Namespace = Namespace::APP;

    fn from_element_unchecked(element: XmlElement) -> Self {
        Collection { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "href" => self.set_href(value),
            "title" => self.set_title(value),
            "accept" => self.set_accept(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Collection {
    pub fn href(&self) -> Option<String> {
        self.attr("href")
    }

    pub fn set_href(&self, href: &str) {
        self.set_attr("href", href);
    }

    pub fn title(&self) -> Option<String> {
        self.get_text(&Namespace::ATOM_WITH_PREFIX, "title")
    }

    pub fn set_title(&self, title: &str) {
        self.set(&Namespace::ATOM_WITH_PREFIX, "title", title);
    }

    // ------------------------------------------------------------------------
    // Accepted media types
    // ------------------------------------------------------------------------

    pub fn accept(&self) -> Option<String> {
        self.child_text("accept")
    }

    /// Text of every `accept` element. An empty `accept` reads as `""`.
    pub fn accepts(&self) -> Vec<String> {
        self.get_all(&self.namespace(), "accept")
            .iter()
            .map(|e| e.text().unwrap_or_default())
            .collect()
    }

    pub fn add_accept(&self, accept: &str) {
        self.add(&self.namespace(), "accept", accept);
    }

    /// Replaces every `accept` element with one holding `accept`.
    pub fn set_accept(&self, accept: &str) {
        self.set_child_text("accept", accept);
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    pub fn categories(&self) -> Option<Categories> {
        self.get_object(&self.namespace(), "categories")
    }

    pub fn categories_list(&self) -> Vec<Categories> {
        self.get_objects(&self.namespace(), "categories")
    }

    pub fn add_categories(&self, categories: &Categories) -> Categories {
        Categories::from_element_unchecked(self.add(
            &self.namespace(),
            "categories",
            categories.to_child(),
        ))
    }

    pub fn set_categories(&self, categories: &Categories) -> Categories {
        Categories::from_element_unchecked(self.set(
            &self.namespace(),
            "categories",
            categories.to_child(),
        ))
    }
}
