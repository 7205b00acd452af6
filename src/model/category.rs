use super::{unknown_option, AtomElement, RootElement};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::xml::XmlElement;

/// An Atom `category`.
#[derive(Debug, Clone)]
pub struct Category {
    elem: XmlElement,
}

impl AtomElement for Category {
    const NAME: &'static str = "category";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Category { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "term" => self.set_term(value),
            "scheme" => self.set_scheme(value),
            "label" => self.set_label(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Category {
    pub fn term(&self) -> Option<String> {
        self.attr("term")
    }

    pub fn set_term(&self, term: &str) {
        self.set_attr("term", term);
    }

    pub fn scheme(&self) -> Option<String> {
        self.attr("scheme")
    }

    pub fn set_scheme(&self, scheme: &str) {
        self.set_attr("scheme", scheme);
    }

    pub fn label(&self) -> Option<String> {
        self.attr("label")
    }

    pub fn set_label(&self, label: &str) {
        self.set_attr("label", label);
    }
}

/// An AtomPub `categories` document: inline `atom:category` children, or an
/// `href` to an external categories document.
#[derive(Debug, Clone)]
pub struct Categories {
    elem: XmlElement,
}

impl AtomElement for Categories {
    const NAME: &'static str = "categories";
    const NAMESPACE: Namespace = Namespace::APP;

    fn from_element_unchecked(element: XmlElement) -> Self {
        Categories { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "href" => self.set_href(value),
            "scheme" => self.set_scheme(value),
            "fixed" => self.set_fixed(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl RootElement for Categories {}

impl Categories {
    pub fn href(&self) -> Option<String> {
        self.attr("href")
    }

    pub fn set_href(&self, href: &str) {
        self.set_attr("href", href);
    }

    /// Default scheme for categories that carry none.
    pub fn scheme(&self) -> Option<String> {
        self.attr("scheme")
    }

    pub fn set_scheme(&self, scheme: &str) {
        self.set_attr("scheme", scheme);
    }

    pub fn fixed(&self) -> Option<String> {
        self.attr("fixed")
    }

    pub fn set_fixed(&self, fixed: &str) {
        self.set_attr("fixed", fixed);
    }

    /// Whether the list is closed (`fixed="yes"`).
    pub fn is_fixed(&self) -> bool {
        self.fixed().as_deref() == Some("yes")
    }

    pub fn category(&self) -> Option<Category> {
        self.get_object(&Namespace::ATOM_WITH_PREFIX, "category")
    }

    pub fn categories(&self) -> Vec<Category> {
        self.get_objects(&Namespace::ATOM_WITH_PREFIX, "category")
    }

    pub fn add_category(&self, category: &Category) -> Category {
        Category::from_element_unchecked(self.add(
            &Namespace::ATOM_WITH_PREFIX,
            "category",
            category.to_child(),
        ))
    }

    /// Replaces all categories with `category`.
    pub fn set_category(&self, category: &Category) -> Category {
        Category::from_element_unchecked(self.set(
            &Namespace::ATOM_WITH_PREFIX,
            "category",
            category.to_child(),
        ))
    }

    /// Replaces all categories with `categories`.
    pub fn set_categories(&self, categories: &[Category]) {
        self.remove(&Namespace::ATOM_WITH_PREFIX, "category");
        for category in categories {
            self.add_category(category);
        }
    }
}
