use super::{parse_integer, unknown_option, AtomElement, CoreElement, Entry, RootElement};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::xml::XmlElement;

/// An Atom `feed` document.
#[derive(Debug, Clone)]
pub struct Feed {
    elem: XmlElement,
}

impl AtomElement for Feed {
    const NAME: &'static str = "feed";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Feed { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        if self.set_core_option(key, value)? {
            return Ok(());
        }
        match key {
            "icon" => self.set_icon(value),
            "logo" => self.set_logo(value),
            "subtitle" => self.set_subtitle(value),
            "total_results" => self.set_total_results(parse_integer(value)?),
            "start_index" => self.set_start_index(parse_integer(value)?),
            "items_per_page" => self.set_items_per_page(parse_integer(value)?),
            "generator" => {
                self.set_generator_name(value);
            }
            "language" => self.set_language(value),
            "version" => self.set_version(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl RootElement for Feed {}

impl CoreElement for Feed {}

impl Feed {
    pub fn icon(&self) -> Option<String> {
        self.child_text("icon")
    }

    pub fn set_icon(&self, icon: &str) {
        self.set_child_text("icon", icon);
    }

    pub fn logo(&self) -> Option<String> {
        self.child_text("logo")
    }

    pub fn set_logo(&self, logo: &str) {
        self.set_child_text("logo", logo);
    }

    pub fn subtitle(&self) -> Option<String> {
        self.child_text("subtitle")
    }

    pub fn set_subtitle(&self, subtitle: &str) {
        self.set_child_text("subtitle", subtitle);
    }

    // ------------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------------

    pub fn entry(&self) -> Option<Entry> {
        self.get_object(&self.namespace(), "entry")
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.get_objects(&self.namespace(), "entry")
    }

    /// Appends a copy of `entry`.
    pub fn add_entry(&self, entry: &Entry) -> Entry {
        Entry::from_element_unchecked(self.add(&self.namespace(), "entry", entry.to_child()))
    }

    /// Replaces every entry with a copy of `entry`.
    pub fn set_entry(&self, entry: &Entry) -> Entry {
        Entry::from_element_unchecked(self.set(&self.namespace(), "entry", entry.to_child()))
    }

    // ------------------------------------------------------------------------
    // OpenSearch
    // ------------------------------------------------------------------------

    pub fn total_results(&self) -> Result<Option<i64>> {
        self.get_integer(&Namespace::OPEN_SEARCH, "totalResults")
    }

    pub fn set_total_results(&self, total: i64) {
        self.set_integer(&Namespace::OPEN_SEARCH, "totalResults", total);
    }

    pub fn start_index(&self) -> Result<Option<i64>> {
        self.get_integer(&Namespace::OPEN_SEARCH, "startIndex")
    }

    pub fn set_start_index(&self, index: i64) {
        self.set_integer(&Namespace::OPEN_SEARCH, "startIndex", index);
    }

    pub fn items_per_page(&self) -> Result<Option<i64>> {
        self.get_integer(&Namespace::OPEN_SEARCH, "itemsPerPage")
    }

    pub fn set_items_per_page(&self, count: i64) {
        self.set_integer(&Namespace::OPEN_SEARCH, "itemsPerPage", count);
    }

    // ------------------------------------------------------------------------
    // Generator and attributes
    // ------------------------------------------------------------------------

    pub fn generator(&self) -> Option<Generator> {
        self.get_object(&self.namespace(), "generator")
    }

    pub fn set_generator(&self, generator: &Generator) -> Generator {
        Generator::from_element_unchecked(self.set(
            &self.namespace(),
            "generator",
            generator.to_child(),
        ))
    }

    /// Sets a generator named `name`.
    pub fn set_generator_name(&self, name: &str) -> Generator {
        let generator = Generator::new();
        generator.set_name(name);
        self.set_generator(&generator)
    }

    /// `xml:lang`.
    pub fn language(&self) -> Option<String> {
        self.elem.attr_ns(&Namespace::XML, "lang")
    }

    pub fn set_language(&self, lang: &str) {
        self.elem.set_attr("xml:lang", lang);
    }

    /// The `version` attribute of Atom 0.3 feeds.
    pub fn version(&self) -> Option<String> {
        self.attr("version")
    }

    pub fn set_version(&self, version: &str) {
        self.set_attr("version", version);
    }
}

// ============================================================================
// Generator
// ============================================================================

/// The agent that produced a feed. Its name is the element text.
#[derive(Debug, Clone)]
pub struct Generator {
    elem: XmlElement,
}

impl AtomElement for Generator {
    const NAME: &'static str = "generator";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Generator { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => self.set_name(value),
            "uri" => self.set_uri(value),
            "version" => self.set_version(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Generator {
    pub fn name(&self) -> Option<String> {
        self.elem.text()
    }

    pub fn set_name(&self, name: &str) {
        self.elem.set_text(name);
    }

    pub fn uri(&self) -> Option<String> {
        self.attr("uri")
    }

    pub fn set_uri(&self, uri: &str) {
        self.set_attr("uri", uri);
    }

    pub fn version(&self) -> Option<String> {
        self.attr("version")
    }

    pub fn set_version(&self, version: &str) {
        self.set_attr("version", version);
    }
}
