//! Namespace-aware XML tree that every Atom element type is a view over.
//!
//! # Architecture
//!
//! - [`XmlElement`] is a cheap, clonable handle to one element node. Clones
//!   share the node: a typed wrapper obtained from an accessor (an entry's
//!   author, a feed's entries) mutates the same tree as its parent.
//! - [`parser`] builds the tree from bytes with `quick-xml`, resolving every
//!   element and attribute prefix to its namespace URI.
//! - [`writer`] walks the tree back to text, emitting `xmlns` declarations
//!   only where the in-scope bindings do not already cover a node.
//!
//! Handles are `!Send`: a document belongs to one thread. Concurrent writers
//! to the same tree are not supported.

mod parser;
mod writer;

use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

use crate::config::Config;
use crate::error::Result;
use crate::namespace::Namespace;

pub use parser::parse;

/// A node in the tree.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An attribute, with its prefix resolved to a namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
    pub value: String,
}

impl Attribute {
    /// The name as written, e.g. `thr:count` or `href`.
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.local)
    }
}

/// The value a new child element is built from.
#[derive(Debug, Clone)]
pub enum ChildValue {
    /// Becomes the child's text content.
    Text(String),
    /// The children and attributes of this node are copied into the child;
    /// the node's own name is discarded.
    Element(XmlElement),
    /// Deep-copied as the single element inside the child.
    Raw(XmlElement),
    Empty,
}

impl From<&str> for ChildValue {
    fn from(value: &str) -> Self {
        ChildValue::Text(value.to_string())
    }
}

impl From<String> for ChildValue {
    fn from(value: String) -> Self {
        ChildValue::Text(value)
    }
}

impl From<&String> for ChildValue {
    fn from(value: &String) -> Self {
        ChildValue::Text(value.clone())
    }
}

impl From<XmlElement> for ChildValue {
    fn from(value: XmlElement) -> Self {
        ChildValue::Raw(value)
    }
}

#[derive(Debug)]
struct ElementData {
    prefix: Option<String>,
    local: String,
    namespace: Option<String>,
    /// `xmlns` declarations written on this element in the source document.
    declarations: Vec<(Option<String>, String)>,
    attributes: Vec<Attribute>,
    children: Vec<XmlNode>,
    /// Stamp of the last edit to this node, from [`next_revision`].
    revision: u64,
}

thread_local! {
    static REVISION: Cell<u64> = const { Cell::new(0) };
}

/// A stamp greater than every stamp handed out before on this thread.
fn next_revision() -> u64 {
    REVISION.with(|r| {
        let next = r.get() + 1;
        r.set(next);
        next
    })
}

/// Shared handle to an element node.
#[derive(Debug, Clone)]
pub struct XmlElement(Rc<RefCell<ElementData>>);

impl XmlElement {
    /// Creates an empty element in `ns`, using the namespace's prefix.
    pub fn new(ns: &Namespace, local: &str) -> Self {
        let uri = (!ns.uri().is_empty()).then(|| ns.uri().to_string());
        Self::from_data(ElementData {
            prefix: ns.prefix().map(str::to_string),
            local: local.to_string(),
            namespace: uri,
            declarations: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            revision: 0,
        })
    }

    /// Parses a document and returns its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse(bytes, &Config::default())
    }

    fn from_data(mut data: ElementData) -> Self {
        data.revision = next_revision();
        XmlElement(Rc::new(RefCell::new(data)))
    }

    /// Mutable access that records an edit.
    fn data_mut(&self) -> RefMut<'_, ElementData> {
        let mut data = self.0.borrow_mut();
        data.revision = next_revision();
        data
    }

    /// Changes whenever this element or anything below it is edited.
    pub fn revision(&self) -> u64 {
        let data = self.0.borrow();
        data.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Element(e) => Some(e.revision()),
                _ => None,
            })
            .fold(data.revision, u64::max)
    }

    /// Whether both handles point at the same node.
    pub fn same_node(&self, other: &XmlElement) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn local_name(&self) -> String {
        self.0.borrow().local.clone()
    }

    pub fn prefix(&self) -> Option<String> {
        self.0.borrow().prefix.clone()
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.0.borrow().namespace.clone()
    }

    /// The element's namespace, carrying the prefix it is written with.
    pub fn namespace(&self) -> Namespace {
        let data = self.0.borrow();
        Namespace::from_parts(data.namespace.as_deref(), data.prefix.as_deref())
    }

    pub fn qualified_name(&self) -> String {
        let data = self.0.borrow();
        qualify(data.prefix.as_deref(), &data.local)
    }

    /// Whether this element is `local` in namespace `ns`.
    pub fn is(&self, ns: &Namespace, local: &str) -> bool {
        let data = self.0.borrow();
        data.local == local && data.namespace.as_deref().unwrap_or("") == ns.uri()
    }

    /// Records an `xmlns` declaration on this element.
    pub fn declare_namespace(&self, ns: &Namespace) {
        let binding = (ns.prefix().map(str::to_string), ns.uri().to_string());
        let mut data = self.data_mut();
        if !data.declarations.contains(&binding) {
            data.declarations.push(binding);
        }
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Concatenated text and CDATA children, or `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let data = self.0.borrow();
        let mut text: Option<String> = None;
        for child in &data.children {
            if let XmlNode::Text(t) | XmlNode::CData(t) = child {
                text.get_or_insert_with(String::new).push_str(t);
            }
        }
        text
    }

    /// Replaces all text children with `value`, keeping element children.
    pub fn set_text(&self, value: &str) {
        let mut data = self.data_mut();
        data.children
            .retain(|c| !matches!(c, XmlNode::Text(_) | XmlNode::CData(_)));
        data.children.push(XmlNode::Text(value.to_string()));
    }

    pub fn append_text(&self, value: &str) {
        self.data_mut()
            .children
            .push(XmlNode::Text(value.to_string()));
    }

    // ========================================================================
    // Children
    // ========================================================================

    pub fn children(&self) -> Vec<XmlNode> {
        self.0.borrow().children.clone()
    }

    pub fn child_elements(&self) -> Vec<XmlElement> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Element(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_element_children(&self) -> bool {
        self.0
            .borrow()
            .children
            .iter()
            .any(|c| matches!(c, XmlNode::Element(_)))
    }

    /// Direct children named `local` in `ns`, in document order.
    pub fn find_children(&self, ns: &Namespace, local: &str) -> Vec<XmlElement> {
        self.child_elements()
            .into_iter()
            .filter(|e| e.is(ns, local))
            .collect()
    }

    /// Like [`find_children`](Self::find_children), additionally requiring
    /// every `(name, value)` attribute pair to match.
    pub fn find_children_by_attr(
        &self,
        ns: &Namespace,
        local: &str,
        attrs: &[(&str, &str)],
    ) -> Vec<XmlElement> {
        self.find_children(ns, local)
            .into_iter()
            .filter(|e| {
                attrs
                    .iter()
                    .all(|(name, value)| e.attr(name).as_deref() == Some(*value))
            })
            .collect()
    }

    pub fn find_child(&self, ns: &Namespace, local: &str) -> Option<XmlElement> {
        self.find_children(ns, local).into_iter().next()
    }

    /// Removes direct children matching `predicate`; returns how many went.
    pub fn remove_children_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let mut data = self.data_mut();
        let before = data.children.len();
        data.children.retain(|c| match c {
            XmlNode::Element(e) => !predicate(e),
            _ => true,
        });
        before - data.children.len()
    }

    pub fn remove_children(&self, ns: &Namespace, local: &str) -> usize {
        self.remove_children_where(|e| e.is(ns, local))
    }

    pub fn clear_children(&self) {
        self.data_mut().children.clear();
    }

    /// Appends `child` itself (not a copy) as the last child.
    pub(crate) fn append_child(&self, child: XmlElement) {
        self.data_mut().children.push(XmlNode::Element(child));
    }

    /// Removes every `local` child in `ns`, then appends one built from `value`.
    pub fn set_child(
        &self,
        ns: &Namespace,
        local: &str,
        value: ChildValue,
        attrs: &[(&str, &str)],
    ) -> XmlElement {
        self.remove_children(ns, local);
        self.add_child(ns, local, value, attrs)
    }

    /// Appends a new `local` child in `ns` built from `value`, keeping any
    /// existing children of the same name.
    pub fn add_child(
        &self,
        ns: &Namespace,
        local: &str,
        value: ChildValue,
        attrs: &[(&str, &str)],
    ) -> XmlElement {
        // Build the child completely before borrowing `self` mutably; `value`
        // may be a handle to `self`.
        let child = XmlElement::new(ns, local);
        match value {
            ChildValue::Text(text) => child.append_text(&text),
            ChildValue::Element(source) => {
                let copy = source.deep_copy();
                let copied = copy.0.borrow();
                let mut data = child.data_mut();
                data.attributes = copied.attributes.clone();
                data.children = copied.children.clone();
            }
            ChildValue::Raw(source) => child.append_child(source.deep_copy()),
            ChildValue::Empty => {}
        }
        for (name, value) in attrs {
            child.set_attr(name, value);
        }
        self.append_child(child.clone());
        child
    }

    /// A detached copy of this subtree.
    pub fn deep_copy(&self) -> XmlElement {
        let data = self.0.borrow();
        let children = data
            .children
            .iter()
            .map(|c| match c {
                XmlNode::Element(e) => XmlNode::Element(e.deep_copy()),
                other => other.clone(),
            })
            .collect();
        XmlElement::from_data(ElementData {
            prefix: data.prefix.clone(),
            local: data.local.clone(),
            namespace: data.namespace.clone(),
            declarations: data.declarations.clone(),
            attributes: data.attributes.clone(),
            children,
            revision: 0,
        })
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn attributes(&self) -> Vec<Attribute> {
        self.0.borrow().attributes.clone()
    }

    /// Attribute value by its written name (`href`, `xml:lang`, `rdf:resource`).
    pub fn attr(&self, name: &str) -> Option<String> {
        let (prefix, local) = split_qname(name);
        self.0
            .borrow()
            .attributes
            .iter()
            .find(|a| a.local == local && a.prefix.as_deref() == prefix)
            .map(|a| a.value.clone())
    }

    /// Sets an attribute by its written name. A prefix is resolved against
    /// the element's own prefix and declarations, then the well-known Atom
    /// prefixes ([`Namespace::well_known`]). A prefix bound nowhere must be
    /// in scope from an ancestor when the tree is serialized.
    pub fn set_attr(&self, name: &str, value: &str) {
        let (prefix, local) = split_qname(name);
        let namespace = prefix.and_then(|p| {
            self.lookup_prefix(p)
                .or_else(|| Namespace::well_known(p).map(|ns| ns.uri().to_string()))
        });
        self.put_attribute(Attribute {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace,
            value: value.to_string(),
        });
    }

    pub fn remove_attr(&self, name: &str) {
        let (prefix, local) = split_qname(name);
        self.data_mut()
            .attributes
            .retain(|a| !(a.local == local && a.prefix.as_deref() == prefix));
    }

    /// Attribute value by namespace and local name, whatever its prefix.
    pub fn attr_ns(&self, ns: &Namespace, local: &str) -> Option<String> {
        self.0
            .borrow()
            .attributes
            .iter()
            .find(|a| a.local == local && a.namespace.as_deref() == Some(ns.uri()))
            .map(|a| a.value.clone())
    }

    /// Sets a namespaced attribute, written with the namespace's prefix.
    /// A namespace without one reuses a prefix already bound to its URI on
    /// this element, or gets a fresh `ns0`, `ns1`, ...
    pub fn set_attr_ns(&self, ns: &Namespace, local: &str, value: &str) {
        {
            let mut data = self.data_mut();
            data.attributes
                .retain(|a| !(a.local == local && a.namespace.as_deref() == Some(ns.uri())));
        }
        let prefix = match ns.prefix() {
            Some(p) => p.to_string(),
            None => self.prefix_for_uri(ns.uri()),
        };
        self.put_attribute(Attribute {
            prefix: Some(prefix),
            local: local.to_string(),
            namespace: Some(ns.uri().to_string()),
            value: value.to_string(),
        });
    }

    fn put_attribute(&self, attribute: Attribute) {
        let mut data = self.data_mut();
        match data
            .attributes
            .iter_mut()
            .find(|a| a.local == attribute.local && a.prefix == attribute.prefix)
        {
            Some(existing) => *existing = attribute,
            None => data.attributes.push(attribute),
        }
    }

    /// A prefix bound to `uri` on this element, or the first unused
    /// generated one.
    fn prefix_for_uri(&self, uri: &str) -> String {
        let data = self.0.borrow();
        let bound = data
            .attributes
            .iter()
            .filter(|a| a.namespace.as_deref() == Some(uri))
            .filter_map(|a| a.prefix.clone())
            .chain(
                data.declarations
                    .iter()
                    .filter(|(_, u)| u == uri)
                    .filter_map(|(p, _)| p.clone()),
            )
            .next();
        if let Some(prefix) = bound {
            return prefix;
        }

        let in_use = |candidate: &str| {
            data.prefix.as_deref() == Some(candidate)
                || data.attributes.iter().any(|a| a.prefix.as_deref() == Some(candidate))
                || data.declarations.iter().any(|(p, _)| p.as_deref() == Some(candidate))
        };
        (0..)
            .map(|n| format!("ns{}", n))
            .find(|candidate| !in_use(candidate))
            .unwrap_or_default()
    }

    fn lookup_prefix(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(Namespace::XML.uri().to_string());
        }
        let data = self.0.borrow();
        if data.prefix.as_deref() == Some(prefix) {
            return data.namespace.clone();
        }
        data.declarations
            .iter()
            .find(|(p, _)| p.as_deref() == Some(prefix))
            .map(|(_, uri)| uri.clone())
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// The element as a UTF-8 XML document with an XML declaration.
    pub fn to_xml_string(&self) -> Result<String> {
        writer::write_document(self)
    }

    /// The serialized children of this element, written as if they were
    /// still inside it (no declarations for bindings this element provides).
    pub fn inner_xml(&self) -> Result<String> {
        writer::write_children(self)
    }
}

pub(crate) fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}

pub(crate) fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
