use chrono::{DateTime, FixedOffset, TimeZone};

use super::{format_datetime, parse_datetime, parse_integer, unknown_option, AtomElement};
use crate::error::{AtomError, Result};
use crate::namespace::Namespace;
use crate::xml::XmlElement;

/// Well-known `rel` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Alternate,
    SelfLink,
    Edit,
    EditMedia,
    Related,
    Enclosure,
    Via,
    First,
    Previous,
    Next,
    Last,
    /// Atom Threading (RFC 4685).
    Replies,
}

impl Relation {
    pub const ALL: [Relation; 12] = [
        Relation::Alternate,
        Relation::SelfLink,
        Relation::Edit,
        Relation::EditMedia,
        Relation::Related,
        Relation::Enclosure,
        Relation::Via,
        Relation::First,
        Relation::Previous,
        Relation::Next,
        Relation::Last,
        Relation::Replies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Alternate => "alternate",
            Relation::SelfLink => "self",
            Relation::Edit => "edit",
            Relation::EditMedia => "edit-media",
            Relation::Related => "related",
            Relation::Enclosure => "enclosure",
            Relation::Via => "via",
            Relation::First => "first",
            Relation::Previous => "previous",
            Relation::Next => "next",
            Relation::Last => "last",
            Relation::Replies => "replies",
        }
    }

    /// Whether a link with this `rel` attribute has this relation. A link
    /// without `rel` is an alternate link (RFC 4287 §4.2.7.2).
    pub fn matches(self, rel: Option<&str>) -> bool {
        match rel {
            Some(rel) => rel == self.as_str(),
            None => self == Relation::Alternate,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LinkLike
// ============================================================================

/// Attribute accessors shared by [`Link`] and [`RepliesLink`].
pub trait LinkLike: AtomElement {
    fn set_rel(&self, rel: &str);

    fn href(&self) -> Option<String> {
        self.attr("href")
    }

    fn set_href(&self, href: &str) {
        self.set_attr("href", href);
    }

    fn rel(&self) -> Option<String> {
        self.attr("rel")
    }

    fn type_(&self) -> Option<String> {
        self.attr("type")
    }

    fn set_type(&self, media_type: &str) {
        self.set_attr("type", media_type);
    }

    fn hreflang(&self) -> Option<String> {
        self.attr("hreflang")
    }

    fn set_hreflang(&self, lang: &str) {
        self.set_attr("hreflang", lang);
    }

    fn title(&self) -> Option<String> {
        self.attr("title")
    }

    fn set_title(&self, title: &str) {
        self.set_attr("title", title);
    }

    /// Advisory length of the linked resource, in bytes.
    fn length(&self) -> Result<Option<u64>> {
        self.attr("length")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map_err(|e| AtomError::integer(&v, e))
            })
            .transpose()
    }

    fn set_length(&self, length: u64) {
        self.set_attr("length", &length.to_string());
    }

    /// Handles the option keys common to every link.
    fn set_link_option(&self, key: &str, value: &str) -> Result<bool> {
        match key {
            "href" => self.set_href(value),
            "rel" => self.set_rel(value),
            "type" => self.set_type(value),
            "hreflang" => self.set_hreflang(value),
            "title" => self.set_title(value),
            "length" => {
                let length = parse_integer(value)?;
                let length = u64::try_from(length).map_err(|_| {
                    AtomError::Validation(format!("link length must not be negative: {}", value))
                })?;
                self.set_length(length);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ============================================================================
// Link
// ============================================================================

/// An Atom `link`.
#[derive(Debug, Clone)]
pub struct Link {
    elem: XmlElement,
}

impl AtomElement for Link {
    const NAME: &'static str = "link";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Link { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        if self.set_link_option(key, value)? {
            Ok(())
        } else {
            Err(unknown_option::<Self>(key))
        }
    }
}

impl LinkLike for Link {
    fn set_rel(&self, rel: &str) {
        self.set_attr("rel", rel);
    }
}

impl Link {
    /// A link to `href` with relation `rel`.
    pub fn with_rel(rel: Relation, href: &str) -> Self {
        let link = Link::new();
        link.set_href(href);
        link.set_rel(rel.as_str());
        link
    }

    /// A [`RepliesLink`] view over the same node. Sets `rel="replies"`.
    pub fn to_replies_link(&self) -> RepliesLink {
        RepliesLink::from_element_unchecked(self.elem.clone())
    }
}

// ============================================================================
// RepliesLink
// ============================================================================

/// A `link rel="replies"` carrying Atom Threading `thr:count` and
/// `thr:updated`. Its `rel` is always `replies`.
#[derive(Debug, Clone)]
pub struct RepliesLink {
    elem: XmlElement,
}

impl AtomElement for RepliesLink {
    const NAME: &'static str = "link";

    /// Wraps `element`, forcing `rel="replies"` on it.
    fn from_element_unchecked(element: XmlElement) -> Self {
        element.set_attr("rel", Relation::Replies.as_str());
        RepliesLink { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "count" => self.set_count(parse_integer(value)?),
            "updated" => self.set_updated(&parse_datetime(value)?),
            _ => {
                if !self.set_link_option(key, value)? {
                    return Err(unknown_option::<Self>(key));
                }
            }
        }
        Ok(())
    }
}

impl LinkLike for RepliesLink {
    /// No-op: the relation is fixed.
    fn set_rel(&self, _rel: &str) {}
}

impl RepliesLink {
    /// Number of replies, from `thr:count`.
    pub fn count(&self) -> Result<Option<i64>> {
        self.elem
            .attr_ns(&Namespace::THR, "count")
            .map(|v| parse_integer(&v))
            .transpose()
    }

    pub fn set_count(&self, count: i64) {
        self.elem
            .set_attr_ns(&Namespace::THR, "count", &count.to_string());
    }

    /// When the replies were last updated, from `thr:updated`.
    pub fn updated(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.elem
            .attr_ns(&Namespace::THR, "updated")
            .map(|v| parse_datetime(&v))
            .transpose()
    }

    pub fn set_updated<Tz>(&self, updated: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.elem
            .set_attr_ns(&Namespace::THR, "updated", &format_datetime(updated));
    }

    /// A plain [`Link`] view over the same node.
    pub fn to_link(&self) -> Link {
        Link::from_element_unchecked(self.elem.clone())
    }
}

// ============================================================================
// TypedLink
// ============================================================================

/// A link as enumerated from a feed or entry: `rel="replies"` links come
/// back as [`RepliesLink`] views.
#[derive(Debug, Clone)]
pub enum TypedLink {
    Plain(Link),
    Replies(RepliesLink),
}

impl TypedLink {
    pub(crate) fn from_element(element: XmlElement) -> Self {
        if Relation::Replies.matches(element.attr("rel").as_deref()) {
            TypedLink::Replies(RepliesLink::from_element_unchecked(element))
        } else {
            TypedLink::Plain(Link::from_element_unchecked(element))
        }
    }

    pub fn as_replies(&self) -> Option<&RepliesLink> {
        match self {
            TypedLink::Replies(link) => Some(link),
            TypedLink::Plain(_) => None,
        }
    }

    /// A plain [`Link`] view, whatever the relation.
    pub fn to_link(&self) -> Link {
        match self {
            TypedLink::Plain(link) => link.clone(),
            TypedLink::Replies(link) => link.to_link(),
        }
    }

    pub fn element(&self) -> &XmlElement {
        match self {
            TypedLink::Plain(link) => link.element(),
            TypedLink::Replies(link) => link.element(),
        }
    }

    pub fn href(&self) -> Option<String> {
        self.element().attr("href")
    }

    pub fn rel(&self) -> Option<String> {
        self.element().attr("rel")
    }

    pub fn type_(&self) -> Option<String> {
        self.element().attr("type")
    }

    pub fn title(&self) -> Option<String> {
        self.element().attr("title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_link_attributes() {
        let link = Link::with_options([
            ("href", "http://example.org/"),
            ("rel", "alternate"),
            ("type", "text/html"),
            ("hreflang", "en"),
            ("title", "Example"),
            ("length", "1024"),
        ])
        .unwrap();
        assert_eq!(link.href().as_deref(), Some("http://example.org/"));
        assert_eq!(link.rel().as_deref(), Some("alternate"));
        assert_eq!(link.type_().as_deref(), Some("text/html"));
        assert_eq!(link.hreflang().as_deref(), Some("en"));
        assert_eq!(link.title().as_deref(), Some("Example"));
        assert_eq!(link.length().unwrap(), Some(1024));
    }

    #[test]
    fn test_replies_link_rel_is_fixed() {
        let link = RepliesLink::new();
        assert_eq!(link.rel().as_deref(), Some("replies"));
        link.set_rel("alternate");
        assert_eq!(link.rel().as_deref(), Some("replies"));

        let built = RepliesLink::with_options([("rel", "self"), ("href", "http://x/")]).unwrap();
        assert_eq!(built.rel().as_deref(), Some("replies"));
    }

    #[test]
    fn test_replies_link_threading_attributes() {
        let link = RepliesLink::new();
        let when = Utc.with_ymd_and_hms(2007, 6, 1, 9, 0, 0).unwrap();
        link.set_count(10);
        link.set_updated(&when);

        assert_eq!(link.count().unwrap(), Some(10));
        assert_eq!(link.updated().unwrap(), Some(when.into()));
        assert_eq!(link.attr("thr:count").as_deref(), Some("10"));

        let xml = link.to_xml_string().unwrap();
        assert!(xml.contains(r#"xmlns:thr="http://purl.org/syndication/thread/1.0""#));
    }

    #[test]
    fn test_to_replies_link_shares_node() {
        let link = Link::with_rel(Relation::Replies, "http://example.org/comments");
        let replies = link.to_replies_link();
        replies.set_count(3);
        assert_eq!(link.attr("thr:count").as_deref(), Some("3"));
    }

    #[test]
    fn test_typed_link_dispatch() {
        let replies = Link::with_rel(Relation::Replies, "a");
        let alternate = Link::with_rel(Relation::Alternate, "b");
        let bare = Link::new();
        bare.set_href("c");

        assert!(TypedLink::from_element(replies.element().clone()).as_replies().is_some());
        assert!(TypedLink::from_element(alternate.element().clone()).as_replies().is_none());
        assert!(TypedLink::from_element(bare.element().clone()).as_replies().is_none());
    }

    #[test]
    fn test_relation_matching() {
        assert!(Relation::Alternate.matches(None));
        assert!(Relation::Alternate.matches(Some("alternate")));
        assert!(!Relation::SelfLink.matches(None));
        assert!(Relation::EditMedia.matches(Some("edit-media")));
        assert_eq!(Relation::SelfLink.to_string(), "self");
    }

    #[test]
    fn test_negative_length_rejected() {
        assert!(Link::with_options([("length", "-1")]).is_err());
    }
}
