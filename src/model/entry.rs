use chrono::{DateTime, FixedOffset, TimeZone};

use super::{
    parse_datetime, parse_integer, unknown_option, AtomElement, Content, CoreElement, RootElement,
};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::xml::XmlElement;

/// An Atom `entry`, as a document or inside a feed.
#[derive(Debug, Clone)]
pub struct Entry {
    elem: XmlElement,
}

impl AtomElement for Entry {
    const NAME: &'static str = "entry";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Entry { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        if self.set_core_option(key, value)? {
            return Ok(());
        }
        match key {
            "source" => self.set_source(value),
            "summary" => self.set_summary(value),
            "published" => self.set_published(&parse_datetime(value)?),
            "edited" => self.set_edited(&parse_datetime(value)?),
            "total" => self.set_total(parse_integer(value)?),
            "content" => {
                self.set_content_body(value);
            }
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl RootElement for Entry {}

impl CoreElement for Entry {}

impl Entry {
    pub fn source(&self) -> Option<String> {
        self.child_text("source")
    }

    pub fn set_source(&self, source: &str) {
        self.set_child_text("source", source);
    }

    pub fn summary(&self) -> Option<String> {
        self.child_text("summary")
    }

    pub fn set_summary(&self, summary: &str) {
        self.set_child_text("summary", summary);
    }

    pub fn published(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_datetime(&self.namespace(), "published")
    }

    pub fn set_published<Tz>(&self, published: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.set_datetime(&self.namespace(), "published", published);
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    pub fn content(&self) -> Option<Content> {
        self.get_object(&self.namespace(), "content")
    }

    pub fn set_content(&self, content: &Content) -> Content {
        Content::from_element_unchecked(self.set(&self.namespace(), "content", content.to_child()))
    }

    /// Wraps `body` in a [`Content`] and sets it.
    pub fn set_content_body(&self, body: impl AsRef<[u8]>) -> Content {
        self.set_content(&Content::with_body(body))
    }

    // ------------------------------------------------------------------------
    // AtomPub
    // ------------------------------------------------------------------------

    pub fn control(&self) -> Option<Control> {
        self.get_object(&Namespace::APP_WITH_PREFIX, "control")
    }

    pub fn controls(&self) -> Vec<Control> {
        self.get_objects(&Namespace::APP_WITH_PREFIX, "control")
    }

    pub fn set_control(&self, control: &Control) -> Control {
        Control::from_element_unchecked(self.set(
            &Namespace::APP_WITH_PREFIX,
            "control",
            control.to_child(),
        ))
    }

    pub fn add_control(&self, control: &Control) -> Control {
        Control::from_element_unchecked(self.add(
            &Namespace::APP_WITH_PREFIX,
            "control",
            control.to_child(),
        ))
    }

    /// Last significant edit, `app:edited`.
    pub fn edited(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_datetime(&Namespace::APP_WITH_PREFIX, "edited")
    }

    pub fn set_edited<Tz>(&self, edited: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.set_datetime(&Namespace::APP_WITH_PREFIX, "edited", edited);
    }

    // ------------------------------------------------------------------------
    // Threading
    // ------------------------------------------------------------------------

    /// Total number of replies, `thr:total`.
    pub fn total(&self) -> Result<Option<i64>> {
        self.get_integer(&Namespace::THR, "total")
    }

    pub fn set_total(&self, total: i64) {
        self.set_integer(&Namespace::THR, "total", total);
    }

    pub fn in_reply_to(&self) -> Option<ReplyTarget> {
        self.get_object(&Namespace::THR, "in-reply-to")
    }

    pub fn set_in_reply_to(&self, target: &ReplyTarget) -> ReplyTarget {
        ReplyTarget::from_element_unchecked(self.set(
            &Namespace::THR,
            "in-reply-to",
            target.to_child(),
        ))
    }
}

// ============================================================================
// Control
// ============================================================================

/// AtomPub `app:control`.
#[derive(Debug, Clone)]
pub struct Control {
    elem: XmlElement,
}

impl AtomElement for Control {
    const NAME: &'static str = "control";
    const NAMESPACE: Namespace = Namespace::APP_WITH_PREFIX;

    fn from_element_unchecked(element: XmlElement) -> Self {
        Control { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "draft" => self.set_draft(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Control {
    pub fn draft(&self) -> Option<String> {
        self.child_text("draft")
    }

    pub fn set_draft(&self, draft: &str) {
        self.set_child_text("draft", draft);
    }

    /// Whether `app:draft` reads `yes`.
    pub fn is_draft(&self) -> bool {
        self.draft().is_some_and(|d| d.trim() == "yes")
    }
}

// ============================================================================
// ReplyTarget
// ============================================================================

/// Atom Threading `thr:in-reply-to`.
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    elem: XmlElement,
}

impl AtomElement for ReplyTarget {
    const NAME: &'static str = "in-reply-to";
    const NAMESPACE: Namespace = Namespace::THR;

    fn from_element_unchecked(element: XmlElement) -> Self {
        ReplyTarget { elem: element }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "href" => self.set_href(value),
            "ref" | "id" => self.set_id(value),
            "type" => self.set_type(value),
            "source" => self.set_source(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl ReplyTarget {
    pub fn href(&self) -> Option<String> {
        self.attr("href")
    }

    pub fn set_href(&self, href: &str) {
        self.set_attr("href", href);
    }

    /// The `ref` attribute: the id of the entry replied to.
    pub fn id(&self) -> Option<String> {
        self.attr("ref")
    }

    pub fn set_id(&self, id: &str) {
        self.set_attr("ref", id);
    }

    pub fn type_(&self) -> Option<String> {
        self.attr("type")
    }

    pub fn set_type(&self, media_type: &str) {
        self.set_attr("type", media_type);
    }

    pub fn source(&self) -> Option<String> {
        self.attr("source")
    }

    pub fn set_source(&self, source: &str) {
        self.set_attr("source", source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtomError;
    use crate::model::{Feed, Link};
    use chrono::Utc;

    #[test]
    fn test_entry_text_fields() {
        let entry = Entry::with_options([
            ("id", "tag:example.org,2003:3.2397"),
            ("title", "Atom draft-07 snapshot"),
            ("summary", "A summary"),
            ("source", "elsewhere"),
        ])
        .unwrap();
        assert_eq!(entry.id().as_deref(), Some("tag:example.org,2003:3.2397"));
        assert_eq!(entry.title().as_deref(), Some("Atom draft-07 snapshot"));
        assert_eq!(entry.summary().as_deref(), Some("A summary"));
        assert_eq!(entry.source().as_deref(), Some("elsewhere"));
    }

    #[test]
    fn test_entry_timestamps() {
        let entry = Entry::with_options([
            ("updated", "2005-07-31T12:29:29Z"),
            ("published", "2003-12-13T08:29:29-04:00"),
        ])
        .unwrap();
        let published = entry.published().unwrap().unwrap();
        assert_eq!(published.to_rfc3339(), "2003-12-13T08:29:29-04:00");
        let updated = entry.updated().unwrap().unwrap();
        assert_eq!(updated.with_timezone(&Utc).to_rfc3339(), "2005-07-31T12:29:29+00:00");
    }

    #[test]
    fn test_content_string_is_wrapped() {
        let entry = Entry::new();
        entry.set_content_body("This is a test");
        let content = entry.content().unwrap();
        assert_eq!(content.type_().as_deref(), Some("text"));
        assert_eq!(content.body().as_deref(), Some("This is a test"));

        entry.set_content_body("<p>replaced</p>");
        assert_eq!(entry.get_all(&Namespace::ATOM, "content").len(), 1);
        assert_eq!(entry.content().unwrap().body().as_deref(), Some("<p>replaced</p>"));
    }

    #[test]
    fn test_content_option() {
        let entry = Entry::with_options([("content", "<div>hi</div>")]).unwrap();
        let content = entry.content().unwrap();
        assert_eq!(content.type_().as_deref(), Some("xhtml"));
        assert_eq!(content.body().as_deref(), Some("<div>hi</div>"));
    }

    #[test]
    fn test_control_and_edited() {
        let entry = Entry::new();
        let control = Control::with_options([("draft", "yes")]).unwrap();
        entry.set_control(&control);
        entry.set_edited(&Utc::now());

        assert!(entry.control().unwrap().is_draft());
        assert!(entry.edited().unwrap().is_some());

        let xml = entry.to_xml_string().unwrap();
        assert!(xml.contains(
            r#"<app:control xmlns:app="http://www.w3.org/2007/app"><app:draft>yes</app:draft></app:control>"#
        ));
    }

    #[test]
    fn test_add_control_keeps_existing() {
        let entry = Entry::new();
        entry.add_control(&Control::new());
        entry.add_control(&Control::new());
        assert_eq!(entry.controls().len(), 2);
        assert!(!entry.control().unwrap().is_draft());
    }

    #[test]
    fn test_threading_total_and_in_reply_to() {
        let entry = Entry::new();
        entry.set_total(10);
        assert_eq!(entry.total().unwrap(), Some(10));

        let target = ReplyTarget::with_options([
            ("ref", "tag:example.org,1999:id"),
            ("href", "http://www.example.org/entries/1"),
            ("type", "application/xhtml+xml"),
        ])
        .unwrap();
        entry.set_in_reply_to(&target);

        let read = entry.in_reply_to().unwrap();
        assert_eq!(read.id().as_deref(), Some("tag:example.org,1999:id"));
        assert_eq!(read.href().as_deref(), Some("http://www.example.org/entries/1"));
        assert_eq!(read.type_().as_deref(), Some("application/xhtml+xml"));

        let xml = entry.to_xml_string().unwrap();
        assert!(xml.contains(r#"<thr:in-reply-to xmlns:thr="http://purl.org/syndication/thread/1.0""#));
        assert!(xml.contains("<thr:total"));
    }

    #[test]
    fn test_reply_target_id_alias() {
        let target = ReplyTarget::with_options([("id", "urn:x")]).unwrap();
        assert_eq!(target.attr("ref").as_deref(), Some("urn:x"));
    }

    #[test]
    fn test_parse_rejects_feed() {
        let err = Entry::parse(br#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap_err();
        assert!(err.to_string().contains("Expected <entry>"));
    }

    #[test]
    fn test_parse_checks_namespace() {
        let err = Entry::parse(br#"<entry xmlns="http://example.org/not-atom"/>"#).unwrap_err();
        assert!(matches!(err, AtomError::UnexpectedElement { .. }));
        assert!(Feed::parse(br#"<feed xmlns="http://example.org/not-atom"/>"#).is_err());

        let old = Entry::parse(br#"<entry xmlns="http://purl.org/atom/ns#"><title>t</title></entry>"#)
            .unwrap();
        assert_eq!(old.title().as_deref(), Some("t"));
    }

    #[test]
    fn test_title_with_apostrophes_round_trips() {
        let entry = Entry::new();
        entry.set_title("Rock 'n' roll");
        let xml = entry.to_xml_string().unwrap();
        assert!(xml.contains("<title>Rock 'n' roll</title>"));
        assert_eq!(
            Entry::parse(xml.as_bytes()).unwrap().title().as_deref(),
            Some("Rock 'n' roll")
        );
    }

    #[test]
    fn test_content_edit_seen_by_other_view() {
        let entry = Entry::new();
        entry.set_content_body("first");
        let reader = entry.content().unwrap();
        assert_eq!(reader.body().as_deref(), Some("first"));

        entry.content().unwrap().set_body("second");
        assert_eq!(reader.body().as_deref(), Some("second"));
    }

    #[test]
    fn test_thr_prefixed_attribute_survives_round_trip() {
        let link = Link::with_options([("rel", "replies"), ("href", "http://example.org/c")]).unwrap();
        link.set_attr("thr:count", "3");
        let entry = Entry::new();
        entry.add_link(&link);

        let parsed = Entry::parse(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.replies().unwrap().count().unwrap(), Some(3));
    }
}
