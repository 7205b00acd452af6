//! Atom `content` and its body codec.
//!
//! The `type` attribute decides how the body is stored:
//!
//! | `type`                                  | stored as                  |
//! |-----------------------------------------|----------------------------|
//! | `xhtml`, `*/xml`, `*+xml`               | embedded markup            |
//! | absent, `text`, `html`, `text/*`        | element text               |
//! | anything else (`image/png`, ...)        | base64 text                |
//!
//! Assigning a body picks the type: well-formed XHTML becomes `xhtml`, other
//! text becomes `html` or `text`, and bytes that cannot be XML text are
//! base64-encoded.

use std::cell::RefCell;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{unknown_option, AtomElement};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::util::{as_printable_text, looks_like_markup};
use crate::xml::XmlElement;

/// Type given to binary bodies assigned without a binary type.
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Xml,
    Escaped,
    Base64,
}

impl BodyMode {
    /// Absent `type` means `text` (RFC 4287 §4.1.3.1).
    fn classify(type_: Option<&str>) -> Self {
        let Some(type_) = type_ else {
            return BodyMode::Escaped;
        };
        let essence = type_
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "xhtml" || essence.ends_with("/xml") || essence.ends_with("+xml") {
            BodyMode::Xml
        } else if essence == "html" || essence == "text" || essence.starts_with("text/") {
            BodyMode::Escaped
        } else {
            BodyMode::Base64
        }
    }
}

/// An Atom `content` element.
#[derive(Debug, Clone)]
pub struct Content {
    elem: XmlElement,
    /// Last decoded body, with the element revision it was decoded at.
    body: RefCell<Option<(u64, Option<Vec<u8>>)>>,
}

impl AtomElement for Content {
    const NAME: &'static str = "content";

    fn from_element_unchecked(element: XmlElement) -> Self {
        Content {
            elem: element,
            body: RefCell::new(None),
        }
    }

    fn element(&self) -> &XmlElement {
        &self.elem
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "type" => self.set_type(value),
            "src" => self.set_src(value),
            "body" => self.set_body(value),
            _ => return Err(unknown_option::<Self>(key)),
        }
        Ok(())
    }
}

impl Content {
    /// A new content element holding `body`.
    pub fn with_body(body: impl AsRef<[u8]>) -> Self {
        let content = Content::new();
        content.set_body(body);
        content
    }

    pub fn type_(&self) -> Option<String> {
        self.attr("type")
    }

    pub fn set_type(&self, type_: &str) {
        self.elem.set_attr("type", type_);
    }

    /// Out-of-line content reference.
    pub fn src(&self) -> Option<String> {
        self.attr("src")
    }

    pub fn set_src(&self, src: &str) {
        self.set_attr("src", src);
    }

    /// Replaces the body, choosing how to store it.
    ///
    /// - Bytes that are not printable UTF-8 are base64-encoded. If `type` is
    ///   absent or textual it becomes `application/octet-stream`; a binary
    ///   type set by the caller is kept.
    /// - Text that parses as the contents of an XHTML `div` and holds at
    ///   least one element is embedded as markup, with `type="xhtml"`.
    /// - Any other text is stored as is, with `type="html"` when it starts
    ///   with `<` (after whitespace) and `type="text"` otherwise.
    pub fn set_body(&self, body: impl AsRef<[u8]>) {
        let bytes = body.as_ref();
        self.elem.clear_children();

        let Some(text) = as_printable_text(bytes) else {
            self.elem.append_text(&STANDARD.encode(bytes));
            if BodyMode::classify(self.type_().as_deref()) != BodyMode::Base64 {
                self.elem.set_attr("type", OCTET_STREAM);
            }
            return;
        };

        match parse_xhtml(text) {
            Some(div) => {
                self.elem.append_child(div);
                self.elem.set_attr("type", "xhtml");
            }
            None => {
                self.elem.append_text(text);
                let type_ = if looks_like_markup(text) { "html" } else { "text" };
                self.elem.set_attr("type", type_);
            }
        }
    }

    /// The body as text. `None` when there is no body, or when a binary body
    /// is not valid UTF-8 (see [`body_bytes`](Self::body_bytes)).
    pub fn body(&self) -> Option<String> {
        self.body_bytes().and_then(|b| String::from_utf8(b).ok())
    }

    /// The decoded body. Cached until the element or anything inside it
    /// changes, through this view or any other.
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        let revision = self.elem.revision();
        if let Some((cached_at, body)) = self.body.borrow().as_ref() {
            if *cached_at == revision {
                return body.clone();
            }
        }
        let body = self.decode();
        *self.body.borrow_mut() = Some((revision, body.clone()));
        body
    }

    fn decode(&self) -> Option<Vec<u8>> {
        match BodyMode::classify(self.type_().as_deref()) {
            BodyMode::Xml => {
                if !self.elem.has_element_children() {
                    return self.elem.text().map(String::into_bytes);
                }
                let elements = self.elem.child_elements();
                let markup = match elements.as_slice() {
                    [div] if div.local_name() == "div" => div.inner_xml(),
                    _ => self.elem.inner_xml(),
                };
                match markup {
                    Ok(markup) => Some(markup.into_bytes()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize content markup");
                        None
                    }
                }
            }
            BodyMode::Escaped => self.elem.text().map(String::into_bytes),
            BodyMode::Base64 => {
                let text = self.elem.text()?;
                let compact: String = text.split_whitespace().collect();
                match STANDARD.decode(compact.as_bytes()) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::warn!(
                            type_ = self.type_().as_deref().unwrap_or(""),
                            error = %e,
                            "Content body is not valid base64"
                        );
                        None
                    }
                }
            }
        }
    }
}

/// Parses `text` as the contents of an XHTML `div`. Returns the `div` when
/// that succeeds and it holds at least one element.
fn parse_xhtml(text: &str) -> Option<XmlElement> {
    let wrapped = format!(r#"<div xmlns="{}">{}</div>"#, Namespace::XHTML.uri(), text);
    match XmlElement::parse(wrapped.as_bytes()) {
        Ok(div) if div.has_element_children() => Some(div),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Body is not well-formed XHTML, storing as text");
            None
        }
    }
}
