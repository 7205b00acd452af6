use std::io::Cursor;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{qualify, XmlElement, XmlNode};
use crate::error::{AtomError, Result};

/// In-scope `(prefix, uri)` bindings, innermost last. An empty URI on the
/// default prefix means "no namespace".
type Scope = Vec<(Option<String>, String)>;

/// Serializes `root` as a complete document with an XML declaration.
///
/// No indentation is added: whitespace inside Atom text constructs is
/// content.
pub(crate) fn write_document(root: &XmlElement) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;

    let mut scope = Scope::new();
    write_element(&mut writer, root, &mut scope)?;
    finish(writer)
}

/// Serializes the children of `element` as a fragment, with the bindings
/// `element` itself provides treated as already in scope.
pub(crate) fn write_children(element: &XmlElement) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut scope = Scope::new();
    {
        let data = element.0.borrow();
        scope.push((data.prefix.clone(), data.namespace.clone().unwrap_or_default()));
        scope.extend(data.declarations.iter().cloned());
    }

    for child in element.children() {
        write_node(&mut writer, &child, &mut scope)?;
    }
    finish(writer)
}

fn finish(writer: Writer<Cursor<Vec<u8>>>) -> Result<String> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| AtomError::XmlWrite(e.to_string()))
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| AtomError::XmlWrite(e.to_string()))
}

fn write_node(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    node: &XmlNode,
    scope: &mut Scope,
) -> Result<()> {
    match node {
        XmlNode::Element(e) => write_element(writer, e, scope),
        XmlNode::Text(text) => write_text(writer, text),
        // A CDATA section cannot contain its own terminator
        XmlNode::CData(text) if text.contains("]]>") => write_text(writer, text),
        XmlNode::CData(text) => emit(writer, Event::CData(BytesCData::new(text.as_str()))),
        XmlNode::Comment(text) => emit(writer, Event::Comment(BytesText::from_escaped(text.as_str()))),
    }
}

/// Writes character data escaping only `<`, `>` and `&`, so quotes in text
/// and XHTML bodies come back as written.
fn write_text(writer: &mut Writer<Cursor<Vec<u8>>>, text: &str) -> Result<()> {
    emit(writer, Event::Text(BytesText::from_escaped(partial_escape(text))))
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: &XmlElement,
    scope: &mut Scope,
) -> Result<()> {
    let data = element.0.borrow();
    let name = qualify(data.prefix.as_deref(), &data.local);
    let mark = scope.len();

    let mut declared: Vec<(Option<String>, String)> = Vec::new();
    let mut declare = |prefix: Option<&str>, uri: &str, scope: &mut Scope| {
        if lookup(scope, prefix) == Some(uri) {
            return;
        }
        if declared.iter().any(|(p, _)| p.as_deref() == prefix) {
            return;
        }
        let binding = (prefix.map(str::to_string), uri.to_string());
        declared.push(binding.clone());
        scope.push(binding);
    };

    // Element namespace first, then prefixed attributes, then whatever else
    // the element carried from its source document.
    match (&data.prefix, &data.namespace) {
        (prefix, Some(uri)) => declare(prefix.as_deref(), uri.as_str(), scope),
        (None, None) => declare(None, "", scope),
        (Some(_), None) => {}
    }
    for attr in &data.attributes {
        if let (Some(prefix), Some(uri)) = (&attr.prefix, &attr.namespace) {
            if prefix != "xml" {
                declare(Some(prefix.as_str()), uri.as_str(), scope);
            }
        }
    }
    for (prefix, uri) in &data.declarations {
        declare(prefix.as_deref(), uri.as_str(), scope);
    }
    // A prefix set by name that nothing binds would make the output unparseable
    for attr in &data.attributes {
        if let (Some(prefix), None) = (&attr.prefix, &attr.namespace) {
            if prefix != "xml" && prefix != "xmlns" && lookup(scope, Some(prefix.as_str())).is_none() {
                return Err(AtomError::XmlWrite(format!(
                    "unbound prefix '{}' on attribute {}",
                    prefix,
                    attr.qualified_name()
                )));
            }
        }
    }

    let mut start = BytesStart::new(name.as_str());
    for (prefix, uri) in &declared {
        let key = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for attr in &data.attributes {
        let key = attr.qualified_name();
        start.push_attribute((key.as_str(), attr.value.as_str()));
    }

    if data.children.is_empty() {
        emit(writer, Event::Empty(start))?;
    } else {
        emit(writer, Event::Start(start))?;
        for child in &data.children {
            write_node(writer, child, scope)?;
        }
        emit(writer, Event::End(BytesEnd::new(name.as_str())))?;
    }

    scope.truncate(mark);
    Ok(())
}

/// The URI bound to `prefix`, innermost binding first.
fn lookup<'a>(scope: &'a Scope, prefix: Option<&str>) -> Option<&'a str> {
    match scope.iter().rev().find(|(p, _)| p.as_deref() == prefix) {
        Some((_, uri)) => Some(uri.as_str()),
        // The default namespace starts out empty
        None if prefix.is_none() => Some(""),
        None => None,
    }
}
