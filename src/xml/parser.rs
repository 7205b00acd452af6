use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{split_qname, Attribute, ElementData, XmlElement, XmlNode};
use crate::config::Config;
use crate::error::{AtomError, Result};
use crate::namespace::Namespace;

/// An element whose end tag has not been read yet.
struct OpenElement {
    element: XmlElement,
    name: String,
    declarations: Vec<(Option<String>, String)>,
}

/// Parses `bytes` into a tree and returns the root element.
///
/// # Errors
///
/// Returns an error if:
/// - The input exceeds `config.max_document_bytes`
/// - The content is not well-formed XML (including mismatched or unclosed tags)
/// - A prefix is used without being declared
/// - Nesting exceeds `config.max_depth`
///
/// # Security
///
/// XXE (XML External Entity) attacks are mitigated because `quick-xml` (0.37)
/// does not parse `<!ENTITY>` declarations. Custom entities fail with
/// `EscapeError::UnrecognizedEntity`; only the five XML builtins resolve.
pub fn parse(bytes: &[u8], config: &Config) -> Result<XmlElement> {
    let size = bytes.len() as u64;
    if size > config.max_document_bytes {
        return Err(AtomError::TooLarge {
            size,
            max: config.max_document_bytes,
        });
    }
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut node_count: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                // SEC-003: Reject excessively nested documents
                if stack.len() >= config.max_depth {
                    return Err(AtomError::MaxDepthExceeded(config.max_depth));
                }
                let open = open_element(&e, &reader, &stack)?;
                attach(&open.element, &stack, &mut root)?;
                node_count += 1;
                stack.push(open);
            }
            Ok(Event::Empty(e)) => {
                if stack.len() >= config.max_depth {
                    return Err(AtomError::MaxDepthExceeded(config.max_depth));
                }
                let open = open_element(&e, &reader, &stack)?;
                attach(&open.element, &stack, &mut root)?;
                node_count += 1;
            }
            Ok(Event::End(e)) => {
                let name = utf8(e.name().as_ref())?.to_string();
                match stack.pop() {
                    Some(open) if open.name == name => {}
                    Some(open) => {
                        return Err(AtomError::XmlParse(format!(
                            "expected </{}>, found </{}>",
                            open.name, name
                        )))
                    }
                    None => {
                        return Err(AtomError::XmlParse(format!(
                            "unexpected closing tag </{}>",
                            name
                        )))
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| AtomError::XmlParse(err.to_string()))?;
                match stack.last() {
                    Some(open) => push_node(&open.element, XmlNode::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(AtomError::XmlParse(
                            "text content outside the root element".into(),
                        ))
                    }
                }
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                let text = utf8(&raw)?.to_string();
                match stack.last() {
                    Some(open) => push_node(&open.element, XmlNode::CData(text)),
                    None => {
                        return Err(AtomError::XmlParse(
                            "CDATA section outside the root element".into(),
                        ))
                    }
                }
            }
            Ok(Event::Comment(e)) => {
                if config.keep_comments {
                    if let Some(open) = stack.last() {
                        let raw = e.into_inner();
                        push_node(&open.element, XmlNode::Comment(utf8(&raw)?.to_string()));
                    }
                }
            }
            Ok(Event::Decl(_)) => {}
            Ok(Event::DocType(_)) => {
                tracing::trace!("Ignoring DOCTYPE declaration");
            }
            Ok(Event::PI(_)) => {
                tracing::trace!("Ignoring processing instruction");
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AtomError::XmlParse(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(AtomError::XmlParse(format!(
            "unexpected end of document: <{}> is not closed",
            open.name
        )));
    }

    let root = root.ok_or_else(|| AtomError::XmlParse("document has no root element".into()))?;
    tracing::debug!(
        root = %root.qualified_name(),
        namespace = root.namespace_uri().as_deref().unwrap_or(""),
        elements = node_count,
        "Parsed XML document"
    );
    Ok(root)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| AtomError::XmlParse(e.to_string()))
}

fn push_node(parent: &XmlElement, node: XmlNode) {
    parent.data_mut().children.push(node);
}

fn attach(
    element: &XmlElement,
    stack: &[OpenElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    match stack.last() {
        Some(parent) => {
            parent.element.append_child(element.clone());
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element.clone());
            Ok(())
        }
        None => Err(AtomError::XmlParse(format!(
            "multiple root elements: <{}>",
            element.qualified_name()
        ))),
    }
}

/// Builds the node for a start tag, resolving its prefixes.
fn open_element(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    stack: &[OpenElement],
) -> Result<OpenElement> {
    let name = utf8(e.name().as_ref())?.to_string();
    let decoder = reader.decoder();

    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| AtomError::XmlParse(err.to_string()))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|err| AtomError::XmlParse(err.to_string()))?
            .into_owned();
        if key == "xmlns" {
            declarations.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((Some(prefix.to_string()), value));
        } else {
            raw_attributes.push((key, value));
        }
    }

    let (prefix, local) = split_qname(&name);
    let namespace = resolve(prefix, &declarations, stack)
        .map_err(|p| AtomError::XmlParse(format!("unbound prefix '{}' on <{}>", p, name)))?;

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (key, value) in raw_attributes {
        let (attr_prefix, attr_local) = split_qname(&key);
        // Unprefixed attributes are in no namespace
        let attr_namespace = match attr_prefix {
            Some(_) => resolve(attr_prefix, &declarations, stack).map_err(|p| {
                AtomError::XmlParse(format!("unbound prefix '{}' on attribute {}", p, key))
            })?,
            None => None,
        };
        attributes.push(Attribute {
            prefix: attr_prefix.map(str::to_string),
            local: attr_local.to_string(),
            namespace: attr_namespace,
            value,
        });
    }

    let element = XmlElement::from_data(ElementData {
        prefix: prefix.map(str::to_string),
        local: local.to_string(),
        namespace,
        declarations: declarations.clone(),
        attributes,
        children: Vec::new(),
        revision: 0,
    });

    Ok(OpenElement {
        element,
        name,
        declarations,
    })
}

/// Resolves `prefix` against the element's own declarations, then its open
/// ancestors. `Err` carries an unbound prefix.
fn resolve(
    prefix: Option<&str>,
    own: &[(Option<String>, String)],
    stack: &[OpenElement],
) -> std::result::Result<Option<String>, String> {
    if prefix == Some("xml") {
        return Ok(Some(Namespace::XML.uri().to_string()));
    }
    let scopes = std::iter::once(own).chain(stack.iter().rev().map(|o| o.declarations.as_slice()));
    for scope in scopes {
        if let Some((_, uri)) = scope.iter().rev().find(|(p, _)| p.as_deref() == prefix) {
            // xmlns="" undeclares the default namespace
            return Ok((!uri.is_empty()).then(|| uri.clone()));
        }
    }
    match prefix {
        Some(p) => Err(p.to_string()),
        None => Ok(None),
    }
}
