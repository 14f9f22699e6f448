//! Hardened XML parsing and serialization
//!
//! Documents are read with `quick-xml` into an owned event tree. The parser
//! has no resolver for external resources: DOCTYPE declarations are accepted,
//! but external DTD subsets, `SYSTEM`/`PUBLIC` entities and undeclared entity
//! references all resolve to empty content. Literal entities declared in the
//! internal subset are expanded as text, subject to [`XmlLimits`]. Attribute
//! values get the same treatment and are stored re-escaped, so serialized
//! output never depends on the dropped DOCTYPE.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::errors::XmlError;

/// Entity names every XML processor must know
const PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Secure processing limits applied while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlLimits {
    pub max_document_bytes: usize,
    pub max_entity_declarations: usize,
    pub max_entity_expansion_bytes: usize,
    pub max_depth: usize,
}

impl Default for XmlLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: 4 * 1024 * 1024,
            max_entity_declarations: 64,
            max_entity_expansion_bytes: 64 * 1024,
            max_depth: 256,
        }
    }
}

/// Parser that never touches the network or the filesystem
#[derive(Debug, Clone, Default)]
pub struct SecureXmlParser {
    limits: XmlLimits,
}

impl SecureXmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: XmlLimits) -> Self {
        Self { limits }
    }

    /// Parse raw bytes, which must be UTF-8
    pub fn parse_bytes(&self, source: &[u8], namespace_aware: bool) -> Result<XmlDocument, XmlError> {
        let source = std::str::from_utf8(source).map_err(|e| XmlError::Encoding {
            message: e.to_string(),
        })?;
        self.parse(source, namespace_aware)
    }

    /// Parse a document into an owned event tree
    pub fn parse(&self, source: &str, namespace_aware: bool) -> Result<XmlDocument, XmlError> {
        if source.len() > self.limits.max_document_bytes {
            return Err(XmlError::LimitExceeded {
                limit: "document size",
                max: self.limits.max_document_bytes,
            });
        }

        let mut reader = Reader::from_str(source);
        reader.config_mut().check_end_names = true;

        let mut events: Vec<Event<'static>> = Vec::new();
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut entities: HashMap<String, String> = HashMap::new();
        let mut seen_doctype = false;
        let mut seen_root = false;
        let mut expanded_bytes = 0usize;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => return Err(XmlError::malformed(reader.error_position(), e.to_string())),
            };
            let position = reader.buffer_position();

            match event {
                Event::Eof => break,
                Event::Decl(_) => {}
                Event::DocType(doctype) => {
                    if seen_doctype || seen_root {
                        return Err(XmlError::malformed(position, "unexpected DOCTYPE declaration"));
                    }
                    seen_doctype = true;
                    let declaration = String::from_utf8_lossy(&doctype);
                    entities = self.internal_entities(&declaration)?;
                    debug!(
                        "Accepted DOCTYPE without external resolution ({} internal entities)",
                        entities.len()
                    );
                }
                Event::Start(start) => {
                    if open.is_empty() {
                        if seen_root {
                            return Err(XmlError::malformed(position, "multiple root elements"));
                        }
                        seen_root = true;
                    }
                    if open.len() >= self.limits.max_depth {
                        return Err(XmlError::LimitExceeded {
                            limit: "element depth",
                            max: self.limits.max_depth,
                        });
                    }
                    open.push(start.name().as_ref().to_vec());
                    let start = self.resolve_attributes(&start, &entities, &mut expanded_bytes, position)?;
                    events.push(Event::Start(start));
                }
                Event::Empty(start) => {
                    if open.is_empty() {
                        if seen_root {
                            return Err(XmlError::malformed(position, "multiple root elements"));
                        }
                        seen_root = true;
                    }
                    let start = self.resolve_attributes(&start, &entities, &mut expanded_bytes, position)?;
                    events.push(Event::Empty(start));
                }
                Event::End(end) => {
                    if open.pop().is_none() {
                        return Err(XmlError::malformed(position, "unexpected closing tag"));
                    }
                    events.push(Event::End(end.into_owned()));
                }
                Event::Text(text) => {
                    if open.is_empty() {
                        if !text.iter().all(u8::is_ascii_whitespace) {
                            return Err(XmlError::malformed(position, "text outside of root element"));
                        }
                    } else {
                        events.push(Event::Text(text.into_owned()));
                    }
                }
                Event::GeneralRef(reference) => {
                    if open.is_empty() {
                        return Err(XmlError::malformed(position, "entity reference outside of root element"));
                    }
                    let name = reference
                        .decode()
                        .map_err(|e| XmlError::malformed(position, e.to_string()))?
                        .into_owned();
                    if reference.is_char_ref() || PREDEFINED_ENTITIES.contains(&name.as_str()) {
                        events.push(Event::GeneralRef(reference.into_owned()));
                    } else if let Some(value) = entities.get(&name) {
                        self.charge_expansion(&mut expanded_bytes, value.len())?;
                        events.push(Event::Text(BytesText::new(value).into_owned()));
                    } else {
                        debug!("Resolved entity '&{};' to empty content", name);
                    }
                }
                other => {
                    // Comments, CDATA and processing instructions outside the root are dropped
                    if !open.is_empty() {
                        events.push(other.into_owned());
                    }
                }
            }
        }

        if let Some(name) = open.last() {
            return Err(XmlError::malformed(
                reader.buffer_position(),
                format!("unclosed element <{}>", String::from_utf8_lossy(name)),
            ));
        }
        if !seen_root {
            return Err(XmlError::malformed(reader.buffer_position(), "no root element"));
        }

        Ok(XmlDocument {
            events,
            namespace_aware,
        })
    }

    /// Rebuild a start tag with entity references in its attribute values
    /// resolved like references in text. Values are kept in escaped form.
    fn resolve_attributes(
        &self,
        tag: &BytesStart<'_>,
        entities: &HashMap<String, String>,
        expanded_bytes: &mut usize,
        position: u64,
    ) -> Result<BytesStart<'static>, XmlError> {
        let qname = tag.name();
        let name = std::str::from_utf8(qname.as_ref())
            .map_err(|e| XmlError::malformed(position, e.to_string()))?;

        let mut resolved = BytesStart::new(name.to_string());
        for attr in tag.attributes() {
            let attr = attr.map_err(|e| XmlError::malformed(position, e.to_string()))?;
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|e| XmlError::invalid_attribute(attr.key.as_ref(), e))?;
            let value = self.resolve_attribute_value(raw, entities, expanded_bytes, position)?;
            unescape(&value).map_err(|e| XmlError::invalid_attribute(attr.key.as_ref(), e))?;

            resolved.push_attribute(Attribute {
                key: attr.key,
                value: Cow::Owned(value.into_bytes()),
            });
        }
        Ok(resolved)
    }

    fn resolve_attribute_value(
        &self,
        raw: &str,
        entities: &HashMap<String, String>,
        expanded_bytes: &mut usize,
        position: u64,
    ) -> Result<String, XmlError> {
        let mut value = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(amp) = rest.find('&') {
            push_attribute_text(&mut value, &rest[..amp]);
            let after = &rest[amp + 1..];
            let name = match after.find(';') {
                Some(end) if end > 0 => &after[..end],
                _ => {
                    return Err(XmlError::malformed(
                        position,
                        "unterminated entity reference in attribute value",
                    ));
                }
            };

            if name.starts_with('#') || PREDEFINED_ENTITIES.contains(&name) {
                value.push('&');
                value.push_str(name);
                value.push(';');
            } else if let Some(expansion) = entities.get(name) {
                self.charge_expansion(expanded_bytes, expansion.len())?;
                value.push_str(&escape(expansion.as_str()));
            } else {
                debug!("Resolved entity '&{};' in attribute to empty content", name);
            }
            rest = &after[name.len() + 1..];
        }

        push_attribute_text(&mut value, rest);
        Ok(value)
    }

    fn charge_expansion(&self, expanded_bytes: &mut usize, len: usize) -> Result<(), XmlError> {
        *expanded_bytes += len;
        if *expanded_bytes > self.limits.max_entity_expansion_bytes {
            return Err(XmlError::LimitExceeded {
                limit: "entity expansion",
                max: self.limits.max_entity_expansion_bytes,
            });
        }
        Ok(())
    }

    /// Collect literal general entities from a DOCTYPE internal subset.
    /// External and parameter entities never match and stay unresolved.
    fn internal_entities(&self, doctype: &str) -> Result<HashMap<String, String>, XmlError> {
        static ENTITY_DECL: OnceLock<Regex> = OnceLock::new();
        let pattern = ENTITY_DECL.get_or_init(|| {
            Regex::new(r#"<!ENTITY\s+([A-Za-z_][\w.:-]*)\s+(?:"([^"<&]*)"|'([^'<&]*)')\s*>"#)
                .expect("entity declaration pattern is valid")
        });

        let mut entities = HashMap::new();
        for caps in pattern.captures_iter(doctype) {
            if entities.len() >= self.limits.max_entity_declarations {
                return Err(XmlError::LimitExceeded {
                    limit: "entity declarations",
                    max: self.limits.max_entity_declarations,
                });
            }
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            // First declaration wins
            entities
                .entry(caps[1].to_string())
                .or_insert_with(|| value.to_string());
        }
        Ok(entities)
    }
}

/// Borrowed view of one element inside an [`XmlDocument`]
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    document: &'a XmlDocument,
    start: usize,
    end: usize,
}

impl<'a> Element<'a> {
    fn tag(&self) -> &'a BytesStart<'static> {
        match &self.document.events[self.start] {
            Event::Start(tag) | Event::Empty(tag) => tag,
            _ => unreachable!("element index always points at a start tag"),
        }
    }

    /// Qualified name as written in the source
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.tag().name().as_ref()).into_owned()
    }

    /// Name without a namespace prefix
    pub fn local_name(&self) -> String {
        String::from_utf8_lossy(self.tag().name().local_name().as_ref()).into_owned()
    }

    /// Unescaped value of an attribute, matched on its qualified name
    pub fn attribute(&self, name: &str) -> Result<Option<String>, XmlError> {
        for attr in self.tag().attributes() {
            let attr = attr.map_err(|e| XmlError::invalid_attribute(name.as_bytes(), e))?;
            if attr.key.as_ref() == name.as_bytes() {
                let value = attr
                    .unescape_value()
                    .map_err(|e| XmlError::invalid_attribute(name.as_bytes(), e))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Index of this element's start tag, usable with
    /// [`XmlDocument::replace_children_with_text`]
    pub fn start_index(&self) -> usize {
        self.start
    }

    /// Serialize all child nodes of this element, excluding the element tag.
    /// In namespace-aware documents, top-level child elements re-declare the
    /// namespace bindings they inherit from this element and its ancestors.
    pub fn inner_xml(&self) -> Result<String, XmlError> {
        if self.end <= self.start + 1 {
            return Ok(String::new());
        }

        let inherited = if self.document.namespace_aware {
            self.document.namespaces_in_scope(self.start)?
        } else {
            Vec::new()
        };

        let mut writer = Writer::new(Vec::new());
        let mut depth = 0usize;
        for event in &self.document.events[self.start + 1..self.end] {
            match event {
                Event::Start(tag) if depth == 0 && !inherited.is_empty() => {
                    writer
                        .write_event(Event::Start(declare_namespaces(tag, &inherited)))
                        .map_err(XmlError::serialization)?;
                }
                Event::Empty(tag) if depth == 0 && !inherited.is_empty() => {
                    writer
                        .write_event(Event::Empty(declare_namespaces(tag, &inherited)))
                        .map_err(XmlError::serialization)?;
                }
                _ => {
                    writer
                        .write_event(event.clone())
                        .map_err(XmlError::serialization)?;
                }
            }
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        String::from_utf8(writer.into_inner()).map_err(XmlError::serialization)
    }
}

/// Owned, well-formed XML document held as a flat event sequence
#[derive(Debug, Clone)]
pub struct XmlDocument {
    events: Vec<Event<'static>>,
    namespace_aware: bool,
}

impl XmlDocument {
    /// The document element
    pub fn root(&self) -> Element<'_> {
        let start = self
            .events
            .iter()
            .position(|event| matches!(event, Event::Start(_) | Event::Empty(_)))
            .unwrap_or(0);
        self.element_at(start)
    }

    /// First element in document order matching the predicate
    pub fn find_element<F>(&self, predicate: F) -> Option<Element<'_>>
    where
        F: Fn(&Element<'_>) -> bool,
    {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| matches!(event, Event::Start(_) | Event::Empty(_)))
            .map(|(index, _)| self.element_at(index))
            .find(|element| predicate(element))
    }

    /// Replace every child of the element starting at `start` with a single
    /// text node. Empty elements are expanded into a start/end pair.
    pub fn replace_children_with_text(&mut self, start: usize, text: &str) {
        let end = self.matching_end(start);
        let text = Event::Text(BytesText::new(text).into_owned());

        let empty_tag = match &self.events[start] {
            Event::Empty(tag) => Some(tag.clone()),
            _ => None,
        };
        match empty_tag {
            Some(tag) => {
                let close = Event::End(tag.to_end().into_owned());
                self.events[start] = Event::Start(tag);
                self.events.splice(start + 1..start + 1, [text, close]);
            }
            None => {
                self.events.splice(start + 1..end, [text]);
            }
        }
    }

    /// Serialize the whole document with an explicit UTF-8 declaration,
    /// `standalone="no"`, no indentation and no DOCTYPE.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
            .map_err(XmlError::serialization)?;
        for event in &self.events {
            writer
                .write_event(event.clone())
                .map_err(XmlError::serialization)?;
        }
        String::from_utf8(writer.into_inner()).map_err(XmlError::serialization)
    }

    fn element_at(&self, start: usize) -> Element<'_> {
        Element {
            document: self,
            start,
            end: self.matching_end(start),
        }
    }

    fn matching_end(&self, start: usize) -> usize {
        if !matches!(self.events.get(start), Some(Event::Start(_))) {
            return start;
        }
        let mut depth = 0usize;
        for (index, event) in self.events.iter().enumerate().skip(start) {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return index;
                    }
                }
                _ => {}
            }
        }
        self.events.len()
    }

    /// Namespace declarations visible on the element at `start`, innermost wins
    fn namespaces_in_scope(&self, start: usize) -> Result<Vec<(String, String)>, XmlError> {
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        for (index, event) in self.events.iter().enumerate() {
            match event {
                Event::Start(tag) | Event::Empty(tag) => {
                    let mut declared = Vec::new();
                    for attr in tag.attributes() {
                        let attr = attr.map_err(|e| XmlError::invalid_attribute(b"xmlns", e))?;
                        let key = attr.key.as_ref();
                        if key != b"xmlns" && !key.starts_with(b"xmlns:") {
                            continue;
                        }
                        let value = attr
                            .unescape_value()
                            .map_err(|e| XmlError::invalid_attribute(key, e))?;
                        declared.push((String::from_utf8_lossy(key).into_owned(), value.into_owned()));
                    }
                    if index == start {
                        scopes.push(declared);
                        break;
                    }
                    if matches!(event, Event::Start(_)) {
                        scopes.push(declared);
                    }
                }
                Event::End(_) => {
                    scopes.pop();
                }
                _ => {}
            }
        }

        let mut bindings: Vec<(String, String)> = Vec::new();
        for scope in scopes.into_iter().rev() {
            for (key, value) in scope {
                if !bindings.iter().any(|(existing, _)| *existing == key) {
                    bindings.push((key, value));
                }
            }
        }
        bindings.sort();
        Ok(bindings)
    }
}

/// Append text to an escaped attribute value, escaping what would end it
fn push_attribute_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

fn declare_namespaces(tag: &BytesStart<'static>, inherited: &[(String, String)]) -> BytesStart<'static> {
    let own: Vec<Vec<u8>> = tag
        .attributes()
        .flatten()
        .map(|attr| attr.key.as_ref().to_vec())
        .collect();
    let mut tag = tag.clone();
    for (key, value) in inherited {
        if !own.iter().any(|existing| existing == key.as_bytes()) {
            tag.push_attribute((key.as_str(), value.as_str()));
        }
    }
    tag
}
