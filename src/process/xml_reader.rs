use anyhow::{anyhow, bail, Context, Result};
use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event},
    Reader,
};
use tracing::{debug, warn};

use crate::{
    error::PreprocessError,
    process::{
        schema::FIELD_COUNT, CanonicalField, CanonicalTable, EmployeeRecord, FileFormat, Value,
    },
};

const EMPLOYEE_TAG: &str = "employee";

#[derive(Debug, Clone)]
enum TextChunk {
    /// Character data, still entity-escaped.
    Escaped(Vec<u8>),
    /// CDATA content, taken as-is.
    Raw(Vec<u8>),
}

/// One element of a parsed document. Text is kept undecoded until extraction.
#[derive(Debug, Clone)]
pub struct XmlElement {
    pub name: String,
    pub children: Vec<XmlElement>,
    text: Vec<TextChunk>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: Vec::new(),
        }
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every element below this one, in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(el.children.iter().rev());
        }
        out
    }

    /// Decoded text ahead of the first child element. `None` when there is none.
    pub fn text(&self) -> Result<Option<String>> {
        let mut out = String::new();
        for chunk in &self.text {
            match chunk {
                TextChunk::Escaped(raw) => {
                    let s = std::str::from_utf8(raw)
                        .with_context(|| format!("text of <{}> is not valid UTF-8", self.name))?;
                    let decoded = unescape(s)
                        .with_context(|| format!("bad entity in text of <{}>", self.name))?;
                    out.push_str(&decoded);
                }
                TextChunk::Raw(raw) => {
                    let s = std::str::from_utf8(raw)
                        .with_context(|| format!("CDATA of <{}> is not valid UTF-8", self.name))?;
                    out.push_str(s);
                }
            }
        }
        let trimmed = out.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// A well-formed document with a single root element.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
}

fn element_name(e: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .context("element name is not valid UTF-8")
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => *root = Some(el),
    }
}

/// Build the element tree for `bytes`, failing on anything that isn't a
/// single well-formed root element.
pub fn parse_xml(bytes: &[u8]) -> Result<XmlDocument> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("XML syntax error near byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                if root.is_some() {
                    bail!("content after the root element");
                }
                stack.push(XmlElement::new(element_name(&e)?));
            }
            Event::Empty(e) => {
                if root.is_some() {
                    bail!("content after the root element");
                }
                let el = XmlElement::new(element_name(&e)?);
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| anyhow!("closing tag without an open element"))?;
                attach(&mut stack, &mut root, el);
            }
            // only text ahead of the first child counts as the element's text
            Event::Text(t) => match stack.last_mut() {
                Some(parent) if parent.children.is_empty() => {
                    parent.text.push(TextChunk::Escaped(t.into_inner().into_owned()))
                }
                Some(_) => {}
                None if t.iter().all(u8::is_ascii_whitespace) => {}
                None => bail!("text outside the root element"),
            },
            Event::CData(c) => match stack.last_mut() {
                Some(parent) if parent.children.is_empty() => {
                    parent.text.push(TextChunk::Raw(c.into_inner().into_owned()))
                }
                Some(_) => {}
                None => bail!("CDATA outside the root element"),
            },
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        bail!("unclosed element <{}>", open.name);
    }
    let root = root.ok_or_else(|| anyhow!("document has no root element"))?;
    Ok(XmlDocument { root })
}

/// One record per `<employee>` element anywhere below the root. Fields are
/// matched on the exact normalized tag (`firstname`, `hiredate`, ...) among
/// direct children; a missing child is null.
pub fn extract_employees(doc: &XmlDocument) -> Result<CanonicalTable, PreprocessError> {
    let malformed = |e: anyhow::Error| PreprocessError::MalformedSource {
        format: FileFormat::Xml,
        reason: format!("{:#}", e),
    };
    let tags = CanonicalField::ALL.map(|f| f.xml_tag());

    let mut records = Vec::new();
    for employee in doc
        .root
        .descendants()
        .into_iter()
        .filter(|el| el.name == EMPLOYEE_TAG)
    {
        let mut values: [Value; FIELD_COUNT] = Default::default();
        for field in CanonicalField::ALL {
            let tag = &tags[field.index()];
            values[field.index()] = match employee.child(tag) {
                Some(el) => el.text().map_err(malformed)?.map_or(Value::Null, Value::Text),
                None => Value::Null,
            };
        }
        records.push(EmployeeRecord::new(values));
    }

    if records.is_empty() {
        warn!(root = %doc.root.name, "no <employee> elements found");
    }
    debug!(records = records.len(), "extracted employees from XML");
    Ok(CanonicalTable::new(records))
}
