//! Streaming XML reading for behavior and configuration documents.
//!
//! Both document kinds are small, flat and element-driven, so they are read
//! SAX-style: the loaders react to start/end elements and ignore everything
//! else. [`XmlReader`] wraps `quick-xml` and reports well-formedness errors as
//! [`Error::Xml`] with the byte offset where reading stopped.
//!
//! ```
//! use horizon_interact::xml::{XmlEvent, XmlReader};
//!
//! let mut reader = XmlReader::from_str(r#"<config><param name="a" value="1"/></config>"#);
//! let mut params = 0;
//! while let Some(event) = reader.next().unwrap() {
//!     if let XmlEvent::EmptyElement { name, .. } = event {
//!         if name == "param" {
//!             params += 1;
//!         }
//!     }
//! }
//! assert_eq!(params, 1);
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// Events emitted by the streaming reader.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    /// Start of an element.
    StartElement {
        name: String,
        attributes: HashMap<String, String>,
    },
    /// End of an element.
    EndElement { name: String },
    /// Self-closing element.
    EmptyElement {
        name: String,
        attributes: HashMap<String, String>,
    },
    /// Non-empty text content.
    Text(String),
}

/// A streaming XML reader.
///
/// Declarations, comments, CDATA and processing instructions are skipped.
/// Unbalanced documents are reported as errors, including a document that
/// ends with open elements.
pub struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<String>,
}

impl<'a> XmlReader<&'a [u8]> {
    /// Creates a reader over a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a reader from a `BufRead` source.
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        XmlReader {
            reader,
            buf: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Byte offset of the reader in the source.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Reads the next relevant event. Returns `None` at the end of the document.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<XmlEvent>> {
        loop {
            self.buf.clear();
            let result = self.reader.read_event_into(&mut self.buf);
            let position = self.reader.buffer_position() as u64;
            let event = result.map_err(|e| Error::xml(position, e.to_string()))?;

            let converted = match event {
                Event::Start(start) => {
                    let (name, attributes) = element_parts(&start, position)?;
                    self.open.push(name.clone());
                    XmlEvent::StartElement { name, attributes }
                }
                Event::Empty(empty) => {
                    let (name, attributes) = element_parts(&empty, position)?;
                    XmlEvent::EmptyElement { name, attributes }
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                    match self.open.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            return Err(Error::xml(
                                position,
                                format!("expected </{open}>, found </{name}>"),
                            ));
                        }
                        None => {
                            return Err(Error::xml(
                                position,
                                format!("unexpected closing tag </{name}>"),
                            ));
                        }
                    }
                    XmlEvent::EndElement { name }
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map_err(|e| Error::xml(position, e.to_string()))?;
                    if content.trim().is_empty() {
                        continue;
                    }
                    XmlEvent::Text(content.to_string())
                }
                Event::Eof => {
                    if let Some(open) = self.open.last() {
                        return Err(Error::xml(
                            position,
                            format!("unexpected end of document inside <{open}>"),
                        ));
                    }
                    return Ok(None);
                }
                _ => continue,
            };
            return Ok(Some(converted));
        }
    }
}

fn element_parts(
    start: &BytesStart<'_>,
    position: u64,
) -> Result<(String, HashMap<String, String>)> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut attributes = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xml(position, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::xml(position, e.to_string()))?
            .to_string();
        attributes.insert(key, value);
    }
    Ok((name, attributes))
}

/// Case-insensitive attribute lookup.
pub(crate) fn attribute<'a>(attributes: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
