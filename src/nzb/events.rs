//! Closed set of XML events the NZB parser consumes
//!
//! A thin adapter over `quick_xml::Reader`: element names are reduced to
//! their local part, attribute values and text are unescaped, CDATA arrives
//! as text and `<empty/>` elements arrive as a start followed by an end.

use crate::{Result, UsenetError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

/// One XML event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Element start with its attributes in document order
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Element end
    End { name: String },
    /// Character data, entity references resolved
    Text(String),
}

impl XmlEvent {
    /// Value of the named attribute on a start event
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            XmlEvent::Start { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Iterator of [`XmlEvent`]s read from a buffered source
///
/// Yields `Err` once on malformed input and then stops.
pub struct XmlEvents<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> XmlEvents<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.trim_text(false);

        Self {
            reader,
            buf: Vec::with_capacity(1024),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for XmlEvents<R> {
    type Item = Result<XmlEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };

            let converted = match event {
                Event::Start(ref e) => start_event(e),
                Event::End(ref e) => Ok(XmlEvent::End {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                }),
                Event::Text(ref e) => e
                    .unescape()
                    .map(|text| XmlEvent::Text(text.into_owned()))
                    .map_err(UsenetError::from),
                Event::CData(ref e) => Ok(XmlEvent::Text(String::from_utf8_lossy(e).into_owned())),
                Event::Eof => {
                    self.done = true;
                    return None;
                }
                // declarations, comments, processing instructions, doctype
                _ => continue,
            };

            if converted.is_err() {
                self.done = true;
            }
            return Some(converted);
        }
    }
}

fn start_event(e: &BytesStart<'_>) -> Result<XmlEvent> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| UsenetError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlEvent::Start { name, attributes })
}
