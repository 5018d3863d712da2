//! Namespace-resolved XML tokens
//!
//! The state machine consumes [`Token`]s from a [`TokenReader`]. The default
//! reader wraps [`quick_xml::NsReader`]; element and attribute names arrive with
//! their namespace URI already resolved, and empty elements are expanded into a
//! start and an end token.

use std::io::BufRead;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};

use crate::error::{Error, Result};

/// Namespace of the `xml:` prefix
pub const NS_XML: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct XmlName {
    /// Namespace URI, empty when unbound. Namespace declarations use `xmlns`.
    pub space: String,
    /// Local name
    pub local: String,
}

impl XmlName {
    /// Create a name
    pub fn new(space: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            local: local.into(),
        }
    }
}

/// An attribute with its unescaped value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttr {
    /// Attribute name
    pub name: XmlName,
    /// Unescaped value
    pub value: String,
}

impl XmlAttr {
    /// Create an attribute
    pub fn new(name: XmlName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// One token of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Start of an element
    Start {
        /// Element name
        name: XmlName,
        /// Attributes in document order, duplicates included
        attrs: Vec<XmlAttr>,
    },
    /// End of an element
    End(XmlName),
    /// Character data
    CharData(String),
}

/// A source of tokens
pub trait TokenReader {
    /// Next token, or `None` at end of stream
    fn token(&mut self) -> Result<Option<Token>>;

    /// Skip the rest of the element whose start token was returned last,
    /// including its end token
    fn skip(&mut self) -> Result<()>;

    /// Bytes consumed from the input so far
    fn input_offset(&self) -> u64;
}

/// [`TokenReader`] over an XML byte stream
pub struct XmlTokenReader<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlTokenReader<R> {
    /// Create a reader over `source`
    pub fn new(source: R) -> Self {
        let mut reader = NsReader::from_reader(source);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::InvalidXml(format!("invalid UTF-8 in name: {}", e)))
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<String> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => utf8(uri),
        ResolveResult::Unknown(prefix) => utf8(&prefix),
        ResolveResult::Unbound => Ok(String::new()),
    }
}

fn element_name<R>(reader: &NsReader<R>, name: QName<'_>) -> Result<XmlName> {
    let (resolved, local) = reader.resolver().resolve_element(name);
    Ok(XmlName {
        space: namespace_of(resolved)?,
        local: utf8(local.as_ref())?,
    })
}

fn attributes<R>(reader: &NsReader<R>, start: &BytesStart<'_>) -> Result<Vec<XmlAttr>> {
    let mut attrs = Vec::new();
    for attr in start.attributes().with_checks(false) {
        let attr = attr?;
        let raw = std::str::from_utf8(&attr.value).map_err(|e| Error::XmlAttr(e.to_string()))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|e| Error::XmlAttr(e.to_string()))?
            .into_owned();
        let key = attr.key.as_ref();
        let name = if key == b"xmlns" {
            XmlName::new("", "xmlns")
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            XmlName::new("xmlns", utf8(prefix)?)
        } else {
            let (resolved, local) = reader.resolver().resolve_attribute(attr.key);
            XmlName {
                space: namespace_of(resolved)?,
                local: utf8(local.as_ref())?,
            }
        };
        attrs.push(XmlAttr { name, value });
    }
    Ok(attrs)
}

fn char_ref(reference: &str) -> Option<char> {
    let code = reference.strip_prefix('#')?;
    let code = match code.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse().ok()?,
    };
    char::from_u32(code)
}

pub(crate) fn unexpected_eof(open: usize) -> Error {
    Error::InvalidXml(format!(
        "unexpected end of document with {} unclosed element(s)",
        open
    ))
}

impl<R: BufRead> TokenReader for XmlTokenReader<R> {
    fn token(&mut self) -> Result<Option<Token>> {
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            let token = match event {
                Event::Start(e) => Token::Start {
                    name: element_name(&self.reader, e.name())?,
                    attrs: attributes(&self.reader, &e)?,
                },
                Event::End(e) => Token::End(element_name(&self.reader, e.name())?),
                Event::Text(t) => {
                    let raw = std::str::from_utf8(&t).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|e| Error::InvalidXml(e.to_string()))?;
                    Token::CharData(text.into_owned())
                }
                Event::CData(c) => Token::CharData(
                    std::str::from_utf8(&c)
                        .map_err(|e| Error::InvalidXml(e.to_string()))?
                        .to_string(),
                ),
                Event::GeneralRef(r) => {
                    let name = std::str::from_utf8(&r).map_err(|e| Error::InvalidXml(e.to_string()))?;
                    let text = match char_ref(name) {
                        Some(c) => c.to_string(),
                        None => quick_xml::escape::resolve_predefined_entity(name)
                            .ok_or_else(|| {
                                Error::InvalidXml(format!("unknown entity '&{};'", name))
                            })?
                            .to_string(),
                    };
                    Token::CharData(text)
                }
                Event::DocType(_) => {
                    return Err(Error::InvalidXml(
                        "document type declarations are not allowed".to_string(),
                    ));
                }
                Event::Eof => return Ok(None),
                _ => continue,
            };
            return Ok(Some(token));
        }
    }

    fn skip(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => return Err(unexpected_eof(depth)),
                _ => {}
            }
        }
    }

    fn input_offset(&self) -> u64 {
        self.reader.buffer_position() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(xml: &str) -> Vec<Token> {
        let mut reader = XmlTokenReader::new(xml.as_bytes());
        let mut out = Vec::new();
        while let Some(token) = reader.token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn test_empty_element_expands_with_resolved_names() {
        let out = tokens(r#"<a xmlns="urn:a" xmlns:p="urn:p"><b p:UUID="x" id="1"/></a>"#);
        assert_eq!(out.len(), 4);
        match &out[1] {
            Token::Start { name, attrs } => {
                assert_eq!(name, &XmlName::new("urn:a", "b"));
                assert_eq!(attrs[0].name, XmlName::new("urn:p", "UUID"));
                assert_eq!(attrs[1].name, XmlName::new("", "id"));
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert_eq!(out[2], Token::End(XmlName::new("urn:a", "b")));
        match &out[0] {
            Token::Start { attrs, .. } => {
                assert_eq!(attrs[0].name, XmlName::new("", "xmlns"));
                assert_eq!(attrs[1], XmlAttr::new(XmlName::new("xmlns", "p"), "urn:p"));
            }
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_attributes_are_kept() {
        let out = tokens(r#"<a id="1" id="2"/>"#);
        match &out[0] {
            Token::Start { attrs, .. } => assert_eq!(attrs.len(), 2),
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn test_skip_consumes_subtree() {
        let mut reader = XmlTokenReader::new(&b"<a><b><c/><c>t</c></b><d/></a>"[..]);
        assert!(matches!(reader.token().unwrap(), Some(Token::Start { .. })));
        assert!(matches!(reader.token().unwrap(), Some(Token::Start { .. })));
        reader.skip().unwrap();
        match reader.token().unwrap() {
            Some(Token::Start { name, .. }) => assert_eq!(name.local, "d"),
            other => panic!("unexpected token {:?}", other),
        }
        assert!(reader.input_offset() > 0);
    }

    #[test]
    fn test_doctype_is_rejected() {
        let mut reader = XmlTokenReader::new(&b"<!DOCTYPE a []><a/>"[..]);
        assert!(matches!(reader.token(), Err(Error::InvalidXml(_))));
    }

    #[test]
    fn test_skip_reports_truncated_subtree() {
        let mut reader = XmlTokenReader::new(&b"<a><b><c>"[..]);
        reader.token().unwrap();
        reader.token().unwrap();
        assert!(matches!(reader.skip(), Err(Error::InvalidXml(_))));
    }

    #[test]
    fn test_invalid_utf8_name_is_rejected() {
        let mut reader = XmlTokenReader::new(&b"<a\xff/>"[..]);
        assert!(reader.token().is_err());
    }

    #[test]
    fn test_char_refs() {
        assert_eq!(char_ref("#65"), Some('A'));
        assert_eq!(char_ref("#x42"), Some('B'));
        assert_eq!(char_ref("amp"), None);
    }
}
