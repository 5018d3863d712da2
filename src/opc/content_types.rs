//! `[Content_Types].xml` parsing

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// Content type table of a package
#[derive(Debug, Clone, Default)]
pub(crate) struct ContentTypes {
    /// Lowercase extension to content type
    defaults: HashMap<String, String>,
    /// Lowercase absolute part name to content type
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the `[Content_Types].xml` document
    pub(crate) fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut types = ContentTypes::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.local_name();
                    let is_default = name.as_ref() == b"Default";
                    let is_override = name.as_ref() == b"Override";
                    if is_default || is_override {
                        let mut key = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = std::str::from_utf8(&attr.value)
                                .map_err(|e| Error::XmlAttr(e.to_string()))?;
                            match attr.key.as_ref() {
                                b"Extension" | b"PartName" => key = Some(value.to_string()),
                                b"ContentType" => content_type = Some(value.to_string()),
                                _ => {}
                            }
                        }
                        if let (Some(key), Some(ct)) = (key, content_type) {
                            if is_default {
                                types.defaults.insert(key.to_ascii_lowercase(), ct);
                            } else {
                                let part = format!("/{}", key.trim_start_matches('/'));
                                types.overrides.insert(part.to_ascii_lowercase(), ct);
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Content type of an absolute part name; overrides win over defaults
    pub(crate) fn lookup(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(&part.to_ascii_lowercase()) {
            return Some(ct);
        }
        let file = part.rsplit('/').next().unwrap_or(part);
        let (_, extension) = file.rsplit_once('.')?;
        self.defaults
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }
}
