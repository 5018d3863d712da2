//! Relationship part parsing and target resolution

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::model::Relationship;

/// Path of the relationships part describing `part`
///
/// `/3D/3dmodel.model` maps to `/3D/_rels/3dmodel.model.rels`; the package itself
/// (`/`) maps to `/_rels/.rels`.
pub(crate) fn rels_path_for(part: &str) -> String {
    let part = part.trim_end_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("/_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that declares it
///
/// Absolute targets are kept; relative targets are joined to the directory of
/// `source` and `.`/`..` segments are collapsed. Percent-encoded names are decoded.
pub(crate) fn resolve_target(source: &str, target: &str) -> String {
    let target = urlencoding::decode(target)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| target.to_string());
    let joined = if target.starts_with('/') {
        target
    } else {
        let dir = source.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        format!("{}/{}", dir, target)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Parse a `.rels` document declared by `source`
pub(crate) fn parse_relationships(content: &str, source: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() != b"Relationship" {
                    buf.clear();
                    continue;
                }
                let mut target = None;
                let mut rel_type = None;
                let mut id = String::new();

                for attr in e.attributes() {
                    let attr = attr?;
                    let value = std::str::from_utf8(&attr.value)
                        .map_err(|e| Error::XmlAttr(e.to_string()))?;
                    match attr.key.as_ref() {
                        b"Target" => target = Some(value.to_string()),
                        b"Type" => rel_type = Some(value.to_string()),
                        b"Id" => id = value.to_string(),
                        _ => {}
                    }
                }

                if let (Some(target), Some(rel_type)) = (target, rel_type) {
                    relationships.push(Relationship {
                        path: resolve_target(source, &target),
                        rel_type,
                        id,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    log::trace!(
        "parsed {} relationships declared by {}",
        relationships.len(),
        source
    );
    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("/"), "/_rels/.rels");
        assert_eq!(
            rels_path_for("/3D/3dmodel.model"),
            "/3D/_rels/3dmodel.model.rels"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("/", "/3D/3dmodel.model"), "/3D/3dmodel.model");
        assert_eq!(
            resolve_target("/3D/3dmodel.model", "parts/a.model"),
            "/3D/parts/a.model"
        );
        assert_eq!(
            resolve_target("/3D/3dmodel.model", "../Textures/t.png"),
            "/Textures/t.png"
        );
        assert_eq!(
            resolve_target("/3D/3dmodel.model", "/3D/my%20part.model"),
            "/3D/my part.model"
        );
    }

    #[test]
    fn test_parse_relationships() {
        let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
  <Relationship Target="thumb.png" Id="rel1" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail"/>
  <Relationship Id="broken" Type="urn:no-target"/>
</Relationships>"#;
        let parsed = parse_relationships(rels, "/Metadata/x").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].path, "/3D/3dmodel.model");
        assert_eq!(parsed[0].id, "rel0");
        assert_eq!(parsed[1].path, "/Metadata/thumb.png");
    }
}
