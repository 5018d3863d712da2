//! Shared fixtures for integration tests
//!
//! Packages are built in memory with `ZipWriter`; model documents are assembled
//! from small string helpers so each test only spells out what it checks.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::{CompressionMethod, ZipWriter};
use zip::write::SimpleFileOptions;

pub const CORE_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
pub const MATERIAL_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";
pub const PRODUCTION_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/production/2015/06";

pub const MODEL_REL: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";
pub const THUMBNAIL_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";
pub const TEXTURE_REL: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dtexture";

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#;

/// Build a zip archive from (name, content) pairs
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    build_zip_with(entries, CompressionMethod::Deflated)
}

/// Build a zip archive whose entries are stored uncompressed
pub fn build_zip_stored(entries: &[(&str, &str)]) -> Vec<u8> {
    build_zip_with(entries, CompressionMethod::Stored)
}

fn build_zip_with(entries: &[(&str, &str)], method: CompressionMethod) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buffer
}

/// A relationships document with (target, type) entries
pub fn rels(entries: &[(&str, &str)]) -> String {
    let mut doc = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for (i, (target, rel_type)) in entries.iter().enumerate() {
        doc.push_str(&format!(
            "  <Relationship Target=\"{}\" Id=\"rel{}\" Type=\"{}\"/>\n",
            target, i, rel_type
        ));
    }
    doc.push_str("</Relationships>");
    doc
}

/// Package relationships pointing at the default root part
pub fn root_rels() -> String {
    rels(&[("/3D/3dmodel.model", MODEL_REL)])
}

/// A model document declaring the core, material and production namespaces
pub fn model_doc(model_attrs: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="{CORE_NS}" xmlns:m="{MATERIAL_NS}" xmlns:p="{PRODUCTION_NS}" {model_attrs}>
{body}
</model>"#
    )
}

/// A single-triangle mesh object
pub fn mesh_object(id: usize, attrs: &str) -> String {
    format!(
        r#"<object id="{id}" type="model" {attrs}>
  <mesh>
    <vertices>
      <vertex x="0" y="0" z="0"/>
      <vertex x="10" y="0" z="0"/>
      <vertex x="0" y="10" z="0"/>
    </vertices>
    <triangles>
      <triangle v1="0" v2="1" v3="2"/>
    </triangles>
  </mesh>
</object>"#
    )
}

/// A package whose root part is `root_model`, with extra entries appended
pub fn package(root_model: &str, extra: &[(&str, &str)]) -> Vec<u8> {
    let root_rels = root_rels();
    let mut entries = vec![
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", root_rels.as_str()),
        ("3D/3dmodel.model", root_model),
    ];
    entries.extend_from_slice(extra);
    build_zip(&entries)
}
