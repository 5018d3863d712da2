//! Package level decoding tests

mod common;

use std::any::Any;
use std::io::Cursor;
use std::sync::Arc;

use common::*;
use lib3mf_stream::decoder::{Decoded, ElementDecoder, NodeKind, Scanner, XmlAttr, XmlName};
use lib3mf_stream::extensions::production::{ItemAttr, ObjectAttr};
use lib3mf_stream::model::ExtensionAttr;
use lib3mf_stream::{Decoder, DecoderConfig, ElementErrorKind, Error, Model, ObjectType};
use parking_lot::Mutex;

fn decoder(data: Vec<u8>) -> Decoder {
    Decoder::from_reader(Cursor::new(data))
}

#[test]
fn test_decode_minimal_package() {
    let root = model_doc(
        "",
        &format!(
            r#"<metadata name="Title">Cube</metadata>
<metadata name="Designer" preserve="1">Someone</metadata>
<resources>
{}
</resources>
<build>
  <item objectid="1" transform="1 0 0 0 1 0 0 0 1 5 5 0" partnumber="P-1"/>
</build>"#,
            mesh_object(1, r#"name="Cube""#)
        ),
    );
    let data = package(&root, &[]);

    let mut model = Model::new();
    decoder(data).decode(&mut model).unwrap();

    assert_eq!(model.path, "/3D/3dmodel.model");
    assert_eq!(model.unit, "millimeter");
    assert_eq!(model.language.as_deref(), Some("en-US"));
    assert_eq!(model.get_metadata("Title"), Some("Cube"));
    assert_eq!(model.metadata[1].preserve, Some(true));
    assert!(model.warnings.is_empty());

    let object = model.resources.find_object(1).unwrap();
    assert_eq!(object.name.as_deref(), Some("Cube"));
    assert_eq!(object.object_type, ObjectType::Model);
    let mesh = object.mesh.as_ref().unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.triangles.len(), 1);
    assert_eq!(mesh.vertices[1].x, 10.0);

    assert_eq!(model.build.items.len(), 1);
    let item = &model.build.items[0];
    assert_eq!(item.objectid, 1);
    assert_eq!(item.part_number.as_deref(), Some("P-1"));
    assert_eq!(item.transform.unwrap()[9], 5.0);
    assert!(model.childs.is_empty());
}

#[test]
fn test_from_reader_registers_production() {
    let root = model_doc(
        "",
        &format!(
            r#"<resources>{}</resources>
<build p:UUID="e9a6b90c-de6a-4ba1-8c8b-ee1ddb1fc2ba">
  <item objectid="1" p:UUID="3c5ab3aa-1d1c-4ff6-9e6c-3da1b3b1d2c1"/>
</build>"#,
            mesh_object(1, r#"p:UUID="1d55a64e-3e6f-4a43-9c7b-0e3b6f06d8af""#)
        ),
    );
    let model = Model::from_reader(Cursor::new(package(&root, &[]))).unwrap();

    let object = model.resources.find_object(1).unwrap();
    assert_eq!(
        object.extensions.get::<ObjectAttr>().unwrap().uuid,
        "1d55a64e-3e6f-4a43-9c7b-0e3b6f06d8af"
    );
    let item = &model.build.items[0];
    assert_eq!(
        item.extensions.get::<ItemAttr>().unwrap().uuid,
        "3c5ab3aa-1d1c-4ff6-9e6c-3da1b3b1d2c1"
    );
    assert!(model.namespaces.iter().any(|ns| ns.local_name == "p"));
}

#[test]
fn test_missing_root_model_leaves_model_untouched() {
    let rels = rels(&[("/3D/3dmodel.model", THUMBNAIL_REL)]);
    let root = model_doc("", "<resources/><build/>");
    let data = build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", &rels),
        ("3D/3dmodel.model", &root),
    ]);

    let mut model = Model::new();
    model.unit = "inch".to_string();
    let err = decoder(data).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::MissingRootModel));
    assert_eq!(err.to_string(), "[E1004] package does not have root model");
    assert_eq!(model.unit, "inch");
    assert!(model.path.is_empty());
    assert!(model.resources.is_empty());
}

#[test]
fn test_package_without_rels_has_no_root() {
    let root = model_doc("", "<resources/><build/>");
    let data = build_zip(&[("3D/3dmodel.model", &root)]);
    let mut model = Model::new();
    let err = decoder(data).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::MissingRootModel));
}

#[test]
fn test_duplicated_resource_id_aborts_decode() {
    let root = model_doc(
        "",
        r##"<resources>
  <basematerials id="1"><base name="Red" displaycolor="#FF0000"/></basematerials>
  <basematerials id="1"><base name="Blue" displaycolor="#0000FF"/></basematerials>
</resources>
<build/>"##,
    );
    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    match err {
        Error::Element(e) => {
            assert_eq!(e.path, "/3D/3dmodel.model");
            assert_eq!(e.kind, ElementErrorKind::DuplicatedId(1));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(model.resources.is_empty());
    assert!(model.path.is_empty());
}

#[test]
fn test_malformed_color_is_warning_when_lenient() {
    let root = model_doc(
        "",
        r##"<resources>
  <m:colorgroup id="1"><m:color color="#12345"/><m:color color="#00FF00"/></m:colorgroup>
</resources>
<build/>"##,
    );

    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    assert!(matches!(
        err,
        Error::Element(ref e) if e.kind == ElementErrorKind::InvalidColor("#12345".to_string())
    ));

    let mut model = Model::new();
    let mut lenient = decoder(package(&root, &[]));
    lenient.set_strict(false);
    lenient.decode(&mut model).unwrap();
    assert_eq!(model.warnings.len(), 1);
    assert_eq!(model.warnings[0].element, "color");
    assert_eq!(model.resources.color_groups[0].colors.len(), 2);
    assert_eq!(model.resources.color_groups[0].colors[1], (0, 255, 0, 255));
}

#[test]
fn test_required_extension_policy() {
    let root = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="{CORE_NS}" xmlns:q="urn:example:unknown" requiredextensions="q">
<resources/>
<build/>
</model>"#
    );

    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::UnsupportedExtension(ref ns) if ns == "urn:example:unknown"));

    let mut model = Model::new();
    let mut lenient = decoder(package(&root, &[]));
    lenient.set_strict(false);
    lenient.decode(&mut model).unwrap();
    assert_eq!(
        model.warnings[0].kind,
        ElementErrorKind::UnsupportedExtension("urn:example:unknown".to_string())
    );
    let spec = model
        .namespaces
        .iter()
        .find(|ns| ns.namespace == "urn:example:unknown")
        .unwrap();
    assert!(spec.is_required);
}

#[test]
fn test_required_registered_extension_is_accepted() {
    let root = model_doc(r#"requiredextensions="p""#, "<resources/><build/>");

    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::UnsupportedExtension(_)));

    let mut model = Model::new();
    decoder(package(&root, &[]))
        .with_config(DecoderConfig::with_all_extensions())
        .decode(&mut model)
        .unwrap();
    assert!(model.warnings.is_empty());
}

#[test]
fn test_unknown_extension_elements_are_skipped() {
    let root = model_doc(
        r#"xmlns:x="urn:example:ignored""#,
        &format!(
            r#"<x:settings><x:nested value="1"><object id="9"/></x:nested></x:settings>
<resources>
  <x:custom id="4"/>
  {}
</resources>
<build><item objectid="1"/></build>"#,
            mesh_object(1, "")
        ),
    );
    let mut model = Model::new();
    decoder(package(&root, &[])).decode(&mut model).unwrap();
    assert_eq!(model.resources.objects.len(), 1);
    assert!(model.resources.find_object(9).is_none());
    assert!(model.warnings.is_empty());
}

#[test]
fn test_doctype_is_rejected() {
    let root = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE model [<!ENTITY x "boom">]>
<model unit="millimeter" xmlns="{CORE_NS}"><resources/><build/></model>"#
    );
    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::InvalidXml(_)), "{}", err);
}

#[test]
fn test_attachments_are_collected() {
    let root = model_doc(
        "",
        r#"<resources>
  <m:texture2d id="1" path="/3D/Texture/wood.png" contenttype="image/png"/>
  <m:texture2dgroup id="2" texid="1"><m:tex2coord u="0" v="0"/><m:tex2coord u="1" v="1"/></m:texture2dgroup>
</resources>
<build/>"#,
    );
    let package_rels = rels(&[
        ("/3D/3dmodel.model", MODEL_REL),
        ("/Metadata/thumbnail.png", THUMBNAIL_REL),
    ]);
    let root_part_rels = rels(&[
        ("Texture/wood.png", TEXTURE_REL),
        ("/Metadata/extra.bin", "urn:example:extra"),
        ("/Metadata/thumbnail.png", THUMBNAIL_REL),
    ]);
    let entries = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", package_rels.as_str()),
        ("3D/3dmodel.model", root.as_str()),
        ("3D/_rels/3dmodel.model.rels", root_part_rels.as_str()),
        ("3D/Texture/wood.png", "wood"),
        ("Metadata/thumbnail.png", "thumb"),
        ("Metadata/extra.bin", "extra"),
    ];

    let mut model = Model::new();
    decoder(build_zip(&entries)).decode(&mut model).unwrap();
    let paths: Vec<_> = model.attachments.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, ["/Metadata/thumbnail.png", "/3D/Texture/wood.png"]);
    let thumbnail = model.find_attachment("/Metadata/thumbnail.png").unwrap();
    assert_eq!(thumbnail.content_type, "image/png");
    assert_eq!(thumbnail.data, b"thumb");
    assert_eq!(model.relationships.len(), 3);

    let texture = model.resources.find_texture2d(1).unwrap();
    assert_eq!(texture.contenttype, "image/png");
    assert_eq!(model.resources.texture2d_groups[0].tex2coords.len(), 2);

    let mut filtered = decoder(build_zip(&entries));
    filtered.register_file_filter_extension("urn:example", |rel| rel == "urn:example:extra");
    let mut model = Model::new();
    filtered.decode(&mut model).unwrap();
    let extra = model.find_attachment("/Metadata/extra.bin").unwrap();
    assert_eq!(extra.data, b"extra");
    assert_eq!(extra.content_type, "");
    assert_eq!(model.attachments.len(), 3);
}

#[test]
fn test_child_parts_are_decoded_into_childs() {
    let root = model_doc(
        "",
        r#"<resources>
  <object id="1" type="model"><components><component objectid="1" p:path="/3D/parts/bolt.model"/></components></object>
</resources>
<build><item objectid="1" p:path="/3D/parts/nut.model"/></build>"#,
    );
    let bolt = model_doc(
        "",
        &format!("<resources>{}</resources><build/>", mesh_object(1, "")),
    );
    let nut = model_doc(
        "",
        &format!("<resources>{}</resources><build/>", mesh_object(1, "")),
    );
    let unused = model_doc("", "<resources><basematerials id=\"x\"/></resources>");
    let data = package(
        &root,
        &[
            ("3D/parts/bolt.model", &bolt),
            ("3D/parts/nut.model", &nut),
            ("3D/parts/unused.model", &unused),
        ],
    );

    let mut model = Model::new();
    decoder(data)
        .with_config(DecoderConfig::with_all_extensions())
        .decode(&mut model)
        .unwrap();

    assert_eq!(
        model.childs.keys().map(String::as_str).collect::<Vec<_>>(),
        ["/3D/parts/bolt.model", "/3D/parts/nut.model"]
    );
    let bolt = &model.childs["/3D/parts/bolt.model"];
    assert!(bolt.resources.find_object(1).unwrap().mesh.is_some());
    assert!(model.find_object("/3D/parts/nut.model", 1).is_some());
    assert!(model.warnings.is_empty());
}

#[test]
fn test_child_part_error_fails_whole_decode() {
    let root = model_doc(
        "",
        r#"<resources>
  <object id="1" type="model"><components><component objectid="1" p:path="/3D/parts/bad.model"/></components></object>
</resources>
<build><item objectid="1"/></build>"#,
    );
    let bad = model_doc(
        "",
        &format!(
            "<resources>{}{}</resources><build/>",
            mesh_object(1, ""),
            mesh_object(1, "")
        ),
    );
    let data = package(&root, &[("3D/parts/bad.model", &bad)]);

    let mut model = Model::new();
    let err = decoder(data)
        .with_config(DecoderConfig::with_all_extensions())
        .decode(&mut model)
        .unwrap_err();
    match err {
        Error::Element(e) => {
            assert_eq!(e.path, "/3D/parts/bad.model");
            assert_eq!(e.kind, ElementErrorKind::DuplicatedId(1));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(model.childs.is_empty());
    assert!(model.resources.is_empty());
}

#[test]
fn test_unmarshal_model_without_package() {
    let doc = format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<model unit="inch" thumbnail="/Metadata/thumbnail.png" xmlns="{CORE_NS}">
<resources><basematerials id="3"><base name="Steel" displaycolor="#808080FF"/></basematerials></resources>
</model>"##
    );
    let decoder = Decoder::default();
    let mut model = Model::new();
    decoder.unmarshal_model(doc.as_bytes(), &mut model).unwrap();

    assert_eq!(model.path, "/3D/3dmodel.model");
    assert_eq!(model.unit, "inch");
    assert_eq!(model.thumbnail.as_deref(), Some("/Metadata/thumbnail.png"));
    let group = model.resources.find_base_materials(3).unwrap();
    assert_eq!(group.materials[0].name, "Steel");
    assert_eq!(group.materials[0].displaycolor, (128, 128, 128, 255));
}

#[test]
fn test_truncated_document_is_rejected() {
    let doc = format!(
        r##"<model xmlns="{CORE_NS}" unit="millimeter"><resources><basematerials id="1"><base name="a" displaycolor="#FFFFFF"/>"##
    );
    let mut model = Model::new();
    model.unit = "inch".to_string();
    let err = Decoder::default()
        .unmarshal_model(doc.as_bytes(), &mut model)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidXml(_)), "{}", err);
    assert_eq!(model.unit, "inch");
    assert!(model.resources.is_empty());
}

#[test]
fn test_truncated_skipped_subtree_is_rejected() {
    let root = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="{CORE_NS}" xmlns:x="urn:example:ignored">
<resources/>
<x:settings><x:nested>"#
    );
    let mut model = Model::new();
    let err = decoder(package(&root, &[])).decode(&mut model).unwrap_err();
    assert!(matches!(err, Error::InvalidXml(_)), "{}", err);
    assert!(model.path.is_empty());
}

const LATTICE_NS: &str = "urn:example:lattice";

#[derive(Debug, Clone, PartialEq)]
struct Lattice {
    beams: Vec<(usize, usize)>,
}

impl ExtensionAttr for Lattice {
    fn namespace(&self) -> &str {
        LATTICE_NS
    }

    fn clone_box(&self) -> Box<dyn ExtensionAttr> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct LatticeDecoder(Vec<(usize, usize)>);

impl ElementDecoder for LatticeDecoder {
    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        (name.space == LATTICE_NS && name.local == "beams")
            .then(|| Box::new(BeamsDecoder::default()) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Extension(ext) = node
            && let Some(beams) = ext.as_any().downcast_ref::<Lattice>()
        {
            self.0.extend_from_slice(&beams.beams);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Extension(Box::new(Lattice {
            beams: std::mem::take(&mut self.0),
        })))
    }
}

#[derive(Default)]
struct BeamsDecoder(Vec<(usize, usize)>);

impl ElementDecoder for BeamsDecoder {
    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        (name.space == LATTICE_NS && name.local == "beam")
            .then(|| Box::new(BeamDecoder(None)) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Extension(ext) = node
            && let Some(beam) = ext.as_any().downcast_ref::<Lattice>()
        {
            self.0.extend_from_slice(&beam.beams);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Extension(Box::new(Lattice {
            beams: std::mem::take(&mut self.0),
        })))
    }
}

struct BeamDecoder(Option<(usize, usize)>);

impl ElementDecoder for BeamDecoder {
    fn start(&mut self, _scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let vertex = |local: &str| {
            attrs
                .iter()
                .find(|a| a.name.local == local)
                .and_then(|a| a.value.parse().ok())
        };
        self.0 = vertex("v1").zip(vertex("v2"));
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        let beam = self.0.take()?;
        Some(Decoded::Extension(Box::new(Lattice { beams: vec![beam] })))
    }
}

#[test]
fn test_extension_decoder_handles_its_own_subtree() {
    let root = model_doc(
        &format!(r#"xmlns:b="{LATTICE_NS}""#),
        r#"<resources>
  <object id="1" type="model">
    <mesh>
      <vertices><vertex x="0" y="0" z="0"/><vertex x="1" y="0" z="0"/><vertex x="0" y="1" z="0"/></vertices>
      <triangles><triangle v1="0" v2="1" v3="2"/></triangles>
      <b:lattice><b:beams><b:beam v1="0" v2="1"/><b:beam v1="1" v2="2"/></b:beams></b:lattice>
    </mesh>
  </object>
</resources>
<build/>"#,
    );

    let asked = Arc::new(Mutex::new(Vec::new()));
    let mut decoder = decoder(package(&root, &[]));
    let log = Arc::clone(&asked);
    decoder.register_node_decoder_extension(LATTICE_NS, move |ctx| {
        log.lock().push(ctx.name.local.clone());
        (ctx.parent == NodeKind::Mesh && ctx.name.local == "lattice")
            .then(|| Box::new(LatticeDecoder::default()) as Box<dyn ElementDecoder>)
    });
    let mut model = Model::new();
    decoder.decode(&mut model).unwrap();

    let mesh = model.resources.find_object(1).unwrap().mesh.as_ref().unwrap();
    assert_eq!(mesh.triangles.len(), 1);
    assert_eq!(
        mesh.extensions.get::<Lattice>().unwrap().beams,
        vec![(0, 1), (1, 2)]
    );
    assert_eq!(*asked.lock(), ["lattice"]);
}

/// Records, for color group 1, whether indices 0, 1 and 2 resolve
struct ColorLookup(Arc<Mutex<Vec<[bool; 3]>>>);

impl ElementDecoder for ColorLookup {
    fn start(&mut self, scanner: &mut Scanner, _attrs: &[XmlAttr]) {
        let colors = scanner.colors();
        let found = [0, 1, 2].map(|index| colors.find(1, index).is_some());
        self.0.lock().push(found);
    }
}

#[test]
fn test_color_mapping_is_available_once_group_ends() {
    let root = model_doc(
        r#"xmlns:l="urn:example:lookup""#,
        r##"<resources>
  <m:colorgroup id="1"><m:color color="#112233"/><m:color color="#000233"/><l:lookup/></m:colorgroup>
  <l:lookup/>
</resources>
<build/>"##,
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut decoder = decoder(package(&root, &[]));
    let sink = Arc::clone(&seen);
    decoder.register_node_decoder_extension("urn:example:lookup", move |ctx| {
        (ctx.name.local == "lookup")
            .then(|| Box::new(ColorLookup(Arc::clone(&sink))) as Box<dyn ElementDecoder>)
    });
    let mut model = Model::new();
    decoder.decode(&mut model).unwrap();

    assert_eq!(*seen.lock(), [[false, false, false], [true, true, false]]);
    assert_eq!(
        model.resources.color_groups[0].colors,
        vec![(17, 34, 51, 255), (0, 2, 51, 255)]
    );
}

#[test]
fn test_model_part_relationships_are_not_preserved() {
    let root = model_doc("", "<resources/><build/>");
    let child = model_doc("", &format!("<resources>{}</resources>", mesh_object(1, "")));
    let root_part_rels = rels(&[
        ("/3D/parts/child.model", MODEL_REL),
        ("/Metadata/thumbnail.png", THUMBNAIL_REL),
    ]);
    let package_rels = root_rels();
    let data = build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", package_rels.as_str()),
        ("3D/3dmodel.model", root.as_str()),
        ("3D/_rels/3dmodel.model.rels", root_part_rels.as_str()),
        ("3D/parts/child.model", child.as_str()),
        ("Metadata/thumbnail.png", "thumb"),
    ]);

    let mut model = Model::new();
    decoder(data).decode(&mut model).unwrap();
    assert!(model.find_object("/3D/parts/child.model", 1).is_some());
    assert_eq!(model.relationships.len(), 1);
    assert_eq!(model.relationships[0].rel_type, THUMBNAIL_REL);
    assert_eq!(model.relationships[0].path, "/Metadata/thumbnail.png");
}

#[test]
fn test_stored_and_deflated_parts_decode_alike() {
    let root = model_doc(
        "",
        &format!(
            "<resources>{}</resources><build><item objectid=\"1\"/></build>",
            mesh_object(1, "")
        ),
    );
    let package_rels = root_rels();
    let entries = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", package_rels.as_str()),
        ("3D/3dmodel.model", root.as_str()),
    ];

    let mut stored = Model::new();
    decoder(build_zip_stored(&entries)).decode(&mut stored).unwrap();
    let mut deflated = Model::new();
    decoder(build_zip(&entries)).decode(&mut deflated).unwrap();

    let mesh = |model: &Model| model.resources.find_object(1).unwrap().mesh.clone().unwrap();
    assert_eq!(mesh(&stored).vertices, mesh(&deflated).vertices);
    assert_eq!(mesh(&stored).triangles.len(), 1);
    assert_eq!(stored.build.items.len(), 1);
}

#[test]
fn test_corrupted_part_fails_decode() {
    let root = model_doc("", r#"<metadata name="Title">Intact</metadata><resources/><build/>"#);
    let package_rels = root_rels();
    let mut data = build_zip_stored(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", &package_rels),
        ("3D/3dmodel.model", &root),
    ]);
    let at = data.windows(6).position(|w| w == b"Intact").unwrap();
    data[at] = b'X';

    let mut model = Model::new();
    let err = decoder(data).decode(&mut model).unwrap_err();
    assert!(err.to_string().contains("checksum mismatch"), "{}", err);
    assert!(model.metadata.is_empty());
}
