//! Element decoders for the core namespace

use std::mem;

use super::material::{
    BaseMaterialsDecoder, ColorGroupDecoder, Texture2DDecoder, Texture2DGroupDecoder,
    UnsupportedDecoder,
};
use super::node::{Decoded, ElementDecoder, NodeKind, NodeMut};
use super::scanner::Scanner;
use super::token::{NS_XML, XmlAttr, XmlName};
use super::{NS_CORE, NS_MATERIAL, is_native_namespace};
use crate::error::{ElementErrorKind, Error};
use crate::model::{
    Build, BuildItem, Component, ExtensionData, ExtensionSpec, Mesh, MetadataEntry, Object,
    ObjectType, Resource, Triangle, Vertex,
};

const UNITS: [&str; 6] = ["micron", "millimeter", "centimeter", "inch", "foot", "meter"];

fn is_core(name: &XmlName, local: &str) -> bool {
    name.space == NS_CORE && name.local == local
}

/// Unprefixed attribute
pub(super) fn is_plain(attr: &XmlAttr) -> bool {
    attr.name.space.is_empty()
}

/// Attribute that belongs to a non-native namespace
pub(super) fn is_extension_attr(attr: &XmlAttr) -> bool {
    let space = attr.name.space.as_str();
    !space.is_empty() && space != "xmlns" && space != NS_XML && !is_native_namespace(space)
}

fn invalid_value(attr: &XmlAttr) -> ElementErrorKind {
    ElementErrorKind::InvalidValue {
        attr: attr.name.local.clone(),
        value: attr.value.clone(),
    }
}

/// Mandatory `id` attribute: exactly one, a non-negative integer
pub(super) fn parse_id(scanner: &mut Scanner, attrs: &[XmlAttr]) -> Option<usize> {
    let mut ids = attrs.iter().filter(|a| is_plain(a) && a.name.local == "id");
    let first = ids.next();
    if ids.next().is_some() {
        scanner.invalid(ElementErrorKind::DuplicatedAttribute("id"));
        return None;
    }
    match first {
        Some(attr) => parse_usize(scanner, attr),
        None => {
            scanner.invalid(ElementErrorKind::MissingAttribute("id"));
            None
        }
    }
}

/// Mandatory integer value
pub(super) fn parse_usize(scanner: &mut Scanner, attr: &XmlAttr) -> Option<usize> {
    match attr.value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            scanner.invalid(invalid_value(attr));
            None
        }
    }
}

/// Optional integer value; malformed values are always only a warning
pub(super) fn parse_optional_usize(scanner: &mut Scanner, attr: &XmlAttr) -> Option<usize> {
    match attr.value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            scanner.warn(invalid_value(attr));
            None
        }
    }
}

/// Mandatory floating-point value
pub(super) fn parse_f64(scanner: &mut Scanner, attr: &XmlAttr) -> Option<f64> {
    match attr.value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            scanner.invalid(invalid_value(attr));
            None
        }
    }
}

/// Report mandatory attributes that were not seen
pub(super) fn require(scanner: &mut Scanner, found: bool, name: &'static str) {
    if !found {
        scanner.invalid(ElementErrorKind::MissingAttribute(name));
    }
}

/// Twelve space separated numbers, row-major 4x3
pub(crate) fn parse_matrix(value: &str) -> Option<[f64; 12]> {
    let mut matrix = [0.0; 12];
    let mut values = value.split_whitespace();
    for slot in matrix.iter_mut() {
        *slot = values.next()?.parse::<f64>().ok().filter(|v| v.is_finite())?;
    }
    if values.next().is_some() {
        return None;
    }
    Some(matrix)
}

fn parse_transform(scanner: &mut Scanner, attr: &XmlAttr) -> Option<[f64; 12]> {
    let matrix = parse_matrix(&attr.value);
    if matrix.is_none() {
        scanner.invalid(invalid_value(attr));
    }
    matrix
}

#[derive(Default)]
pub(crate) struct ModelDecoder {
    extensions: ExtensionData,
}

impl ModelDecoder {
    fn check_required(&self, scanner: &mut Scanner, required: &str, prefixes: &[(String, String)]) {
        for prefix in required.split_whitespace() {
            let Some((_, namespace)) = prefixes.iter().find(|(p, _)| p == prefix) else {
                scanner.invalid(ElementErrorKind::InvalidValue {
                    attr: "requiredextensions".to_string(),
                    value: prefix.to_string(),
                });
                continue;
            };
            if let Some(spec) = scanner
                .namespaces
                .iter_mut()
                .find(|s| s.namespace == *namespace)
            {
                spec.is_required = true;
            }
            if is_native_namespace(namespace) || scanner.registry().contains(namespace) {
                continue;
            }
            if scanner.strict() {
                scanner.fail(Error::UnsupportedExtension(namespace.clone()));
            } else {
                scanner.warn(ElementErrorKind::UnsupportedExtension(namespace.clone()));
            }
        }
    }
}

impl ElementDecoder for ModelDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Model
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut prefixes = Vec::new();
        let mut required = None;
        for attr in attrs {
            match (attr.name.space.as_str(), attr.name.local.as_str()) {
                ("xmlns", prefix) => {
                    prefixes.push((prefix.to_string(), attr.value.clone()));
                    if attr.value != NS_CORE {
                        scanner
                            .namespaces
                            .push(ExtensionSpec::new(attr.value.clone(), prefix));
                    }
                }
                ("", "unit") => {
                    if UNITS.contains(&attr.value.as_str()) {
                        scanner.header.unit = Some(attr.value.clone());
                    } else {
                        scanner.invalid(invalid_value(attr));
                    }
                }
                ("", "requiredextensions") => required = Some(attr.value.as_str()),
                ("", "thumbnail") => scanner.header.thumbnail = Some(attr.value.clone()),
                (NS_XML, "lang") => scanner.header.language = Some(attr.value.clone()),
                _ => {}
            }
        }
        if let Some(required) = required {
            self.check_required(scanner, required, &prefixes);
        }
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Model(&mut self.extensions), attr);
        }
    }

    fn child(&mut self, scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        if is_core(name, "resources") {
            Some(Box::new(ResourcesDecoder))
        } else if is_core(name, "build") && scanner.is_root() {
            Some(Box::new(BuildDecoder::default()))
        } else if is_core(name, "metadata") {
            Some(Box::new(MetadataDecoder::default()))
        } else {
            None
        }
    }

    fn accept(&mut self, scanner: &mut Scanner, node: Decoded) {
        match node {
            Decoded::Metadata(entry) => scanner.header.metadata.push(entry),
            Decoded::Extension(ext) => self.extensions.insert_boxed(ext),
            _ => {}
        }
    }

    fn end(&mut self, scanner: &mut Scanner) -> Option<Decoded> {
        scanner.header.extensions = mem::take(&mut self.extensions);
        None
    }
}

struct ResourcesDecoder;

impl ElementDecoder for ResourcesDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Resources
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        let decoder: Box<dyn ElementDecoder> = match (name.space.as_str(), name.local.as_str()) {
            (NS_CORE, "object") => Box::new(ObjectDecoder::default()),
            (NS_CORE, "basematerials") => Box::new(BaseMaterialsDecoder::default()),
            (NS_MATERIAL, "colorgroup") => Box::new(ColorGroupDecoder::default()),
            (NS_MATERIAL, "texture2dgroup") => Box::new(Texture2DGroupDecoder::default()),
            (NS_MATERIAL, "texture2d") => Box::new(Texture2DDecoder::default()),
            (NS_MATERIAL, "compositematerials") => {
                Box::new(UnsupportedDecoder("composite materials extension"))
            }
            (NS_MATERIAL, "multiproperties") => {
                Box::new(UnsupportedDecoder("multi properties extension"))
            }
            _ => return None,
        };
        Some(decoder)
    }

    fn accept(&mut self, scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Resource(resource) = node {
            scanner.add_resource(resource);
        }
    }
}

#[derive(Default)]
struct ObjectDecoder {
    object: Object,
    valid: bool,
}

impl ElementDecoder for ObjectDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Object
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        if let Some(id) = parse_id(scanner, attrs) {
            self.object.id = id;
            self.valid = true;
        }
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "name" => self.object.name = Some(attr.value.clone()),
                "partnumber" => self.object.part_number = Some(attr.value.clone()),
                "thumbnail" => self.object.thumbnail = Some(attr.value.clone()),
                "type" => match ObjectType::parse(&attr.value) {
                    Some(t) => self.object.object_type = t,
                    None => scanner.warn(invalid_value(attr)),
                },
                "pid" => self.object.pid = parse_optional_usize(scanner, attr),
                "pindex" => self.object.pindex = parse_optional_usize(scanner, attr),
                _ => {}
            }
        }
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Object(&mut self.object), attr);
        }
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        if is_core(name, "mesh") {
            Some(Box::new(MeshDecoder {
                mesh: Mesh::new(),
                pid: self.object.pid,
                pindex: self.object.pindex,
            }))
        } else if is_core(name, "components") {
            Some(Box::new(ComponentsDecoder::default()))
        } else {
            None
        }
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        match node {
            Decoded::Mesh(mesh) => self.object.mesh = Some(mesh),
            Decoded::Components(components) => self.object.components = components,
            Decoded::Extension(ext) => self.object.extensions.insert_boxed(ext),
            _ => {}
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.valid
            .then(|| Decoded::Resource(Resource::Object(mem::take(&mut self.object))))
    }
}

struct MeshDecoder {
    mesh: Mesh,
    pid: Option<usize>,
    pindex: Option<usize>,
}

impl ElementDecoder for MeshDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Mesh
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Mesh(&mut self.mesh), attr);
        }
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        if is_core(name, "vertices") {
            Some(Box::new(VerticesDecoder::default()))
        } else if is_core(name, "triangles") {
            Some(Box::new(TrianglesDecoder {
                triangles: Vec::new(),
                pid: self.pid,
                pindex: self.pindex,
            }))
        } else {
            None
        }
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        match node {
            Decoded::Vertices(vertices) => self.mesh.vertices = vertices,
            Decoded::Triangles(triangles) => self.mesh.triangles = triangles,
            Decoded::Extension(ext) => self.mesh.extensions.insert_boxed(ext),
            _ => {}
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Mesh(mem::take(&mut self.mesh)))
    }
}

#[derive(Default)]
struct VerticesDecoder {
    vertices: Vec<Vertex>,
}

impl ElementDecoder for VerticesDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Vertices
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_core(name, "vertex").then(|| Box::new(VertexDecoder::default()) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Vertex(vertex) = node {
            self.vertices.push(vertex);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Vertices(mem::take(&mut self.vertices)))
    }
}

#[derive(Default)]
struct VertexDecoder {
    vertex: Option<Vertex>,
}

impl ElementDecoder for VertexDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut coords = [None; 3];
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            let slot = match attr.name.local.as_str() {
                "x" => 0,
                "y" => 1,
                "z" => 2,
                _ => continue,
            };
            coords[slot] = Some(parse_f64(scanner, attr).unwrap_or(0.0));
        }
        for (coord, name) in coords.iter().zip(["x", "y", "z"]) {
            require(scanner, coord.is_some(), name);
        }
        let [x, y, z] = coords.map(|c| c.unwrap_or(0.0));
        self.vertex = Some(Vertex::new(x, y, z));
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.vertex.take().map(Decoded::Vertex)
    }
}

struct TrianglesDecoder {
    triangles: Vec<Triangle>,
    pid: Option<usize>,
    pindex: Option<usize>,
}

impl ElementDecoder for TrianglesDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Triangles
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_core(name, "triangle").then(|| {
            Box::new(TriangleDecoder {
                triangle: None,
                pid: self.pid,
                pindex: self.pindex,
            }) as Box<dyn ElementDecoder>
        })
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Triangle(triangle) = node {
            self.triangles.push(triangle);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Triangles(mem::take(&mut self.triangles)))
    }
}

struct TriangleDecoder {
    triangle: Option<Triangle>,
    pid: Option<usize>,
    pindex: Option<usize>,
}

impl ElementDecoder for TriangleDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut vertices = [None; 3];
        let mut triangle = Triangle::new(0, 0, 0);
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "v1" => vertices[0] = Some(parse_usize(scanner, attr).unwrap_or(0)),
                "v2" => vertices[1] = Some(parse_usize(scanner, attr).unwrap_or(0)),
                "v3" => vertices[2] = Some(parse_usize(scanner, attr).unwrap_or(0)),
                "pid" => triangle.pid = parse_optional_usize(scanner, attr),
                "p1" => triangle.p1 = parse_optional_usize(scanner, attr),
                "p2" => triangle.p2 = parse_optional_usize(scanner, attr),
                "p3" => triangle.p3 = parse_optional_usize(scanner, attr),
                _ => {}
            }
        }
        for (v, name) in vertices.iter().zip(["v1", "v2", "v3"]) {
            require(scanner, v.is_some(), name);
        }
        [triangle.v1, triangle.v2, triangle.v3] = vertices.map(|v| v.unwrap_or(0));

        if let Some(pid) = triangle.pid.or(self.pid)
            && let Some(p1) = triangle.p1.or(self.pindex)
        {
            let indices = [p1, triangle.p2.unwrap_or(p1), triangle.p3.unwrap_or(p1)];
            triangle.data = scanner.resolve_face_data(pid, indices);
        }
        self.triangle = Some(triangle);
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.triangle.take().map(Decoded::Triangle)
    }
}

#[derive(Default)]
struct ComponentsDecoder {
    components: Vec<Component>,
}

impl ElementDecoder for ComponentsDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Components
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_core(name, "component").then(|| {
            Box::new(ComponentDecoder {
                component: Component::new(0),
            }) as Box<dyn ElementDecoder>
        })
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Component(component) = node {
            self.components.push(component);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Components(mem::take(&mut self.components)))
    }
}

struct ComponentDecoder {
    component: Component,
}

impl ElementDecoder for ComponentDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Component
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut has_object = false;
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "objectid" => {
                    has_object = true;
                    self.component.objectid = parse_usize(scanner, attr).unwrap_or(0);
                }
                "transform" => self.component.transform = parse_transform(scanner, attr),
                _ => {}
            }
        }
        require(scanner, has_object, "objectid");
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Component(&mut self.component), attr);
        }
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Extension(ext) = node {
            self.component.extensions.insert_boxed(ext);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Component(mem::replace(
            &mut self.component,
            Component::new(0),
        )))
    }
}

#[derive(Default)]
struct BuildDecoder {
    build: Build,
}

impl ElementDecoder for BuildDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Build
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Build(&mut self.build), attr);
        }
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_core(name, "item").then(|| {
            Box::new(ItemDecoder {
                item: BuildItem::new(0),
            }) as Box<dyn ElementDecoder>
        })
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        match node {
            Decoded::Item(item) => self.build.items.push(item),
            Decoded::Extension(ext) => self.build.extensions.insert_boxed(ext),
            _ => {}
        }
    }

    fn end(&mut self, scanner: &mut Scanner) -> Option<Decoded> {
        scanner.build = mem::take(&mut self.build);
        None
    }
}

struct ItemDecoder {
    item: BuildItem,
}

impl ElementDecoder for ItemDecoder {
    fn kind(&self) -> NodeKind {
        NodeKind::Item
    }

    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut has_object = false;
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "objectid" => {
                    has_object = true;
                    self.item.objectid = parse_usize(scanner, attr).unwrap_or(0);
                }
                "transform" => self.item.transform = parse_transform(scanner, attr),
                "partnumber" => self.item.part_number = Some(attr.value.clone()),
                _ => {}
            }
        }
        require(scanner, has_object, "objectid");
        for attr in attrs.iter().filter(|a| is_extension_attr(a)) {
            scanner.decode_extension_attribute(NodeMut::Item(&mut self.item), attr);
        }
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let Decoded::Extension(ext) = node {
            self.item.extensions.insert_boxed(ext);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        Some(Decoded::Item(mem::replace(&mut self.item, BuildItem::new(0))))
    }
}

#[derive(Default)]
struct MetadataDecoder {
    entry: Option<MetadataEntry>,
}

impl ElementDecoder for MetadataDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut entry = MetadataEntry {
            name: String::new(),
            value: String::new(),
            value_type: None,
            preserve: None,
        };
        let mut has_name = false;
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "name" => {
                    has_name = true;
                    entry.name = attr.value.clone();
                }
                "type" => entry.value_type = Some(attr.value.clone()),
                "preserve" => match attr.value.as_str() {
                    "1" | "true" => entry.preserve = Some(true),
                    "0" | "false" => entry.preserve = Some(false),
                    _ => scanner.warn(invalid_value(attr)),
                },
                _ => {}
            }
        }
        require(scanner, has_name, "name");
        self.entry = Some(entry);
    }

    fn char_data(&mut self, _scanner: &mut Scanner, text: &str) {
        if let Some(entry) = self.entry.as_mut() {
            entry.value.push_str(text);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.entry.take().map(Decoded::Metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matrix() {
        assert_eq!(
            parse_matrix("1 0 0 0 1 0 0 0 1 10 20 30"),
            Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 10.0, 20.0, 30.0])
        );
        assert_eq!(parse_matrix("1 0 0"), None);
        assert_eq!(parse_matrix("1 0 0 0 1 0 0 0 1 10 20 30 40"), None);
        assert_eq!(parse_matrix("1 0 0 0 1 0 0 0 1 10 20 abc"), None);
        assert_eq!(parse_matrix(""), None);
    }

    #[test]
    fn test_extension_attr_classification() {
        let plain = XmlAttr::new(XmlName::new("", "id"), "1");
        let decl = XmlAttr::new(XmlName::new("xmlns", "p"), "urn:p");
        let lang = XmlAttr::new(XmlName::new(NS_XML, "lang"), "en");
        let material = XmlAttr::new(XmlName::new(NS_MATERIAL, "x"), "1");
        let vendor = XmlAttr::new(XmlName::new("urn:vendor", "tag"), "1");
        assert!(is_plain(&plain));
        assert!(!is_extension_attr(&plain));
        assert!(!is_extension_attr(&decl));
        assert!(!is_extension_attr(&lang));
        assert!(!is_extension_attr(&material));
        assert!(is_extension_attr(&vendor));
    }
}
