//! Element decoders for base materials and the materials extension

use super::core::{is_plain, parse_f64, parse_id, parse_usize, require};
use super::node::{Decoded, ElementDecoder};
use super::scanner::Scanner;
use super::token::{XmlAttr, XmlName};
use super::{NS_CORE, NS_MATERIAL};
use crate::error::ElementErrorKind;
use crate::model::{
    BaseMaterial, BaseMaterialGroup, ColorGroup, DEFAULT_COLOR, FilterMode, Resource, Rgba,
    Tex2Coord, Texture2D, Texture2DGroup, TileStyle,
};

/// Parse an sRGB color in `#RRGGBB` or `#RRGGBBAA` notation
///
/// Alpha defaults to 255 when omitted.
///
/// ```
/// use lib3mf_stream::decoder::parse_srgb;
///
/// assert_eq!(parse_srgb("#112233"), Ok((17, 34, 51, 255)));
/// assert_eq!(parse_srgb("#00023311"), Ok((0, 2, 51, 17)));
/// assert!(parse_srgb("112233").is_err());
/// ```
pub fn parse_srgb(s: &str) -> Result<Rgba, ElementErrorKind> {
    let invalid = || ElementErrorKind::InvalidColor(s.to_string());
    let hex = s.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok((byte(0)?, byte(2)?, byte(4)?, alpha))
}

fn parse_color(scanner: &mut Scanner, attr: &XmlAttr) -> Rgba {
    match parse_srgb(attr.value.trim()) {
        Ok(color) => color,
        Err(kind) => {
            scanner.invalid(kind);
            DEFAULT_COLOR
        }
    }
}

fn is_child(name: &XmlName, space: &str, local: &str) -> bool {
    name.space == space && name.local == local
}

#[derive(Default)]
pub(super) struct BaseMaterialsDecoder {
    group: Option<BaseMaterialGroup>,
}

impl ElementDecoder for BaseMaterialsDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        self.group = parse_id(scanner, attrs).map(BaseMaterialGroup::new);
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_child(name, NS_CORE, "base")
            .then(|| Box::new(BaseDecoder::default()) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let (Some(group), Decoded::Material(material)) = (self.group.as_mut(), node) {
            group.materials.push(material);
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.group
            .take()
            .map(|g| Decoded::Resource(Resource::BaseMaterials(g)))
    }
}

#[derive(Default)]
struct BaseDecoder {
    material: Option<BaseMaterial>,
}

impl ElementDecoder for BaseDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let mut name = None;
        let mut color = None;
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "name" => name = Some(attr.value.clone()),
                "displaycolor" => color = Some(parse_color(scanner, attr)),
                _ => {}
            }
        }
        require(scanner, name.is_some(), "name");
        require(scanner, color.is_some(), "displaycolor");
        self.material = Some(BaseMaterial::new(
            name.unwrap_or_default(),
            color.unwrap_or(DEFAULT_COLOR),
        ));
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.material.take().map(Decoded::Material)
    }
}

#[derive(Default)]
pub(super) struct ColorGroupDecoder {
    group: Option<ColorGroup>,
}

impl ElementDecoder for ColorGroupDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        self.group = parse_id(scanner, attrs).map(ColorGroup::new);
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_child(name, NS_MATERIAL, "color")
            .then(|| Box::new(ColorDecoder::default()) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let (Some(group), Decoded::Color(color)) = (self.group.as_mut(), node) {
            group.colors.push(color);
        }
    }

    fn end(&mut self, scanner: &mut Scanner) -> Option<Decoded> {
        let group = self.group.take()?;
        scanner.register_colors(group.id, group.colors.clone());
        Some(Decoded::Resource(Resource::ColorGroup(group)))
    }
}

#[derive(Default)]
struct ColorDecoder {
    color: Option<Rgba>,
}

impl ElementDecoder for ColorDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let attr = attrs
            .iter()
            .find(|a| is_plain(a) && a.name.local == "color");
        match attr {
            Some(attr) => self.color = Some(parse_color(scanner, attr)),
            None => {
                scanner.invalid(ElementErrorKind::MissingAttribute("color"));
                self.color = Some(DEFAULT_COLOR);
            }
        }
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.color.take().map(Decoded::Color)
    }
}

#[derive(Default)]
pub(super) struct Texture2DGroupDecoder {
    group: Option<Texture2DGroup>,
}

impl ElementDecoder for Texture2DGroupDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let id = parse_id(scanner, attrs);
        let texid = match attrs.iter().find(|a| is_plain(a) && a.name.local == "texid") {
            Some(attr) => parse_usize(scanner, attr),
            None => {
                scanner.invalid(ElementErrorKind::MissingAttribute("texid"));
                None
            }
        };
        self.group = id.map(|id| Texture2DGroup::new(id, texid.unwrap_or(0)));
    }

    fn child(&mut self, _scanner: &mut Scanner, name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        is_child(name, NS_MATERIAL, "tex2coord")
            .then(|| Box::new(Tex2CoordDecoder::default()) as Box<dyn ElementDecoder>)
    }

    fn accept(&mut self, _scanner: &mut Scanner, node: Decoded) {
        if let (Some(group), Decoded::TexCoord(coord)) = (self.group.as_mut(), node) {
            group.tex2coords.push(coord);
        }
    }

    fn end(&mut self, scanner: &mut Scanner) -> Option<Decoded> {
        let group = self.group.take()?;
        scanner.register_tex_coords(group.id, group.tex2coords.clone());
        Some(Decoded::Resource(Resource::Texture2DGroup(group)))
    }
}

#[derive(Default)]
struct Tex2CoordDecoder {
    coord: Option<Tex2Coord>,
}

impl ElementDecoder for Tex2CoordDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let (mut u, mut v) = (None, None);
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "u" => u = Some(parse_f64(scanner, attr).unwrap_or(0.0)),
                "v" => v = Some(parse_f64(scanner, attr).unwrap_or(0.0)),
                _ => {}
            }
        }
        require(scanner, u.is_some(), "u");
        require(scanner, v.is_some(), "v");
        self.coord = Some(Tex2Coord::new(u.unwrap_or(0.0), v.unwrap_or(0.0)));
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.coord.take().map(Decoded::TexCoord)
    }
}

#[derive(Default)]
pub(super) struct Texture2DDecoder {
    texture: Option<Texture2D>,
}

impl ElementDecoder for Texture2DDecoder {
    fn start(&mut self, scanner: &mut Scanner, attrs: &[XmlAttr]) {
        let id = parse_id(scanner, attrs);
        let mut texture = Texture2D::new(0, String::new(), String::new());
        let (mut has_path, mut has_type) = (false, false);
        for attr in attrs.iter().filter(|a| is_plain(a)) {
            match attr.name.local.as_str() {
                "path" => {
                    has_path = true;
                    texture.path = attr.value.clone();
                }
                "contenttype" => {
                    has_type = true;
                    texture.contenttype = attr.value.clone();
                }
                "tilestyleu" => match TileStyle::parse(&attr.value) {
                    Some(style) => texture.tilestyleu = style,
                    None => scanner.warn(invalid_value(attr)),
                },
                "tilestylev" => match TileStyle::parse(&attr.value) {
                    Some(style) => texture.tilestylev = style,
                    None => scanner.warn(invalid_value(attr)),
                },
                "filter" => match FilterMode::parse(&attr.value) {
                    Some(filter) => texture.filter = filter,
                    None => scanner.warn(invalid_value(attr)),
                },
                _ => {}
            }
        }
        require(scanner, has_path, "path");
        require(scanner, has_type, "contenttype");
        self.texture = id.map(|id| Texture2D { id, ..texture });
    }

    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        self.texture
            .take()
            .map(|t| Decoded::Resource(Resource::Texture2D(t)))
    }
}

fn invalid_value(attr: &XmlAttr) -> ElementErrorKind {
    ElementErrorKind::InvalidValue {
        attr: attr.name.local.clone(),
        value: attr.value.clone(),
    }
}

/// Recognized element that is not decoded: recorded as a warning, subtree skipped
pub(super) struct UnsupportedDecoder(pub(super) &'static str);

impl ElementDecoder for UnsupportedDecoder {
    fn start(&mut self, scanner: &mut Scanner, _attrs: &[XmlAttr]) {
        scanner.warn(ElementErrorKind::Unsupported(self.0));
    }
}
