//! Element decoder lifecycle
//!
//! Each XML element being decoded is handled by one [`ElementDecoder`] on the
//! state machine's stack. Decoders report problems through the [`Scanner`] and hand
//! their finished node to the parent decoder as a [`Decoded`] value.

use super::scanner::Scanner;
use super::token::{XmlAttr, XmlName};
use crate::model::{
    BaseMaterial, Build, BuildItem, Component, ExtensionAttr, ExtensionData, Mesh, MetadataEntry,
    Object, Resource, Rgba, Tex2Coord, Triangle, Vertex,
};

/// Kind of the node an element decoder produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document level, outside `<model>`
    Root,
    /// `<model>`
    Model,
    /// `<resources>`
    Resources,
    /// `<build>`
    Build,
    /// `<item>`
    Item,
    /// `<object>`
    Object,
    /// `<mesh>`
    Mesh,
    /// `<vertices>`
    Vertices,
    /// `<triangles>`
    Triangles,
    /// `<components>`
    Components,
    /// `<component>`
    Component,
    /// Anything else, extension elements included
    Other,
}

/// A finished node handed from a child decoder to its parent
#[derive(Debug)]
pub enum Decoded {
    /// A resource for the enclosing `<resources>`
    Resource(Resource),
    /// Mesh of an object
    Mesh(Mesh),
    /// Vertex list of a mesh
    Vertices(Vec<Vertex>),
    /// Single vertex
    Vertex(Vertex),
    /// Triangle list of a mesh
    Triangles(Vec<Triangle>),
    /// Single triangle
    Triangle(Triangle),
    /// Component list of an object
    Components(Vec<Component>),
    /// Single component
    Component(Component),
    /// Build item
    Item(BuildItem),
    /// Metadata entry
    Metadata(MetadataEntry),
    /// Base material entry
    Material(BaseMaterial),
    /// Color group entry
    Color(Rgba),
    /// Texture coordinate group entry
    TexCoord(Tex2Coord),
    /// Extension data for the parent node
    Extension(Box<dyn ExtensionAttr>),
}

/// Mutable view of the node an extension attribute belongs to
#[derive(Debug)]
pub enum NodeMut<'a> {
    /// Extension data of `<model>`
    Model(&'a mut ExtensionData),
    /// `<build>`
    Build(&'a mut Build),
    /// `<item>`
    Item(&'a mut BuildItem),
    /// `<object>`
    Object(&'a mut Object),
    /// `<component>`
    Component(&'a mut Component),
    /// `<mesh>`
    Mesh(&'a mut Mesh),
}

impl NodeMut<'_> {
    /// Kind of the node
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMut::Model(_) => NodeKind::Model,
            NodeMut::Build(_) => NodeKind::Build,
            NodeMut::Item(_) => NodeKind::Item,
            NodeMut::Object(_) => NodeKind::Object,
            NodeMut::Component(_) => NodeKind::Component,
            NodeMut::Mesh(_) => NodeKind::Mesh,
        }
    }

    /// Extension data of the node
    pub fn extensions(&mut self) -> &mut ExtensionData {
        match self {
            NodeMut::Model(ext) => ext,
            NodeMut::Build(b) => &mut b.extensions,
            NodeMut::Item(i) => &mut i.extensions,
            NodeMut::Object(o) => &mut o.extensions,
            NodeMut::Component(c) => &mut c.extensions,
            NodeMut::Mesh(m) => &mut m.extensions,
        }
    }
}

/// Decoder of one element
///
/// All methods default to doing nothing, so leaf decoders only implement what
/// they need. Errors are reported through the scanner; once the scanner holds a
/// fatal error the state machine stops.
pub trait ElementDecoder {
    /// Kind of the node this decoder produces, passed to extension factories as
    /// the parent context of child elements
    fn kind(&self) -> NodeKind {
        NodeKind::Other
    }

    /// Called with the element's attributes right after it is pushed
    fn start(&mut self, _scanner: &mut Scanner, _attrs: &[XmlAttr]) {}

    /// Decoder for a child element, asked before any extension factory
    ///
    /// `None` skips a child in a native namespace. A child in any other namespace
    /// goes to the extension registry next and is skipped when no factory takes it.
    fn child(&mut self, _scanner: &mut Scanner, _name: &XmlName) -> Option<Box<dyn ElementDecoder>> {
        None
    }

    /// Character data inside the element
    fn char_data(&mut self, _scanner: &mut Scanner, _text: &str) {}

    /// Called when the element ends, before the parent resumes
    fn end(&mut self, _scanner: &mut Scanner) -> Option<Decoded> {
        None
    }

    /// Receives the node finished by a child decoder
    fn accept(&mut self, _scanner: &mut Scanner, _node: Decoded) {}
}
