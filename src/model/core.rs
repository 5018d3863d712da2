//! Core 3MF model types

use std::collections::{BTreeMap, HashSet};

use super::extension::{ExtensionAsset, ExtensionData, ExtensionSpec};
use super::material::{BaseMaterialGroup, ColorGroup, FaceData, Texture2D, Texture2DGroup};
use crate::error::{ElementError, ElementErrorKind};

/// A vertex in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A triangle face defined by three vertex indices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
    /// Property group id (`pid`)
    pub pid: Option<usize>,
    /// Property index of v1
    pub p1: Option<usize>,
    /// Property index of v2
    pub p2: Option<usize>,
    /// Property index of v3
    pub p3: Option<usize>,
    /// Property data resolved against the groups decoded before the mesh
    pub data: Option<FaceData>,
}

impl Triangle {
    /// Create a new triangle without properties
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self {
            v1,
            v2,
            v3,
            pid: None,
            p1: None,
            p2: None,
            p3: None,
            data: None,
        }
    }
}

/// Raw triangle mesh geometry
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// List of vertices
    pub vertices: Vec<Vertex>,
    /// List of triangles
    pub triangles: Vec<Triangle>,
    /// Extension data on the `<mesh>` element
    pub extensions: ExtensionData,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reference to another object with an optional transform
#[derive(Debug, Clone)]
pub struct Component {
    /// Referenced object ID
    pub objectid: usize,
    /// Affine transform, row-major 4x3
    pub transform: Option<[f64; 12]>,
    /// Extension data (production path and UUID among others)
    pub extensions: ExtensionData,
}

impl Component {
    /// Create a component without transform
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
            extensions: ExtensionData::default(),
        }
    }
}

/// Type of a 3D object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectType {
    /// A regular model object
    #[default]
    Model,
    /// Support structure
    Support,
    /// Solid support structure
    SolidSupport,
    /// Surface object
    Surface,
    /// Other type
    Other,
}

impl ObjectType {
    /// Parse the `type` attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "model" => Some(ObjectType::Model),
            "support" => Some(ObjectType::Support),
            "solidsupport" => Some(ObjectType::SolidSupport),
            "surface" => Some(ObjectType::Surface),
            "other" => Some(ObjectType::Other),
            _ => None,
        }
    }
}

/// An object resource: either a mesh or a list of components
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Resource ID
    pub id: usize,
    /// Object name
    pub name: Option<String>,
    /// Part number
    pub part_number: Option<String>,
    /// Object type
    pub object_type: ObjectType,
    /// Default property group id
    pub pid: Option<usize>,
    /// Default property index
    pub pindex: Option<usize>,
    /// Thumbnail path
    pub thumbnail: Option<String>,
    /// Mesh geometry
    pub mesh: Option<Mesh>,
    /// Components
    pub components: Vec<Component>,
    /// Extension data
    pub extensions: ExtensionData,
}

impl Object {
    /// Create a new object with the given ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Any resource a part can declare
#[derive(Debug, Clone)]
pub enum Resource {
    /// `<object>`
    Object(Object),
    /// `<basematerials>`
    BaseMaterials(BaseMaterialGroup),
    /// `<m:colorgroup>`
    ColorGroup(ColorGroup),
    /// `<m:texture2dgroup>`
    Texture2DGroup(Texture2DGroup),
    /// `<m:texture2d>`
    Texture2D(Texture2D),
    /// A resource decoded by an extension
    Extension(Box<dyn ExtensionAsset>),
}

impl Resource {
    /// Resource id
    pub fn id(&self) -> usize {
        match self {
            Resource::Object(o) => o.id,
            Resource::BaseMaterials(g) => g.id,
            Resource::ColorGroup(g) => g.id,
            Resource::Texture2DGroup(g) => g.id,
            Resource::Texture2D(t) => t.id,
            Resource::Extension(a) => a.id(),
        }
    }
}

/// A borrowed non-object resource, as handed to validators
#[derive(Debug, Clone, Copy)]
pub enum AssetRef<'a> {
    /// Base materials group
    BaseMaterials(&'a BaseMaterialGroup),
    /// Color group
    ColorGroup(&'a ColorGroup),
    /// Texture coordinate group
    Texture2DGroup(&'a Texture2DGroup),
    /// Texture
    Texture2D(&'a Texture2D),
    /// Extension resource
    Extension(&'a dyn ExtensionAsset),
}

impl AssetRef<'_> {
    /// Resource id
    pub fn id(&self) -> usize {
        match self {
            AssetRef::BaseMaterials(g) => g.id,
            AssetRef::ColorGroup(g) => g.id,
            AssetRef::Texture2DGroup(g) => g.id,
            AssetRef::Texture2D(t) => t.id,
            AssetRef::Extension(a) => a.id(),
        }
    }

    /// Element name used for positional context in errors
    pub fn element_name(&self) -> &'static str {
        match self {
            AssetRef::BaseMaterials(_) => "basematerials",
            AssetRef::ColorGroup(_) => "colorgroup",
            AssetRef::Texture2DGroup(_) => "texture2dgroup",
            AssetRef::Texture2D(_) => "texture2d",
            AssetRef::Extension(_) => "asset",
        }
    }
}

/// Resources of one part
///
/// Ids are unique across all resource kinds. Use [`Resources::add`] to keep the
/// id index in sync; pushing directly into the lists bypasses the check.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// List of objects
    pub objects: Vec<Object>,
    /// List of base material groups
    pub base_material_groups: Vec<BaseMaterialGroup>,
    /// List of color groups (materials extension)
    pub color_groups: Vec<ColorGroup>,
    /// List of texture2d groups (materials extension)
    pub texture2d_groups: Vec<Texture2DGroup>,
    /// List of texture2d resources (materials extension)
    pub texture2d_resources: Vec<Texture2D>,
    /// Resources decoded by extensions
    pub extension_assets: Vec<Box<dyn ExtensionAsset>>,
    ids: HashSet<usize>,
}

impl Resources {
    /// Create a new empty resources section
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, rejecting an id that is already in use
    pub fn add(&mut self, resource: Resource) -> Result<(), ElementErrorKind> {
        let id = resource.id();
        if !self.ids.insert(id) {
            return Err(ElementErrorKind::DuplicatedId(id));
        }
        match resource {
            Resource::Object(o) => self.objects.push(o),
            Resource::BaseMaterials(g) => self.base_material_groups.push(g),
            Resource::ColorGroup(g) => self.color_groups.push(g),
            Resource::Texture2DGroup(g) => self.texture2d_groups.push(g),
            Resource::Texture2D(t) => self.texture2d_resources.push(t),
            Resource::Extension(a) => self.extension_assets.push(a),
        }
        Ok(())
    }

    /// Returns true if a resource with this id was added
    pub fn contains_id(&self, id: usize) -> bool {
        self.ids.contains(&id)
    }

    /// Number of resources added through [`Resources::add`]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no resources were added
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Find an object by id
    pub fn find_object(&self, id: usize) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Find a base materials group by id
    pub fn find_base_materials(&self, id: usize) -> Option<&BaseMaterialGroup> {
        self.base_material_groups.iter().find(|g| g.id == id)
    }

    /// Find a texture by id
    pub fn find_texture2d(&self, id: usize) -> Option<&Texture2D> {
        self.texture2d_resources.iter().find(|t| t.id == id)
    }

    /// Find any non-object resource by id
    pub fn find_asset(&self, id: usize) -> Option<AssetRef<'_>> {
        self.assets().find(|a| a.id() == id)
    }

    /// Iterate over all non-object resources
    pub fn assets(&self) -> impl Iterator<Item = AssetRef<'_>> {
        self.base_material_groups
            .iter()
            .map(AssetRef::BaseMaterials)
            .chain(self.color_groups.iter().map(AssetRef::ColorGroup))
            .chain(self.texture2d_groups.iter().map(AssetRef::Texture2DGroup))
            .chain(self.texture2d_resources.iter().map(AssetRef::Texture2D))
            .chain(
                self.extension_assets
                    .iter()
                    .map(|a| AssetRef::Extension(a.as_ref())),
            )
    }
}

/// A single item to be built
#[derive(Debug, Clone)]
pub struct BuildItem {
    /// Referenced object ID
    pub objectid: usize,
    /// Affine transform, row-major 4x3
    pub transform: Option<[f64; 12]>,
    /// Part number
    pub part_number: Option<String>,
    /// Extension data (production path and UUID among others)
    pub extensions: ExtensionData,
}

impl BuildItem {
    /// Create a new build item
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
            part_number: None,
            extensions: ExtensionData::default(),
        }
    }
}

/// Build instructions
#[derive(Debug, Clone, Default)]
pub struct Build {
    /// Items in document order
    pub items: Vec<BuildItem>,
    /// Extension data on the `<build>` element
    pub extensions: ExtensionData,
}

impl Build {
    /// Create a new empty build section
    pub fn new() -> Self {
        Self::default()
    }
}

/// Metadata entry
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Metadata name
    pub name: String,
    /// Metadata value
    pub value: String,
    /// Declared value type
    pub value_type: Option<String>,
    /// Preserve the entry when editing
    pub preserve: Option<bool>,
}

/// A typed link from a part to another file in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Absolute target path
    pub path: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Relationship id
    pub id: String,
}

/// A file preserved from the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Absolute path in the package
    pub path: String,
    /// Content type
    pub content_type: String,
    /// File content
    pub data: Vec<u8>,
}

/// Resources and relationships decoded from one non-root part
#[derive(Debug, Clone, Default)]
pub struct ChildModel {
    /// Resources of the part
    pub resources: Resources,
    /// Relationships of the part
    pub relationships: Vec<Relationship>,
}

/// A decoded 3MF package
#[derive(Debug, Clone)]
pub struct Model {
    /// Path of the root part
    pub path: String,
    /// Unit of measurement (e.g., "millimeter", "inch")
    pub unit: String,
    /// Document language (`xml:lang`)
    pub language: Option<String>,
    /// Thumbnail path from the model element
    pub thumbnail: Option<String>,
    /// Metadata entries
    pub metadata: Vec<MetadataEntry>,
    /// Resources of the root part
    pub resources: Resources,
    /// Build section
    pub build: Build,
    /// Preserved files, unique by path
    pub attachments: Vec<Attachment>,
    /// Relationships of the root part
    pub relationships: Vec<Relationship>,
    /// Non-root parts keyed by path
    pub childs: BTreeMap<String, ChildModel>,
    /// Extension namespaces declared by the root part
    pub namespaces: Vec<ExtensionSpec>,
    /// Extension data on the `<model>` element
    pub extensions: ExtensionData,
    /// Recoverable decode problems, root part first then child parts
    pub warnings: Vec<ElementError>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self {
            path: String::new(),
            unit: "millimeter".to_string(),
            language: None,
            thumbnail: None,
            metadata: Vec::new(),
            resources: Resources::new(),
            build: Build::new(),
            attachments: Vec::new(),
            relationships: Vec::new(),
            childs: BTreeMap::new(),
            namespaces: Vec::new(),
            extensions: ExtensionData::default(),
            warnings: Vec::new(),
        }
    }

    /// Path of the root part, or the default model path when unset
    pub fn root_path(&self) -> &str {
        if self.path.is_empty() {
            crate::opc::DEFAULT_MODEL_PATH
        } else {
            &self.path
        }
    }

    /// Resources of the part at `path`; empty or root path selects the root
    pub fn find_resources(&self, path: &str) -> Option<&Resources> {
        if path.is_empty() || path == self.root_path() {
            Some(&self.resources)
        } else {
            self.childs.get(path).map(|c| &c.resources)
        }
    }

    /// Find an object in the part at `path`
    pub fn find_object(&self, path: &str, id: usize) -> Option<&Object> {
        self.find_resources(path)?.find_object(id)
    }

    /// Get metadata value by name
    pub fn get_metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }

    /// Find an attachment by path
    pub fn find_attachment(&self, path: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.path == path)
    }
}
