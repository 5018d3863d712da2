//! Per-part decode context

use std::collections::HashMap;
use std::sync::Arc;

use super::node::NodeMut;
use super::token::XmlAttr;
use crate::error::{ElementError, ElementErrorKind, Error};
use crate::extension::ExtensionRegistry;
use crate::model::{
    Build, ExtensionData, ExtensionSpec, FaceData, MetadataEntry, Resource, Resources, Rgba,
    Tex2Coord,
};

/// Lookup table from (group id, entry index) to a property value
///
/// A group's entries are registered in one step when the group element ends,
/// so a query never observes a partially decoded group.
#[derive(Debug, Clone)]
pub struct PropertyMapping<T> {
    groups: HashMap<usize, Vec<T>>,
}

impl<T> Default for PropertyMapping<T> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}

impl<T: Clone> PropertyMapping<T> {
    /// Register all entries of group `id`
    pub fn register(&mut self, id: usize, values: Vec<T>) {
        self.groups.insert(id, values);
    }

    /// Returns true if group `id` was registered
    pub fn has_group(&self, id: usize) -> bool {
        self.groups.contains_key(&id)
    }

    /// Entry `index` of group `id`
    pub fn find(&self, id: usize, index: usize) -> Option<&T> {
        self.groups.get(&id)?.get(index)
    }
}

/// Model-level values only the root part contributes
#[derive(Debug, Clone, Default)]
pub(crate) struct ModelHeader {
    pub(crate) unit: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) thumbnail: Option<String>,
    pub(crate) metadata: Vec<MetadataEntry>,
    pub(crate) extensions: ExtensionData,
}

/// Decode context of one part
///
/// Element decoders receive the scanner by mutable reference in every lifecycle
/// call. It collects the part's resources and warnings and keeps the first fatal
/// error, after which the state machine stops.
pub struct Scanner {
    pub(crate) resources: Resources,
    pub(crate) build: Build,
    pub(crate) namespaces: Vec<ExtensionSpec>,
    pub(crate) warnings: Vec<ElementError>,
    pub(crate) header: ModelHeader,
    pub(crate) err: Option<Error>,
    element: String,
    path: String,
    is_root: bool,
    strict: bool,
    colors: PropertyMapping<Rgba>,
    tex_coords: PropertyMapping<Tex2Coord>,
    part_references: Vec<String>,
    registry: Arc<ExtensionRegistry>,
}

impl Scanner {
    /// Create the context of the part at `path`
    pub fn new(
        path: impl Into<String>,
        is_root: bool,
        strict: bool,
        registry: Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            resources: Resources::new(),
            build: Build::new(),
            namespaces: Vec::new(),
            warnings: Vec::new(),
            header: ModelHeader::default(),
            err: None,
            element: String::new(),
            path: path.into(),
            is_root,
            strict,
            colors: PropertyMapping::default(),
            tex_coords: PropertyMapping::default(),
            part_references: Vec::new(),
            registry,
        }
    }

    /// Path of the part being decoded
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true when decoding the root part
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Returns true in strict mode
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Local name of the element being decoded
    pub fn element(&self) -> &str {
        &self.element
    }

    pub(crate) fn set_element(&mut self, local: &str) {
        self.element.clear();
        self.element.push_str(local);
    }

    /// Resources decoded so far
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Extension namespaces declared so far
    pub fn namespaces(&self) -> &[ExtensionSpec] {
        &self.namespaces
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[ElementError] {
        &self.warnings
    }

    /// Returns true once a fatal error was recorded
    pub fn has_error(&self) -> bool {
        self.err.is_some()
    }

    /// Color table of finished color groups
    pub fn colors(&self) -> &PropertyMapping<Rgba> {
        &self.colors
    }

    /// Texture coordinate table of finished texture coordinate groups
    pub fn tex_coords(&self) -> &PropertyMapping<Tex2Coord> {
        &self.tex_coords
    }

    pub(crate) fn register_colors(&mut self, id: usize, colors: Vec<Rgba>) {
        self.colors.register(id, colors);
    }

    pub(crate) fn register_tex_coords(&mut self, id: usize, coords: Vec<Tex2Coord>) {
        self.tex_coords.register(id, coords);
    }

    /// Error located at the current element
    pub fn element_error(&self, kind: ElementErrorKind) -> ElementError {
        ElementError::new(self.path.clone(), self.element.clone(), kind)
    }

    /// Record a fatal error; only the first one is kept
    pub fn fail(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Record a warning at the current element
    pub fn warn(&mut self, kind: ElementErrorKind) {
        let warning = self.element_error(kind);
        self.warnings.push(warning);
    }

    /// Record a malformed mandatory value: fatal in strict mode, a warning otherwise
    pub fn invalid(&mut self, kind: ElementErrorKind) {
        if self.strict {
            let err = self.element_error(kind);
            self.fail(Error::Element(err));
        } else {
            self.warn(kind);
        }
    }

    /// Add a resource to the part; an id already in use is always fatal
    pub fn add_resource(&mut self, resource: Resource) {
        if let Err(kind) = self.resources.add(resource) {
            let err = self.element_error(kind);
            self.fail(Error::Element(err));
        }
    }

    /// Record a reference to another part, decoded after the root part
    pub fn add_part_reference(&mut self, path: &str) {
        if path.is_empty() || path == self.path {
            return;
        }
        if !self.part_references.iter().any(|p| p == path) {
            self.part_references.push(path.to_string());
        }
    }

    /// Part references recorded so far, in first-seen order
    pub fn part_references(&self) -> &[String] {
        &self.part_references
    }

    /// Dispatch an attribute in a non-native namespace to its extension
    pub fn decode_extension_attribute(&mut self, node: NodeMut<'_>, attr: &XmlAttr) {
        let registry = Arc::clone(&self.registry);
        registry.decode_attribute(self, node, attr);
    }

    pub(crate) fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Resolve triangle properties against the groups finished so far
    ///
    /// `indices` are the per-vertex property indices after defaults were applied.
    pub(crate) fn resolve_face_data(&mut self, pid: usize, indices: [usize; 3]) -> Option<FaceData> {
        if self.colors.has_group(pid) {
            let mut colors = [crate::model::DEFAULT_COLOR; 3];
            for (slot, index) in colors.iter_mut().zip(indices) {
                match self.colors.find(pid, index) {
                    Some(color) => *slot = *color,
                    None => {
                        self.warn(ElementErrorKind::IndexOutOfBounds { group: pid, index });
                        return None;
                    }
                }
            }
            return Some(FaceData::Colors(colors));
        }

        if self.tex_coords.has_group(pid) {
            let texid = self
                .resources
                .texture2d_groups
                .iter()
                .find(|g| g.id == pid)
                .map_or(0, |g| g.texid);
            let mut coords = [Tex2Coord::new(0.0, 0.0); 3];
            for (slot, index) in coords.iter_mut().zip(indices) {
                match self.tex_coords.find(pid, index) {
                    Some(coord) => *slot = *coord,
                    None => {
                        self.warn(ElementErrorKind::IndexOutOfBounds { group: pid, index });
                        return None;
                    }
                }
            }
            return Some(FaceData::TexCoords { texid, coords });
        }

        if let Some(group) = self.resources.find_base_materials(pid) {
            let index = indices[0];
            if index >= group.materials.len() {
                self.warn(ElementErrorKind::IndexOutOfBounds { group: pid, index });
                return None;
            }
            return Some(FaceData::BaseMaterial { group: pid, index });
        }

        if !self.resources.contains_id(pid) {
            self.warn(ElementErrorKind::UnknownPropertyGroup(pid));
        }
        None
    }
}
