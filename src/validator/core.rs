//! Checks of the 3MF core

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use super::{Element, ValidationError, ValidationErrors, Validator};
use crate::model::{AssetRef, BuildItem, Mesh, Model, Object, ObjectType, Resources};

/// Checks every model must pass regardless of extensions
///
/// - build items reference existing objects that are not of type `other`
/// - resources have an id
/// - objects hold either a mesh or components, and their default property group
///   exists
/// - meshes have at least three vertices and in-bounds triangle indices
/// - components reference existing objects without forming a cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreValidator;

impl CoreValidator {
    /// Like [`Validator::validate`], reusing the component graph of a whole
    /// validation pass
    pub(crate) fn validate_with(
        &self,
        model: &Model,
        path: &str,
        element: Element<'_>,
        cycles: &ComponentCycles<'_>,
    ) -> ValidationErrors {
        match element {
            Element::Model(model) => validate_build(model),
            Element::Asset(asset) => validate_asset(asset),
            Element::Object(object) => validate_object(model, path, object, cycles),
        }
    }
}

impl Validator for CoreValidator {
    fn validate(&self, model: &Model, path: &str, element: Element<'_>) -> ValidationErrors {
        self.validate_with(model, path, element, &ComponentCycles::new(model))
    }
}

fn validate_build(model: &Model) -> ValidationErrors {
    let mut build = ValidationErrors::new();
    for (i, item) in model.build.items.iter().enumerate() {
        build.push_indexed("item", i, validate_item(model, item));
    }
    let mut errs = ValidationErrors::new();
    errs.push_wrapped("build", build);
    errs
}

fn validate_item(model: &Model, item: &BuildItem) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    let path = item.extensions.object_path().unwrap_or_default();
    match model.find_object(path, item.objectid) {
        None => errs.push(ValidationError::MissingResource(item.objectid)),
        Some(object) if object.object_type == ObjectType::Other => errs.push(ValidationError::Custom(
            format!("build item references object {} of type other", object.id),
        )),
        Some(_) => {}
    }
    errs
}

fn validate_asset(asset: AssetRef<'_>) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if asset.id() == 0 {
        errs.push(ValidationError::MissingId);
    }
    if let AssetRef::BaseMaterials(group) = asset
        && group.materials.is_empty()
    {
        errs.push(ValidationError::EmptyResourceProps);
    }
    errs
}

/// Number of entries a property index may address, when known
fn property_count(resources: &Resources, pid: usize) -> Option<usize> {
    match resources.find_asset(pid)? {
        AssetRef::BaseMaterials(g) => Some(g.materials.len()),
        AssetRef::ColorGroup(g) => Some(g.colors.len()),
        AssetRef::Texture2DGroup(g) => Some(g.tex2coords.len()),
        AssetRef::Texture2D(_) | AssetRef::Extension(_) => None,
    }
}

fn validate_object(
    model: &Model,
    path: &str,
    object: &Object,
    cycles: &ComponentCycles<'_>,
) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if object.id == 0 {
        errs.push(ValidationError::MissingId);
    }

    let resources = model.find_resources(path);
    if let (Some(pid), Some(resources)) = (object.pid, resources) {
        if resources.find_asset(pid).is_none() {
            errs.push(ValidationError::MissingResource(pid));
        } else if let (Some(index), Some(count)) = (object.pindex, property_count(resources, pid))
            && index >= count
        {
            errs.push(ValidationError::IndexOutOfBounds(index));
        }
    }

    match (&object.mesh, object.components.is_empty()) {
        (Some(mesh), true) => errs.extend(validate_mesh(mesh)),
        (None, false) => {
            if object.pid.is_some() || object.pindex.is_some() {
                errs.push(ValidationError::Custom(
                    "object with components cannot have pid or pindex".to_string(),
                ));
            }
            errs.extend(validate_components(model, path, object, cycles));
        }
        _ => errs.push(ValidationError::InvalidObject),
    }
    errs
}

fn validate_mesh(mesh: &Mesh) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    let count = mesh.vertices.len();
    if count < 3 {
        errs.push(ValidationError::InsufficientVertices);
    }
    for (i, triangle) in mesh.triangles.iter().enumerate() {
        let mut tri = ValidationErrors::new();
        for v in [triangle.v1, triangle.v2, triangle.v3] {
            if v >= count {
                tri.push(ValidationError::IndexOutOfBounds(v));
            }
        }
        errs.push_indexed("triangle", i, tri);
    }
    errs
}

fn validate_components(
    model: &Model,
    path: &str,
    object: &Object,
    cycles: &ComponentCycles<'_>,
) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    for (i, component) in object.components.iter().enumerate() {
        let mut comp = ValidationErrors::new();
        let target = component.extensions.object_path().unwrap_or(path);
        if model.find_object(target, component.objectid).is_none() {
            comp.push(ValidationError::MissingResource(component.objectid));
        }
        errs.push_indexed("component", i, comp);
    }
    if cycles.contains(part_key(model, path), object.id) {
        errs.push(ValidationError::RecursiveComponent);
    }
    errs
}

fn part_key<'a>(model: &'a Model, path: &'a str) -> &'a str {
    if path.is_empty() { model.root_path() } else { path }
}

const UNVISITED: usize = usize::MAX;

/// Objects that reach themselves through their components, by part path
///
/// Computed on first use with one pass of Tarjan's strongly connected components
/// over the objects of every part.
pub(crate) struct ComponentCycles<'a> {
    model: &'a Model,
    recursive: OnceCell<HashMap<&'a str, HashSet<usize>>>,
}

impl<'a> ComponentCycles<'a> {
    pub(crate) fn new(model: &'a Model) -> Self {
        Self {
            model,
            recursive: OnceCell::new(),
        }
    }

    fn contains(&self, path: &str, id: usize) -> bool {
        self.recursive
            .get_or_init(|| find_cycles(self.model))
            .get(path)
            .is_some_and(|ids| ids.contains(&id))
    }
}

fn find_cycles(model: &Model) -> HashMap<&str, HashSet<usize>> {
    let root = model.root_path();
    let parts = std::iter::once((root, &model.resources))
        .chain(model.childs.iter().map(|(path, child)| (path.as_str(), &child.resources)));

    let mut nodes: Vec<(&str, &Object)> = Vec::new();
    let mut index: HashMap<(&str, usize), usize> = HashMap::new();
    for (path, resources) in parts {
        for object in &resources.objects {
            index.insert((path, object.id), nodes.len());
            nodes.push((path, object));
        }
    }
    let edges: Vec<Vec<usize>> = nodes
        .iter()
        .map(|&(path, object)| {
            object
                .components
                .iter()
                .filter_map(|component| {
                    let target = part_key(model, component.extensions.object_path().unwrap_or(path));
                    index.get(&(target, component.objectid)).copied()
                })
                .collect()
        })
        .collect();

    let mut order = vec![UNVISITED; nodes.len()];
    let mut low = vec![0; nodes.len()];
    let mut on_stack = vec![false; nodes.len()];
    let mut stack = Vec::new();
    let mut next = 0;
    let mut recursive: HashMap<&str, HashSet<usize>> = HashMap::new();

    for start in 0..nodes.len() {
        if order[start] != UNVISITED {
            continue;
        }
        // (node, next edge to follow)
        let mut work = vec![(start, 0usize)];
        while let Some((v, edge)) = work.pop() {
            if edge == 0 {
                order[v] = next;
                low[v] = next;
                next += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            if let Some(&w) = edges[v].get(edge) {
                work.push((v, edge + 1));
                if order[w] == UNVISITED {
                    work.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(order[w]);
                }
                continue;
            }

            if low[v] == order[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if component.len() > 1 || edges[v].contains(&v) {
                    for w in component {
                        let (path, object) = nodes[w];
                        recursive.entry(path).or_default().insert(object.id);
                    }
                }
            }
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
    }
    recursive
}
