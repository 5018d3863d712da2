//! Validation of decoded 3MF models
//!
//! Validation walks the whole model: the model itself, then every resource of the
//! root part and of each child part. Each visited element is handed to the core
//! checks, the material checks and every validator registered in the
//! [`ExtensionRegistry`]. All problems are collected, none stops the walk.
//!
//! Errors carry their position as a tree: [`ValidationError::Indexed`] for an entry
//! of a sequence, [`ValidationError::Wrapped`] for an owning element and
//! [`ValidationError::Part`] for a non-root part. [`ValidationErrors::leaves`]
//! flattens the tree back into located errors.

mod core;
mod material;

use std::fmt;

use thiserror::Error;

use crate::extension::ExtensionRegistry;
use crate::model::{AssetRef, Model, Object, Resources};

use self::core::ComponentCycles;

pub use self::core::CoreValidator;
pub use self::material::MaterialValidator;

/// An element handed to a [`Validator`]
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    /// The model as a whole, visited once
    Model(&'a Model),
    /// A non-object resource of the part being validated
    Asset(AssetRef<'a>),
    /// An object of the part being validated
    Object(&'a Object),
}

/// Structural checks of one extension
pub trait Validator: Send + Sync {
    /// Check `element`, found in the part at `path`
    ///
    /// `path` is the root part path for [`Element::Model`].
    fn validate(&self, model: &Model, path: &str, element: Element<'_>) -> ValidationErrors;
}

/// A single validation problem, or a positional wrapper around nested problems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required attribute is not set
    #[error("required field {0} is not set")]
    MissingField(&'static str),

    /// A resource has no id
    #[error("resource id is not set")]
    MissingId,

    /// A reference names a resource that does not exist
    #[error("resource {0} does not exist")]
    MissingResource(usize),

    /// A UUID is not in canonical form
    #[error("invalid UUID {0:?}")]
    InvalidUuid(String),

    /// A path-qualified reference appears in a non-root part
    #[error("path references are only allowed in the root model part")]
    ProdRefInNonRoot,

    /// A property group has no entries
    #[error("resource has no properties")]
    EmptyResourceProps,

    /// An index exceeds the referenced sequence
    #[error("index {0} is out of bounds")]
    IndexOutOfBounds(usize),

    /// A texture coordinate group does not reference a texture
    #[error("resource {0} is not a texture2d")]
    TextureReference(usize),

    /// A texture path is not in the package
    #[error("texture part {0} is not in the package")]
    MissingTexturePart(String),

    /// An object is neither a mesh nor a component list
    #[error("object must contain either a mesh or components")]
    InvalidObject,

    /// A component references itself directly or through other components
    #[error("component graph is recursive")]
    RecursiveComponent,

    /// A mesh has fewer than three vertices
    #[error("mesh has fewer than three vertices")]
    InsufficientVertices,

    /// Extension specific problem
    #[error("{0}")]
    Custom(String),

    /// Problems of entry `index` of a sequence of `element`s
    #[error("{element}#{index}: {errors}")]
    Indexed {
        /// Element name of the sequence entries
        element: &'static str,
        /// Position in the sequence
        index: usize,
        /// Nested problems
        errors: ValidationErrors,
    },

    /// Problems below `element`
    #[error("{element}: {errors}")]
    Wrapped {
        /// Owning element name
        element: &'static str,
        /// Nested problems
        errors: ValidationErrors,
    },

    /// Problems of the non-root part at `path`
    #[error("{path}: {errors}")]
    Part {
        /// Part path
        path: String,
        /// Nested problems
        errors: ValidationErrors,
    },
}

/// One step of an error location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    /// Non-root part path
    Part(&'a str),
    /// Owning element
    Element(&'static str),
    /// Entry of a sequence
    Index(&'static str, usize),
}

/// A problem together with the path of wrappers leading to it
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    /// Outermost location first
    pub location: Vec<Location<'a>>,
    /// The problem
    pub error: &'a ValidationError,
}

/// Collected validation problems
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Move all problems of `other` into `self`
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Add `errors` as entry `index` of `element`, unless empty
    pub fn push_indexed(&mut self, element: &'static str, index: usize, errors: ValidationErrors) {
        if !errors.is_empty() {
            self.push(ValidationError::Indexed {
                element,
                index,
                errors,
            });
        }
    }

    /// Add `errors` below `element`, unless empty
    pub fn push_wrapped(&mut self, element: &'static str, errors: ValidationErrors) {
        if !errors.is_empty() {
            self.push(ValidationError::Wrapped { element, errors });
        }
    }

    /// Add `errors` of the part at `path`, unless empty
    pub fn push_part(&mut self, path: &str, errors: ValidationErrors) {
        if !errors.is_empty() {
            self.push(ValidationError::Part {
                path: path.to_string(),
                errors,
            });
        }
    }

    /// Returns true if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of top-level entries
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Top-level entries
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// `Ok` when empty
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Every problem with its location, in collection order
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut leaves);
        leaves
    }
}

fn collect_leaves<'a>(
    errors: &'a ValidationErrors,
    location: &mut Vec<Location<'a>>,
    out: &mut Vec<Leaf<'a>>,
) {
    for error in &errors.errors {
        let (step, nested) = match error {
            ValidationError::Indexed {
                element,
                index,
                errors,
            } => (Location::Index(*element, *index), errors),
            ValidationError::Wrapped { element, errors } => (Location::Element(*element), errors),
            ValidationError::Part { path, errors } => (Location::Part(path), errors),
            leaf => {
                out.push(Leaf {
                    location: location.clone(),
                    error: leaf,
                });
                continue;
            }
        };
        location.push(step);
        collect_leaves(nested, location, out);
        location.pop();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

fn run_all(
    registry: &ExtensionRegistry,
    cycles: &ComponentCycles<'_>,
    model: &Model,
    path: &str,
    element: Element<'_>,
) -> ValidationErrors {
    let mut errors = CoreValidator.validate_with(model, path, element, cycles);
    errors.extend(MaterialValidator.validate(model, path, element));
    for validator in registry.validators() {
        errors.extend(validator.validate(model, path, element));
    }
    errors
}

fn validate_resources(
    registry: &ExtensionRegistry,
    cycles: &ComponentCycles<'_>,
    model: &Model,
    path: &str,
    resources: &Resources,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let assets = resources
        .base_material_groups
        .iter()
        .map(AssetRef::BaseMaterials)
        .enumerate()
        .chain(resources.color_groups.iter().map(AssetRef::ColorGroup).enumerate())
        .chain(
            resources
                .texture2d_groups
                .iter()
                .map(AssetRef::Texture2DGroup)
                .enumerate(),
        )
        .chain(
            resources
                .texture2d_resources
                .iter()
                .map(AssetRef::Texture2D)
                .enumerate(),
        )
        .chain(
            resources
                .extension_assets
                .iter()
                .map(|a| AssetRef::Extension(a.as_ref()))
                .enumerate(),
        );
    for (i, asset) in assets {
        let found = run_all(registry, cycles, model, path, Element::Asset(asset));
        errors.push_indexed(asset.element_name(), i, found);
    }
    for (i, object) in resources.objects.iter().enumerate() {
        let found = run_all(registry, cycles, model, path, Element::Object(object));
        errors.push_indexed("object", i, found);
    }
    errors
}

/// Validate `model` with the core checks, the material checks and every validator
/// in `registry`
///
/// The model itself and the root part come first, then the child parts in path
/// order.
pub fn validate_model(model: &Model, registry: &ExtensionRegistry) -> ValidationErrors {
    let root = model.root_path();
    let cycles = ComponentCycles::new(model);
    let mut errors = run_all(registry, &cycles, model, root, Element::Model(model));
    errors.extend(validate_resources(registry, &cycles, model, root, &model.resources));
    for (path, child) in &model.childs {
        let found = validate_resources(registry, &cycles, model, path, &child.resources);
        errors.push_part(path, found);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> ValidationErrors {
        let mut item = ValidationErrors::new();
        item.push(ValidationError::MissingField("UUID"));
        let mut build = ValidationErrors::new();
        build.push_indexed("item", 3, item);
        let mut part = ValidationErrors::new();
        part.push_wrapped("build", build);
        part.push(ValidationError::MissingId);
        let mut all = ValidationErrors::new();
        all.push_part("/3D/other.model", part);
        all
    }

    #[test]
    fn test_leaves_carry_location() {
        let errors = nested();
        let leaves = errors.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            leaves[0].location,
            vec![
                Location::Part("/3D/other.model"),
                Location::Element("build"),
                Location::Index("item", 3)
            ]
        );
        assert_eq!(leaves[0].error, &ValidationError::MissingField("UUID"));
        assert_eq!(leaves[1].location, vec![Location::Part("/3D/other.model")]);
        assert_eq!(leaves[1].error, &ValidationError::MissingId);
    }

    #[test]
    fn test_empty_wrappers_are_dropped() {
        let mut errors = ValidationErrors::new();
        errors.push_indexed("item", 0, ValidationErrors::new());
        errors.push_wrapped("build", ValidationErrors::new());
        errors.push_part("/3D/a.model", ValidationErrors::new());
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_display() {
        let text = nested().to_string();
        assert_eq!(
            text,
            "/3D/other.model: build: item#3: required field UUID is not set; resource id is not set"
        );
    }

    #[test]
    fn test_empty_model_is_valid() {
        let model = Model::new();
        let errors = validate_model(&model, &ExtensionRegistry::new());
        assert!(errors.is_empty(), "{}", errors);
    }
}
