//! Production extension
//!
//! Adds UUIDs to the build, its items, objects and components, and lets items and
//! components of the root part reference objects in other model parts through a
//! `path` attribute. Every referenced path becomes a child part of the decode.
//!
//! # Example
//!
//! ```
//! use lib3mf_stream::Decoder;
//! use lib3mf_stream::extensions::production;
//!
//! let mut decoder = Decoder::default();
//! production::register(decoder.extensions_mut());
//! assert!(decoder.extensions().contains(production::NAMESPACE));
//! ```

use std::any::Any;

use uuid::Uuid;

use crate::decoder::{NodeMut, Scanner, XmlAttr};
use crate::extension::ExtensionRegistry;
use crate::model::{ExtensionAttr, ExtensionData, Model};
use crate::validator::{Element, ValidationError, ValidationErrors, Validator};

/// Namespace of the production extension
pub const NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/production/2015/06";

/// Conventional namespace prefix
pub const LOCAL_NAME: &str = "p";

const ATTR_UUID: &str = "UUID";
const ATTR_PATH: &str = "path";

macro_rules! impl_attr {
    ($ty:ty) => {
        impl ExtensionAttr for $ty {
            fn namespace(&self) -> &str {
                NAMESPACE
            }
            fn object_path(&self) -> Option<&str> {
                self.path()
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
    };
}

/// UUID of the `<build>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildAttr {
    /// Build UUID
    pub uuid: String,
}

/// UUID of an `<object>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAttr {
    /// Object UUID
    pub uuid: String,
}

/// UUID and object path of a build `<item>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemAttr {
    /// Item UUID
    pub uuid: String,
    /// Part containing the referenced object, empty for the root part
    pub path: String,
}

/// UUID and object path of a `<component>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentAttr {
    /// Component UUID
    pub uuid: String,
    /// Part containing the referenced object, empty for the current part
    pub path: String,
}

impl BuildAttr {
    fn path(&self) -> Option<&str> {
        None
    }
}

impl ObjectAttr {
    fn path(&self) -> Option<&str> {
        None
    }
}

impl ItemAttr {
    fn path(&self) -> Option<&str> {
        (!self.path.is_empty()).then_some(self.path.as_str())
    }
}

impl ComponentAttr {
    fn path(&self) -> Option<&str> {
        (!self.path.is_empty()).then_some(self.path.as_str())
    }
}

impl_attr!(BuildAttr);
impl_attr!(ObjectAttr);
impl_attr!(ItemAttr);
impl_attr!(ComponentAttr);

fn update<T: ExtensionAttr + Default + Clone>(ext: &mut ExtensionData, f: impl FnOnce(&mut T)) {
    let mut value = ext.get::<T>().cloned().unwrap_or_default();
    f(&mut value);
    ext.insert(value);
}

/// Attribute decoder of the production namespace
pub fn decode_attribute(scanner: &mut Scanner, node: NodeMut<'_>, attr: &XmlAttr) {
    let value = attr.value.trim();
    match (node, attr.name.local.as_str()) {
        (NodeMut::Build(build), ATTR_UUID) => {
            update::<BuildAttr>(&mut build.extensions, |a| a.uuid = value.to_string())
        }
        (NodeMut::Object(object), ATTR_UUID) => {
            update::<ObjectAttr>(&mut object.extensions, |a| a.uuid = value.to_string())
        }
        (NodeMut::Item(item), ATTR_UUID) => {
            update::<ItemAttr>(&mut item.extensions, |a| a.uuid = value.to_string())
        }
        (NodeMut::Item(item), ATTR_PATH) => {
            update::<ItemAttr>(&mut item.extensions, |a| a.path = value.to_string());
            if scanner.is_root() {
                scanner.add_part_reference(value);
            }
        }
        (NodeMut::Component(component), ATTR_UUID) => {
            update::<ComponentAttr>(&mut component.extensions, |a| a.uuid = value.to_string())
        }
        (NodeMut::Component(component), ATTR_PATH) => {
            update::<ComponentAttr>(&mut component.extensions, |a| a.path = value.to_string());
            if scanner.is_root() {
                scanner.add_part_reference(value);
            }
        }
        _ => {}
    }
}

/// Returns true for the hyphenated 8-4-4-4-12 form
pub fn is_canonical_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}

fn check_uuid(uuid: Option<&str>, errs: &mut ValidationErrors) {
    match uuid {
        None | Some("") => errs.push(ValidationError::MissingField(ATTR_UUID)),
        Some(uuid) if !is_canonical_uuid(uuid) => {
            errs.push(ValidationError::InvalidUuid(uuid.to_string()))
        }
        Some(_) => {}
    }
}

/// Production rules
///
/// Every build, item, object and component carries a canonical UUID; path
/// references are only allowed in the root part.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionValidator;

impl ProductionValidator {
    fn validate_path_uuid(
        &self,
        model: &Model,
        path: &str,
        uuid: Option<&str>,
        object_path: Option<&str>,
    ) -> ValidationErrors {
        let mut errs = ValidationErrors::new();
        check_uuid(uuid, &mut errs);
        if object_path.is_some() && !path.is_empty() && path != model.root_path() {
            errs.push(ValidationError::ProdRefInNonRoot);
        }
        errs
    }

    fn validate_model(&self, model: &Model) -> ValidationErrors {
        let mut errs = ValidationErrors::new();
        let mut build = ValidationErrors::new();
        check_uuid(
            model.build.extensions.get::<BuildAttr>().map(|a| a.uuid.as_str()),
            &mut build,
        );
        errs.push_wrapped("build", build);

        for (i, item) in model.build.items.iter().enumerate() {
            let attr = item.extensions.get::<ItemAttr>();
            let item_errs = self.validate_path_uuid(
                model,
                "",
                attr.map(|a| a.uuid.as_str()),
                attr.and_then(ItemAttr::path),
            );
            let mut indexed = ValidationErrors::new();
            indexed.push_indexed("item", i, item_errs);
            errs.push_wrapped("build", indexed);
        }
        errs
    }

    fn validate_object(&self, model: &Model, path: &str, object: &crate::model::Object) -> ValidationErrors {
        let mut errs = ValidationErrors::new();
        check_uuid(
            object.extensions.get::<ObjectAttr>().map(|a| a.uuid.as_str()),
            &mut errs,
        );
        for (i, component) in object.components.iter().enumerate() {
            let attr = component.extensions.get::<ComponentAttr>();
            let found = self.validate_path_uuid(
                model,
                path,
                attr.map(|a| a.uuid.as_str()),
                attr.and_then(ComponentAttr::path),
            );
            errs.push_indexed("component", i, found);
        }
        errs
    }
}

impl Validator for ProductionValidator {
    fn validate(&self, model: &Model, path: &str, element: Element<'_>) -> ValidationErrors {
        match element {
            Element::Model(model) => self.validate_model(model),
            Element::Object(object) => self.validate_object(model, path, object),
            Element::Asset(_) => ValidationErrors::new(),
        }
    }
}

/// Register the attribute decoder and validator of the production extension
pub fn register(registry: &mut ExtensionRegistry) {
    registry.register_attribute_decoder(NAMESPACE, decode_attribute);
    registry.register_validator(NAMESPACE, ProductionValidator);
}

/// Give a fresh random UUID to every build, item, object and component that has
/// none, in the root part and all child parts
pub fn add_missing_uuids(model: &mut Model) {
    fn fill(uuid: &mut String) {
        if uuid.is_empty() {
            *uuid = Uuid::new_v4().to_string();
        }
    }

    update::<BuildAttr>(&mut model.build.extensions, |a| fill(&mut a.uuid));
    for item in &mut model.build.items {
        update::<ItemAttr>(&mut item.extensions, |a| fill(&mut a.uuid));
    }
    let parts = std::iter::once(&mut model.resources)
        .chain(model.childs.values_mut().map(|c| &mut c.resources));
    for resources in parts {
        for object in &mut resources.objects {
            update::<ObjectAttr>(&mut object.extensions, |a| fill(&mut a.uuid));
            for component in &mut object.components {
                update::<ComponentAttr>(&mut component.extensions, |a| fill(&mut a.uuid));
            }
        }
    }
}
