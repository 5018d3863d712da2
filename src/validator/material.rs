//! Materials extension checks

use super::{Element, ValidationError, ValidationErrors, Validator};
use crate::model::{AssetRef, ColorGroup, Model, Texture2D, Texture2DGroup};

/// Checks of color groups, texture coordinate groups and textures
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialValidator;

impl Validator for MaterialValidator {
    fn validate(&self, model: &Model, path: &str, element: Element<'_>) -> ValidationErrors {
        match element {
            Element::Asset(AssetRef::ColorGroup(group)) => validate_color_group(group),
            Element::Asset(AssetRef::Texture2DGroup(group)) => {
                validate_texture2d_group(model, path, group)
            }
            Element::Asset(AssetRef::Texture2D(texture)) => validate_texture2d(model, texture),
            _ => ValidationErrors::new(),
        }
    }
}

fn validate_color_group(group: &ColorGroup) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if group.colors.is_empty() {
        errs.push(ValidationError::EmptyResourceProps);
    }
    for (j, color) in group.colors.iter().enumerate() {
        if *color == (0, 0, 0, 0) {
            let mut entry = ValidationErrors::new();
            entry.push(ValidationError::MissingField("color"));
            errs.push_indexed("color", j, entry);
        }
    }
    errs
}

fn validate_texture2d_group(model: &Model, path: &str, group: &Texture2DGroup) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if group.texid == 0 {
        errs.push(ValidationError::MissingField("texid"));
    } else if !matches!(
        model
            .find_resources(path)
            .and_then(|r| r.find_asset(group.texid)),
        Some(AssetRef::Texture2D(_))
    ) {
        errs.push(ValidationError::TextureReference(group.texid));
    }
    if group.tex2coords.is_empty() {
        errs.push(ValidationError::EmptyResourceProps);
    }
    errs
}

fn validate_texture2d(model: &Model, texture: &Texture2D) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if texture.path.is_empty() {
        errs.push(ValidationError::MissingField("path"));
    } else if !model
        .attachments
        .iter()
        .any(|a| a.path.eq_ignore_ascii_case(&texture.path))
    {
        errs.push(ValidationError::MissingTexturePart(texture.path.clone()));
    }
    if texture.contenttype.is_empty() {
        errs.push(ValidationError::MissingField("contenttype"));
    }
    errs
}
