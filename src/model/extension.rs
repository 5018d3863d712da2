//! Opaque extension data attached to model nodes
//!
//! The core never knows the concrete types extensions decode. Extension attribute
//! values are stored on the owning node as boxed [`ExtensionAttr`] values and are
//! retrieved again by downcasting to the extension's own type.

use std::any::Any;
use std::fmt;

/// An extension namespace declared by a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpec {
    /// Namespace URI
    pub namespace: String,
    /// Prefix the document bound the namespace to
    pub local_name: String,
    /// Listed in the model's `requiredextensions`
    pub is_required: bool,
}

impl ExtensionSpec {
    /// Create a non-required extension entry
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            is_required: false,
        }
    }
}

/// Extension attribute data attached to a model node
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use lib3mf_stream::model::{ExtensionAttr, ExtensionData};
///
/// #[derive(Debug, Clone)]
/// struct Tag(String);
///
/// impl ExtensionAttr for Tag {
///     fn namespace(&self) -> &str { "urn:example:tag" }
///     fn clone_box(&self) -> Box<dyn ExtensionAttr> { Box::new(self.clone()) }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
///
/// let mut data = ExtensionData::default();
/// data.insert(Tag("blue".into()));
/// assert_eq!(data.get::<Tag>().map(|t| t.0.as_str()), Some("blue"));
/// ```
pub trait ExtensionAttr: Any + fmt::Debug + Send + Sync {
    /// Namespace of the extension that produced this value
    fn namespace(&self) -> &str;

    /// Part path this node points into, when the extension allows cross-part
    /// references. Used by core validation to resolve objects in child parts.
    fn object_path(&self) -> Option<&str> {
        None
    }

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn ExtensionAttr>;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn ExtensionAttr> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The extension values of one node, at most one per concrete type
#[derive(Debug, Clone, Default)]
pub struct ExtensionData {
    entries: Vec<Box<dyn ExtensionAttr>>,
}

impl ExtensionData {
    /// Get the value of type `T`
    pub fn get<T: ExtensionAttr>(&self) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|entry| entry.as_any().downcast_ref::<T>())
    }

    /// Get the value of type `T` mutably
    pub fn get_mut<T: ExtensionAttr>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|entry| entry.as_any_mut().downcast_mut::<T>())
    }

    /// Insert a value, replacing any previous value of the same type
    pub fn insert<T: ExtensionAttr>(&mut self, value: T) {
        self.insert_boxed(Box::new(value));
    }

    /// Insert a boxed value, replacing any previous value of the same concrete type
    pub fn insert_boxed(&mut self, value: Box<dyn ExtensionAttr>) {
        let type_id = value.as_any().type_id();
        self.entries
            .retain(|entry| entry.as_any().type_id() != type_id);
        self.entries.push(value);
    }

    /// Iterate over all stored values
    pub fn iter(&self) -> impl Iterator<Item = &dyn ExtensionAttr> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    /// First object path reported by any stored value
    pub fn object_path(&self) -> Option<&str> {
        self.entries.iter().find_map(|entry| entry.object_path())
    }

    /// Returns true if no values are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resource contributed by an extension
///
/// Extension element decoders hand these to the part's resources so that ids stay
/// unique across native and extension resources.
pub trait ExtensionAsset: Any + fmt::Debug + Send + Sync {
    /// Resource id
    fn id(&self) -> usize;

    /// Namespace of the extension that produced this resource
    fn namespace(&self) -> &str;

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn ExtensionAsset>;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn ExtensionAsset> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
