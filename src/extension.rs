//! Extension registry for pluggable 3MF extensions
//!
//! An extension is identified by a key, normally its namespace URI, and contributes
//! any subset of four hooks:
//!
//! - an element decoder factory, asked for every start element whose namespace is
//!   not decoded natively
//! - an attribute decoder, called for attributes in the extension's namespace
//! - a file filter, deciding whether a related file with an unknown relationship
//!   type is kept as an attachment
//! - a validator, run by the validation pass
//!
//! Registering the same key again merges hooks: a hook supplied later replaces the
//! previous hook of the same kind and leaves the others in place.
//!
//! # Example
//!
//! ```
//! use lib3mf_stream::extension::ExtensionRegistry;
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register_file_filter("urn:example", |rel| rel.ends_with("/preview"));
//! registry.register_attribute_decoder("urn:example", |_scanner, _node, _attr| {});
//! let hooks = registry.hooks("urn:example").unwrap();
//! assert!(hooks.file_filter.is_some());
//! assert!(hooks.attribute_decoder.is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::decoder::{ElementDecoder, NodeKind, NodeMut, Scanner, XmlAttr, XmlName};
use crate::validator::Validator;

/// Where an extension element was found
#[derive(Debug, Clone, Copy)]
pub struct ElementContext<'a> {
    /// Kind of the enclosing node
    pub parent: NodeKind,
    /// Qualified name of the element
    pub name: &'a XmlName,
}

/// Creates a decoder for an extension element, `None` when the element is not handled
pub type ElementDecoderFactory =
    Arc<dyn Fn(&ElementContext<'_>) -> Option<Box<dyn ElementDecoder>> + Send + Sync>;

/// Decodes one extension attribute into its node
pub type AttributeDecoder = Arc<dyn Fn(&mut Scanner, NodeMut<'_>, &XmlAttr) + Send + Sync>;

/// Decides whether a file related with the given relationship type is kept
pub type FileFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The hooks of one extension
#[derive(Clone, Default)]
pub struct ExtensionHooks {
    /// Element decoder factory
    pub element_decoder: Option<ElementDecoderFactory>,
    /// Attribute decoder
    pub attribute_decoder: Option<AttributeDecoder>,
    /// Attachment filter
    pub file_filter: Option<FileFilter>,
    /// Structural validator
    pub validator: Option<Arc<dyn Validator>>,
}

impl ExtensionHooks {
    fn merge(&mut self, other: ExtensionHooks) {
        if other.element_decoder.is_some() {
            self.element_decoder = other.element_decoder;
        }
        if other.attribute_decoder.is_some() {
            self.attribute_decoder = other.attribute_decoder;
        }
        if other.file_filter.is_some() {
            self.file_filter = other.file_filter;
        }
        if other.validator.is_some() {
            self.validator = other.validator;
        }
    }
}

impl fmt::Debug for ExtensionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHooks")
            .field("element_decoder", &self.element_decoder.is_some())
            .field("attribute_decoder", &self.attribute_decoder.is_some())
            .field("file_filter", &self.file_filter.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Registry of extension hooks, ordered by first registration
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    entries: Vec<(String, ExtensionHooks)>,
}

impl ExtensionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register hooks for `key`, merging with hooks already registered for it
    pub fn register(&mut self, key: impl Into<String>, hooks: ExtensionHooks) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.merge(hooks),
            None => self.entries.push((key, hooks)),
        }
    }

    /// Register an element decoder factory
    pub fn register_element_decoder<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&ElementContext<'_>) -> Option<Box<dyn ElementDecoder>> + Send + Sync + 'static,
    {
        self.register(
            key,
            ExtensionHooks {
                element_decoder: Some(Arc::new(factory)),
                ..ExtensionHooks::default()
            },
        );
    }

    /// Register an attribute decoder
    pub fn register_attribute_decoder<F>(&mut self, key: impl Into<String>, decoder: F)
    where
        F: Fn(&mut Scanner, NodeMut<'_>, &XmlAttr) + Send + Sync + 'static,
    {
        self.register(
            key,
            ExtensionHooks {
                attribute_decoder: Some(Arc::new(decoder)),
                ..ExtensionHooks::default()
            },
        );
    }

    /// Register an attachment filter
    pub fn register_file_filter<F>(&mut self, key: impl Into<String>, filter: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.register(
            key,
            ExtensionHooks {
                file_filter: Some(Arc::new(filter)),
                ..ExtensionHooks::default()
            },
        );
    }

    /// Register a validator
    pub fn register_validator<V: Validator + 'static>(&mut self, key: impl Into<String>, validator: V) {
        self.register(
            key,
            ExtensionHooks {
                validator: Some(Arc::new(validator)),
                ..ExtensionHooks::default()
            },
        );
    }

    /// Returns true if `key` has any hooks
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Hooks registered for `key`
    pub fn hooks(&self, key: &str) -> Option<&ExtensionHooks> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, h)| h)
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ask the factory of the element's namespace first, then every other factory
    /// in registration order
    pub(crate) fn element_decoder(&self, ctx: &ElementContext<'_>) -> Option<Box<dyn ElementDecoder>> {
        let space = ctx.name.space.as_str();
        let matching = self.entries.iter().filter(|(k, _)| k == space);
        let others = self.entries.iter().filter(|(k, _)| k != space);
        matching
            .chain(others)
            .filter_map(|(_, hooks)| hooks.element_decoder.as_ref())
            .find_map(|factory| factory(ctx))
    }

    /// Run the attribute decoder of the attribute's namespace; returns false when
    /// no extension handles it
    pub(crate) fn decode_attribute(&self, scanner: &mut Scanner, node: NodeMut<'_>, attr: &XmlAttr) -> bool {
        match self
            .hooks(&attr.name.space)
            .and_then(|h| h.attribute_decoder.as_ref())
        {
            Some(decoder) => {
                decoder(scanner, node, attr);
                true
            }
            None => false,
        }
    }

    /// Returns true if any filter keeps files related with `rel_type`
    pub(crate) fn accepts_file(&self, rel_type: &str) -> bool {
        self.entries
            .iter()
            .filter_map(|(_, h)| h.file_filter.as_ref())
            .any(|filter| filter(rel_type))
    }

    /// Registered validators in registration order
    pub(crate) fn validators(&self) -> impl Iterator<Item = &dyn Validator> {
        self.entries
            .iter()
            .filter_map(|(_, h)| h.validator.as_deref())
    }
}
