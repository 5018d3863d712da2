//! Decoding of 3MF packages into a [`Model`]
//!
//! The [`Decoder`] locates the root model part through the package relationships,
//! decodes it, then decodes every non-root model part it references concurrently.
//! Each part is driven through a stack of [`ElementDecoder`]s by a token state
//! machine; the per-part results are merged into the model in discovery order once
//! all parts succeeded.
//!
//! # Example
//!
//! ```no_run
//! use lib3mf_stream::{Decoder, Model};
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("model.3mf")?;
//! let mut decoder = Decoder::from_reader(file);
//! let mut model = Model::new();
//! decoder.decode(&mut model)?;
//! println!("{} objects", model.resources.objects.len());
//! # Ok(())
//! # }
//! ```

mod core;
mod material;
mod node;
mod scanner;
mod state;
mod token;

use std::fmt;
use std::io::{BufReader, Read, Seek};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cancel::{CancelReason, CancellationToken};
use crate::error::{Error, Result};
use crate::extension::{ElementContext, ExtensionRegistry};
use crate::model::{Attachment, ChildModel, Model, Relationship};
use crate::opc::{
    MODEL_REL_TYPE, Package, PackageFile, PackageReader, PRINT_TICKET_REL_TYPE, TEXTURE_REL_TYPE,
    THUMBNAIL_REL_TYPE,
};
use crate::validator::{self, Validator};
use state::{CancelPolicy, decode_part};

pub use material::parse_srgb;
pub use node::{Decoded, ElementDecoder, NodeKind, NodeMut};
pub use scanner::{PropertyMapping, Scanner};
pub use token::{NS_XML, Token, TokenReader, XmlAttr, XmlName, XmlTokenReader};

/// 3MF core namespace
pub const NS_CORE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// Materials and properties extension namespace
pub const NS_MATERIAL: &str = "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";

/// Default number of input bytes between cancellation checks of the root part
pub const CHECK_EVERY_BYTES: u64 = 4 * 1024 * 1024;

/// Returns true for namespaces decoded without a registered extension
pub fn is_native_namespace(space: &str) -> bool {
    space.is_empty() || space == NS_CORE || space == NS_MATERIAL
}

/// Configuration for decoding
#[derive(Clone)]
pub struct DecoderConfig {
    strict: bool,
    check_interval: u64,
    extensions: Arc<ExtensionRegistry>,
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("strict", &self.strict)
            .field("check_interval", &self.check_interval)
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderConfig {
    /// Strict configuration without extensions
    pub fn new() -> Self {
        Self {
            strict: true,
            check_interval: CHECK_EVERY_BYTES,
            extensions: Arc::new(ExtensionRegistry::new()),
        }
    }

    /// Strict configuration with every extension this crate ships registered
    pub fn with_all_extensions() -> Self {
        let mut registry = ExtensionRegistry::new();
        crate::extensions::register_all(&mut registry);
        Self::new().with_extension_registry(registry)
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the number of root part bytes between cancellation checks
    pub fn with_check_interval(mut self, bytes: u64) -> Self {
        self.check_interval = bytes.max(1);
        self
    }

    /// Replace the extension registry
    pub fn with_extension_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.extensions = Arc::new(registry);
        self
    }

    /// Returns true in strict mode
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Bytes between cancellation checks of the root part
    pub fn check_interval(&self) -> u64 {
        self.check_interval
    }

    /// The extension registry
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }
}

/// Decoder of a 3MF package
pub struct Decoder {
    package: Option<Box<dyn PackageReader>>,
    config: DecoderConfig,
}

impl Default for Decoder {
    /// A decoder without package, usable with [`Decoder::unmarshal_model`]
    fn default() -> Self {
        Self {
            package: None,
            config: DecoderConfig::default(),
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("has_package", &self.package.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Decoder {
    /// Decoder over any package store
    pub fn new(package: impl PackageReader + 'static) -> Self {
        Self {
            package: Some(Box::new(package)),
            config: DecoderConfig::default(),
        }
    }

    /// Decoder over a zip archive
    pub fn from_reader<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self::new(Package::new(reader))
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Set strict mode
    pub fn set_strict(&mut self, strict: bool) {
        self.config.strict = strict;
    }

    /// Returns true in strict mode
    pub fn strict(&self) -> bool {
        self.config.strict
    }

    /// The extension registry
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.config.extensions
    }

    /// Mutable extension registry, copied first if a decode still shares it
    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        Arc::make_mut(&mut self.config.extensions)
    }

    /// Register an element decoder factory for `key`
    pub fn register_node_decoder_extension<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&ElementContext<'_>) -> Option<Box<dyn ElementDecoder>> + Send + Sync + 'static,
    {
        self.extensions_mut().register_element_decoder(key, factory);
    }

    /// Register an attribute decoder for `key`
    pub fn register_decode_attribute_extension<F>(&mut self, key: impl Into<String>, decoder: F)
    where
        F: Fn(&mut Scanner, NodeMut<'_>, &XmlAttr) + Send + Sync + 'static,
    {
        self.extensions_mut().register_attribute_decoder(key, decoder);
    }

    /// Register an attachment filter for `key`
    pub fn register_file_filter_extension<F>(&mut self, key: impl Into<String>, filter: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.extensions_mut().register_file_filter(key, filter);
    }

    /// Register a validator for `key`
    pub fn register_validator_extension<V: Validator + 'static>(&mut self, key: impl Into<String>, validator: V) {
        self.extensions_mut().register_validator(key, validator);
    }

    /// Decode the package into `model`
    pub fn decode(&mut self, model: &mut Model) -> Result<()> {
        self.decode_context(&CancellationToken::new(), model)
    }

    /// Decode the package into `model`, stopping when `cancel` fires
    ///
    /// `model` is only written when every part decoded successfully.
    pub fn decode_context(&mut self, cancel: &CancellationToken, model: &mut Model) -> Result<()> {
        let strict = self.config.strict;
        let interval = self.config.check_interval;
        let registry = Arc::clone(&self.config.extensions);
        let package = self
            .package
            .as_deref_mut()
            .ok_or_else(|| Error::MissingFile("package".to_string()))?;
        package.open()?;

        let root = package
            .find_file_from_rel(MODEL_REL_TYPE)
            .ok_or(Error::MissingRootModel)?;
        log::debug!("Decoding root model part {}", root.name());

        let mut root_scanner = Scanner::new(root.name(), true, strict, Arc::clone(&registry));
        {
            let mut tokens = XmlTokenReader::new(BufReader::new(root.open()?));
            decode_part(
                &mut tokens,
                &mut root_scanner,
                cancel,
                CancelPolicy::EveryBytes(interval),
            )?;
        }
        if cancel.is_cancelled() {
            return Err(cancelled(cancel));
        }

        let children = discover_children(&*package, &*root, &root_scanner);
        log::debug!("Discovered {} non-root model parts", children.len());

        let mut attachments = Vec::new();
        collect_attachments(&*package, &registry, package.relationships(), &mut attachments)?;
        collect_attachments(&*package, &registry, root.relationships(), &mut attachments)?;
        for child in &children {
            collect_attachments(&*package, &registry, child.relationships(), &mut attachments)?;
        }

        let scanners = decode_children(&children, strict, &registry, cancel)?;

        model.relationships = preserved_relationships(root.relationships());
        commit_root(model, root_scanner);
        for (file, scanner) in children.iter().zip(scanners) {
            for spec in scanner.namespaces {
                if !model.namespaces.iter().any(|s| s.namespace == spec.namespace) {
                    model.namespaces.push(spec);
                }
            }
            model.warnings.extend(scanner.warnings);
            model.childs.insert(
                file.name().to_string(),
                ChildModel {
                    resources: scanner.resources,
                    relationships: preserved_relationships(file.relationships()),
                },
            );
        }
        model.attachments = attachments;
        log::debug!(
            "Merged {} parts, {} attachments, {} warnings",
            model.childs.len() + 1,
            model.attachments.len(),
            model.warnings.len()
        );
        Ok(())
    }

    /// Decode one in-memory model document as the root part
    pub fn unmarshal_model(&self, data: &[u8], model: &mut Model) -> Result<()> {
        let mut tokens = XmlTokenReader::new(data);
        self.unmarshal_tokens(&mut tokens, model)
    }

    /// Decode a token stream as the root part
    pub fn unmarshal_tokens(&self, tokens: &mut dyn TokenReader, model: &mut Model) -> Result<()> {
        let mut scanner = Scanner::new(
            model.root_path(),
            true,
            self.config.strict,
            Arc::clone(&self.config.extensions),
        );
        decode_part(
            tokens,
            &mut scanner,
            &CancellationToken::new(),
            CancelPolicy::EveryBytes(self.config.check_interval),
        )?;
        commit_root(model, scanner);
        Ok(())
    }

    /// Run the core checks and every registered validator over `model`
    pub fn validate(&self, model: &Model) -> Result<()> {
        validator::validate_model(model, &self.config.extensions).into_result()?;
        Ok(())
    }
}

fn cancelled(cancel: &CancellationToken) -> Error {
    Error::Cancelled(cancel.reason().unwrap_or(CancelReason::Cancelled))
}

/// Model relationships of the root first, then extension part references
fn discover_children(
    package: &dyn PackageReader,
    root: &dyn PackageFile,
    scanner: &Scanner,
) -> Vec<Box<dyn PackageFile>> {
    let mut paths: Vec<&str> = Vec::new();
    let related = root
        .relationships()
        .iter()
        .filter(|r| r.rel_type == MODEL_REL_TYPE)
        .map(|r| r.path.as_str());
    let referenced = scanner.part_references().iter().map(String::as_str);
    for path in related.chain(referenced) {
        if path != root.name() && !paths.contains(&path) {
            paths.push(path);
        }
    }

    paths
        .into_iter()
        .filter_map(|path| {
            let file = package.find_file_from_name(path);
            if file.is_none() {
                log::debug!("Referenced model part {} is not in the package", path);
            }
            file
        })
        .collect()
}

/// Relationships kept on the model; model parts are represented by `childs`
fn preserved_relationships(relationships: &[Relationship]) -> Vec<Relationship> {
    relationships
        .iter()
        .filter(|r| r.rel_type != MODEL_REL_TYPE)
        .cloned()
        .collect()
}

fn keeps_attachment(registry: &ExtensionRegistry, rel_type: &str) -> bool {
    matches!(
        rel_type,
        THUMBNAIL_REL_TYPE | PRINT_TICKET_REL_TYPE | TEXTURE_REL_TYPE
    ) || registry.accepts_file(rel_type)
}

fn collect_attachments(
    package: &dyn PackageReader,
    registry: &ExtensionRegistry,
    relationships: &[Relationship],
    out: &mut Vec<Attachment>,
) -> Result<()> {
    for rel in relationships {
        if rel.rel_type == MODEL_REL_TYPE
            || !keeps_attachment(registry, &rel.rel_type)
            || out.iter().any(|a| a.path == rel.path)
        {
            continue;
        }
        let Some(file) = package.find_file_from_name(&rel.path) else {
            log::trace!("Attachment {} is not in the package", rel.path);
            continue;
        };
        let mut data = Vec::new();
        file.open()?.read_to_end(&mut data)?;
        out.push(Attachment {
            path: rel.path.clone(),
            content_type: file.content_type().to_string(),
            data,
        });
    }
    Ok(())
}

fn decode_child(file: &dyn PackageFile, scanner: &mut Scanner, cancel: &CancellationToken) -> Result<()> {
    let mut tokens = XmlTokenReader::new(BufReader::new(file.open()?));
    decode_part(&mut tokens, scanner, cancel, CancelPolicy::EveryElement)
}

/// Decode every child part on its own thread
///
/// The first failing part cancels the others. Returns the scanners in the order of
/// `children`, or the first non-cancellation error.
fn decode_children(
    children: &[Box<dyn PackageFile>],
    strict: bool,
    registry: &Arc<ExtensionRegistry>,
    cancel: &CancellationToken,
) -> Result<Vec<Scanner>> {
    if children.is_empty() {
        return Ok(Vec::new());
    }
    let scope = cancel.child_token();
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    let slots: Vec<Option<Scanner>> = std::thread::scope(|s| {
        let handles: Vec<_> = children
            .iter()
            .map(|file| {
                let scope = &scope;
                let first_error = &first_error;
                let registry = Arc::clone(registry);
                s.spawn(move || {
                    let mut scanner = Scanner::new(file.name(), false, strict, registry);
                    match decode_child(file.as_ref(), &mut scanner, scope) {
                        Ok(()) => Some(scanner),
                        Err(err) => {
                            if !err.is_cancelled() {
                                let mut slot = first_error.lock();
                                if slot.is_none() {
                                    *slot = Some(err);
                                }
                            }
                            scope.cancel();
                            None
                        }
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    if let Some(err) = first_error.into_inner() {
        return Err(err);
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| cancelled(cancel))
}

fn commit_root(model: &mut Model, scanner: Scanner) {
    model.path = scanner.path().to_string();
    let header = scanner.header;
    if let Some(unit) = header.unit {
        model.unit = unit;
    }
    model.language = header.language;
    model.thumbnail = header.thumbnail;
    model.metadata = header.metadata;
    model.extensions = header.extensions;
    model.resources = scanner.resources;
    model.build = scanner.build;
    model.namespaces = scanner.namespaces;
    model.warnings.extend(scanner.warnings);
}
