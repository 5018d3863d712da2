//! # lib3mf-stream
//!
//! A streaming decoder for 3MF (3D Manufacturing Format) packages.
//!
//! A 3MF package is a ZIP-based container following the Open Packaging Conventions
//! (OPC) standard. It holds one root model part and any number of further model
//! parts, textures and thumbnails linked through relationships.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Token-driven decoding through a stack of element decoders
//! - Concurrent decoding of non-root model parts with a deterministic merge order
//! - Cooperative cancellation
//! - Pluggable extensions: element decoders, attribute decoders, attachment filters
//!   and validators, registered per namespace
//! - Core and materials extension decoded natively, production extension included
//! - Validation collecting every problem with its position in the model
//!
//! ## Example
//!
//! ```no_run
//! use lib3mf_stream::Model;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("model.3mf")?;
//! let model = Model::from_reader(file)?;
//!
//! println!("Model contains {} objects", model.resources.objects.len());
//! for warning in &model.warnings {
//!     println!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod decoder;
pub mod error;
pub mod extension;
pub mod extensions;
pub mod model;
pub mod opc;
pub mod validator;

pub use cancel::{CancelReason, CancellationToken};
pub use decoder::{Decoder, DecoderConfig};
pub use error::{ElementError, ElementErrorKind, Error, Result};
pub use extension::ExtensionRegistry;
pub use model::{
    Attachment, BaseMaterial, BaseMaterialGroup, Build, BuildItem, ChildModel, ColorGroup,
    Component, FaceData, Mesh, MetadataEntry, Model, Object, ObjectType, Relationship, Resources,
    Tex2Coord, Texture2D, Texture2DGroup, Triangle, Vertex,
};
pub use validator::{ValidationError, ValidationErrors};

use std::io::{Read, Seek};

impl Model {
    /// Decode a 3MF package from a reader
    ///
    /// Uses [`DecoderConfig::with_all_extensions`]: strict mode, every shipped
    /// extension registered.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lib3mf_stream::Model;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("model.3mf")?;
    /// let model = Model::from_reader(file)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read + Seek + Send + 'static>(reader: R) -> Result<Self> {
        Self::from_reader_with_config(reader, DecoderConfig::with_all_extensions())
    }

    /// Decode a 3MF package from a reader with a custom configuration
    pub fn from_reader_with_config<R: Read + Seek + Send + 'static>(
        reader: R,
        config: DecoderConfig,
    ) -> Result<Self> {
        let mut decoder = Decoder::from_reader(reader).with_config(config);
        let mut model = Model::new();
        decoder.decode(&mut model)?;
        Ok(model)
    }
}
