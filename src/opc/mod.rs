//! OPC (Open Packaging Conventions) access for 3MF packages
//!
//! The decoder only sees the [`PackageReader`] and [`PackageFile`] traits: it looks
//! parts up by relationship type or by name and opens their byte streams. [`Package`]
//! implements them over a zip archive; tests and embedders may supply their own.

mod content_types;
mod reader;
mod relationships;

use std::io::Read;

use crate::error::Result;
use crate::model::Relationship;

pub use reader::Package;

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Default path of the root model part
pub const DEFAULT_MODEL_PATH: &str = "/3D/3dmodel.model";

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Thumbnail relationship type (OPC standard)
pub const THUMBNAIL_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";

/// Print ticket relationship type
pub const PRINT_TICKET_REL_TYPE: &str =
    "http://schemas.microsoft.com/3dmanufacturing/2013/01/printticket";

/// Texture relationship type (materials extension)
pub const TEXTURE_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dtexture";

/// A package of parts
pub trait PackageReader: Send {
    /// Open the package; must be called before any lookup
    fn open(&mut self) -> Result<()>;

    /// First file the package relates to with `rel_type`
    fn find_file_from_rel(&self, rel_type: &str) -> Option<Box<dyn PackageFile>>;

    /// File with the exact absolute name
    fn find_file_from_name(&self, name: &str) -> Option<Box<dyn PackageFile>>;

    /// Package-level relationships
    fn relationships(&self) -> &[Relationship];
}

/// One file of a package
pub trait PackageFile: Send + Sync {
    /// Absolute name, starting with `/`
    fn name(&self) -> &str;

    /// Content type from the package's content type table
    fn content_type(&self) -> &str;

    /// Relationships declared by this file
    fn relationships(&self) -> &[Relationship];

    /// First file this file relates to with `rel_type`
    fn find_file_from_rel(&self, rel_type: &str) -> Option<Box<dyn PackageFile>>;

    /// File of the same package with the exact absolute name
    fn find_file_from_name(&self, name: &str) -> Option<Box<dyn PackageFile>>;

    /// Open the byte stream of the file
    fn open(&self) -> Result<Box<dyn Read + Send>>;
}
