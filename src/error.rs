//! Error types for 3MF decoding
//!
//! All fatal errors carry an error code for categorization. Problems scoped to a
//! single XML element are described by [`ElementError`], which is either stored on
//! the model as a warning or raised as [`Error::Element`] depending on the strict
//! mode of the decoder.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O, archive and package errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E3xxx**: Model content errors
//! - **E4xxx**: Extension errors
//! - **E5xxx**: Cancellation
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading a part
//! - `E1002`: ZIP archive format error
//! - `E1003`: Missing file in archive
//! - `E1004`: Package does not have a root model
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E3001`: Element content error
//! - `E3003`: Validation failed
//! - `E4002`: Required extension not supported
//! - `E5001`: Decode cancelled

use std::io;
use thiserror::Error;

use crate::cancel::CancelReason;
use crate::validator::ValidationErrors;

/// Result type for 3MF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when decoding 3MF packages
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading a part
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Truncated package
    /// - Read error on the underlying stream
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted ZIP file
    /// - Unsupported compression method
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required file in the package
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// The package has no relationship of the 3D model type
    ///
    /// **Error Code**: E1004
    ///
    /// **Common Causes**:
    /// - `_rels/.rels` is missing or empty
    /// - The root relationship uses a wrong `Type` URI
    #[error("[E1004] package does not have root model")]
    MissingRootModel,

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Malformed attribute syntax
    /// - Attribute value that is not valid UTF-8
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Document type declarations
    /// - Non UTF-8 text content or names
    /// - Document ends before every element is closed
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// A problem scoped to one element, raised in strict mode
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Missing or duplicated `id` attribute
    /// - Malformed color value
    /// - Two resources with the same id in one part
    #[error("[E3001] {0}")]
    Element(ElementError),

    /// A validation pass reported errors
    ///
    /// **Error Code**: E3003
    #[error("[E3003] Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A namespace listed in `requiredextensions` has no registered decoder
    ///
    /// **Error Code**: E4002
    ///
    /// **Suggestions**:
    /// - Register the extension on the decoder before decoding
    /// - Disable strict mode to record it as a warning instead
    #[error("[E4002] Required extension not supported: {0}")]
    UnsupportedExtension(String),

    /// Decoding stopped because the cancellation token fired
    ///
    /// **Error Code**: E5001
    #[error("[E5001] Decode cancelled: {0}")]
    Cancelled(CancelReason),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl From<ElementError> for Error {
    fn from(err: ElementError) -> Self {
        Error::Element(err)
    }
}

impl From<ValidationErrors> for Error {
    fn from(errs: ValidationErrors) -> Self {
        Error::Validation(errs)
    }
}

impl Error {
    /// Returns true if the error was caused by cancellation rather than data
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

/// A decode problem located at one element of one part
///
/// Stored in [`Model::warnings`](crate::Model::warnings) when it is recoverable,
/// or wrapped in [`Error::Element`] when it aborts the decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: <{element}>: {kind}")]
pub struct ElementError {
    /// Part path the element belongs to
    pub path: String,
    /// Local name of the element being decoded
    pub element: String,
    /// What went wrong
    pub kind: ElementErrorKind,
}

impl ElementError {
    /// Create an element error
    pub fn new(path: impl Into<String>, element: impl Into<String>, kind: ElementErrorKind) -> Self {
        Self {
            path: path.into(),
            element: element.into(),
            kind,
        }
    }
}

/// The kind of an [`ElementError`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementErrorKind {
    /// A mandatory attribute is absent
    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    /// The same attribute appears twice on one element
    #[error("duplicated '{0}' attribute")]
    DuplicatedAttribute(&'static str),

    /// An attribute value could not be parsed
    #[error("invalid value '{value}' for attribute '{attr}'")]
    InvalidValue {
        /// Attribute name
        attr: String,
        /// Raw value found in the document
        value: String,
    },

    /// A color is not in `#RRGGBB` or `#RRGGBBAA` form
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    /// A resource id is already used in the same part
    #[error("duplicated resource id {0}")]
    DuplicatedId(usize),

    /// The element is recognized but its decoding is not supported
    #[error("{0} not supported")]
    Unsupported(&'static str),

    /// A required extension has no registered decoder
    #[error("required extension '{0}' not supported")]
    UnsupportedExtension(String),

    /// A property reference names a group that was not decoded before it
    #[error("unknown property group {0}")]
    UnknownPropertyGroup(usize),

    /// A property index is past the end of its group
    #[error("property index {index} out of bounds for group {group}")]
    IndexOutOfBounds {
        /// Group id
        group: usize,
        /// Requested index
        index: usize,
    },

    /// Extension defined problem
    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let io_err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "test"));
        assert!(io_err.to_string().contains("[E1001]"));

        let missing_file = Error::MissingFile("test.model".to_string());
        assert!(missing_file.to_string().contains("[E1003]"));

        assert_eq!(
            Error::MissingRootModel.to_string(),
            "[E1004] package does not have root model"
        );

        let truncated = Error::InvalidXml("unexpected end of document".to_string());
        assert!(truncated.to_string().contains("[E2003]"));

        let cancelled = Error::Cancelled(CancelReason::Cancelled);
        assert!(cancelled.to_string().contains("[E5001]"));
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_element_error_display() {
        let err = ElementError::new(
            "/3D/3dmodel.model",
            "basematerials",
            ElementErrorKind::DuplicatedId(3),
        );
        assert_eq!(
            err.to_string(),
            "/3D/3dmodel.model: <basematerials>: duplicated resource id 3"
        );
        let wrapped: Error = err.clone().into();
        assert!(wrapped.to_string().starts_with("[E3001] /3D/3dmodel.model"));
        assert!(!wrapped.is_cancelled());
    }
}
