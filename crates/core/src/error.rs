//! Error types for deck generation.
//!
//! The text-processing stages never fail; they degrade to fewer slides or
//! fewer images. Only the I/O-facing edges (configuration, asset manifests,
//! package writing) surface errors.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the edges of deck generation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The image asset manifest could not be parsed.
    #[error("Invalid asset manifest: {0}")]
    AssetManifestError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
