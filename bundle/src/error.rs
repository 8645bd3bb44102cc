//! Error types for bundle access and configuration.

use thiserror::Error;

/// Errors that can occur while reading a bundle or its load configuration.
#[derive(Debug, Error)]
pub enum BundleError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read as a ZIP file.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The named member is not in the archive.
    #[error("bundle has no member named \"{0}\"")]
    MemberNotFound(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`BundleError`].
pub type Result<T> = std::result::Result<T, BundleError>;
