//! Error types for loading a bundle into SQLite.
//!
//! Bundle-level errors stop a conversion before anything is written.
//! File-level errors abort the file being loaded; the conversion records
//! them in its report and moves on to the next file.

use gtfs2db_bundle::BundleError;
use gtfs2db_core::{CoercionError, SchemaMismatch};
use thiserror::Error;

use crate::quoting::QuoteFault;

/// Errors that can occur while converting a bundle.
#[derive(Debug, Error)]
pub enum LoadError {
    /// SQLite failure outside of any single file (opening, pragmas).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The bundle or its configuration could not be read.
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Required files are missing; nothing was written.
    #[error("bundle is missing required files: {}", missing.join(", "))]
    BundleValidation { missing: Vec<String> },

    /// The header row does not fit the file's declared fields.
    #[error("{file}: {source}")]
    Schema {
        file: &'static str,
        source: SchemaMismatch,
    },

    /// A field value is malformed for its declared type.
    #[error("{file}, record {record}: {source}")]
    Coercion {
        file: &'static str,
        record: u64,
        source: CoercionError,
    },

    /// A data row has more fields than the header has columns.
    #[error("{file}, record {record}: {fields} fields but the header has {columns} columns")]
    MalformedRecord {
        file: &'static str,
        record: u64,
        fields: usize,
        columns: usize,
    },

    /// A record's quoting breaks the CSV dialect. Record 0 is the header.
    #[error("{file}, record {record} (line {line}): {fault}")]
    MalformedQuoting {
        file: &'static str,
        record: u64,
        line: u64,
        fault: QuoteFault,
    },

    /// The CSV tokenizer rejected the input.
    #[error("{file}: {source}")]
    Csv {
        file: &'static str,
        source: csv::Error,
    },

    /// A statement needed for the whole file failed.
    #[error("{file}: failed to {stage}: {source}")]
    Storage {
        file: &'static str,
        stage: &'static str,
        source: rusqlite::Error,
    },
}

impl LoadError {
    /// Returns the bundle member this error belongs to, for file-level errors.
    pub fn file(&self) -> Option<&'static str> {
        match self {
            LoadError::Schema { file, .. }
            | LoadError::Coercion { file, .. }
            | LoadError::MalformedRecord { file, .. }
            | LoadError::MalformedQuoting { file, .. }
            | LoadError::Csv { file, .. }
            | LoadError::Storage { file, .. } => Some(*file),
            LoadError::Database(_) | LoadError::Bundle(_) | LoadError::BundleValidation { .. } => {
                None
            }
        }
    }
}

/// Convenience alias for results with [`LoadError`].
pub type Result<T> = std::result::Result<T, LoadError>;
