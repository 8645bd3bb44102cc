//! Read access to a GTFS ZIP bundle.
//!
//! A [`Bundle`] owns the open archive for the duration of a conversion.
//! Members are streamed straight out of the archive, so a member is never
//! held in memory in full.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use gtfs2db_core::{BundleValidation, catalog, validate_bundle};
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{BundleError, Result};

/// An open GTFS bundle.
///
/// # Examples
///
/// ```no_run
/// use std::io::Read;
/// use gtfs2db_bundle::Bundle;
///
/// let mut bundle = Bundle::open("feed.zip").unwrap();
/// for name in bundle.member_names() {
///     println!("{name}");
/// }
/// let mut stops = String::new();
/// bundle.open_member("stops.txt").unwrap().read_to_string(&mut stops).unwrap();
/// ```
#[derive(Debug)]
pub struct Bundle {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl Bundle {
    /// Opens the ZIP archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](BundleError::Io) if the file cannot be opened, or
    /// [`Zip`](BundleError::Zip) if it is not a readable ZIP archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let archive = ZipArchive::new(file)?;
        debug!(path = %path.display(), members = archive.len(), "opened bundle");
        Ok(Self { path, archive })
    }

    /// Path the bundle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of members in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> Vec<&str> {
        self.archive.file_names().collect()
    }

    /// Returns `true` if the archive has a member named exactly `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.archive.file_names().any(|member| member == name)
    }

    /// Opens a member for streaming reads.
    ///
    /// # Errors
    ///
    /// Returns [`MemberNotFound`](BundleError::MemberNotFound) if there is no
    /// such member, or [`Zip`](BundleError::Zip) if its entry is unreadable.
    pub fn open_member(&mut self, name: &str) -> Result<impl Read + '_> {
        self.archive.by_name(name).map_err(|err| match err {
            ZipError::FileNotFound => BundleError::MemberNotFound(name.to_string()),
            other => BundleError::Zip(other),
        })
    }

    /// Checks the members against the GTFS catalog.
    pub fn validate(&self) -> BundleValidation {
        validate_bundle(self.archive.file_names(), catalog())
    }

    /// SHA-256 hex digest of the archive file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](BundleError::Io) if the archive cannot be re-read.
    pub fn sha256(&self) -> Result<String> {
        let mut file = File::open(&self.path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(format!("{:x}", hasher.finalize()))
    }
}
