//! Whole-bundle conversion.
//!
//! [`Converter`] owns the destination connection and drives one
//! [`FileLoader`] per catalog file, in catalog order. A file that fails is
//! recorded in the [`ConversionReport`] and the run moves on to the next
//! file; only bundle-level problems stop the run.
//!
//! # Example
//!
//! ```no_run
//! use gtfs2db_bundle::LoadConfig;
//! use gtfs2db_sqlite::convert_bundle;
//!
//! let report = convert_bundle("feed.zip", "feed.db", LoadConfig::default()).unwrap();
//! for file in &report.files {
//!     println!("{}: {}", file.filename, file.progress_line());
//! }
//! ```

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use gtfs2db_bundle::{Bundle, LoadConfig};
use gtfs2db_core::{FileSpec, catalog, files_to_load};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::loader::FileLoader;
use crate::report::{ConversionReport, FileReport};

/// Loads GTFS bundles into one SQLite connection.
///
/// # Examples
///
/// ```no_run
/// use gtfs2db_bundle::{Bundle, LoadConfig};
/// use gtfs2db_sqlite::Converter;
/// use rusqlite::Connection;
///
/// let mut bundle = Bundle::open("feed.zip").unwrap();
/// let conn = Connection::open("feed.db").unwrap();
/// let mut converter = Converter::new(conn, LoadConfig::default()).unwrap();
///
/// let report = converter
///     .convert_with(&mut bundle, |file| println!("{}", file.progress_line()))
///     .unwrap();
/// assert!(report.is_success());
/// ```
pub struct Converter {
    conn: Connection,
    config: LoadConfig,
}

impl Converter {
    /// Wraps `conn`, applying the configured pragmas.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Bundle`] if the configuration is invalid, or
    /// [`LoadError::Database`] if a pragma cannot be applied.
    pub fn new(conn: Connection, config: LoadConfig) -> Result<Self> {
        config.validate()?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_str())?;
        let journal_mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_str(),
            |row| row.get(0),
        )?;
        debug!(
            foreign_keys = config.foreign_keys,
            synchronous = config.synchronous.as_str(),
            journal_mode = %journal_mode,
            "connection configured"
        );
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the converter and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Loads every catalog file present in `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::BundleValidation`] without touching the database
    /// if required files are missing, or [`LoadError::Bundle`] if the bundle
    /// cannot be digested. File-level errors are reported, not returned.
    pub fn convert(&mut self, bundle: &mut Bundle) -> Result<ConversionReport> {
        self.convert_with(bundle, |_| {})
    }

    /// Like [`convert`](Self::convert), calling `on_file` as each file
    /// finishes.
    pub fn convert_with<F>(&mut self, bundle: &mut Bundle, mut on_file: F) -> Result<ConversionReport>
    where
        F: FnMut(&FileReport),
    {
        check_bundle(bundle)?;

        let mut report = ConversionReport {
            bundle: bundle.path().to_path_buf(),
            bundle_sha256: bundle.sha256()?,
            database: None,
            started_at: Utc::now(),
            files: Vec::new(),
        };

        let to_load = files_to_load(bundle.member_names(), catalog());
        for spec in catalog() {
            let file_report = if to_load.iter().any(|load| load.filename == spec.filename) {
                self.load_file(bundle, spec)
            } else {
                debug!(file = spec.filename, "optional file absent");
                FileReport::skipped(spec)
            };
            on_file(&file_report);
            report.files.push(file_report);
        }

        info!(
            bundle = %report.bundle.display(),
            objects = report.total_objects(),
            success = report.is_success(),
            "bundle converted"
        );
        Ok(report)
    }

    fn load_file(&self, bundle: &mut Bundle, spec: &'static FileSpec) -> FileReport {
        let started = Instant::now();
        let mut loader = FileLoader::new(&self.conn, spec, &self.config);
        let outcome = bundle
            .open_member(spec.filename)
            .map_err(LoadError::from)
            .and_then(|member| loader.load(member));
        let elapsed = started.elapsed();

        if let Err(err) = &outcome {
            warn!(file = spec.filename, error = %err, "file aborted");
        }
        FileReport::new(spec, loader.into_stats(), elapsed, outcome.err().as_ref())
    }
}

/// Converts the bundle at `bundle_path` into a new database at `db_path`.
///
/// The bundle is validated before the database file is opened, so a bundle
/// missing required files leaves no database behind.
///
/// # Errors
///
/// Returns [`LoadError::Bundle`] if the bundle cannot be read,
/// [`LoadError::BundleValidation`] if required files are missing, or
/// [`LoadError::Database`] if the database cannot be opened.
pub fn convert_bundle(
    bundle_path: impl AsRef<Path>,
    db_path: impl AsRef<Path>,
    config: LoadConfig,
) -> Result<ConversionReport> {
    let mut bundle = Bundle::open(bundle_path)?;
    check_bundle(&bundle)?;

    let db_path = db_path.as_ref();
    let conn = Connection::open(db_path)?;
    let mut converter = Converter::new(conn, config)?;
    let mut report = converter.convert(&mut bundle)?;
    report.database = Some(db_path.to_path_buf());
    Ok(report)
}

fn check_bundle(bundle: &Bundle) -> Result<()> {
    let validation = bundle.validate();
    if validation.is_valid() {
        return Ok(());
    }
    let missing: Vec<String> = validation
        .missing_files()
        .into_iter()
        .map(String::from)
        .collect();
    warn!(missing = ?missing, "bundle is missing required files");
    Err(LoadError::BundleValidation { missing })
}

#[cfg(test)]
mod tests {
    use gtfs2db_bundle::{JournalMode, Synchronous};

    use super::*;

    #[test]
    fn test_new_applies_pragmas() {
        let config = LoadConfig {
            foreign_keys: true,
            synchronous: Synchronous::Off,
            journal_mode: JournalMode::Memory,
            ..LoadConfig::default()
        };
        let converter = Converter::new(Connection::open_in_memory().unwrap(), config).unwrap();
        let conn = converter.connection();

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        let synchronous: i64 = conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
        assert_eq!(synchronous, 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LoadConfig {
            batch_size: 0,
            ..LoadConfig::default()
        };
        let result = Converter::new(Connection::open_in_memory().unwrap(), config);
        assert!(matches!(result, Err(LoadError::Bundle(_))));
    }

    #[test]
    fn test_foreign_keys_off_by_default() {
        let converter =
            Converter::new(Connection::open_in_memory().unwrap(), LoadConfig::default()).unwrap();
        let foreign_keys: i64 = converter
            .connection()
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 0);
    }
}
