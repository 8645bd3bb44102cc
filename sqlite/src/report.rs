//! Conversion reports.
//!
//! A [`ConversionReport`] is returned by every successful
//! [`Converter::convert`](crate::Converter::convert) call, including runs in
//! which individual files failed. It serializes to JSON for machine
//! consumption; [`FileReport::progress_line`] renders the human summary.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gtfs2db_core::{FileSpec, ObjectName};
use serde::Serialize;

use crate::error::LoadError;
use crate::loader::FileLoad;

/// Outcome of one catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Loaded to the end of input.
    Loaded,
    /// Aborted by a file-level error; rows before the error were kept.
    Failed,
    /// Optional file absent from the bundle.
    Skipped,
}

/// Per-file counts, timing and problems.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: &'static str,
    pub name: ObjectName,
    pub status: FileStatus,
    pub records_parsed: u64,
    pub objects_loaded: u64,
    pub rows_rejected: u64,
    pub rows_failed: u64,
    pub indexes_created: usize,
    pub elapsed_secs: f64,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Builds the report of a file that was loaded, or that failed with `error`.
    pub fn new(
        spec: &'static FileSpec,
        load: FileLoad,
        elapsed: Duration,
        error: Option<&LoadError>,
    ) -> Self {
        Self {
            filename: spec.filename,
            name: spec.name,
            status: if error.is_some() {
                FileStatus::Failed
            } else {
                FileStatus::Loaded
            },
            records_parsed: load.records_parsed,
            objects_loaded: load.objects_loaded,
            rows_rejected: load.rows_rejected,
            rows_failed: load.rows_failed,
            indexes_created: load.indexes_created,
            elapsed_secs: elapsed.as_secs_f64(),
            warnings: load.warnings,
            error: error.map(ToString::to_string),
        }
    }

    /// Builds the report of an optional file the bundle does not carry.
    pub fn skipped(spec: &'static FileSpec) -> Self {
        Self {
            status: FileStatus::Skipped,
            ..Self::new(spec, FileLoad::default(), Duration::ZERO, None)
        }
    }

    /// One-line human summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use gtfs2db_core::catalog;
    /// use gtfs2db_sqlite::{FileLoad, FileReport};
    ///
    /// let load = FileLoad { records_parsed: 1000, objects_loaded: 1000, ..FileLoad::default() };
    /// let report = FileReport::new(
    ///     catalog::file_spec("stops.txt"),
    ///     load,
    ///     Duration::from_secs(2),
    ///     None,
    /// );
    /// assert_eq!(report.progress_line(), "1000 stops added in 2.00 seconds (2.00ms/stop)");
    /// ```
    pub fn progress_line(&self) -> String {
        let added = format!(
            "{} {} added",
            self.objects_loaded,
            self.name.for_count(self.objects_loaded)
        );
        match self.status {
            FileStatus::Skipped => "not in bundle, skipped".to_string(),
            FileStatus::Failed => format!(
                "failed after {added}: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
            FileStatus::Loaded if self.elapsed_secs > 0.0 && self.objects_loaded > 0 => format!(
                "{added} in {:.2} seconds ({:.2}ms/{})",
                self.elapsed_secs,
                self.elapsed_secs * 1000.0 / self.objects_loaded as f64,
                self.name.singular
            ),
            FileStatus::Loaded => format!("{added} in {:.2} seconds", self.elapsed_secs),
        }
    }
}

/// Summary of a whole conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Path of the source bundle.
    pub bundle: PathBuf,
    /// SHA-256 hex digest of the source bundle.
    pub bundle_sha256: String,
    /// Destination database, when known to the caller.
    pub database: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    /// One entry per catalog file, in load order.
    pub files: Vec<FileReport>,
}

impl ConversionReport {
    /// Returns `true` when no file failed.
    pub fn is_success(&self) -> bool {
        self.files
            .iter()
            .all(|file| file.status != FileStatus::Failed)
    }

    /// Rows loaded across all files.
    pub fn total_objects(&self) -> u64 {
        self.files.iter().map(|file| file.objects_loaded).sum()
    }

    /// Returns the report for one bundle member.
    pub fn file(&self, filename: &str) -> Option<&FileReport> {
        self.files.iter().find(|file| file.filename == filename)
    }

    /// Pretty-printed JSON form.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use gtfs2db_core::SchemaMismatch;
    use gtfs2db_core::catalog::{AGENCY, CALENDAR_DATES, STOPS};

    use super::*;

    fn loaded(objects: u64) -> FileLoad {
        FileLoad {
            records_parsed: objects,
            objects_loaded: objects,
            ..FileLoad::default()
        }
    }

    #[test]
    fn test_progress_line_singular() {
        let report = FileReport::new(&AGENCY, loaded(1), Duration::from_millis(500), None);
        assert_eq!(
            report.progress_line(),
            "1 agency added in 0.50 seconds (500.00ms/agency)"
        );
    }

    #[test]
    fn test_progress_line_without_rate() {
        let report = FileReport::new(&AGENCY, loaded(0), Duration::ZERO, None);
        assert_eq!(report.progress_line(), "0 agencies added in 0.00 seconds");
    }

    #[test]
    fn test_failed_report() {
        let err = LoadError::Schema {
            file: "stops.txt",
            source: SchemaMismatch::EmptyHeader,
        };
        let report = FileReport::new(&STOPS, loaded(0), Duration::ZERO, Some(&err));
        assert_eq!(report.status, FileStatus::Failed);
        assert_eq!(
            report.progress_line(),
            "failed after 0 stops added: stops.txt: header row is empty"
        );
    }

    #[test]
    fn test_conversion_summary() {
        let err = LoadError::Schema {
            file: "stops.txt",
            source: SchemaMismatch::EmptyHeader,
        };
        let mut report = ConversionReport {
            bundle: PathBuf::from("feed.zip"),
            bundle_sha256: "00".repeat(32),
            database: None,
            started_at: Utc::now(),
            files: vec![
                FileReport::new(&AGENCY, loaded(2), Duration::from_millis(3), None),
                FileReport::skipped(&CALENDAR_DATES),
            ],
        };
        assert!(report.is_success());
        assert_eq!(report.total_objects(), 2);
        assert_eq!(report.file("calendar_dates.txt").unwrap().status, FileStatus::Skipped);

        report
            .files
            .push(FileReport::new(&STOPS, loaded(5), Duration::ZERO, Some(&err)));
        assert!(!report.is_success());
        assert_eq!(report.total_objects(), 7);
    }

    #[test]
    fn test_json_shape() {
        let report = ConversionReport {
            bundle: PathBuf::from("feed.zip"),
            bundle_sha256: "ab".repeat(32),
            database: Some(PathBuf::from("feed.db")),
            started_at: Utc::now(),
            files: vec![FileReport::skipped(&CALENDAR_DATES)],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["database"], "feed.db");
        assert_eq!(json["files"][0]["status"], "skipped");
        assert_eq!(json["files"][0]["name"]["plural"], "service exceptions");
        assert!(json["files"][0].get("error").is_none());
    }
}
