//! Bundle validation.
//!
//! Checks that a bundle carries every file the catalog marks as required
//! before anything is written to the database.
//!
//! # Examples
//!
//! ```
//! use gtfs2db_core::{catalog, validate_bundle, ValidationError};
//!
//! let members = ["agency.txt", "calendar.txt", "routes.txt", "stops.txt", "trips.txt"];
//! let report = validate_bundle(members, catalog());
//! assert!(!report.is_valid());
//! assert_eq!(
//!     report.violations(),
//!     &[ValidationError::MissingRequiredFile("stop_times.txt")]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::FileSpec;

/// Bundle validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A file the catalog marks as required is not in the bundle.
    #[error("bundle is missing required file \"{0}\"")]
    MissingRequiredFile(&'static str),
}

/// Outcome of [`validate_bundle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleValidation {
    violations: Vec<ValidationError>,
}

impl BundleValidation {
    /// Returns `true` when loading may proceed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[ValidationError] {
        &self.violations
    }

    /// Filenames of the required files that are missing, in catalog order.
    pub fn missing_files(&self) -> Vec<&'static str> {
        self.violations
            .iter()
            .map(|violation| match violation {
                ValidationError::MissingRequiredFile(name) => *name,
            })
            .collect()
    }
}

/// Validates a bundle's member names against the catalog.
///
/// Every required spec absent from `members` produces one violation. Optional
/// specs are never violations.
pub fn validate_bundle<I, S>(members: I, specs: &'static [FileSpec]) -> BundleValidation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let present = member_set(members);
    let violations = specs
        .iter()
        .filter(|spec| spec.required && !present.contains(spec.filename))
        .map(|spec| ValidationError::MissingRequiredFile(spec.filename))
        .collect();
    BundleValidation { violations }
}

/// Returns the specs to load for a bundle, in catalog order.
///
/// Required files are always included; optional files only when present.
pub fn files_to_load<I, S>(members: I, specs: &'static [FileSpec]) -> Vec<&'static FileSpec>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let present = member_set(members);
    specs
        .iter()
        .filter(|spec| spec.required || present.contains(spec.filename))
        .collect()
}

fn member_set<I, S>(members: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    members
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect()
}
