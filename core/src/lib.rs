//! Static GTFS catalog and per-record primitives.
//!
//! This crate holds everything about a GTFS bundle that does not touch a
//! database or a ZIP archive:
//!
//! - [`FileSpec`] and [`FieldSpec`]: static descriptions of each supported
//!   member file, its fields, and the SQL used to store it. The full set lives
//!   in [`catalog`].
//! - [`coerce`]: turns one raw CSV token into a typed [`FieldValue`],
//!   reporting malformed input as a [`CoercionError`].
//! - [`ColumnMapping`]: matches a file's header row against its declared
//!   fields so columns may appear in any order.
//! - [`validate_bundle`]: checks that every required file is present before
//!   anything is loaded.
//!
//! # Example
//!
//! ```
//! use gtfs2db_core::*;
//!
//! let stops = catalog::file_spec("stops.txt");
//! let mapping = ColumnMapping::from_header(
//!     ["stop_id", "stop_name", "stop_lat", "stop_lon"],
//!     stops,
//! )
//! .unwrap();
//!
//! let lat_index = mapping.field_for_column(2).unwrap();
//! let lat = coerce("45.5017", &stops.fields[lat_index]).unwrap();
//! assert_eq!(lat, FieldValue::Double(45.5017));
//! ```

pub mod catalog;
mod mapping;
mod types;
mod validate;
mod value;

pub use catalog::{catalog, find_file_spec};
pub use mapping::{ColumnMapping, SchemaMismatch};
pub use types::*;
pub use validate::{BundleValidation, ValidationError, files_to_load, validate_bundle};
pub use value::{CoercionError, FieldValue, bounded_text, coerce};
