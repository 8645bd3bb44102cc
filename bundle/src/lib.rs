//! GTFS bundle access and load configuration.
//!
//! - [`Bundle`] opens a GTFS ZIP archive, lists its members, streams
//!   individual member files, and digests the archive for reporting.
//! - [`LoadConfig`] holds the tunables of a conversion run (batch size, read
//!   buffer, index creation, SQLite pragmas) and round-trips through YAML.
//!
//! # Quick start
//!
//! ```no_run
//! use gtfs2db_bundle::{Bundle, LoadConfig};
//!
//! let bundle = Bundle::open("feed.zip").unwrap();
//! let report = bundle.validate();
//! if !report.is_valid() {
//!     eprintln!("missing: {:?}", report.missing_files());
//! }
//!
//! let config = LoadConfig::load("gtfs2db.yml").unwrap_or_default();
//! assert!(config.batch_size > 0);
//! ```

mod archive;
mod config;
mod error;

pub use archive::Bundle;
pub use config::{
    DEFAULT_BATCH_SIZE, DEFAULT_READ_BUFFER_SIZE, JournalMode, LoadConfig, Synchronous,
};
pub use error::{BundleError, Result};
