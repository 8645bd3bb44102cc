//! Streaming, transactional loader of GTFS bundles into SQLite.
//!
//! This crate turns a [`Bundle`](gtfs2db_bundle::Bundle) into a SQLite
//! database, one table per catalog file, reading each member as a stream
//! and committing inserts in fixed-size batches.
//!
//! # Architecture
//!
//! - **`loader`**: [`FileLoader`] loads a single member: table creation,
//!   header mapping, per-field coercion, binding, batched commits, and index
//!   creation.
//! - **`convert`**: [`Converter`] validates a bundle and runs a loader per
//!   catalog file, collecting a [`ConversionReport`].
//! - **`quoting`**: strict quoting check over the raw bytes of a member;
//!   a stray quote, text after a closing quote, or an unclosed quote aborts
//!   the file instead of being repaired by the tokenizer.
//! - **`report`**: per-file and per-run summaries, serializable to JSON.
//!
//! # Quick start
//!
//! ```no_run
//! use gtfs2db_bundle::LoadConfig;
//! use gtfs2db_sqlite::convert_bundle;
//!
//! let report = convert_bundle("feed.zip", "feed.db", LoadConfig::default()).unwrap();
//! println!("{} objects loaded", report.total_objects());
//! ```
//!
//! # Failure handling
//!
//! A bundle missing required files is rejected before the database is
//! touched. Once loading starts, an error in one file aborts only that file:
//! rows inserted before the error stay committed, the file is marked failed
//! in the report, and the next file is loaded. Rows whose required fields
//! are empty are rejected and counted rather than stored with NULLs.

mod convert;
mod error;
mod loader;
mod quoting;
mod report;

pub use convert::{Converter, convert_bundle};
pub use error::{LoadError, Result};
pub use loader::{FileLoad, FileLoader};
pub use quoting::QuoteFault;
pub use report::{ConversionReport, FileReport, FileStatus};
