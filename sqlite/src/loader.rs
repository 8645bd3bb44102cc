//! Streaming, batched load of one bundle member into its table.
//!
//! A [`FileLoader`] creates the destination table, then walks the member's
//! CSV records through three states:
//!
//! 1. **Awaiting header**: the first record is matched against the file's
//!    declared fields to build a [`ColumnMapping`].
//! 2. **Parsing records**: each data record is coerced field by field into a
//!    value vector indexed by declared field position, bound to the prepared
//!    insert statement, and executed.
//! 3. **Finished**: the open transaction is committed and the file's indexes
//!    are created.
//!
//! Inserts run inside a transaction window that commits after every
//! `batch_size` successful inserts. When a file aborts part-way, the rows
//! already inserted are committed and kept, so the table always holds
//! exactly the rows counted as loaded.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use gtfs2db_bundle::LoadConfig;
use gtfs2db_core::{
    ColumnMapping, FieldSpec, FieldType, FieldValue, FileSpec, SchemaMismatch, bounded_text,
    coerce,
};
use rusqlite::types::Null;
use rusqlite::{Connection, Statement};
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::quoting::StrictQuotes;

/// Counters and warnings gathered while loading one file.
///
/// `objects_loaded` never exceeds `records_parsed`; every parsed record is
/// either loaded, rejected, failed, or the record that aborted the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLoad {
    /// Data records read, header excluded.
    pub records_parsed: u64,
    /// Rows inserted and committed.
    pub objects_loaded: u64,
    /// Rows skipped because a required field had no value.
    pub rows_rejected: u64,
    /// Rows the database refused to insert.
    pub rows_failed: u64,
    pub indexes_created: usize,
    /// Non-fatal problems worth surfacing in a report.
    pub warnings: Vec<String>,
}

enum ParseState {
    AwaitingHeader,
    ParsingRecords(ColumnMapping),
    Finished,
}

/// Loads one bundle member into the table described by its [`FileSpec`].
///
/// # Examples
///
/// ```
/// use gtfs2db_bundle::LoadConfig;
/// use gtfs2db_core::catalog;
/// use gtfs2db_sqlite::FileLoader;
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let config = LoadConfig::default();
/// let input = "agency_name,agency_url,agency_timezone\n\
///              Metro,http://metro.example,America/Toronto\n";
///
/// let mut loader = FileLoader::new(&conn, catalog::file_spec("agency.txt"), &config);
/// loader.load(input.as_bytes()).unwrap();
/// assert_eq!(loader.stats().objects_loaded, 1);
/// ```
pub struct FileLoader<'conn> {
    conn: &'conn Connection,
    spec: &'static FileSpec,
    config: &'conn LoadConfig,
    stats: FileLoad,
}

impl<'conn> FileLoader<'conn> {
    pub fn new(conn: &'conn Connection, spec: &'static FileSpec, config: &'conn LoadConfig) -> Self {
        Self {
            conn,
            spec,
            config,
            stats: FileLoad::default(),
        }
    }

    /// Creates the file's table and loads every record from `input` into it.
    ///
    /// Counters in [`stats`](Self::stats) are valid whether or not this
    /// returns an error.
    ///
    /// # Errors
    ///
    /// Returns a file-level [`LoadError`] when the table cannot be created,
    /// the header does not fit the declared fields, a value is malformed, a
    /// record is too long, a record's quoting is malformed, or the input is
    /// not valid CSV. Rows inserted
    /// before the error stay committed; indexes are not created.
    pub fn load<R: Read>(&mut self, input: R) -> Result<()> {
        let conn = self.conn;
        let file = self.spec.filename;
        info!(file, "loading");

        conn.execute_batch(self.spec.create_table)
            .map_err(|source| storage_error(file, "create table", source))?;
        let mut insert = conn
            .prepare(self.spec.insert)
            .map_err(|source| storage_error(file, "prepare insert", source))?;
        let mut window = TransactionWindow::prepare(conn, file, self.config.batch_size)?;
        window.begin()?;

        let streamed = self.stream(input, &mut insert, &mut window);

        if let Err(commit_err) = window.commit() {
            let discarded = window.rollback();
            self.stats.objects_loaded -= discarded as u64;
            return Err(streamed.err().unwrap_or(commit_err));
        }
        streamed?;
        drop(insert);
        drop(window);

        self.create_indexes();
        info!(
            file,
            records = self.stats.records_parsed,
            loaded = self.stats.objects_loaded,
            rejected = self.stats.rows_rejected,
            failed = self.stats.rows_failed,
            "loaded"
        );
        Ok(())
    }

    /// Counters gathered so far.
    pub fn stats(&self) -> &FileLoad {
        &self.stats
    }

    pub fn into_stats(self) -> FileLoad {
        self.stats
    }

    fn stream<R: Read>(
        &mut self,
        input: R,
        insert: &mut Statement<'_>,
        window: &mut TransactionWindow<'_>,
    ) -> Result<()> {
        let file = self.spec.filename;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .buffer_capacity(self.config.read_buffer_size)
            .from_reader(StrictQuotes::new(input));
        let mut record = StringRecord::new();
        let mut values = vec![FieldValue::Absent; self.spec.fields.len()];
        let mut state = ParseState::AwaitingHeader;

        loop {
            state = match state {
                ParseState::Finished => return Ok(()),
                ParseState::AwaitingHeader => {
                    if !self.next_record(&mut reader, &mut record, 0)? {
                        return Err(LoadError::Schema {
                            file,
                            source: SchemaMismatch::EmptyHeader,
                        });
                    }
                    let mapping = ColumnMapping::from_header(&record, self.spec)
                        .map_err(|source| LoadError::Schema { file, source })?;
                    debug!(file, columns = mapping.column_count(), "header mapped");
                    ParseState::ParsingRecords(mapping)
                }
                ParseState::ParsingRecords(mapping) => {
                    let number = self.stats.records_parsed + 1;
                    if self.next_record(&mut reader, &mut record, number)? {
                        self.load_record(&record, &mapping, &mut values, insert, window)?;
                        ParseState::ParsingRecords(mapping)
                    } else {
                        ParseState::Finished
                    }
                }
            };
        }
    }

    /// Reads the next record, rejecting it if its bytes break the quoting
    /// rules. `number` is the data record number, 0 for the header.
    fn next_record<R: Read>(
        &mut self,
        reader: &mut csv::Reader<StrictQuotes<R>>,
        record: &mut StringRecord,
        number: u64,
    ) -> Result<bool> {
        let file = self.spec.filename;
        let has_record = reader
            .read_record(record)
            .map_err(|source| LoadError::Csv { file, source })?;

        let quotes = reader.get_ref();
        let fault = if has_record {
            quotes.fault_before(reader.position().byte())
        } else {
            quotes.fault()
        };
        let Some(at) = fault else {
            return Ok(has_record);
        };
        if has_record && number > 0 {
            self.stats.records_parsed += 1;
        }
        Err(LoadError::MalformedQuoting {
            file,
            record: number,
            line: at.line,
            fault: at.fault,
        })
    }

    fn load_record(
        &mut self,
        record: &StringRecord,
        mapping: &ColumnMapping,
        values: &mut [FieldValue],
        insert: &mut Statement<'_>,
        window: &mut TransactionWindow<'_>,
    ) -> Result<()> {
        let file = self.spec.filename;
        self.stats.records_parsed += 1;
        let number = self.stats.records_parsed;

        if record.len() > mapping.column_count() {
            return Err(LoadError::MalformedRecord {
                file,
                record: number,
                fields: record.len(),
                columns: mapping.column_count(),
            });
        }

        values.fill(FieldValue::Absent);
        for ((_, index), raw) in mapping.iter().zip(record.iter()) {
            values[index] = coerce(raw, &self.spec.fields[index]).map_err(|source| {
                LoadError::Coercion {
                    file,
                    record: number,
                    source,
                }
            })?;
        }

        if let Some(field) = missing_required(self.spec, values) {
            warn!(
                file,
                record = number,
                field = field.name,
                "required field has no value, row rejected"
            );
            self.stats.rows_rejected += 1;
            return Ok(());
        }

        match bind_values(insert, self.spec, values, number).and_then(|()| insert.raw_execute()) {
            Ok(_) => {
                self.stats.objects_loaded += 1;
                window.record_insert()?;
            }
            Err(err) => {
                warn!(file, record = number, error = %err, "insert failed, row skipped");
                self.stats.rows_failed += 1;
            }
        }
        Ok(())
    }

    fn create_indexes(&mut self) {
        if !self.config.create_indexes {
            return;
        }
        let file = self.spec.filename;
        for sql in self.spec.indexes {
            match self.conn.execute_batch(sql) {
                Ok(()) => self.stats.indexes_created += 1,
                Err(err) => {
                    warn!(file, index = *sql, error = %err, "index creation failed");
                    self.stats
                        .warnings
                        .push(format!("index not created ({sql}): {err}"));
                }
            }
        }
    }
}

/// Returns the first required field left without a value.
///
/// Times are exempt: a stop time may legitimately omit them.
fn missing_required(spec: &'static FileSpec, values: &[FieldValue]) -> Option<&'static FieldSpec> {
    spec.fields
        .iter()
        .zip(values)
        .find(|(field, value)| {
            field.required && field.field_type != FieldType::Time && value.is_absent()
        })
        .map(|(field, _)| field)
}

/// Binds the value of field `i` to placeholder `i + 1`.
fn bind_values(
    insert: &mut Statement<'_>,
    spec: &FileSpec,
    values: &[FieldValue],
    record: u64,
) -> rusqlite::Result<()> {
    for (index, (field, value)) in spec.fields.iter().zip(values).enumerate() {
        let position = index + 1;
        match value {
            FieldValue::Absent => insert.raw_bind_parameter(position, Null)?,
            FieldValue::Boolean(flag) => {
                insert.raw_bind_parameter(position, if *flag { "t" } else { "f" })?
            }
            FieldValue::Integer(number) => insert.raw_bind_parameter(position, number)?,
            FieldValue::Double(number) => insert.raw_bind_parameter(position, number)?,
            FieldValue::Text(text) => {
                let bounded = bounded_text(text, field);
                if bounded.len() < text.len() {
                    warn!(
                        file = spec.filename,
                        record,
                        field = field.name,
                        max_length = field.max_length,
                        "value truncated"
                    );
                }
                insert.raw_bind_parameter(position, bounded)?
            }
            FieldValue::Date(date) => {
                insert.raw_bind_parameter(position, FieldValue::iso_date(date))?
            }
            FieldValue::Time(seconds) => insert.raw_bind_parameter(position, seconds)?,
        }
    }
    Ok(())
}

fn storage_error(file: &'static str, stage: &'static str, source: rusqlite::Error) -> LoadError {
    LoadError::Storage {
        file,
        stage,
        source,
    }
}

/// Begin/commit/rollback statements for one file, prepared once and reused.
///
/// Counts successful inserts in the open transaction and commits once the
/// count reaches the batch size.
struct TransactionWindow<'conn> {
    file: &'static str,
    begin: Statement<'conn>,
    commit: Statement<'conn>,
    rollback: Statement<'conn>,
    batch_size: usize,
    pending: usize,
    open: bool,
}

impl<'conn> TransactionWindow<'conn> {
    fn prepare(conn: &'conn Connection, file: &'static str, batch_size: usize) -> Result<Self> {
        let prepare = |sql: &str| {
            conn.prepare(sql)
                .map_err(|source| storage_error(file, "prepare transaction statements", source))
        };
        Ok(Self {
            file,
            begin: prepare("BEGIN")?,
            commit: prepare("COMMIT")?,
            rollback: prepare("ROLLBACK")?,
            batch_size: batch_size.max(1),
            pending: 0,
            open: false,
        })
    }

    fn begin(&mut self) -> Result<()> {
        self.begin
            .execute([])
            .map_err(|source| storage_error(self.file, "begin transaction", source))?;
        self.open = true;
        Ok(())
    }

    fn record_insert(&mut self) -> Result<()> {
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.commit()?;
            self.begin()?;
        }
        Ok(())
    }

    /// Commits the open transaction, returning the number of rows it held.
    fn commit(&mut self) -> Result<usize> {
        if !self.open {
            return Ok(0);
        }
        self.commit
            .execute([])
            .map_err(|source| storage_error(self.file, "commit", source))?;
        self.open = false;
        debug!(file = self.file, rows = self.pending, "committed batch");
        Ok(std::mem::take(&mut self.pending))
    }

    /// Abandons the open transaction, returning the number of rows discarded.
    fn rollback(&mut self) -> usize {
        if self.open {
            if let Err(err) = self.rollback.execute([]) {
                warn!(file = self.file, error = %err, "rollback failed");
            }
            self.open = false;
        }
        std::mem::take(&mut self.pending)
    }
}
