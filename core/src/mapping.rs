//! Header-driven column mapping.
//!
//! GTFS producers may order columns however they like, so each file's header
//! row is matched against the declared fields once, producing a
//! [`ColumnMapping`] from physical column position to declared field index.
//! Every data row of the file is then routed through that mapping.

use thiserror::Error;

use crate::types::{FieldType, FileSpec};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A header row that does not fit the file's declared fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaMismatch {
    /// A header column names no declared field.
    #[error("unknown column '{column}' at position {position}")]
    UnknownColumn { column: String, position: usize },

    /// Two header columns name the same field.
    #[error("column '{column}' appears more than once")]
    DuplicateColumn { column: String },

    /// The header has more columns than the file declares fields.
    #[error("header has {columns} columns but only {fields} fields are declared")]
    TooManyColumns { columns: usize, fields: usize },

    /// A required field has no column in the header. Times are exempt since
    /// a stop time may leave them empty.
    #[error("required column '{field}' is missing from the header")]
    MissingRequiredColumn { field: &'static str },

    /// The header row is empty.
    #[error("header row is empty")]
    EmptyHeader,
}

/// Mapping from header column position to declared field index.
///
/// # Examples
///
/// ```
/// use gtfs2db_core::{catalog, ColumnMapping};
///
/// let calendar = catalog::file_spec("calendar.txt");
/// let header = [
///     "monday", "service_id", "tuesday", "wednesday", "thursday",
///     "friday", "saturday", "sunday", "start_date", "end_date",
/// ];
/// let mapping = ColumnMapping::from_header(header, calendar).unwrap();
/// assert_eq!(mapping.field_for_column(0), Some(1));
/// assert_eq!(mapping.field_for_column(1), Some(0));
/// assert_eq!(mapping.column_count(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    fields: Vec<usize>,
}

impl ColumnMapping {
    /// Builds the mapping for `spec` from the names in a header row.
    ///
    /// Names must equal declared field names exactly. A UTF-8 byte-order mark
    /// in front of the first column is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaMismatch`] if the header is empty, names an unknown
    /// or repeated column, has more columns than declared fields, or omits a
    /// required field other than a time.
    pub fn from_header<I, S>(header: I, spec: &FileSpec) -> Result<Self, SchemaMismatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = Vec::with_capacity(spec.fields.len());
        let mut seen = vec![false; spec.fields.len()];

        for (position, name) in header.into_iter().enumerate() {
            let name = name.as_ref();
            let name = if position == 0 {
                name.trim_start_matches(BYTE_ORDER_MARK)
            } else {
                name
            };

            if position >= spec.fields.len() {
                return Err(SchemaMismatch::TooManyColumns {
                    columns: position + 1,
                    fields: spec.fields.len(),
                });
            }

            let index = spec
                .field_index(name)
                .ok_or_else(|| SchemaMismatch::UnknownColumn {
                    column: name.to_string(),
                    position,
                })?;
            if std::mem::replace(&mut seen[index], true) {
                return Err(SchemaMismatch::DuplicateColumn {
                    column: name.to_string(),
                });
            }
            fields.push(index);
        }

        if fields.is_empty() {
            return Err(SchemaMismatch::EmptyHeader);
        }

        if let Some(missing) = spec
            .fields
            .iter()
            .zip(&seen)
            .find(|(field, present)| {
                field.required && field.field_type != FieldType::Time && !**present
            })
        {
            return Err(SchemaMismatch::MissingRequiredColumn {
                field: missing.0.name,
            });
        }

        Ok(Self { fields })
    }

    /// Returns the declared field index for a column, if the column exists.
    pub fn field_for_column(&self, column: usize) -> Option<usize> {
        self.fields.get(column).copied()
    }

    /// Number of columns in the header this mapping was built from.
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterates `(column, field index)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.fields.iter().copied().enumerate()
    }
}
