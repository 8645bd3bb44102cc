//! Static type definitions describing GTFS bundle members.
//!
//! A [`FileSpec`] describes one member file of a GTFS bundle: the fields each
//! record carries, whether the file must be present, and the SQL used to
//! create and fill its table. All specs are `'static` data assembled in
//! [`catalog`](crate::catalog).

use serde::Serialize;

/// Declared type of a field.
///
/// The type controls how raw text is coerced (see
/// [`coerce`](crate::coerce)) and how the resulting value is bound to the
/// insert statement.
///
/// # Examples
///
/// ```
/// use gtfs2db_core::FieldType;
///
/// assert_eq!(FieldType::Date.as_str(), "date");
/// assert!(FieldType::String.is_textual());
/// assert!(!FieldType::Time.is_textual());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// `"1"` is true, anything else false.
    Boolean,
    /// Signed decimal integer.
    Integer,
    /// Floating-point decimal, scientific notation allowed.
    Double,
    /// Free text bounded by the field's max length.
    String,
    /// Calendar date in `YYYYMMDD` form.
    Date,
    /// Time of day in `H:MM:SS` or `HH:MM:SS` form, hours may exceed 23.
    Time,
}

impl FieldType {
    /// Returns the lowercase name used in messages and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Time => "time",
        }
    }

    /// Returns `true` for types whose max length is meaningful.
    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::String)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one field of a GTFS file.
///
/// # Examples
///
/// ```
/// use gtfs2db_core::{FieldSpec, FieldType};
///
/// const NAME: FieldSpec = FieldSpec::required("agency_name", FieldType::String, 255);
/// assert!(NAME.required);
/// assert_eq!(NAME.max_length, 255);
///
/// let lat = FieldSpec::required("stop_lat", FieldType::Double, 0);
/// assert_eq!(lat.max_length(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Column name as it appears in the file's header row.
    pub name: &'static str,
    /// Declared type.
    pub field_type: FieldType,
    /// Maximum length in characters for string fields; 0 means unbounded.
    pub max_length: usize,
    /// Whether every record must carry a value.
    pub required: bool,
}

impl FieldSpec {
    /// Declares a field every record must carry.
    pub const fn required(name: &'static str, field_type: FieldType, max_length: usize) -> Self {
        Self {
            name,
            field_type,
            max_length,
            required: true,
        }
    }

    /// Declares a field records may leave empty.
    pub const fn optional(name: &'static str, field_type: FieldType, max_length: usize) -> Self {
        Self {
            name,
            field_type,
            max_length,
            required: false,
        }
    }

    /// Returns the length bound, if one applies to this field.
    pub fn max_length(&self) -> Option<usize> {
        (self.field_type.is_textual() && self.max_length > 0).then_some(self.max_length)
    }
}

/// Singular and plural display names of the objects stored in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectName {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl ObjectName {
    /// Picks the grammatical form matching `count`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtfs2db_core::ObjectName;
    ///
    /// let name = ObjectName { singular: "agency", plural: "agencies" };
    /// assert_eq!(name.for_count(1), "agency");
    /// assert_eq!(name.for_count(0), "agencies");
    /// assert_eq!(name.for_count(7), "agencies");
    /// ```
    pub fn for_count(&self, count: u64) -> &'static str {
        if count == 1 { self.singular } else { self.plural }
    }
}

/// Static description of a GTFS bundle member and how it is loaded.
///
/// The insert statement carries one positional placeholder per entry of
/// [`fields`](Self::fields), in declaration order, so the value of field `i`
/// binds to placeholder `i + 1`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FileSpec {
    /// Display names of the stored objects.
    pub name: ObjectName,
    /// Member filename within the bundle (e.g. `"stops.txt"`).
    pub filename: &'static str,
    /// Whether the bundle must contain this file.
    pub required: bool,
    /// Declared fields in insert-placeholder order.
    pub fields: &'static [FieldSpec],
    /// `CREATE TABLE` statement for the destination table.
    #[serde(skip)]
    pub create_table: &'static str,
    /// Parameterized `INSERT` statement.
    #[serde(skip)]
    pub insert: &'static str,
    /// `CREATE INDEX` statements run after the table is filled.
    #[serde(skip)]
    pub indexes: &'static [&'static str],
}

impl FileSpec {
    /// Returns the declaration index of the field named `name`.
    ///
    /// Matching is exact: `"stop_id"` never matches `"stop_id_extra"` or
    /// `"stop"`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Iterates over the names of required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
    }
}
