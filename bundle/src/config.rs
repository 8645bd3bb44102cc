//! Load configuration.
//!
//! Controls transaction batching, read buffering, index creation, and the
//! SQLite pragmas applied to the destination connection. Every key is
//! optional in the YAML form; missing keys take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! batch_size: 2048
//! read_buffer_size: 20480
//! create_indexes: true
//! foreign_keys: false
//! synchronous: normal
//! journal_mode: delete
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// Rows committed per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 2048;

/// Bytes of unparsed member data held in flight.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 20 * 1024;

/// SQLite `synchronous` pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
}

impl Synchronous {
    pub fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
        }
    }
}

/// SQLite `journal_mode` pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Delete,
    Truncate,
    Wal,
    Memory,
    Off,
}

impl JournalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
            JournalMode::Off => "OFF",
        }
    }
}

/// Settings for one conversion run.
///
/// # Examples
///
/// ```
/// use gtfs2db_bundle::{JournalMode, LoadConfig};
///
/// let config: LoadConfig = serde_yaml::from_str("batch_size: 500\njournal_mode: wal\n").unwrap();
/// assert_eq!(config.batch_size, 500);
/// assert_eq!(config.journal_mode, JournalMode::Wal);
/// assert_eq!(config.read_buffer_size, 20 * 1024);
/// assert!(config.create_indexes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Successful inserts per committed transaction.
    pub batch_size: usize,
    /// Capacity of the CSV reader's buffer, in bytes.
    pub read_buffer_size: usize,
    /// Run each file's index statements after it loads.
    pub create_indexes: bool,
    /// Enforce `REFERENCES` constraints while loading.
    pub foreign_keys: bool,
    pub synchronous: Synchronous,
    pub journal_mode: JournalMode,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            create_indexes: true,
            foreign_keys: false,
            synchronous: Synchronous::default(),
            journal_mode: JournalMode::default(),
        }
    }
}

impl LoadConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](BundleError::Io) if the file cannot be read,
    /// [`Yaml`](BundleError::Yaml) if parsing fails, or
    /// [`InvalidConfig`](BundleError::InvalidConfig) if a value is out of
    /// range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](BundleError::Io) if the file cannot be written, or
    /// [`Yaml`](BundleError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks that sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](BundleError::InvalidConfig) if the batch
    /// size or read buffer size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BundleError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(BundleError::InvalidConfig(
                "read_buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
batch_size: 100
read_buffer_size: 4096
create_indexes: false
foreign_keys: true
synchronous: full
journal_mode: wal
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: LoadConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.read_buffer_size, 4096);
        assert!(!config.create_indexes);
        assert!(config.foreign_keys);
        assert_eq!(config.synchronous, Synchronous::Full);
        assert_eq!(config.journal_mode, JournalMode::Wal);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: LoadConfig = serde_yaml::from_str("foreign_keys: true\n").unwrap();
        assert_eq!(
            config,
            LoadConfig {
                foreign_keys: true,
                ..LoadConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_pragma_value_rejected() {
        assert!(serde_yaml::from_str::<LoadConfig>("synchronous: sometimes\n").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = LoadConfig::default();
        assert_eq!(config.batch_size, 2048);
        assert_eq!(config.read_buffer_size, 20480);
        assert!(config.create_indexes);
        assert!(!config.foreign_keys);
        assert_eq!(config.synchronous.as_str(), "NORMAL");
        assert_eq!(config.journal_mode.as_str(), "DELETE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let config = LoadConfig {
            batch_size: 0,
            ..LoadConfig::default()
        };
        assert!(matches!(config.validate(), Err(BundleError::InvalidConfig(_))));

        let config = LoadConfig {
            read_buffer_size: 0,
            ..LoadConfig::default()
        };
        assert!(matches!(config.validate(), Err(BundleError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtfs2db.yml");

        let original: LoadConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();
        assert_eq!(LoadConfig::load(&path).unwrap(), original);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtfs2db.yml");
        std::fs::write(&path, "batch_size: 0\n").unwrap();
        assert!(matches!(
            LoadConfig::load(&path),
            Err(BundleError::InvalidConfig(_))
        ));
    }
}
