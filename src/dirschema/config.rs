//! # Configuration
//!
//! The schema store is configured by a small JSON file, `dirschema.json`,
//! looked up in a caller-chosen directory. Missing files yield the defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `schema_dir` | `<cache dir>/dirschema/schema` | Where schema records are persisted |
//! | `page_size` | `500` | Page size used for both schema retrieval tasks |
//! | `file_ext` | `.json` | Extension of persisted record files |

use crate::error::{DirError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "dirschema.json";
const DEFAULT_FILE_EXT: &str = ".json";
pub const DEFAULT_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Directory holding one record file per schema name plus the readiness marker
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Page size for the attribute and class retrieval tasks
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Extension for record files (e.g. ".json")
    #[serde(default = "default_file_ext")]
    pub file_ext: String,
}

fn default_schema_dir() -> PathBuf {
    ProjectDirs::from("", "", "dirschema")
        .map(|dirs| dirs.cache_dir().join("schema"))
        .unwrap_or_else(|| std::env::temp_dir().join("dirschema").join("schema"))
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_file_ext() -> String {
    DEFAULT_FILE_EXT.to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            page_size: DEFAULT_PAGE_SIZE,
            file_ext: DEFAULT_FILE_EXT.to_string(),
        }
    }
}

impl SchemaConfig {
    /// Defaults, but persisting records under `schema_dir`.
    pub fn with_schema_dir<P: Into<PathBuf>>(schema_dir: P) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            ..Self::default()
        }
    }

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DirError::Io)?;
        let mut config: SchemaConfig =
            serde_json::from_str(&content).map_err(DirError::Serialization)?;
        let ext = config.file_ext.clone();
        config.set_file_ext(&ext);
        if config.page_size == 0 {
            return Err(DirError::Store("page_size must be positive".to_string()));
        }
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DirError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DirError::Serialization)?;
        fs::write(config_path, content).map_err(DirError::Io)?;
        Ok(())
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Set the file extension (normalizes to start with a dot)
    pub fn set_file_ext(&mut self, ext: &str) {
        if ext.starts_with('.') {
            self.file_ext = ext.to_string();
        } else {
            self.file_ext = format!(".{}", ext);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.page_size, 500);
        assert_eq!(config.file_ext(), ".json");
        assert!(config.schema_dir.ends_with("schema"));
    }

    #[test]
    fn test_set_file_ext_without_dot() {
        let mut config = SchemaConfig::default();
        config.set_file_ext("cache");
        assert_eq!(config.file_ext(), ".cache");
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = SchemaConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, SchemaConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = SchemaConfig::with_schema_dir(temp_dir.path().join("records"));
        config.page_size = 100;
        config.save(temp_dir.path()).unwrap();

        let loaded = SchemaConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{ "page_size": 50, "file_ext": "dat" }"#,
        )
        .unwrap();

        let loaded = SchemaConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded.page_size, 50);
        assert_eq!(loaded.file_ext(), ".dat");
        assert_eq!(loaded.schema_dir, default_schema_dir());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), r#"{ "page_size": 0 }"#).unwrap();

        assert!(SchemaConfig::load(temp_dir.path()).is_err());
    }
}
