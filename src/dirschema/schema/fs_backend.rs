use super::backend::StorageBackend;
use crate::config::SchemaConfig;
use crate::error::{DirError, Result};
use crate::model::{ReadinessMarker, SchemaObject};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MARKER_FILE: &str = ".ready.json";

pub struct FsBackend {
    root: PathBuf,
    file_ext: String,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            file_ext: ".json".to_string(),
        }
    }

    pub fn from_config(config: &SchemaConfig) -> Self {
        Self::new(config.schema_dir.clone()).with_file_ext(config.file_ext())
    }

    pub fn with_file_ext(mut self, ext: &str) -> Self {
        if ext.starts_with('.') {
            self.file_ext = ext.to_string();
        } else {
            self.file_ext = format!(".{}", ext);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Path of the record file for `name`, or None if the name cannot be a
    /// file name.
    pub fn record_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0'])
        {
            return None;
        }
        Some(self.root.join(format!("{}{}", name, self.file_ext)))
    }

    fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DirError::Io)?;
        }
        Ok(())
    }

    fn write_atomic<T: Serialize>(&self, target: &Path, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(value).map_err(DirError::Serialization)?;

        let tmp_path = self.root.join(format!(".record-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(DirError::Io)?;
        if let Err(err) = fs::rename(&tmp_path, target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(DirError::Io(err));
        }
        Ok(())
    }

    fn record_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(DirError::Io)? {
            let path = entry.map_err(DirError::Io)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !name.starts_with('.') && name.ends_with(&self.file_ext) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl StorageBackend for FsBackend {
    fn is_initialized(&self) -> bool {
        self.root.is_dir()
    }

    fn initialize(&self) -> Result<()> {
        self.ensure_dir()
    }

    fn read_record(&self, name: &str) -> Result<Option<SchemaObject>> {
        let Some(path) = self.record_path(name) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(DirError::Io)?;
        let record = serde_json::from_str(&content).map_err(DirError::Serialization)?;
        Ok(Some(record))
    }

    fn write_record(&self, name: &str, record: &SchemaObject) -> Result<()> {
        let path = self
            .record_path(name)
            .ok_or_else(|| DirError::Store(format!("Invalid schema record name '{}'", name)))?;
        self.write_atomic(&path, record)
    }

    fn delete_records(&self) -> Result<usize> {
        let files = self.record_files()?;
        for path in &files {
            fs::remove_file(path).map_err(DirError::Io)?;
        }
        Ok(files.len())
    }

    fn list_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .record_files()?
            .iter()
            .filter_map(|path| {
                let file_name = path.file_name()?.to_str()?;
                file_name
                    .strip_suffix(self.file_ext.as_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn has_marker(&self) -> bool {
        self.marker_path().is_file()
    }

    fn read_marker(&self) -> Result<Option<ReadinessMarker>> {
        let path = self.marker_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(DirError::Io)?;
        let marker = serde_json::from_str(&content).map_err(DirError::Serialization)?;
        Ok(Some(marker))
    }

    fn write_marker(&self, marker: &ReadinessMarker) -> Result<()> {
        self.write_atomic(&self.marker_path(), marker)
    }

    fn delete_marker(&self) -> Result<()> {
        let path = self.marker_path();
        if path.exists() {
            fs::remove_file(path).map_err(DirError::Io)?;
        }
        Ok(())
    }
}
