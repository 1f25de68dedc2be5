//! Key-value settings stores read by the display app.
//!
//! Keys are grouped by schema, e.g. `org.asteroidos.weather.day0`. Writes may
//! be buffered until [`SettingsStore::sync`] returns.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::PathBuf,
    process::Command,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::StoreConfig, error::StoreError};

pub trait SettingsStore: Send {
    fn set_string(&mut self, schema: &str, key: &str, value: &str) -> Result<(), StoreError>;

    fn set_int(&mut self, schema: &str, key: &str, value: i64) -> Result<(), StoreError>;

    /// Make every write so far durable.
    fn sync(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Text(String),
}

type SchemaMap = BTreeMap<String, BTreeMap<String, SettingValue>>;

/// In-process store; nothing outlives the value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    values: SchemaMap,
    syncs: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &str, key: &str) -> Option<&SettingValue> {
        self.values.get(schema)?.get(key)
    }

    pub fn get_int(&self, schema: &str, key: &str) -> Option<i64> {
        match self.get(schema, key)? {
            SettingValue::Int(v) => Some(*v),
            SettingValue::Text(_) => None,
        }
    }

    pub fn get_string(&self, schema: &str, key: &str) -> Option<&str> {
        match self.get(schema, key)? {
            SettingValue::Text(v) => Some(v),
            SettingValue::Int(_) => None,
        }
    }

    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn sync_count(&self) -> usize {
        self.syncs
    }

    fn insert(&mut self, schema: &str, key: &str, value: SettingValue) {
        self.values.entry(schema.to_string()).or_default().insert(key.to_string(), value);
    }
}

impl SettingsStore for MemoryStore {
    fn set_string(&mut self, schema: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert(schema, key, SettingValue::Text(value.to_string()));
        Ok(())
    }

    fn set_int(&mut self, schema: &str, key: &str, value: i64) -> Result<(), StoreError> {
        self.insert(schema, key, SettingValue::Int(value));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        self.syncs += 1;
        Ok(())
    }
}

/// TOML file with one table per schema. Existing keys are preserved; writes
/// are buffered and land atomically on [`sync`](SettingsStore::sync).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: SchemaMap,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|source| StoreError::Read { path: path.clone(), source })?;
            toml::from_str(&contents)
                .map_err(|source| StoreError::Parse { path: path.clone(), source })?
        } else {
            SchemaMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs =
            ProjectDirs::from("org", "asteroidos", "weatherfetch").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().join("weather.toml"))
    }

    pub fn get(&self, schema: &str, key: &str) -> Option<&SettingValue> {
        self.values.get(schema)?.get(key)
    }

    fn insert(&mut self, schema: &str, key: &str, value: SettingValue) {
        self.values.entry(schema.to_string()).or_default().insert(key.to_string(), value);
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write { path: self.path.clone(), source }
    }
}

impl SettingsStore for FileStore {
    fn set_string(&mut self, schema: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert(schema, key, SettingValue::Text(value.to_string()));
        Ok(())
    }

    fn set_int(&mut self, schema: &str, key: &str, value: i64) -> Result<(), StoreError> {
        self.insert(schema, key, SettingValue::Int(value));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let toml = toml::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("toml.tmp");

        let mut file = fs::File::create(&tmp).map_err(|e| self.write_err(e))?;
        file.write_all(toml.as_bytes()).map_err(|e| self.write_err(e))?;
        file.sync_all().map_err(|e| self.write_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_err(e))?;

        debug!(path = %self.path.display(), "settings synced");
        Ok(())
    }
}

/// Writes through the `gsettings` command line tool.
#[derive(Debug, Clone)]
pub struct GSettingsStore {
    program: String,
}

impl Default for GSettingsStore {
    fn default() -> Self {
        Self { program: "gsettings".to_string() }
    }
}

impl GSettingsStore {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn set(&self, schema: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let output = Command::new(&self.program)
            .args(["set", schema, key, value])
            .output()
            .map_err(|source| StoreError::Spawn {
                schema: schema.to_string(),
                key: key.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(StoreError::Command {
                schema: schema.to_string(),
                key: key.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl SettingsStore for GSettingsStore {
    fn set_string(&mut self, schema: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.set(schema, key, &gvariant_string(value))
    }

    fn set_int(&mut self, schema: &str, key: &str, value: i64) -> Result<(), StoreError> {
        self.set(schema, key, &value.to_string())
    }

    // Each `gsettings set` commits before exiting.
    fn sync(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// GVariant text form of a string literal.
fn gvariant_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Open the store selected in config.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn SettingsStore>, StoreError> {
    match config {
        StoreConfig::File { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => FileStore::default_path()?,
            };
            debug!(path = %path.display(), "using file settings store");
            Ok(Box::new(FileStore::open(path)?))
        }
        StoreConfig::GSettings => Ok(Box::new(GSettingsStore::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_overwrites_values() {
        let mut store = MemoryStore::new();
        store.set_int("s", "k", 1).unwrap();
        store.set_int("s", "k", 2).unwrap();
        store.set_string("s", "name", "Boston").unwrap();

        assert_eq!(store.get_int("s", "k"), Some(2));
        assert_eq!(store.get_string("s", "name"), Some("Boston"));
        assert_eq!(store.get_int("s", "name"), None);
    }

    #[test]
    fn file_store_writes_only_on_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather.toml");

        let mut store = FileStore::open(&path).unwrap();
        store.set_string("org.asteroidos.weather", "city-name", "Boston").unwrap();
        store.set_int("org.asteroidos.weather.day0", "min-temp", 281).unwrap();
        assert!(!path.exists());

        store.sync().unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("org.asteroidos.weather", "city-name"),
            Some(&SettingValue::Text("Boston".into()))
        );
        assert_eq!(
            reopened.get("org.asteroidos.weather.day0", "min-temp"),
            Some(&SettingValue::Int(281))
        );
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.toml");
        fs::write(&path, "[\"org.asteroidos.weather\"]\nprefers-fahrenheit = 1\n").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        store.set_string("org.asteroidos.weather", "city-name", "Oslo").unwrap();
        store.sync().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("org.asteroidos.weather", "prefers-fahrenheit"),
            Some(&SettingValue::Int(1))
        );
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn gvariant_strings_are_quoted() {
        assert_eq!(gvariant_string("Boston"), "'Boston'");
        assert_eq!(gvariant_string("St. John's"), "'St. John\\'s'");
    }

    #[test]
    fn missing_gsettings_binary_is_spawn_error() {
        let mut store = GSettingsStore::with_program("/nonexistent/gsettings");
        let err = store.set_int("org.asteroidos.weather", "timestamp-day0", 1).unwrap_err();
        assert!(matches!(err, StoreError::Spawn { .. }));
    }
}
