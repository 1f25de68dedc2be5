use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::LocationError,
    location::{Location, LocationList},
    provider::ProviderId,
};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Where forecasts are written for the display app. The app reads GSettings,
/// so that is the default; the file backend is for hosts without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    #[default]
    GSettings,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional provider id, e.g. "openmeteo" or "openweather".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Request timeout for forecast fetches; none when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub store: StoreConfig,

    /// Saved locations; the first one is fetched.
    #[serde(default)]
    pub locations: LocationList,
}

impl Config {
    /// The configured provider, falling back to Open-Meteo when unset.
    pub fn provider_id(&self) -> Result<ProviderId> {
        match self.provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::default()),
        }
    }

    pub fn set_provider(&mut self, id: ProviderId) {
        self.provider = Some(id.as_str().to_string());
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn active_location(&self) -> Result<&Location, LocationError> {
        self.locations.active()
    }

    /// API key for the active provider, or "" when none is configured.
    pub fn api_key(&self) -> Result<&str> {
        let id = self.provider_id()?;
        Ok(self.provider_api_key(id).unwrap_or_default())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Default path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "asteroidos", "weatherfetch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key()
            || self.provider_api_key(provider_id).is_some_and(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults_to_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.provider_id().unwrap(), ProviderId::OpenMeteo);
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn api_key_follows_active_provider() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        assert_eq!(cfg.api_key().unwrap(), "");

        cfg.set_provider(ProviderId::OpenWeather);
        assert_eq!(cfg.api_key().unwrap(), "OPEN_KEY");
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn unknown_provider_is_error() {
        let cfg = Config { provider: Some("darksky".into()), ..Config::default() };
        assert!(cfg.provider_id().is_err());
        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.locations.is_empty());
        assert_eq!(cfg.store, StoreConfig::GSettings);
    }

    #[test]
    fn save_and_load_roundtrip_keeps_location_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_provider(ProviderId::OpenWeather);
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
        cfg.locations.push_back(Location::new("Boston", "42.3601", "-71.0589"));
        cfg.locations.push_back(Location::from_coords("Oslo", 59.9139, 10.7522));
        cfg.store = StoreConfig::File { path: Some(dir.path().join("weather.toml")) };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.locations, cfg.locations);
        assert_eq!(loaded.api_key().unwrap(), "KEY");
        assert_eq!(loaded.store, cfg.store);
        assert_eq!(loaded.active_location().unwrap().name, "Boston");
    }

    #[test]
    fn parses_hand_written_file() {
        let toml = r#"
            timeout_secs = 15

            [store]
            backend = "file"
            path = "/tmp/weather.toml"

            [[locations]]
            name = "Boston"
            lat = "42.3601"
            lng = "-71.0589"
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.store, StoreConfig::File { path: Some("/tmp/weather.toml".into()) });
        assert_eq!(cfg.locations.len(), 1);
    }
}
