use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use tracing::{info, warn};
use weatherfetch_core::{
    Config, Fetcher, HttpFetcher, Location, Pipeline, ProviderId, SettingsStore, StoreConfig,
    StoreError, open_store, provider::provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherfetch",
    version,
    about = "Fetch the forecast for the first saved location and store it for the watch weather app"
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Add a location at the head of the list (it becomes the active one).
    #[arg(
        short,
        long,
        num_args = 3,
        value_names = ["LAT", "LNG", "NAME"],
        allow_negative_numbers = true
    )]
    pub add: Option<Vec<String>>,

    /// Delete the last location in the list.
    #[arg(short, long)]
    pub delete: bool,

    /// Move the active location to the end of the list.
    #[arg(short, long)]
    pub rotate: bool,

    /// Print saved locations as `lat,lng,"name"` lines.
    #[arg(short, long)]
    pub list: bool,

    /// Only edit the configuration; do not fetch weather.
    #[arg(short = 'n', long)]
    pub config_only: bool,

    /// Select the forecast provider ("openmeteo" or "openweather").
    #[arg(long, value_name = "ID")]
    pub provider: Option<String>,

    /// Store an API key for the selected provider.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Debug logging for the fetch pipeline.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        if self.apply_edits(&mut config)? {
            config.save_to(&config_path)?;
            info!(path = %config_path.display(), "configuration saved");
        }

        if self.list {
            print!("{}", config.locations);
        }

        let fetcher = HttpFetcher::new(config.timeout())?;
        self.execute(&config, &fetcher, open_store).await
    }

    /// Everything after the config edits. The store is opened only when a
    /// cycle actually runs.
    async fn execute<F>(&self, config: &Config, fetcher: &dyn Fetcher, open: F) -> Result<ExitCode>
    where
        F: FnOnce(&StoreConfig) -> Result<Box<dyn SettingsStore>, StoreError>,
    {
        if self.config_only {
            info!("config-only mode, not fetching");
            return Ok(ExitCode::SUCCESS);
        }

        let id = config.provider_id()?;
        if !config.is_provider_configured(id) {
            warn!(provider = %id, "no API key configured; set one with --api-key <KEY>");
        }

        let provider = provider_from_config(config)?;
        let mut store = open(&config.store)?;

        let outcome = Pipeline::new(provider.as_ref(), fetcher, store.as_mut())
            .run(&config.locations, config.api_key()?)
            .await;

        Ok(ExitCode::from(outcome.exit_code()))
    }

    /// Apply location and provider edits; returns whether anything changed.
    fn apply_edits(&self, config: &mut Config) -> Result<bool> {
        let mut changed = false;

        if let Some(args) = &self.add {
            let location = parse_location(args)?;
            info!(%location, "adding location");
            config.locations.push_front(location);
            changed = true;
        }

        if self.delete {
            match config.locations.remove_last() {
                Some(location) => {
                    info!(%location, "deleted location");
                    changed = true;
                }
                None => warn!("no saved locations to delete"),
            }
        }

        if self.rotate {
            config.locations.rotate();
            changed = true;
        }

        if let Some(provider) = &self.provider {
            let id = ProviderId::try_from(provider.as_str())?;
            config.set_provider(id);
            changed = true;
        }

        if let Some(api_key) = &self.api_key {
            let id = config.provider_id()?;
            config.upsert_provider_api_key(id, api_key.clone());
            changed = true;
        }

        Ok(changed)
    }
}

fn parse_location(args: &[String]) -> Result<Location> {
    let [lat, lng, name] = args else {
        anyhow::bail!("--add expects LAT LNG NAME");
    };

    let lat: f64 = lat.parse().with_context(|| format!("Invalid latitude '{lat}'"))?;
    let lng: f64 = lng.parse().with_context(|| format!("Invalid longitude '{lng}'"))?;
    ensure!((-90.0..=90.0).contains(&lat), "Latitude {lat} is outside -90..90");
    ensure!((-180.0..=180.0).contains(&lng), "Longitude {lng} is outside -180..180");
    ensure!(!name.trim().is_empty(), "Location name must not be empty");

    Ok(Location::from_coords(name.trim(), lat, lng))
}
