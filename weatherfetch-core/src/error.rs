use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderId;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("No saved locations.\nHint: run `weatherfetch --add <LAT> <LNG> <NAME>` first.")]
    Empty,
}

/// Network-layer failure while retrieving a forecast.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Provider payload could not be turned into day records.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse {provider} forecast JSON")]
    Json {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} forecast JSON has no daily section")]
    MissingDaily { provider: ProviderId },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read settings file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings to TOML")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write settings file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run `gsettings set {schema} {key}`")]
    Spawn {
        schema: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`gsettings set {schema} {key}` exited with {status}: {stderr}")]
    Command {
        schema: String,
        key: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Could not determine platform data directory")]
    NoDataDir,
}

/// Reasons a fetch cycle ends in `ErrorDone`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    NoActiveLocation(#[from] LocationError),

    #[error("{provider} cannot build a request URL for '{city}' (missing coordinates or API key)")]
    EmptyUrl { provider: ProviderId, city: String },

    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
