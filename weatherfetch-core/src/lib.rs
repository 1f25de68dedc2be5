//! Core library for `weatherfetch`.
//!
//! This crate defines:
//! - Saved locations & configuration handling
//! - Forecast providers (request URL + response normalization)
//! - The HTTP fetcher and the settings stores read by the display app
//! - The fetch → parse → persist pipeline
//!
//! It is used by `weatherfetch-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod fetch;
pub mod location;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod provider;
pub mod store;

pub use config::{Config, ProviderConfig, StoreConfig};
pub use error::{FetchError, LocationError, ParseError, PipelineError, StoreError};
pub use fetch::{Fetcher, HttpFetcher};
pub use location::{Location, LocationList};
pub use model::{DayRecord, ForecastBatch, MAX_FORECAST_DAYS};
pub use persist::persist_forecast;
pub use pipeline::{CycleReport, Outcome, Pipeline, PipelineState};
pub use provider::{ForecastProvider, ProviderId};
pub use store::{FileStore, GSettingsStore, MemoryStore, SettingsStore, open_store};
