//! One fetch cycle: build URL, fetch, normalize, persist.
//!
//! ```text
//! Idle -> Fetching -> Parsing -> Persisting -> Done
//!   \         \                      \
//!    +---------+----------------------+--> ErrorDone
//! ```
//!
//! [`Pipeline::run`] consumes the pipeline, so a cycle reaches a terminal
//! state exactly once.

use std::fmt;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::{
    error::PipelineError,
    fetch::Fetcher,
    location::LocationList,
    persist::persist_forecast,
    provider::ForecastProvider,
    store::SettingsStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Parsing,
    Persisting,
    Done,
    ErrorDone,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Fetching => "fetching",
            PipelineState::Parsing => "parsing",
            PipelineState::Persisting => "persisting",
            PipelineState::Done => "done",
            PipelineState::ErrorDone => "error-done",
        };
        f.write_str(s)
    }
}

/// What a completed cycle wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub city_name: String,
    pub days: usize,
}

#[derive(Debug)]
pub enum Outcome {
    Done(CycleReport),
    ErrorDone {
        /// State the cycle was in when it failed.
        failed_in: PipelineState,
        error: PipelineError,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

pub struct Pipeline<'a> {
    provider: &'a dyn ForecastProvider,
    fetcher: &'a dyn Fetcher,
    store: &'a mut dyn SettingsStore,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn ForecastProvider,
        fetcher: &'a dyn Fetcher,
        store: &'a mut dyn SettingsStore,
    ) -> Self {
        Self { provider, fetcher, store, state: PipelineState::Idle }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Fetch and persist the forecast for the active location.
    pub async fn run(mut self, locations: &LocationList, api_key: &str) -> Outcome {
        match self.cycle(locations, api_key).await {
            Ok(report) => {
                self.advance(PipelineState::Done);
                info!(city = %report.city_name, days = report.days, "weather updated");
                Outcome::Done(report)
            }
            Err(error) => {
                let failed_in = self.state;
                self.advance(PipelineState::ErrorDone);
                error!(state = %failed_in, error = %error, "weather update failed");
                Outcome::ErrorDone { failed_in, error }
            }
        }
    }

    async fn cycle(
        &mut self,
        locations: &LocationList,
        api_key: &str,
    ) -> Result<CycleReport, PipelineError> {
        let location = locations.active()?;

        let url = self.provider.build_url(&location.name, &location.lat, &location.lng, api_key);
        if url.is_empty() {
            return Err(PipelineError::EmptyUrl {
                provider: self.provider.id(),
                city: location.name.clone(),
            });
        }
        info!(provider = %self.provider.id(), %url, "fetching forecast");

        self.advance(PipelineState::Fetching);
        let body = self.fetcher.fetch(&url).await?;

        self.advance(PipelineState::Parsing);
        let batch = self.provider.normalize(&body);

        self.advance(PipelineState::Persisting);
        persist_forecast(&mut *self.store, &location.name, &batch, Utc::now())?;

        Ok(CycleReport { city_name: location.name.clone(), days: batch.len() })
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FetchError, LocationError},
        location::Location,
        persist::{KEY_CITY_NAME, KEY_TIMESTAMP, WEATHER_SCHEMA},
        provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// Serves a canned body and records requested URLs.
    #[derive(Debug, Default)]
    struct CannedFetcher {
        body: String,
        fail: bool,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn ok(body: &str) -> Self {
            Self { body: body.to_string(), ..Self::default() }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if self.fail {
                // An unparseable URL gives a real reqwest error without any I/O.
                let source = reqwest::Client::new().get("not a url").send().await.unwrap_err();
                return Err(FetchError::Transport { url: url.to_string(), source });
            }
            Ok(self.body.clone())
        }
    }

    fn boston() -> LocationList {
        LocationList::new(vec![Location::new("Boston", "42.3601", "-71.0589")])
    }

    const ONE_DAY: &str = r#"{"daily":{"temperature_2m_min":[8.8],"temperature_2m_max":[23.2],"weather_code":[3]}}"#;

    #[tokio::test]
    async fn successful_cycle_persists_forecast() {
        let fetcher = CannedFetcher::ok(ONE_DAY);
        let mut store = MemoryStore::new();

        let outcome = Pipeline::new(&OpenMeteoProvider, &fetcher, &mut store)
            .run(&boston(), "")
            .await;

        match outcome {
            Outcome::Done(report) => {
                assert_eq!(report.city_name, "Boston");
                assert_eq!(report.days, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fetcher.calls(), 1);
        assert!(fetcher.urls.lock().unwrap()[0].contains("latitude=42.3601"));
        assert_eq!(store.get_int("org.asteroidos.weather.day0", "id"), Some(803));
        assert!(store.get_int(WEATHER_SCHEMA, KEY_TIMESTAMP).is_some());
        assert_eq!(store.sync_count(), 1);
    }

    #[tokio::test]
    async fn parse_failure_still_persists_city_and_timestamp() {
        let fetcher = CannedFetcher::ok("<html>502 Bad Gateway</html>");
        let mut store = MemoryStore::new();

        let outcome = Pipeline::new(&OpenMeteoProvider, &fetcher, &mut store)
            .run(&boston(), "")
            .await;

        assert!(outcome.is_success());
        assert_eq!(store.get_string(WEATHER_SCHEMA, KEY_CITY_NAME), Some("Boston"));
        assert!(store.get_int(WEATHER_SCHEMA, KEY_TIMESTAMP).is_some());
        assert_eq!(store.get_int("org.asteroidos.weather.day0", "min-temp"), None);
    }

    #[tokio::test]
    async fn empty_url_short_circuits_without_fetching() {
        let fetcher = CannedFetcher::ok(ONE_DAY);
        let mut store = MemoryStore::new();

        let outcome = Pipeline::new(&OpenWeatherProvider, &fetcher, &mut store)
            .run(&boston(), "")
            .await;

        assert!(matches!(
            outcome,
            Outcome::ErrorDone { failed_in: PipelineState::Idle, error: PipelineError::EmptyUrl { .. } }
        ));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.sync_count(), 0);
    }

    #[tokio::test]
    async fn no_active_location_is_error_done() {
        let fetcher = CannedFetcher::ok(ONE_DAY);
        let mut store = MemoryStore::new();

        let outcome = Pipeline::new(&OpenMeteoProvider, &fetcher, &mut store)
            .run(&LocationList::default(), "")
            .await;

        assert!(matches!(
            outcome,
            Outcome::ErrorDone { error: PipelineError::NoActiveLocation(LocationError::Empty), .. }
        ));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn transport_error_skips_persistence() {
        let fetcher = CannedFetcher::failing();
        let mut store = MemoryStore::new();

        let outcome = Pipeline::new(&OpenMeteoProvider, &fetcher, &mut store)
            .run(&boston(), "")
            .await;

        assert!(matches!(
            outcome,
            Outcome::ErrorDone { failed_in: PipelineState::Fetching, error: PipelineError::Transport(_) }
        ));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.sync_count(), 0);
        assert_eq!(store.get_string(WEATHER_SCHEMA, KEY_CITY_NAME), None);
    }

    #[test]
    fn new_pipeline_is_idle() {
        let fetcher = CannedFetcher::ok(ONE_DAY);
        let mut store = MemoryStore::new();
        let pipeline = Pipeline::new(&OpenMeteoProvider, &fetcher, &mut store);
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }
}
