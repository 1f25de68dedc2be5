use crate::{
    Config, ForecastBatch,
    error::ParseError,
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use std::{convert::TryFrom, fmt::Debug};
use tracing::warn;

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderId {
    #[default]
    OpenMeteo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::OpenWeather]
    }

    /// Whether the provider refuses to build a URL without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, openweather."
            )),
        }
    }
}

/// A weather source: how to ask for a forecast and how to read the answer.
///
/// Implementations are pure; the network round-trip lives in
/// [`crate::fetch::Fetcher`].
pub trait ForecastProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Request URL for a location, or an empty string when a field the
    /// provider needs is blank.
    fn build_url(&self, city_name: &str, lat: &str, lon: &str, api_key: &str) -> String;

    fn parse_forecast(&self, raw_json: &str) -> Result<ForecastBatch, ParseError>;

    /// Like [`parse_forecast`](Self::parse_forecast), but a malformed payload
    /// is logged and yields an empty batch.
    fn normalize(&self, raw_json: &str) -> ForecastBatch {
        self.parse_forecast(raw_json).unwrap_or_else(|err| {
            warn!(provider = %self.id(), error = %err, "discarding unparseable forecast");
            ForecastBatch::default()
        })
    }
}

pub fn provider_for(id: ProviderId) -> Box<dyn ForecastProvider> {
    match id {
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider),
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider),
    }
}

/// Construct the provider selected in config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let id = config.provider_id()?;
    Ok(provider_for(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("OpenWeather").unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_default_config_is_open_meteo() {
        let cfg = Config::default();
        let provider = provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::OpenMeteo);
    }

    #[test]
    fn provider_from_config_rejects_unknown_id() {
        let cfg = Config { provider: Some("nope".into()), ..Config::default() };
        assert!(provider_from_config(&cfg).is_err());
    }

    #[test]
    fn providers_are_interchangeable_behind_the_trait() {
        for id in ProviderId::all() {
            let provider = provider_for(*id);
            assert_eq!(provider.id(), *id);
            let url = provider.build_url("Boston", "42.3601", "-71.0589", "KEY");
            assert!(url.contains("42.3601"));
            assert!(provider.normalize("not json").is_empty());
        }
    }
}
