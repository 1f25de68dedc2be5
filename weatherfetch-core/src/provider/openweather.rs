use serde::Deserialize;
use tracing::warn;

use crate::{
    error::ParseError,
    model::{CONDITION_CLEAR, DayRecord, ForecastBatch, is_known_condition, round_half_up},
};

use super::{ForecastProvider, ProviderId};

const ONECALL_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/onecall";
const EXCLUDE: &str = "current,minutely,hourly,alerts";

/// OpenWeather One Call API. Needs a city name, coordinates and an API key.
///
/// Temperatures come back in Kelvin and condition ids are already icon codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWeatherProvider;

#[derive(Debug, Deserialize)]
struct OwResponse {
    daily: Option<Vec<OwDay>>,
}

#[derive(Debug, Deserialize)]
struct OwDay {
    temp: OwTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
}

impl ForecastProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    fn build_url(&self, city_name: &str, lat: &str, lon: &str, api_key: &str) -> String {
        if api_key.is_empty() || city_name.is_empty() || lat.is_empty() || lon.is_empty() {
            return String::new();
        }
        format!("{ONECALL_ENDPOINT}?lat={lat}&lon={lon}&exclude={EXCLUDE}&appid={api_key}")
    }

    fn parse_forecast(&self, raw_json: &str) -> Result<ForecastBatch, ParseError> {
        let parsed: OwResponse = serde_json::from_str(raw_json)
            .map_err(|source| ParseError::Json { provider: self.id(), source })?;

        let daily = parsed.daily.ok_or(ParseError::MissingDaily { provider: self.id() })?;

        Ok(daily
            .iter()
            .enumerate()
            .map(|(day, entry)| DayRecord {
                min_temp_kelvin: round_half_up(entry.temp.min),
                max_temp_kelvin: round_half_up(entry.temp.max),
                condition: condition_from_owm(entry.weather.first().map(|w| w.id), day),
            })
            .collect())
    }
}

fn condition_from_owm(id: Option<i32>, day: usize) -> i32 {
    match id {
        Some(code) if is_known_condition(code) => code,
        Some(code) => {
            warn!(code, day, "unknown OpenWeather condition id, using clear");
            CONDITION_CLEAR
        }
        None => {
            warn!(day, "OpenWeather day has no weather entry, using clear");
            CONDITION_CLEAR
        }
    }
}
