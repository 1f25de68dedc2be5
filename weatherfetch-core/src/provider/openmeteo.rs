use serde::Deserialize;
use tracing::warn;

use crate::{
    error::ParseError,
    model::{CONDITION_CLEAR, DayRecord, ForecastBatch, celsius_to_kelvin},
};

use super::{ForecastProvider, ProviderId};

const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_FIELDS: &str = "temperature_2m_min,temperature_2m_max,weather_code";

/// Open-Meteo daily forecast. Needs coordinates only.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMeteoProvider;

#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: Option<OmDaily>,
}

/// All three arrays are required; a missing one is a schema mismatch.
#[derive(Debug, Deserialize)]
struct OmDaily {
    temperature_2m_min: Vec<Option<f64>>,
    temperature_2m_max: Vec<Option<f64>>,
    weather_code: Vec<Option<i64>>,
}

impl ForecastProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    fn build_url(&self, _city_name: &str, lat: &str, lon: &str, _api_key: &str) -> String {
        if lat.is_empty() || lon.is_empty() {
            return String::new();
        }
        format!(
            "{FORECAST_ENDPOINT}?latitude={lat}&longitude={lon}&daily={DAILY_FIELDS}&timezone=auto"
        )
    }

    fn parse_forecast(&self, raw_json: &str) -> Result<ForecastBatch, ParseError> {
        let parsed: OmResponse = serde_json::from_str(raw_json)
            .map_err(|source| ParseError::Json { provider: self.id(), source })?;

        let daily = parsed.daily.ok_or(ParseError::MissingDaily { provider: self.id() })?;

        let lens = [
            daily.temperature_2m_min.len(),
            daily.temperature_2m_max.len(),
            daily.weather_code.len(),
        ];
        let available = lens.iter().copied().min().unwrap_or(0);
        if lens.iter().any(|&len| len != available) {
            warn!(
                min = lens[0],
                max = lens[1],
                codes = lens[2],
                "Open-Meteo daily arrays differ in length, using the shortest"
            );
        }

        let mut batch = ForecastBatch::new();
        for day in 0..available {
            let (Some(min), Some(max), Some(code)) = (
                daily.temperature_2m_min[day],
                daily.temperature_2m_max[day],
                daily.weather_code[day],
            ) else {
                warn!(day, "incomplete Open-Meteo day, truncating forecast");
                break;
            };

            let record = DayRecord {
                min_temp_kelvin: celsius_to_kelvin(min),
                max_temp_kelvin: celsius_to_kelvin(max),
                condition: condition_from_wmo(code, day),
            };
            if !batch.push(record) {
                break;
            }
        }

        Ok(batch)
    }
}

/// Translate a WMO weather interpretation code into the icon code space.
fn condition_from_wmo(code: i64, day: usize) -> i32 {
    match code {
        0 => 800,
        1 => 801,
        2 => 802,
        3 => 803,
        45 | 48 => 741,
        51 => 300,
        53 => 301,
        55 => 302,
        56 | 57 => 511,
        61 => 500,
        63 => 501,
        65 => 502,
        66 | 67 => 511,
        71 => 600,
        73 => 601,
        75 => 602,
        77 => 611,
        80 => 520,
        81 => 521,
        82 => 522,
        85 => 620,
        86 => 621,
        95 => 211,
        96 => 201,
        99 => 202,
        _ => {
            warn!(code, day, "unknown WMO weather code, using clear");
            CONDITION_CLEAR
        }
    }
}
