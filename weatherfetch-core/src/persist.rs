use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{error::StoreError, model::ForecastBatch, store::SettingsStore};

pub const WEATHER_SCHEMA: &str = "org.asteroidos.weather";
pub const KEY_CITY_NAME: &str = "city-name";
pub const KEY_TIMESTAMP: &str = "timestamp-day0";
pub const KEY_MIN_TEMP: &str = "min-temp";
pub const KEY_MAX_TEMP: &str = "max-temp";
pub const KEY_CONDITION: &str = "id";

pub fn day_schema(day: usize) -> String {
    format!("{WEATHER_SCHEMA}.day{day}")
}

/// Write a forecast cycle and sync the store.
///
/// The timestamp is written even for an empty batch. Day slots beyond the
/// batch keep whatever an earlier cycle left there.
pub fn persist_forecast(
    store: &mut dyn SettingsStore,
    city_name: &str,
    batch: &ForecastBatch,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    store.set_string(WEATHER_SCHEMA, KEY_CITY_NAME, city_name)?;

    for (day, record) in batch.days().iter().enumerate() {
        let schema = day_schema(day);
        store.set_int(&schema, KEY_MIN_TEMP, record.min_temp_kelvin.into())?;
        store.set_int(&schema, KEY_MAX_TEMP, record.max_temp_kelvin.into())?;
        store.set_int(&schema, KEY_CONDITION, record.condition.into())?;
    }

    store.set_int(WEATHER_SCHEMA, KEY_TIMESTAMP, now.timestamp())?;
    store.sync()?;

    debug!(city = city_name, days = batch.len(), "forecast persisted");
    Ok(())
}
