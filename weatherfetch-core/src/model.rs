use serde::{Deserialize, Serialize};

/// Maximum number of days kept from any provider response.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Offset used by the display app when storing Celsius as Kelvin.
pub const CELSIUS_OFFSET: f64 = 272.15;

/// Icon code for "clear sky"; substituted for anything unrecognized.
pub const CONDITION_CLEAR: i32 = 800;

/// Icon codes understood by the display app.
const KNOWN_CONDITIONS: &[i32] = &[
    200, 201, 202, 210, 211, 212, 221, 230, 231, 232, // thunderstorm
    300, 301, 302, 310, 311, 312, 313, 314, 321, // drizzle
    500, 501, 502, 503, 504, 511, 520, 521, 522, 531, // rain
    600, 601, 602, 611, 612, 613, 615, 616, 620, 621, 622, // snow
    701, 711, 721, 731, 741, 751, 761, 762, 771, 781, // atmosphere
    800, 801, 802, 803, 804, // clear & clouds
];

pub fn is_known_condition(code: i32) -> bool {
    KNOWN_CONDITIONS.contains(&code)
}

/// Round half up: add 0.5 and take the floor.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn celsius_to_kelvin(celsius: f64) -> i32 {
    round_half_up(celsius + CELSIUS_OFFSET)
}

/// One normalized forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub min_temp_kelvin: i32,
    pub max_temp_kelvin: i32,
    pub condition: i32,
}

/// Chronological day records for one fetch cycle, never longer than
/// [`MAX_FORECAST_DAYS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastBatch {
    days: Vec<DayRecord>,
}

impl ForecastBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a day; returns `false` once the batch is full.
    pub fn push(&mut self, day: DayRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.days.push(day);
        true
    }

    pub fn is_full(&self) -> bool {
        self.days.len() >= MAX_FORECAST_DAYS
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<DayRecord> for ForecastBatch {
    fn from_iter<I: IntoIterator<Item = DayRecord>>(iter: I) -> Self {
        let days = iter.into_iter().take(MAX_FORECAST_DAYS).collect();
        Self { days }
    }
}
