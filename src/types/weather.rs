use serde::{Deserialize, Serialize};

/// Weather data the caller already fetched for the selected city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

/// Current conditions in metric units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    pub description: String,
    pub details: String,
    /// m/s
    pub wind_speed: f64,
    /// Cloud cover percentage
    pub clouds: f64,
    /// Metres
    pub visibility: Option<f64>,
    pub city: String,
    pub country: String,
    pub uvi: Option<f64>,
    /// Unix timestamp
    pub sunrise: Option<i64>,
    /// Unix timestamp
    pub sunset: Option<i64>,
    /// Offset from UTC in seconds
    pub timezone: Option<i32>,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
    pub wind_deg: Option<f64>,
    pub dt: Option<i64>,
}

/// One forecast slot, `time` formatted as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastEntry {
    pub time: String,
    pub temp: f64,
    pub description: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rain: f64,
}

impl WeatherSnapshot {
    pub fn city(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|current| current.city.as_str())
            .filter(|city| !city.trim().is_empty())
    }
}

impl ForecastEntry {
    pub fn date(&self) -> &str {
        self.time.split(' ').next().unwrap_or_default()
    }

    pub fn hour(&self) -> Option<u32> {
        self.time
            .split(' ')
            .nth(1)?
            .split(':')
            .next()?
            .parse()
            .ok()
    }
}
