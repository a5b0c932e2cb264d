use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tracked zip code. Always a string of ASCII digits with a nonzero value.
///
/// Deserializing goes through [`LocationCode::parse`], so snapshots cannot
/// smuggle in codes that user input would have rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationCode(String);

impl LocationCode {
    /// Validate user input. Surrounding whitespace is ignored; leading zeros are kept.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let trimmed = raw.trim();
        let digits = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());
        if !digits || trimmed.bytes().all(|b| b == b'0') {
            return Err(LocationError::Invalid(raw.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocationCode {
    type Error = LocationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<LocationCode> for String {
    fn from(code: LocationCode) -> Self {
        code.0
    }
}

impl FromStr for LocationCode {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One entry of the `weather` array returned by OpenWeatherMap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDescriptor {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

/// Current conditions for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// Place name resolved by the provider
    pub name: String,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Option<Wind>,
    /// Observation time, unix seconds
    #[serde(default)]
    pub dt: Option<i64>,
}

impl Conditions {
    /// Short headline such as "Clouds", empty when the provider sent no descriptor
    pub fn summary(&self) -> &str {
        self.weather.first().map(|w| w.main.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Start of the forecast day, unix seconds
    pub dt: i64,
    pub temp: DailyTemperature,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    #[serde(default)]
    pub humidity: Option<u8>,
}

impl DailyForecast {
    pub fn date(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp(self.dt, 0).map(|dt| dt.date_naive())
    }

    pub fn summary(&self) -> &str {
        self.weather.first().map(|w| w.main.as_str()).unwrap_or("")
    }
}

/// Multi-day forecast for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: ForecastCity,
    #[serde(default)]
    pub list: Vec<DailyForecast>,
}

/// Location validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Invalid location code: {0:?}")]
    Invalid(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Durable store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Corrupt {key} snapshot: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
