//! Remote weather lookups.
//!
//! [`WeatherProvider`] is the seam the dashboard fetches through;
//! [`OpenWeatherProvider`] talks to the OpenWeatherMap 2.5 API.

use crate::types::{Conditions, Forecast, LocationCode, WeatherError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Source of current conditions and forecasts, keyed by location code
pub trait WeatherProvider: Send + Sync {
    fn current_conditions(
        &self,
        code: &LocationCode,
    ) -> impl Future<Output = Result<Conditions, WeatherError>> + Send;

    fn forecast(
        &self,
        code: &LocationCode,
    ) -> impl Future<Output = Result<Forecast, WeatherError>> + Send;
}

/// Connection settings for [`OpenWeatherProvider`]
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// `imperial`, `metric` or `standard`
    pub units: String,
    pub country: String,
    pub forecast_days: u8,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Arc<Client>,
    settings: ProviderSettings,
}

impl OpenWeatherProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            settings,
        })
    }

    fn zip_query(&self, code: &LocationCode) -> String {
        format!("{},{}", code, self.settings.country)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            tracing::debug!("Weather API returned status {}: {}", status, message);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, code), fields(code = %code), level = "info")]
    async fn current_conditions(&self, code: &LocationCode) -> Result<Conditions, WeatherError> {
        let url = self.endpoint("weather");
        let query = [
            ("zip", self.zip_query(code)),
            ("units", self.settings.units.clone()),
            ("APPID", self.settings.api_key.clone()),
        ];
        self.get_json(&url, &query).await
    }

    #[instrument(skip(self, code), fields(code = %code), level = "info")]
    async fn forecast(&self, code: &LocationCode) -> Result<Forecast, WeatherError> {
        let url = self.endpoint("forecast/daily");
        let query = [
            ("zip", self.zip_query(code)),
            ("units", self.settings.units.clone()),
            ("cnt", self.settings.forecast_days.to_string()),
            ("APPID", self.settings.api_key.clone()),
        ];
        self.get_json(&url, &query).await
    }
}
