use zipcast_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError};
use zipcast_weather::{LocationError, WeatherError as ProviderError};

use super::IntoAppError;

impl IntoAppError for ProviderError {
    fn into_app_error(self) -> AppError {
        match self {
            ProviderError::Network(err) => AppError::Network(err.into_network_error()),
            ProviderError::Status { status: 401, .. } => {
                AppError::Weather(WeatherError::InvalidApiKey)
            }
            ProviderError::Status {
                status: 404,
                message,
            } => AppError::Weather(WeatherError::LocationNotFound(message)),
            ProviderError::Status { status, .. } if status >= 500 => {
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
            ProviderError::Status { status, message } => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            ProviderError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
        }
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        match self {
            LocationError::Invalid(raw) => AppError::Weather(WeatherError::InvalidLocation(raw)),
        }
    }
}
