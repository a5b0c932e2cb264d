//! Maps weather-crate errors to zipcast_core::AppError for consistent user-facing messages.

mod storage;
mod weather;

use zipcast_core::AppError;

/// Conversion into the application error hierarchy
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}
