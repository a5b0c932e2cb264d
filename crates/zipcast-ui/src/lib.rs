//! Dashboard state for Zipcast: location tabs backed by cached weather.

pub mod dashboard;
pub mod error_mapping;
pub mod tabs;

pub use dashboard::{ConditionsTab, Dashboard, DashboardOptions, ForecastView};
pub use error_mapping::IntoAppError;
pub use tabs::{OrderPolicy, Tab, TabContainer};
