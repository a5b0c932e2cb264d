//! Weather data for Zipcast
//!
//! Tracked zip codes, OpenWeatherMap lookups, and short-lived caches of
//! their results, all persisted through a small key-value store.

pub mod cache;
pub mod clock;
pub mod location;
pub mod provider;
pub mod store;
pub mod types;

pub use cache::{CacheEntry, WeatherCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use location::LocationRegistry;
pub use provider::{OpenWeatherProvider, ProviderSettings, WeatherProvider};
pub use store::{
    JsonFileStore, KeyValueStore, MemoryStore, SnapshotWriter, StoreErrorListener,
    CONDITIONS_KEY, FORECAST_KEY, LOCATIONS_KEY,
};
pub use types::*;
