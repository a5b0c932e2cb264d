//! End-to-end dashboard flows against an in-memory provider and store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use zipcast_ui::{Dashboard, DashboardOptions, OrderPolicy};
use zipcast_weather::{
    Conditions, DailyForecast, DailyTemperature, Forecast, ForecastCity, KeyValueStore,
    LocationCode, MainReadings, ManualClock, MemoryStore, StoreError, WeatherDescriptor,
    WeatherError, WeatherProvider, CONDITIONS_KEY, LOCATIONS_KEY,
};

const TTL: Duration = Duration::from_secs(7200);

#[derive(Default)]
struct FakeProvider {
    conditions: Mutex<HashMap<String, Conditions>>,
    forecasts: Mutex<HashMap<String, Forecast>>,
    conditions_calls: Mutex<HashMap<String, usize>>,
    forecast_calls: Mutex<HashMap<String, usize>>,
}

impl FakeProvider {
    fn with_conditions(self, codes: &[&str]) -> Self {
        for code in codes {
            self.conditions
                .lock()
                .insert(code.to_string(), conditions(&format!("City {}", code)));
        }
        self
    }

    fn with_forecast(self, code: &str) -> Self {
        self.forecasts.lock().insert(code.to_string(), forecast(code));
        self
    }

    fn conditions_calls(&self, code: &str) -> usize {
        self.conditions_calls.lock().get(code).copied().unwrap_or(0)
    }

    fn forecast_calls(&self, code: &str) -> usize {
        self.forecast_calls.lock().get(code).copied().unwrap_or(0)
    }

    fn not_found() -> WeatherError {
        WeatherError::Status {
            status: 404,
            message: "city not found".into(),
        }
    }
}

impl WeatherProvider for FakeProvider {
    async fn current_conditions(&self, code: &LocationCode) -> Result<Conditions, WeatherError> {
        *self
            .conditions_calls
            .lock()
            .entry(code.to_string())
            .or_default() += 1;
        let found = self.conditions.lock().get(code.as_str()).cloned();
        found.ok_or_else(Self::not_found)
    }

    async fn forecast(&self, code: &LocationCode) -> Result<Forecast, WeatherError> {
        *self
            .forecast_calls
            .lock()
            .entry(code.to_string())
            .or_default() += 1;
        let found = self.forecasts.lock().get(code.as_str()).cloned();
        found.ok_or_else(Self::not_found)
    }
}

fn conditions(name: &str) -> Conditions {
    Conditions {
        name: name.to_string(),
        weather: vec![WeatherDescriptor {
            id: 800,
            main: "Clear".into(),
            description: "clear sky".into(),
            icon: "01d".into(),
        }],
        main: MainReadings {
            temp: 70.0,
            feels_like: None,
            temp_min: 65.0,
            temp_max: 75.0,
            humidity: 40,
        },
        wind: None,
        dt: None,
    }
}

fn forecast(code: &str) -> Forecast {
    Forecast {
        city: ForecastCity {
            name: format!("City {}", code),
            country: Some("US".into()),
        },
        list: vec![DailyForecast {
            dt: 1_717_243_200,
            temp: DailyTemperature {
                day: 70.0,
                min: 60.0,
                max: 75.0,
            },
            weather: Vec::new(),
            humidity: None,
        }],
    }
}

fn code(raw: &str) -> LocationCode {
    LocationCode::parse(raw).unwrap()
}

fn codes(raw: &[&str]) -> Vec<LocationCode> {
    raw.iter().map(|r| code(r)).collect()
}

/// Accepts reads but refuses every write
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

struct Harness {
    provider: Arc<FakeProvider>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(provider: FakeProvider) -> Self {
        Self {
            provider: Arc::new(provider),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            )),
        }
    }

    fn dashboard(&self, order: OrderPolicy) -> Dashboard<FakeProvider> {
        Dashboard::new(
            self.provider.clone(),
            self.store.clone(),
            self.clock.clone(),
            DashboardOptions {
                cache_ttl: TTL,
                order,
            },
        )
    }
}

#[tokio::test]
async fn test_unknown_location_is_dropped_without_tab() {
    let harness = Harness::new(FakeProvider::default());
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);

    assert!(dashboard.add_location("94040").await);

    assert!(dashboard.locations().is_empty());
    assert!(dashboard.tabs().is_empty());
    assert!(dashboard.selected().is_none());
    assert_eq!(
        dashboard.status(),
        Some("94040: No weather data for this location.")
    );
    assert_eq!(harness.store.get(LOCATIONS_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_missing_forecast_keeps_tab() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);

    assert!(dashboard.add_location("10001").await);
    let nyc = code("10001");
    assert_eq!(dashboard.selected(), Some(&nyc));

    let view = dashboard.show_forecast(&nyc).await;

    assert!(view.forecast.is_none());
    assert_eq!(view.message, Some("No weather data for this location."));
    assert_eq!(dashboard.locations(), &[nyc.clone()]);
    assert!(dashboard.tabs().contains(&nyc));
}

#[tokio::test]
async fn test_forecast_served_from_cache() {
    let harness = Harness::new(
        FakeProvider::default()
            .with_conditions(&["10001"])
            .with_forecast("10001"),
    );
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.add_location("10001").await;
    let nyc = code("10001");

    let first = dashboard.show_forecast(&nyc).await;
    let second = dashboard.show_forecast(&nyc).await;

    assert_eq!(first.forecast.unwrap().city.name, "City 10001");
    assert!(second.message.is_none());
    assert_eq!(harness.provider.forecast_calls("10001"), 1);
    assert_eq!(dashboard.forecast_cache().len(), 1);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let harness = Harness::new(FakeProvider::default());
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);

    assert!(!dashboard.add_location("abc12").await);
    assert!(!dashboard.add_location("").await);

    assert!(dashboard.locations().is_empty());
    assert_eq!(harness.store.write_count(), 0);
    assert_eq!(dashboard.status(), Some("Zip codes must be numbers."));
}

#[tokio::test]
async fn test_failed_save_sets_status_and_keeps_tab() {
    let provider = Arc::new(FakeProvider::default().with_conditions(&["10001"]));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let mut dashboard = Dashboard::new(
        provider,
        Arc::new(ReadOnlyStore),
        clock,
        DashboardOptions {
            cache_ttl: TTL,
            order: OrderPolicy::Insertion,
        },
    );

    assert!(dashboard.add_location("10001").await);

    assert!(dashboard.tabs().contains(&code("10001")));
    assert_eq!(
        dashboard.status(),
        Some("Could not save your data. Changes may be lost.")
    );
}

#[tokio::test]
async fn test_unreadable_snapshot_is_reported_on_start() {
    let harness = Harness::new(FakeProvider::default());
    harness.store.set(CONDITIONS_KEY, "{truncated").unwrap();

    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.start().await;

    assert!(dashboard.conditions_cache().is_empty());
    assert_eq!(
        dashboard.status(),
        Some("Saved data was unreadable and has been reset.")
    );
}

#[tokio::test]
async fn test_duplicate_location_is_ignored() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);

    assert!(dashboard.add_location("10001").await);
    assert!(!dashboard.add_location("10001").await);

    assert_eq!(dashboard.tabs().len(), 1);
    assert_eq!(harness.provider.conditions_calls("10001"), 1);
}

#[tokio::test]
async fn test_closing_tab_forgets_location() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001", "60601", "94105"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Ascending);
    for raw in ["60601", "10001", "94105"] {
        dashboard.add_location(raw).await;
    }
    assert!(dashboard.select_tab(&code("60601")).await);

    assert!(dashboard.close_tab(&code("60601")));

    assert_eq!(dashboard.locations(), codes(&["10001", "94105"]).as_slice());
    assert_eq!(dashboard.tabs().ordered_ids(), codes(&["10001", "94105"]));
    assert_eq!(dashboard.selected(), Some(&code("10001")));
    assert!(!dashboard.close_tab(&code("60601")));
}

#[tokio::test]
async fn test_removing_location_leaves_tab_open() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.add_location("10001").await;

    assert!(dashboard.remove_location("10001"));

    assert!(dashboard.locations().is_empty());
    assert!(dashboard.tabs().contains(&code("10001")));
}

#[tokio::test]
async fn test_select_refreshes_through_cache() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001", "60601"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.add_location("10001").await;
    dashboard.add_location("60601").await;

    dashboard.select_tab(&code("10001")).await;
    assert_eq!(harness.provider.conditions_calls("10001"), 1);

    harness
        .provider
        .conditions
        .lock()
        .insert("10001".into(), conditions("Manhattan"));
    harness.clock.advance(chrono::Duration::seconds(7200));

    dashboard.select_tab(&code("10001")).await;

    assert_eq!(harness.provider.conditions_calls("10001"), 2);
    let tab = dashboard.tabs().get(&code("10001")).unwrap();
    assert_eq!(tab.data.conditions.name, "Manhattan");
    assert_eq!(tab.header_template, "conditions-header");
}

#[tokio::test]
async fn test_failed_refresh_closes_tab() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001", "60601"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.add_location("10001").await;
    dashboard.add_location("60601").await;

    harness.provider.conditions.lock().remove("10001");
    harness.clock.advance(chrono::Duration::seconds(7201));

    assert!(dashboard.select_tab(&code("10001")).await);

    assert!(!dashboard.tabs().contains(&code("10001")));
    assert_eq!(dashboard.locations(), codes(&["60601"]).as_slice());
    assert_eq!(dashboard.selected(), Some(&code("60601")));
}

#[tokio::test]
async fn test_restart_restores_tabs_from_store() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["10001", "60601"]));
    {
        let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
        dashboard.add_location("10001").await;
        dashboard.add_location("60601").await;
    }
    assert!(harness.store.get(CONDITIONS_KEY).is_some());

    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    assert!(dashboard.tabs().is_empty());
    dashboard.start().await;

    assert_eq!(dashboard.tabs().ordered_ids(), codes(&["10001", "60601"]));
    assert_eq!(harness.provider.conditions_calls("10001"), 1);
    assert_eq!(harness.provider.conditions_calls("60601"), 1);
}

#[tokio::test]
async fn test_pruned_location_restarts_derivation() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["60601"]));
    harness
        .store
        .set(LOCATIONS_KEY, r#"["94040","60601"]"#)
        .unwrap();

    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    dashboard.start().await;

    assert_eq!(dashboard.locations(), codes(&["60601"]).as_slice());
    assert_eq!(dashboard.tabs().ordered_ids(), codes(&["60601"]));
    assert_eq!(harness.provider.conditions_calls("94040"), 1);
    assert_eq!(harness.provider.conditions_calls("60601"), 1);
}

#[tokio::test]
async fn test_order_policy_switch() {
    let harness = Harness::new(FakeProvider::default().with_conditions(&["60601", "10001", "94105"]));
    let mut dashboard = harness.dashboard(OrderPolicy::Insertion);
    for raw in ["60601", "10001", "94105"] {
        dashboard.add_location(raw).await;
    }

    dashboard.set_order_policy(OrderPolicy::Descending);
    assert_eq!(
        dashboard.tabs().ordered_ids(),
        codes(&["94105", "60601", "10001"])
    );

    dashboard.set_order_policy(OrderPolicy::Insertion);
    assert_eq!(
        dashboard.tabs().ordered_ids(),
        codes(&["60601", "10001", "94105"])
    );
    assert_eq!(dashboard.locations(), codes(&["60601", "10001", "94105"]).as_slice());
}
