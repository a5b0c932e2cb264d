//! Dashboard state: one tab per tracked zip code.
//!
//! The dashboard owns the location registry, both weather caches and the tab
//! container. Component listeners report back over an mpsc channel that is
//! drained after every operation:
//! - a closed tab forgets its location
//! - a location whose current conditions cannot be fetched is forgotten and
//!   its tab closed
//! - a failed forecast only leaves a message for the forecast view
//! - a snapshot that cannot be written or read only sets the status line

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use zipcast_weather::{
    Clock, Conditions, Forecast, KeyValueStore, LocationCode, LocationRegistry, SnapshotWriter,
    WeatherCache, WeatherProvider, CONDITIONS_KEY, FORECAST_KEY, LOCATIONS_KEY,
};

use crate::error_mapping::IntoAppError;
use crate::tabs::{OrderPolicy, Tab, TabContainer};

pub const CONDITIONS_HEADER: &str = "conditions-header";
pub const CONDITIONS_BODY: &str = "conditions-body";

#[derive(Debug)]
enum DashboardEvent {
    TabRemoved(LocationCode),
    ConditionsUnavailable {
        code: LocationCode,
        message: &'static str,
    },
    ForecastUnavailable {
        code: LocationCode,
        message: &'static str,
    },
    StorageFailed(&'static str),
}

/// Data bound to a location tab
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionsTab {
    pub code: LocationCode,
    pub conditions: Conditions,
}

/// What the forecast page shows for one location
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub code: LocationCode,
    pub forecast: Option<Forecast>,
    /// User-facing reason when `forecast` is empty
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Shared lifetime of cached conditions and forecasts
    pub cache_ttl: Duration,
    pub order: OrderPolicy,
}

pub struct Dashboard<P> {
    provider: Arc<P>,
    registry: LocationRegistry,
    conditions: WeatherCache<Conditions>,
    forecasts: WeatherCache<Forecast>,
    tabs: TabContainer<LocationCode, ConditionsTab>,
    events: Receiver<DashboardEvent>,
    forecast_errors: HashMap<LocationCode, &'static str>,
    status: Option<String>,
}

impl<P: WeatherProvider> Dashboard<P> {
    /// Build the dashboard, restoring locations and cached weather from `store`.
    ///
    /// No tabs exist until [`Dashboard::start`] runs.
    pub fn new(
        provider: Arc<P>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        options: DashboardOptions,
    ) -> Self {
        let (tx, events) = mpsc::channel();

        let writer = |key: &'static str| {
            let storage_tx = tx.clone();
            SnapshotWriter::new(store.clone(), key).with_error_listener(move |err| {
                let message = err.into_app_error().user_message();
                let _ = storage_tx.send(DashboardEvent::StorageFailed(message));
            })
        };

        let registry = LocationRegistry::persistent(writer(LOCATIONS_KEY));

        let conditions_tx = tx.clone();
        let conditions: WeatherCache<Conditions> = WeatherCache::persistent(
            writer(CONDITIONS_KEY),
            options.cache_ttl,
            clock.clone(),
        )
        .with_failure_listener(move |code, err| {
            let message = err.into_app_error().user_message();
            let _ = conditions_tx.send(DashboardEvent::ConditionsUnavailable {
                code: code.clone(),
                message,
            });
        });

        let forecast_tx = tx.clone();
        let forecasts: WeatherCache<Forecast> = WeatherCache::persistent(
            writer(FORECAST_KEY),
            options.cache_ttl,
            clock,
        )
        .with_failure_listener(move |code, err| {
            let message = err.into_app_error().user_message();
            let _ = forecast_tx.send(DashboardEvent::ForecastUnavailable {
                code: code.clone(),
                message,
            });
        });

        let tabs = TabContainer::new(options.order).with_removal_listener(
            move |code: &LocationCode| {
                let _ = tx.send(DashboardEvent::TabRemoved(code.clone()));
            },
        );

        Self {
            provider,
            registry,
            conditions,
            forecasts,
            tabs,
            events,
            forecast_errors: HashMap::new(),
            status: None,
        }
    }

    /// Open tabs for the locations restored from the last session
    pub async fn start(&mut self) {
        tracing::info!(
            "Starting dashboard with {} saved locations",
            self.registry.locations().len()
        );
        self.process_events();
        self.sync_tabs().await;
    }

    /// Track a zip code typed by the user and open its tab.
    ///
    /// Returns false when the input was rejected or already tracked.
    /// Rejected input sets the status line.
    pub async fn add_location(&mut self, raw: &str) -> bool {
        let code = match LocationCode::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!("Wrong zipcode: {}", raw);
                self.status = Some(e.into_app_error().user_message().to_string());
                return false;
            }
        };

        if !self.registry.add_code(code) {
            return false;
        }
        self.sync_tabs().await;
        true
    }

    /// Forget a location. An open tab for it stays until it is closed.
    pub fn remove_location(&mut self, code: &str) -> bool {
        let removed = self.registry.remove_location(code);
        self.process_events();
        removed
    }

    /// Close a tab, which also forgets its location
    pub fn close_tab(&mut self, code: &LocationCode) -> bool {
        let closed = self.tabs.remove_tab(code);
        self.process_events();
        closed
    }

    /// Select a tab and refresh its conditions through the cache.
    ///
    /// If the refresh fails the location is dropped and the tab closes.
    pub async fn select_tab(&mut self, code: &LocationCode) -> bool {
        if !self.tabs.select_tab(code) {
            return false;
        }

        if let Some(conditions) = self.fetch_conditions(code).await {
            if let Some(tab) = self.tabs.get_mut(code) {
                tab.data.conditions = conditions;
            }
        }
        self.process_events();
        true
    }

    /// Forecast for a location, served from the forecast cache when fresh
    pub async fn show_forecast(&mut self, code: &LocationCode) -> ForecastView {
        let provider = Arc::clone(&self.provider);
        let forecast = self
            .forecasts
            .resolve(code, || async move { provider.forecast(code).await })
            .await;
        self.process_events();

        let message = match forecast {
            Some(_) => None,
            None => self.forecast_errors.remove(code),
        };

        ForecastView {
            code: code.clone(),
            forecast,
            message,
        }
    }

    pub fn set_order_policy(&mut self, order: OrderPolicy) {
        self.tabs.set_order_policy(order);
    }

    pub fn locations(&self) -> &[LocationCode] {
        self.registry.locations()
    }

    pub fn tabs(&self) -> &TabContainer<LocationCode, ConditionsTab> {
        &self.tabs
    }

    pub fn selected(&self) -> Option<&LocationCode> {
        self.tabs.selected_id()
    }

    /// Last user-facing problem: a rejected or dropped location, or a
    /// snapshot that could not be saved or restored
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn conditions_cache(&self) -> &WeatherCache<Conditions> {
        &self.conditions
    }

    pub fn forecast_cache(&self) -> &WeatherCache<Forecast> {
        &self.forecasts
    }

    /// Walk the current location list, opening a tab for each code in turn.
    ///
    /// When the list changes mid-walk (a location pruned itself) the walk is
    /// abandoned and restarted from the newest list.
    async fn sync_tabs(&mut self) {
        'changeset: loop {
            let revision = self.registry.revision();
            let changeset = self.registry.locations().to_vec();

            for code in &changeset {
                self.open_tab(code).await;
                self.process_events();

                if self.registry.revision() != revision {
                    tracing::debug!("Location set changed, restarting tab derivation");
                    continue 'changeset;
                }
            }

            break;
        }
    }

    async fn open_tab(&mut self, code: &LocationCode) {
        if let Some(conditions) = self.fetch_conditions(code).await {
            self.tabs.create_tab(Tab {
                id: code.clone(),
                data: ConditionsTab {
                    code: code.clone(),
                    conditions,
                },
                header_template: CONDITIONS_HEADER,
                body_template: CONDITIONS_BODY,
            });
        }
    }

    async fn fetch_conditions(&mut self, code: &LocationCode) -> Option<Conditions> {
        let provider = Arc::clone(&self.provider);
        self.conditions
            .resolve(code, || async move { provider.current_conditions(code).await })
            .await
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                DashboardEvent::TabRemoved(code) => {
                    self.registry.remove_location(code.as_str());
                }
                DashboardEvent::ConditionsUnavailable { code, message } => {
                    tracing::error!("No weather conditions available for zipcode {}", code);
                    self.status = Some(format!("{}: {}", code, message));
                    self.registry.remove_location(code.as_str());
                    self.tabs.remove_tab(&code);
                }
                DashboardEvent::ForecastUnavailable { code, message } => {
                    self.forecast_errors.insert(code, message);
                }
                DashboardEvent::StorageFailed(message) => {
                    self.status = Some(message.to_string());
                }
            }
        }
    }
}
