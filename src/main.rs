use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use zipcast_core::{Config, WeatherConfig};
use zipcast_ui::{Dashboard, DashboardOptions, OrderPolicy};
use zipcast_weather::{JsonFileStore, OpenWeatherProvider, ProviderSettings, SystemClock};

fn provider_settings(weather: &WeatherConfig) -> ProviderSettings {
    ProviderSettings {
        base_url: weather.api_url.clone(),
        api_key: weather.api_key.clone(),
        units: weather.units.as_query().to_string(),
        country: weather.country.clone(),
        forecast_days: weather.forecast_days,
        timeout: Duration::from_secs(weather.request_timeout_secs),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize core
    zipcast_core::init()?;

    let (config, _) = Config::load_validated()?;

    let provider = OpenWeatherProvider::new(provider_settings(&config.weather))
        .context("Failed to build weather client")?;
    let store = JsonFileStore::new(&config.storage.data_dir);

    let mut dashboard = Dashboard::new(
        Arc::new(provider),
        Arc::new(store),
        Arc::new(SystemClock),
        DashboardOptions {
            cache_ttl: Duration::from_secs(config.weather.cache_seconds),
            order: OrderPolicy::from(config.ui.tab_order),
        },
    );

    tracing::info!("Zipcast started");
    dashboard.start().await;

    for raw in std::env::args().skip(1) {
        if !dashboard.add_location(&raw).await {
            println!("Skipped {}", raw);
        }
    }

    if let Some(status) = dashboard.status() {
        println!("{}", status);
    }

    println!("Zipcast - weather by zip code");
    for tab in dashboard.tabs().ordered_tabs() {
        let marker = if dashboard.selected() == Some(&tab.id) { "*" } else { " " };
        let conditions = &tab.data.conditions;
        println!(
            "{} {} {}: {:.0}°, {}",
            marker,
            tab.id,
            conditions.name,
            conditions.main.temp,
            conditions.summary()
        );
    }

    let Some(selected) = dashboard.selected().cloned() else {
        println!("\nNo locations tracked. Pass zip codes as arguments.");
        return Ok(());
    };

    let view = dashboard.show_forecast(&selected).await;
    match view.forecast {
        Some(forecast) => {
            println!("\nForecast for {}:", forecast.city.name);
            for day in &forecast.list {
                let date = day
                    .date()
                    .map(|d| d.format("%a %b %e").to_string())
                    .unwrap_or_default();
                println!(
                    "  {}  {:.0}°/{:.0}°  {}",
                    date,
                    day.temp.max,
                    day.temp.min,
                    day.summary()
                );
            }
        }
        None => println!("\n{}", view.message.unwrap_or("No forecast available.")),
    }

    Ok(())
}
