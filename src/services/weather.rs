//! Weather enrichment service
//!
//! Geocodes an event's address and fetches a short-range forecast, storing a
//! compact summary on the event. The summary feeds the checklist-generation
//! prompt. Enrichment is best-effort: any failure is logged and the event is
//! left untouched.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::database::DatabaseService;
use crate::models::Event;
use crate::utils::errors::{HishoError, Result, WeatherError};
use crate::utils::time::today_local_midnight;

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: ForecastMain,
    #[serde(default)]
    weather: Vec<ForecastWeather>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastWeather {
    description: String,
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    client: Client,
    geocode_endpoint: String,
    forecast_endpoint: String,
    api_key: String,
}

impl WeatherService {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("hisho-backend/0.1")
            .build()
            .map_err(HishoError::Http)?;

        Ok(Self {
            client,
            geocode_endpoint: config.geocode_endpoint.trim_end_matches('/').to_string(),
            forecast_endpoint: config.forecast_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Resolve an address to coordinates (Nominatim-style search API)
    async fn geocode(&self, address: &str) -> Result<(f64, f64)> {
        let response = self
            .client
            .get(&self.geocode_endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::GeocodingFailed(address.to_string()).into());
        }

        let results: Vec<GeocodeResult> = response.json().await?;
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::GeocodingFailed(address.to_string()))?;

        let lat = first
            .lat
            .parse::<f64>()
            .map_err(|_| WeatherError::InvalidResponse("non-numeric latitude".to_string()))?;
        let lon = first
            .lon
            .parse::<f64>()
            .map_err(|_| WeatherError::InvalidResponse("non-numeric longitude".to_string()))?;

        debug!(address = address, lat = lat, lon = lon, "Address geocoded");
        Ok((lat, lon))
    }

    /// Fetch the forecast and format a compact summary string
    async fn forecast_summary(&self, lat: f64, lon: f64) -> Result<String> {
        let response = self
            .client
            .get(&self.forecast_endpoint)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", "ja".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::ForecastFailed(response.status().to_string()).into());
        }

        let body: ForecastResponse = response.json().await?;
        if body.list.is_empty() {
            return Err(WeatherError::InvalidResponse("empty forecast list".to_string()).into());
        }

        // A handful of entries is enough context for the packing prompt
        let lines: Vec<String> = body
            .list
            .iter()
            .take(8)
            .map(|entry| {
                let description = entry
                    .weather
                    .first()
                    .map(|w| w.description.as_str())
                    .unwrap_or("不明");
                format!("{} {} {:.0}°C", entry.dt_txt, description, entry.main.temp)
            })
            .collect();

        Ok(lines.join("\n"))
    }

    /// Enrich one event with a forecast summary. Events without an address
    /// are skipped. Failures are logged and swallowed.
    pub async fn enrich_event(&self, db: &DatabaseService, event: &Event) -> Result<bool> {
        let address = match event.address.as_deref() {
            Some(address) if !address.is_empty() => address,
            _ => return Ok(false),
        };

        let (lat, lon) = self.geocode(address).await?;
        let summary = self.forecast_summary(lat, lon).await?;
        db.events.set_weather_info(event.id, &summary).await?;

        info!(event_id = %event.id, "Weather info stored");
        Ok(true)
    }

    /// Enrichment pass over events starting 0, 2 and 4 days from now,
    /// mirroring the scheduled forecast refresh cadence
    pub async fn enrich_upcoming(
        &self,
        db: &DatabaseService,
        timezone_offset_hours: i32,
    ) -> Result<u32> {
        let today = today_local_midnight(timezone_offset_hours);
        let mut enriched = 0u32;

        for offset_days in [0i64, 2, 4] {
            let day_start = today + chrono::Duration::days(offset_days);
            let day_end = day_start + chrono::Duration::days(1);

            let events = db.events.starting_on_day(day_start, day_end).await?;
            for event in &events {
                match self.enrich_event(db, event).await {
                    Ok(true) => enriched += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(event_id = %event.id, error = %e, "Weather enrichment failed");
                    }
                }
            }
        }

        Ok(enriched)
    }
}
