/// Daily Weather Archive Client
///
/// Retrieves daily weather summaries (average temperature, precipitation
/// total, wind speed) for a coordinate pair and date range from the
/// Open-Meteo historical archive, for enrichment of the air quality table.
///
/// API Documentation: https://open-meteo.com/en/docs/historical-weather-api
///
/// The provider returns a dense, null-padded series; normalization drops any
/// day where all three metrics are absent, so the output is a sparse
/// sequence — a date with no upstream data simply does not appear.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::{IngestError, WeatherRecord};

const ARCHIVE_BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

// ============================================================================
// Archive API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ArchiveResponse {
    pub daily: ArchiveDailyBlock,
}

/// Column-oriented daily block: parallel arrays indexed by day.
#[derive(Debug, Deserialize)]
pub struct ArchiveDailyBlock {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_mean")]
    pub temperature: Vec<Option<f64>>,
    #[serde(rename = "precipitation_sum")]
    pub precipitation: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m_mean")]
    pub wind_speed: Vec<Option<f64>>,
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch daily weather records for the location and date range.
pub fn fetch_daily_weather(
    client: &reqwest::blocking::Client,
    start_date: NaiveDate,
    end_date: NaiveDate,
    latitude: f64,
    longitude: f64,
) -> Result<Vec<WeatherRecord>, Box<dyn std::error::Error>> {
    let response = client
        .get(ARCHIVE_BASE_URL)
        .query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("start_date", start_date.format("%Y-%m-%d").to_string()),
            ("end_date", end_date.format("%Y-%m-%d").to_string()),
            (
                "daily",
                "temperature_2m_mean,precipitation_sum,wind_speed_10m_mean".to_string(),
            ),
            ("timezone", "UTC".to_string()),
        ])
        .send()?;

    if !response.status().is_success() {
        return Err(Box::new(IngestError::HttpError(response.status().as_u16())));
    }

    let body = response.text()?;
    Ok(parse_daily_response(&body)?)
}

// ============================================================================
// Normalization
// ============================================================================

/// Parse an archive response body into weather records.
///
/// Days where all three metrics are null are dropped. A date string that
/// fails to parse is a provider contract violation and fails the whole
/// response.
pub fn parse_daily_response(body: &str) -> Result<Vec<WeatherRecord>, IngestError> {
    let response: ArchiveResponse = serde_json::from_str(body)
        .map_err(|e| IngestError::ParseError(format!("weather archive response: {}", e)))?;

    let daily = response.daily;
    let mut records = Vec::with_capacity(daily.time.len());
    for (index, date_raw) in daily.time.iter().enumerate() {
        let date_observed = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d").map_err(|e| {
            IngestError::ParseError(format!("weather date {:?}: {}", date_raw, e))
        })?;

        let metric = |column: &[Option<f64>]| column.get(index).copied().flatten();
        let temperature = metric(&daily.temperature);
        let precipitation = metric(&daily.precipitation);
        let wind_speed = metric(&daily.wind_speed);

        // Sparse output: a day with no data at all does not appear.
        if temperature.is_none() && precipitation.is_none() && wind_speed.is_none() {
            continue;
        }

        records.push(WeatherRecord {
            date_observed,
            temperature,
            precipitation,
            wind_speed,
        });
    }

    Ok(records)
}

// ============================================================================
// Tests
// ============================================================================
