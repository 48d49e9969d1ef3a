/// Ingestion orchestrators.
///
/// One function per source, each a stateless single pass: guarantee the
/// store and schema exist, obtain normalized records from the source
/// adapter, delegate to the matching repository write path, and return the
/// count of rows the repository reports as processed. The store itself is
/// the only persistent state; no orchestrator joins across sources — the
/// AirNow/CSV/weather data meet only through the shared `date_observed` key
/// at the storage layer.

pub mod airnow;
pub mod aqi_csv;
pub mod meteo;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use crate::config::{AirNowConfig, DatabaseConfig};
use crate::db::AirQualityRepository;
use crate::logging::{DataSource, Logger};

/// Blocking HTTP client used by both external adapters. The fixed timeout
/// is the only bound on external calls; there is no retry or backoff, so a
/// single failure surfaces immediately to the caller.
fn http_client() -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
}

/// Fetch the current AirNow observations and persist them.
///
/// Records whose date is missing or unparsable are logged and skipped;
/// everything else inserts with one shared fetch timestamp.
pub fn ingest_airnow(
    db_config: &DatabaseConfig,
    airnow_config: &AirNowConfig,
    logger: &Logger,
) -> Result<u64, Box<dyn std::error::Error>> {
    let repository = AirQualityRepository::new(db_config, logger);
    repository.ensure_database_exists()?;
    repository.ensure_schema()?;

    let client = http_client()?;
    let fetched_at = Utc::now();
    logger.info(
        DataSource::AirNow,
        Some(&airnow_config.zip_code),
        "requesting current observations",
    );
    let raw_observations = airnow::fetch_observations(&client, airnow_config)?;

    let mut observations = Vec::with_capacity(raw_observations.len());
    for raw in raw_observations {
        match airnow::normalize_observation(raw) {
            Ok(observation) => observations.push(observation),
            Err(e) => logger.warn(
                DataSource::AirNow,
                Some(&airnow_config.zip_code),
                &format!("skipping observation: {}", e),
            ),
        }
    }
    logger.info(
        DataSource::AirNow,
        Some(&airnow_config.zip_code),
        &format!("fetched {} observations", observations.len()),
    );

    repository.insert_airnow_observations(&observations, fetched_at)
}

/// Load one or more historical AQI CSV files and persist them.
///
/// Files are independent: a file that fails validation (or cannot be read)
/// is logged and skipped, and the remaining files still load. Duplicate
/// identity keys within or across files are silently dropped by the store.
pub fn ingest_aqi_csvs(
    db_config: &DatabaseConfig,
    paths: &[PathBuf],
    logger: &Logger,
) -> Result<u64, Box<dyn std::error::Error>> {
    let repository = AirQualityRepository::new(db_config, logger);
    repository.ensure_database_exists()?;
    repository.ensure_schema()?;

    let mut total: u64 = 0;
    for path in paths {
        let label = path.display().to_string();
        match aqi_csv::load_aqi_csv(path, logger) {
            Ok(records) => {
                total += repository.insert_aqi_csv_records(records)?;
            }
            Err(e) => {
                logger.error(
                    DataSource::Csv,
                    Some(&label),
                    &format!("file rejected: {}", e),
                );
            }
        }
    }
    Ok(total)
}

/// Fetch daily weather for a date range and coordinate pair and upsert it.
pub fn ingest_weather(
    db_config: &DatabaseConfig,
    start_date: NaiveDate,
    end_date: NaiveDate,
    latitude: f64,
    longitude: f64,
    logger: &Logger,
) -> Result<u64, Box<dyn std::error::Error>> {
    let repository = AirQualityRepository::new(db_config, logger);
    repository.ensure_database_exists()?;
    repository.ensure_schema()?;

    let client = http_client()?;
    logger.info(
        DataSource::Meteo,
        None,
        &format!(
            "fetching daily weather {} .. {} at ({}, {})",
            start_date, end_date, latitude, longitude
        ),
    );
    let records = meteo::fetch_daily_weather(&client, start_date, end_date, latitude, longitude)?;
    logger.info(
        DataSource::Meteo,
        None,
        &format!("provider returned {} days with data", records.len()),
    );

    repository.upsert_weather(records)
}
