/// AirNow Observation API Client
///
/// Retrieves current air quality observations by zip code from the AirNow
/// API and normalizes them into the canonical record shape.
///
/// API Documentation: https://docs.airnowapi.org/CurrentObservationsByZip/docs
///
/// Parsing policy: PERMISSIVE. Partial or malformed upstream payloads are
/// expected noise and must not abort a batch. Missing keys default to
/// type-appropriate zero values (0, 0.0, empty string). The one exception is
/// `DateObserved`: a record whose date is missing or unparsable would be
/// silently mislabeled by any fallback, so it is surfaced as an explicit
/// error and the caller skips that record.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::AirNowConfig;
use crate::model::{AirNowObservation, IngestError};

const AIRNOW_BASE_URL: &str = "https://www.airnowapi.org/aq/observation/zipCode/current/";

// ============================================================================
// AirNow API Response Structures
// ============================================================================

/// One raw observation entry as returned by the AirNow API.
///
/// Every field is optional: the upstream feed routinely omits keys for
/// stations with incomplete reporting.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAirNowObservation {
    #[serde(rename = "DateObserved")]
    pub date_observed: Option<String>,
    #[serde(rename = "HourObserved")]
    pub hour_observed: Option<i32>,
    #[serde(rename = "LocalTimeZone")]
    pub local_time_zone: Option<String>,
    #[serde(rename = "ReportingArea")]
    pub reporting_area: Option<String>,
    #[serde(rename = "StateCode")]
    pub state_code: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "ParameterName")]
    pub parameter_name: Option<String>,
    #[serde(rename = "AQI")]
    pub aqi: Option<i32>,
    #[serde(rename = "AQICategory")]
    pub category: Option<RawAqiCategory>,
}

/// The nested `AQICategory` object, flattened to two top-level fields during
/// normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAqiCategory {
    #[serde(rename = "Number")]
    pub number: Option<i32>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch the current observations for the configured zip code.
///
/// Returns the raw payload entries; normalization is a separate step so the
/// caller decides what to do with records that fail it.
pub fn fetch_observations(
    client: &reqwest::blocking::Client,
    config: &AirNowConfig,
) -> Result<Vec<RawAirNowObservation>, Box<dyn std::error::Error>> {
    let response = client
        .get(AIRNOW_BASE_URL)
        .query(&[
            ("format", config.response_format.clone()),
            ("zipCode", config.zip_code.clone()),
            ("distance", config.distance.to_string()),
            ("api_key", config.api_key.clone()),
        ])
        .send()?;

    if !response.status().is_success() {
        return Err(Box::new(IngestError::HttpError(response.status().as_u16())));
    }

    let body = response.text()?;
    parse_observation_response(&body)
}

/// Parse an AirNow response body into raw observation entries.
pub fn parse_observation_response(
    body: &str,
) -> Result<Vec<RawAirNowObservation>, Box<dyn std::error::Error>> {
    let observations: Vec<RawAirNowObservation> = serde_json::from_str(body)
        .map_err(|e| IngestError::ParseError(format!("AirNow response: {}", e)))?;
    Ok(observations)
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize one raw AirNow entry into the canonical observation shape.
///
/// Missing optional keys take their documented defaults. A missing or
/// unparsable `DateObserved` is an explicit error — the record cannot be
/// keyed without a real date.
pub fn normalize_observation(
    raw: RawAirNowObservation,
) -> Result<AirNowObservation, IngestError> {
    let date_raw = raw
        .date_observed
        .ok_or_else(|| IngestError::ParseError("record has no DateObserved".to_string()))?;
    // AirNow pads DateObserved with trailing whitespace.
    let date_observed = NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d")
        .map_err(|e| IngestError::ParseError(format!("DateObserved {:?}: {}", date_raw, e)))?;

    let (category_number, category_name) = match raw.category {
        Some(category) => (category.number, category.name),
        None => (None, None),
    };

    Ok(AirNowObservation {
        date_observed,
        hour_observed: raw.hour_observed.unwrap_or(0),
        local_time_zone: raw.local_time_zone.unwrap_or_default(),
        reporting_area: raw.reporting_area.unwrap_or_default(),
        state_code: raw.state_code.unwrap_or_default(),
        latitude: raw.latitude.unwrap_or(0.0),
        longitude: raw.longitude.unwrap_or(0.0),
        parameter_name: raw.parameter_name.unwrap_or_default(),
        aqi: raw.aqi.unwrap_or(0),
        category_number,
        category_name,
    })
}

// ============================================================================
// Tests
// ============================================================================
