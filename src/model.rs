/// Core data types for the air quality ingestion service.
///
/// This module defines the canonical record shapes that all three sources
/// (AirNow API, historical AQI CSV exports, the daily weather archive)
/// normalize into before persistence. It contains no I/O — only types and
/// the domain error enum.

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Canonical record types
// ---------------------------------------------------------------------------

/// A normalized AirNow real-time observation.
///
/// Produced by `ingest::airnow::normalize_observation` from one entry of an
/// AirNow zip-code observation response. All fields except the category pair
/// are fully defaulted during normalization (permissive parsing), so the
/// repository never re-validates.
#[derive(Debug, Clone, PartialEq)]
pub struct AirNowObservation {
    pub date_observed: NaiveDate,
    pub hour_observed: i32,
    pub local_time_zone: String,
    pub reporting_area: String,
    pub state_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub parameter_name: String,
    pub aqi: i32,
    /// Flattened from the nested `AQICategory.Number` field.
    pub category_number: Option<i32>,
    /// Flattened from the nested `AQICategory.Name` field.
    pub category_name: Option<String>,
}

/// One normalized row from a historical AQI CSV export.
///
/// The tuple (`date_observed`, `site_name`, `main_pollutant`) uniquely
/// identifies a historical record; the repository relies on a matching
/// database constraint to silently drop duplicate inserts.
///
/// Numeric concentration fields use parse-or-null semantics: a value that
/// fails to parse becomes `None` rather than failing the row.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiCsvRecord {
    pub date_observed: NaiveDate,
    pub overall_aqi_value: Option<i32>,
    pub main_pollutant: String,
    pub site_name: String,
    pub site_id: String,
    pub source: String,
    pub co: Option<f64>,
    pub ozone: Option<f64>,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub no2: Option<f64>,
}

/// Daily weather metrics used for enrichment, keyed by date only.
///
/// Upserted into the same relation as the pollutant data: when a row for
/// `date_observed` already exists, only the three weather columns are
/// overwritten and everything else is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub date_observed: NaiveDate,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when configuring, fetching, or normalizing data.
///
/// Row-level persistence errors are handled at the repository layer and
/// never surface through this enum; connection and commit errors propagate
/// as `postgres::Error` with their original cause intact.
#[derive(Debug, PartialEq)]
pub enum IngestError {
    /// One or more required environment variables were absent. Every missing
    /// name is enumerated so a single run reports the full shortfall.
    MissingConfig(Vec<String>),
    /// Non-2xx HTTP response from an external API.
    HttpError(u16),
    /// A payload or record could not be parsed into its canonical shape.
    ParseError(String),
    /// A CSV file was missing required columns after header mapping.
    /// Rejects the whole file, not individual rows.
    MissingColumns { file: String, columns: Vec<String> },
    /// An I/O failure while reading a source file.
    Io(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::MissingConfig(names) => {
                write!(
                    f,
                    "Missing required environment variables: {}",
                    names.join(", ")
                )
            }
            IngestError::HttpError(code) => write!(f, "HTTP error: {}", code),
            IngestError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IngestError::MissingColumns { file, columns } => {
                write!(f, "Missing expected columns {:?} in {}", columns, file)
            }
            IngestError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {}
