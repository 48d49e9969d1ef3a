/// Historical AQI CSV Loader
///
/// Parses the daily AQI export files (one row per day per reporting site)
/// into canonical records.
///
/// Parsing policy: STRICT at the file level. Header names vary by
/// surrounding whitespace across export years, so headers are trimmed and
/// then mapped through a fixed dictionary; if any required column is absent
/// after mapping, the whole file is rejected. A malformed historical file
/// indicates a structural problem worth halting on — unlike the AirNow feed,
/// where partial records are expected noise.
///
/// Within a valid file, individual values stay permissive: numeric columns
/// coerce with parse-or-null semantics, and a row whose date cannot be
/// parsed is logged and skipped without aborting the file.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::logging::{DataSource, Logger};
use crate::model::{AqiCsvRecord, IngestError};

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Recognized export headers and the canonical column each maps to.
/// All eleven canonical columns are required for a file to be accepted.
pub static COLUMN_MAPPING: &[(&str, &str)] = &[
    ("Date", "date_observed"),
    ("Overall AQI Value", "overall_aqi_value"),
    ("Main Pollutant", "main_pollutant"),
    ("Site Name (of Overall AQI)", "site_name"),
    ("Site ID (of Overall AQI)", "site_id"),
    ("Source (of Overall AQI)", "source"),
    ("CO", "co"),
    ("Ozone", "ozone"),
    ("PM10", "pm10"),
    ("PM25", "pm25"),
    ("NO2", "no2"),
];

/// Resolve trimmed headers to canonical column indexes.
///
/// Returns the index of every canonical column, or the list of canonical
/// columns that could not be found.
fn resolve_columns(headers: &csv::StringRecord) -> Result<HashMap<&'static str, usize>, Vec<String>> {
    let mut indexes: HashMap<&'static str, usize> = HashMap::new();
    for (position, header) in headers.iter().enumerate() {
        let trimmed = header.trim();
        if let Some(&(_, canonical)) = COLUMN_MAPPING.iter().find(|&&(raw, _)| raw == trimmed) {
            indexes.entry(canonical).or_insert(position);
        }
    }

    let missing: Vec<String> = COLUMN_MAPPING
        .iter()
        .filter(|(_, canonical)| !indexes.contains_key(canonical))
        .map(|(_, canonical)| canonical.to_string())
        .collect();

    if missing.is_empty() {
        Ok(indexes)
    } else {
        Err(missing)
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Parse-or-null coercion for concentration values.
fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse-or-null coercion for the overall AQI value, which some export
/// years write as a float.
fn parse_aqi_value(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i32>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|v| v as i32))
}

/// Export date formats seen across years: US-style first, ISO second.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .ok()
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// Load and normalize one AQI CSV export.
///
/// File-level failures (unreadable file, missing required columns) reject
/// the whole file; row-level failures are logged and skipped.
pub fn load_aqi_csv(path: &Path, logger: &Logger) -> Result<Vec<AqiCsvRecord>, IngestError> {
    let label = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| IngestError::Io(format!("failed to open {}: {}", label, e)))?;
    parse_aqi_records(file, &label, logger)
}

/// Parse AQI records from any reader. `label` names the source in errors
/// and log messages.
pub fn parse_aqi_records<R: Read>(
    reader: R,
    label: &str,
    logger: &Logger,
) -> Result<Vec<AqiCsvRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| IngestError::ParseError(format!("unreadable headers in {}: {}", label, e)))?
        .clone();

    let columns = resolve_columns(&headers).map_err(|missing| IngestError::MissingColumns {
        file: label.to_string(),
        columns: missing,
    })?;

    let field = |record: &csv::StringRecord, canonical: &str| -> String {
        columns
            .get(canonical)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
            .to_string()
    };

    let mut records = Vec::new();
    for (row_number, result) in csv_reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                logger.warn(
                    DataSource::Csv,
                    Some(label),
                    &format!("skipping malformed row {}: {}", row_number + 2, e),
                );
                continue;
            }
        };

        let date_raw = field(&record, "date_observed");
        let date_observed = match parse_date(&date_raw) {
            Some(date) => date,
            None => {
                logger.warn(
                    DataSource::Csv,
                    Some(label),
                    &format!(
                        "skipping row {}: unparsable date {:?}",
                        row_number + 2,
                        date_raw
                    ),
                );
                continue;
            }
        };

        records.push(AqiCsvRecord {
            date_observed,
            overall_aqi_value: parse_aqi_value(&field(&record, "overall_aqi_value")),
            main_pollutant: field(&record, "main_pollutant"),
            site_name: field(&record, "site_name"),
            site_id: field(&record, "site_id"),
            source: field(&record, "source"),
            co: parse_numeric(&field(&record, "co")),
            ozone: parse_numeric(&field(&record, "ozone")),
            pm10: parse_numeric(&field(&record, "pm10")),
            pm25: parse_numeric(&field(&record, "pm25")),
            no2: parse_numeric(&field(&record, "no2")),
        });
    }

    logger.debug(
        DataSource::Csv,
        Some(label),
        &format!("parsed {} rows", records.len()),
    );
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
