/// Integration tests for the ingestion pipeline against a live PostgreSQL.
///
/// These tests verify the persistence contract end to end:
/// 1. Re-ingesting the identical CSV data is a no-op (identity-key dedup)
/// 2. Weather upsert touches only the three weather columns
/// 3. Full three-source scenario: CSV + AirNow + weather reconcile on date
///
/// Prerequisites:
/// - PostgreSQL running and reachable
/// - PG_HOST, PG_PORT, PG_DB, PG_USER, PG_PASSWORD set (or in .env)
/// - The configured role may create databases
///
/// All tests are #[ignore]d because they require live infrastructure.
/// Run with: cargo test --test ingest_pipeline_integration -- --ignored --test-threads=1
///
/// Test rows are parked in the year 1981 and use TEST-prefixed site names so
/// cleanup never touches real data.

use chrono::{NaiveDate, Utc};
use postgres::{Client, NoTls};

use aqimon_service::config::{DatabaseConfig, load_environment};
use aqimon_service::db::AirQualityRepository;
use aqimon_service::ingest::aqi_csv::parse_aqi_records;
use aqimon_service::logging::{LogLevel, Logger};
use aqimon_service::model::{AirNowObservation, WeatherRecord};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn test_logger() -> Logger {
    Logger::new(LogLevel::Error, None)
}

fn test_config() -> DatabaseConfig {
    load_environment(None);
    DatabaseConfig::from_env().unwrap_or_else(|e| {
        eprintln!("\n{}\n", "=".repeat(80));
        eprintln!("INTEGRATION TEST SETUP ERROR");
        eprintln!("{}", "=".repeat(80));
        eprintln!("\n{}\n", e);
        eprintln!("Set PG_HOST, PG_PORT, PG_DB, PG_USER, PG_PASSWORD or provide a .env\n");
        panic!("Database configuration missing");
    })
}

fn connect(config: &DatabaseConfig) -> Client {
    postgres::Config::new()
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .password(&config.password)
        .dbname(&config.database)
        .connect(NoTls)
        .expect("failed to connect to test database")
}

fn cleanup_test_data(client: &mut Client) {
    // Everything these tests write lives in 1981.
    let _ = client.execute(
        "DELETE FROM air_quality
         WHERE date_observed BETWEEN '1981-01-01' AND '1981-12-31'
            OR site_name LIKE 'TEST%'",
        &[],
    );
}

fn count_rows(client: &mut Client, where_clause: &str) -> i64 {
    let query = format!("SELECT COUNT(*) FROM air_quality WHERE {}", where_clause);
    client
        .query_one(query.as_str(), &[])
        .expect("count query failed")
        .get(0)
}

const TEST_CSV: &str = "\
Date,Overall AQI Value,Main Pollutant,Site Name (of Overall AQI),Site ID (of Overall AQI),Source (of Overall AQI),CO,Ozone,PM10,PM25,NO2
03/01/1981,45,PM2.5,TEST Site A,98-765-0001,AQS,0.3,0.021,18,10.1,12
03/01/1981,45,PM2.5,TEST Site A,98-765-0001,AQS,0.3,0.021,18,10.1,12
03/02/1981,51,Ozone,TEST Site A,98-765-0001,AQS,0.2,0.034,22,12.4,15
";

// ---------------------------------------------------------------------------
// Identity-key dedup
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_reingesting_identical_csv_does_not_duplicate_rows() {
    let logger = test_logger();
    let config = test_config();
    let repository = AirQualityRepository::new(&config, &logger);
    repository.ensure_database_exists().expect("ensure database");
    repository.ensure_schema().expect("ensure schema");

    let mut client = connect(&config);
    cleanup_test_data(&mut client);

    let records = parse_aqi_records(TEST_CSV.as_bytes(), "test.csv", &logger)
        .expect("test CSV should parse");
    assert_eq!(records.len(), 3, "all three rows parse; dedup is the store's job");

    // First pass: the in-file duplicate collapses to 2 distinct rows.
    let processed = repository
        .insert_aqi_csv_records(records.clone())
        .expect("first ingest should succeed");
    assert_eq!(processed, 3, "processed count includes silently-dropped conflicts");

    let stored = count_rows(&mut client, "site_name = 'TEST Site A'");
    assert_eq!(stored, 2, "duplicate identity key should be dropped");

    // Second pass: identical data, identical store state.
    repository
        .insert_aqi_csv_records(records)
        .expect("re-ingest should succeed");
    let stored_again = count_rows(&mut client, "site_name = 'TEST Site A'");
    assert_eq!(stored_again, 2, "re-ingest must be a no-op");

    cleanup_test_data(&mut client);
}

// ---------------------------------------------------------------------------
// Weather upsert
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_weather_upsert_overwrites_only_weather_columns() {
    let logger = test_logger();
    let config = test_config();
    let repository = AirQualityRepository::new(&config, &logger);
    repository.ensure_database_exists().expect("ensure database");
    repository.ensure_schema().expect("ensure schema");

    let mut client = connect(&config);
    cleanup_test_data(&mut client);

    let date = NaiveDate::from_ymd_opt(1981, 4, 1).unwrap();
    let records = parse_aqi_records(
        "Date,Overall AQI Value,Main Pollutant,Site Name (of Overall AQI),\
Site ID (of Overall AQI),Source (of Overall AQI),CO,Ozone,PM10,PM25,NO2\n\
04/01/1981,45,PM2.5,TEST Site B,98-765-0002,AQS,0.3,0.021,18,10.1,12\n"
            .as_bytes(),
        "test.csv",
        &logger,
    )
    .expect("test CSV should parse");
    repository
        .insert_aqi_csv_records(records)
        .expect("CSV ingest should succeed");

    // First upsert lands on the existing pollutant row.
    let first = WeatherRecord {
        date_observed: date,
        temperature: Some(11.5),
        precipitation: Some(0.0),
        wind_speed: Some(7.2),
    };
    repository
        .upsert_weather(vec![first])
        .expect("first upsert should succeed");

    let row = client
        .query_one(
            "SELECT site_name, main_pollutant, pm25, temperature, precipitation, wind_speed
             FROM air_quality WHERE date_observed = $1",
            &[&date],
        )
        .expect("exactly one row for the date");
    assert_eq!(row.get::<_, String>(0), "TEST Site B");
    assert_eq!(row.get::<_, String>(1), "PM2.5");
    assert_eq!(row.get::<_, Option<f64>>(2), Some(10.1), "pollutant columns untouched");
    assert_eq!(row.get::<_, Option<f64>>(3), Some(11.5));

    // Second upsert with different values: last writer wins, same row.
    let second = WeatherRecord {
        date_observed: date,
        temperature: Some(14.0),
        precipitation: Some(3.3),
        wind_speed: Some(12.1),
    };
    repository
        .upsert_weather(vec![second])
        .expect("second upsert should succeed");

    let rows_for_date = count_rows(&mut client, "date_observed = '1981-04-01'");
    assert_eq!(rows_for_date, 1, "upsert must not create a second row");

    let row = client
        .query_one(
            "SELECT site_name, pm25, temperature, precipitation, wind_speed
             FROM air_quality WHERE date_observed = $1",
            &[&date],
        )
        .expect("row still present");
    assert_eq!(row.get::<_, String>(0), "TEST Site B");
    assert_eq!(row.get::<_, Option<f64>>(1), Some(10.1));
    assert_eq!(row.get::<_, Option<f64>>(2), Some(14.0), "latest temperature wins");
    assert_eq!(row.get::<_, Option<f64>>(3), Some(3.3));
    assert_eq!(row.get::<_, Option<f64>>(4), Some(12.1));

    cleanup_test_data(&mut client);
}

#[test]
#[ignore]
fn test_weather_upsert_for_unknown_date_creates_a_row() {
    let logger = test_logger();
    let config = test_config();
    let repository = AirQualityRepository::new(&config, &logger);
    repository.ensure_database_exists().expect("ensure database");
    repository.ensure_schema().expect("ensure schema");

    let mut client = connect(&config);
    cleanup_test_data(&mut client);

    let date = NaiveDate::from_ymd_opt(1981, 5, 1).unwrap();
    let record = WeatherRecord {
        date_observed: date,
        temperature: Some(20.0),
        precipitation: None,
        wind_speed: Some(5.0),
    };
    let processed = repository
        .upsert_weather(vec![record])
        .expect("upsert should succeed");
    assert_eq!(processed, 1);

    let row = client
        .query_one(
            "SELECT site_name, temperature FROM air_quality WHERE date_observed = $1",
            &[&date],
        )
        .expect("weather-only row should exist");
    assert_eq!(row.get::<_, Option<String>>(0), None, "no identity fields on a weather-only row");
    assert_eq!(row.get::<_, Option<f64>>(1), Some(20.0));

    cleanup_test_data(&mut client);
}

// ---------------------------------------------------------------------------
// End-to-end three-source scenario
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_three_source_scenario_reconciles_on_date() {
    let logger = test_logger();
    let config = test_config();
    let repository = AirQualityRepository::new(&config, &logger);
    repository.ensure_database_exists().expect("ensure database");
    repository.ensure_schema().expect("ensure schema");

    let mut client = connect(&config);
    cleanup_test_data(&mut client);

    // CSV: three rows, one duplicate identity key -> 2 distinct rows.
    let records = parse_aqi_records(TEST_CSV.as_bytes(), "test.csv", &logger)
        .expect("test CSV should parse");
    repository
        .insert_aqi_csv_records(records)
        .expect("CSV ingest should succeed");

    // AirNow: one observation on its own date; no conflict target, so it
    // always inserts a new row.
    let observation = AirNowObservation {
        date_observed: NaiveDate::from_ymd_opt(1981, 3, 5).unwrap(),
        hour_observed: 14,
        local_time_zone: "EST".to_string(),
        reporting_area: "TEST Area".to_string(),
        state_code: "NC".to_string(),
        latitude: 35.99,
        longitude: -78.91,
        parameter_name: "PM2.5".to_string(),
        aqi: 48,
        category_number: Some(1),
        category_name: Some("Good".to_string()),
    };
    repository
        .insert_airnow_observations(&[observation], Utc::now())
        .expect("AirNow insert should succeed");

    // Weather: covers the first CSV date only.
    let weather = WeatherRecord {
        date_observed: NaiveDate::from_ymd_opt(1981, 3, 1).unwrap(),
        temperature: Some(9.4),
        precipitation: Some(1.1),
        wind_speed: Some(6.0),
    };
    repository
        .upsert_weather(vec![weather])
        .expect("weather upsert should succeed");

    // 2 CSV rows + 1 API row, no extra row from the weather upsert.
    let total = count_rows(
        &mut client,
        "date_observed BETWEEN '1981-03-01' AND '1981-03-31'",
    );
    assert_eq!(total, 3, "2 distinct CSV rows + 1 AirNow row");

    // The weather-matching date carries both its original pollutant values
    // and the new weather values.
    let row = client
        .query_one(
            "SELECT main_pollutant, pm25, temperature, precipitation, wind_speed
             FROM air_quality WHERE date_observed = '1981-03-01'",
            &[],
        )
        .expect("enriched row should exist");
    assert_eq!(row.get::<_, String>(0), "PM2.5");
    assert_eq!(row.get::<_, Option<f64>>(1), Some(10.1));
    assert_eq!(row.get::<_, Option<f64>>(2), Some(9.4));
    assert_eq!(row.get::<_, Option<f64>>(3), Some(1.1));
    assert_eq!(row.get::<_, Option<f64>>(4), Some(6.0));

    cleanup_test_data(&mut client);
}
