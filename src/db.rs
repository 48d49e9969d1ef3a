/// PostgreSQL persistence for the `air_quality` relation.
///
/// `AirQualityRepository` owns all interaction with the store: database and
/// schema lifecycle plus the three write paths. One wide relation holds the
/// rows from every source, with two co-existing uniqueness constraints:
///
///   - `UNIQUE (date_observed, site_name, main_pollutant)` — the identity
///     key for historical CSV rows, declared inline with the table.
///   - `UNIQUE (date_observed)` — added lazily by the weather path so the
///     weather upsert has a conflict target.
///
/// Because both constraints live on the same relation, a CSV insert and a
/// weather upsert can race on the same date; the last weather writer wins
/// for the three weather columns and nothing else. The store's constraint
/// enforcement is the only concurrency-safety mechanism here.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};

use crate::config::DatabaseConfig;
use crate::logging::{DataSource, Logger};
use crate::model::{AirNowObservation, AqiCsvRecord, WeatherRecord};

// ---------------------------------------------------------------------------
// SQL
// ---------------------------------------------------------------------------

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS air_quality (
    id SERIAL PRIMARY KEY,
    date_observed DATE,
    hour_observed INT,
    local_time_zone VARCHAR(10),
    reporting_area VARCHAR(100),
    state_code VARCHAR(10),
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    parameter_name VARCHAR(50),
    aqi INT,
    category_number INT,
    category_name VARCHAR(50),
    data_retrieved_at TIMESTAMPTZ,
    overall_aqi_value INT,
    main_pollutant VARCHAR(50),
    site_name VARCHAR(100),
    site_id VARCHAR(20),
    source VARCHAR(20),
    co DOUBLE PRECISION,
    ozone DOUBLE PRECISION,
    pm10 DOUBLE PRECISION,
    pm25 DOUBLE PRECISION,
    no2 DOUBLE PRECISION,
    UNIQUE (date_observed, site_name, main_pollutant)
);
";

const INSERT_AIRNOW_SQL: &str = "
INSERT INTO air_quality (
    date_observed, hour_observed, local_time_zone, reporting_area, state_code,
    latitude, longitude, parameter_name, aqi, category_number, category_name,
    data_retrieved_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);
";

const INSERT_AQI_CSV_SQL: &str = "
INSERT INTO air_quality (
    date_observed, overall_aqi_value, main_pollutant, site_name, site_id, source,
    co, ozone, pm10, pm25, no2
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (date_observed, site_name, main_pollutant) DO NOTHING;
";

/// Added lazily so that historical deployments created before the weather
/// path existed pick up the constraint on first weather run. The
/// `pg_constraint` guard keeps reruns from failing with a duplicate
/// constraint error.
const ADD_DATE_CONSTRAINT_SQL: &str = "
DO $$ BEGIN
IF NOT EXISTS (
    SELECT 1 FROM pg_constraint WHERE conname = 'unique_date_constraint'
) THEN
    ALTER TABLE air_quality
    ADD CONSTRAINT unique_date_constraint UNIQUE (date_observed);
END IF;
END $$;
";

const UPSERT_WEATHER_SQL: &str = "
INSERT INTO air_quality (date_observed, temperature, precipitation, wind_speed)
VALUES ($1, $2, $3, $4)
ON CONFLICT (date_observed) DO UPDATE
SET temperature = EXCLUDED.temperature,
    precipitation = EXCLUDED.precipitation,
    wind_speed = EXCLUDED.wind_speed;
";

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

pub struct AirQualityRepository<'a> {
    config: &'a DatabaseConfig,
    logger: &'a Logger,
}

impl<'a> AirQualityRepository<'a> {
    pub fn new(config: &'a DatabaseConfig, logger: &'a Logger) -> Self {
        AirQualityRepository { config, logger }
    }

    /// Connect to the configured target database.
    fn connect(&self) -> Result<Client, postgres::Error> {
        self.connect_to(&self.config.database)
    }

    fn connect_to(&self, dbname: &str) -> Result<Client, postgres::Error> {
        postgres::Config::new()
            .host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.user)
            .password(&self.config.password)
            .dbname(dbname)
            .connect(NoTls)
    }

    /// Create the target database if it does not already exist.
    ///
    /// Race-tolerant: if creation fails because another process won the
    /// race, the error is logged and swallowed — the database exists either
    /// way. Failure to reach the maintenance database still propagates.
    pub fn ensure_database_exists(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut client = self.connect_to("postgres")?;
        let exists = client
            .query_opt(
                "SELECT 1 FROM pg_database WHERE datname = $1",
                &[&self.config.database],
            )?
            .is_some();

        if exists {
            self.logger.debug(
                DataSource::Database,
                Some(&self.config.database),
                "database already exists",
            );
            return Ok(());
        }

        let create_sql = format!(
            "CREATE DATABASE \"{}\"",
            self.config.database.replace('"', "\"\"")
        );
        match client.batch_execute(&create_sql) {
            Ok(()) => self.logger.info(
                DataSource::Database,
                Some(&self.config.database),
                "created database",
            ),
            Err(e) => self.logger.warn(
                DataSource::Database,
                Some(&self.config.database),
                &format!("database creation failed, assuming it was created concurrently: {}", e),
            ),
        }
        Ok(())
    }

    /// Ensure the `air_quality` table is present, with the CSV identity
    /// constraint declared inline. Idempotent.
    pub fn ensure_schema(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut client = self.connect()?;
        client.batch_execute(CREATE_TABLE_SQL)?;
        self.logger
            .debug(DataSource::Database, None, "air_quality table is present");
        Ok(())
    }

    /// Bulk-insert AirNow observations, all stamped with the same fetch time.
    ///
    /// No conflict target: the API source has no enforced natural key, so a
    /// rerun of the same fetch duplicates rows by design. The whole batch is
    /// one transaction and any failure is fatal.
    pub fn insert_airnow_observations(
        &self,
        observations: &[AirNowObservation],
        fetched_at: DateTime<Utc>,
    ) -> Result<u64, Box<dyn std::error::Error>> {
        if observations.is_empty() {
            self.logger
                .info(DataSource::Database, None, "no AirNow observations to insert");
            return Ok(0);
        }

        let mut client = self.connect()?;
        let mut tx = client.transaction()?;
        for obs in observations {
            tx.execute(
                INSERT_AIRNOW_SQL,
                &[
                    &obs.date_observed,
                    &obs.hour_observed,
                    &obs.local_time_zone,
                    &obs.reporting_area,
                    &obs.state_code,
                    &obs.latitude,
                    &obs.longitude,
                    &obs.parameter_name,
                    &obs.aqi,
                    &obs.category_number,
                    &obs.category_name,
                    &fetched_at,
                ],
            )?;
        }
        tx.commit()?;

        let count = observations.len() as u64;
        self.logger.info(
            DataSource::Database,
            None,
            &format!("inserted {} AirNow rows", count),
        );
        Ok(count)
    }

    /// Insert historical CSV records under the identity-key conflict target.
    ///
    /// One transaction per batch, one savepoint per row: a row that fails to
    /// insert rolls back alone, is logged, and the batch continues. Rows
    /// that hit the identity-key conflict are silently skipped by the store
    /// but still count as processed — the returned count is rows processed,
    /// not rows written.
    pub fn insert_aqi_csv_records<I>(&self, records: I) -> Result<u64, Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = AqiCsvRecord>,
    {
        let mut client = self.connect()?;
        let mut tx = client.transaction()?;
        let mut count: u64 = 0;

        for record in records {
            let mut savepoint = tx.savepoint("csv_row")?;
            let result = savepoint.execute(
                INSERT_AQI_CSV_SQL,
                &[
                    &record.date_observed,
                    &record.overall_aqi_value,
                    &record.main_pollutant,
                    &record.site_name,
                    &record.site_id,
                    &record.source,
                    &record.co,
                    &record.ozone,
                    &record.pm10,
                    &record.pm25,
                    &record.no2,
                ],
            );
            match result {
                Ok(_) => {
                    savepoint.commit()?;
                    count += 1;
                }
                Err(e) => {
                    drop(savepoint);
                    self.logger.warn(
                        DataSource::Database,
                        None,
                        &format!("row insertion failed, continuing: {}", e),
                    );
                }
            }
        }

        tx.commit()?;
        self.logger.info(
            DataSource::Database,
            None,
            &format!("processed {} rows from CSV files", count),
        );
        Ok(count)
    }

    /// Upsert weather metrics keyed by date only.
    ///
    /// Ensures the date uniqueness constraint exists first, then inserts or
    /// updates per row, overwriting only the three weather columns on
    /// conflict. Row-level failures are logged and skipped; each row commits
    /// on its own.
    pub fn upsert_weather<I>(&self, records: I) -> Result<u64, Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = WeatherRecord>,
    {
        let mut client = self.connect()?;
        client.batch_execute(ADD_DATE_CONSTRAINT_SQL)?;

        let mut count: u64 = 0;
        for record in records {
            let result = client.execute(
                UPSERT_WEATHER_SQL,
                &[
                    &record.date_observed,
                    &record.temperature,
                    &record.precipitation,
                    &record.wind_speed,
                ],
            );
            match result {
                Ok(_) => count += 1,
                Err(e) => self.logger.warn(
                    DataSource::Database,
                    Some(&record.date_observed.to_string()),
                    &format!("weather upsert failed, continuing: {}", e),
                ),
            }
        }

        self.logger.info(
            DataSource::Database,
            None,
            &format!("upserted weather metrics for {} dates", count),
        );
        Ok(count)
    }
}
