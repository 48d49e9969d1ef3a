/// Command line entry point for the air quality ingestion service.
///
/// Three subcommands, one per source. Each prints the number of records the
/// repository processed; fatal errors are logged and exit non-zero.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use aqimon_service::config::{AirNowConfig, DatabaseConfig, load_environment};
use aqimon_service::ingest;
use aqimon_service::logging::{DataSource, LogLevel, Logger};

#[derive(Parser)]
#[command(name = "aqimon_service")]
#[command(about = "Ingest air quality and weather observations into PostgreSQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to a .env file containing credentials.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Logging level (DEBUG, INFO, WARNING, ERROR).
    #[arg(long, global = true, default_value = "INFO")]
    log_level: LogLevel,

    /// Optional log file path.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest AirNow observations and store them.
    IngestAirnow,

    /// Load historical AQI CSV files into the database.
    IngestCsv {
        /// Paths to AQI CSV files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Fetch daily weather for a date range and upsert it.
    IngestWeather {
        /// Start date, YYYY-MM-DD.
        start: NaiveDate,
        /// End date, YYYY-MM-DD.
        end: NaiveDate,
        /// Latitude of the location.
        latitude: f64,
        /// Longitude of the location.
        longitude: f64,
    },
}

fn run(cli: Cli, logger: &Logger) -> Result<u64, Box<dyn std::error::Error>> {
    load_environment(cli.env_file.as_deref());
    let db_config = DatabaseConfig::from_env()?;

    match cli.command {
        Commands::IngestAirnow => {
            let airnow_config = AirNowConfig::from_env()?;
            ingest::ingest_airnow(&db_config, &airnow_config, logger)
        }
        Commands::IngestCsv { paths } => ingest::ingest_aqi_csvs(&db_config, &paths, logger),
        Commands::IngestWeather {
            start,
            end,
            latitude,
            longitude,
        } => ingest::ingest_weather(&db_config, start, end, latitude, longitude, logger),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = Logger::new(cli.log_level, cli.log_file.clone());

    match run(cli, &logger) {
        Ok(count) => {
            logger.info(
                DataSource::System,
                None,
                &format!("command completed with {} records affected", count),
            );
            println!("{}", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger.error(DataSource::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}
