/// Structured logging for the ingestion service.
///
/// Provides context-rich logging with source tags, per-message context
/// (file name, date, database name), and severity levels. Supports both
/// console output and file-based logging.
///
/// The `Logger` is an explicit handle: it is constructed once by the process
/// entry point and passed by reference to the repository and orchestrators.
/// There is no process-global logger.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    AirNow,
    Csv,
    Meteo,
    Database,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::AirNow => write!(f, "AIRNOW"),
            DataSource::Csv => write!(f, "CSV"),
            DataSource::Meteo => write!(f, "METEO"),
            DataSource::Database => write!(f, "DB"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger handle
// ---------------------------------------------------------------------------

pub struct Logger {
    /// Minimum log level to emit.
    min_level: LogLevel,
    /// Optional file path for append-only logging.
    log_file: Option<PathBuf>,
}

impl Logger {
    pub fn new(min_level: LogLevel, log_file: Option<PathBuf>) -> Self {
        Logger {
            min_level,
            log_file,
        }
    }

    pub fn info(&self, source: DataSource, context: Option<&str>, message: &str) {
        self.log(LogLevel::Info, source, context, message);
    }

    pub fn warn(&self, source: DataSource, context: Option<&str>, message: &str) {
        self.log(LogLevel::Warning, source, context, message);
    }

    pub fn error(&self, source: DataSource, context: Option<&str>, message: &str) {
        self.log(LogLevel::Error, source, context, message);
    }

    pub fn debug(&self, source: DataSource, context: Option<&str>, message: &str) {
        self.log(LogLevel::Debug, source, context, message);
    }

    fn log(&self, level: LogLevel, source: DataSource, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, context_part, message
        );

        // Errors and warnings go to stderr, the rest to stdout.
        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
            LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path.display(), e);
            }
        }
    }

    fn append_to_file(path: &Path, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}
