//! Air quality ingestion service.
//!
//! Ingests observations from three heterogeneous sources — the AirNow REST
//! API, historical AQI CSV exports, and a daily weather archive — and
//! persists them into a single PostgreSQL relation under an upsert/dedup
//! contract keyed on observation identity.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
