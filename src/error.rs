//! Error types for parkwatch

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum ParkingError {
    /// Vehicle type has no entry in the rate table
    #[error("No rate found for vehicle type '{0}'")]
    RateNotFound(String),

    #[error("Invalid timestamp '{value}' (expected YYYY-MM-DD HH:MM)")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// Token already held by a vehicle that has not exited
    #[error("Token '{0}' is already assigned to a parked vehicle")]
    DuplicateActiveToken(String),

    #[error("Token '{token}' matches {count} parked vehicles")]
    AmbiguousToken { token: String, count: usize },

    #[error("Invalid row {row} in {table}: {reason}")]
    InvalidRow {
        table: &'static str,
        row: usize,
        reason: String,
    },

    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ParkingError>;
