//! Error types for input series, profiles, I/O and scenario runs.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while loading or validating time-series input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("missing required column \"{0}\"")]
    MissingColumn(String),
    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },
    #[error("cannot parse timestamp \"{0}\"")]
    Timestamp(String),
    #[error("timestamps must be strictly increasing: {previous} followed by {current}")]
    NonMonotonic {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
    #[error("expected a {expected_minutes} min interval after {previous}, found {current}")]
    IrregularInterval {
        previous: NaiveDateTime,
        current: NaiveDateTime,
        expected_minutes: i64,
    },
    #[error("negative {column} ({value}) at {timestamp}")]
    NegativeValue {
        column: &'static str,
        value: f64,
        timestamp: NaiveDateTime,
    },
    #[error("non-finite {column} at {timestamp}")]
    NotFinite {
        column: &'static str,
        timestamp: NaiveDateTime,
    },
    #[error("interval must be a positive, finite number of hours, got {0}")]
    InvalidInterval(f64),
    #[error("expected {expected} values, one per row, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("input series is empty")]
    Empty,
    #[error("extraction profile lookup: {0}")]
    ProfileDomain(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a scenario run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid scenario: {}", join(.0))]
    Config(Vec<ConfigError>),
    #[error(transparent)]
    Input(#[from] InputError),
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(vec![e])
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
