//! CSV input of consumption, production and weather series.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::devices::OperatingMode;
use crate::error::InputError;
use crate::sim::series::{EnergyRow, EnergySeries};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses a timestamp in any of the accepted layouts.
///
/// # Errors
///
/// Returns `InputError::Timestamp` when no layout matches.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, InputError> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| InputError::Timestamp(s.to_string()))
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    consumption: usize,
    production: usize,
    production_p90: Option<usize>,
    outdoor_temperature: Option<usize>,
    mode: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, InputError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require =
            |name: &str| find(name).ok_or_else(|| InputError::MissingColumn(name.to_string()));
        Ok(Self {
            timestamp: require("timestamp")?,
            consumption: require("consumo")?,
            production: require("autoproducao")?,
            production_p90: find("autoproducao_p90"),
            outdoor_temperature: find("t_ext"),
            mode: find("modo_op"),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("")
}

fn parse_number(record: &csv::StringRecord, index: usize, row: usize, column: &str) -> Result<f64, InputError> {
    let raw = field(record, index);
    raw.parse::<f64>().map_err(|e| InputError::Parse {
        row,
        message: format!("{column} \"{raw}\": {e}"),
    })
}

fn parse_optional_number(
    record: &csv::StringRecord,
    index: Option<usize>,
    row: usize,
    column: &str,
) -> Result<Option<f64>, InputError> {
    match index {
        Some(i) if !field(record, i).is_empty() => parse_number(record, i, row, column).map(Some),
        _ => Ok(None),
    }
}

/// Reads a series from any CSV source.
///
/// Required columns: `timestamp`, `consumo`, `autoproducao` (kWh per
/// interval). Optional columns: `autoproducao_p90`, `t_ext` (°C) and
/// `modo_op`. Empty optional cells are treated as absent.
///
/// # Errors
///
/// Returns an `InputError` for a missing required column, an unparseable
/// cell or a series that fails [`EnergySeries::new`] validation.
pub fn read_series(reader: impl Read, interval_hours: f64) -> Result<EnergySeries, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based data row numbers, header excluded
        let row = i + 1;
        let timestamp = parse_timestamp(field(&record, columns.timestamp))?;
        let mode = match columns.mode.map(|c| field(&record, c)) {
            Some(text) if !text.is_empty() => Some(
                text.parse::<OperatingMode>()
                    .map_err(|message| InputError::Parse { row, message })?,
            ),
            _ => None,
        };
        rows.push(EnergyRow {
            production_p90_kwh: parse_optional_number(
                &record,
                columns.production_p90,
                row,
                "autoproducao_p90",
            )?,
            outdoor_temperature_c: parse_optional_number(
                &record,
                columns.outdoor_temperature,
                row,
                "t_ext",
            )?,
            mode,
            ..EnergyRow::new(
                timestamp,
                parse_number(&record, columns.consumption, row, "consumo")?,
                parse_number(&record, columns.production, row, "autoproducao")?,
            )
        });
    }

    EnergySeries::new(rows, interval_hours)
}

/// Reads a series from a CSV file.
///
/// # Errors
///
/// Returns an `InputError` if the file cannot be opened or its content is
/// invalid; see [`read_series`].
pub fn read_series_csv(path: &Path, interval_hours: f64) -> Result<EnergySeries, InputError> {
    read_series(File::open(path)?, interval_hours)
}
