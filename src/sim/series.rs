//! Validated input time series shared by the dispatch and heat-pump loops.

use chrono::{Duration, NaiveDateTime};

use crate::devices::OperatingMode;
use crate::error::InputError;

/// One input interval; energies in kWh over the interval.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRow {
    /// Start of the interval.
    pub timestamp: NaiveDateTime,
    /// Household consumption.
    pub consumption_kwh: f64,
    /// PV production.
    pub production_kwh: f64,
    /// Production exceeded with 90 % probability, when available.
    pub production_p90_kwh: Option<f64>,
    /// Outdoor temperature (°C), required by the heat-pump loop.
    pub outdoor_temperature_c: Option<f64>,
    /// Requested heat-pump operating mode.
    pub mode: Option<OperatingMode>,
}

impl EnergyRow {
    /// Row with consumption and production only.
    pub fn new(timestamp: NaiveDateTime, consumption_kwh: f64, production_kwh: f64) -> Self {
        Self {
            timestamp,
            consumption_kwh,
            production_kwh,
            production_p90_kwh: None,
            outdoor_temperature_c: None,
            mode: None,
        }
    }
}

/// Ordered, gap-free, fixed-interval series.
///
/// Construction checks that timestamps increase by exactly one interval and
/// that consumption and production are non-negative, so the loops can rely
/// on both.
#[derive(Debug, Clone)]
pub struct EnergySeries {
    rows: Vec<EnergyRow>,
    interval_hours: f64,
}

impl EnergySeries {
    /// Validates `rows` against the interval.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for a non-positive interval, an empty series,
    /// decreasing or irregular timestamps, a negative consumption/production
    /// value, or any non-finite value.
    pub fn new(rows: Vec<EnergyRow>, interval_hours: f64) -> Result<Self, InputError> {
        if !(interval_hours > 0.0 && interval_hours.is_finite()) {
            return Err(InputError::InvalidInterval(interval_hours));
        }
        if rows.is_empty() {
            return Err(InputError::Empty);
        }
        let step = Duration::seconds((interval_hours * 3600.0).round() as i64);
        if step <= Duration::zero() {
            return Err(InputError::InvalidInterval(interval_hours));
        }

        for row in &rows {
            let checks = [
                ("consumo", row.consumption_kwh),
                ("autoproducao", row.production_kwh),
                ("autoproducao_p90", row.production_p90_kwh.unwrap_or(0.0)),
            ];
            for (column, value) in checks {
                if !value.is_finite() {
                    return Err(InputError::NotFinite {
                        column,
                        timestamp: row.timestamp,
                    });
                }
                if value < 0.0 {
                    return Err(InputError::NegativeValue {
                        column,
                        value,
                        timestamp: row.timestamp,
                    });
                }
            }
            if row.outdoor_temperature_c.is_some_and(|t| !t.is_finite()) {
                return Err(InputError::NotFinite {
                    column: "t_ext",
                    timestamp: row.timestamp,
                });
            }
        }

        for pair in rows.windows(2) {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current <= previous {
                return Err(InputError::NonMonotonic { previous, current });
            }
            if current - previous != step {
                return Err(InputError::IrregularInterval {
                    previous,
                    current,
                    expected_minutes: step.num_minutes(),
                });
            }
        }

        Ok(Self {
            rows,
            interval_hours,
        })
    }

    /// Rows in time order.
    pub fn rows(&self) -> &[EnergyRow] {
        &self.rows
    }

    /// Interval duration in hours.
    pub fn interval_hours(&self) -> f64 {
        self.interval_hours
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether every row carries a P90 production value.
    pub fn has_p90(&self) -> bool {
        self.rows.iter().all(|r| r.production_p90_kwh.is_some())
    }

    /// Copy of the series with P90 production in place of the expected one.
    ///
    /// Returns `None` unless every row carries a P90 value.
    pub fn p90_variant(&self) -> Option<Self> {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                r.production_p90_kwh.map(|p90| EnergyRow {
                    production_kwh: p90,
                    ..r.clone()
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            rows,
            interval_hours: self.interval_hours,
        })
    }

    /// Adds `extra_kwh[i]` to the consumption of row `i`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::LengthMismatch` unless `extra_kwh` has one value
    /// per row. The series is left untouched in that case.
    pub fn add_consumption(&mut self, extra_kwh: &[f64]) -> Result<(), InputError> {
        if extra_kwh.len() != self.rows.len() {
            return Err(InputError::LengthMismatch {
                expected: self.rows.len(),
                found: extra_kwh.len(),
            });
        }
        for (row, extra) in self.rows.iter_mut().zip(extra_kwh) {
            row.consumption_kwh += extra.max(0.0);
        }
        Ok(())
    }
}
