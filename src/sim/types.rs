//! Core simulation types: run configuration and per-interval results.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::ConfigError;
use crate::devices::OperatingMode;

/// Centralized simulation configuration shared by the dispatch and thermal loops.
///
/// # Examples
///
/// ```
/// use selfconsumption_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(0.25, 0.96).unwrap();
/// assert_eq!(cfg.steps_per_day(), 96);
/// assert!(SimConfig::new(0.0, 0.96).is_err());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Duration of one interval in hours.
    pub interval_hours: f64,
    /// DC to AC conversion efficiency of the inverter (0..1.0].
    pub inverter_efficiency: f64,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Arguments
    ///
    /// * `interval_hours` - Interval duration in hours (must be > 0 and divide a day)
    /// * `inverter_efficiency` - Inverter efficiency (0..1.0]
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the interval is not a positive finite
    /// number or the efficiency is outside (0, 1].
    pub fn new(interval_hours: f64, inverter_efficiency: f64) -> Result<Self, ConfigError> {
        if !(interval_hours > 0.0 && interval_hours.is_finite()) {
            return Err(ConfigError::new(
                "simulation.interval_hours",
                format!("must be a positive number of hours, got {interval_hours}"),
            ));
        }
        if !(inverter_efficiency > 0.0 && inverter_efficiency <= 1.0) {
            return Err(ConfigError::new(
                "simulation.inverter_efficiency",
                format!("must be in (0, 1], got {inverter_efficiency}"),
            ));
        }
        Ok(Self {
            interval_hours,
            inverter_efficiency,
        })
    }

    /// Number of intervals in one day.
    pub fn steps_per_day(&self) -> usize {
        (24.0 / self.interval_hours).round() as usize
    }

    /// Interval duration in whole minutes.
    pub fn interval_minutes(&self) -> i64 {
        (self.interval_hours * 60.0).round() as i64
    }
}

/// Energy balance of one interval after battery dispatch; energies in kWh.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRow {
    /// Start of the interval.
    pub timestamp: NaiveDateTime,
    /// Household consumption.
    pub consumption_kwh: f64,
    /// PV production on the DC side.
    pub production_kwh: f64,
    /// Consumption covered by PV or battery.
    pub self_consumption_kwh: f64,
    /// Energy bought from the grid.
    pub grid_import_kwh: f64,
    /// Energy injected into the grid.
    pub grid_export_kwh: f64,
    /// Energy stored in the battery.
    pub battery_charge_kwh: f64,
    /// Energy delivered by the battery.
    pub battery_discharge_kwh: f64,
    /// Battery state of charge at the end of the interval (0 without storage).
    pub soc: f64,
}

impl fmt::Display for DispatchRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | load={:>6.3}  pv={:>6.3} | self={:>6.3}  import={:>6.3}  export={:>6.3} \
             | charge={:>6.3}  discharge={:>6.3}  soc={:.3}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.consumption_kwh,
            self.production_kwh,
            self.self_consumption_kwh,
            self.grid_import_kwh,
            self.grid_export_kwh,
            self.battery_charge_kwh,
            self.battery_discharge_kwh,
            self.soc,
        )
    }
}

/// Tank state and energy flows of one heat-pump interval; energies in kWh.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPumpRow {
    /// Start of the interval.
    pub timestamp: NaiveDateTime,
    /// Temperature around the tank (°C).
    pub room_c: f64,
    /// Tank temperature at the start of the interval (°C).
    pub tank_c: f64,
    /// Standing losses of the tank.
    pub tank_loss_kwh: f64,
    /// Hot water drawn.
    pub extraction_kwh: f64,
    /// Heat delivered by the compressor.
    pub heat_pump_kwh: f64,
    /// Heat delivered by the backup resistance.
    pub resistance_kwh: f64,
    /// Electricity used by the compressor.
    pub electricity_kwh: f64,
    /// Operating mode of the interval.
    pub mode: OperatingMode,
}

impl HeatPumpRow {
    /// Electricity drawn by compressor and resistance together.
    pub fn total_electricity_kwh(&self) -> f64 {
        self.electricity_kwh + self.resistance_kwh
    }
}

impl fmt::Display for HeatPumpRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | tank={:>6.2} °C  room={:>5.2} °C | draw={:.3}  hp={:.3}  resist={:.3}  \
             elec={:.3}  loss={:.4} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.tank_c,
            self.room_c,
            self.extraction_kwh,
            self.heat_pump_kwh,
            self.resistance_kwh,
            self.electricity_kwh,
            self.tank_loss_kwh,
            self.mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn sim_config_basic() {
        let cfg = SimConfig::new(1.0, 0.96).unwrap();
        assert_eq!(cfg.steps_per_day(), 24);
        assert_eq!(cfg.interval_minutes(), 60);
    }

    #[test]
    fn sim_config_sub_hourly() {
        let cfg = SimConfig::new(0.25, 1.0).unwrap();
        assert_eq!(cfg.steps_per_day(), 96);
        assert_eq!(cfg.interval_minutes(), 15);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.5)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn sim_config_rejects_bad_interval(#[case] interval_hours: f64) {
        let err = SimConfig::new(interval_hours, 1.0).unwrap_err();
        assert_eq!(err.field, "simulation.interval_hours");
    }

    #[rstest]
    #[case::above_one(1.2)]
    #[case::zero(0.0)]
    #[case::nan(f64::NAN)]
    fn sim_config_rejects_bad_efficiency(#[case] efficiency: f64) {
        let err = SimConfig::new(1.0, efficiency).unwrap_err();
        assert_eq!(err.field, "simulation.inverter_efficiency");
    }

    #[test]
    fn dispatch_row_display_does_not_panic() {
        let r = DispatchRow {
            timestamp: ts(),
            consumption_kwh: 1.0,
            production_kwh: 2.0,
            self_consumption_kwh: 1.0,
            grid_import_kwh: 0.0,
            grid_export_kwh: 0.5,
            battery_charge_kwh: 0.5,
            battery_discharge_kwh: 0.0,
            soc: 0.5,
        };
        let s = format!("{r}");
        assert!(s.starts_with("2021-06-01 12:00"));
    }

    #[test]
    fn heat_pump_row_display_does_not_panic() {
        let r = HeatPumpRow {
            timestamp: ts(),
            room_c: 14.0,
            tank_c: 50.0,
            tank_loss_kwh: 0.05,
            extraction_kwh: 1.0,
            heat_pump_kwh: 1.55,
            resistance_kwh: 0.0,
            electricity_kwh: 0.43,
            mode: OperatingMode::Economy,
        };
        assert!(format!("{r}").contains("economy"));
        assert_eq!(r.total_electricity_kwh(), 0.43);
    }
}
