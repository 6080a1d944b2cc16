//! Heat-pump simulation loop over a time series.

use tracing::debug;

use crate::devices::{ExtractionProfile, HeatPump, HeatPumpInput, OperatingMode};
use crate::error::InputError;

use super::series::EnergySeries;
use super::types::HeatPumpRow;

/// Tank temperatures carried between intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankState {
    /// Temperature at the start of the current interval (°C).
    pub current_c: f64,
    /// Temperature at the start of the previous interval (°C).
    pub previous_c: f64,
}

/// Runs a heat pump against an extraction profile and a weather series.
pub struct ThermalEngine<'a> {
    heat_pump: &'a HeatPump,
    profile: &'a ExtractionProfile,
    indoor_temperature_c: f64,
    initial_tank_c: Option<f64>,
    default_mode: OperatingMode,
}

impl<'a> ThermalEngine<'a> {
    /// Creates a new thermal engine.
    ///
    /// # Arguments
    ///
    /// * `heat_pump` - Validated heat-pump parameters
    /// * `profile` - Hot-water extraction profile
    /// * `indoor_temperature_c` - Indoor temperature of the dwelling (°C)
    pub fn new(heat_pump: &'a HeatPump, profile: &'a ExtractionProfile, indoor_temperature_c: f64) -> Self {
        Self {
            heat_pump,
            profile,
            indoor_temperature_c,
            initial_tank_c: None,
            default_mode: OperatingMode::Economy,
        }
    }

    /// Starts the tank at `tank_c` instead of the room temperature.
    pub fn with_initial_tank_c(mut self, tank_c: f64) -> Self {
        self.initial_tank_c = Some(tank_c);
        self
    }

    /// Mode used for rows that carry none.
    pub fn with_default_mode(mut self, mode: OperatingMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Simulates every interval of `series`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::MissingColumn("t_ext")` if a row has no outdoor
    /// temperature, or a profile lookup error for an invalid interval.
    pub fn run(&self, series: &EnergySeries) -> Result<Vec<HeatPumpRow>, InputError> {
        let dt = series.interval_hours();
        let mut rows = Vec::with_capacity(series.len());
        let mut state: Option<TankState> = None;
        let mut previous_mode = self.default_mode;

        for row in series.rows() {
            let outdoor_c = row
                .outdoor_temperature_c
                .ok_or_else(|| InputError::MissingColumn("t_ext".to_string()))?;
            let mode = row.mode.unwrap_or(self.default_mode);
            let room_c = self.heat_pump.room_temperature(self.indoor_temperature_c, outdoor_c);

            let tank = match state {
                Some(tank) => tank,
                None => {
                    let start_c = self.initial_tank_c.unwrap_or(room_c);
                    previous_mode = mode;
                    TankState {
                        current_c: start_c,
                        previous_c: start_c,
                    }
                }
            };

            let extraction_kwh = self.profile.lookup(row.timestamp, dt)?;
            let step = self.heat_pump.step(&HeatPumpInput {
                room_c,
                tank_c: tank.current_c,
                previous_tank_c: tank.previous_c,
                extraction_kwh,
                mode,
                previous_mode,
                interval_hours: dt,
            });

            rows.push(HeatPumpRow {
                timestamp: row.timestamp,
                room_c,
                tank_c: tank.current_c,
                tank_loss_kwh: step.tank_loss_kwh,
                extraction_kwh,
                heat_pump_kwh: step.heat_pump_kwh,
                resistance_kwh: step.resistance_kwh,
                electricity_kwh: step.electricity_kwh,
                mode,
            });

            state = Some(TankState {
                current_c: step.next_tank_c,
                previous_c: tank.current_c,
            });
            previous_mode = mode;
        }

        debug!(
            steps = rows.len(),
            final_tank_c = state.map(|s| s.current_c),
            "heat-pump simulation finished"
        );
        Ok(rows)
    }
}
