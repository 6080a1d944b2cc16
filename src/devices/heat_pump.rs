//! Heat-pump water heater: tank thermal model and per-interval controller.
//!
//! The controller keeps no on/off state. Compressor and backup resistance
//! status are recomputed every interval from the tank temperature, its trend
//! and the setpoints of the active operating mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Density of water (kg/m³).
const WATER_DENSITY: f64 = 1000.0;
/// Specific heat of water expressed in kWh/(kg·°C).
const WATER_SPECIFIC_HEAT: f64 = 4181.0 / 3.6e6;
/// Part-load COP degradation coefficient.
const DEGRADATION_COEFFICIENT: f64 = 0.9;

/// Operating mode requested for an interval.
///
/// Modes are ordered by [`OperatingMode::rank`]; switching to a higher rank
/// forces the compressor on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum OperatingMode {
    #[serde(rename = "economy", alias = "eco", alias = "ECO")]
    Economy,
    #[serde(rename = "comfort", alias = "AUT", alias = "aut")]
    Comfort,
    #[serde(rename = "pv_surplus", alias = "pv", alias = "PV")]
    PvSurplus,
}

impl OperatingMode {
    /// Escalation rank: Economy 0, Comfort 1, PV surplus 2.
    pub fn rank(self) -> u8 {
        match self {
            Self::Economy => 0,
            Self::Comfort => 1,
            Self::PvSurplus => 2,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Economy => "economy",
            Self::Comfort => "comfort",
            Self::PvSurplus => "pv_surplus",
        })
    }
}

impl FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "economy" | "eco" | "ECO" => Ok(Self::Economy),
            "comfort" | "AUT" | "aut" => Ok(Self::Comfort),
            "pv_surplus" | "pv" | "PV" => Ok(Self::PvSurplus),
            other => Err(format!("unknown operating mode \"{other}\"")),
        }
    }
}

/// Controller setpoints (°C) and hysteresis bands (K).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Setpoints {
    /// Economy target.
    pub sp1: f64,
    /// Comfort target.
    pub sp2: f64,
    /// Economy backup floor, active with `use_resistance_below_min`.
    pub sp3: f64,
    /// Compressor ceiling.
    pub sp5: f64,
    /// PV-surplus target.
    pub sp6: f64,
    /// Compressor hysteresis.
    pub r0: f64,
    /// Resistance hysteresis in comfort and PV-surplus modes.
    pub r7: f64,
    /// Lets the resistance hold the tank above `sp3` in economy mode.
    pub use_resistance_below_min: bool,
}

impl Default for Setpoints {
    fn default() -> Self {
        Self {
            sp1: 52.0,
            sp2: 60.0,
            sp3: 45.0,
            sp5: 55.0,
            sp6: 65.0,
            r0: 5.0,
            r7: 15.0,
            use_resistance_below_min: false,
        }
    }
}

/// Temperature thresholds derived for one operating mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Compressor switches on below this while cooling down.
    pub t_min_bc: f64,
    /// Compressor target.
    pub t_max_bc: f64,
    /// Lower tank limit for the resistance.
    pub t_min_s: f64,
    /// Tank target.
    pub t_max_s: f64,
}

impl Setpoints {
    /// Derives the thresholds of `mode`.
    pub fn thresholds(&self, mode: OperatingMode) -> Thresholds {
        let target = match mode {
            OperatingMode::Economy => self.sp1,
            OperatingMode::Comfort => self.sp2,
            OperatingMode::PvSurplus => self.sp6,
        };
        let t_max_bc = target.min(self.sp5);
        let t_min_bc = t_max_bc - self.r0;
        let t_min_s = match mode {
            OperatingMode::Economy if self.use_resistance_below_min => self.sp3,
            OperatingMode::Economy => t_min_bc,
            OperatingMode::Comfort | OperatingMode::PvSurplus => (target - self.r7).min(t_min_bc),
        };
        Thresholds {
            t_min_bc,
            t_max_bc,
            t_min_s,
            t_max_s: target,
        }
    }

    /// Validates hysteresis bands and setpoint ordering.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let targets = [
            ("sp1", self.sp1),
            ("sp2", self.sp2),
            ("sp3", self.sp3),
            ("sp5", self.sp5),
            ("sp6", self.sp6),
        ];
        for (name, value) in targets {
            if !value.is_finite() {
                errors.push(ConfigError::new(
                    format!("heat_pump.setpoints.{name}"),
                    "must be a finite temperature",
                ));
            }
        }
        if !(self.r0 >= 0.0 && self.r0.is_finite()) {
            errors.push(ConfigError::new("heat_pump.setpoints.r0", "must be >= 0"));
        }
        if !(self.r7 >= 0.0 && self.r7.is_finite()) {
            errors.push(ConfigError::new("heat_pump.setpoints.r7", "must be >= 0"));
        }
        if self.use_resistance_below_min && self.sp3 > self.sp1 {
            errors.push(ConfigError::new(
                "heat_pump.setpoints.sp3",
                "must be <= heat_pump.setpoints.sp1 when use_resistance_below_min is set",
            ));
        }
        errors
    }
}

/// Returns whether the compressor runs this interval.
///
/// On while heating up below `t_max_bc`, while cooling down below
/// `t_min_bc`, or whenever the mode escalated since the last interval.
pub fn compressor_on(
    thresholds: &Thresholds,
    tank_c: f64,
    trend_c: f64,
    mode: OperatingMode,
    previous_mode: OperatingMode,
) -> bool {
    (trend_c >= 0.0 && tank_c < thresholds.t_max_bc)
        || (trend_c < 0.0 && tank_c < thresholds.t_min_bc)
        || mode.rank() > previous_mode.rank()
}

/// Heat-pump water heater parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPump {
    /// Nominal thermal power of the compressor (kW).
    pub thermal_power_kw: f64,
    /// Nominal coefficient of performance.
    pub cop: f64,
    /// Backup resistance power (kW).
    pub resistance_power_kw: f64,
    /// Tank volume (m³).
    pub tank_volume_m3: f64,
    /// Share of the indoor/outdoor gap seen by the tank's surroundings (0..1).
    pub room_coupling: f64,
    /// Controller setpoints.
    pub setpoints: Setpoints,
}

/// Inputs of one controller interval.
#[derive(Debug, Clone, Copy)]
pub struct HeatPumpInput {
    /// Temperature around the tank (°C).
    pub room_c: f64,
    /// Tank temperature at the start of the interval (°C).
    pub tank_c: f64,
    /// Tank temperature at the start of the previous interval (°C).
    pub previous_tank_c: f64,
    /// Hot water drawn during the interval (kWh).
    pub extraction_kwh: f64,
    pub mode: OperatingMode,
    pub previous_mode: OperatingMode,
    /// Interval duration (h).
    pub interval_hours: f64,
}

/// Outputs of one controller interval; energies in kWh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPumpStep {
    /// Tank temperature at the end of the interval (°C).
    pub next_tank_c: f64,
    /// Heat delivered by the compressor.
    pub heat_pump_kwh: f64,
    /// Heat delivered by the backup resistance.
    pub resistance_kwh: f64,
    /// Electricity used by the compressor.
    pub electricity_kwh: f64,
    /// Heat lost from the tank to its surroundings.
    pub tank_loss_kwh: f64,
}

impl HeatPump {
    /// Creates a heat pump and validates its parameters.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint: non-positive power, COP or volume,
    /// negative resistance power, coupling outside [0, 1], or invalid setpoints.
    pub fn new(
        thermal_power_kw: f64,
        cop: f64,
        resistance_power_kw: f64,
        tank_volume_m3: f64,
        room_coupling: f64,
        setpoints: Setpoints,
    ) -> Result<Self, Vec<ConfigError>> {
        let mut errors = Vec::new();
        if !(thermal_power_kw > 0.0 && thermal_power_kw.is_finite()) {
            errors.push(ConfigError::new("heat_pump.thermal_power_kw", "must be > 0"));
        }
        if !(cop > 0.0 && cop.is_finite()) {
            errors.push(ConfigError::new("heat_pump.cop", "must be > 0"));
        }
        if !(resistance_power_kw >= 0.0 && resistance_power_kw.is_finite()) {
            errors.push(ConfigError::new("heat_pump.resistance_power_kw", "must be >= 0"));
        }
        if !(tank_volume_m3 > 0.0 && tank_volume_m3.is_finite()) {
            errors.push(ConfigError::new("heat_pump.tank_volume_m3", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&room_coupling) {
            errors.push(ConfigError::new("heat_pump.room_coupling", "must be in [0.0, 1.0]"));
        }
        errors.extend(setpoints.validate());
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            thermal_power_kw,
            cop,
            resistance_power_kw,
            tank_volume_m3,
            room_coupling,
            setpoints,
        })
    }

    /// Heat capacity of the full tank (kWh/°C).
    pub fn tank_capacity_kwh_per_c(&self) -> f64 {
        WATER_DENSITY * self.tank_volume_m3 * WATER_SPECIFIC_HEAT
    }

    /// Standing loss coefficient of the tank (kW/°C).
    pub fn loss_coefficient_kw_per_c(&self) -> f64 {
        (1.023 * self.tank_volume_m3 + 1.293) / 1000.0
    }

    /// Temperature around the tank for the given indoor and outdoor temperatures.
    pub fn room_temperature(&self, indoor_c: f64, outdoor_c: f64) -> f64 {
        indoor_c - self.room_coupling * (indoor_c - outdoor_c)
    }

    /// Runs the controller for one interval.
    pub fn step(&self, input: &HeatPumpInput) -> HeatPumpStep {
        let tau = input.interval_hours;
        let capacity = self.tank_capacity_kwh_per_c();
        let max_heat_pump_kwh = self.thermal_power_kw * tau;
        let max_resistance_kwh = self.resistance_power_kw * tau;
        let th = self.setpoints.thresholds(input.mode);

        let tank_loss_kwh = self.loss_coefficient_kw_per_c() * tau * (input.tank_c - input.room_c);
        let trend = input.tank_c - input.previous_tank_c;
        let drawn = tank_loss_kwh + input.extraction_kwh;

        let offered_kwh = if compressor_on(&th, input.tank_c, trend, input.mode, input.previous_mode) {
            max_heat_pump_kwh
        } else {
            0.0
        };

        let t_prime = input.tank_c + (offered_kwh - drawn) / capacity;
        let rise_kwh = if t_prime > th.t_max_s {
            drawn + capacity * (th.t_max_bc - input.tank_c)
        } else {
            offered_kwh
        };
        let fall_kwh = if t_prime < th.t_min_bc {
            (drawn + capacity * (th.t_min_bc - t_prime)).min(max_heat_pump_kwh)
        } else {
            0.0
        };
        let heat_pump_kwh = rise_kwh.max(fall_kwh);
        let t_prime = input.tank_c + (heat_pump_kwh - drawn) / capacity;

        let resistance_kwh = match input.mode {
            OperatingMode::Economy => {
                let margin_kwh = capacity * (t_prime - th.t_min_s);
                if margin_kwh < 0.0 && self.setpoints.use_resistance_below_min {
                    margin_kwh.abs().min(max_resistance_kwh)
                } else {
                    0.0
                }
            }
            OperatingMode::Comfort | OperatingMode::PvSurplus => {
                let on = (trend > 0.0 && t_prime < th.t_max_s) || (trend < 0.0 && t_prime < th.t_min_s);
                if on {
                    (capacity * (th.t_max_s - t_prime)).min(max_resistance_kwh)
                } else {
                    0.0
                }
            }
        };

        let next_tank_c = input.tank_c + (heat_pump_kwh + resistance_kwh - drawn) / capacity;

        let capacity_ratio = (heat_pump_kwh / max_heat_pump_kwh).min(1.0);
        let cop_factor =
            capacity_ratio / (1.0 - DEGRADATION_COEFFICIENT + DEGRADATION_COEFFICIENT * capacity_ratio);
        let electricity_kwh = if cop_factor > 0.0 {
            heat_pump_kwh / (self.cop * cop_factor)
        } else {
            0.0
        };

        HeatPumpStep {
            next_tank_c,
            heat_pump_kwh,
            resistance_kwh,
            electricity_kwh,
            tank_loss_kwh,
        }
    }
}
