//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::devices::{
    Battery, HeatPump, OperatingMode, PercentBattery, ProfileSize, SelfConsumptionBattery,
    Setpoints, StorageModel,
};
use crate::sim::kpi::OffPeakWindow;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Interval, horizon and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Synthetic household load.
    #[serde(default)]
    pub load: LoadConfig,
    /// PV installation and synthetic yield.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Synthetic outdoor temperature.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Battery storage.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Heat-pump water heater.
    #[serde(default)]
    pub heat_pump: HeatPumpConfig,
    /// Indicator options.
    #[serde(default)]
    pub indicators: IndicatorConfig,
}

/// Interval, horizon and global parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Interval duration in hours (must divide 24 h evenly).
    pub interval_hours: f64,
    /// Start of the synthetic series.
    pub start: NaiveDateTime,
    /// Number of days of synthetic series (must be > 0).
    pub days: usize,
    /// Master random seed.
    pub seed: u64,
    /// Inverter efficiency (0.0-1.0].
    pub inverter_efficiency: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_hours: 1.0,
            start: NaiveDate::from_ymd_opt(2021, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            days: 365,
            seed: 42,
            inverter_efficiency: 0.96,
        }
    }
}

/// Synthetic household load parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Mean demand (kW).
    pub base_kw: f64,
    /// Daily sinusoidal amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Extra demand in mid-winter, fading to zero in mid-summer (kW).
    pub winter_boost_kw: f64,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_kw: 0.4,
            amp_kw: 0.15,
            phase_rad: 2.6,
            winter_boost_kw: 0.15,
            noise_std: 0.05,
        }
    }
}

/// PV installation parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Installed capacity (kWp).
    pub kw_peak: f64,
    /// Sunrise at the equinox (h).
    pub sunrise_hour: f64,
    /// Sunset at the equinox (h).
    pub sunset_hour: f64,
    /// Half the difference between the longest and shortest day (h).
    pub seasonal_swing_hours: f64,
    /// Noise standard deviation as a fraction of output.
    pub noise_std: f64,
    /// Scales synthetic production into a P90 series; no P90 run when unset.
    pub p90_factor: Option<f64>,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            kw_peak: 1.5,
            sunrise_hour: 7.0,
            sunset_hour: 19.0,
            seasonal_swing_hours: 2.0,
            noise_std: 0.1,
            p90_factor: None,
        }
    }
}

/// Synthetic outdoor temperature parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Annual mean (°C).
    pub mean_c: f64,
    /// Half the gap between the warmest and coldest day (°C).
    pub annual_amp_c: f64,
    /// Half the gap between afternoon and night (°C).
    pub daily_amp_c: f64,
    /// Gaussian noise standard deviation (°C).
    pub noise_std: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            mean_c: 16.0,
            annual_amp_c: 5.0,
            daily_amp_c: 4.0,
            noise_std: 0.5,
        }
    }
}

/// Storage strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryModel {
    /// Continuous kWh model with discharge losses and a power limit.
    SelfConsumption,
    /// Lossless percent model with full-cycle counting.
    Percent,
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Whether the installation has a battery.
    pub enabled: bool,
    pub model: BatteryModel,
    /// Total energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Lowest usable state of charge as a fraction of capacity.
    pub soc_min: f64,
    /// Highest usable state of charge as a fraction of capacity.
    pub soc_max: f64,
    /// Discharge efficiency (0.0-1.0]; ignored by the percent model.
    pub efficiency: f64,
    /// Charge and discharge power limit (kW); unlimited when unset.
    pub max_power_kw: Option<f64>,
    /// Initial usable energy (kWh); half the usable window when unset.
    pub initial_soc_kwh: Option<f64>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: BatteryModel::SelfConsumption,
            capacity_kwh: 2.4,
            soc_min: 0.1,
            soc_max: 0.9,
            efficiency: 0.95,
            max_power_kw: None,
            initial_soc_kwh: None,
        }
    }
}

impl BatteryConfig {
    /// Builds the configured storage device, or `None` when disabled.
    ///
    /// # Errors
    ///
    /// Returns the first violated battery constraint.
    pub fn build(&self) -> Result<Option<StorageModel>, ConfigError> {
        if !self.enabled {
            return Ok(None);
        }
        if let Some(soc) = self.initial_soc_kwh {
            if !(soc >= 0.0 && soc.is_finite()) {
                return Err(ConfigError::new("battery.initial_soc_kwh", "must be >= 0"));
            }
        }
        let storage = match self.model {
            BatteryModel::SelfConsumption => {
                let mut battery =
                    Battery::new(self.capacity_kwh, self.soc_min, self.soc_max, self.efficiency)?;
                if let Some(kw) = self.max_power_kw {
                    battery = battery.with_max_power_kw(kw)?;
                }
                StorageModel::SelfConsumption(SelfConsumptionBattery::new(
                    battery,
                    self.initial_soc_kwh,
                ))
            }
            BatteryModel::Percent => StorageModel::Percent(PercentBattery::new(
                self.capacity_kwh,
                self.soc_min * 100.0,
                self.soc_max * 100.0,
            )?),
        };
        Ok(Some(storage))
    }
}

/// Heat-pump water heater parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatPumpConfig {
    /// Whether the installation has a heat-pump water heater.
    pub enabled: bool,
    /// Nominal thermal power (kW).
    pub thermal_power_kw: f64,
    /// Nominal coefficient of performance.
    pub cop: f64,
    /// Backup resistance power (kW).
    pub resistance_power_kw: f64,
    /// Tank volume (m³).
    pub tank_volume_m3: f64,
    /// Room coupling factor (0.0-1.0).
    pub room_coupling: f64,
    /// Indoor temperature of the dwelling (°C).
    pub indoor_temperature_c: f64,
    /// Initial tank temperature (°C); the room temperature when unset.
    pub initial_tank_temperature_c: Option<f64>,
    /// Standard tapping cycle size.
    pub profile: ProfileSize,
    /// CSV tapping profile replacing the standard table.
    pub profile_file: Option<PathBuf>,
    /// Mode for intervals whose input carries none.
    pub default_mode: OperatingMode,
    /// Adds heat-pump and resistance electricity to household consumption.
    pub add_to_consumption: bool,
    /// Minimum useful hot-water temperature (°C).
    pub consumption_temperature_c: f64,
    pub setpoints: Setpoints,
}

impl Default for HeatPumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            thermal_power_kw: 1.55,
            cop: 3.6,
            resistance_power_kw: 1.5,
            tank_volume_m3: 0.152,
            room_coupling: 0.5,
            indoor_temperature_c: 20.0,
            initial_tank_temperature_c: None,
            profile: ProfileSize::L,
            profile_file: None,
            default_mode: OperatingMode::Economy,
            add_to_consumption: false,
            consumption_temperature_c: 40.0,
            setpoints: Setpoints::default(),
        }
    }
}

impl HeatPumpConfig {
    /// Builds the configured heat pump, or `None` when disabled.
    ///
    /// # Errors
    ///
    /// Returns every violated heat-pump constraint.
    pub fn build(&self) -> Result<Option<HeatPump>, Vec<ConfigError>> {
        if !self.enabled {
            return Ok(None);
        }
        HeatPump::new(
            self.thermal_power_kw,
            self.cop,
            self.resistance_power_kw,
            self.tank_volume_m3,
            self.room_coupling,
            self.setpoints.clone(),
        )
        .map(Some)
    }
}

/// Indicator options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    /// First hour of the off-peak tariff window.
    pub off_peak_start_hour: u32,
    /// Hour the off-peak tariff window ends (exclusive).
    pub off_peak_end_hour: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let window = OffPeakWindow::default();
        Self {
            off_peak_start_hour: window.start_hour,
            off_peak_end_hour: window.end_hour,
        }
    }
}

impl IndicatorConfig {
    pub fn off_peak(&self) -> OffPeakWindow {
        OffPeakWindow {
            start_hour: self.off_peak_start_hour,
            end_hour: self.off_peak_end_hour,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.soc_min"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error in {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: PV with a continuous-model battery.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the PV-only preset.
    pub fn no_battery() -> Self {
        Self {
            battery: BatteryConfig {
                enabled: false,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the heat-pump preset: larger array, heat pump feeding the load.
    pub fn heat_pump() -> Self {
        Self {
            solar: SolarConfig {
                kw_peak: 2.5,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                capacity_kwh: 4.8,
                max_power_kw: Some(2.5),
                ..BatteryConfig::default()
            },
            heat_pump: HeatPumpConfig {
                enabled: true,
                add_to_consumption: true,
                ..HeatPumpConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the legacy preset: percent battery with full-cycle counting.
    pub fn legacy_battery() -> Self {
        Self {
            battery: BatteryConfig {
                model: BatteryModel::Percent,
                soc_min: 0.0,
                soc_max: 1.0,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "no_battery", "heat_pump", "legacy_battery"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "no_battery" => Ok(Self::no_battery()),
            "heat_pump" => Ok(Self::heat_pump()),
            "legacy_battery" => Ok(Self::legacy_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if !(s.interval_hours > 0.0 && s.interval_hours.is_finite()) {
            errors.push(ConfigError::new("simulation.interval_hours", "must be > 0"));
        } else if ((24.0 / s.interval_hours) - (24.0 / s.interval_hours).round()).abs() > 1e-9 {
            errors.push(ConfigError::new(
                "simulation.interval_hours",
                "must divide 24 h evenly",
            ));
        }
        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if !(s.inverter_efficiency > 0.0 && s.inverter_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "simulation.inverter_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }

        let l = &self.load;
        if l.base_kw.is_nan() || l.base_kw < 0.0 {
            errors.push(ConfigError::new("load.base_kw", "must be >= 0"));
        }
        if l.noise_std.is_nan() || l.noise_std < 0.0 {
            errors.push(ConfigError::new("load.noise_std", "must be >= 0"));
        }

        let sol = &self.solar;
        if !(sol.kw_peak > 0.0 && sol.kw_peak.is_finite()) {
            errors.push(ConfigError::new("solar.kw_peak", "must be > 0"));
        }
        if sol.seasonal_swing_hours.is_nan() || sol.seasonal_swing_hours < 0.0 {
            errors.push(ConfigError::new("solar.seasonal_swing_hours", "must be >= 0"));
        }
        if sol.sunrise_hour.is_nan() || sol.sunset_hour.is_nan() || sol.sunrise_hour >= sol.sunset_hour {
            errors.push(ConfigError::new("solar.sunrise_hour", "must be < solar.sunset_hour"));
        }
        if sol.sunrise_hour - sol.seasonal_swing_hours < 0.0 {
            errors.push(ConfigError::new(
                "solar.sunrise_hour",
                "must be >= solar.seasonal_swing_hours",
            ));
        }
        if sol.sunset_hour + sol.seasonal_swing_hours > 24.0 {
            errors.push(ConfigError::new(
                "solar.sunset_hour",
                "must be <= 24 - solar.seasonal_swing_hours",
            ));
        }
        if sol.noise_std.is_nan() || sol.noise_std < 0.0 {
            errors.push(ConfigError::new("solar.noise_std", "must be >= 0"));
        }
        if let Some(f) = sol.p90_factor {
            if !(f > 0.0 && f <= 1.0) {
                errors.push(ConfigError::new("solar.p90_factor", "must be in (0.0, 1.0]"));
            }
        }

        if self.weather.noise_std.is_nan() || self.weather.noise_std < 0.0 {
            errors.push(ConfigError::new("weather.noise_std", "must be >= 0"));
        }

        if let Err(e) = self.battery.build() {
            errors.push(e);
        }
        if let Err(mut e) = self.heat_pump.build() {
            errors.append(&mut e);
        }

        let ind = &self.indicators;
        if ind.off_peak_start_hour > 23 {
            errors.push(ConfigError::new("indicators.off_peak_start_hour", "must be in 0..=23"));
        }
        if ind.off_peak_end_hour > 24 {
            errors.push(ConfigError::new("indicators.off_peak_end_hour", "must be in 0..=24"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Storage;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert!(e.to_string().starts_with("config error in preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
interval_hours = 0.25
start = "2022-06-01T00:00:00"
days = 7
seed = 99
inverter_efficiency = 0.97

[load]
base_kw = 0.5
amp_kw = 0.2
phase_rad = 0.0
winter_boost_kw = 0.0
noise_std = 0.0

[solar]
kw_peak = 3.0
sunrise_hour = 6.5
sunset_hour = 19.5
seasonal_swing_hours = 1.5
noise_std = 0.05
p90_factor = 0.8

[weather]
mean_c = 12.0

[battery]
model = "percent"
capacity_kwh = 5.0
soc_min = 0.2
soc_max = 1.0

[heat_pump]
enabled = true
profile = "M"
default_mode = "AUT"
add_to_consumption = true

[heat_pump.setpoints]
sp1 = 50.0
sp3 = 45.0
use_resistance_below_min = true

[indicators]
off_peak_start_hour = 23
off_peak_end_hour = 7
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.simulation.interval_hours, 0.25);
        assert_eq!(cfg.simulation.days, 7);
        assert_eq!(cfg.solar.p90_factor, Some(0.8));
        assert_eq!(cfg.battery.model, BatteryModel::Percent);
        assert_eq!(cfg.heat_pump.profile, ProfileSize::M);
        assert_eq!(cfg.heat_pump.default_mode, OperatingMode::Comfort);
        assert_eq!(cfg.heat_pump.setpoints.sp1, 50.0);
        assert_eq!(cfg.heat_pump.setpoints.sp2, 60.0);
        assert_eq!(cfg.indicators.off_peak().start_hour, 23);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_kwh = 2.0
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        // seed overridden
        assert_eq!(cfg.simulation.seed, 99);
        // everything else kept default
        assert_eq!(cfg.simulation.interval_hours, 1.0);
        assert_eq!(cfg.solar.kw_peak, 1.5);
        assert!(cfg.battery.enabled);
        assert!(!cfg.heat_pump.enabled);
    }

    #[test]
    fn validation_catches_soc_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.soc_min = 0.9;
        cfg.battery.soc_max = 0.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.soc_min"));
    }

    #[test]
    fn disabled_battery_is_not_validated() {
        let mut cfg = ScenarioConfig::no_battery();
        cfg.battery.capacity_kwh = -1.0;
        assert!(cfg.validate().is_empty());
        assert!(cfg.battery.build().unwrap().is_none());
    }

    #[test]
    fn validation_catches_bad_interval() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.interval_hours = 0.7;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.interval_hours"));

        cfg.simulation.interval_hours = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.message == "must be > 0"));
    }

    #[test]
    fn validation_catches_inverter_efficiency() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.inverter_efficiency = 1.2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.inverter_efficiency"));
    }

    #[test]
    fn validation_collects_heat_pump_errors() {
        let mut cfg = ScenarioConfig::heat_pump();
        cfg.heat_pump.cop = 0.0;
        cfg.heat_pump.setpoints.r0 = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "heat_pump.cop"));
        assert!(errors.iter().any(|e| e.field == "heat_pump.setpoints.r0"));
    }

    #[test]
    fn validation_catches_nan_fields() {
        let mut cfg = ScenarioConfig::heat_pump();
        cfg.simulation.interval_hours = f64::NAN;
        cfg.solar.kw_peak = f64::NAN;
        cfg.load.base_kw = f64::NAN;
        cfg.heat_pump.tank_volume_m3 = f64::NAN;
        cfg.battery.initial_soc_kwh = Some(f64::NAN);
        let errors = cfg.validate();
        for field in [
            "simulation.interval_hours",
            "solar.kw_peak",
            "load.base_kw",
            "heat_pump.tank_volume_m3",
        ] {
            assert!(errors.iter().any(|e| e.field == field), "{field} missing from {errors:?}");
        }
        assert_eq!(
            cfg.battery.build().unwrap_err().field,
            "battery.initial_soc_kwh"
        );
    }

    #[test]
    fn validation_catches_solar_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.solar.sunset_hour = 23.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solar.sunset_hour"));
    }

    #[test]
    fn legacy_preset_builds_percent_battery() {
        let storage = ScenarioConfig::legacy_battery().battery.build().unwrap().unwrap();
        assert_eq!(storage.storage_type(), "PercentBattery");
        assert_eq!(storage.soc_bounds(), (0.0, 100.0));
    }

    #[test]
    fn max_power_is_applied() {
        let storage = ScenarioConfig::heat_pump().battery.build().unwrap().unwrap();
        match storage {
            StorageModel::SelfConsumption(b) => assert_eq!(b.battery().max_power_kw, 2.5),
            StorageModel::Percent(_) => panic!("expected the continuous model"),
        }
    }
}
