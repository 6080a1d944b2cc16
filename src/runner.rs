//! Scenario runner: wires configuration, input series, loops and indicators.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{BatteryConfig, ConfigError, HeatPumpConfig, ScenarioConfig};
use crate::devices::{ExtractionProfile, Storage};
use crate::error::{InputError, SimError};
use crate::sim::dispatch::{DispatchEngine, dispatch_without_storage};
use crate::sim::kpi::{HeatPumpReport, ReportParams, SelfConsumptionReport, StorageSummary};
use crate::sim::series::EnergySeries;
use crate::sim::thermal::ThermalEngine;
use crate::sim::types::{DispatchRow, HeatPumpRow, SimConfig};

/// Tolerance when matching the configured interval against the input series.
const INTERVAL_TOLERANCE_HOURS: f64 = 1e-9;

/// Heat-pump results of one run.
#[derive(Debug, Clone)]
pub struct HeatPumpRun {
    pub rows: Vec<HeatPumpRow>,
    pub report: HeatPumpReport,
}

/// Everything one scenario run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub config: SimConfig,
    pub dispatch: Vec<DispatchRow>,
    pub report: SelfConsumptionReport,
    /// Indicators of the run on P90 production, when the input carries it.
    pub p90_report: Option<SelfConsumptionReport>,
    pub heat_pump: Option<HeatPumpRun>,
}

/// Loads the tapping profile configured for the heat pump.
///
/// # Errors
///
/// Returns an `InputError` if the profile file cannot be read or parsed.
pub fn load_profile(cfg: &HeatPumpConfig) -> Result<ExtractionProfile, InputError> {
    match &cfg.profile_file {
        Some(path) => ExtractionProfile::from_csv_file(path, cfg.profile),
        None => Ok(ExtractionProfile::standard(cfg.profile)),
    }
}

/// Dispatches a fresh storage device (or none) over `series`.
fn dispatch_series(
    series: &EnergySeries,
    config: &SimConfig,
    battery: &BatteryConfig,
) -> Result<(Vec<DispatchRow>, Option<StorageSummary>), ConfigError> {
    match battery.build()? {
        Some(storage) => {
            let mut engine = DispatchEngine::new(config.clone(), storage);
            let rows = engine.run(series);
            let summary = StorageSummary::from_storage(engine.storage());
            debug!(
                storage = engine.storage().storage_type(),
                cycles = summary.charge_cycles,
                "storage summary"
            );
            Ok((rows, Some(summary)))
        }
        None => Ok((dispatch_without_storage(series, config), None)),
    }
}

/// Runs one scenario over an input series.
///
/// When the heat pump is enabled it runs first; with
/// `heat_pump.add_to_consumption` its electricity is added to the household
/// consumption before battery dispatch. When every input row carries a P90
/// production value, dispatch is repeated on P90 production with a freshly
/// seeded battery.
///
/// # Errors
///
/// Returns `SimError::Config` for an invalid scenario or an interval that
/// does not match the series, and `SimError::Input` for heat-pump input
/// problems (missing `t_ext`, unreadable profile).
pub fn run_scenario(cfg: &ScenarioConfig, series: &EnergySeries) -> Result<RunOutput, SimError> {
    let errors = cfg.validate();
    if !errors.is_empty() {
        return Err(SimError::Config(errors));
    }
    let s = &cfg.simulation;
    if (series.interval_hours() - s.interval_hours).abs() > INTERVAL_TOLERANCE_HOURS {
        return Err(ConfigError::new(
            "simulation.interval_hours",
            format!(
                "{} h does not match the {} h input series",
                s.interval_hours,
                series.interval_hours()
            ),
        )
        .into());
    }
    let config = SimConfig::new(s.interval_hours, s.inverter_efficiency)?;
    let mut series = series.clone();

    let heat_pump = match cfg.heat_pump.build().map_err(SimError::Config)? {
        Some(hp) => {
            let hp_cfg = &cfg.heat_pump;
            let profile = load_profile(hp_cfg)?;
            let mut engine = ThermalEngine::new(&hp, &profile, hp_cfg.indoor_temperature_c)
                .with_default_mode(hp_cfg.default_mode);
            if let Some(t) = hp_cfg.initial_tank_temperature_c {
                engine = engine.with_initial_tank_c(t);
            }
            let rows = engine.run(&series)?;
            if hp_cfg.add_to_consumption {
                let extra: Vec<f64> = rows.iter().map(HeatPumpRow::total_electricity_kwh).collect();
                series.add_consumption(&extra)?;
            }
            let report =
                HeatPumpReport::from_rows(&rows, s.interval_hours, hp_cfg.consumption_temperature_c);
            info!(scop = report.scop, days = report.days, "heat pump simulated");
            Some(HeatPumpRun { rows, report })
        }
        None => None,
    };

    let params = |storage| ReportParams {
        installed_capacity_kwp: cfg.solar.kw_peak,
        inverter_efficiency: s.inverter_efficiency,
        interval_hours: s.interval_hours,
        off_peak: cfg.indicators.off_peak(),
        storage,
    };

    let (dispatch, storage) = dispatch_series(&series, &config, &cfg.battery)?;
    let report = SelfConsumptionReport::from_rows(&dispatch, &params(storage));
    info!(
        steps = dispatch.len(),
        self_consumption_pct = report.self_consumption_pct,
        self_sufficiency_pct = report.self_sufficiency_pct,
        "dispatch complete"
    );

    let p90_report = match series.p90_variant() {
        Some(p90) => {
            let (rows, storage) = dispatch_series(&p90, &config, &cfg.battery)?;
            let report = SelfConsumptionReport::from_rows(&rows, &params(storage));
            info!(self_consumption_pct = report.self_consumption_pct, "P90 dispatch complete");
            Some(report)
        }
        None => None,
    };

    Ok(RunOutput {
        config,
        dispatch,
        report,
        p90_report,
        heat_pump,
    })
}

/// Runs independent scenarios over the same series in parallel.
///
/// Each run owns its storage and tank state; results keep the order of
/// `scenarios`.
pub fn run_batch(
    scenarios: &[ScenarioConfig],
    series: &EnergySeries,
) -> Vec<Result<RunOutput, SimError>> {
    info!(scenarios = scenarios.len(), "running batch");
    scenarios
        .par_iter()
        .map(|cfg| run_scenario(cfg, series))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_series;

    fn week(cfg: &ScenarioConfig) -> EnergySeries {
        let mut c = cfg.clone();
        c.simulation.days = 7;
        synthetic_series(&c).unwrap()
    }

    #[test]
    fn baseline_run_produces_reports() {
        let cfg = ScenarioConfig::baseline();
        let out = run_scenario(&cfg, &week(&cfg)).unwrap();
        assert_eq!(out.dispatch.len(), 7 * 24);
        assert!(out.report.battery.is_some());
        assert!(out.p90_report.is_none());
        assert!(out.heat_pump.is_none());
        assert!(out.report.residual_kwh.abs() < 1e-6);
    }

    #[test]
    fn no_battery_has_no_battery_flows() {
        let cfg = ScenarioConfig::no_battery();
        let out = run_scenario(&cfg, &week(&cfg)).unwrap();
        assert!(out.report.battery.is_none());
        assert!(out
            .dispatch
            .iter()
            .all(|r| r.battery_charge_kwh == 0.0 && r.battery_discharge_kwh == 0.0));
    }

    #[test]
    fn battery_raises_self_consumption() {
        let with = ScenarioConfig::baseline();
        let without = ScenarioConfig::no_battery();
        let series = week(&with);
        let a = run_scenario(&with, &series).unwrap();
        let b = run_scenario(&without, &series).unwrap();
        assert!(a.report.self_consumed_kwh >= b.report.self_consumed_kwh);
    }

    #[test]
    fn heat_pump_adds_to_consumption() {
        let cfg = ScenarioConfig::heat_pump();
        let series = week(&cfg);
        let out = run_scenario(&cfg, &series).unwrap();
        let hp = out.heat_pump.as_ref().unwrap();
        assert_eq!(hp.rows.len(), series.len());
        assert!(hp.report.scop > 0.0);

        let base: f64 = series.rows().iter().map(|r| r.consumption_kwh).sum();
        let extra: f64 = hp.rows.iter().map(HeatPumpRow::total_electricity_kwh).sum();
        assert!((out.report.consumption_kwh - (base + extra)).abs() < 1e-6);
    }

    #[test]
    fn p90_run_when_series_carries_it() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.solar.p90_factor = Some(0.7);
        let out = run_scenario(&cfg, &week(&cfg)).unwrap();
        let p90 = out.p90_report.unwrap();
        assert!((p90.produced_kwh - 0.7 * out.report.produced_kwh).abs() < 1e-6);
    }

    #[test]
    fn interval_mismatch_is_rejected() {
        let cfg = ScenarioConfig::baseline();
        let series = week(&cfg);
        let mut other = cfg.clone();
        other.simulation.interval_hours = 0.5;
        match run_scenario(&other, &series) {
            Err(SimError::Config(errors)) => {
                assert_eq!(errors[0].field, "simulation.interval_hours");
            }
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_scenario_is_rejected() {
        let mut cfg = ScenarioConfig::baseline();
        let series = week(&cfg);
        cfg.battery.capacity_kwh = 0.0;
        assert!(matches!(run_scenario(&cfg, &series), Err(SimError::Config(_))));
    }

    #[test]
    fn batch_matches_sequential_runs() {
        let scenarios: Vec<ScenarioConfig> = ScenarioConfig::PRESETS
            .iter()
            .map(|name| ScenarioConfig::from_preset(name).unwrap())
            .collect();
        let series = week(&scenarios[0]);
        let batch = run_batch(&scenarios, &series);
        assert_eq!(batch.len(), scenarios.len());
        for (cfg, result) in scenarios.iter().zip(&batch) {
            let single = run_scenario(cfg, &series).unwrap();
            assert_eq!(result.as_ref().unwrap().report, single.report);
        }
    }
}
