//! Battery dispatch reference cases and loop-level properties.

mod common;

use approx::assert_abs_diff_eq;
use rstest::rstest;

use common::{
    assert_conserves_energy, hourly_series, reference_battery, reference_engine, series_at,
};
use selfconsumption_sim::devices::{PercentBattery, SelfConsumptionBattery, Storage};
use selfconsumption_sim::sim::dispatch::{DispatchEngine, dispatch_without_storage};
use selfconsumption_sim::sim::kpi::{ReportParams, SelfConsumptionReport, StorageSummary};
use selfconsumption_sim::sim::types::{DispatchRow, SimConfig};

/// Reference cases on the 1.25 kWh battery (1.0 kWh usable).
///
/// `descarga_bateria` is the energy delivered to the inverter; with 90 %
/// efficiency the cells give up 0.556 kWh to deliver 0.5 kWh.
#[rstest]
#[case::surplus_fills_battery(1.0, 0.5, 1.0, 2.0, [1.0, 0.5, 0.0, 0.0, 0.5, 1.0])]
#[case::deficit_empties_battery(1.0, 0.5, 2.0, 1.0, [1.5, 0.0, 0.5, 0.5, 0.0, 0.0])]
#[case::lossy_discharge(0.9, 1.0, 1.0, 0.5, [1.0, 0.0, 0.5, 0.0, 0.0, 1.0 - 0.5 / 0.9])]
fn reference_cases(
    #[case] efficiency: f64,
    #[case] soc_kwh: f64,
    #[case] consumo: f64,
    #[case] autoproducao: f64,
    #[case] expected: [f64; 6],
) {
    let mut engine = reference_engine(efficiency, soc_kwh, 1.0);
    let rows = engine.run(&hourly_series(&[(consumo, autoproducao)]));
    let r = &rows[0];
    let [self_kwh, charge, discharge, import, export, soc] = expected;

    assert_abs_diff_eq!(r.self_consumption_kwh, self_kwh, epsilon = 1e-9);
    assert_abs_diff_eq!(r.battery_charge_kwh, charge, epsilon = 1e-9);
    assert_abs_diff_eq!(r.battery_discharge_kwh, discharge, epsilon = 1e-9);
    assert_abs_diff_eq!(r.grid_import_kwh, import, epsilon = 1e-9);
    assert_abs_diff_eq!(r.grid_export_kwh, export, epsilon = 1e-9);
    assert_abs_diff_eq!(r.soc, soc, epsilon = 1e-9);
}

#[test]
fn lossy_discharge_withdraws_more_than_delivered() {
    let mut engine = reference_engine(0.9, 1.0, 1.0);
    let rows = engine.run(&hourly_series(&[(1.0, 0.5)]));
    let withdrawn = 1.0 - rows[0].soc;
    assert_abs_diff_eq!(withdrawn, 0.556, epsilon = 1e-3);
    assert_abs_diff_eq!(rows[0].soc, 0.444, epsilon = 1e-3);
}

#[test]
fn inverter_losses_on_charging_day() {
    // 2.0 kWh DC, 0.9 kWh AC load at 90 %: 1.0 kWh DC covers the load, 1.0 kWh charges
    let mut engine = reference_engine(1.0, 0.0, 0.9);
    let rows = engine.run(&hourly_series(&[(0.9, 2.0)]));
    assert_abs_diff_eq!(rows[0].battery_charge_kwh, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[0].self_consumption_kwh, 0.9, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[0].grid_export_kwh, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[0].soc, 1.0, epsilon = 1e-9);
    assert_conserves_energy(&rows, 0.9);
}

#[test]
fn power_limit_caps_both_directions() {
    let battery = reference_battery(1.0).with_max_power_kw(0.3).unwrap();
    let mut engine = DispatchEngine::new(
        SimConfig::new(1.0, 1.0).unwrap(),
        SelfConsumptionBattery::new(battery, Some(0.5)),
    );
    let rows = engine.run(&hourly_series(&[(0.0, 1.0), (1.0, 0.0)]));

    assert_abs_diff_eq!(rows[0].battery_charge_kwh, 0.3, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[0].grid_export_kwh, 0.7, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[0].soc, 0.8, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[1].battery_discharge_kwh, 0.3, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[1].grid_import_kwh, 0.7, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[1].soc, 0.5, epsilon = 1e-9);
}

#[test]
fn quarter_hour_intervals_scale_power_to_energy() {
    let battery = reference_battery(1.0).with_max_power_kw(0.5).unwrap();
    let mut engine = DispatchEngine::new(
        SimConfig::new(0.25, 1.0).unwrap(),
        SelfConsumptionBattery::new(battery, Some(0.0)),
    );
    let rows = engine.run(&series_at(&[(0.1, 0.35); 4], 0.25));

    for r in &rows {
        // 1 kW of surplus against a 0.5 kW limit
        assert_abs_diff_eq!(r.battery_charge_kwh, 0.125, epsilon = 1e-9);
        assert_abs_diff_eq!(r.grid_export_kwh, 0.125, epsilon = 1e-9);
    }
    assert_abs_diff_eq!(engine.storage().state_of_charge(), 0.5, epsilon = 1e-9);
    assert_conserves_energy(&rows, 1.0);
}

#[test]
fn empty_battery_imports_whole_deficit() {
    let mut engine = reference_engine(0.95, 0.0, 0.96);
    let rows = engine.run(&hourly_series(&[(0.4, 0.0), (1.3, 0.0), (0.05, 0.0), (2.2, 0.0)]));
    for r in &rows {
        assert_eq!(r.battery_discharge_kwh, 0.0);
        assert_eq!(r.grid_import_kwh, r.consumption_kwh);
    }
}

#[test]
fn full_battery_exports_whole_surplus() {
    let mut engine = reference_engine(0.95, 5.0, 0.96);
    let rows = engine.run(&hourly_series(&[(0.0, 0.4), (0.0, 1.3), (0.0, 2.2)]));
    for r in &rows {
        assert_eq!(r.battery_charge_kwh, 0.0);
        assert_eq!(r.grid_export_kwh, r.production_kwh * 0.96);
    }
}

fn day_profile(days: usize) -> Vec<(f64, f64)> {
    (0..days * 24)
        .map(|i| {
            let h = (i % 24) as f64;
            let load = 0.3 + 0.25 * (std::f64::consts::TAU * (h - 19.0) / 24.0).cos().max(0.0);
            let pv = (1.6 * (std::f64::consts::PI * (h - 7.0) / 12.0).sin()).max(0.0);
            (load, if (7.0..=19.0).contains(&h) { pv } else { 0.0 })
        })
        .collect()
}

#[test]
fn conservation_and_soc_bounds_over_a_week() {
    let battery = reference_battery(0.92).with_max_power_kw(0.8).unwrap();
    let dod = battery.depth_of_discharge_kwh();
    let mut engine = DispatchEngine::new(
        SimConfig::new(1.0, 0.96).unwrap(),
        SelfConsumptionBattery::new(battery, None),
    );
    let rows = engine.run(&hourly_series(&day_profile(7)));

    assert_eq!(rows.len(), 168);
    assert_conserves_energy(&rows, 0.96);
    for r in &rows {
        assert!(r.soc >= -1e-12 && r.soc <= dod + 1e-12, "soc {} out of window", r.soc);
        assert!(r.battery_charge_kwh == 0.0 || r.battery_discharge_kwh == 0.0);
    }
}

#[test]
fn rerun_on_own_output_is_identical() {
    let series = hourly_series(&day_profile(3));
    let first = reference_engine(0.95, 0.2, 0.96).run(&series);

    let replay: Vec<(f64, f64)> = first
        .iter()
        .map(|r| (r.consumption_kwh, r.production_kwh))
        .collect();
    let second = reference_engine(0.95, 0.2, 0.96).run(&hourly_series(&replay));

    assert_eq!(first, second);
}

#[test]
fn report_residual_closes_with_storage() {
    let series = hourly_series(&day_profile(7));
    let mut engine = reference_engine(0.9, 0.5, 0.96);
    let rows = engine.run(&series);
    let params = ReportParams {
        installed_capacity_kwp: 1.6,
        inverter_efficiency: 0.96,
        interval_hours: 1.0,
        off_peak: Default::default(),
        storage: Some(StorageSummary::from_storage(engine.storage())),
    };
    let report = SelfConsumptionReport::from_rows(&rows, &params);

    assert_abs_diff_eq!(report.residual_kwh, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        report.grid_import_off_peak_kwh + report.grid_import_peak_kwh,
        report.grid_import_kwh,
        epsilon = 1e-9
    );
    let battery = report.battery.expect("battery section");
    assert!(battery.losses_kwh > 0.0);
    assert!(battery.charge_cycles > 0.0);
}

#[test]
fn storage_never_lowers_self_consumption() {
    let series = hourly_series(&day_profile(7));
    let config = SimConfig::new(1.0, 0.96).unwrap();
    let bare = dispatch_without_storage(&series, &config);
    let stored = reference_engine(0.95, 0.0, 0.96).run(&series);

    let total = |rows: &[DispatchRow]| -> f64 {
        rows.iter().map(|r| r.self_consumption_kwh).sum()
    };
    assert!(total(&stored) > total(&bare));
    for (b, s) in bare.iter().zip(&stored) {
        assert!(s.grid_import_kwh <= b.grid_import_kwh + 1e-12);
    }
}

#[test]
fn percent_battery_counts_full_cycles() {
    let mut engine = DispatchEngine::new(
        SimConfig::new(1.0, 1.0).unwrap(),
        PercentBattery::new(1.0, 0.0, 100.0).unwrap(),
    );
    // three days of charging 1 kWh and discharging it overnight
    let mut values = Vec::new();
    for _ in 0..3 {
        values.extend([(0.0, 0.5), (0.0, 0.5), (0.5, 0.0), (0.5, 0.0)]);
    }
    let rows = engine.run(&hourly_series(&values));

    assert_eq!(engine.storage().cycles(), 3);
    assert_abs_diff_eq!(rows[1].soc, 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[3].soc, 0.0, epsilon = 1e-9);
    assert!(rows.iter().all(|r| r.grid_import_kwh.abs() < 1e-12));
}
