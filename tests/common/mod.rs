//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};

use selfconsumption_sim::devices::{Battery, OperatingMode, SelfConsumptionBattery};
use selfconsumption_sim::sim::dispatch::DispatchEngine;
use selfconsumption_sim::sim::series::{EnergyRow, EnergySeries};
use selfconsumption_sim::sim::types::{DispatchRow, SimConfig};

/// First interval of every fixture series (a Monday).
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid fixture date")
}

/// Series of `(consumo, autoproducao)` pairs at the given interval.
pub fn series_at(values: &[(f64, f64)], interval_hours: f64) -> EnergySeries {
    let step = Duration::minutes((interval_hours * 60.0).round() as i64);
    let rows = values
        .iter()
        .enumerate()
        .map(|(i, &(c, p))| EnergyRow::new(start() + step * i as i32, c, p))
        .collect();
    EnergySeries::new(rows, interval_hours).expect("valid fixture series")
}

/// Hourly series of `(consumo, autoproducao)` pairs.
pub fn hourly_series(values: &[(f64, f64)]) -> EnergySeries {
    series_at(values, 1.0)
}

/// Hourly heat-pump input: constant outdoor temperature, economy mode.
pub fn weather_series(hours: usize, outdoor_c: f64) -> EnergySeries {
    let rows = (0..hours)
        .map(|i| EnergyRow {
            outdoor_temperature_c: Some(outdoor_c),
            mode: Some(OperatingMode::Economy),
            ..EnergyRow::new(start() + Duration::hours(i as i64), 0.5, 0.0)
        })
        .collect();
    EnergySeries::new(rows, 1.0).expect("valid fixture series")
}

/// Battery used by the reference cases: 1.25 kWh, 10-90 % window (1.0 kWh usable).
pub fn reference_battery(efficiency: f64) -> Battery {
    Battery::new(1.25, 0.1, 0.9, efficiency).expect("valid fixture battery")
}

/// Dispatch engine over [`reference_battery`] seeded at `soc_kwh`.
pub fn reference_engine(
    efficiency: f64,
    soc_kwh: f64,
    inverter_efficiency: f64,
) -> DispatchEngine<SelfConsumptionBattery> {
    DispatchEngine::new(
        SimConfig::new(1.0, inverter_efficiency).unwrap(),
        SelfConsumptionBattery::new(reference_battery(efficiency), Some(soc_kwh)),
    )
}

/// Asserts `autoconsumo + consumo_rede == consumo` and the inverter-side balance for every row.
pub fn assert_conserves_energy(rows: &[DispatchRow], inverter_efficiency: f64) {
    for r in rows {
        let load_side = r.self_consumption_kwh + r.grid_import_kwh;
        assert!(
            (load_side - r.consumption_kwh).abs() < 1e-9,
            "load balance broken at {}: {load_side} vs {}",
            r.timestamp,
            r.consumption_kwh
        );
        let supplied = r.self_consumption_kwh + r.grid_export_kwh;
        let available =
            (r.production_kwh + r.battery_discharge_kwh - r.battery_charge_kwh) * inverter_efficiency;
        assert!(
            (supplied - available).abs() < 1e-9,
            "inverter balance broken at {}: {supplied} vs {available}",
            r.timestamp
        );
    }
}
