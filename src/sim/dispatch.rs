//! Battery dispatch loop maximizing self-consumption.

use tracing::debug;

use crate::devices::Storage;

use super::power_balance::{dc_demand_kw, grid_exchange_kwh, split_grid_exchange};
use super::series::{EnergyRow, EnergySeries};
use super::types::{DispatchRow, SimConfig};

/// Dispatch engine owning the storage device for one run.
///
/// Generic over `S: Storage` for static dispatch. Every step depends on the
/// state left by the previous one, so a run is strictly sequential.
pub struct DispatchEngine<S: Storage> {
    config: SimConfig,
    storage: S,
}

impl<S: Storage> DispatchEngine<S> {
    /// Creates a new dispatch engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulation configuration
    /// * `storage` - Storage device, already seeded with its initial state
    pub fn new(config: SimConfig, storage: S) -> Self {
        Self { config, storage }
    }

    /// Simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Storage device in its current state.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the engine and returns the storage device.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Dispatches the battery for one interval.
    pub fn step(&mut self, row: &EnergyRow) -> DispatchRow {
        debug_assert!(row.consumption_kwh >= 0.0 && row.production_kwh >= 0.0);
        let dt = self.config.interval_hours;
        let eff = self.config.inverter_efficiency;

        let demand_kw = dc_demand_kw(row.consumption_kwh, row.production_kwh, eff, dt);
        let flow = self.storage.dispatch_step(demand_kw, dt);

        let grid = grid_exchange_kwh(
            row.consumption_kwh,
            row.production_kwh,
            flow.discharge_kwh,
            flow.charge_kwh,
            eff,
        );
        let split = split_grid_exchange(row.consumption_kwh, grid);

        DispatchRow {
            timestamp: row.timestamp,
            consumption_kwh: row.consumption_kwh,
            production_kwh: row.production_kwh,
            self_consumption_kwh: split.self_consumption_kwh,
            grid_import_kwh: split.import_kwh,
            grid_export_kwh: split.export_kwh,
            battery_charge_kwh: flow.charge_kwh,
            battery_discharge_kwh: flow.discharge_kwh,
            soc: flow.soc,
        }
    }

    /// Runs the whole series and returns one row per interval.
    pub fn run(&mut self, series: &EnergySeries) -> Vec<DispatchRow> {
        debug_assert!(
            series.rows().windows(2).all(|w| w[0].timestamp < w[1].timestamp),
            "timestamps must increase"
        );
        let rows: Vec<DispatchRow> = series.rows().iter().map(|row| self.step(row)).collect();
        debug!(
            steps = rows.len(),
            storage = self.storage.storage_type(),
            final_soc = self.storage.state_of_charge(),
            "battery dispatch finished"
        );
        rows
    }
}

/// Energy balance without storage: PV through the inverter, rest to or from the grid.
pub fn dispatch_without_storage(series: &EnergySeries, config: &SimConfig) -> Vec<DispatchRow> {
    let eff = config.inverter_efficiency;
    series
        .rows()
        .iter()
        .map(|row| {
            let grid = grid_exchange_kwh(row.consumption_kwh, row.production_kwh, 0.0, 0.0, eff);
            let split = split_grid_exchange(row.consumption_kwh, grid);
            DispatchRow {
                timestamp: row.timestamp,
                consumption_kwh: row.consumption_kwh,
                production_kwh: row.production_kwh,
                self_consumption_kwh: split.self_consumption_kwh,
                grid_import_kwh: split.import_kwh,
                grid_export_kwh: split.export_kwh,
                battery_charge_kwh: 0.0,
                battery_discharge_kwh: 0.0,
                soc: 0.0,
            }
        })
        .collect()
}
