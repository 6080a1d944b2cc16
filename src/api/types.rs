//! API response and query types.
//!
//! Record field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::devices::OperatingMode;
use crate::io::TIMESTAMP_FORMAT;
use crate::sim::kpi::{HeatPumpReport, SelfConsumptionReport};
use crate::sim::types::{DispatchRow, HeatPumpRow, SimConfig};

/// Simulation configuration and every indicator report of the run.
#[derive(Debug, Serialize)]
pub struct IndicatorsResponse {
    pub config: SimConfig,
    pub self_consumption: SelfConsumptionReport,
    /// Present when the input carried P90 production.
    pub self_consumption_p90: Option<SelfConsumptionReport>,
    /// Present when a heat pump was simulated.
    pub heat_pump: Option<HeatPumpReport>,
}

/// Single dispatch record using the CSV export column names.
#[derive(Debug, Serialize)]
pub struct DispatchRecord {
    /// Row index in the run.
    pub index: usize,
    pub timestamp: String,
    pub consumo: f64,
    pub autoproducao: f64,
    pub autoconsumo: f64,
    pub consumo_rede: f64,
    pub injeccao_rede: f64,
    pub carga_bateria: f64,
    pub descarga_bateria: f64,
    pub soc: f64,
}

impl DispatchRecord {
    pub fn new(index: usize, r: &DispatchRow) -> Self {
        Self {
            index,
            timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            consumo: r.consumption_kwh,
            autoproducao: r.production_kwh,
            autoconsumo: r.self_consumption_kwh,
            consumo_rede: r.grid_import_kwh,
            injeccao_rede: r.grid_export_kwh,
            carga_bateria: r.battery_charge_kwh,
            descarga_bateria: r.battery_discharge_kwh,
            soc: r.soc,
        }
    }
}

/// Single heat-pump record using the CSV export column names.
#[derive(Debug, Serialize)]
pub struct HeatPumpRecord {
    /// Row index in the run.
    pub index: usize,
    pub timestamp: String,
    pub t_sala: f64,
    pub t_deposito: f64,
    pub energia_perd_dep: f64,
    pub energia_extr_aqs: f64,
    pub energia_bc: f64,
    pub energia_resist: f64,
    pub energia_usada_bc: f64,
    pub modo_op: OperatingMode,
}

impl HeatPumpRecord {
    pub fn new(index: usize, r: &HeatPumpRow) -> Self {
        Self {
            index,
            timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            t_sala: r.room_c,
            t_deposito: r.tank_c,
            energia_perd_dep: r.tank_loss_kwh,
            energia_extr_aqs: r.extraction_kwh,
            energia_bc: r.heat_pump_kwh,
            energia_resist: r.resistance_kwh,
            energia_usada_bc: r.electricity_kwh,
            modo_op: r.mode,
        }
    }
}

/// Optional row index range (inclusive) for the record endpoints.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
