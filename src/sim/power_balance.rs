//! Household energy balance across PV, battery, inverter and grid.

/// DC-side power the battery is asked to cover.
///
/// Positive when consumption exceeds what PV can supply through the inverter,
/// negative when PV has surplus to store.
///
/// # Arguments
///
/// * `consumption_kwh` - AC consumption over the interval
/// * `production_kwh` - DC PV production over the interval
/// * `inverter_efficiency` - Inverter efficiency (0..1.0]
/// * `interval_hours` - Interval duration in hours
pub fn dc_demand_kw(
    consumption_kwh: f64,
    production_kwh: f64,
    inverter_efficiency: f64,
    interval_hours: f64,
) -> f64 {
    (consumption_kwh / inverter_efficiency - production_kwh) / interval_hours
}

/// Net grid exchange over the interval (positive = import, negative = export).
///
/// PV and battery meet on the DC bus; only their combined output passes
/// through the inverter.
pub fn grid_exchange_kwh(
    consumption_kwh: f64,
    production_kwh: f64,
    battery_discharge_kwh: f64,
    battery_charge_kwh: f64,
    inverter_efficiency: f64,
) -> f64 {
    consumption_kwh
        - (production_kwh + battery_discharge_kwh - battery_charge_kwh) * inverter_efficiency
}

/// Grid exchange split into its metered parts; energies in kWh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSplit {
    /// Consumption covered on site.
    pub self_consumption_kwh: f64,
    /// Energy bought.
    pub import_kwh: f64,
    /// Energy injected.
    pub export_kwh: f64,
}

/// Splits a net grid exchange into import, export and self-consumption.
pub fn split_grid_exchange(consumption_kwh: f64, grid_kwh: f64) -> GridSplit {
    let import_kwh = grid_kwh.max(0.0);
    GridSplit {
        self_consumption_kwh: consumption_kwh - import_kwh,
        import_kwh,
        export_kwh: (-grid_kwh).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn surplus_is_negative_demand() {
        assert_eq!(dc_demand_kw(1.0, 2.0, 1.0, 1.0), -1.0);
        assert_eq!(dc_demand_kw(2.0, 1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn demand_accounts_for_inverter_and_interval() {
        assert_abs_diff_eq!(dc_demand_kw(0.9, 0.0, 0.9, 0.5), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn export_after_inverter_losses() {
        let grid = grid_exchange_kwh(1.0, 1.5, 0.0, 0.0, 0.9);
        let split = split_grid_exchange(1.0, grid);
        assert_abs_diff_eq!(split.export_kwh, 0.35, epsilon = 1e-12);
        assert_eq!(split.import_kwh, 0.0);
        assert_eq!(split.self_consumption_kwh, 1.0);
    }

    #[test]
    fn import_when_short() {
        let grid = grid_exchange_kwh(1.0, 0.5, 0.0, 0.0, 0.9);
        let split = split_grid_exchange(1.0, grid);
        assert_abs_diff_eq!(split.import_kwh, 0.55, epsilon = 1e-12);
        assert_abs_diff_eq!(split.self_consumption_kwh, 0.45, epsilon = 1e-12);
        assert_eq!(split.export_kwh, 0.0);
    }

    #[test]
    fn battery_flow_passes_inverter() {
        // 1 kWh PV, 0.111 kWh from the battery covers 1 kWh at 90 %
        let grid = grid_exchange_kwh(1.0, 1.0, 1.0 / 9.0, 0.0, 0.9);
        assert_abs_diff_eq!(grid, 0.0, epsilon = 1e-12);
    }
}
