//! Post-hoc indicators computed from simulation results.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::devices::Storage;

use super::types::{DispatchRow, HeatPumpRow};

/// Tolerance when testing whether the state of charge sits on a bound.
const SOC_BOUND_TOLERANCE: f64 = 1e-6;
/// Tolerance when comparing tank temperature with the consumption temperature.
const TEMPERATURE_TOLERANCE: f64 = 1e-5;

/// Off-peak tariff window `[start_hour, end_hour)`, wrapping past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OffPeakWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for OffPeakWindow {
    fn default() -> Self {
        Self {
            start_hour: 22,
            end_hour: 8,
        }
    }
}

impl OffPeakWindow {
    /// Whether an interval starting at `timestamp` is billed off-peak.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let h = timestamp.hour();
        if self.start_hour <= self.end_hour {
            h >= self.start_hour && h < self.end_hour
        } else {
            h >= self.start_hour || h < self.end_hour
        }
    }
}

/// Storage figures the report needs besides the per-row flows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageSummary {
    /// Nameplate capacity (kWh).
    pub capacity_kwh: f64,
    /// Charge cycles over the run.
    pub charge_cycles: f64,
    /// Lowest reachable state of charge, in the unit of [`DispatchRow::soc`].
    pub soc_min: f64,
    /// Highest reachable state of charge, in the same unit.
    pub soc_max: f64,
}

impl StorageSummary {
    /// Reads the summary from a storage device at the end of a run.
    pub fn from_storage(storage: &impl Storage) -> Self {
        let (soc_min, soc_max) = storage.soc_bounds();
        Self {
            capacity_kwh: storage.capacity_kwh(),
            charge_cycles: storage.charge_cycles(),
            soc_min,
            soc_max,
        }
    }
}

/// Installation parameters used by [`SelfConsumptionReport::from_rows`].
#[derive(Debug, Clone, Copy)]
pub struct ReportParams {
    /// Installed PV capacity (kWp).
    pub installed_capacity_kwp: f64,
    pub inverter_efficiency: f64,
    pub interval_hours: f64,
    pub off_peak: OffPeakWindow,
    /// Present when the run dispatched a battery.
    pub storage: Option<StorageSummary>,
}

/// Battery indicators; energies in kWh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryReport {
    pub capacity_kwh: f64,
    /// Energy delivered by the battery.
    pub delivered_kwh: f64,
    /// Energy charged minus energy delivered.
    pub losses_kwh: f64,
    pub charge_cycles: f64,
    pub hours_at_min_soc: f64,
    pub hours_at_max_soc: f64,
    pub share_at_min_soc_pct: f64,
    pub share_at_max_soc_pct: f64,
}

/// Self-consumption indicators of one dispatch run; energies in kWh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfConsumptionReport {
    pub installed_capacity_kwp: f64,
    pub produced_kwh: f64,
    pub self_consumed_kwh: f64,
    pub consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_import_off_peak_kwh: f64,
    pub grid_import_peak_kwh: f64,
    pub grid_export_kwh: f64,
    pub inverter_losses_kwh: f64,
    /// Produced energy per installed kWp (h).
    pub equivalent_hours: f64,
    /// Share of production consumed on site (%).
    pub self_consumption_pct: f64,
    /// Share of consumption covered on site (%).
    pub self_sufficiency_pct: f64,
    /// Share of production exported or lost (%).
    pub surplus_pct: f64,
    /// Energy unaccounted for by the balance; zero up to rounding.
    pub residual_kwh: f64,
    pub battery: Option<BatteryReport>,
}

fn pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        100.0 * numerator / denominator
    } else {
        0.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

impl SelfConsumptionReport {
    /// Computes all indicators from the dispatch rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - Complete dispatch results
    /// * `params` - Installation parameters and optional storage summary
    pub fn from_rows(rows: &[DispatchRow], params: &ReportParams) -> Self {
        let mut produced = 0.0;
        let mut self_consumed = 0.0;
        let mut consumption = 0.0;
        let mut import = 0.0;
        let mut import_off_peak = 0.0;
        let mut export = 0.0;
        let mut charged = 0.0;
        let mut delivered = 0.0;
        let mut at_min = 0_usize;
        let mut at_max = 0_usize;

        for r in rows {
            produced += r.production_kwh;
            self_consumed += r.self_consumption_kwh;
            consumption += r.consumption_kwh;
            import += r.grid_import_kwh;
            if params.off_peak.contains(r.timestamp) {
                import_off_peak += r.grid_import_kwh;
            }
            export += r.grid_export_kwh;
            charged += r.battery_charge_kwh;
            delivered += r.battery_discharge_kwh;

            if let Some(s) = &params.storage {
                if r.soc <= s.soc_min + SOC_BOUND_TOLERANCE {
                    at_min += 1;
                }
                if r.soc >= s.soc_max - SOC_BOUND_TOLERANCE {
                    at_max += 1;
                }
            }
        }

        let inverter_losses = (produced + delivered - charged) * (1.0 - params.inverter_efficiency);
        let battery_losses = charged - delivered;
        let residual =
            (produced + import) - (export + inverter_losses + battery_losses + consumption);
        let self_consumption_pct = pct(self_consumed, produced);

        let battery = params.storage.map(|s| BatteryReport {
            capacity_kwh: s.capacity_kwh,
            delivered_kwh: delivered,
            losses_kwh: battery_losses,
            charge_cycles: s.charge_cycles,
            hours_at_min_soc: at_min as f64 * params.interval_hours,
            hours_at_max_soc: at_max as f64 * params.interval_hours,
            share_at_min_soc_pct: pct(at_min as f64, rows.len() as f64),
            share_at_max_soc_pct: pct(at_max as f64, rows.len() as f64),
        });

        Self {
            installed_capacity_kwp: params.installed_capacity_kwp,
            produced_kwh: produced,
            self_consumed_kwh: self_consumed,
            consumption_kwh: consumption,
            grid_import_kwh: import,
            grid_import_off_peak_kwh: import_off_peak,
            grid_import_peak_kwh: import - import_off_peak,
            grid_export_kwh: export,
            inverter_losses_kwh: inverter_losses,
            equivalent_hours: ratio(produced, params.installed_capacity_kwp),
            self_consumption_pct,
            self_sufficiency_pct: pct(self_consumed, consumption),
            surplus_pct: if produced > 0.0 { 100.0 - self_consumption_pct } else { 0.0 },
            residual_kwh: residual,
            battery,
        }
    }
}

impl fmt::Display for SelfConsumptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Self-consumption Report ---")?;
        writeln!(f, "Installed capacity:     {:.2} kWp", self.installed_capacity_kwp)?;
        writeln!(f, "Produced:               {:.2} kWh", self.produced_kwh)?;
        writeln!(f, "Self-consumed:          {:.2} kWh", self.self_consumed_kwh)?;
        writeln!(f, "Consumption:            {:.2} kWh", self.consumption_kwh)?;
        writeln!(
            f,
            "Grid import:            {:.2} kWh (off-peak {:.2}, peak {:.2})",
            self.grid_import_kwh, self.grid_import_off_peak_kwh, self.grid_import_peak_kwh
        )?;
        writeln!(f, "Grid export:            {:.2} kWh", self.grid_export_kwh)?;
        writeln!(f, "Inverter losses:        {:.2} kWh", self.inverter_losses_kwh)?;
        writeln!(f, "Equivalent hours:       {:.0} h", self.equivalent_hours)?;
        writeln!(f, "Self-consumption:       {:.1}%", self.self_consumption_pct)?;
        writeln!(f, "Self-sufficiency:       {:.1}%", self.self_sufficiency_pct)?;
        write!(f, "Surplus:                {:.1}%", self.surplus_pct)?;
        if let Some(b) = &self.battery {
            writeln!(f)?;
            writeln!(f, "Battery capacity:       {:.2} kWh", b.capacity_kwh)?;
            writeln!(f, "Battery delivered:      {:.2} kWh", b.delivered_kwh)?;
            writeln!(f, "Battery losses:         {:.2} kWh", b.losses_kwh)?;
            writeln!(f, "Battery cycles:         {:.1}", b.charge_cycles)?;
            writeln!(
                f,
                "Hours at min SOC:       {:.0} h ({:.1}%)",
                b.hours_at_min_soc, b.share_at_min_soc_pct
            )?;
            write!(
                f,
                "Hours at max SOC:       {:.0} h ({:.1}%)",
                b.hours_at_max_soc, b.share_at_max_soc_pct
            )?;
        }
        Ok(())
    }
}

/// Heat-pump indicators; energies in kWh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPumpReport {
    /// Calendar days covered by the run.
    pub days: i64,
    /// Seasonal COP: hot water delivered over electricity used.
    pub scop: f64,
    pub extracted_kwh: f64,
    pub thermal_kwh: f64,
    pub electric_kwh: f64,
    pub resistance_kwh: f64,
    pub tank_losses_kwh: f64,
    pub thermal_per_day_kwh: f64,
    pub electric_per_day_kwh: f64,
    pub resistance_per_day_kwh: f64,
    pub tank_losses_per_day_kwh: f64,
    /// Share of heat delivered by the resistance.
    pub backup_fraction: f64,
    /// Intervals starting with the tank below the consumption temperature.
    pub intervals_below_consumption_temp: usize,
    pub hours_below_consumption_temp: f64,
}

impl HeatPumpReport {
    /// Computes all indicators from the heat-pump rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - Complete heat-pump results
    /// * `interval_hours` - Interval duration in hours
    /// * `consumption_temperature_c` - Minimum useful hot-water temperature (°C)
    pub fn from_rows(rows: &[HeatPumpRow], interval_hours: f64, consumption_temperature_c: f64) -> Self {
        let days = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp.date() - first.timestamp.date()).num_days() + 1
            }
            _ => 0,
        };

        let extracted: f64 = rows.iter().map(|r| r.extraction_kwh).sum();
        let thermal: f64 = rows.iter().map(|r| r.heat_pump_kwh).sum();
        let electric: f64 = rows.iter().map(|r| r.electricity_kwh).sum();
        let resistance: f64 = rows.iter().map(|r| r.resistance_kwh).sum();
        let losses: f64 = rows.iter().map(|r| r.tank_loss_kwh).sum();
        let below = rows
            .iter()
            .filter(|r| r.tank_c < consumption_temperature_c - TEMPERATURE_TOLERANCE)
            .count();
        let d = days as f64;

        Self {
            days,
            scop: ratio(extracted, resistance + electric),
            extracted_kwh: extracted,
            thermal_kwh: thermal,
            electric_kwh: electric,
            resistance_kwh: resistance,
            tank_losses_kwh: losses,
            thermal_per_day_kwh: ratio(thermal, d),
            electric_per_day_kwh: ratio(electric, d),
            resistance_per_day_kwh: ratio(resistance, d),
            tank_losses_per_day_kwh: ratio(losses, d),
            backup_fraction: ratio(resistance, thermal + resistance),
            intervals_below_consumption_temp: below,
            hours_below_consumption_temp: below as f64 * interval_hours,
        }
    }
}

impl fmt::Display for HeatPumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Heat Pump Report ---")?;
        writeln!(f, "Days:                   {}", self.days)?;
        writeln!(f, "SCOP:                   {:.2}", self.scop)?;
        writeln!(f, "Hot water drawn:        {:.2} kWh", self.extracted_kwh)?;
        writeln!(
            f,
            "Heat pump heat:         {:.2} kWh ({:.2} kWh/day)",
            self.thermal_kwh, self.thermal_per_day_kwh
        )?;
        writeln!(
            f,
            "Heat pump electricity:  {:.2} kWh ({:.2} kWh/day)",
            self.electric_kwh, self.electric_per_day_kwh
        )?;
        writeln!(
            f,
            "Resistance:             {:.2} kWh ({:.2} kWh/day)",
            self.resistance_kwh, self.resistance_per_day_kwh
        )?;
        writeln!(
            f,
            "Tank losses:            {:.2} kWh ({:.3} kWh/day)",
            self.tank_losses_kwh, self.tank_losses_per_day_kwh
        )?;
        writeln!(f, "Backup fraction:        {:.1}%", self.backup_fraction * 100.0)?;
        write!(f, "Hours below use temp.:  {:.0} h", self.hours_below_consumption_temp)
    }
}

/// Dispatch result column selectable for hourly profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DispatchColumn {
    Consumption,
    Production,
    SelfConsumption,
    GridImport,
    GridExport,
}

impl DispatchColumn {
    /// Value of this column in `row`.
    pub fn value(self, row: &DispatchRow) -> f64 {
        match self {
            Self::Consumption => row.consumption_kwh,
            Self::Production => row.production_kwh,
            Self::SelfConsumption => row.self_consumption_kwh,
            Self::GridImport => row.grid_import_kwh,
            Self::GridExport => row.grid_export_kwh,
        }
    }
}

fn hourly_means<const N: usize>(
    samples: impl IntoIterator<Item = (NaiveDateTime, f64)>,
    bucket: impl Fn(NaiveDateTime) -> usize,
) -> [[f64; 24]; N] {
    let mut sums = [[0.0; 24]; N];
    let mut counts = [[0_u32; 24]; N];
    for (timestamp, value) in samples {
        let (b, h) = (bucket(timestamp), timestamp.hour() as usize);
        sums[b][h] += value;
        counts[b][h] += 1;
    }
    for (sum_row, count_row) in sums.iter_mut().zip(counts.iter()) {
        for (sum, &count) in sum_row.iter_mut().zip(count_row.iter()) {
            *sum = if count > 0 { *sum / f64::from(count) } else { 0.0 };
        }
    }
    sums
}

/// Mean value per month (rows, January first) and hour of day (columns).
///
/// Cells without samples are 0.
pub fn monthly_hourly_means(
    samples: impl IntoIterator<Item = (NaiveDateTime, f64)>,
) -> [[f64; 24]; 12] {
    hourly_means(samples, |t| t.month0() as usize)
}

/// Mean value per weekday (rows, Monday first) and hour of day (columns).
///
/// Cells without samples are 0.
pub fn weekday_hourly_means(
    samples: impl IntoIterator<Item = (NaiveDateTime, f64)>,
) -> [[f64; 24]; 7] {
    hourly_means(samples, |t| t.weekday().num_days_from_monday() as usize)
}
