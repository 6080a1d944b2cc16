//! Lossless battery tracked in percent of capacity, with full-cycle counting.

use crate::config::ConfigError;
use crate::devices::types::{Storage, StorageStep};

/// Tolerance when comparing accumulated charge against nameplate capacity.
const CYCLE_EPSILON_KWH: f64 = 1e-9;

/// Battery whose state of charge is a percentage between `soc_min_pct` and
/// `soc_max_pct`. Charging and discharging are lossless; each time the
/// energy charged since the last count reaches the nameplate capacity one
/// full cycle is recorded.
#[derive(Debug, Clone)]
pub struct PercentBattery {
    /// Nameplate capacity in kilowatt-hours.
    pub capacity_kwh: f64,
    /// Lower SOC limit in percent.
    pub soc_min_pct: f64,
    /// Upper SOC limit in percent.
    pub soc_max_pct: f64,
    soc_pct: f64,
    charged_since_cycle_kwh: f64,
    cycles: u32,
}

impl PercentBattery {
    /// Creates an empty battery (0 % state of charge).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if capacity is not positive or the limits are
    /// not ordered within 0–100 %.
    pub fn new(capacity_kwh: f64, soc_min_pct: f64, soc_max_pct: f64) -> Result<Self, ConfigError> {
        if !(capacity_kwh > 0.0 && capacity_kwh.is_finite()) {
            return Err(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&soc_min_pct)
            || !(0.0..=100.0).contains(&soc_max_pct)
            || soc_min_pct >= soc_max_pct
        {
            return Err(ConfigError::new(
                "battery.soc_min",
                "limits must satisfy 0 <= soc_min < soc_max <= 100 %",
            ));
        }
        Ok(Self {
            capacity_kwh,
            soc_min_pct,
            soc_max_pct,
            soc_pct: 0.0,
            charged_since_cycle_kwh: 0.0,
            cycles: 0,
        })
    }

    /// Current state of charge in percent.
    pub fn soc_pct(&self) -> f64 {
        self.soc_pct
    }

    /// Full charge cycles counted so far.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Stores up to `energy_kwh` and returns the energy actually stored.
    pub fn charge(&mut self, energy_kwh: f64) -> f64 {
        let headroom_kwh = ((self.soc_max_pct - self.soc_pct) / 100.0 * self.capacity_kwh).max(0.0);
        let stored = energy_kwh.max(0.0).min(headroom_kwh);
        self.soc_pct += stored / self.capacity_kwh * 100.0;

        self.charged_since_cycle_kwh += stored;
        while self.charged_since_cycle_kwh + CYCLE_EPSILON_KWH >= self.capacity_kwh {
            self.cycles += 1;
            self.charged_since_cycle_kwh = (self.charged_since_cycle_kwh - self.capacity_kwh).max(0.0);
        }

        stored
    }

    /// Delivers up to `energy_kwh` and returns the energy actually delivered.
    pub fn discharge(&mut self, energy_kwh: f64) -> f64 {
        let available_kwh = ((self.soc_pct - self.soc_min_pct) / 100.0 * self.capacity_kwh).max(0.0);
        let delivered = energy_kwh.max(0.0).min(available_kwh);
        self.soc_pct -= delivered / self.capacity_kwh * 100.0;
        delivered
    }
}

impl Storage for PercentBattery {
    fn dispatch_step(&mut self, net_dc_demand_kw: f64, interval_hours: f64) -> StorageStep {
        let energy_kwh = net_dc_demand_kw * interval_hours;
        let (charge_kwh, discharge_kwh) = if energy_kwh < 0.0 {
            (self.charge(-energy_kwh), 0.0)
        } else {
            (0.0, self.discharge(energy_kwh))
        };
        StorageStep {
            charge_kwh,
            discharge_kwh,
            soc: self.soc_pct,
        }
    }

    fn state_of_charge(&self) -> f64 {
        self.soc_pct
    }

    fn soc_bounds(&self) -> (f64, f64) {
        (self.soc_min_pct, self.soc_max_pct)
    }

    fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    fn charge_cycles(&self) -> f64 {
        f64::from(self.cycles)
    }

    fn storage_type(&self) -> &'static str {
        "PercentBattery"
    }
}
