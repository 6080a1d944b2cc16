//! Common types and traits for device simulation components.

use chrono::NaiveDateTime;
use rand::{Rng, rngs::StdRng};

use super::battery::SelfConsumptionBattery;
use super::percent_battery::PercentBattery;

/// Contextual information passed to profile generators for one interval.
///
/// # Fields
/// * `timestamp` - Start of the interval
/// * `interval_hours` - Interval duration in hours
pub struct DeviceContext {
    pub timestamp: NaiveDateTime,
    pub interval_hours: f64,
}

impl DeviceContext {
    /// Creates a new DeviceContext for the interval starting at `timestamp`.
    pub fn new(timestamp: NaiveDateTime, interval_hours: f64) -> Self {
        Self {
            timestamp,
            interval_hours,
        }
    }
}

/// Trait defining a device that produces or consumes energy each interval.
///
/// Implemented by the synthetic household load and PV generators so that
/// demo series can be built without an input file.
pub trait Device {
    /// Returns the energy (kWh, >= 0) produced or consumed over the interval.
    fn energy_kwh(&mut self, context: &DeviceContext) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Energy exchanged with a storage device over one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageStep {
    /// Energy charged (kWh, >= 0).
    pub charge_kwh: f64,
    /// Energy delivered (kWh, >= 0).
    pub discharge_kwh: f64,
    /// State of charge at the end of the interval, in the device's own unit.
    pub soc: f64,
}

/// Capability shared by the storage strategies the dispatch loop can drive.
///
/// Positive `net_dc_demand_kw` asks for energy, negative offers surplus.
/// Implementations never fail: requests outside the device's limits are
/// clamped.
pub trait Storage {
    /// Advances the device by one interval and returns the energy exchanged.
    fn dispatch_step(&mut self, net_dc_demand_kw: f64, interval_hours: f64) -> StorageStep;

    /// Current state of charge (kWh for the continuous model, % for the legacy one).
    fn state_of_charge(&self) -> f64;

    /// Lowest and highest reachable state of charge, in the same unit.
    fn soc_bounds(&self) -> (f64, f64);

    /// Nameplate capacity (kWh).
    fn capacity_kwh(&self) -> f64;

    /// Charge cycles accumulated so far.
    fn charge_cycles(&self) -> f64;

    /// Returns a human-readable type name for the storage strategy.
    fn storage_type(&self) -> &'static str;
}

/// Storage strategy selected by `battery.model` in the scenario file.
#[derive(Debug, Clone)]
pub enum StorageModel {
    /// Continuous kWh model with discharge losses and a power limit.
    SelfConsumption(SelfConsumptionBattery),
    /// Lossless percent model with full-cycle counting.
    Percent(PercentBattery),
}

impl Storage for StorageModel {
    fn dispatch_step(&mut self, net_dc_demand_kw: f64, interval_hours: f64) -> StorageStep {
        match self {
            Self::SelfConsumption(b) => b.dispatch_step(net_dc_demand_kw, interval_hours),
            Self::Percent(b) => b.dispatch_step(net_dc_demand_kw, interval_hours),
        }
    }

    fn state_of_charge(&self) -> f64 {
        match self {
            Self::SelfConsumption(b) => b.state_of_charge(),
            Self::Percent(b) => b.state_of_charge(),
        }
    }

    fn soc_bounds(&self) -> (f64, f64) {
        match self {
            Self::SelfConsumption(b) => b.soc_bounds(),
            Self::Percent(b) => b.soc_bounds(),
        }
    }

    fn capacity_kwh(&self) -> f64 {
        match self {
            Self::SelfConsumption(b) => b.capacity_kwh(),
            Self::Percent(b) => b.capacity_kwh(),
        }
    }

    fn charge_cycles(&self) -> f64 {
        match self {
            Self::SelfConsumption(b) => b.charge_cycles(),
            Self::Percent(b) => b.charge_cycles(),
        }
    }

    fn storage_type(&self) -> &'static str {
        match self {
            Self::SelfConsumption(b) => b.storage_type(),
            Self::Percent(b) => b.storage_type(),
        }
    }
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
