//! Device models: storage, heat-pump water heater and synthetic profile generators.

/// Synthetic household load generator.
pub mod baseload;
/// Continuous self-consumption battery model.
pub mod battery;
/// Hot-water tapping profiles.
pub mod extraction;
pub mod heat_pump;
/// Legacy percent battery with cycle counting.
pub mod percent_battery;
/// Synthetic PV yield generator.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use baseload::BaseLoad;
pub use battery::{Battery, BatteryState, BatteryStep, SelfConsumptionBattery};
pub use extraction::{ExtractionProfile, ProfileSize};
pub use heat_pump::{HeatPump, HeatPumpInput, HeatPumpStep, OperatingMode, Setpoints, Thresholds};
pub use percent_battery::PercentBattery;
pub use solar::SolarPv;
pub use types::{Device, DeviceContext, Storage, StorageModel, StorageStep};
