use crate::config::ConfigError;
use crate::devices::types::{Storage, StorageStep};

/// Immutable parameters of a stationary battery used for self-consumption.
///
/// The state of charge is tracked in kWh inside the usable window
/// `[0, depth_of_discharge_kwh]`, where the depth of discharge is the share of
/// nameplate capacity between `soc_min` and `soc_max`. Losses are applied on
/// discharge only.
///
/// # Power Flow Convention (Inverter DC bus)
/// - Positive demand: the household needs energy, the battery discharges
/// - Negative demand: PV surplus is available, the battery charges
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    /// Nameplate capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// Lower state-of-charge limit as a fraction of capacity.
    pub soc_min: f64,

    /// Upper state-of-charge limit as a fraction of capacity.
    pub soc_max: f64,

    /// Discharge efficiency (0..1.0].
    pub efficiency: f64,

    /// Charge and discharge power limit in kilowatts.
    pub max_power_kw: f64,
}

impl Battery {
    /// Creates a battery with unbounded charge/discharge power.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwh` - Nameplate capacity in kWh (must be > 0)
    /// * `soc_min` - Lower SOC limit as a fraction (0.0 to 1.0)
    /// * `soc_max` - Upper SOC limit as a fraction, greater than `soc_min`
    /// * `efficiency` - Discharge efficiency (0..1.0]
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending field.
    pub fn new(
        capacity_kwh: f64,
        soc_min: f64,
        soc_max: f64,
        efficiency: f64,
    ) -> Result<Self, ConfigError> {
        if !(capacity_kwh > 0.0 && capacity_kwh.is_finite()) {
            return Err(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&soc_min) || !(0.0..=1.0).contains(&soc_max) {
            return Err(ConfigError::new(
                "battery.soc_min",
                "soc_min and soc_max must be in [0.0, 1.0]",
            ));
        }
        if soc_min >= soc_max {
            return Err(ConfigError::new("battery.soc_min", "must be < battery.soc_max"));
        }
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(ConfigError::new("battery.efficiency", "must be in (0.0, 1.0]"));
        }

        Ok(Self {
            capacity_kwh,
            soc_min,
            soc_max,
            efficiency,
            max_power_kw: f64::INFINITY,
        })
    }

    /// Returns a copy limited to `max_power_kw` in both directions.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the limit is not strictly positive.
    pub fn with_max_power_kw(self, max_power_kw: f64) -> Result<Self, ConfigError> {
        if max_power_kw <= 0.0 || max_power_kw.is_nan() {
            return Err(ConfigError::new("battery.max_power_kw", "must be > 0"));
        }
        Ok(Self {
            max_power_kw,
            ..self
        })
    }

    /// Usable energy window in kWh.
    pub fn depth_of_discharge_kwh(&self) -> f64 {
        (self.soc_max - self.soc_min) * self.capacity_kwh
    }

    /// Computes one dispatch step of the "maximize self-consumption" rule.
    ///
    /// Pure: the caller owns the state and feeds `previous_soc_kwh` back in.
    /// Requests beyond the available energy, headroom or power limit are
    /// clamped rather than rejected.
    ///
    /// # Arguments
    ///
    /// * `previous_soc_kwh` - Usable energy stored at the start of the interval
    /// * `net_dc_demand_kw` - DC-side demand; positive needs energy, negative is surplus
    /// * `interval_hours` - Interval duration in hours (> 0)
    pub fn dispatch(
        &self,
        previous_soc_kwh: f64,
        net_dc_demand_kw: f64,
        interval_hours: f64,
    ) -> BatteryStep {
        let max_discharge_kw = self
            .max_power_kw
            .min(previous_soc_kwh * self.efficiency / interval_hours);
        let max_charge_kw = self
            .max_power_kw
            .min((self.depth_of_discharge_kwh() - previous_soc_kwh) / interval_hours);

        let discharge_kw = max_discharge_kw.min(net_dc_demand_kw.max(0.0));
        let charge_kw = max_charge_kw.min((-net_dc_demand_kw).max(0.0));

        let soc_kwh = previous_soc_kwh + charge_kw * interval_hours
            - (discharge_kw / self.efficiency) * interval_hours;

        BatteryStep {
            soc_kwh,
            charge_kw,
            discharge_kw,
        }
    }
}

/// Result of one [`Battery::dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStep {
    /// Usable energy stored at the end of the interval (kWh).
    pub soc_kwh: f64,
    /// Average charging power over the interval (kW, >= 0).
    pub charge_kw: f64,
    /// Average discharging power delivered over the interval (kW, >= 0).
    pub discharge_kw: f64,
}

/// Mutable state carried between dispatch steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryState {
    /// Usable energy stored (kWh), within `[0, depth_of_discharge_kwh]`.
    pub soc_kwh: f64,
}

impl BatteryState {
    /// Seeds the state from a caller value or half of the usable window.
    pub fn seeded(battery: &Battery, initial_soc_kwh: Option<f64>) -> Self {
        let dod = battery.depth_of_discharge_kwh();
        let soc_kwh = initial_soc_kwh.map_or(dod / 2.0, |soc| soc.clamp(0.0, dod));
        Self { soc_kwh }
    }
}

/// Continuous battery bound to its running state, usable by the dispatch loop.
#[derive(Debug, Clone)]
pub struct SelfConsumptionBattery {
    battery: Battery,
    state: BatteryState,
    charged_kwh: f64,
}

impl SelfConsumptionBattery {
    /// Creates a running battery seeded from `initial_soc_kwh` or half the usable window.
    pub fn new(battery: Battery, initial_soc_kwh: Option<f64>) -> Self {
        let state = BatteryState::seeded(&battery, initial_soc_kwh);
        Self {
            battery,
            state,
            charged_kwh: 0.0,
        }
    }

    /// Battery parameters.
    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// Current running state.
    pub fn state(&self) -> BatteryState {
        self.state
    }
}

impl Storage for SelfConsumptionBattery {
    fn dispatch_step(&mut self, net_dc_demand_kw: f64, interval_hours: f64) -> StorageStep {
        let step = self
            .battery
            .dispatch(self.state.soc_kwh, net_dc_demand_kw, interval_hours);
        self.state.soc_kwh = step.soc_kwh;

        let charge_kwh = step.charge_kw * interval_hours;
        self.charged_kwh += charge_kwh;

        StorageStep {
            charge_kwh,
            discharge_kwh: step.discharge_kw * interval_hours,
            soc: step.soc_kwh,
        }
    }

    fn state_of_charge(&self) -> f64 {
        self.state.soc_kwh
    }

    fn soc_bounds(&self) -> (f64, f64) {
        (0.0, self.battery.depth_of_discharge_kwh())
    }

    fn capacity_kwh(&self) -> f64 {
        self.battery.capacity_kwh
    }

    /// Equivalent full cycles: energy charged over nameplate capacity.
    fn charge_cycles(&self) -> f64 {
        self.charged_kwh / self.battery.capacity_kwh
    }

    fn storage_type(&self) -> &'static str {
        "SelfConsumptionBattery"
    }
}
