use chrono::{Datelike, Timelike};
use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::{Device, DeviceContext, gaussian_noise};

/// A household load generator for synthetic consumption series.
///
/// `BaseLoad` combines a daily sinusoid with a seasonal term that peaks in
/// mid-January and random noise, then integrates the resulting power over
/// each interval.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use selfconsumption_sim::devices::{BaseLoad, Device, DeviceContext};
///
/// let mut load = BaseLoad::new(
///     0.4,  // base_kw - average consumption
///     0.15, // amp_kw - daily variation
///     2.6,  // phase_rad - evening peak
///     0.0,  // winter_boost_kw - no seasonal term
///     0.0,  // noise_std - deterministic
///     42,   // seed
/// );
///
/// let noon = NaiveDate::from_ymd_opt(2021, 1, 1)
///     .and_then(|d| d.and_hms_opt(12, 0, 0))
///     .unwrap();
/// let kwh = load.energy_kwh(&DeviceContext::new(noon, 1.0));
/// assert!(kwh > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLoad {
    /// Mean demand in kilowatts.
    pub base_kw: f64,

    /// Amplitude of the daily variation in kilowatts.
    pub amp_kw: f64,

    /// Phase offset of the daily pattern in radians.
    pub phase_rad: f64,

    /// Extra demand at the coldest point of the year in kilowatts.
    pub winter_boost_kw: f64,

    /// Standard deviation of the Gaussian noise in kilowatts.
    pub noise_std: f64,

    rng: StdRng,
}

impl BaseLoad {
    /// Creates a new household load generator.
    ///
    /// # Arguments
    ///
    /// * `base_kw` - Mean demand in kilowatts
    /// * `amp_kw` - Amplitude of the daily variation in kilowatts
    /// * `phase_rad` - Phase offset in radians
    /// * `winter_boost_kw` - Extra demand in mid-winter in kilowatts
    /// * `noise_std` - Standard deviation of Gaussian noise in kilowatts
    /// * `seed` - Random seed for reproducible noise generation
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        winter_boost_kw: f64,
        noise_std: f64,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            winter_boost_kw,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Mean power demand over the interval, before noise.
    pub fn expected_kw(&self, context: &DeviceContext) -> f64 {
        let t = context.timestamp;
        let hour = f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + context.interval_hours / 2.0;
        let angle = std::f64::consts::TAU * hour / 24.0 + self.phase_rad;

        let day = f64::from(t.ordinal0());
        let season = (std::f64::consts::TAU * (day - 14.0) / 365.25).cos();
        let winter = self.winter_boost_kw * (1.0 + season) / 2.0;

        self.base_kw + self.amp_kw * angle.sin() + winter
    }
}

impl Device for BaseLoad {
    fn energy_kwh(&mut self, context: &DeviceContext) -> f64 {
        let kw = self.expected_kw(context) + gaussian_noise(&mut self.rng, self.noise_std);
        kw.max(0.0) * context.interval_hours
    }

    fn device_type(&self) -> &'static str {
        "BaseLoad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(month: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, month, 15)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_energy_scales_with_interval() {
        let mut load = BaseLoad::new(1.0, 0.0, 0.0, 0.0, 0.0, 1);
        assert_eq!(load.energy_kwh(&DeviceContext::new(at(3, 10), 1.0)), 1.0);
        assert_eq!(load.energy_kwh(&DeviceContext::new(at(3, 10), 0.25)), 0.25);
    }

    #[test]
    fn test_winter_demand_exceeds_summer() {
        let load = BaseLoad::new(0.4, 0.0, 0.0, 0.2, 0.0, 1);
        let winter = load.expected_kw(&DeviceContext::new(at(1, 12), 1.0));
        let summer = load.expected_kw(&DeviceContext::new(at(7, 12), 1.0));
        assert!(winter > summer + 0.15);
    }

    #[test]
    fn test_never_negative() {
        let mut load = BaseLoad::new(0.05, 0.5, 0.0, 0.0, 0.3, 7);
        let start = at(1, 0);
        for h in 0..24 * 14 {
            let ctx = DeviceContext::new(start + Duration::hours(h), 1.0);
            assert!(load.energy_kwh(&ctx) >= 0.0);
        }
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let mut a = BaseLoad::new(0.4, 0.15, 2.6, 0.1, 0.05, 42);
        let mut b = BaseLoad::new(0.4, 0.15, 2.6, 0.1, 0.05, 42);
        let start = at(2, 0);
        for h in 0..48 {
            let ctx = DeviceContext::new(start + Duration::hours(h), 1.0);
            assert_eq!(a.energy_kwh(&ctx), b.energy_kwh(&ctx));
        }
    }

    #[test]
    fn test_evening_peak_with_default_phase() {
        let load = BaseLoad::new(0.4, 0.15, 2.6, 0.0, 0.0, 1);
        let evening = load.expected_kw(&DeviceContext::new(at(3, 20), 1.0));
        let morning = load.expected_kw(&DeviceContext::new(at(3, 8), 1.0));
        assert!(evening > morning);
    }
}
