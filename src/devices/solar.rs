use chrono::{Datelike, Timelike};
use rand::{SeedableRng, rngs::StdRng};

use crate::config::ConfigError;
use crate::devices::types::{Device, DeviceContext, gaussian_noise};

/// A solar PV generator that models yield from daylight hours.
///
/// `SolarPv` creates a half-sine shaped generation profile between sunrise
/// and sunset. Day length follows the season: `seasonal_swing_hours` is added
/// to both ends of the day at the summer solstice and removed at the winter
/// one. The peak output is scaled by the same seasonal term, between 60 % in
/// winter and 100 % in summer.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Installed capacity in kilowatts peak.
    pub kw_peak: f64,

    /// Sunrise hour at the equinox.
    pub sunrise_hour: f64,

    /// Sunset hour at the equinox.
    pub sunset_hour: f64,

    /// Day-length change at each end of the day between equinox and solstice.
    pub seasonal_swing_hours: f64,

    /// Standard deviation of the Gaussian noise as a fraction of output.
    pub noise_std: f64,

    rng: StdRng,
}

impl SolarPv {
    /// Creates a new solar PV generator with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `kw_peak` - Installed capacity in kWp
    /// * `sunrise_hour` - Sunrise at the equinox
    /// * `sunset_hour` - Sunset at the equinox
    /// * `seasonal_swing_hours` - Half the difference between longest and shortest day
    /// * `noise_std` - Standard deviation of noise (e.g., 0.05 for +/-5% variation)
    /// * `seed` - Random seed for reproducible noise generation
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if sunset is not after sunrise or the daylight
    /// window leaves the day at either solstice.
    pub fn new(
        kw_peak: f64,
        sunrise_hour: f64,
        sunset_hour: f64,
        seasonal_swing_hours: f64,
        noise_std: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if sunrise_hour.is_nan() || sunset_hour.is_nan() || sunrise_hour >= sunset_hour {
            return Err(ConfigError::new(
                "solar.sunrise_hour",
                format!("must be < solar.sunset_hour, got {sunrise_hour} and {sunset_hour}"),
            ));
        }
        let swing = seasonal_swing_hours.max(0.0);
        if !(sunrise_hour - swing >= 0.0 && sunset_hour + swing <= 24.0) {
            return Err(ConfigError::new(
                "solar.seasonal_swing_hours",
                format!("daylight window {sunrise_hour}..{sunset_hour} +/- {swing} h leaves the day"),
            ));
        }
        Ok(Self {
            kw_peak: kw_peak.max(0.0),
            sunrise_hour,
            sunset_hour,
            seasonal_swing_hours: seasonal_swing_hours.max(0.0),
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Fraction of peak output at the midpoint of the interval, in [0, 1].
    pub fn daylight_frac(&self, context: &DeviceContext) -> f64 {
        let t = context.timestamp;
        // +1 at the summer solstice, -1 at the winter one
        let season = -(std::f64::consts::TAU * (f64::from(t.ordinal0()) + 10.0) / 365.25).cos();
        let sunrise = self.sunrise_hour - self.seasonal_swing_hours * season;
        let sunset = self.sunset_hour + self.seasonal_swing_hours * season;

        let hour = f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + context.interval_hours / 2.0;
        if hour <= sunrise || hour >= sunset {
            return 0.0;
        }
        let shape = (std::f64::consts::PI * (hour - sunrise) / (sunset - sunrise)).sin();
        shape * (0.8 + 0.2 * season)
    }
}

impl Device for SolarPv {
    /// Energy produced over the interval; zero at night.
    fn energy_kwh(&mut self, context: &DeviceContext) -> f64 {
        let frac = self.daylight_frac(context);
        if frac <= 0.0 {
            return 0.0;
        }
        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.kw_peak * frac * noise_mult).max(0.0) * context.interval_hours
    }

    fn device_type(&self) -> &'static str {
        "SolarPV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn ctx(t: NaiveDateTime) -> DeviceContext {
        DeviceContext::new(t, 1.0)
    }

    #[test]
    fn test_negative_inputs_clamped_to_zero() {
        let pv = SolarPv::new(-1.0, 7.0, 19.0, 2.0, -0.05, 42).unwrap();
        assert_eq!(pv.kw_peak, 0.0);
        assert_eq!(pv.noise_std, 0.0);
    }

    #[test]
    fn test_sunset_before_sunrise_rejected() {
        let err = SolarPv::new(5.0, 18.0, 6.0, 0.0, 0.05, 42).unwrap_err();
        assert_eq!(err.field, "solar.sunrise_hour");
    }

    #[test]
    fn test_nan_daylight_window_rejected() {
        assert!(SolarPv::new(5.0, f64::NAN, 19.0, 0.0, 0.05, 42).is_err());
        assert!(SolarPv::new(5.0, 7.0, f64::NAN, 0.0, 0.05, 42).is_err());
    }

    #[test]
    fn test_swing_beyond_midnight_rejected() {
        let err = SolarPv::new(5.0, 2.0, 19.0, 3.0, 0.05, 42).unwrap_err();
        assert_eq!(err.field, "solar.seasonal_swing_hours");
    }

    #[test]
    fn test_no_generation_at_night() {
        let mut pv = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.0, 42).unwrap();
        for h in [0, 3, 4, 21, 23] {
            assert_eq!(pv.energy_kwh(&ctx(at(6, 21, h))), 0.0);
            assert_eq!(pv.energy_kwh(&ctx(at(12, 21, h))), 0.0);
        }
    }

    #[test]
    fn test_summer_days_are_longer() {
        let pv = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.0, 42).unwrap();
        // 06:00-07:00 is daylight in June only
        assert!(pv.daylight_frac(&ctx(at(6, 21, 6))) > 0.0);
        assert_eq!(pv.daylight_frac(&ctx(at(12, 21, 6))), 0.0);
        assert!(pv.daylight_frac(&ctx(at(6, 21, 12))) > pv.daylight_frac(&ctx(at(12, 21, 12))));
    }

    #[test]
    fn test_peak_near_noon() {
        let mut pv = SolarPv::new(5.0, 7.0, 19.0, 0.0, 0.0, 42).unwrap();
        // equinox-like day, symmetric around 13:00
        let ctx_noon = DeviceContext::new(at(6, 21, 12), 1.0);
        let noon = pv.energy_kwh(&ctx_noon);
        assert!(noon > 4.9 && noon <= 5.0, "noon yield {noon}");
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let mut pv1 = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.1, 42).unwrap();
        let mut pv2 = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.1, 42).unwrap();
        let start = at(4, 1, 0);
        for h in 0..48 {
            let c = ctx(start + Duration::hours(h));
            assert_eq!(pv1.energy_kwh(&c), pv2.energy_kwh(&c));
        }
    }

    #[test]
    fn test_different_seeds_produce_different_results() {
        let mut pv1 = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.1, 42).unwrap();
        let mut pv2 = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.1, 43).unwrap();
        let start = at(4, 1, 8);
        let differs = (0..10).any(|h| {
            let c = ctx(start + Duration::hours(h));
            (pv1.energy_kwh(&c) - pv2.energy_kwh(&c)).abs() > 1e-9
        });
        assert!(differs);
    }

    #[test]
    fn test_generation_never_negative() {
        let mut pv = SolarPv::new(5.0, 7.0, 19.0, 2.0, 0.5, 42).unwrap();
        let start = at(1, 1, 0);
        for h in 0..24 * 30 {
            assert!(pv.energy_kwh(&ctx(start + Duration::hours(h))) >= 0.0);
        }
    }
}
