//! Deterministic demo series built from the household load, PV and weather models.
//!
//! Used when no input CSV is given. Every generator draws from its own RNG
//! derived from the scenario seed, so the same seed always yields the same
//! series.

use chrono::{Datelike, Duration, Timelike};
use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::config::{ScenarioConfig, WeatherConfig};
use crate::devices::types::gaussian_noise;
use crate::devices::{BaseLoad, Device, DeviceContext, OperatingMode, SolarPv};
use crate::error::{InputError, SimError};
use crate::sim::series::{EnergyRow, EnergySeries};

/// Seed offset for the PV RNG to avoid correlation with the load.
const PV_SEED_OFFSET: u64 = 17;
/// Seed offset for the weather RNG.
const WEATHER_SEED_OFFSET: u64 = 31;

/// Seasonal and daily outdoor temperature model.
#[derive(Debug, Clone)]
pub struct Weather {
    config: WeatherConfig,
    rng: StdRng,
}

impl Weather {
    pub fn new(config: WeatherConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Expected temperature at the interval midpoint: coldest in mid-January, warmest at 15:00.
    pub fn expected_c(&self, context: &DeviceContext) -> f64 {
        let t = context.timestamp;
        let day = f64::from(t.ordinal0());
        let hour = f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + context.interval_hours / 2.0;
        let tau = std::f64::consts::TAU;
        self.config.mean_c - self.config.annual_amp_c * (tau * (day - 14.0) / 365.25).cos()
            + self.config.daily_amp_c * (tau * (hour - 15.0) / 24.0).cos()
    }

    /// Temperature for the interval, noise included (°C).
    pub fn temperature_c(&mut self, context: &DeviceContext) -> f64 {
        self.expected_c(context) + gaussian_noise(&mut self.rng, self.config.noise_std)
    }
}

/// Builds the demo series described by the scenario.
///
/// Intervals where PV covers consumption through the inverter request the
/// PV-surplus mode, all others the economy mode.
///
/// # Errors
///
/// Returns a `SimError` for a daylight window the PV model rejects or a
/// generated series that fails validation. Neither happens for a
/// configuration that passed [`ScenarioConfig::validate`].
pub fn synthetic_series(cfg: &ScenarioConfig) -> Result<EnergySeries, SimError> {
    let s = &cfg.simulation;
    let seed = s.seed;
    let dt = s.interval_hours;
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(InputError::InvalidInterval(dt).into());
    }
    let steps_per_day = (24.0 / dt).round() as usize;
    let step = Duration::seconds((dt * 3600.0).round() as i64);

    let l = &cfg.load;
    let mut load = BaseLoad::new(
        l.base_kw,
        l.amp_kw,
        l.phase_rad,
        l.winter_boost_kw,
        l.noise_std,
        seed,
    );
    let sol = &cfg.solar;
    let mut pv = SolarPv::new(
        sol.kw_peak,
        sol.sunrise_hour,
        sol.sunset_hour,
        sol.seasonal_swing_hours,
        sol.noise_std,
        seed.wrapping_add(PV_SEED_OFFSET),
    )?;
    let mut weather = Weather::new(cfg.weather.clone(), seed.wrapping_add(WEATHER_SEED_OFFSET));

    let n = s.days * steps_per_day;
    let mut rows = Vec::with_capacity(n);
    let mut timestamp = s.start;
    for _ in 0..n {
        let ctx = DeviceContext::new(timestamp, dt);
        let consumption_kwh = load.energy_kwh(&ctx);
        let production_kwh = pv.energy_kwh(&ctx);
        let mode = if production_kwh * s.inverter_efficiency > consumption_kwh {
            OperatingMode::PvSurplus
        } else {
            OperatingMode::Economy
        };
        rows.push(EnergyRow {
            production_p90_kwh: sol.p90_factor.map(|f| production_kwh * f),
            outdoor_temperature_c: Some(weather.temperature_c(&ctx)),
            mode: Some(mode),
            ..EnergyRow::new(timestamp, consumption_kwh, production_kwh)
        });
        timestamp += step;
    }

    debug!(
        rows = rows.len(),
        load = load.device_type(),
        pv = pv.device_type(),
        "synthetic series generated"
    );
    Ok(EnergySeries::new(rows, dt)?)
}
