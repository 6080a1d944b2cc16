//! Solar self-consumption simulator: battery dispatch, heat-pump water heater and indicators.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod runner;
/// Dispatch and heat-pump loops, input series and indicators.
pub mod sim;
pub mod synthetic;
