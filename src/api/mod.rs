//! REST API for run indicators and per-interval results.
//!
//! Provides three GET endpoints:
//! - `/indicators`: simulation config and every indicator report
//! - `/dispatch`: battery dispatch rows with optional index range filtering
//! - `/heat-pump`: heat-pump rows with optional index range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::runner::{HeatPumpRun, RunOutput};
use crate::sim::kpi::SelfConsumptionReport;
use crate::sim::types::{DispatchRow, SimConfig};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`.
pub struct AppState {
    /// Simulation configuration used for this run.
    pub config: SimConfig,
    /// Self-consumption indicators.
    pub report: SelfConsumptionReport,
    /// Self-consumption indicators on P90 production.
    pub p90_report: Option<SelfConsumptionReport>,
    /// Per-interval dispatch results.
    pub dispatch: Vec<DispatchRow>,
    /// Heat-pump results, when simulated.
    pub heat_pump: Option<HeatPumpRun>,
}

impl From<RunOutput> for AppState {
    fn from(out: RunOutput) -> Self {
        Self {
            config: out.config,
            report: out.report,
            p90_report: out.p90_report,
            dispatch: out.dispatch,
            heat_pump: out.heat_pump,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/indicators", get(handlers::get_indicators))
        .route("/dispatch", get(handlers::get_dispatch))
        .route("/heat-pump", get(handlers::get_heat_pump))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
