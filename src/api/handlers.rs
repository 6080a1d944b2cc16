//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{DispatchRecord, ErrorResponse, HeatPumpRecord, IndicatorsResponse, RangeQuery};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}

/// Resolves the inclusive index range of a query.
fn range(query: &RangeQuery) -> Result<(usize, usize), ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);
    if from > to {
        return Err(error(
            StatusCode::BAD_REQUEST,
            format!("`from` ({from}) must be <= `to` ({to})"),
        ));
    }
    Ok((from, to))
}

/// Returns simulation config and all indicator reports.
///
/// `GET /indicators` → 200 + `IndicatorsResponse` JSON
pub async fn get_indicators(State(state): State<Arc<AppState>>) -> Json<IndicatorsResponse> {
    Json(IndicatorsResponse {
        config: state.config.clone(),
        self_consumption: state.report.clone(),
        self_consumption_p90: state.p90_report.clone(),
        heat_pump: state.heat_pump.as_ref().map(|hp| hp.report.clone()),
    })
}

/// Returns dispatch records, optionally filtered by row index range.
///
/// `GET /dispatch` → 200 + `Vec<DispatchRecord>` JSON
/// `GET /dispatch?from=N&to=M` → filtered range (inclusive)
/// `GET /dispatch?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_dispatch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DispatchRecord>>, ApiError> {
    let (from, to) = range(&query)?;
    let records: Vec<DispatchRecord> = state
        .dispatch
        .iter()
        .enumerate()
        .filter(|(i, _)| *i >= from && *i <= to)
        .map(|(i, r)| DispatchRecord::new(i, r))
        .collect();
    Ok(Json(records))
}

/// Returns heat-pump records, optionally filtered by row index range.
///
/// `GET /heat-pump` → 200 + `Vec<HeatPumpRecord>` JSON
/// `GET /heat-pump?from=10&to=5` → 400 + `ErrorResponse`
/// 404 + `ErrorResponse` when the run simulated no heat pump
pub async fn get_heat_pump(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<HeatPumpRecord>>, ApiError> {
    let (from, to) = range(&query)?;
    let Some(hp) = state.heat_pump.as_ref() else {
        return Err(error(
            StatusCode::NOT_FOUND,
            "no heat pump in this run".to_string(),
        ));
    };
    let records: Vec<HeatPumpRecord> = hp
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i >= from && *i <= to)
        .map(|(i, r)| HeatPumpRecord::new(i, r))
        .collect();
    Ok(Json(records))
}
