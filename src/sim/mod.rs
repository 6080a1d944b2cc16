/// Battery dispatch loop.
pub mod dispatch;
pub mod kpi;
pub mod power_balance;
/// Validated input time series.
pub mod series;
/// Heat-pump simulation loop.
pub mod thermal;
pub mod types;
