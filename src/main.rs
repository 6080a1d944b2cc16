//! Self-consumption simulator entry point: CLI wiring and scenario execution.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{Level, error, info, warn};

use selfconsumption_sim::config::ScenarioConfig;
use selfconsumption_sim::error::SimError;
use selfconsumption_sim::io::export::{export_dispatch_csv, export_heat_pump_csv, export_matrix_csv};
use selfconsumption_sim::io::import::read_series_csv;
use selfconsumption_sim::runner::run_scenario;
use selfconsumption_sim::sim::kpi::{DispatchColumn, monthly_hourly_means, weekday_hourly_means};
use selfconsumption_sim::synthetic::synthetic_series;

/// Solar self-consumption simulator.
///
/// Runs battery dispatch (and optionally a heat-pump water heater) over a
/// CSV series or a synthetic year, then prints the indicator reports.
/// If no --scenario or --preset is given, the baseline preset is used.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load scenario from TOML config file
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,
    /// Use a built-in preset (baseline, no_battery, heat_pump, legacy_battery)
    #[arg(long)]
    preset: Option<String>,
    /// Input CSV with timestamp, consumo, autoproducao columns; synthetic series when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Override random seed of the synthetic series
    #[arg(long)]
    seed: Option<u64>,
    /// Override number of days of the synthetic series
    #[arg(long)]
    days: Option<usize>,
    /// Export dispatch results to CSV
    #[arg(long)]
    out: Option<PathBuf>,
    /// Export heat-pump results to CSV
    #[arg(long)]
    heat_pump_out: Option<PathBuf>,
    /// Directory receiving month x hour and weekday x hour profile CSVs
    #[arg(long)]
    matrix_out: Option<PathBuf>,
    /// Dispatch column averaged in the profile CSVs
    #[arg(long, value_enum, default_value = "self-consumption")]
    matrix_column: DispatchColumn,
    /// Print every dispatch row
    #[arg(long)]
    rows: bool,
    /// Debug-level logging
    #[arg(long, short)]
    verbose: bool,
    /// Start REST API server after simulation
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,
    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn load_scenario(cli: &Cli) -> Result<ScenarioConfig, Box<dyn Error>> {
    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };
    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(days) = cli.days {
        scenario.simulation.days = days;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        return Err(SimError::Config(errors).into());
    }
    Ok(scenario)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let scenario = load_scenario(&cli)?;

    let series = match &cli.input {
        Some(path) => {
            let series = read_series_csv(path, scenario.simulation.interval_hours)?;
            info!(rows = series.len(), path = %path.display(), "input series loaded");
            series
        }
        None => {
            let series = synthetic_series(&scenario)?;
            info!(
                rows = series.len(),
                seed = scenario.simulation.seed,
                "synthetic series generated"
            );
            series
        }
    };

    let out = run_scenario(&scenario, &series)?;

    if cli.rows {
        for r in &out.dispatch {
            println!("{r}");
        }
        println!();
    }

    println!("{}", out.report);
    if let Some(p90) = &out.p90_report {
        println!("\n[P90 production]\n{p90}");
    }
    if let Some(hp) = &out.heat_pump {
        println!("\n{}", hp.report);
    }

    if let Some(path) = &cli.out {
        export_dispatch_csv(&out.dispatch, path)?;
        info!(path = %path.display(), "dispatch results written");
    }

    if let Some(path) = &cli.heat_pump_out {
        match &out.heat_pump {
            Some(hp) => {
                export_heat_pump_csv(&hp.rows, path)?;
                info!(path = %path.display(), "heat-pump results written");
            }
            None => warn!("scenario has no heat pump, --heat-pump-out ignored"),
        }
    }

    if let Some(dir) = &cli.matrix_out {
        fs::create_dir_all(dir)?;
        let column = cli.matrix_column;
        let samples = || out.dispatch.iter().map(move |r| (r.timestamp, column.value(r)));
        export_matrix_csv(&monthly_hourly_means(samples()), "month", &dir.join("monthly_hourly.csv"))?;
        export_matrix_csv(&weekday_hourly_means(samples()), "weekday", &dir.join("weekday_hourly.csv"))?;
        info!(dir = %dir.display(), ?column, "hourly profiles written");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use selfconsumption_sim::api::{AppState, serve};

        let state = Arc::new(AppState::from(out));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(serve(state, addr))?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}
