//! CSV export for dispatch, heat-pump and hourly-profile results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::{DispatchRow, HeatPumpRow};

use super::TIMESTAMP_FORMAT;

/// Column header of the dispatch export.
const DISPATCH_HEADER: &str = "timestamp,consumo,autoproducao,autoconsumo,consumo_rede,\
                               injeccao_rede,carga_bateria,descarga_bateria,soc";

/// Column header of the heat-pump export.
const HEAT_PUMP_HEADER: &str = "timestamp,t_sala,t_deposito,energia_perd_dep,energia_extr_aqs,\
                                energia_bc,energia_resist,energia_usada_bc,modo_op";

fn create(path: &Path) -> io::Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Exports dispatch results to a CSV file at the given path.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_dispatch_csv(rows: &[DispatchRow], path: &Path) -> io::Result<()> {
    write_dispatch_csv(rows, create(path)?)
}

/// Writes dispatch results as CSV to any writer.
///
/// # Arguments
///
/// * `rows` - Complete dispatch results
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_dispatch_csv(rows: &[DispatchRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DISPATCH_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", r.consumption_kwh),
            format!("{:.4}", r.production_kwh),
            format!("{:.4}", r.self_consumption_kwh),
            format!("{:.4}", r.grid_import_kwh),
            format!("{:.4}", r.grid_export_kwh),
            format!("{:.4}", r.battery_charge_kwh),
            format!("{:.4}", r.battery_discharge_kwh),
            format!("{:.4}", r.soc),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports heat-pump results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_heat_pump_csv(rows: &[HeatPumpRow], path: &Path) -> io::Result<()> {
    write_heat_pump_csv(rows, create(path)?)
}

/// Writes heat-pump results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_heat_pump_csv(rows: &[HeatPumpRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEAT_PUMP_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", r.room_c),
            format!("{:.2}", r.tank_c),
            format!("{:.4}", r.tank_loss_kwh),
            format!("{:.4}", r.extraction_kwh),
            format!("{:.4}", r.heat_pump_kwh),
            format!("{:.4}", r.resistance_kwh),
            format!("{:.4}", r.electricity_kwh),
            r.mode.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports an hourly-profile matrix to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_matrix_csv<const N: usize>(
    matrix: &[[f64; 24]; N],
    row_label: &str,
    path: &Path,
) -> io::Result<()> {
    write_matrix_csv(matrix, row_label, create(path)?)
}

/// Writes an hourly-profile matrix as CSV: one row per month or weekday
/// (1-based index in the first column), one column per hour.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_matrix_csv<const N: usize>(
    matrix: &[[f64; 24]; N],
    row_label: &str,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec![row_label.to_string()];
    header.extend((0..24).map(|h| format!("h{h:02}")));
    wtr.write_record(&header)?;

    for (i, row) in matrix.iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(row.iter().map(|v| format!("{v:.4}")));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
