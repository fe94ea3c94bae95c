//! Export computed views to CSV and JSON.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. JSON exports carry the full view plus a small metadata envelope.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::{ExploreView, ForecastView};
use crate::domain::Aggregation;
use crate::error::AppError;

/// Envelope written around every JSON export.
#[derive(Debug, Serialize)]
struct ExportFile<'a, T: Serialize> {
    tool: &'static str,
    version: &'static str,
    generated_at: DateTime<Utc>,
    kind: &'static str,
    view: &'a T,
}

/// Write the count series (`value,count`) or table (`row,column,count`) to CSV.
pub fn write_explore_csv(path: &Path, view: &ExploreView) -> Result<(), AppError> {
    let mut writer = create_csv(path)?;

    match &view.aggregation {
        Aggregation::Single(series) => {
            write_record(&mut writer, [series.dimension.header_name(), "count"])?;
            for (value, count) in &series.entries {
                write_record(&mut writer, [value.to_string(), count.to_string()])?;
            }
        }
        Aggregation::Pair(table) => {
            write_record(
                &mut writer,
                [table.row_dimension.header_name(), table.column_dimension.header_name(), "count"],
            )?;
            for (row, cells) in table.rows.iter().zip(&table.cells) {
                for (column, count) in table.columns.iter().zip(cells) {
                    write_record(&mut writer, [row.to_string(), column.to_string(), count.to_string()])?;
                }
            }
        }
    }

    finish_csv(writer, path)
}

/// Write the combined historical + forecast table (`year,count,type`) to CSV.
pub fn write_forecast_csv(path: &Path, view: &ForecastView) -> Result<(), AppError> {
    let mut writer = create_csv(path)?;
    write_record(&mut writer, ["year", "count", "type"])?;
    for row in view.combined() {
        write_record(
            &mut writer,
            [row.year.to_string(), row.count.to_string(), row.kind.label().to_string()],
        )?;
    }
    finish_csv(writer, path)
}

pub fn write_explore_json(path: &Path, view: &ExploreView) -> Result<(), AppError> {
    write_json(path, "explore", view)
}

pub fn write_forecast_json(path: &Path, view: &ForecastView) -> Result<(), AppError> {
    write_json(path, "forecast", view)
}

fn write_json<T: Serialize>(path: &Path, kind: &'static str, view: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let export = ExportFile {
        tool: "ft",
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now(),
        kind,
        view,
    };

    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;

    tracing::info!(path = %path.display(), kind, "wrote JSON export");
    Ok(())
}

fn create_csv(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_record<I, S>(writer: &mut csv::Writer<File>, record: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))
}

fn finish_csv(mut writer: csv::Writer<File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), "wrote CSV export");
    Ok(())
}
