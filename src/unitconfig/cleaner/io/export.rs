use std::path::Path;

use csv::{Terminator, WriterBuilder};
use tracing::{debug, instrument};

use crate::unitconfig::cleaner::config::{CleanerConfig, ExportFormat};
use crate::unitconfig::cleaner::error::{Result, ToolError};
use crate::unitconfig::cleaner::io::excel_write;
use crate::unitconfig::cleaner::model::Table;

/// Blanks every cell that holds an NA token, across all columns.
pub fn normalize_na(table: &mut Table, config: &CleanerConfig) {
    table.map_cells(|cell| {
        if !cell.is_empty() && config.is_na(cell) {
            Some(String::new())
        } else {
            None
        }
    });
}

/// Serializes the table in the requested format.
#[instrument(level = "debug", skip(table), fields(rows = table.len()))]
pub fn export_table(table: &Table, format: ExportFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Csv => write_csv(table)?,
        ExportFormat::Xlsx => excel_write::write_workbook(table)?,
    };
    debug!(bytes = bytes.len(), "table serialized");
    Ok(bytes)
}

/// Writes the header and every row as UTF-8 CSV with `\n` line endings.
pub fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if !table.columns().is_empty() {
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.cells())?;
        }
    }
    writer
        .into_inner()
        .map_err(|error| ToolError::Io(error.into_error()))
}

/// Derives the output file name: `units.xlsx` becomes `units_cleaned.csv`.
pub fn cleaned_file_name(file_name: &str, format: ExportFormat) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "output".to_string());
    format!("{stem}_cleaned.{}", format.extension())
}
