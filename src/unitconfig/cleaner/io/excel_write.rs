use rust_xlsxwriter::Workbook;

use crate::unitconfig::cleaner::error::Result;
use crate::unitconfig::cleaner::model::Table;

/// Name of the single worksheet in exported workbooks.
pub const CLEANED_SHEET: &str = "Cleaned";

/// Serializes the table into an in-memory `.xlsx` workbook.
pub fn write_workbook(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(CLEANED_SHEET)?;

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.cells().iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.columns().is_empty() {
        let col_end = (table.columns().len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, table.len() as u32, col_end)?;
    }

    Ok(workbook.save_to_buffer()?)
}
