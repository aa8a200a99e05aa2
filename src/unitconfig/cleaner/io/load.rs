use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx};
use csv::ReaderBuilder;
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::{debug, instrument};

use crate::unitconfig::cleaner::error::{Result, ToolError};
use crate::unitconfig::cleaner::model::Table;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Container formats accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Sheet-based workbook; the first worksheet is read.
    Sheet,
    /// Comma-delimited text.
    Delimited,
}

impl SourceFormat {
    /// Picks the format from the file name's extension.
    pub fn detect(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(SourceFormat::Sheet),
            Some("csv") => Ok(SourceFormat::Delimited),
            _ => Err(ToolError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Reads a table from a file on disk.
pub fn load_path(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_table(&name, &bytes)
}

/// Parses the raw bytes of an uploaded file. The name is only used to infer
/// the format and to label errors.
#[instrument(level = "debug", skip(bytes), fields(size = bytes.len()))]
pub fn load_table(file_name: &str, bytes: &[u8]) -> Result<Table> {
    let table = match SourceFormat::detect(file_name)? {
        SourceFormat::Sheet => read_sheet(file_name, bytes)?,
        SourceFormat::Delimited => read_delimited(file_name, bytes)?,
    };
    debug!(
        columns = table.columns().len(),
        rows = table.len(),
        "table loaded"
    );
    Ok(table)
}

fn read_sheet(file_name: &str, bytes: &[u8]) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::EmptyWorkbook(file_name.to_string()))?
        .map_err(ToolError::from)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(headers);
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| cell_to_string(Some(cell))).collect();
        if cells.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        push_checked(&mut table, file_name, cells)?;
    }
    Ok(table)
}

fn read_delimited(file_name: &str, bytes: &[u8]) -> Result<Table> {
    let text = decode_text(file_name, bytes)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        push_checked(&mut table, file_name, record.iter().map(str::to_string).collect())?;
    }
    Ok(table)
}

fn push_checked(table: &mut Table, file_name: &str, cells: Vec<String>) -> Result<()> {
    let width = table.columns().len();
    let row_number = table.len() + 2;
    table.push_row(cells).map_err(|rejected| ToolError::InvalidTable {
        file: file_name.to_string(),
        reason: format!(
            "row {row_number} has {} fields but the header has {width}",
            rejected.len()
        ),
    })
}

/// Decodes text as UTF-8, falling back to Windows-1252 when the bytes are not
/// valid UTF-8.
pub fn decode_text<'a>(file_name: &str, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        return Ok(text);
    }
    debug!(file = file_name, "not valid UTF-8, retrying as windows-1252");
    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| ToolError::Decode {
            file: file_name.to_string(),
            attempted: "utf-8, windows-1252".to_string(),
        })
}

/// Date cells keep their calendar shape (`2020-10-10 00:00:00`) instead of
/// the workbook's serial number.
fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(date @ DataType::DateTime(_)) => date
            .as_datetime()
            .map(|value| value.to_string())
            .unwrap_or_else(|| date.to_string()),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
