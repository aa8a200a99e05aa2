use std::path::PathBuf;

use thiserror::Error;

use crate::unitconfig::cleaner::session::FileKey;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while a
/// file is loaded, cleaned, or written back out.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the file extension matches neither supported format.
    #[error("unsupported file format for {0}, please use .csv or .xlsx")]
    UnsupportedFormat(String),

    /// Raised when no header matches the mandatory column keyword.
    #[error("no '{keyword}' column found in {file}")]
    MissingColumn { file: String, keyword: String },

    /// Raised when a text file cannot be decoded with any of the attempted encodings.
    #[error("could not decode {file} as {attempted}")]
    Decode { file: String, attempted: String },

    /// Raised when rows do not line up with the header row.
    #[error("invalid table in {file}: {reason}")]
    InvalidTable { file: String, reason: String },

    /// Raised when a workbook has no worksheet to read.
    #[error("workbook {0} contains no worksheets")]
    EmptyWorkbook(String),

    /// Raised when a configuration file holds values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the session holds no file for the requested key.
    #[error("no file registered under key {0}")]
    UnknownFile(FileKey),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
