use std::fmt;

use serde::{Deserialize, Serialize};

/// Decision point at which the operator cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    Validity,
    Duplicates,
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Exported {
        output_name: String,
        rows_loaded: usize,
        rows_deleted: usize,
        duplicates_removed: usize,
        row_count: usize,
    },
    Cancelled {
        stage: DecisionStage,
    },
    MissingUnitColumn,
    /// The file could not be read into a table.
    LoadError {
        message: String,
    },
    Failed {
        message: String,
    },
}

/// Per-file result shown to the operator once processing ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_name: String,
    pub status: FileStatus,
}

impl FileSummary {
    pub fn failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: FileStatus::Failed {
                message: message.into(),
            },
        }
    }

    pub fn is_exported(&self) -> bool {
        matches!(self.status, FileStatus::Exported { .. })
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = &self.file_name;
        match &self.status {
            FileStatus::Exported {
                output_name,
                rows_deleted,
                duplicates_removed,
                row_count,
                ..
            } => {
                writeln!(f, "Processed: {file} -> {output_name}")?;
                if *rows_deleted > 0 {
                    writeln!(
                        f,
                        "Deleted {rows_deleted} row(s) due to special characters in Unit."
                    )?;
                }
                if *duplicates_removed > 0 {
                    writeln!(f, "Removed {duplicates_removed} duplicate row(s).")?;
                }
                write!(f, "Total rows output: {row_count}")
            }
            FileStatus::Cancelled { .. } => write!(f, "Canceled processing for {file}."),
            FileStatus::MissingUnitColumn => write!(f, "No 'Unit' column found in {file}."),
            FileStatus::LoadError { message } | FileStatus::Failed { message } => {
                write!(f, "Error processing {file}: {message}")
            }
        }
    }
}
