use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::config::CleanerConfig;
use crate::unitconfig::cleaner::error::{Result, ToolError};

/// Semantic role a header can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Tower,
    Unit,
    Corporate,
    Other,
}

/// Column indexes resolved for one table. Unit is mandatory; the other roles
/// stay unresolved when no header matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub tower: Option<usize>,
    pub unit: usize,
    pub corporate: Option<usize>,
}

impl ColumnRoles {
    /// Role of the column at `index`. A header matching several keywords
    /// reports the most specific one, Unit first.
    pub fn role_of(&self, index: usize) -> ColumnRole {
        if self.unit == index {
            ColumnRole::Unit
        } else if self.tower == Some(index) {
            ColumnRole::Tower
        } else if self.corporate == Some(index) {
            ColumnRole::Corporate
        } else {
            ColumnRole::Other
        }
    }
}

/// Index of the first header whose lowercased text contains `keyword`.
pub fn find_column(headers: &[String], keyword: &str) -> Option<usize> {
    let keyword = keyword.to_lowercase();
    headers
        .iter()
        .position(|header| header.to_lowercase().contains(&keyword))
}

/// Resolves the Tower, Unit and Corporate columns. Fails with
/// [`ToolError::MissingColumn`] when no header contains the unit keyword.
pub fn resolve_columns(
    file_name: &str,
    headers: &[String],
    config: &CleanerConfig,
) -> Result<ColumnRoles> {
    let unit = find_column(headers, &config.unit_keyword).ok_or_else(|| {
        ToolError::MissingColumn {
            file: file_name.to_string(),
            keyword: config.unit_keyword.clone(),
        }
    })?;

    Ok(ColumnRoles {
        tower: find_column(headers, &config.tower_keyword),
        unit,
        corporate: find_column(headers, &config.corporate_keyword),
    })
}
