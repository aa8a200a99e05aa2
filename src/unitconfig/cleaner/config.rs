use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::error::{Result, ToolError};

/// Character rule applied to Unit values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityRule {
    /// Letters, digits, whitespace and hyphens are allowed.
    #[default]
    Standard,
    /// Hyphens are disallowed too, and date-like values are flagged.
    Strict,
}

/// Container format of the cleaned output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// File extension used for the output file.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Tunables for one cleaning run. Every field has a default so a partial
/// JSON document is enough to override a single setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub tower_keyword: String,
    pub unit_keyword: String,
    pub corporate_keyword: String,
    /// Values treated as "not available", compared trimmed and case-insensitively.
    pub na_tokens: Vec<String>,
    /// Also treat the literal word "blank" as empty in Tower and Corporate.
    pub blank_word_is_empty: bool,
    pub rule: ValidityRule,
    /// Header of the column receiving the built identifier.
    pub display_column: String,
    pub export_format: ExportFormat,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            tower_keyword: "tower".to_string(),
            unit_keyword: "unit".to_string(),
            corporate_keyword: "corporate".to_string(),
            na_tokens: vec!["n/a".to_string(), "na".to_string()],
            blank_word_is_empty: false,
            rule: ValidityRule::Standard,
            display_column: "Unit".to_string(),
            export_format: ExportFormat::Csv,
        }
    }
}

impl CleanerConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: CleanerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the resolver or exporter could not work with.
    pub fn validate(&self) -> Result<()> {
        for (name, keyword) in [
            ("tower_keyword", &self.tower_keyword),
            ("unit_keyword", &self.unit_keyword),
            ("corporate_keyword", &self.corporate_keyword),
            ("display_column", &self.display_column),
        ] {
            if keyword.trim().is_empty() {
                return Err(ToolError::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Returns true when the value is empty or one of the NA tokens.
    pub fn is_na(&self, value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || self
                .na_tokens
                .iter()
                .any(|token| token.trim().eq_ignore_ascii_case(trimmed))
    }

    /// Normalizes a free-text Tower or Corporate value: NA-like values become
    /// empty, everything else is trimmed.
    pub fn normalize_label(&self, value: &str) -> String {
        if self.is_na(value) {
            return String::new();
        }
        let trimmed = value.trim();
        if self.blank_word_is_empty && trimmed.eq_ignore_ascii_case("blank") {
            return String::new();
        }
        trimmed.to_string()
    }
}
