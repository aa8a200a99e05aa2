use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::columns::ColumnRoles;
use crate::unitconfig::cleaner::config::{CleanerConfig, ValidityRule};
use crate::unitconfig::cleaner::identifier::source_unit;
use crate::unitconfig::cleaner::model::Table;

static DISALLOWED_STANDARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s\-]").unwrap());

static DISALLOWED_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").unwrap());

static DATE_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}(?:[-/.]\d{1,4}){1,2}$").unwrap());

/// Why a Unit value was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProblemReason {
    /// The value contains characters outside the allowed set, listed once each
    /// in order of first appearance.
    DisallowedCharacters { characters: String },
    /// The value looks like a date (strict rule only).
    DateLike,
}

impl fmt::Display for ProblemReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemReason::DisallowedCharacters { characters } => {
                write!(f, "special characters '{characters}'")
            }
            ProblemReason::DateLike => write!(f, "date-like value"),
        }
    }
}

/// Outcome of checking one Unit value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityVerdict {
    pub reasons: Vec<ProblemReason>,
}

impl ValidityVerdict {
    pub fn is_problematic(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// A flagged row as presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRow {
    /// Position of the row in the loaded table.
    pub index: usize,
    pub unit: String,
    pub reasons: Vec<ProblemReason>,
    pub cells: Vec<String>,
}

/// Checks a single Unit value. Empty and NA-like values are always clean.
pub fn check_unit(value: &str, config: &CleanerConfig) -> ValidityVerdict {
    if config.is_na(value) {
        return ValidityVerdict::default();
    }
    let value = value.trim();

    let pattern = match config.rule {
        ValidityRule::Standard => &*DISALLOWED_STANDARD,
        ValidityRule::Strict => &*DISALLOWED_STRICT,
    };

    let mut reasons = Vec::new();
    let mut characters = String::new();
    for found in pattern.find_iter(value) {
        for ch in found.as_str().chars() {
            if !characters.contains(ch) {
                characters.push(ch);
            }
        }
    }
    if !characters.is_empty() {
        reasons.push(ProblemReason::DisallowedCharacters { characters });
    }
    if config.rule == ValidityRule::Strict && DATE_LIKE.is_match(value) {
        reasons.push(ProblemReason::DateLike);
    }

    ValidityVerdict { reasons }
}

/// Checks the Unit cell of every row and returns the flagged ones in table
/// order. A Unit carrying its own Tower prefix or Corporate suffix from an
/// earlier clean is checked without them, so separators added by the builder
/// never count against the value.
pub fn find_problem_rows(
    table: &Table,
    roles: &ColumnRoles,
    config: &CleanerConfig,
) -> Vec<ProblemRow> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let label = |column: Option<usize>| {
                column
                    .map(|column| config.normalize_label(row.get(column)))
                    .unwrap_or_default()
            };
            let unit = row.get(roles.unit);
            let checked = source_unit(unit, &label(roles.tower), &label(roles.corporate));
            let verdict = check_unit(checked, config);
            verdict.is_problematic().then(|| ProblemRow {
                index,
                unit: unit.to_string(),
                reasons: verdict.reasons,
                cells: row.cells().to_vec(),
            })
        })
        .collect()
}

/// Removes the flagged rows, keeping the order of the remaining ones.
/// Returns how many rows were removed.
pub fn delete_problem_rows(table: &mut Table, problems: &[ProblemRow]) -> usize {
    let before = table.len();
    let flagged: std::collections::HashSet<usize> =
        problems.iter().map(|problem| problem.index).collect();
    table.retain_rows(|index| !flagged.contains(&index));
    before - table.len()
}
