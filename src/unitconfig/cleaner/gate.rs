use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::dedup::DuplicateGroup;
use crate::unitconfig::cleaner::validate::ProblemRow;

/// Operator answer for rows with problematic Unit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityDecision {
    Keep,
    Delete,
    Cancel,
}

/// Operator answer for rows sharing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDecision {
    KeepAll,
    CollapseToOne,
    Cancel,
}

impl FromStr for ValidityDecision {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "k" | "keep" => Ok(ValidityDecision::Keep),
            "d" | "delete" => Ok(ValidityDecision::Delete),
            "c" | "cancel" => Ok(ValidityDecision::Cancel),
            other => Err(format!("expected keep, delete or cancel, got '{other}'")),
        }
    }
}

impl FromStr for DuplicateDecision {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "a" | "all" | "keep-all" | "keep_all" => Ok(DuplicateDecision::KeepAll),
            "o" | "one" | "collapse" | "collapse-to-one" | "keep-one" | "keep_one" => {
                Ok(DuplicateDecision::CollapseToOne)
            }
            "c" | "cancel" => Ok(DuplicateDecision::Cancel),
            other => Err(format!("expected keep-all, collapse or cancel, got '{other}'")),
        }
    }
}

impl fmt::Display for ValidityDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityDecision::Keep => write!(f, "keep"),
            ValidityDecision::Delete => write!(f, "delete"),
            ValidityDecision::Cancel => write!(f, "cancel"),
        }
    }
}

impl fmt::Display for DuplicateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateDecision::KeepAll => write!(f, "keep-all"),
            DuplicateDecision::CollapseToOne => write!(f, "collapse"),
            DuplicateDecision::Cancel => write!(f, "cancel"),
        }
    }
}

/// Rows flagged by the Unit check, handed to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityReview {
    pub file_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<ProblemRow>,
}

/// Duplicate groups found after identifiers were built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReview {
    pub file_name: String,
    pub columns: Vec<String>,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReview {
    /// Number of rows across all groups.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }
}

/// Whoever answers the two questions the pipeline cannot answer itself.
pub trait OperatorGate {
    fn validity_decision(&mut self, review: &ValidityReview) -> ValidityDecision;

    fn duplicate_decision(&mut self, review: &DuplicateReview) -> DuplicateDecision;
}

/// Gate that always gives the same answers and counts how often it was asked.
#[derive(Debug, Clone)]
pub struct FixedGate {
    pub validity: ValidityDecision,
    pub duplicates: DuplicateDecision,
    pub validity_requests: usize,
    pub duplicate_requests: usize,
}

impl FixedGate {
    pub fn new(validity: ValidityDecision, duplicates: DuplicateDecision) -> Self {
        Self {
            validity,
            duplicates,
            validity_requests: 0,
            duplicate_requests: 0,
        }
    }
}

impl OperatorGate for FixedGate {
    fn validity_decision(&mut self, _review: &ValidityReview) -> ValidityDecision {
        self.validity_requests += 1;
        self.validity
    }

    fn duplicate_decision(&mut self, _review: &DuplicateReview) -> DuplicateDecision {
        self.duplicate_requests += 1;
        self.duplicates
    }
}
