use tracing::{debug, info, instrument, warn};

use crate::unitconfig::cleaner::columns::resolve_columns;
use crate::unitconfig::cleaner::config::CleanerConfig;
use crate::unitconfig::cleaner::dedup::{collapse_duplicates, find_duplicate_groups};
use crate::unitconfig::cleaner::error::{Result, ToolError};
use crate::unitconfig::cleaner::gate::{
    DuplicateDecision, DuplicateReview, OperatorGate, ValidityDecision, ValidityReview,
};
use crate::unitconfig::cleaner::identifier::{apply_identifiers, build_identifiers};
use crate::unitconfig::cleaner::io::{cleaned_file_name, export_table, normalize_na};
use crate::unitconfig::cleaner::session::{FileEntry, FileKey, Session};
use crate::unitconfig::cleaner::summary::{DecisionStage, FileStatus, FileSummary};
use crate::unitconfig::cleaner::validate::{delete_problem_rows, find_problem_rows};

/// Where a file stands after one call to [`Cleaner::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Paused until the operator decides what to do with flagged Unit values.
    NeedsValidityDecision(ValidityReview),
    /// Paused until the operator decides what to do with duplicate rows.
    NeedsDuplicateDecision(DuplicateReview),
    /// Reached a terminal state.
    Finished(FileSummary),
}

enum Outcome {
    Paused(Progress),
    Finished {
        status: FileStatus,
        output: Option<Vec<u8>>,
    },
}

impl Outcome {
    fn cancelled(stage: DecisionStage) -> Self {
        Outcome::Finished {
            status: FileStatus::Cancelled { stage },
            output: None,
        }
    }
}

/// Runs the cleaning state machine over files held in a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Moves one file as far as the recorded decisions allow. Every call
    /// restarts from the cached table, so the result only depends on the
    /// decisions stored in the session. Finished files return their cached
    /// summary.
    #[instrument(level = "info", skip(self, session, key), fields(key = %key))]
    pub fn advance(&self, session: &mut Session, key: &FileKey) -> Result<Progress> {
        let entry = session.entry_mut(key)?;
        if let Some(summary) = entry.summary() {
            debug!("returning cached summary");
            return Ok(Progress::Finished(summary.clone()));
        }

        let outcome = match self.process(entry) {
            Ok(outcome) => outcome,
            Err(ToolError::MissingColumn { file, keyword }) => {
                warn!(file = %file, keyword = %keyword, "no unit column found");
                Outcome::Finished {
                    status: FileStatus::MissingUnitColumn,
                    output: None,
                }
            }
            Err(error) => {
                warn!(file = %entry.file_name, %error, "processing failed");
                Outcome::Finished {
                    status: FileStatus::Failed {
                        message: error.to_string(),
                    },
                    output: None,
                }
            }
        };

        match outcome {
            Outcome::Paused(progress) => Ok(progress),
            Outcome::Finished { status, output } => {
                let summary = FileSummary {
                    file_name: entry.file_name.clone(),
                    status,
                };
                entry.finish(summary.clone(), output);
                Ok(Progress::Finished(summary))
            }
        }
    }

    /// Drives one file to a terminal state, asking `gate` at each pause.
    pub fn run(
        &self,
        session: &mut Session,
        key: &FileKey,
        gate: &mut impl OperatorGate,
    ) -> Result<FileSummary> {
        loop {
            match self.advance(session, key)? {
                Progress::NeedsValidityDecision(review) => {
                    let decision = gate.validity_decision(&review);
                    info!(%decision, rows = review.rows.len(), "validity decision received");
                    session.decide_validity(key, decision)?;
                }
                Progress::NeedsDuplicateDecision(review) => {
                    let decision = gate.duplicate_decision(&review);
                    info!(%decision, groups = review.groups.len(), "duplicate decision received");
                    session.decide_duplicates(key, decision)?;
                }
                Progress::Finished(summary) => return Ok(summary),
            }
        }
    }

    /// Runs every registered file in upload order. A failing file yields a
    /// failed summary and never stops the rest of the batch.
    pub fn run_batch(
        &self,
        session: &mut Session,
        gate: &mut impl OperatorGate,
    ) -> Vec<FileSummary> {
        session
            .keys()
            .into_iter()
            .map(|key| {
                self.run(session, &key, gate).unwrap_or_else(|error| {
                    let name = session
                        .entry(&key)
                        .map(|entry| entry.file_name.clone())
                        .unwrap_or_else(|| key.to_string());
                    FileSummary::failed(name, error.to_string())
                })
            })
            .collect()
    }

    #[instrument(level = "debug", skip_all, fields(file = %entry.file_name))]
    fn process(&self, entry: &mut FileEntry) -> Result<Outcome> {
        let file_name = entry.file_name.clone();
        let mut table = match entry.load() {
            Ok(table) => table,
            Err(error) => {
                warn!(%error, "file could not be loaded");
                return Ok(Outcome::Finished {
                    status: FileStatus::LoadError {
                        message: error.to_string(),
                    },
                    output: None,
                });
            }
        };
        let rows_loaded = table.len();
        info!(rows = rows_loaded, columns = table.columns().len(), "table ready");

        let roles = resolve_columns(&file_name, table.columns(), &self.config)?;
        debug!(?roles, "columns resolved");

        let problems = find_problem_rows(&table, &roles, &self.config);
        let mut rows_deleted = 0;
        if !problems.is_empty() {
            info!(problem_rows = problems.len(), "problematic unit values found");
            match entry.validity_decision() {
                None => {
                    return Ok(Outcome::Paused(Progress::NeedsValidityDecision(
                        ValidityReview {
                            file_name,
                            columns: table.columns().to_vec(),
                            rows: problems,
                        },
                    )));
                }
                Some(ValidityDecision::Cancel) => {
                    warn!("cancelled at unit review");
                    return Ok(Outcome::cancelled(DecisionStage::Validity));
                }
                Some(ValidityDecision::Delete) => {
                    rows_deleted = delete_problem_rows(&mut table, &problems);
                    debug!(rows_deleted, "problematic rows deleted");
                }
                Some(ValidityDecision::Keep) => {}
            }
        }

        let identities = build_identifiers(&table, &roles, &self.config);
        apply_identifiers(&mut table, &identities, &self.config);

        let groups = find_duplicate_groups(&table, &identities);
        let mut duplicates_removed = 0;
        if !groups.is_empty() {
            info!(groups = groups.len(), "duplicate identifiers found");
            match entry.duplicate_decision() {
                None => {
                    return Ok(Outcome::Paused(Progress::NeedsDuplicateDecision(
                        DuplicateReview {
                            file_name,
                            columns: table.columns().to_vec(),
                            groups,
                        },
                    )));
                }
                Some(DuplicateDecision::Cancel) => {
                    warn!("cancelled at duplicate review");
                    return Ok(Outcome::cancelled(DecisionStage::Duplicates));
                }
                Some(DuplicateDecision::CollapseToOne) => {
                    duplicates_removed = collapse_duplicates(&mut table, &groups);
                    debug!(duplicates_removed, "duplicates collapsed");
                }
                Some(DuplicateDecision::KeepAll) => {}
            }
        }

        normalize_na(&mut table, &self.config);
        let format = self.config.export_format;
        let output = export_table(&table, format)?;
        info!(rows = table.len(), bytes = output.len(), "file exported");

        Ok(Outcome::Finished {
            status: FileStatus::Exported {
                output_name: cleaned_file_name(&file_name, format),
                rows_loaded,
                rows_deleted,
                duplicates_removed,
                row_count: table.len(),
            },
            output: Some(output),
        })
    }
}
