use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::unitconfig::cleaner::error::{Result, ToolError};
use crate::unitconfig::cleaner::gate::{DuplicateDecision, ValidityDecision};
use crate::unitconfig::cleaner::io::load_table;
use crate::unitconfig::cleaner::model::Table;
use crate::unitconfig::cleaner::summary::FileSummary;

/// Stable identity of an uploaded file, derived from its name and content so
/// the same upload always maps to the same cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileKey(Uuid);

impl FileKey {
    pub fn for_file(file_name: &str, bytes: &[u8]) -> Self {
        let mut seed = Vec::with_capacity(file_name.len() + 1 + bytes.len());
        seed.extend_from_slice(file_name.as_bytes());
        seed.push(0);
        seed.extend_from_slice(bytes);
        FileKey(Uuid::new_v5(&Uuid::NAMESPACE_OID, &seed))
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything cached for one file between pipeline invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub key: FileKey,
    pub file_name: String,
    source: Vec<u8>,
    table: Option<Table>,
    validity_decision: Option<ValidityDecision>,
    duplicate_decision: Option<DuplicateDecision>,
    output: Option<Vec<u8>>,
    summary: Option<FileSummary>,
}

impl FileEntry {
    fn new(key: FileKey, file_name: String, source: Vec<u8>) -> Self {
        Self {
            key,
            file_name,
            source,
            table: None,
            validity_decision: None,
            duplicate_decision: None,
            output: None,
            summary: None,
        }
    }

    /// Returns the parsed table, parsing the source bytes on first use.
    pub(crate) fn load(&mut self) -> Result<Table> {
        if let Some(table) = &self.table {
            return Ok(table.clone());
        }
        let table = load_table(&self.file_name, &self.source)?;
        self.table = Some(table.clone());
        Ok(table)
    }

    pub(crate) fn finish(&mut self, summary: FileSummary, output: Option<Vec<u8>>) {
        self.summary = Some(summary);
        self.output = output;
    }

    pub fn validity_decision(&self) -> Option<ValidityDecision> {
        self.validity_decision
    }

    pub fn duplicate_decision(&self) -> Option<DuplicateDecision> {
        self.duplicate_decision
    }

    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn summary(&self) -> Option<&FileSummary> {
        self.summary.as_ref()
    }
}

/// Cache of in-flight files keyed by [`FileKey`], kept in upload order. The
/// host owns the session and passes it into every pipeline call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    entries: Vec<FileEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the session. Registering the same name and content
    /// again returns the existing key and keeps its cached state.
    pub fn register(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> FileKey {
        let file_name = file_name.into();
        let key = FileKey::for_file(&file_name, &bytes);
        if self.entry(&key).is_none() {
            self.entries.push(FileEntry::new(key, file_name, bytes));
        }
        key
    }

    /// Reads a file from disk and registers it under its file name.
    pub fn register_path(&mut self, path: &Path) -> Result<FileKey> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.register(file_name, bytes))
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<FileKey> {
        self.entries.iter().map(|entry| entry.key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, key: &FileKey) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub(crate) fn entry_mut(&mut self, key: &FileKey) -> Result<&mut FileEntry> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.key == key)
            .ok_or(ToolError::UnknownFile(*key))
    }

    /// Records the operator's answer for flagged Unit values.
    pub fn decide_validity(&mut self, key: &FileKey, decision: ValidityDecision) -> Result<()> {
        self.entry_mut(key)?.validity_decision = Some(decision);
        Ok(())
    }

    /// Records the operator's answer for duplicate rows.
    pub fn decide_duplicates(&mut self, key: &FileKey, decision: DuplicateDecision) -> Result<()> {
        self.entry_mut(key)?.duplicate_decision = Some(decision);
        Ok(())
    }

    pub fn output(&self, key: &FileKey) -> Option<&[u8]> {
        self.entry(key).and_then(FileEntry::output)
    }

    pub fn summary(&self, key: &FileKey) -> Option<&FileSummary> {
        self.entry(key).and_then(FileEntry::summary)
    }

    /// Forgets decisions and results for one file; the parsed table stays
    /// cached.
    pub fn reset(&mut self, key: &FileKey) -> Result<()> {
        let entry = self.entry_mut(key)?;
        entry.validity_decision = None;
        entry.duplicate_decision = None;
        entry.output = None;
        entry.summary = None;
        Ok(())
    }

    /// Drops every file, as when a new batch is uploaded.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
