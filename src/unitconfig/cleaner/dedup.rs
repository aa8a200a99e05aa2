use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::identifier::UnitIdentity;
use crate::unitconfig::cleaner::model::Table;

/// Member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    pub index: usize,
    pub cells: Vec<String>,
}

/// Rows sharing one identifier, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub identifier: String,
    pub rows: Vec<DuplicateRow>,
}

/// Groups rows by their built identifier and returns every group with more
/// than one member, ordered by the group's first row.
pub fn find_duplicate_groups(table: &Table, identities: &[UnitIdentity]) -> Vec<DuplicateGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, identity) in identities.iter().enumerate() {
        let key = identity.identifier.as_str();
        let entry = members.entry(key).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(index);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let indexes = members.remove(key)?;
            if indexes.len() < 2 {
                return None;
            }
            let rows = indexes
                .into_iter()
                .map(|index| DuplicateRow {
                    index,
                    cells: table
                        .rows()
                        .get(index)
                        .map(|row| row.cells().to_vec())
                        .unwrap_or_default(),
                })
                .collect();
            Some(DuplicateGroup {
                identifier: key.to_string(),
                rows,
            })
        })
        .collect()
}

/// Keeps the first row of every group and drops the rest. Returns the number
/// of rows removed.
pub fn collapse_duplicates(table: &mut Table, groups: &[DuplicateGroup]) -> usize {
    let dropped: HashSet<usize> = groups
        .iter()
        .flat_map(|group| group.rows.iter().skip(1).map(|row| row.index))
        .collect();
    let before = table.len();
    table.retain_rows(|index| !dropped.contains(&index));
    before - table.len()
}
