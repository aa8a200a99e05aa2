use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::unitconfig::cleaner::columns::ColumnRoles;
use crate::unitconfig::cleaner::config::CleanerConfig;
use crate::unitconfig::cleaner::model::Table;

/// Separator placed between identifier parts.
pub const SEPARATOR: &str = " - ";

/// Normalized source values of one row together with the display identifier
/// built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitIdentity {
    pub tower: String,
    pub unit: String,
    pub corporate: String,
    pub identifier: String,
    /// True when Corporate was appended to separate colliding rows.
    pub corporate_appended: bool,
}

/// `"{tower} - {unit}"`, or just the unit when the tower is empty. A unit that
/// already starts with the tower prefix is not prefixed twice.
pub fn base_identifier(tower: &str, unit: &str) -> String {
    if tower.is_empty() {
        return unit.to_string();
    }
    let prefix = format!("{tower}{SEPARATOR}");
    if unit.starts_with(&prefix) {
        unit.to_string()
    } else {
        format!("{prefix}{unit}")
    }
}

/// Strips what [`build_identifiers`] adds around a Unit: a leading
/// `"{tower} - "` and a trailing `" - {corporate}"`. Other values come back
/// unchanged, trimmed.
pub fn source_unit<'a>(unit: &'a str, tower: &str, corporate: &str) -> &'a str {
    let mut unit = unit.trim();
    if !tower.is_empty() {
        if let Some(rest) = unit
            .strip_prefix(tower)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
        {
            unit = rest;
        }
    }
    if !corporate.is_empty() {
        if let Some(rest) = unit
            .strip_suffix(corporate)
            .and_then(|rest| rest.strip_suffix(SEPARATOR))
        {
            unit = rest;
        }
    }
    unit
}

/// Builds the display identifier for every row.
///
/// Rows are first keyed by [`base_identifier`]. When several rows share a key
/// but carry different Corporate values, the non-empty Corporate is appended
/// to each row of that group so the identifiers separate again. Rows whose
/// Tower, Unit and Corporate all match keep the shared identifier and are left
/// for the deduplicator.
///
/// An appended identifier can land on another row's identifier, so grouping
/// repeats until it settles. Distinct rows that Corporate cannot separate get
/// a ` (n)` suffix in first-seen order.
pub fn build_identifiers(
    table: &Table,
    roles: &ColumnRoles,
    config: &CleanerConfig,
) -> Vec<UnitIdentity> {
    let mut identities: Vec<UnitIdentity> = table
        .rows()
        .iter()
        .map(|row| {
            let tower = roles
                .tower
                .map(|column| config.normalize_label(row.get(column)))
                .unwrap_or_default();
            let corporate = roles
                .corporate
                .map(|column| config.normalize_label(row.get(column)))
                .unwrap_or_default();
            let unit = row.get(roles.unit).trim().to_string();
            let identifier = base_identifier(&tower, &unit);
            UnitIdentity {
                tower,
                unit,
                corporate,
                identifier,
                corporate_appended: false,
            }
        })
        .collect();

    while separate_collisions(&mut identities) {}

    identities
}

/// Rows are the same unit when Tower, Corporate and the Unit without its tower
/// prefix all match.
fn row_key(identity: &UnitIdentity) -> (&str, &str, &str) {
    (
        identity.tower.as_str(),
        source_unit(&identity.unit, &identity.tower, ""),
        identity.corporate.as_str(),
    )
}

/// One grouping round. Returns true when any identifier changed.
fn separate_collisions(identities: &mut [UnitIdentity]) -> bool {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, identity) in identities.iter().enumerate() {
        match positions.get(identity.identifier.as_str()) {
            Some(&group) => groups[group].push(index),
            None => {
                positions.insert(identity.identifier.as_str(), groups.len());
                groups.push(vec![index]);
            }
        }
    }

    let mut taken: HashSet<String> = identities
        .iter()
        .map(|identity| identity.identifier.clone())
        .collect();
    let mut changed = false;

    for members in groups.iter().filter(|members| members.len() > 1) {
        let mut keys: Vec<(String, String, String)> = Vec::new();
        for &index in members {
            let (tower, unit, corporate) = row_key(&identities[index]);
            let key = (tower.to_string(), unit.to_string(), corporate.to_string());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.len() < 2 {
            continue;
        }

        let corporates: BTreeSet<&str> = members
            .iter()
            .map(|&index| identities[index].corporate.as_str())
            .collect();
        let appendable: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&index| {
                let identity = &identities[index];
                !identity.corporate_appended && !identity.corporate.is_empty()
            })
            .collect();

        if corporates.len() > 1 && !appendable.is_empty() {
            for index in appendable {
                let identity = &mut identities[index];
                identity.identifier = format!(
                    "{}{SEPARATOR}{}",
                    identity.identifier, identity.corporate
                );
                identity.corporate_appended = true;
                taken.insert(identity.identifier.clone());
            }
            changed = true;
            continue;
        }

        let shared = identities[members[0]].identifier.clone();
        let mut renamed: Vec<String> = vec![shared.clone()];
        let mut counter = 2;
        for _ in 1..keys.len() {
            let mut candidate = format!("{shared} ({counter})");
            while taken.contains(&candidate) {
                counter += 1;
                candidate = format!("{shared} ({counter})");
            }
            counter += 1;
            taken.insert(candidate.clone());
            renamed.push(candidate);
        }
        for &index in members {
            let (tower, unit, corporate) = row_key(&identities[index]);
            let position = keys
                .iter()
                .position(|key| key.0 == tower && key.1 == unit && key.2 == corporate)
                .unwrap_or(0);
            identities[index].identifier = renamed[position].clone();
        }
        changed = true;
    }

    changed
}

/// Writes the identifiers into the display column.
pub fn apply_identifiers(table: &mut Table, identities: &[UnitIdentity], config: &CleanerConfig) {
    let values = identities
        .iter()
        .map(|identity| identity.identifier.clone())
        .collect();
    table.set_column(&config.display_column, values);
}
