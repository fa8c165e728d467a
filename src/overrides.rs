//! User-chosen column names layered over a freshly generated model.
//!
//! Overrides are keyed by table name and canonical column name, so they keep
//! applying as long as regeneration reproduces the same canonical names.

use crate::mld::LogicalModel;
use crate::naming::NameSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map of table name → canonical column name → custom name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnOverrides {
    tables: BTreeMap<String, BTreeMap<String, String>>,
}

impl ColumnOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        table: impl Into<String>,
        canonical: impl Into<String>,
        name: impl Into<String>,
    ) -> Option<String> {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(canonical.into(), name.into())
    }

    pub fn remove(&mut self, table: &str, canonical: &str) -> Option<String> {
        let columns = self.tables.get_mut(table)?;
        let removed = columns.remove(canonical);
        if columns.is_empty() {
            self.tables.remove(table);
        }
        removed
    }

    pub fn get(&self, table: &str, canonical: &str) -> Option<&str> {
        self.tables.get(table)?.get(canonical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.tables.iter().flat_map(|(table, columns)| {
            columns
                .iter()
                .map(move |(canonical, name)| (table.as_str(), canonical.as_str(), name.as_str()))
        })
    }

    /// Entries that match no column of `model`, as (table, canonical) pairs.
    pub fn stale_entries<'a>(&'a self, model: &LogicalModel) -> Vec<(&'a str, &'a str)> {
        self.iter()
            .filter(|(table, canonical, _)| {
                model
                    .table(table)
                    .and_then(|t| t.column(canonical))
                    .is_none()
            })
            .map(|(table, canonical, _)| (table, canonical))
            .collect()
    }
}

/// Rename columns according to `overrides`, returning a new model.
///
/// Names are always recomputed from canonical names, so applying the same map
/// again gives the same result. Blank overrides and overrides that would
/// duplicate another column name of the same table are ignored.
pub fn apply_overrides(model: &LogicalModel, overrides: &ColumnOverrides) -> LogicalModel {
    let mut result = model.clone();

    for table in &mut result.tables {
        let mut taken = NameSet::new();
        let mut renamed = Vec::with_capacity(table.columns.len());

        // Columns without an override keep their canonical name and take
        // precedence over a custom name that would clash with them.
        for column in &table.columns {
            if overrides.get(&table.name, &column.canonical).is_none() {
                taken.claim(&column.canonical);
            }
        }

        for column in &table.columns {
            let name = match overrides.get(&table.name, &column.canonical) {
                Some(custom) if !custom.trim().is_empty() && !taken.contains(custom.trim()) => {
                    let custom = custom.trim();
                    taken.claim(custom);
                    custom.to_string()
                }
                Some(custom) => {
                    log::warn!(
                        "override '{}' for {}.{} ignored",
                        custom,
                        table.name,
                        column.canonical
                    );
                    taken.claim(&column.canonical)
                }
                None => column.canonical.clone(),
            };
            renamed.push(name);
        }

        for (column, name) in table.columns.iter_mut().zip(renamed) {
            column.name = name;
        }
    }

    result
}
