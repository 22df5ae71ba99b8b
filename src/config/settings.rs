//! Display settings: column order, hidden set and custom column definitions.
//!
//! Every mutation returns a new value; the previous snapshot is never
//! modified in place.

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{
    fixed_keys, is_fixed_key, ColumnRef, CustomColumn, ACTIONS_KEY, FIXED_COLUMNS,
    RESERVED_TRAILING_KEYS,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub custom_columns: Vec<CustomColumn>,
    #[serde(default)]
    pub hidden_columns: BTreeSet<String>,
    #[serde(default)]
    pub column_order: Vec<String>,
}

/// One row of the column visibility manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnListEntry {
    pub key: String,
    pub label: String,
    pub visible: bool,
    pub custom: bool,
    /// The actions column cannot be hidden
    pub locked: bool,
}

impl DisplaySettings {
    /// Settings with the default order and nothing hidden
    pub fn with_defaults() -> Self {
        Self::default().reconciled()
    }

    /// Position where new custom keys go: right before the two trailing
    /// reserved keys.
    fn insertion_index(order: &[String]) -> usize {
        order.len().saturating_sub(RESERVED_TRAILING_KEYS.len())
    }

    /// Make the order contain every fixed and custom key exactly once and
    /// drop `actions` from the hidden set. Unknown keys are kept and
    /// rendered as orphans.
    ///
    /// Missing fixed keys go before the first reserved trailing key, missing
    /// custom keys at `len - 2`.
    pub fn reconciled(&self) -> Self {
        let mut next = self.clone();

        let mut seen = BTreeSet::new();
        next.column_order.retain(|key| seen.insert(key.clone()));

        if next.column_order.is_empty() {
            next.column_order = fixed_keys().map(str::to_string).collect();
        } else {
            for fixed in FIXED_COLUMNS {
                if next.column_order.iter().any(|k| k == fixed.key) {
                    continue;
                }
                let at = if RESERVED_TRAILING_KEYS.contains(&fixed.key) {
                    next.column_order.len()
                } else {
                    next.column_order
                        .iter()
                        .position(|k| RESERVED_TRAILING_KEYS.contains(&k.as_str()))
                        .unwrap_or(next.column_order.len())
                };
                next.column_order.insert(at, fixed.key.to_string());
            }
        }

        for custom in &self.custom_columns {
            if !next.column_order.contains(&custom.key) {
                let at = Self::insertion_index(&next.column_order);
                next.column_order.insert(at, custom.key.clone());
            }
        }

        for key in &next.column_order {
            if !is_fixed_key(key) && !self.custom_columns.iter().any(|c| &c.key == key) {
                warn!("Column order references unknown key '{}'", key);
            }
        }

        next.hidden_columns.remove(ACTIONS_KEY);
        next
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_columns.contains(key)
    }

    pub fn custom_column(&self, key: &str) -> Option<&CustomColumn> {
        self.custom_columns.iter().find(|c| c.key == key)
    }

    pub fn ordered_columns(&self) -> Vec<ColumnRef<'_>> {
        self.column_order
            .iter()
            .map(|key| ColumnRef::resolve(key, &self.custom_columns))
            .collect()
    }

    pub fn visible_columns(&self) -> Vec<ColumnRef<'_>> {
        self.ordered_columns()
            .into_iter()
            .filter(|c| !self.is_hidden(c.key()))
            .collect()
    }

    /// Move `source` to the position currently held by `target`.
    ///
    /// Returns `None` when either key is missing or they are equal.
    pub fn move_column(&self, source: &str, target: &str) -> Option<Self> {
        if source == target {
            return None;
        }
        let from = self.column_order.iter().position(|k| k == source)?;
        let to = self.column_order.iter().position(|k| k == target)?;

        let mut next = self.clone();
        let key = next.column_order.remove(from);
        next.column_order.insert(to, key);
        debug!("Moved column '{}' from {} to {}", source, from, to);
        Some(next)
    }

    /// Flip a key's membership in the hidden set. `actions` is never hidden.
    pub fn toggle_visibility(&self, key: &str) -> Self {
        let mut next = self.clone();
        if key == ACTIONS_KEY {
            return next;
        }
        if !next.hidden_columns.remove(key) {
            next.hidden_columns.insert(key.to_string());
        }
        next
    }

    pub fn show_all(&self) -> Self {
        Self {
            hidden_columns: BTreeSet::new(),
            ..self.clone()
        }
    }

    pub fn hide_all(&self) -> Self {
        let hidden = self
            .all_keys()
            .into_iter()
            .filter(|k| k != ACTIONS_KEY)
            .collect();
        Self {
            hidden_columns: hidden,
            ..self.clone()
        }
    }

    pub fn add_custom_column(&self, column: CustomColumn) -> Result<Self> {
        if is_fixed_key(&column.key) || self.custom_column(&column.key).is_some() {
            return Err(anyhow!("A column with key '{}' already exists", column.key));
        }
        let mut next = self.clone();
        next.custom_columns.push(column);
        Ok(next.reconciled())
    }

    /// Drop a custom column definition along with its order and hidden
    /// entries. Values already stored in record metadata are untouched.
    pub fn remove_custom_column(&self, key: &str) -> Result<Self> {
        if self.custom_column(key).is_none() {
            return Err(anyhow!("No custom column with key '{}'", key));
        }
        let mut next = self.clone();
        next.custom_columns.retain(|c| c.key != key);
        next.column_order.retain(|k| k != key);
        next.hidden_columns.remove(key);
        Ok(next)
    }

    /// Fixed keys followed by custom keys
    pub fn all_keys(&self) -> Vec<String> {
        fixed_keys()
            .map(str::to_string)
            .chain(self.custom_columns.iter().map(|c| c.key.clone()))
            .collect()
    }

    pub fn column_list(&self) -> Vec<ColumnListEntry> {
        self.all_keys()
            .iter()
            .map(|key| {
                let column = ColumnRef::resolve(key, &self.custom_columns);
                ColumnListEntry {
                    key: key.clone(),
                    label: column.header_label(),
                    visible: !self.is_hidden(key),
                    custom: column.is_custom(),
                    locked: key == ACTIONS_KEY,
                }
            })
            .collect()
    }

    /// "N de M colunas visíveis"
    pub fn visibility_summary(&self) -> String {
        let list = self.column_list();
        let visible = list.iter().filter(|e| e.visible).count();
        format!("{} de {} colunas visíveis", visible, list.len())
    }
}

/// Filter the column list by label. Substring matches win; when there are
/// none, fall back to fuzzy matching ordered by score.
pub fn search_column_list(entries: &[ColumnListEntry], query: &str) -> Vec<ColumnListEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return entries.to_vec();
    }

    let substring: Vec<ColumnListEntry> = entries
        .iter()
        .filter(|e| e.label.to_lowercase().contains(&query))
        .cloned()
        .collect();
    if !substring.is_empty() {
        return substring;
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &ColumnListEntry)> = entries
        .iter()
        .filter_map(|e| {
            matcher
                .fuzzy_match(&e.label.to_lowercase(), &query)
                .map(|score| (score, e))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, e)| e.clone()).collect()
}
