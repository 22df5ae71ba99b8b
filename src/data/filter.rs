use std::collections::BTreeMap;

use tracing::debug;

use crate::data::record::{ConnectionKind, InvoiceKind, Record};
use crate::schema::{
    DOCUMENT_NUMBER_KEY, DOCUMENT_TYPE_KEY, FAT_COUNTERS_KEY, ID_KEY, NAME_KEY, REGION_KEY,
    STATUS_KEY, TAGS_KEY, UC_COUNTERS_KEY,
};

/// Raw filter inputs keyed by column key.
///
/// An empty (or whitespace-only) value is an inactive predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    values: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the raw input for a column
    pub fn set(&mut self, key: &str, value: &str) {
        if value.trim().is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `key=value` pairs as given on the command line
    pub fn parse_assignment(&mut self, assignment: &str) -> anyhow::Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Filter '{}' must look like key=value", assignment))?;
        self.set(key.trim(), value.trim());
        Ok(())
    }

    /// True when every active predicate holds for `record`
    pub fn matches(&self, record: &Record) -> bool {
        self.values
            .iter()
            .all(|(key, value)| predicate_holds(key, value, record))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn predicate_holds(key: &str, value: &str, record: &Record) -> bool {
    let value = value.trim();
    match key {
        ID_KEY => contains_ci(&record.id.to_string(), value),
        NAME_KEY => contains_ci(record.name_or_empty(), value),
        DOCUMENT_NUMBER_KEY => contains_ci(&record.document_number, value),
        TAGS_KEY => contains_ci(&record.tags.join(" "), value),
        DOCUMENT_TYPE_KEY => record.document_type.as_str() == value,
        REGION_KEY => record.region == value,
        STATUS_KEY => record.status.as_str() == value,
        UC_COUNTERS_KEY => match ConnectionKind::from_flag(value) {
            Some(kind) => record.has_connection(kind),
            None => true,
        },
        FAT_COUNTERS_KEY => match InvoiceKind::from_flag(value) {
            Some(kind) => record.has_invoice(kind),
            None => true,
        },
        custom => contains_ci(&record.metadata_text(custom), value),
    }
}

/// Indices of the records that pass a filter set.
///
/// When no predicate is active the view covers the full set and
/// `is_filtered` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
    filtered: bool,
}

impl FilteredView {
    pub fn compute(records: &[Record], filters: &FilterSet) -> Self {
        if !filters.is_active() {
            return Self::all(records.len());
        }

        let indices: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| filters.matches(record))
            .map(|(i, _)| i)
            .collect();

        debug!(
            "Filter applied: {} of {} records match",
            indices.len(),
            records.len()
        );

        Self {
            indices,
            filtered: true,
        }
    }

    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
            filtered: false,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records<'a>(&'a self, records: &'a [Record]) -> impl Iterator<Item = &'a Record> + 'a {
        self.indices.iter().filter_map(move |&i| records.get(i))
    }
}
