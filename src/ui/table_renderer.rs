//! Table model built from an `AppState` snapshot.
//!
//! Rendering is a pure function of the snapshot: headers and filter row come
//! from the visible ordered columns, cells from `(column, record)`. Rows are
//! keyed by record id and events carry ids, never captured records.

use std::collections::BTreeMap;

use crate::data::pagination::PageLayout;
use crate::data::record::{
    mask_document, split_tags, ConnectionKind, InvoiceKind, Record, RecordId,
};
use crate::schema::{
    ColumnRef, CustomValueType, FilterKind, ACTIONS_KEY, DOCUMENT_NUMBER_KEY, DOCUMENT_TYPE_KEY,
    FAT_COUNTERS_KEY, ID_KEY, NAME_KEY, REGION_KEY, STATUS_KEY, TAGS_KEY, UC_COUNTERS_KEY,
};
use crate::state::{Action, AppState};
use crate::utils::format::{format_date_br, format_number_br};

/// Display value of one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    /// Shown as "-"
    Empty,
    /// Status badge; the tooltip carries the status comment
    Badge {
        label: String,
        tooltip: Option<String>,
    },
    Chips(Vec<String>),
    /// View / edit / delete controls for the record
    Actions(RecordId),
}

impl CellValue {
    fn text_or_empty(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text)
        }
    }

    fn chips_or_empty(chips: Vec<String>) -> Self {
        if chips.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Chips(chips)
        }
    }

    /// Flat text used by plain-text renderers
    pub fn plain(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Empty => "-".to_string(),
            CellValue::Badge { label, .. } => label.clone(),
            CellValue::Chips(chips) => chips.join(" "),
            CellValue::Actions(_) => "ver | editar | excluir".to_string(),
        }
    }
}

fn count_label(count: u32, label: &str, pluralizes: bool) -> String {
    if pluralizes && count > 1 {
        format!("{} {}s", count, label)
    } else {
        format!("{} {}", count, label)
    }
}

pub fn connection_chips(record: &Record) -> Vec<String> {
    ConnectionKind::ALL
        .iter()
        .filter(|k| record.has_connection(**k))
        .map(|k| count_label(k.count(&record.connections), k.label(), true))
        .collect()
}

pub fn invoice_chips(record: &Record) -> Vec<String> {
    InvoiceKind::ALL
        .iter()
        .filter(|k| record.has_invoice(**k))
        .map(|k| count_label(k.count(&record.invoices), k.label(), k.pluralizes()))
        .collect()
}

/// Render one cell
pub fn render_cell(column: &ColumnRef<'_>, record: &Record) -> CellValue {
    match column.key() {
        ID_KEY => CellValue::Text(format!("#{}", record.id)),
        NAME_KEY => CellValue::text_or_empty(record.name_or_empty()),
        DOCUMENT_NUMBER_KEY => {
            CellValue::Text(mask_document(&record.document_number, record.document_type))
        }
        DOCUMENT_TYPE_KEY => CellValue::Text(record.document_type.to_string()),
        REGION_KEY => CellValue::text_or_empty(record.region.as_str()),
        STATUS_KEY => CellValue::Badge {
            label: record.status.label().to_string(),
            tooltip: record.status_comment().map(str::to_string),
        },
        UC_COUNTERS_KEY => CellValue::chips_or_empty(connection_chips(record)),
        FAT_COUNTERS_KEY => CellValue::chips_or_empty(invoice_chips(record)),
        TAGS_KEY => CellValue::chips_or_empty(record.tags.clone()),
        ACTIONS_KEY => CellValue::Actions(record.id),
        key => {
            let ColumnRef::Custom(custom) = column else {
                return CellValue::Empty;
            };
            let value = record.metadata_text(key);
            if value.is_empty() {
                return CellValue::Empty;
            }
            match custom.value_type {
                CustomValueType::Text => CellValue::Text(value),
                CustomValueType::Number => CellValue::Text(format_number_br(&value)),
                CustomValueType::Date => CellValue::Text(format_date_br(&value)),
                CustomValueType::Tag => CellValue::chips_or_empty(split_tags(&value)),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCell {
    /// Leading checkbox shown in selection mode
    SelectAll { checked: bool },
    Column {
        key: String,
        label: String,
        draggable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// One cell of the header filter row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCell {
    None,
    Text {
        key: String,
        value: String,
    },
    Select {
        key: String,
        /// Label of the empty "no filter" option
        all_label: String,
        options: Vec<FilterOption>,
        selected: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: RecordId,
    pub selected: Option<bool>,
    pub cells: Vec<CellValue>,
}

/// Everything needed to draw the table for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub headers: Vec<HeaderCell>,
    pub filters: Vec<FilterCell>,
    pub rows: Vec<TableRow>,
    pub pagination: PageLayout,
    pub loading: bool,
    row_index: BTreeMap<RecordId, usize>,
}

impl TableModel {
    pub fn build(state: &AppState) -> Self {
        let columns = state.visible_columns();

        let mut headers = Vec::with_capacity(columns.len() + 1);
        let mut filters = Vec::with_capacity(columns.len() + 1);
        if state.selection_mode {
            headers.push(HeaderCell::SelectAll {
                checked: state.all_in_view_selected(),
            });
            filters.push(FilterCell::None);
        }
        for column in &columns {
            headers.push(HeaderCell::Column {
                key: column.key().to_string(),
                label: column.header_label(),
                draggable: true,
            });
            filters.push(filter_cell(column, state));
        }

        let rows: Vec<TableRow> = state
            .page_records()
            .into_iter()
            .map(|record| TableRow {
                id: record.id,
                selected: state
                    .selection_mode
                    .then(|| state.selection.contains(record.id)),
                cells: columns.iter().map(|c| render_cell(c, record)).collect(),
            })
            .collect();

        let row_index = rows.iter().enumerate().map(|(i, r)| (r.id, i)).collect();

        Self {
            headers,
            filters,
            rows,
            pagination: state.page_layout(),
            loading: state.loading,
            row_index,
        }
    }

    pub fn row(&self, id: RecordId) -> Option<&TableRow> {
        self.row_index.get(&id).and_then(|&i| self.rows.get(i))
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

fn filter_cell(column: &ColumnRef<'_>, state: &AppState) -> FilterCell {
    let key = column.key().to_string();
    let current = state.filters.get(&key).unwrap_or("").to_string();
    match column.filter_kind() {
        FilterKind::None => FilterCell::None,
        FilterKind::Text => FilterCell::Text { key, value: current },
        FilterKind::Select(options) => FilterCell::Select {
            all_label: if key == REGION_KEY { "Todas" } else { "Todos" }.to_string(),
            options: options
                .iter()
                .map(|o| FilterOption {
                    value: o.value.to_string(),
                    label: o.label.to_string(),
                })
                .collect(),
            selected: current,
            key,
        },
    }
}

/// UI events, delegated by key or record id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    HeaderDragStart(String),
    HeaderDrop(String),
    HeaderDragEnd,
    FilterInput { key: String, value: String },
    RowCheckbox(RecordId),
    HeaderCheckbox,
    PageButton(usize),
    PageSize(usize),
    /// View / edit / delete clicks; handled by the session, not the reducer
    View(RecordId),
    Edit(RecordId),
    Delete(RecordId),
}

impl TableEvent {
    /// State action for the event, if it maps to one
    pub fn into_action(self) -> Option<Action> {
        match self {
            TableEvent::HeaderDragStart(key) => Some(Action::DragStart(key)),
            TableEvent::HeaderDrop(key) => Some(Action::DropOn(key)),
            TableEvent::HeaderDragEnd => Some(Action::DragEnd),
            TableEvent::FilterInput { key, value } => Some(Action::SetFilter { key, value }),
            TableEvent::RowCheckbox(id) => Some(Action::ToggleRowSelection(id)),
            TableEvent::HeaderCheckbox => Some(Action::ToggleSelectAll),
            TableEvent::PageButton(page) => Some(Action::GoToPage(page)),
            TableEvent::PageSize(size) => Some(Action::SetPageSize(size)),
            TableEvent::View(_) | TableEvent::Edit(_) | TableEvent::Delete(_) => None,
        }
    }
}
