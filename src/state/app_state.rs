//! Immutable application snapshot

use std::sync::Arc;

use crate::config::settings::DisplaySettings;
use crate::data::filter::{FilterSet, FilteredView};
use crate::data::pagination::{PageLayout, Pagination};
use crate::data::record::{Record, RecordId};
use crate::schema::ColumnRef;
use crate::selection::Selection;

/// Everything the renderer needs, replaced wholesale on each action.
///
/// Records sit behind an `Arc` so cloning a snapshot is cheap.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub records: Arc<Vec<Record>>,
    pub settings: DisplaySettings,
    pub filters: FilterSet,
    pub view: FilteredView,
    pub pagination: Pagination,
    pub selection_mode: bool,
    pub selection: Selection,
    pub drag_source: Option<String>,
    pub loading: bool,
}

impl AppState {
    pub fn new(settings: DisplaySettings, page_size: usize) -> Self {
        Self {
            settings: settings.reconciled(),
            pagination: Pagination::new(page_size),
            ..Self::default()
        }
    }

    /// Records of the filtered view (the full set when nothing is active)
    pub fn view_records(&self) -> impl Iterator<Item = &Record> {
        self.view.records(&self.records)
    }

    pub fn view_ids(&self) -> Vec<RecordId> {
        self.view_records().map(|r| r.id).collect()
    }

    /// Records on the current page
    pub fn page_records(&self) -> Vec<&Record> {
        let range = self.pagination.range(self.view.len());
        self.view.indices()[range]
            .iter()
            .filter_map(|&i| self.records.get(i))
            .collect()
    }

    pub fn page_layout(&self) -> PageLayout {
        self.pagination.layout(self.view.len())
    }

    pub fn visible_columns(&self) -> Vec<ColumnRef<'_>> {
        self.settings.visible_columns()
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Header checkbox state
    pub fn all_in_view_selected(&self) -> bool {
        self.selection.covers(&self.view_ids())
    }
}
