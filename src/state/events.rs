//! Actions, side effects and user notices

use crate::config::settings::DisplaySettings;
use crate::data::record::{Record, RecordId};
use crate::schema::CustomValueType;

/// Everything that can change the application state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Settings arrived from (or were confirmed by) the settings store
    SettingsLoaded(DisplaySettings),

    /// Full record set fetched from the store
    RecordsLoaded(Vec<Record>),

    SetLoading(bool),

    /// Set or clear (empty value) one column filter
    SetFilter { key: String, value: String },
    ClearFilters,

    /// Header drag gesture
    DragStart(String),
    DropOn(String),
    DragEnd,

    /// Move without a gesture
    MoveColumn { source: String, target: String },

    ToggleColumnVisibility(String),
    ShowAllColumns,
    HideAllColumns,

    AddCustomColumn {
        name: String,
        value_type: CustomValueType,
    },
    RemoveCustomColumn(String),

    GoToPage(usize),
    SetPageSize(usize),

    ToggleSelectionMode,
    ToggleRowSelection(RecordId),
    /// Header checkbox over the current view
    ToggleSelectAll,
    ClearSelection,

    /// A record was created or updated; replace it locally without refetch
    RecordSaved(Record),
}

impl Action {
    /// Actions whose effect changes the column count or order, needing a
    /// header re-render as well as the body
    pub fn affects_header(&self) -> bool {
        matches!(
            self,
            Action::SettingsLoaded(_)
                | Action::DropOn(_)
                | Action::MoveColumn { .. }
                | Action::ToggleColumnVisibility(_)
                | Action::ShowAllColumns
                | Action::HideAllColumns
                | Action::AddCustomColumn { .. }
                | Action::RemoveCustomColumn(_)
                | Action::ToggleSelectionMode
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Work the reducer asks the caller to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Push the settings to the settings store
    PersistSettings(DisplaySettings),
    Notify(Notice),
}
