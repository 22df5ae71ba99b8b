//! `(state, action) -> (state, effects)`

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::settings::DisplaySettings;
use crate::data::filter::FilteredView;
use crate::schema::CustomColumn;
use crate::state::app_state::AppState;
use crate::state::events::{Action, Effect, Notice};

/// New snapshot plus the side effects the caller must run
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

fn refilter(state: &mut AppState) {
    state.view = FilteredView::compute(&state.records, &state.filters);
    state.pagination.clamp(state.view.len());
}

/// Filters on hidden columns have no input left to clear them, so they go too
fn with_settings(state: &AppState, settings: DisplaySettings) -> Transition {
    let mut next = state.clone();
    next.settings = settings.clone();

    let stale: Vec<String> = next
        .filters
        .iter()
        .filter(|(key, _)| next.settings.is_hidden(key))
        .map(|(key, _)| key.to_string())
        .collect();
    if !stale.is_empty() {
        debug!("Dropping filters on hidden columns: {:?}", stale);
        for key in &stale {
            next.filters.set(key, "");
        }
        next.pagination.first_page();
        refilter(&mut next);
    }

    Transition {
        state: next,
        effects: vec![Effect::PersistSettings(settings)],
    }
}

pub fn reduce(state: &AppState, action: Action) -> Transition {
    debug!("reduce: {:?}", action);

    match action {
        Action::SettingsLoaded(settings) => {
            let mut next = state.clone();
            next.settings = settings.reconciled();
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::RecordsLoaded(records) => {
            let mut next = state.clone();
            info!("Loaded {} records", records.len());
            next.records = Arc::new(records);
            next.loading = false;
            refilter(&mut next);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::SetLoading(loading) => {
            let mut next = state.clone();
            next.loading = loading;
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::SetFilter { key, value } => {
            let mut next = state.clone();
            next.filters.set(&key, &value);
            next.pagination.first_page();
            refilter(&mut next);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::ClearFilters => {
            let mut next = state.clone();
            next.filters.clear();
            next.pagination.first_page();
            refilter(&mut next);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::DragStart(key) => {
            let mut next = state.clone();
            next.drag_source = Some(key);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::DropOn(target) => {
            let Some(source) = state.drag_source.as_deref() else {
                return Transition::unchanged(state);
            };
            match state.settings.move_column(source, &target) {
                Some(settings) => {
                    let mut transition = with_settings(state, settings);
                    transition.state.drag_source = None;
                    transition
                }
                None => {
                    let mut next = state.clone();
                    next.drag_source = None;
                    Transition {
                        state: next,
                        effects: Vec::new(),
                    }
                }
            }
        }

        Action::DragEnd => {
            let mut next = state.clone();
            next.drag_source = None;
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::MoveColumn { source, target } => {
            match state.settings.move_column(&source, &target) {
                Some(settings) => with_settings(state, settings),
                None => {
                    let mut transition = Transition::unchanged(state);
                    transition.effects.push(Effect::Notify(Notice::warning(format!(
                        "Cannot move '{}' to '{}'",
                        source, target
                    ))));
                    transition
                }
            }
        }

        Action::ToggleColumnVisibility(key) => {
            with_settings(state, state.settings.toggle_visibility(&key))
        }

        Action::ShowAllColumns => with_settings(state, state.settings.show_all()),

        Action::HideAllColumns => with_settings(state, state.settings.hide_all()),

        Action::AddCustomColumn { name, value_type } => {
            let added = CustomColumn::new(&name, value_type, &state.settings.custom_columns)
                .and_then(|column| state.settings.add_custom_column(column));
            match added {
                Ok(settings) => {
                    let mut transition = with_settings(state, settings);
                    transition
                        .effects
                        .push(Effect::Notify(Notice::success(format!(
                            "Coluna '{}' adicionada",
                            name.trim()
                        ))));
                    transition
                }
                Err(e) => {
                    warn!("Rejected custom column '{}': {}", name, e);
                    let mut transition = Transition::unchanged(state);
                    transition
                        .effects
                        .push(Effect::Notify(Notice::warning(e.to_string())));
                    transition
                }
            }
        }

        Action::RemoveCustomColumn(key) => match state.settings.remove_custom_column(&key) {
            Ok(settings) => with_settings(state, settings),
            Err(e) => {
                let mut transition = Transition::unchanged(state);
                transition
                    .effects
                    .push(Effect::Notify(Notice::warning(e.to_string())));
                transition
            }
        },

        Action::GoToPage(page) => {
            let mut next = state.clone();
            if !next.pagination.go_to(page, next.view.len()) {
                debug!("Ignoring navigation to page {}", page);
            }
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::SetPageSize(size) => {
            let mut next = state.clone();
            next.pagination.set_page_size(size);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::ToggleSelectionMode => {
            let mut next = state.clone();
            next.selection_mode = !state.selection_mode;
            next.selection.clear();
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::ToggleRowSelection(id) => {
            if !state.selection_mode {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.selection.toggle(id);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::ToggleSelectAll => {
            if !state.selection_mode {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            let ids = state.view_ids();
            next.selection.toggle_all(&ids);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::ClearSelection => {
            let mut next = state.clone();
            next.selection.clear();
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }

        Action::RecordSaved(record) => {
            let mut next = state.clone();
            let records = Arc::make_mut(&mut next.records);
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
            refilter(&mut next);
            Transition {
                state: next,
                effects: Vec::new(),
            }
        }
    }
}
