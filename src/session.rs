//! Session: the state dispatcher wired to the record and settings stores.
//!
//! Every operation that talks to a store turns its outcome into a
//! [`Notice`]; nothing here fails the session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::api::{Confirmer, RecordStore, SettingsStore};
use crate::data::csv_import::{check_file_kind, parse_import, ImportOptions};
use crate::data::dashboard::DashboardStats;
use crate::data::data_exporter::DataExporter;
use crate::data::record::{
    pad_document, split_tags, ConnectionCounters, DocumentType, InvoiceCounters, NewRecord,
    Record, RecordId, RecordStatus, RecordUpdate, STATUS_COMMENT_KEY,
};
use crate::schema::CustomColumn;
use crate::selection::{run_bulk, BulkOutcome};
use crate::state::{Action, AppState, Effect, Notice, NoticeLevel, StateDispatcher, StateSubscriber};
use crate::ui::table_renderer::TableEvent;

/// Editable fields of one record, as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordForm {
    /// `None` creates a new record
    pub id: Option<RecordId>,
    pub name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub region: String,
    pub status: RecordStatus,
    pub status_comment: String,
    pub connections: ConnectionCounters,
    pub invoices: InvoiceCounters,
    /// Comma-separated
    pub tags: String,
    /// Free-form JSON object
    pub metadata_json: String,
    /// Inputs for custom columns, by column key
    pub custom_fields: BTreeMap<String, String>,
}

impl RecordForm {
    pub fn from_record(record: &Record, custom_columns: &[CustomColumn]) -> Self {
        let custom_fields = custom_columns
            .iter()
            .map(|c| (c.key.clone(), record.metadata_text(&c.key)))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        Self {
            id: Some(record.id),
            name: record.name_or_empty().to_string(),
            document_type: record.document_type,
            document_number: record.document_number.clone(),
            region: record.region.clone(),
            status: record.status.clone(),
            status_comment: record.status_comment().unwrap_or_default().to_string(),
            connections: record.connections,
            invoices: record.invoices,
            tags: record.tags.join(", "),
            metadata_json: serde_json::to_string_pretty(&record.metadata).unwrap_or_default(),
            custom_fields,
        }
    }

    /// Parse the metadata JSON and fold in the status comment and custom inputs
    pub fn metadata(&self, custom_columns: &[CustomColumn]) -> Result<Map<String, Value>> {
        let raw = self.metadata_json.trim();
        let mut metadata = if raw.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(raw).context("Invalid metadata JSON")? {
                Value::Object(map) => map,
                _ => bail!("Metadata must be a JSON object"),
            }
        };

        let comment = self.status_comment.trim();
        if comment.is_empty() {
            metadata.remove(STATUS_COMMENT_KEY);
        } else {
            metadata.insert(STATUS_COMMENT_KEY.to_string(), Value::from(comment));
        }

        for column in custom_columns {
            if let Some(value) = self.custom_fields.get(&column.key) {
                let value = value.trim();
                if !value.is_empty() {
                    metadata.insert(column.key.clone(), Value::from(value));
                }
            }
        }

        Ok(metadata)
    }

    fn document_number(&self) -> Result<String> {
        pad_document(&self.document_number, self.document_type).ok_or_else(|| {
            anyhow!(
                "{} must have at most {} digits",
                self.document_type,
                self.document_type.digit_len()
            )
        })
    }

    fn name(&self) -> Option<String> {
        let name = self.name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn to_new_record(&self, custom_columns: &[CustomColumn]) -> Result<NewRecord> {
        Ok(NewRecord {
            name: self.name(),
            document_type: self.document_type,
            document_number: self.document_number()?,
            region: self.region.trim().to_string(),
            status: self.status.clone(),
            financial_status: None,
            connections: self.connections,
            invoices: self.invoices,
            tags: split_tags(&self.tags),
            metadata: self.metadata(custom_columns)?,
        })
    }

    /// Labels of the fields that are fixed after creation but differ from `record`
    pub fn changed_fixed_fields(&self, record: &Record) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.document_type != record.document_type {
            changed.push("Tipo de documento");
        }
        let number = self.document_number.trim();
        if number != record.document_number
            && self.document_number().ok().as_deref() != Some(record.document_number.as_str())
        {
            changed.push("Documento");
        }
        if self.region.trim() != record.region.trim() {
            changed.push("Região");
        }
        changed
    }

    /// Document type, number and region are left out; the store keeps them as created
    pub fn to_update(&self, custom_columns: &[CustomColumn]) -> Result<RecordUpdate> {
        Ok(RecordUpdate {
            name: Some(self.name().unwrap_or_default()),
            status: Some(self.status.clone()),
            connections: Some(self.connections),
            invoices: Some(self.invoices),
            tags: Some(split_tags(&self.tags)),
            metadata: Some(self.metadata(custom_columns)?),
        })
    }
}

pub struct Session<R: RecordStore, S: SettingsStore> {
    dispatcher: StateDispatcher,
    records: R,
    settings: S,
    import_options: ImportOptions,
    notices: Vec<Notice>,
}

impl<R: RecordStore, S: SettingsStore> Session<R, S> {
    pub fn new(records: R, settings: S, page_size: usize, import_options: ImportOptions) -> Self {
        Self {
            dispatcher: StateDispatcher::new(AppState::new(Default::default(), page_size)),
            records,
            settings,
            import_options,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        self.dispatcher.state()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn StateSubscriber>) {
        self.dispatcher.subscribe(subscriber);
    }

    pub fn record_store(&mut self) -> &mut R {
        &mut self.records
    }

    pub fn settings_store(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice.message),
        }
        self.notices.push(notice);
    }

    /// Fetch settings, then the record set
    pub fn load(&mut self) {
        match self.settings.get_settings() {
            Ok(settings) => self.dispatch(Action::SettingsLoaded(settings)),
            Err(e) => {
                self.notify(Notice::error(format!("Erro ao carregar configurações: {:#}", e)));
                self.dispatch(Action::SettingsLoaded(Default::default()));
            }
        }
        self.refresh();
    }

    /// Re-fetch every record. Returns false when the store failed.
    pub fn refresh(&mut self) -> bool {
        self.dispatch(Action::SetLoading(true));
        match self.records.list_all() {
            Ok(records) => {
                self.dispatch(Action::RecordsLoaded(records));
                true
            }
            Err(e) => {
                self.dispatch(Action::SetLoading(false));
                self.notify(Notice::error(format!("Erro ao conectar com servidor: {:#}", e)));
                false
            }
        }
    }

    /// Apply an action and run the effects it asks for
    pub fn dispatch(&mut self, action: Action) {
        let effects = self.dispatcher.dispatch(action);
        for effect in effects {
            match effect {
                Effect::PersistSettings(settings) => match self.settings.set_settings(&settings) {
                    Ok(saved) => {
                        self.dispatcher.dispatch(Action::SettingsLoaded(saved));
                    }
                    Err(e) => self.notify(Notice::error(format!(
                        "Erro ao salvar configurações: {:#}",
                        e
                    ))),
                },
                Effect::Notify(notice) => self.notify(notice),
            }
        }
    }

    /// Route a table event. View and edit clicks return the record id for
    /// the caller to open; everything else is handled here.
    pub fn handle_event(&mut self, event: TableEvent) -> Option<RecordId> {
        match event {
            TableEvent::View(id) | TableEvent::Edit(id) => Some(id),
            TableEvent::Delete(id) => {
                self.delete_record(id);
                None
            }
            other => {
                if let Some(action) = other.into_action() {
                    self.dispatch(action);
                }
                None
            }
        }
    }

    fn selected_ids(&mut self) -> Option<Vec<RecordId>> {
        let ids = self.state().selection.ids();
        if ids.is_empty() {
            self.notify(Notice::warning("Nenhum item selecionado"));
            return None;
        }
        Some(ids)
    }

    fn bulk_notice(outcome: BulkOutcome, verb: &str) -> Notice {
        let mut message = format!("{} item(s) {}", outcome.succeeded, verb);
        if outcome.failed > 0 {
            message.push_str(&format!(", {} erro(s)", outcome.failed));
            Notice::warning(message)
        } else {
            Notice::success(message)
        }
    }

    /// Leave selection mode and reload, whatever the bulk outcome was
    fn finish_bulk(&mut self) {
        if self.state().selection_mode {
            self.dispatch(Action::ToggleSelectionMode);
        } else {
            self.dispatch(Action::ClearSelection);
        }
        self.refresh();
    }

    /// Set `status` on every selected record, one request at a time
    pub fn bulk_change_status(&mut self, status: RecordStatus) -> Option<BulkOutcome> {
        if !status.is_actionable() {
            self.notify(Notice::warning(format!(
                "Status {} não pode ser aplicado em massa",
                status.label()
            )));
            return None;
        }
        let ids = self.selected_ids()?;

        let update = RecordUpdate::status(status);
        let records = &mut self.records;
        let outcome = run_bulk("Bulk status change", &ids, |id| {
            records.update(id, &update).map(|_| ())
        });

        self.notify(Self::bulk_notice(outcome, "atualizados"));
        self.finish_bulk();
        Some(outcome)
    }

    pub fn bulk_delete(&mut self) -> Option<BulkOutcome> {
        let ids = self.selected_ids()?;

        let records = &mut self.records;
        let outcome = run_bulk("Bulk delete", &ids, |id| records.delete(id));

        self.notify(Self::bulk_notice(outcome, "excluídos"));
        self.finish_bulk();
        Some(outcome)
    }

    /// Delete every record after two confirmations
    pub fn delete_all(&mut self, confirmer: &mut dyn Confirmer) -> bool {
        if !confirmer.confirm("ATENÇÃO: Isso vai excluir TODAS as massas do banco de dados! Tem certeza?")
            || !confirmer.confirm("ÚLTIMA CHANCE: Esta ação é IRREVERSÍVEL! Confirmar a exclusão de TODAS as massas?")
        {
            self.notify(Notice::info("Exclusão cancelada"));
            return false;
        }

        let deleted = match self.records.delete_all() {
            Ok(message) => {
                self.notify(Notice::success(message));
                true
            }
            Err(e) => {
                self.notify(Notice::error(format!(
                    "Erro ao excluir todas as massas: {:#}",
                    e
                )));
                false
            }
        };
        self.finish_bulk();
        deleted
    }

    pub fn import_file(&mut self, path: &Path) -> Option<String> {
        if let Err(e) = check_file_kind(path) {
            self.notify(Notice::warning(e.to_string()));
            return None;
        }
        match fs::read_to_string(path) {
            Ok(text) => self.import_text(&text),
            Err(e) => {
                self.notify(Notice::error(format!(
                    "Não foi possível ler {}: {}",
                    path.display(),
                    e
                )));
                None
            }
        }
    }

    /// Normalize delimited text and hand the batch to the record store.
    /// Returns the store's summary message.
    pub fn import_text(&mut self, text: &str) -> Option<String> {
        let batch = match parse_import(
            text,
            &self.state().settings.custom_columns,
            &self.import_options,
        ) {
            Ok(batch) => batch,
            Err(e) => {
                self.notify(Notice::error(format!("Arquivo vazio ou inválido: {}", e)));
                return None;
            }
        };

        if batch.invalid_documents > 0 {
            self.notify(Notice::warning(format!(
                "{} linha(s) ignoradas por documento inválido",
                batch.invalid_documents
            )));
        }
        if batch.records.is_empty() {
            self.notify(Notice::warning("Nenhuma massa válida para importar"));
            return None;
        }

        match self.records.bulk_import(&batch.records) {
            Ok(message) => {
                self.notify(Notice::success(message.clone()));
                self.refresh();
                Some(message)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Erro na importação: {:#}", e)));
                None
            }
        }
    }

    /// Write the current view as CSV into `dir`
    pub fn export_csv(&mut self, dir: &Path) -> Option<PathBuf> {
        let state = self.state();
        let export = DataExporter::export_view_today(&state.records, &state.view, &state.settings)
            .and_then(|export| match export {
                Some(export) => DataExporter::write_to_dir(&export, dir)
                    .map(|path| Some((path, export.row_count))),
                None => Ok(None),
            });

        match export {
            Ok(Some((path, rows))) => {
                self.notify(Notice::success(format!(
                    "{} massa(s) exportadas para {}",
                    rows,
                    path.display()
                )));
                Some(path)
            }
            Ok(None) => {
                self.notify(Notice::warning("Nada para exportar"));
                None
            }
            Err(e) => {
                self.notify(Notice::error(format!("Erro ao exportar: {:#}", e)));
                None
            }
        }
    }

    /// Create or update from the form; the saved record replaces the local
    /// copy without a re-fetch
    pub fn save_record(&mut self, form: &RecordForm) -> Option<Record> {
        let customs = self.state().settings.custom_columns.clone();

        if let Some(existing) = form.id.and_then(|id| self.state().record(id)) {
            let changed = form.changed_fixed_fields(existing);
            if !changed.is_empty() {
                let message = format!("Campos não editáveis: {}", changed.join(", "));
                self.notify(Notice::warning(message));
                return None;
            }
        }

        let saved = match form.id {
            Some(id) => form
                .to_update(&customs)
                .map_err(|e| (true, e))
                .and_then(|update| self.records.update(id, &update).map_err(|e| (false, e))),
            None => form
                .to_new_record(&customs)
                .map_err(|e| (true, e))
                .and_then(|new| self.records.create(&new).map_err(|e| (false, e))),
        };

        match saved {
            Ok(record) => {
                self.dispatch(Action::RecordSaved(record.clone()));
                self.notify(Notice::success(if form.id.is_some() {
                    "Massa atualizada com sucesso!"
                } else {
                    "Massa criada com sucesso!"
                }));
                Some(record)
            }
            Err((true, e)) => {
                self.notify(Notice::error(format!("Formulário inválido: {:#}", e)));
                None
            }
            Err((false, e)) => {
                self.notify(Notice::error(format!("Erro: {:#}", e)));
                None
            }
        }
    }

    pub fn delete_record(&mut self, id: RecordId) -> bool {
        match self.records.delete(id) {
            Ok(()) => {
                self.notify(Notice::success(format!("Massa #{} excluída", id)));
                self.refresh();
                true
            }
            Err(e) => {
                self.notify(Notice::error(format!("Erro ao excluir massa #{}: {:#}", id, e)));
                false
            }
        }
    }

    /// Aggregates over the full record set
    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::compute(&self.state().records)
    }
}
