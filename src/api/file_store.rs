//! Local JSON-file stores with the same contract as the HTTP API

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::api::{RecordStore, SettingsStore};
use crate::config::settings::DisplaySettings;
use crate::data::record::{NewRecord, Record, RecordId, RecordUpdate};

/// Settings kept as pretty-printed JSON. A missing or unreadable file
/// yields empty settings.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_settings(&mut self) -> Result<DisplaySettings> {
        if !self.path.exists() {
            return Ok(DisplaySettings::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Ignoring unreadable settings file {}: {}", self.path.display(), e);
                Ok(DisplaySettings::default())
            }
        }
    }

    fn set_settings(&mut self, settings: &DisplaySettings) -> Result<DisplaySettings> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(settings.clone())
    }
}

/// Records kept as a JSON array on disk
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid record file {}", self.path.display()))
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(records)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn materialize(id: RecordId, candidate: &NewRecord) -> Record {
        Record {
            id,
            name: candidate.name.clone(),
            document_type: candidate.document_type,
            document_number: candidate.document_number.clone(),
            region: candidate.region.clone(),
            uf: None,
            status: candidate.status.clone(),
            financial_status: candidate.financial_status.clone(),
            connections: candidate.connections,
            invoices: candidate.invoices,
            tags: candidate.tags.clone(),
            metadata: candidate.metadata.clone(),
            created_at: Some(Local::now().to_rfc3339()),
            last_used_at: None,
            last_used_by: None,
        }
    }

    fn next_id(records: &[Record]) -> RecordId {
        records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

impl RecordStore for FileRecordStore {
    fn list_all(&mut self) -> Result<Vec<Record>> {
        self.load()
    }

    fn create(&mut self, record: &NewRecord) -> Result<Record> {
        let mut records = self.load()?;
        let created = Self::materialize(Self::next_id(&records), record);
        records.push(created.clone());
        self.save(&records)?;
        Ok(created)
    }

    fn update(&mut self, id: RecordId, update: &RecordUpdate) -> Result<Record> {
        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("Massa not found"))?;

        if let Some(name) = &update.name {
            record.name = Some(name.clone());
        }
        if let Some(status) = &update.status {
            record.status = status.clone();
        }
        if let Some(connections) = update.connections {
            record.connections = connections;
        }
        if let Some(invoices) = update.invoices {
            record.invoices = invoices;
        }
        if let Some(tags) = &update.tags {
            record.tags = tags.clone();
        }
        if let Some(metadata) = &update.metadata {
            record.metadata = metadata.clone();
        }

        let updated = record.clone();
        self.save(&records)?;
        Ok(updated)
    }

    fn delete(&mut self, id: RecordId) -> Result<()> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(anyhow!("Massa not found"));
        }
        self.save(&records)
    }

    fn delete_all(&mut self) -> Result<String> {
        let count = self.load()?.len();
        self.save(&[])?;
        Ok(format!("Deleted {} massas", count))
    }

    /// Documents already stored or repeated within the batch are skipped
    fn bulk_import(&mut self, batch: &[NewRecord]) -> Result<String> {
        let mut records = self.load()?;
        let mut seen: HashSet<String> =
            records.iter().map(|r| r.document_number.clone()).collect();
        let mut imported = 0;
        let mut skipped = 0;

        for candidate in batch {
            if !seen.insert(candidate.document_number.clone()) {
                skipped += 1;
                continue;
            }
            let id = Self::next_id(&records);
            records.push(Self::materialize(id, candidate));
            imported += 1;
        }

        self.save(&records)?;
        info!("Imported {} records, skipped {}", imported, skipped);
        Ok(format!(
            "Importados {} itens. {} duplicados ignorados.",
            imported, skipped
        ))
    }
}
