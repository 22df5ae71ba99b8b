#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::collections::BTreeSet;

use tdm::api::{RecordStore, SettingsStore};
use tdm::config::settings::DisplaySettings;
use tdm::data::record::{DocumentType, NewRecord, Record, RecordId, RecordUpdate};

/// In-memory record store that fails for chosen ids and counts requests
#[derive(Default)]
pub struct MemoryStore {
    pub records: Vec<Record>,
    pub failing: BTreeSet<RecordId>,
    pub offline: bool,
    pub list_calls: usize,
    pub update_calls: usize,
    pub delete_calls: usize,
    pub create_calls: usize,
    pub imported: Vec<NewRecord>,
}

impl MemoryStore {
    pub fn with_records(n: i64) -> Self {
        Self {
            records: (1..=n).map(sample).collect(),
            ..Self::default()
        }
    }

    fn check(&self, id: RecordId) -> Result<()> {
        if self.offline {
            return Err(anyhow!("connection refused"));
        }
        if self.failing.contains(&id) {
            return Err(anyhow!("API error (500): boom"));
        }
        Ok(())
    }
}

pub fn sample(id: RecordId) -> Record {
    let mut record = Record::new(id, DocumentType::Cpf, &format!("{:011}", id));
    record.name = Some(format!("Cliente {}", id));
    record.region = if id % 2 == 0 { "Bahia" } else { "Pernambuco" }.to_string();
    record
}

impl RecordStore for MemoryStore {
    fn list_all(&mut self) -> Result<Vec<Record>> {
        self.list_calls += 1;
        if self.offline {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.records.clone())
    }

    fn create(&mut self, record: &NewRecord) -> Result<Record> {
        self.create_calls += 1;
        let id = self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut created = Record::new(id, record.document_type, &record.document_number);
        created.name = record.name.clone();
        created.region = record.region.clone();
        created.status = record.status.clone();
        created.tags = record.tags.clone();
        created.metadata = record.metadata.clone();
        self.records.push(created.clone());
        Ok(created)
    }

    fn update(&mut self, id: RecordId, update: &RecordUpdate) -> Result<Record> {
        self.update_calls += 1;
        self.check(id)?;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("Massa not found"))?;
        if let Some(status) = &update.status {
            record.status = status.clone();
        }
        if let Some(name) = &update.name {
            record.name = Some(name.clone());
        }
        if let Some(metadata) = &update.metadata {
            record.metadata = metadata.clone();
        }
        Ok(record.clone())
    }

    fn delete(&mut self, id: RecordId) -> Result<()> {
        self.delete_calls += 1;
        self.check(id)?;
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Err(anyhow!("Massa not found"));
        }
        Ok(())
    }

    fn delete_all(&mut self) -> Result<String> {
        let count = self.records.len();
        self.records.clear();
        Ok(format!("Deleted {} massas", count))
    }

    fn bulk_import(&mut self, records: &[NewRecord]) -> Result<String> {
        if self.offline {
            return Err(anyhow!("connection refused"));
        }
        self.imported.extend_from_slice(records);
        for record in records {
            self.create(record)?;
        }
        Ok(format!("Importados {} itens. 0 duplicados ignorados.", records.len()))
    }
}

/// Settings store that remembers every saved object
#[derive(Default)]
pub struct MemorySettings {
    pub current: DisplaySettings,
    pub saves: Vec<DisplaySettings>,
    pub fail_saves: bool,
}

impl SettingsStore for MemorySettings {
    fn get_settings(&mut self) -> Result<DisplaySettings> {
        Ok(self.current.clone())
    }

    fn set_settings(&mut self, settings: &DisplaySettings) -> Result<DisplaySettings> {
        if self.fail_saves {
            return Err(anyhow!("settings store unavailable"));
        }
        self.saves.push(settings.clone());
        self.current = settings.clone();
        Ok(settings.clone())
    }
}
