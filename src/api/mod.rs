//! External collaborators: record store, settings store, confirmations
//!
//! The HTTP client talks to the record API; the file stores keep the same
//! contract on local disk.

pub mod client;
pub mod file_store;

use anyhow::Result;

use crate::config::settings::DisplaySettings;
use crate::data::record::{NewRecord, Record, RecordId, RecordUpdate};

pub use client::ApiClient;
pub use file_store::{FileRecordStore, FileSettingsStore};

/// Record CRUD surface
pub trait RecordStore {
    fn list_all(&mut self) -> Result<Vec<Record>>;

    fn create(&mut self, record: &NewRecord) -> Result<Record>;

    fn update(&mut self, id: RecordId, update: &RecordUpdate) -> Result<Record>;

    fn delete(&mut self, id: RecordId) -> Result<()>;

    /// Returns the store's summary message
    fn delete_all(&mut self) -> Result<String>;

    /// Returns the store's summary message
    fn bulk_import(&mut self, records: &[NewRecord]) -> Result<String>;
}

pub trait SettingsStore {
    fn get_settings(&mut self) -> Result<DisplaySettings>;

    /// Persist and return what was stored
    fn set_settings(&mut self, settings: &DisplaySettings) -> Result<DisplaySettings>;
}

/// Yes/no confirmation prompt
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirmer for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
