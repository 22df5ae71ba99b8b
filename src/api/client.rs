use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::{RecordStore, SettingsStore};
use crate::config::settings::DisplaySettings;
use crate::data::record::{NewRecord, Record, RecordId, RecordUpdate};

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

/// Blocking HTTP client for the record and settings API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into an error carrying the server's detail
    fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(ErrorResponse {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorResponse { detail }) => detail.to_string(),
            Err(_) if !body.is_empty() => body,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(anyhow!("API error ({}): {}", status.as_u16(), detail))
    }

    fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        Self::check(response)?
            .json()
            .context("Failed to decode API response")
    }
}

impl RecordStore for ApiClient {
    fn list_all(&mut self) -> Result<Vec<Record>> {
        debug!("GET {}/massas/", self.base_url);
        let response = self
            .client
            .get(self.url("/massas/"))
            .send()
            .context("Failed to reach record API")?;
        let records: Vec<Record> = Self::read(response)?;
        info!("Fetched {} records", records.len());
        Ok(records)
    }

    fn create(&mut self, record: &NewRecord) -> Result<Record> {
        let response = self
            .client
            .post(self.url("/massas/"))
            .json(record)
            .send()
            .context("Failed to reach record API")?;
        Self::read(response)
    }

    fn update(&mut self, id: RecordId, update: &RecordUpdate) -> Result<Record> {
        debug!("PUT /massas/{}", id);
        let response = self
            .client
            .put(self.url(&format!("/massas/{}", id)))
            .json(&update.to_json())
            .send()
            .context("Failed to reach record API")?;
        Self::read(response)
    }

    fn delete(&mut self, id: RecordId) -> Result<()> {
        debug!("DELETE /massas/{}", id);
        let response = self
            .client
            .delete(self.url(&format!("/massas/{}", id)))
            .send()
            .context("Failed to reach record API")?;
        Self::check(response)?;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<String> {
        let response = self
            .client
            .delete(self.url("/massas/all"))
            .send()
            .context("Failed to reach record API")?;
        let body: MessageResponse = Self::read(response)?;
        Ok(body.message)
    }

    fn bulk_import(&mut self, records: &[NewRecord]) -> Result<String> {
        info!("Uploading {} records", records.len());
        let response = self
            .client
            .post(self.url("/massas/upload-csv"))
            .json(records)
            .send()
            .context("Failed to reach record API")?;
        let body: MessageResponse = Self::read(response)?;
        Ok(body.message)
    }
}

impl SettingsStore for ApiClient {
    fn get_settings(&mut self) -> Result<DisplaySettings> {
        let response = self
            .client
            .get(self.url("/settings"))
            .send()
            .context("Failed to reach settings API")?;
        Self::read(response)
    }

    fn set_settings(&mut self, settings: &DisplaySettings) -> Result<DisplaySettings> {
        let response = self
            .client
            .post(self.url("/settings"))
            .json(settings)
            .send()
            .context("Failed to reach settings API")?;
        Self::read(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/massas/"), "http://localhost:8000/massas/");
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        let mut client = ApiClient::new("http://127.0.0.1:9");
        let err = client.list_all().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to reach record API"));
    }
}
