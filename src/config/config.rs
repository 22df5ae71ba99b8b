use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::csv_import::{ImportOptions, DEFAULT_FALLBACK_REGION};
use crate::data::pagination::{normalize_page_size, DEFAULT_PAGE_SIZE};
use crate::data::record::DocumentType;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "TDM_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the record API
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows per page; one of 10, 25, 50, 100
    pub page_size: usize,

    /// Colour status badges and notices in the terminal
    pub use_colors: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Region used when the file has no region column
    pub fallback_region: String,

    /// Document type used when the file has no type column
    pub default_document_type: DocumentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG wins when set
    pub level: String,

    /// Mirror log lines to stderr
    pub log_to_stderr: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            use_colors: true,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            fallback_region: DEFAULT_FALLBACK_REGION.to_string(),
            default_document_type: DocumentType::Cpf,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_stderr: false,
        }
    }
}

impl ImportConfig {
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            fallback_region: self.fallback_region.clone(),
            default_document_type: self.default_document_type,
        }
    }
}

impl Config {
    /// Load config from the default location; a missing file gives defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.display.page_size = normalize_page_size(config.display.page_size);
        Ok(config)
    }

    fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("tdm").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# TDM Configuration File
# Location: ~/.config/tdm/config.toml (Linux)
#           ~/Library/Application Support/tdm/config.toml (macOS)
#           %APPDATA%\tdm\config.toml (Windows)

[api]
# Base URL of the record API (overridden by TDM_API_URL)
base_url = "http://localhost:8000"

[display]
# Rows per page: 10, 25, 50 or 100
page_size = 25

# Colour status badges and notices
use_colors = true

[import]
# Region assigned to rows of files without a region column
fallback_region = "Brasília"

# Document type for files without a type column: "CPF" or "CNPJ"
default_document_type = "CPF"

[logging]
# Log filter, e.g. "info" or "tdm=debug" (RUST_LOG takes precedence)
level = "info"

# Also print log lines to stderr
log_to_stderr = false
"#
        .to_string()
    }
}
