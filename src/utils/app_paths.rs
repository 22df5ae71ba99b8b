use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

pub struct AppPaths;

impl AppPaths {
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Cannot determine data directory"))?
            .join("tdm");

        fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_dir() -> Result<PathBuf> {
        let log_dir = Self::data_dir()?.join("logs");
        fs::create_dir_all(&log_dir)?;
        Ok(log_dir)
    }

    /// Settings file used when running without the API
    pub fn settings_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("settings.json"))
    }

    /// Record file used when running without the API
    pub fn records_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("massas.json"))
    }

    /// Default destination for exports: the download dir, else the cwd
    pub fn export_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}
