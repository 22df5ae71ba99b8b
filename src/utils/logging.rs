use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use crate::config::config::LoggingConfig;
use crate::utils::app_paths::AppPaths;

/// Writer that timestamps each formatted line into the log file and,
/// optionally, echoes it to stderr
#[derive(Clone)]
pub struct FileLogWriter {
    file: Arc<Mutex<File>>,
    mirror_stderr: bool,
}

impl FileLogWriter {
    pub fn open(path: &Path, mirror_stderr: bool) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            mirror_stderr,
        })
    }
}

impl Write for FileLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let message = String::from_utf8_lossy(buf);
        let message = message.trim_end();
        if message.is_empty() {
            return Ok(buf.len());
        }

        let line = format!("[{}] {}\n", Local::now().format("%H:%M:%S%.3f"), message);
        if let Ok(mut file) = self.file.lock() {
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }
        if self.mirror_stderr {
            eprint!("{}", line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut file) = self.file.lock() {
            file.flush()?;
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for FileLogWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Timestamped log file name inside `dir`
pub fn log_file_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("tdm_{}.log", timestamp))
}

/// Install the global tracing subscriber writing to a fresh log file.
///
/// `RUST_LOG` overrides the configured level. Returns the log file path.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) -> Result<PathBuf> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_path = log_file_path(&AppPaths::log_dir()?);
    let writer = FileLogWriter::open(&log_path, verbose || config.log_to_stderr)?;

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time() // the writer adds its own timestamps
        .compact();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(target: "tdm", "Logging to {}", log_path.display());
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_timestamps_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let mut writer = FileLogWriter::open(&path, false).unwrap();
        writer.write_all(b" INFO tdm: hello\n").unwrap();
        writer.write_all(b"\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("INFO tdm: hello"));
    }

    #[test]
    fn test_log_file_path() {
        let path = log_file_path(Path::new("/tmp/logs"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tdm_"));
        assert!(name.ends_with(".log"));
    }
}
