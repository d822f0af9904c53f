//! Typed configuration from environment variables.
//!
//! Loads once at startup. Everything has a sane default: data lands in the
//! platform data directory unless `WORKPAD_DATA_DIR` points elsewhere.

use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database and anything else we write.
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("WORKPAD_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        Ok(Self {
            data_dir,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("workpad.db")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| {
        Error::Config("no platform data directory; set WORKPAD_DATA_DIR".to_string())
    })?;
    Ok(base.join("workpad"))
}
