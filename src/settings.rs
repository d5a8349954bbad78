use crate::errors::{AppError, AppResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DASHBOARD_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "DASHBOARD_LOG";
pub const LOG_JSON_ENV: &str = "DASHBOARD_LOG_JSON";

/// Process-level settings read once at startup. Per-store preferences live in
/// `AppSettings` inside the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ServiceSettings {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
    pub json_logs: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_file: "clients.db".to_string(),
            log_dir: None,
            log_filter: "info".to_string(),
            json_logs: true,
        }
    }
}

impl ServiceSettings {
    /// Reads `path` if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(raw)?;
        if settings.database_file.trim().is_empty() {
            return Err(AppError::Validation("database_file must not be empty".to_string()));
        }
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|value| !value.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|value| !value.trim().is_empty()) {
            self.log_filter = filter;
        }
        if let Some(raw) = lookup(LOG_JSON_ENV) {
            self.json_logs = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}
