use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DiaryError;
use crate::reminder_gate::BACKUP_REMINDER_INTERVAL_MS;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("case_diary")
}

fn default_store_name() -> String {
    "case_diary".to_string()
}

fn default_map_size() -> usize {
    // Comfortably above a few hundred cases with long histories.
    16 * 1024 * 1024
}

fn default_reminder_interval_ms() -> i64 {
    BACKUP_REMINDER_INTERVAL_MS
}

/// Where and how the diary keeps its data.
///
/// Every field is optional in the JSON form; absent fields take their
/// defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiaryConfig {
    pub data_dir: PathBuf,
    pub store_name: String,
    pub map_size_bytes: usize,
    /// Directory backup files are written to; defaults to `<data_dir>/backups`.
    pub backup_dir: Option<PathBuf>,
    pub reminder_interval_ms: i64,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_name: default_store_name(),
            map_size_bytes: default_map_size(),
            backup_dir: None,
            reminder_interval_ms: default_reminder_interval_ms(),
        }
    }
}

impl DiaryConfig {
    /// Configuration rooted at `data_dir`, everything else default.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DiaryError> {
        let config: DiaryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DiaryError> {
        if self.store_name.trim().is_empty() {
            return Err(DiaryError::Config("storeName must not be empty".to_string()));
        }
        if self.store_name.contains(['/', '\\']) || self.store_name.contains("..") {
            return Err(DiaryError::Config(format!(
                "storeName must be a plain name: {}",
                self.store_name
            )));
        }
        if self.map_size_bytes == 0 {
            return Err(DiaryError::Config("mapSizeBytes must be positive".to_string()));
        }
        if self.reminder_interval_ms <= 0 {
            return Err(DiaryError::Config(
                "reminderIntervalMs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// LMDB environment directory.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.lmdb", self.store_name))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }
}
