//! Backup export and import.
//!
//! A backup file is the dataset document, pretty-printed. Import applies a
//! deliberately shallow check: the text must be a JSON object whose `cases`
//! field is an array. Individual cases are decoded field by field (missing or
//! off-type fields default) and elements that are not objects are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::case_model::{lenient, Dataset};
use crate::error::{DiaryError, ImportError};

pub const BACKUP_FILE_PREFIX: &str = "diary_backup_";
pub const BACKUP_FILE_EXTENSION: &str = "json";

/// Result of an export: the file to hand to the user plus the dataset with
/// its backup timestamp updated. The caller persists `dataset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupArtifact {
    pub file_name: String,
    pub contents: String,
    pub dataset: Dataset,
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!(
        "{BACKUP_FILE_PREFIX}{}.{BACKUP_FILE_EXTENSION}",
        date.format("%Y-%m-%d")
    )
}

/// Pretty-printed backup encoding of `dataset`, as-is.
pub fn serialize_dataset(dataset: &Dataset) -> Result<String, DiaryError> {
    Ok(serde_json::to_string_pretty(dataset)?)
}

pub fn export_backup(dataset: &Dataset, now: DateTime<Utc>) -> Result<BackupArtifact, DiaryError> {
    let mut stamped = dataset.clone();
    stamped.last_backup_date = Some(now);

    let contents = serialize_dataset(&stamped)?;
    let file_name = backup_file_name(now.date_naive());
    info!("Exported {} cases to {file_name}", stamped.cases.len());

    Ok(BackupArtifact {
        file_name,
        contents,
        dataset: stamped,
    })
}

/// Writes the artifact into `dir`, going through a temporary file so an
/// interrupted write never leaves a truncated backup behind.
pub fn write_backup_file(dir: &Path, artifact: &BackupArtifact) -> Result<PathBuf, DiaryError> {
    fs::create_dir_all(dir)?;

    let target = dir.join(&artifact.file_name);
    let staging = dir.join(format!("{}.tmp", artifact.file_name));
    fs::write(&staging, artifact.contents.as_bytes())?;
    fs::rename(&staging, &target)?;

    info!("Backup written to {}", target.display());
    Ok(target)
}

pub fn read_import_file(path: &Path) -> Result<String, DiaryError> {
    fs::read_to_string(path).map_err(|source| DiaryError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses backup text into a dataset.
///
/// Case entries decode field by field; only entries that are not objects are
/// dropped. Entries without an id get a fresh one.
/// An absent or non-string `advocateName` comes back empty, which the merge
/// treats as "keep the local name". An unreadable `lastBackupDate` comes back
/// as `None`.
pub fn parse_import(text: &str) -> Result<Dataset, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let Value::Object(mut root) = value else {
        return Err(ImportError::NotAnObject);
    };

    let items = match root.remove("cases") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ImportError::CasesNotArray),
        None => return Err(ImportError::MissingCases),
    };

    let total = items.len();
    let cases = lenient::decode_cases(items);

    let last_backup_date = root
        .remove("lastBackupDate")
        .and_then(|value| lenient::timestamp_of(&value));

    let advocate_name = match root.remove("advocateName") {
        Some(Value::String(name)) => name,
        _ => String::new(),
    };

    if cases.len() < total {
        warn!("Backup parsed with {} of {total} cases readable", cases.len());
    } else {
        info!("Backup parsed with {total} cases");
    }

    Ok(Dataset {
        cases,
        last_backup_date,
        advocate_name,
    })
}
