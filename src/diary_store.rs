//! LMDB-backed store adapter.
//!
//! The diary lives in a single LMDB named database holding two slots:
//!
//! - [`DATASET_KEY`]: the whole [`Dataset`] serialized as JSON. Every save
//!   replaces the full document in one write transaction.
//! - [`REMINDER_KEY`]: the backup reminder's last-prompted timestamp, as an
//!   epoch-millisecond integer string. It is not part of the dataset.
//!
//! Reads of the dataset never fail: a missing slot yields a fresh diary and a
//! slot that cannot be decoded is reported through `log` and replaced by a
//! fresh diary in memory.

use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::case_model::Dataset;
use crate::config::DiaryConfig;
use crate::error::DiaryError;

const DB_NAME: &str = "case_diary";

pub const DATASET_KEY: &str = "case_diary_data";
pub const REMINDER_KEY: &str = "backup_reminder_last_prompted";

pub struct DiaryStore {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl DiaryStore {
    /// Opens (creating if needed) the LMDB environment described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DiaryError::Config`] for an invalid configuration, and
    /// [`DiaryError::Io`] / [`DiaryError::Store`] when the directory or the
    /// environment cannot be created.
    pub fn open(config: &DiaryConfig) -> Result<Self, DiaryError> {
        config.validate()?;

        let path = config.store_path();
        if path.exists() {
            info!("Opening existing diary store at: {}", path.display());
        } else {
            info!("Creating new diary store at: {}", path.display());
            std::fs::create_dir_all(&path)?;
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(config.map_size_bytes)
            .open(&path)?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted dataset, falling back to a fresh one.
    pub fn load(&self) -> Dataset {
        let blob = match self.read_slot(DATASET_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("No diary stored yet; starting with an empty diary");
                return Dataset::default();
            }
            Err(e) => {
                warn!("Could not read diary store at {}: {e}", self.path.display());
                return Dataset::default();
            }
        };

        match serde_json::from_str::<Dataset>(&blob) {
            Ok(dataset) => {
                debug!("Loaded diary with {} cases", dataset.cases.len());
                dataset
            }
            Err(e) => {
                warn!("Stored diary is corrupt, starting with an empty diary: {e}");
                Dataset::default()
            }
        }
    }

    /// Writes the whole dataset, replacing whatever was stored before.
    pub fn save(&self, dataset: &Dataset) -> Result<(), DiaryError> {
        let json = serde_json::to_string(dataset)?;
        self.write_slot(DATASET_KEY, &json)?;
        debug!("Saved diary with {} cases", dataset.cases.len());
        Ok(())
    }

    /// Last time the backup reminder was shown, in epoch milliseconds.
    pub fn load_reminder_stamp(&self) -> Option<i64> {
        match self.read_slot(REMINDER_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(stamp) => Some(stamp),
                Err(e) => {
                    warn!("Ignoring unreadable reminder timestamp {raw:?}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read reminder timestamp: {e}");
                None
            }
        }
    }

    pub fn save_reminder_stamp(&self, stamp: Option<i64>) -> Result<(), DiaryError> {
        match stamp {
            Some(stamp) => self.write_slot(REMINDER_KEY, &stamp.to_string()),
            None => self.delete_slot(REMINDER_KEY),
        }
    }

    /// Wipes both slots and stores a fresh dataset in a single transaction.
    pub fn purge(&self) -> Result<Dataset, DiaryError> {
        let fresh = Dataset::default();
        let json = serde_json::to_string(&fresh)?;

        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.put(self.db, &DATASET_KEY, &json, WriteFlags::empty())?;
        txn.commit()?;

        info!("Diary store purged");
        Ok(fresh)
    }

    pub(crate) fn read_slot(&self, key: &str) -> Result<Option<String>, DiaryError> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Some(text.to_string()),
                Err(e) => return Err(DiaryError::StoreCorrupt(format!("slot {key} is not UTF-8: {e}"))),
            },
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(value)
    }

    pub(crate) fn write_slot(&self, key: &str, value: impl AsRef<[u8]>) -> Result<(), DiaryError> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value.as_ref(), WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    fn delete_slot(&self, key: &str) -> Result<(), DiaryError> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }
}
