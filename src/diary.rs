//! The handle a UI layer holds on to.
//!
//! [`Diary`] owns the store, the live dataset, the backup reminder and the
//! pending import. Every mutation is applied to a copy, written through the
//! store, and only then adopted, so the in-memory dataset never runs ahead of
//! what is persisted.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use log::info;

use crate::backup_codec::{self, BackupArtifact};
use crate::case_model::{Case, CaseDraft, Dataset, DEFAULT_ADVOCATE_NAME};
use crate::config::DiaryConfig;
use crate::diary_store::DiaryStore;
use crate::error::DiaryError;
use crate::import_stage::ImportStage;
use crate::merge::MergeOutcome;
use crate::reminder_gate::ReminderGate;

pub struct Diary {
    config: DiaryConfig,
    store: DiaryStore,
    dataset: Dataset,
    reminder: ReminderGate,
    import: ImportStage,
}

impl Diary {
    pub fn open(config: DiaryConfig) -> Result<Self, DiaryError> {
        let store = DiaryStore::open(&config)?;
        let dataset = store.load();
        let reminder = ReminderGate::from_stamp(store.load_reminder_stamp())
            .with_interval(Duration::milliseconds(config.reminder_interval_ms));

        info!(
            "Diary opened at {} with {} cases",
            store.path().display(),
            dataset.cases.len()
        );

        Ok(Self {
            config,
            store,
            dataset,
            reminder,
            import: ImportStage::Idle,
        })
    }

    pub fn config(&self) -> &DiaryConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn case(&self, id: &str) -> Option<&Case> {
        self.dataset.find_case(id)
    }

    /// Cases ordered by next hearing, soonest first; undated cases last.
    pub fn cases_by_next_hearing(&self) -> Vec<&Case> {
        let mut cases: Vec<&Case> = self.dataset.cases.iter().collect();
        cases.sort_by(|a, b| {
            let (a_date, b_date) = (a.next_hearing(), b.next_hearing());
            a_date
                .is_none()
                .cmp(&b_date.is_none())
                .then(a_date.cmp(&b_date))
                .then_with(|| a.title.cmp(&b.title))
        });
        cases
    }

    pub fn import_stage(&self) -> &ImportStage {
        &self.import
    }

    /// Creates a case, or updates the case whose id the draft carries.
    pub fn save_case(&mut self, draft: CaseDraft, now: DateTime<Utc>) -> Result<Case, DiaryError> {
        let mut next = self.dataset.clone();

        let position = draft
            .id
            .as_deref()
            .and_then(|id| next.cases.iter().position(|case| case.id == id));
        let saved = match position {
            Some(index) => {
                let case = &mut next.cases[index];
                if let Some(hearing) = case.apply_draft(draft) {
                    info!("Case {} rescheduled from {}", case.id, hearing.date);
                }
                case.clone()
            }
            None => {
                let case = Case::from_draft(draft, now);
                next.cases.push(case.clone());
                case
            }
        };

        self.commit(next)?;
        Ok(saved)
    }

    pub fn delete_case(&mut self, id: &str) -> Result<Case, DiaryError> {
        let mut next = self.dataset.clone();
        let index = next
            .cases
            .iter()
            .position(|case| case.id == id)
            .ok_or_else(|| DiaryError::CaseNotFound(id.to_string()))?;
        let removed = next.cases.remove(index);

        self.commit(next)?;
        Ok(removed)
    }

    /// Sets the owner name; a blank name restores the default.
    pub fn set_advocate_name(&mut self, name: &str) -> Result<(), DiaryError> {
        let name = name.trim();
        let mut next = self.dataset.clone();
        next.advocate_name = if name.is_empty() {
            DEFAULT_ADVOCATE_NAME.to_string()
        } else {
            name.to_string()
        };
        self.commit(next)
    }

    /// Replaces the whole dataset after checking id uniqueness.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> Result<(), DiaryError> {
        dataset.validate()?;
        self.commit(dataset)
    }

    /// Produces backup bytes and records the backup time in the diary.
    pub fn export_backup(&mut self, now: DateTime<Utc>) -> Result<BackupArtifact, DiaryError> {
        let artifact = backup_codec::export_backup(&self.dataset, now)?;
        self.commit(artifact.dataset.clone())?;
        Ok(artifact)
    }

    /// Exports into `dir`. The backup time is only recorded once the file
    /// is on disk.
    pub fn export_backup_to(&mut self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, DiaryError> {
        let artifact = backup_codec::export_backup(&self.dataset, now)?;
        let path = backup_codec::write_backup_file(dir, &artifact)?;
        self.commit(artifact.dataset)?;
        Ok(path)
    }

    pub fn stage_import(&mut self, text: &str) -> Result<&Dataset, DiaryError> {
        self.import.stage(text)
    }

    pub fn stage_import_file(&mut self, path: &Path) -> Result<&Dataset, DiaryError> {
        let text = backup_codec::read_import_file(path)?;
        self.import.stage(&text)
    }

    /// Merges the staged import into the diary and persists the result.
    pub fn confirm_import(&mut self) -> Result<MergeOutcome, DiaryError> {
        let mut stage = self.import.clone();
        let outcome = stage.confirm(&self.dataset)?;
        self.commit(outcome.dataset.clone())?;
        self.import = stage;

        info!(
            "Import merged: {} added, {} already present",
            outcome.added, outcome.skipped
        );
        Ok(outcome)
    }

    pub fn discard_import(&mut self) -> Result<(), DiaryError> {
        self.import.discard()
    }

    pub fn should_prompt_backup(&self) -> bool {
        self.reminder.should_prompt()
    }

    pub fn should_prompt_backup_at(&self, now: DateTime<Utc>) -> bool {
        self.reminder.should_prompt_at(now)
    }

    pub fn mark_backup_prompted(&mut self) -> Result<(), DiaryError> {
        self.mark_backup_prompted_at(Utc::now())
    }

    pub fn mark_backup_prompted_at(&mut self, now: DateTime<Utc>) -> Result<(), DiaryError> {
        let mut gate = self.reminder;
        gate.mark_prompted_at(now);
        self.store.save_reminder_stamp(gate.to_stamp())?;
        self.reminder = gate;
        Ok(())
    }

    /// Erases every case, the backup metadata and the reminder timestamp.
    pub fn purge(&mut self) -> Result<(), DiaryError> {
        self.dataset = self.store.purge()?;
        self.reminder.clear();
        self.import.reset();
        Ok(())
    }

    pub fn close(self) {
        info!("Diary at {} closed", self.store.path().display());
    }

    fn commit(&mut self, next: Dataset) -> Result<(), DiaryError> {
        self.store.save(&next)?;
        self.dataset = next;
        Ok(())
    }
}
