//! Two-step import: a parsed backup waits in [`ImportStage::Staged`] until the
//! user confirms (merge) or declines (discard). Nothing touches the live
//! dataset before confirmation.

use log::info;

use crate::backup_codec::parse_import;
use crate::case_model::Dataset;
use crate::error::DiaryError;
use crate::merge::{merge_datasets, MergeOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImportStage {
    #[default]
    Idle,
    Staged(Dataset),
    Merged { added: usize, skipped: usize },
    Discarded,
}

impl ImportStage {
    /// Parses `text` and stages the result, replacing any earlier staged
    /// import. A rejected text leaves the stage as it was.
    pub fn stage(&mut self, text: &str) -> Result<&Dataset, DiaryError> {
        let parsed = parse_import(text)?;
        info!("Import staged with {} cases awaiting confirmation", parsed.cases.len());
        *self = ImportStage::Staged(parsed);
        self.staged().ok_or(DiaryError::NothingStaged)
    }

    pub fn staged(&self) -> Option<&Dataset> {
        match self {
            ImportStage::Staged(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn is_staged(&self) -> bool {
        self.staged().is_some()
    }

    /// Merges the staged dataset into `current` and moves to `Merged`.
    pub fn confirm(&mut self, current: &Dataset) -> Result<MergeOutcome, DiaryError> {
        let incoming = match std::mem::take(self) {
            ImportStage::Staged(dataset) => dataset,
            other => {
                *self = other;
                return Err(DiaryError::NothingStaged);
            }
        };

        let outcome = merge_datasets(current, &incoming);
        *self = ImportStage::Merged {
            added: outcome.added,
            skipped: outcome.skipped,
        };
        Ok(outcome)
    }

    /// Drops the staged dataset and moves to `Discarded`.
    pub fn discard(&mut self) -> Result<(), DiaryError> {
        if !self.is_staged() {
            return Err(DiaryError::NothingStaged);
        }
        info!("Staged import discarded");
        *self = ImportStage::Discarded;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = ImportStage::Idle;
    }
}
