use std::collections::HashSet;

use serde::Serialize;

use crate::case_model::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub dataset: Dataset,
    /// Incoming cases appended to the diary.
    pub added: usize,
    /// Incoming cases dropped because their id was already present.
    pub skipped: usize,
}

/// Folds `incoming` into `current` by case id.
///
/// Existing cases always win: an incoming case whose id is already present
/// (locally, or earlier in the same import) is dropped whole. A non-empty
/// incoming advocate name replaces the local one; `lastBackupDate` keeps the
/// local value.
pub fn merge_datasets(current: &Dataset, incoming: &Dataset) -> MergeOutcome {
    let mut dataset = current.clone();
    let mut known: HashSet<String> = dataset.cases.iter().map(|case| case.id.clone()).collect();

    let mut added = 0;
    let mut skipped = 0;
    for case in &incoming.cases {
        if known.insert(case.id.clone()) {
            dataset.cases.push(case.clone());
            added += 1;
        } else {
            skipped += 1;
        }
    }

    if !incoming.advocate_name.is_empty() {
        dataset.advocate_name = incoming.advocate_name.clone();
    }

    MergeOutcome {
        dataset,
        added,
        skipped,
    }
}
