//! Record schema for the case diary.
//!
//! These types are the canonical shape of everything the diary persists and
//! everything a backup file contains. Field names are serialized in camelCase
//! so the stored blob, the backup file and the JSON handed across the FFI
//! boundary are the same document:
//!
//! ```json
//! {
//!   "cases": [
//!     {
//!       "id": "6f1c...",
//!       "title": "State v. Rao",
//!       "referenceNumber": "CRL 112/2024",
//!       "courtName": "District Court, Pune",
//!       "description": "",
//!       "status": "Ongoing",
//!       "nextHearingDate": "2024-02-15",
//!       "history": [ { "id": "a9e0...", "date": "2024-01-10", "note": "" } ],
//!       "createdAt": "2024-01-02T09:30:00Z"
//!     }
//!   ],
//!   "lastBackupDate": null,
//!   "advocateName": "Counsel"
//! }
//! ```
//!
//! Decoding is lenient per field, so documents written by older or newer
//! builds (or edited by hand) still decode: missing keys fall back to empty
//! values, unknown keys are ignored, numeric ids become strings, unknown
//! statuses are kept verbatim and case entries without an id get a fresh
//! one. Only entries that are not objects at all are dropped. The format
//! grows additively and carries no version field.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DiaryError;

/// Owner name used until the advocate sets one.
pub const DEFAULT_ADVOCATE_NAME: &str = "Counsel";

/// One entry in a case's reschedule log.
///
/// Hearings are appended when a case's next hearing date moves and are never
/// edited or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hearing {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// ISO calendar date (`YYYY-MM-DD`) the hearing was scheduled for.
    #[serde(deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub note: String,
}

/// Serialized as its label. Labels this build does not know are carried in
/// `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CaseStatus {
    #[default]
    Ongoing,
    Disposed,
    Stayed,
    Appealed,
    Dismissed,
    Other(String),
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        Self::Ongoing,
        Self::Disposed,
        Self::Stayed,
        Self::Appealed,
        Self::Dismissed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Disposed => "Disposed",
            Self::Stayed => "Stayed",
            Self::Appealed => "Appealed",
            Self::Dismissed => "Dismissed",
            Self::Other(label) => label,
        }
    }

    /// Maps a stored label to a status; an empty label means the default.
    pub fn from_label(label: String) -> Self {
        if label.trim().is_empty() {
            return Self::default();
        }
        let known = Self::ALL.into_iter().find(|status| status.as_str() == label);
        known.unwrap_or(Self::Other(label))
    }

    /// Whether the matter still needs hearings scheduled. Unknown statuses
    /// count as active so they stay in view.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disposed | Self::Dismissed)
    }
}

impl Serialize for CaseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CaseStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(label) => Self::from_label(label),
            _ => Self::default(),
        })
    }
}

impl Display for CaseStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DiaryError::Validation(format!("Unknown case status: {s}")))
    }
}

/// A tracked legal matter.
///
/// `id` is the merge key and never changes after creation. `history` is an
/// append-only log in reschedule order, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Case {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub reference_number: String,
    #[serde(deserialize_with = "lenient::text")]
    pub court_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    pub status: CaseStatus,
    /// ISO date, or empty while the next hearing is to be determined.
    #[serde(deserialize_with = "lenient::text")]
    pub next_hearing_date: String,
    #[serde(deserialize_with = "lenient::history")]
    pub history: Vec<Hearing>,
    #[serde(deserialize_with = "lenient::created_at")]
    pub created_at: DateTime<Utc>,
}

/// The editable part of a case, as submitted by the case form.
///
/// A draft without an `id` creates a new case; a draft with one updates the
/// case carrying that id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseDraft {
    pub id: Option<String>,
    pub title: String,
    pub reference_number: String,
    pub court_name: String,
    pub description: String,
    pub status: CaseStatus,
    pub next_hearing_date: String,
    /// Annotation recorded on the hearing entry when this edit reschedules.
    pub hearing_note: Option<String>,
}

impl Case {
    pub fn from_draft(draft: CaseDraft, now: DateTime<Utc>) -> Self {
        let id = draft
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            id,
            title: draft.title,
            reference_number: draft.reference_number,
            court_name: draft.court_name,
            description: draft.description,
            status: draft.status,
            next_hearing_date: draft.next_hearing_date.trim().to_string(),
            history: Vec::new(),
            created_at: now,
        }
    }

    /// Applies an edit in place, logging a reschedule when the next hearing
    /// date moves away from a previously set date.
    ///
    /// Returns the hearing that was appended, if any.
    pub fn apply_draft(&mut self, draft: CaseDraft) -> Option<Hearing> {
        let next_date = draft.next_hearing_date.trim().to_string();
        let previous = std::mem::take(&mut self.next_hearing_date);

        let appended = if !previous.is_empty() && previous != next_date {
            let hearing = Hearing {
                id: Uuid::new_v4().to_string(),
                date: previous,
                note: draft.hearing_note.unwrap_or_default(),
            };
            self.history.push(hearing.clone());
            Some(hearing)
        } else {
            None
        };

        self.title = draft.title;
        self.reference_number = draft.reference_number;
        self.court_name = draft.court_name;
        self.description = draft.description;
        self.status = draft.status;
        self.next_hearing_date = next_date;

        appended
    }

    /// Parsed next hearing date; `None` while it is to be determined.
    pub fn next_hearing(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.next_hearing_date, "%Y-%m-%d").ok()
    }
}

/// The single persisted root of the diary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, deserialize_with = "lenient::cases")]
    pub cases: Vec<Case>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub last_backup_date: Option<DateTime<Utc>>,
    #[serde(
        default = "default_advocate_name",
        deserialize_with = "lenient::advocate_name"
    )]
    pub advocate_name: String,
}

fn default_advocate_name() -> String {
    DEFAULT_ADVOCATE_NAME.to_string()
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            cases: Vec::new(),
            last_backup_date: None,
            advocate_name: default_advocate_name(),
        }
    }
}

impl Dataset {
    pub fn find_case(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|case| case.id == id)
    }

    /// Checks the id uniqueness invariant.
    pub fn validate(&self) -> Result<(), DiaryError> {
        let mut seen = HashSet::with_capacity(self.cases.len());
        for case in &self.cases {
            if !seen.insert(case.id.as_str()) {
                return Err(DiaryError::DuplicateCaseId(case.id.clone()));
            }
        }
        Ok(())
    }
}

/// Per-field decoders that coerce off-schema values instead of failing.
pub(crate) mod lenient {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use log::{info, warn};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use uuid::Uuid;

    use super::{default_advocate_name, Case, Hearing};

    fn text_of(value: Value) -> String {
        match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => String::new(),
        }
    }

    /// RFC 3339 timestamps, bare `YYYY-MM-DD` dates (midnight UTC) and epoch
    /// milliseconds.
    pub(crate) fn timestamp_of(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(raw) => {
                let raw = raw.trim();
                raw.parse::<DateTime<Utc>>().ok().or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .map(|midnight| Utc.from_utc_datetime(&midnight))
                })
            }
            Value::Number(number) => number
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }
    }

    /// Decodes case entries, dropping only entries that are not cases at all
    /// and giving id-less cases a fresh id.
    pub(crate) fn decode_cases(items: Vec<Value>) -> Vec<Case> {
        items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Case>(item) {
                Ok(mut case) => {
                    if case.id.trim().is_empty() {
                        case.id = Uuid::new_v4().to_string();
                        info!("Case #{index} had no id; assigned {}", case.id);
                    }
                    Some(case)
                }
                Err(e) => {
                    warn!("Skipping case entry #{index}: {e}");
                    None
                }
            })
            .collect()
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(text_of(Value::deserialize(deserializer)?))
    }

    pub fn created_at<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(timestamp_of(&value).unwrap_or_else(|| {
            warn!("Unreadable createdAt {value}; using the epoch");
            DateTime::<Utc>::default()
        }))
    }

    pub fn optional_timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(timestamp_of(&Value::deserialize(deserializer)?))
    }

    pub fn history<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Hearing>, D::Error> {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Hearing>(item) {
                Ok(hearing) => Some(hearing),
                Err(e) => {
                    warn!("Skipping unreadable hearing entry: {e}");
                    None
                }
            })
            .collect())
    }

    pub fn cases<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Case>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => decode_cases(items),
            _ => Vec::new(),
        })
    }

    pub fn advocate_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(name) => name,
            _ => default_advocate_name(),
        })
    }
}
