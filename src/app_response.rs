use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::DiaryError;

/// Envelope returned to the UI collaborator by every FFI call.
#[derive(Debug, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    ImportRejected(String),
    FileReadError(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::ImportRejected(msg) => write!(f, "Import rejected: {}", msg),
            AppResponse::FileReadError(msg) => write!(f, "File read error: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<DiaryError> for AppResponse {
    fn from(err: DiaryError) -> Self {
        match err {
            DiaryError::Store(lmdb::Error::Corrupted) =>
                AppResponse::DatabaseError("Database is corrupted".to_string()),
            DiaryError::Store(e) => AppResponse::DatabaseError(format!("LMDB error: {e}")),
            DiaryError::StoreCorrupt(msg) => AppResponse::DatabaseError(format!("Corrupt store: {msg}")),
            DiaryError::Io(e) => AppResponse::DatabaseError(format!("IO error: {e}")),
            DiaryError::Serialization(e) => AppResponse::from(e),
            DiaryError::ImportParse(e) => AppResponse::ImportRejected(e.to_string()),
            err @ DiaryError::FileRead { .. } => AppResponse::FileReadError(err.to_string()),
            DiaryError::CaseNotFound(id) => AppResponse::NotFound(format!("No case found with id: {id}")),
            err @ (DiaryError::DuplicateCaseId(_) | DiaryError::Validation(_)) =>
                AppResponse::ValidationError(err.to_string()),
            DiaryError::NothingStaged => AppResponse::BadRequest("No import is staged".to_string()),
            DiaryError::Config(msg) => AppResponse::BadRequest(format!("Invalid configuration: {msg}")),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// Serializes `value` into an `Ok` envelope.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => AppResponse::Ok(json),
            Err(e) => AppResponse::from(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }
}
