use std::path::PathBuf;

use thiserror::Error;

/// Why a backup text was rejected by the import shape check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("backup top level is not an object")]
    NotAnObject,
    #[error("backup has no `cases` field")]
    MissingCases,
    #[error("backup `cases` field is not an array")]
    CasesNotArray,
}

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("storage error: {0}")]
    Store(#[from] lmdb::Error),
    #[error("stored data is corrupt: {0}")]
    StoreCorrupt(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("import rejected: {0}")]
    ImportParse(#[from] ImportError),
    #[error("could not read import file {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no case with id {0}")]
    CaseNotFound(String),
    #[error("duplicate case id {0}")]
    DuplicateCaseId(String),
    #[error("no import is staged")]
    NothingStaged,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("validation error: {0}")]
    Validation(String),
}
