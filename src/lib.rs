//! # Case Diary Core
//!
//! Persistence and backup core for a single-user legal case diary. A UI layer
//! (Flutter, a native shell, or a Rust frontend) owns rendering and user
//! confirmation flows and calls into this crate for everything that touches
//! stored data. Storage is a local LMDB environment holding the whole diary
//! as one JSON document.
//!
//! ## What lives here
//!
//! - **Record schema** ([`case_model`]): cases, their hearing history and the
//!   dataset root, in the same camelCase JSON shape everywhere
//! - **Store adapter** ([`diary_store`]): whole-document load/save with a
//!   corrupt-store fallback to an empty diary
//! - **Backup codec** ([`backup_codec`]): pretty-printed export and a shallow,
//!   explicit import check
//! - **Merge engine** ([`merge`]): id-keyed, local-wins union of an import
//! - **Import stage** ([`import_stage`]): parse, then confirm or discard
//! - **Reminder gate** ([`reminder_gate`]): at most one backup nudge per day
//!
//! ## Quick Start
//!
//! ```no_run
//! use case_diary_core::{CaseDraft, Diary, DiaryConfig};
//! use chrono::Utc;
//!
//! let mut diary = Diary::open(DiaryConfig::in_dir("/tmp/diary"))?;
//! diary.save_case(
//!     CaseDraft {
//!         title: "State v. Rao".to_string(),
//!         next_hearing_date: "2024-02-15".to_string(),
//!         ..CaseDraft::default()
//!     },
//!     Utc::now(),
//! )?;
//!
//! if diary.should_prompt_backup() {
//!     diary.mark_backup_prompted()?;
//! }
//! # Ok::<(), case_diary_core::DiaryError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON-encoded [`AppResponse`] as a C string that
//! must be released with [`free_response`]:
//!
//! - [`create_diary`] - Open the diary (returns a handle, not a response)
//! - [`load_dataset`] - Current dataset
//! - [`save_dataset`] - Replace the dataset wholesale
//! - [`save_case`] - Create or update one case
//! - [`delete_case`] - Delete one case by id
//! - [`set_advocate_name`] - Change the owner name
//! - [`export_backup`] - Write a backup file and stamp the backup time
//! - [`parse_import`] / [`stage_import_file`] - Stage an import for confirmation
//! - [`merge_imported`] / [`discard_import`] - Resolve the staged import
//! - [`should_prompt_backup`] / [`mark_backup_prompted`] - Backup reminder
//! - [`purge_diary`] - Erase everything
//! - [`close_diary`] - Release the handle

pub mod app_response;
pub mod backup_codec;
pub mod case_model;
pub mod config;
pub mod diary;
pub mod diary_store;
pub mod error;
pub mod import_stage;
pub mod merge;
pub mod reminder_gate;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

use chrono::Utc;
use log::{info, warn};

pub use crate::app_response::AppResponse;
pub use crate::case_model::{Case, CaseDraft, CaseStatus, Dataset, Hearing, DEFAULT_ADVOCATE_NAME};
pub use crate::config::DiaryConfig;
pub use crate::diary::Diary;
pub use crate::error::{DiaryError, ImportError};
pub use crate::merge::{merge_datasets, MergeOutcome};

/// Opens the diary and returns a handle for the other FFI calls.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`DiaryConfig`], or null for the
///   default configuration
///
/// # Returns
///
/// A pointer to the [`Diary`] on success, or a null pointer on failure. The
/// handle must be released with [`close_diary`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use case_diary_core::create_diary;
///
/// let config = CString::new(r#"{"dataDir":"/tmp/diary"}"#).unwrap();
/// let diary = create_diary(config.as_ptr());
/// assert!(!diary.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_diary(config_json: *const c_char) -> *mut Diary {
    let config = if config_json.is_null() {
        DiaryConfig::default()
    } else {
        let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid UTF-8 in config parameter: {e}");
                return std::ptr::null_mut();
            }
        };
        match DiaryConfig::from_json_str(json) {
            Ok(config) => config,
            Err(e) => {
                warn!("Rejected diary configuration: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    match Diary::open(config) {
        Ok(diary) => {
            info!("✅ Diary initialized successfully");
            Box::into_raw(Box::new(diary))
        }
        Err(e) => {
            warn!("❌ Failed to open diary: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Returns the current dataset as JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_dataset(diary: *mut Diary) -> *const c_char {
    let diary = match diary_ref(diary, "load_dataset") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    response_to_c_string(&AppResponse::json(diary.dataset()))
}

/// Replaces the whole dataset with the supplied JSON document.
///
/// The document must decode as a [`Dataset`] and its case ids must be
/// unique; otherwise nothing is written.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_dataset(diary: *mut Diary, json_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "save_dataset") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let dataset: Dataset = match serde_json::from_str(&json_str) {
        Ok(dataset) => dataset,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid dataset JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match diary.replace_dataset(dataset) {
        Ok(()) => response_to_c_string(&AppResponse::success("Dataset saved")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Creates or updates a case from a [`CaseDraft`] JSON document.
///
/// # JSON Format
///
/// ```json
/// {
///   "id": "existing id, or omitted for a new case",
///   "title": "State v. Rao",
///   "referenceNumber": "CRL 112/2024",
///   "courtName": "District Court",
///   "description": "",
///   "status": "Ongoing",
///   "nextHearingDate": "2024-02-15",
///   "hearingNote": "Adjourned at request of respondent"
/// }
/// ```
///
/// Returns the saved case. Moving `nextHearingDate` off a previously set
/// date appends that date to the case history.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_case(diary: *mut Diary, json_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "save_case") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let draft: CaseDraft = match serde_json::from_str(&json_str) {
        Ok(draft) => draft,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid case JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match diary.save_case(draft, Utc::now()) {
        Ok(case) => response_to_c_string(&AppResponse::json(&case)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes the case with the given id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_case(diary: *mut Diary, id: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "delete_case") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match diary.delete_case(&id_str) {
        Ok(_) => response_to_c_string(&AppResponse::success("Case deleted successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_advocate_name(diary: *mut Diary, name_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "set_advocate_name") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(error_ptr) => return error_ptr,
    };

    match diary.set_advocate_name(&name) {
        Ok(()) => response_to_c_string(&AppResponse::success(diary.dataset().advocate_name.clone())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Writes a backup file and records the backup time.
///
/// # Parameters
///
/// * `diary` - Diary handle
/// * `dir_ptr` - Target directory, or null for the configured backup directory
///
/// # Returns
///
/// `{"path": ..., "fileName": ..., "lastBackupDate": ...}` on success.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_backup(diary: *mut Diary, dir_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "export_backup") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let dir = if dir_ptr.is_null() {
        diary.config().backup_dir()
    } else {
        match c_ptr_to_string(dir_ptr, "directory") {
            Ok(dir) => Path::new(&dir).to_path_buf(),
            Err(error_ptr) => return error_ptr,
        }
    };

    match diary.export_backup_to(&dir, Utc::now()) {
        Ok(path) => {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let body = serde_json::json!({
                "path": path.display().to_string(),
                "fileName": file_name,
                "lastBackupDate": diary.dataset().last_backup_date,
            });
            response_to_c_string(&AppResponse::json(&body))
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Parses backup text and stages it for confirmation.
///
/// The live diary is not modified. On success the staged dataset is returned
/// so the UI can show what is about to be merged; the user then calls
/// [`merge_imported`] or [`discard_import`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn parse_import(diary: *mut Diary, text_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "parse_import") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let text = match c_ptr_to_string(text_ptr, "import text") {
        Ok(text) => text,
        Err(error_ptr) => return error_ptr,
    };

    match diary.stage_import(&text) {
        Ok(staged) => response_to_c_string(&AppResponse::json(staged)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Reads a backup file from disk and stages it, like [`parse_import`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn stage_import_file(diary: *mut Diary, path_ptr: *const c_char) -> *const c_char {
    let diary = match diary_mut(diary, "stage_import_file") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    let path = match c_ptr_to_string(path_ptr, "path") {
        Ok(path) => path,
        Err(error_ptr) => return error_ptr,
    };

    match diary.stage_import_file(Path::new(&path)) {
        Ok(staged) => response_to_c_string(&AppResponse::json(staged)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Merges the staged import into the diary.
///
/// Returns `{"dataset": ..., "added": n, "skipped": m}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn merge_imported(diary: *mut Diary) -> *const c_char {
    let diary = match diary_mut(diary, "merge_imported") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    match diary.confirm_import() {
        Ok(outcome) => response_to_c_string(&AppResponse::json(&outcome)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn discard_import(diary: *mut Diary) -> *const c_char {
    let diary = match diary_mut(diary, "discard_import") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    match diary.discard_import() {
        Ok(()) => response_to_c_string(&AppResponse::success("Import discarded")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Returns `Ok("true")` when the backup reminder should be shown.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn should_prompt_backup(diary: *mut Diary) -> *const c_char {
    let diary = match diary_ref(diary, "should_prompt_backup") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    response_to_c_string(&AppResponse::success(diary.should_prompt_backup().to_string()))
}

/// Records that the backup reminder was shown, whether or not the user
/// went on to export.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn mark_backup_prompted(diary: *mut Diary) -> *const c_char {
    let diary = match diary_mut(diary, "mark_backup_prompted") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    match diary.mark_backup_prompted() {
        Ok(()) => response_to_c_string(&AppResponse::success("Reminder recorded")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Erases all cases, backup metadata and the reminder timestamp.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn purge_diary(diary: *mut Diary) -> *const c_char {
    let diary = match diary_mut(diary, "purge_diary") {
        Ok(diary) => diary,
        Err(error_ptr) => return error_ptr,
    };

    match diary.purge() {
        Ok(()) => response_to_c_string(&AppResponse::json(diary.dataset())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Releases the diary handle. The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_diary(diary: *mut Diary) -> *const c_char {
    if diary.is_null() {
        let error = AppResponse::BadRequest("Null diary pointer passed to close_diary".to_string());
        return response_to_c_string(&error);
    }

    let diary = unsafe { Box::from_raw(diary) };
    diary.close();
    response_to_c_string(&AppResponse::success("Diary closed successfully"))
}

/// Frees a response string returned by any function in this crate.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Serializes a response into a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String, mapping null pointers and
/// invalid UTF-8 to a `BadRequest` response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn diary_ref<'a>(diary: *mut Diary, caller: &str) -> Result<&'a Diary, *const c_char> {
    match unsafe { diary.as_ref() } {
        Some(diary) => Ok(diary),
        None => {
            let error = AppResponse::BadRequest(format!("Null diary pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn diary_mut<'a>(diary: *mut Diary, caller: &str) -> Result<&'a mut Diary, *const c_char> {
    match unsafe { diary.as_mut() } {
        Some(diary) => Ok(diary),
        None => {
            let error = AppResponse::BadRequest(format!("Null diary pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}
