//! Error types for cadence-core operations.
//!
//! Snapshot storage failures never show up here: the store logs them and
//! degrades to "no snapshot". What remains are validation failures the caller
//! must surface, and collaborator rejections it must handle.

use std::path::PathBuf;

use cadence_session_protocol::SessionRecord;

// ═══════════════════════════════════════════════════════════════════════════════
// Session Errors (state machine operations)
// ═══════════════════════════════════════════════════════════════════════════════

/// Rejections from the session state machine.
///
/// Every variant except `RecordRejected` leaves the runtime state untouched.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Add at least one task before starting this routine")]
    NoTasks,

    #[error("A session is already in progress for routine {0}")]
    AlreadyStarted(String),

    #[error("No session has been started for routine {0}")]
    NotStarted(String),

    #[error("No task is currently active")]
    NoActiveTask,

    #[error("Already at the first task")]
    CannotGoBack,

    #[error("No restorable snapshot for routine {0}")]
    NoSnapshot(String),

    /// The session was finished and reset locally, but the collaborator did
    /// not accept the record. The record is returned so the caller can retry.
    #[error("Session record {} was not saved: {reason}", record.id)]
    RecordRejected {
        record: Box<SessionRecord>,
        reason: String,
    },

    #[error("Routine {routine_id} could not be deleted: {reason}")]
    DeleteRejected { routine_id: String, reason: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// General Errors (configuration, routine files, history)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Routine Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Routine file invalid: {path}: {details}")]
    RoutineInvalid { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl CadenceError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CadenceError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using CadenceError.
pub type Result<T> = std::result::Result<T, CadenceError>;
