//! Persisted schema types for Cadence routine sessions.
//!
//! This crate is shared by the timer core and its hosts to prevent schema drift.
//! The snapshot layout is the only bit-exact contract the timer owns; everything
//! else (routines, finished records) is handed to external collaborators.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current snapshot schema version. Readers reject anything else.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routines (owned by the CRUD layer, read-only here)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub target_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Routine {
    pub fn total_target_seconds(&self) -> u64 {
        self.tasks.iter().map(|task| task.target_seconds).sum()
    }

    /// Structural checks only. An empty task list is valid here; starting a
    /// session on it is what fails.
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.id.trim().is_empty() {
            return Err(ErrorInfo::new("invalid_routine_id", "routine id is required"));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if task.id.trim().is_empty() {
                return Err(ErrorInfo::new("invalid_task_id", "task id is required"));
            }
            if !seen.insert(task.id.as_str()) {
                return Err(ErrorInfo::new(
                    "duplicate_task_id",
                    format!("task id {} appears more than once", task.id),
                ));
            }
            if task.target_seconds == 0 {
                return Err(ErrorInfo::new(
                    "invalid_target",
                    format!("task {} must have a positive target", task.id),
                ));
            }
        }

        Ok(())
    }
}

pub fn parse_routine(content: &str) -> Result<Routine, ErrorInfo> {
    let routine: Routine = serde_json::from_str(content)
        .map_err(|err| ErrorInfo::new("invalid_json", err.to_string()))?;
    routine.validate()?;
    Ok(routine)
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot (v1)
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk snapshot of an in-progress session, keyed by routine id.
///
/// `doneActuals` is sparse: skipped-over or not-yet-finished indices serialize
/// as `null`. `lastPauseTime` is only written while the session is paused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub running: bool,
    pub session_started: bool,
    pub current_index: Option<usize>,
    #[serde(default)]
    pub done_actuals: Vec<Option<u64>>,
    pub started_at: Option<String>,
    pub session_start_time: Option<i64>,
    pub task_start_time: Option<i64>,
    #[serde(default)]
    pub paused_duration: i64,
    #[serde(default)]
    pub task_paused_duration: i64,
    pub last_update_time: i64,
    pub routine_id: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pause_time: Option<i64>,
}

impl SessionSnapshot {
    pub fn is_supported_version(&self) -> bool {
        self.version == SNAPSHOT_VERSION
    }

    /// Age of the snapshot at `now_ms`, never negative.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_update_time).max(0)
    }

    /// Checks that the snapshot still describes a routine with `task_count`
    /// tasks. Routines edited between save and restore fail here.
    pub fn fits_routine(&self, task_count: usize) -> Result<(), ErrorInfo> {
        if let Some(index) = self.current_index {
            if index >= task_count {
                return Err(ErrorInfo::new(
                    "index_out_of_range",
                    format!("current index {} but routine has {} tasks", index, task_count),
                ));
            }
        }

        let limit = self.current_index.unwrap_or(task_count);
        if let Some(bad) = self
            .done_actuals
            .iter()
            .enumerate()
            .find(|(i, actual)| actual.is_some() && (*i > limit || *i >= task_count))
        {
            return Err(ErrorInfo::new(
                "actual_out_of_range",
                format!("actual recorded at index {} beyond current task", bad.0),
            ));
        }

        if self.current_index.is_some() && self.task_start_time.is_none() {
            return Err(ErrorInfo::new(
                "missing_task_start",
                "active task without a task start time",
            ));
        }

        Ok(())
    }
}

pub fn parse_snapshot(content: &str) -> Result<SessionSnapshot, ErrorInfo> {
    serde_json::from_str(content).map_err(|err| ErrorInfo::new("invalid_json", err.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Finished session record
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "routineId")]
    pub routine_id: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(rename = "startISO")]
    pub start_iso: String,
    #[serde(rename = "endISO")]
    pub end_iso: String,
    #[serde(rename = "targetSeconds")]
    pub target_seconds: u64,
    #[serde(rename = "actualSeconds")]
    pub actual_seconds: u64,
    #[serde(rename = "deltaSeconds")]
    pub delta_seconds: i64,
    #[serde(rename = "tasksCompleted")]
    pub tasks_completed: usize,
    #[serde(rename = "tasksTotal")]
    pub tasks_total: usize,
}

pub fn parse_record(content: &str) -> Result<SessionRecord, ErrorInfo> {
    serde_json::from_str(content).map_err(|err| ErrorInfo::new("invalid_json", err.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Timestamp helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Formats epoch milliseconds as RFC 3339 with millisecond precision.
pub fn epoch_ms_to_iso(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Calendar date (`YYYY-MM-DD`, UTC) of an epoch millisecond instant.
pub fn epoch_ms_to_date(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.format("%Y-%m-%d").to_string())
}

pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
