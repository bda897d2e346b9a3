//! Append-only log of finished sessions (`records.jsonl`).
//!
//! One JSON record per line. A line that fails to parse is skipped with a
//! warning so a single bad write never hides the rest of the history.

use std::io::Write;
use std::path::{Path, PathBuf};

use cadence_session_protocol::{parse_record, SessionRecord};
use fs_err::OpenOptions;
use tracing::warn;

use crate::error::{CadenceError, Result};

pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| CadenceError::io("creating records directory", err))?;
        }

        let line = serde_json::to_string(record).map_err(|source| CadenceError::Json {
            context: format!("serializing record {}", record.id),
            source,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| CadenceError::io("opening records file", err))?;
        writeln!(file, "{line}").map_err(|err| CadenceError::io("appending record", err))
    }

    /// Records in file order, optionally filtered by routine.
    pub fn list(&self, routine_id: Option<&str>) -> Result<Vec<SessionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs_err::read_to_string(&self.path)
            .map_err(|err| CadenceError::io("reading records file", err))?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(line) {
                Ok(record) => {
                    if routine_id.map_or(true, |id| record.routine_id == id) {
                        records.push(record);
                    }
                }
                Err(err) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    error = %err,
                    "Skipping unreadable session record"
                ),
            }
        }
        Ok(records)
    }
}
