//! File-backed routine collaborator for the terminal host.
//!
//! Finished sessions are appended to the history log. Deleting a routine
//! removes its definition file, but only after the user confirms.

use std::io;
use std::path::PathBuf;

use cadence_core::{RecordLog, RoutineBackend};
use cadence_session_protocol::SessionRecord;
use tracing::info;

pub struct FileRoutineBackend {
    log: RecordLog,
    routine_file: Option<PathBuf>,
    confirm_delete: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl FileRoutineBackend {
    pub fn new(log: RecordLog) -> Self {
        Self {
            log,
            routine_file: None,
            confirm_delete: Box::new(|_| false),
        }
    }

    pub fn with_routine_file(mut self, path: PathBuf) -> Self {
        self.routine_file = Some(path);
        self
    }

    pub fn with_delete_confirmation(
        mut self,
        confirm: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.confirm_delete = Box::new(confirm);
        self
    }
}

impl RoutineBackend for FileRoutineBackend {
    fn record_session(&self, record: &SessionRecord) -> Result<(), String> {
        self.log.append(record).map_err(|err| err.to_string())
    }

    fn delete_routine(&self, routine_id: &str) -> Result<bool, String> {
        let Some(path) = &self.routine_file else {
            return Err(format!("no routine file known for {routine_id}"));
        };
        if !(self.confirm_delete)(routine_id) {
            return Ok(false);
        }

        match fs_err::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.to_string()),
        }
        info!(routine_id, path = %path.display(), "Routine file removed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record() -> SessionRecord {
        SessionRecord {
            id: "01J".to_string(),
            routine_id: "r".to_string(),
            date_iso: "2026-01-01".to_string(),
            start_iso: "2026-01-01T07:00:00.000Z".to_string(),
            end_iso: "2026-01-01T07:01:16.000Z".to_string(),
            target_seconds: 180,
            actual_seconds: 46,
            delta_seconds: -134,
            tasks_completed: 1,
            tasks_total: 2,
        }
    }

    #[test]
    fn records_are_appended_to_history() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("records.jsonl");
        let backend = FileRoutineBackend::new(RecordLog::new(path.clone()));

        backend.record_session(&record()).unwrap();
        assert_eq!(RecordLog::new(path).list(None).unwrap(), vec![record()]);
    }

    #[test]
    fn declined_delete_keeps_file() {
        let temp = tempdir().unwrap();
        let routine = temp.path().join("r.json");
        std::fs::write(&routine, "{}").unwrap();
        let backend = FileRoutineBackend::new(RecordLog::new(temp.path().join("records.jsonl")))
            .with_routine_file(routine.clone());

        assert_eq!(backend.delete_routine("r"), Ok(false));
        assert!(routine.exists());
    }

    #[test]
    fn confirmed_delete_removes_file() {
        let temp = tempdir().unwrap();
        let routine = temp.path().join("r.json");
        std::fs::write(&routine, "{}").unwrap();
        let backend = FileRoutineBackend::new(RecordLog::new(temp.path().join("records.jsonl")))
            .with_routine_file(routine.clone())
            .with_delete_confirmation(|id| id == "r");

        assert_eq!(backend.delete_routine("r"), Ok(true));
        assert!(!routine.exists());
    }

    #[test]
    fn delete_without_file_is_an_error() {
        let temp = tempdir().unwrap();
        let backend = FileRoutineBackend::new(RecordLog::new(temp.path().join("records.jsonl")))
            .with_delete_confirmation(|_| true);
        assert!(backend.delete_routine("r").is_err());
    }
}
