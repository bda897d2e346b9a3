//! One-shot subcommands: status, discard, history, delete.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use cadence_core::{
    load_routine, CadenceError, FileSnapshotBackend, RecordLog, Result, RoutineSession,
    SnapshotStore, StorageConfig, SystemTimeSource, TimeSource, TimerConfig,
};

use crate::backend::FileRoutineBackend;
use crate::render;

pub fn snapshot_store(
    storage: &StorageConfig,
    clock: Arc<dyn TimeSource>,
    config: &TimerConfig,
) -> SnapshotStore {
    SnapshotStore::new(
        Box::new(FileSnapshotBackend::new(storage.clone())),
        clock,
        config,
    )
}

pub fn status(storage: &StorageConfig, config: &TimerConfig, routine_id: &str) -> Result<()> {
    let store = snapshot_store(storage, Arc::new(SystemTimeSource), config);
    match store.load(routine_id) {
        Some(snapshot) => {
            let json = serde_json::to_string_pretty(&snapshot).map_err(|source| {
                CadenceError::Json {
                    context: format!("formatting snapshot for {routine_id}"),
                    source,
                }
            })?;
            println!("{json}");
        }
        None => println!("No saved session for {routine_id}"),
    }
    Ok(())
}

pub fn discard(storage: &StorageConfig, config: &TimerConfig, routine_id: &str) -> Result<()> {
    snapshot_store(storage, Arc::new(SystemTimeSource), config).clear(routine_id);
    println!("Cleared saved session for {routine_id}");
    Ok(())
}

pub fn history(storage: &StorageConfig, routine_id: Option<&str>) -> Result<()> {
    let records = RecordLog::new(storage.records_file()).list(routine_id)?;
    if records.is_empty() {
        println!("No sessions recorded yet");
    }
    for record in &records {
        println!("{}", render::record_line(record));
    }
    Ok(())
}

pub fn delete(
    storage: &StorageConfig,
    config: TimerConfig,
    routine_path: &Path,
    assume_yes: bool,
) -> Result<()> {
    let routine = load_routine(routine_path)?;
    let routine_id = routine.id.clone();
    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let backend = FileRoutineBackend::new(RecordLog::new(storage.records_file()))
        .with_routine_file(routine_path.to_path_buf())
        .with_delete_confirmation(move |id| {
            assume_yes || confirm(&format!("Delete routine {id}?"))
        });

    let store = snapshot_store(storage, Arc::clone(&clock), &config);
    let mut session = RoutineSession::open(routine, store, Arc::new(backend), clock, config);
    if session.delete_routine()? {
        println!("Deleted routine {routine_id}");
    } else {
        println!("Kept routine {routine_id}");
    }
    Ok(())
}

/// Asks a yes/no question on the terminal. Anything but yes is no.
pub fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}
