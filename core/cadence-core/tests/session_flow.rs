//! End-to-end session flows through the public API.

use std::sync::{Arc, Mutex};

use cadence_core::{
    FileSnapshotBackend, LifecycleEvent, LifecycleOutcome, ManualTimeSource,
    MemorySnapshotBackend, RoutineBackend, RoutineSession, SessionError, SessionPhase,
    SnapshotBackend, SnapshotStore, StorageConfig, TimerConfig,
};
use cadence_session_protocol::{Routine, SessionRecord, Task, SNAPSHOT_VERSION};
use tempfile::tempdir;

const T0: i64 = 1_767_250_800_000; // 2026-01-01T07:00:00Z

#[derive(Default)]
struct Recorder {
    records: Mutex<Vec<SessionRecord>>,
}

impl RoutineBackend for Recorder {
    fn record_session(&self, record: &SessionRecord) -> Result<(), String> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn delete_routine(&self, _routine_id: &str) -> Result<bool, String> {
        Ok(false)
    }
}

fn routine() -> Routine {
    Routine {
        id: "morning".to_string(),
        name: "Morning".to_string(),
        tasks: vec![
            Task {
                id: "stretch".to_string(),
                title: "Stretch".to_string(),
                target_seconds: 60,
            },
            Task {
                id: "read".to_string(),
                title: "Read".to_string(),
                target_seconds: 120,
            },
        ],
    }
}

fn open(
    backend: Box<dyn SnapshotBackend>,
    clock: &ManualTimeSource,
    recorder: &Arc<Recorder>,
) -> RoutineSession {
    open_routine(routine(), backend, clock, recorder)
}

fn open_routine(
    routine: Routine,
    backend: Box<dyn SnapshotBackend>,
    clock: &ManualTimeSource,
    recorder: &Arc<Recorder>,
) -> RoutineSession {
    let config = TimerConfig::default();
    let store = SnapshotStore::new(backend, Arc::new(clock.clone()), &config);
    RoutineSession::open(
        routine,
        store,
        recorder.clone(),
        Arc::new(clock.clone()),
        config,
    )
}

#[test]
fn full_routine_produces_expected_record() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    let recorder = Arc::new(Recorder::default());
    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);

    session.start().unwrap();
    clock.set_ms(T0 + 10_000);
    session.pause();
    clock.set_ms(T0 + 40_000);
    session.resume();
    clock.set_ms(T0 + 70_000);
    session.complete_current_task().unwrap();
    assert_eq!(session.state().done_actuals, vec![Some(40), None]);

    clock.set_ms(T0 + 75_000);
    let view = session.skip_current_task().unwrap();
    assert_eq!(session.state().done_actuals, vec![Some(40), Some(0)]);
    assert_eq!(view.phase, SessionPhase::AwaitingFinish);

    clock.set_ms(T0 + 76_000);
    let record = session.finish().unwrap();

    assert_eq!(record.routine_id, "morning");
    assert_eq!(record.actual_seconds, 46);
    assert_eq!(record.target_seconds, 180);
    assert_eq!(record.delta_seconds, -134);
    assert_eq!(record.tasks_completed, 1);
    assert_eq!(record.tasks_total, 2);
    assert_eq!(record.date_iso, "2026-01-01");
    assert_eq!(record.start_iso, "2026-01-01T07:00:00.000Z");
    assert_eq!(record.end_iso, "2026-01-01T07:01:16.000Z");

    // Terminal: storage cleared, exactly one record, back to idle.
    assert!(snapshots.is_empty());
    assert_eq!(recorder.records.lock().unwrap().as_slice(), &[record]);
    assert_eq!(session.view().phase, SessionPhase::Idle);
}

#[test]
fn every_mutation_is_persisted_for_the_next_open() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    session.start().unwrap();
    clock.advance_secs(20);
    session.complete_current_task().unwrap();
    clock.advance_secs(5);
    session.pause();
    drop(session);

    clock.advance_secs(60);
    let reopened = open(Box::new(snapshots.clone()), &clock, &recorder);
    let offer = reopened.pending_restore().expect("snapshot offered");
    assert!(!offer.was_running);
    assert!(!offer.resumes_running);
    assert_eq!(offer.current_task_index, Some(1));
    assert_eq!(offer.tasks_settled, 1);
    assert_eq!(offer.away_ms, 60_000);
}

#[test]
fn stale_file_snapshot_is_discarded_after_25_hours() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let clock = ManualTimeSource::new(T0);
    let recorder = Arc::new(Recorder::default());

    let mut session = open(
        Box::new(FileSnapshotBackend::new(storage.clone())),
        &clock,
        &recorder,
    );
    session.start().unwrap();
    assert!(storage.snapshot_file("morning").exists());
    drop(session);

    clock.advance_secs(25 * 60 * 60);
    let reopened = open(
        Box::new(FileSnapshotBackend::new(storage.clone())),
        &clock,
        &recorder,
    );
    assert!(reopened.pending_restore().is_none());
    assert!(!storage.snapshot_file("morning").exists());
}

#[test]
fn restore_within_window_keeps_running_without_losing_time() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    session.start().unwrap();
    clock.advance_secs(30);
    assert!(matches!(
        session.handle_lifecycle(LifecycleEvent::Suspending),
        LifecycleOutcome::ConfirmationRequired { persisted: true, .. }
    ));
    drop(session);

    clock.advance_secs(60);
    let mut reopened = open(Box::new(snapshots.clone()), &clock, &recorder);
    assert!(reopened.pending_restore().unwrap().resumes_running);
    let view = reopened.restore_from_snapshot().unwrap();
    assert!(view.running);
    assert_eq!(view.global_elapsed, 90);
    assert_eq!(view.per_task_elapsed, Some(90));
}

#[test]
fn restore_after_window_comes_back_paused() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    session.start().unwrap();
    clock.advance_secs(30);
    session.flush();
    drop(session);

    clock.advance_secs(2 * 60 * 60);
    let mut reopened = open(Box::new(snapshots.clone()), &clock, &recorder);
    let view = reopened.restore_from_snapshot().unwrap();
    assert!(!view.running);
    assert_eq!(view.phase, SessionPhase::Paused);
    assert_eq!(view.global_elapsed, 30);

    clock.advance_secs(10);
    let view = reopened.resume();
    assert_eq!(view.global_elapsed, 30);
    clock.advance_secs(10);
    assert_eq!(reopened.view().global_elapsed, 40);
    assert_eq!(reopened.view().per_task_elapsed, Some(40));
}

#[test]
fn restoring_the_same_snapshot_twice_gives_the_same_state() {
    let clock = ManualTimeSource::new(T0);
    let recorder = Arc::new(Recorder::default());

    let first_store = MemorySnapshotBackend::new();
    let mut session = open(Box::new(first_store.clone()), &clock, &recorder);
    session.start().unwrap();
    clock.advance_secs(15);
    session.pause();
    let raw = first_store.raw("morning").unwrap();
    drop(session);

    clock.advance_secs(600);
    let second_store = MemorySnapshotBackend::new();
    second_store.insert_raw("morning", &raw);

    let mut a = open(Box::new(first_store), &clock, &recorder);
    let mut b = open(Box::new(second_store), &clock, &recorder);
    a.restore_from_snapshot().unwrap();
    b.restore_from_snapshot().unwrap();
    assert_eq!(a.state(), b.state());
    assert_eq!(a.view(), b.view());
}

#[test]
fn discard_then_reopen_offers_nothing() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    session.start().unwrap();
    drop(session);

    let mut reopened = open(Box::new(snapshots.clone()), &clock, &recorder);
    assert!(reopened.pending_restore().is_some());
    let view = reopened.discard_snapshot();
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(matches!(
        reopened.restore_from_snapshot(),
        Err(SessionError::NoSnapshot(_))
    ));
    drop(reopened);

    let again = open(Box::new(snapshots), &clock, &recorder);
    assert!(again.pending_restore().is_none());
}

#[test]
fn snapshot_that_no_longer_fits_the_routine_is_discarded() {
    let clock = ManualTimeSource::new(T0 + 60_000);
    let snapshots = MemorySnapshotBackend::new();
    let stale_shape = format!(
        r#"{{"running":false,"sessionStarted":true,"currentIndex":3,
            "doneActuals":[30,20,10,null],"startedAt":null,
            "sessionStartTime":{T0},"taskStartTime":{T0},
            "pausedDuration":0,"taskPausedDuration":0,
            "lastUpdateTime":{T0},"routineId":"morning","version":{SNAPSHOT_VERSION}}}"#
    );
    snapshots.insert_raw("morning", &stale_shape);
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    assert!(session.pending_restore().is_none());
    assert!(snapshots.raw("morning").is_none());

    let view = session.start().unwrap();
    assert_eq!(view.current_task_index, Some(0));
    assert_eq!(session.state().done_actuals, vec![None, None]);
}

#[test]
fn routines_with_similar_ids_keep_separate_snapshots() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let clock = ManualTimeSource::new(T0);
    let recorder = Arc::new(Recorder::default());
    let with_id = |id: &str| Routine {
        id: id.to_string(),
        ..routine()
    };

    let mut dotted = open_routine(
        with_id("team.morning"),
        Box::new(FileSnapshotBackend::new(storage.clone())),
        &clock,
        &recorder,
    );
    dotted.start().unwrap();
    drop(dotted);

    clock.advance_secs(5);
    let mut underscored = open_routine(
        with_id("team_morning"),
        Box::new(FileSnapshotBackend::new(storage.clone())),
        &clock,
        &recorder,
    );
    assert!(underscored.pending_restore().is_none());
    underscored.start().unwrap();
    drop(underscored);

    for id in ["team.morning", "team_morning"] {
        let reopened = open_routine(
            with_id(id),
            Box::new(FileSnapshotBackend::new(storage.clone())),
            &clock,
            &recorder,
        );
        let offer = reopened.pending_restore().expect("each routine keeps its own snapshot");
        assert_eq!(offer.routine_id, id);
    }
}

#[test]
fn corrupt_snapshot_opens_clean() {
    let clock = ManualTimeSource::new(T0);
    let snapshots = MemorySnapshotBackend::new();
    snapshots.insert_raw("morning", "{\"running\": tru");
    let recorder = Arc::new(Recorder::default());

    let mut session = open(Box::new(snapshots.clone()), &clock, &recorder);
    assert!(session.pending_restore().is_none());
    assert!(snapshots.is_empty());
    assert!(session.start().is_ok());
}

#[test]
fn empty_routine_cannot_start() {
    let clock = ManualTimeSource::new(T0);
    let config = TimerConfig::default();
    let store = SnapshotStore::new(
        Box::new(MemorySnapshotBackend::new()),
        Arc::new(clock.clone()),
        &config,
    );
    let mut empty = routine();
    empty.tasks.clear();
    let mut session = RoutineSession::open(
        empty,
        store,
        Arc::new(Recorder::default()),
        Arc::new(clock),
        config,
    );

    let err = session.start().unwrap_err();
    assert!(matches!(err, SessionError::NoTasks));
    assert_eq!(session.view().phase, SessionPhase::Idle);
}
