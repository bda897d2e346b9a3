//! The authoritative session owner.
//!
//! Every operation is a synchronous, instantaneous transition. Mutations are
//! followed immediately by a snapshot save, so the stored snapshot always
//! reflects the most recent mutation. Save failures are logged by the store
//! and never affect the in-memory state.

use std::sync::Arc;

use cadence_session_protocol::{
    epoch_ms_to_date, epoch_ms_to_iso, Routine, SessionRecord, SessionSnapshot,
};
use tracing::{debug, info, warn};

use crate::clock::{pause_interval, TimeSource};
use crate::collaborator::RoutineBackend;
use crate::config::TimerConfig;
use crate::error::SessionError;
use crate::snapshot::SnapshotStore;

use super::state::SessionRuntimeState;
use super::view::SessionView;

/// One routine's session. Only one instance per routine id should be alive.
pub struct RoutineSession {
    pub(super) routine: Routine,
    pub(super) state: SessionRuntimeState,
    pub(super) store: SnapshotStore,
    pub(super) backend: Arc<dyn RoutineBackend>,
    pub(super) clock: Arc<dyn TimeSource>,
    pub(super) config: TimerConfig,
    /// Snapshot found on open, awaiting the caller's restore decision.
    pub(super) pending: Option<SessionSnapshot>,
}

impl RoutineSession {
    /// Opens the session view for `routine`.
    ///
    /// A valid stored snapshot is kept as a pending offer (see
    /// [`RoutineSession::pending_restore`]); the session itself starts idle.
    pub fn open(
        routine: Routine,
        store: SnapshotStore,
        backend: Arc<dyn RoutineBackend>,
        clock: Arc<dyn TimeSource>,
        config: TimerConfig,
    ) -> Self {
        let pending = store
            .load(&routine.id)
            .and_then(|snapshot| match snapshot.fits_routine(routine.tasks.len()) {
                Ok(()) => Some(snapshot),
                Err(err) => {
                    warn!(
                        routine_id = %routine.id,
                        error = %err,
                        "Session snapshot does not match routine, discarding"
                    );
                    store.clear(&routine.id);
                    None
                }
            });

        if pending.is_some() {
            info!(routine_id = %routine.id, "Restorable session snapshot found");
        }

        Self {
            routine,
            state: SessionRuntimeState::default(),
            store,
            backend,
            clock,
            config,
            pending,
        }
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn state(&self) -> &SessionRuntimeState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_started(&self) -> bool {
        self.state.session_started
    }

    /// Display values at the current instant.
    pub fn view(&self) -> SessionView {
        SessionView::compute(&self.routine, &self.state, self.clock.now_ms())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<SessionView, SessionError> {
        if self.routine.tasks.is_empty() {
            return Err(SessionError::NoTasks);
        }
        if self.state.session_started {
            return Err(SessionError::AlreadyStarted(self.routine.id.clone()));
        }

        let now = self.clock.now_ms();
        // Starting fresh supersedes any snapshot still on offer.
        self.pending = None;
        self.state = SessionRuntimeState {
            session_started: true,
            running: true,
            current_task_index: Some(0),
            done_actuals: vec![None; self.routine.tasks.len()],
            session_start_ms: Some(now),
            task_start_ms: Some(now),
            paused_total_ms: 0,
            task_paused_total_ms: 0,
            last_pause_ms: None,
            started_at_iso: epoch_ms_to_iso(now),
        };

        info!(routine_id = %self.routine.id, tasks = self.routine.tasks.len(), "Session started");
        Ok(self.commit())
    }

    /// No-op unless running.
    pub fn pause(&mut self) -> SessionView {
        if !self.state.running {
            return self.view();
        }

        self.state.last_pause_ms = Some(self.clock.now_ms());
        self.state.running = false;
        debug!(routine_id = %self.routine.id, "Session paused");
        self.commit()
    }

    /// No-op unless started, paused, and a task is active.
    pub fn resume(&mut self) -> SessionView {
        if !self.state.session_started
            || self.state.running
            || self.state.current_task_index.is_none()
        {
            return self.view();
        }

        let now = self.clock.now_ms();
        let interval = self
            .state
            .last_pause_ms
            .map(|since| pause_interval(now, since))
            .unwrap_or(0);
        self.state.paused_total_ms = self.state.paused_total_ms.saturating_add(interval);
        self.state.task_paused_total_ms = self.state.task_paused_total_ms.saturating_add(interval);
        self.state.last_pause_ms = None;
        self.state.running = true;

        debug!(routine_id = %self.routine.id, pause_ms = interval, "Session resumed");
        self.commit()
    }

    /// The single start/pause/resume control.
    pub fn toggle(&mut self) -> Result<SessionView, SessionError> {
        if !self.state.session_started {
            self.start()
        } else if self.state.running {
            Ok(self.pause())
        } else {
            Ok(self.resume())
        }
    }

    /// Records the active task's elapsed time and moves on.
    pub fn complete_current_task(&mut self) -> Result<SessionView, SessionError> {
        let now = self.clock.now_ms();
        let actual = self
            .state
            .task_elapsed(now)
            .ok_or(SessionError::NoActiveTask)?;
        self.advance(actual, now)
    }

    /// Moves on with no credit: the recorded actual is always `0`.
    pub fn skip_current_task(&mut self) -> Result<SessionView, SessionError> {
        if self.state.current_task_index.is_none() {
            return Err(SessionError::NoActiveTask);
        }
        let now = self.clock.now_ms();
        self.advance(0, now)
    }

    fn advance(&mut self, actual: u64, now: i64) -> Result<SessionView, SessionError> {
        let index = self
            .state
            .current_task_index
            .ok_or(SessionError::NoActiveTask)?;
        self.state.set_actual(index, Some(actual));

        let next = index + 1;
        if next < self.routine.tasks.len() {
            self.state.current_task_index = Some(next);
            self.state.task_start_ms = Some(now);
            self.state.task_paused_total_ms = 0;
            self.state.reanchor_pause(now);
        } else {
            // Awaiting finish: no active task, and no open pause either.
            if let Some(since) = self.state.last_pause_ms.take() {
                self.state.paused_total_ms = self
                    .state
                    .paused_total_ms
                    .saturating_add(pause_interval(now, since));
            }
            self.state.current_task_index = None;
            self.state.task_start_ms = None;
            self.state.task_paused_total_ms = 0;
            self.state.running = false;
        }

        debug!(
            routine_id = %self.routine.id,
            task_index = index,
            actual_secs = actual,
            "Task settled"
        );
        Ok(self.commit())
    }

    /// Returns to the previous task, clearing its recorded actual and
    /// restarting its timer from zero.
    pub fn go_back(&mut self) -> Result<SessionView, SessionError> {
        let index = match self.state.current_task_index {
            Some(index) if index > 0 => index,
            _ => return Err(SessionError::CannotGoBack),
        };

        let now = self.clock.now_ms();
        let previous = index - 1;
        self.state.set_actual(previous, None);
        self.state.current_task_index = Some(previous);
        self.state.task_start_ms = Some(now);
        self.state.task_paused_total_ms = 0;
        self.state.reanchor_pause(now);

        debug!(routine_id = %self.routine.id, task_index = previous, "Went back a task");
        Ok(self.commit())
    }

    /// Builds the session record, hands it to the backend, then resets.
    ///
    /// The reset happens even when the backend rejects the record; the
    /// record comes back inside [`SessionError::RecordRejected`].
    pub fn finish(&mut self) -> Result<SessionRecord, SessionError> {
        if !self.state.session_started {
            return Err(SessionError::NotStarted(self.routine.id.clone()));
        }

        let now = self.clock.now_ms();
        let record = self.build_record(now);
        let outcome = self.backend.record_session(&record);
        self.reset();

        match outcome {
            Ok(()) => {
                info!(
                    routine_id = %record.routine_id,
                    record_id = %record.id,
                    actual_secs = record.actual_seconds,
                    delta_secs = record.delta_seconds,
                    "Session finished"
                );
                Ok(record)
            }
            Err(reason) => {
                warn!(
                    routine_id = %record.routine_id,
                    record_id = %record.id,
                    error = %reason,
                    "Session record was not accepted"
                );
                Err(SessionError::RecordRejected {
                    record: Box::new(record),
                    reason,
                })
            }
        }
    }

    fn build_record(&self, now: i64) -> SessionRecord {
        let actual_seconds = self.state.global_elapsed(now);
        let target_seconds = self.routine.total_target_seconds();
        let start_iso = self
            .state
            .started_at_iso
            .clone()
            .or_else(|| self.state.session_start_ms.and_then(epoch_ms_to_iso))
            .or_else(|| epoch_ms_to_iso(now - (actual_seconds as i64) * 1000))
            .unwrap_or_default();

        SessionRecord {
            id: ulid::Ulid::new().to_string(),
            routine_id: self.routine.id.clone(),
            date_iso: epoch_ms_to_date(now).unwrap_or_default(),
            start_iso,
            end_iso: epoch_ms_to_iso(now).unwrap_or_default(),
            target_seconds,
            actual_seconds,
            delta_seconds: actual_seconds as i64 - target_seconds as i64,
            tasks_completed: self.state.tasks_completed(),
            tasks_total: self.routine.tasks.len(),
        }
    }

    /// Back to idle, discarding all progress and the stored snapshot.
    pub fn reset(&mut self) -> SessionView {
        self.state = SessionRuntimeState::default();
        self.pending = None;
        self.store.clear(&self.routine.id);
        debug!(routine_id = %self.routine.id, "Session reset");
        self.view()
    }

    /// Asks the backend to delete the routine. Local state is only reset
    /// once the backend confirms.
    pub fn delete_routine(&mut self) -> Result<bool, SessionError> {
        match self.backend.delete_routine(&self.routine.id) {
            Ok(true) => {
                info!(routine_id = %self.routine.id, "Routine deleted");
                self.reset();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(reason) => Err(SessionError::DeleteRejected {
                routine_id: self.routine.id.clone(),
                reason,
            }),
        }
    }

    /// Writes the current state to the snapshot store regardless of whether
    /// anything changed. Returns whether the write landed.
    pub fn flush(&self) -> bool {
        if self.state.session_started {
            self.store.save(&self.routine.id, &self.state)
        } else {
            false
        }
    }

    fn commit(&mut self) -> SessionView {
        if self.state.session_started {
            self.store.save(&self.routine.id, &self.state);
        } else {
            self.store.clear(&self.routine.id);
        }
        self.view()
    }
}
