//! Resume-or-start-fresh decision for a snapshot found on open.
//!
//! Nothing auto-resumes. The caller inspects the [`RestoreOffer`] and then
//! calls either [`RoutineSession::restore_from_snapshot`] or
//! [`RoutineSession::discard_snapshot`].
//!
//! Restore policy: a snapshot that was running and was saved less than the
//! resume window ago keeps running. Anything else comes back paused, and the
//! time spent away is counted as pause so it never shows up as work.

use cadence_session_protocol::SessionSnapshot;
use serde::Serialize;
use tracing::info;

use crate::clock::pause_interval;
use crate::error::SessionError;

use super::machine::RoutineSession;
use super::state::{settled_count, SessionRuntimeState};
use super::view::SessionView;

/// What the caller is shown before choosing "Resume" or "Start Fresh".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOffer {
    pub routine_id: String,
    pub last_update_ms: i64,
    pub away_ms: i64,
    pub was_running: bool,
    /// Whether "Resume" would continue running rather than come back paused.
    pub resumes_running: bool,
    pub current_task_index: Option<usize>,
    pub tasks_settled: usize,
    pub tasks_total: usize,
}

impl RoutineSession {
    pub fn pending_restore(&self) -> Option<RestoreOffer> {
        let snapshot = self.pending.as_ref()?;
        let now = self.clock.now_ms();
        let away_ms = snapshot.age_ms(now);
        let window_ms = self.config.resume_running_window_ms();

        Some(RestoreOffer {
            routine_id: snapshot.routine_id.clone(),
            last_update_ms: snapshot.last_update_time,
            away_ms,
            was_running: snapshot.running,
            resumes_running: keeps_running(snapshot, away_ms, window_ms),
            current_task_index: snapshot.current_index,
            tasks_settled: settled_count(&snapshot.done_actuals),
            tasks_total: self.routine.tasks.len(),
        })
    }

    /// "Resume": applies the pending snapshot under the restore policy.
    pub fn restore_from_snapshot(&mut self) -> Result<SessionView, SessionError> {
        let snapshot = self
            .pending
            .take()
            .ok_or_else(|| SessionError::NoSnapshot(self.routine.id.clone()))?;

        let now = self.clock.now_ms();
        self.state = restored_state(
            &snapshot,
            self.routine.tasks.len(),
            now,
            self.config.resume_running_window_ms(),
        );

        info!(
            routine_id = %self.routine.id,
            running = self.state.running,
            away_ms = snapshot.age_ms(now),
            "Session restored from snapshot"
        );

        self.flush();
        Ok(self.view())
    }

    /// "Start Fresh": drops the pending snapshot and stays idle.
    pub fn discard_snapshot(&mut self) -> SessionView {
        self.pending = None;
        self.store.clear(&self.routine.id);
        info!(routine_id = %self.routine.id, "Session snapshot discarded");
        self.view()
    }
}

fn keeps_running(snapshot: &SessionSnapshot, away_ms: i64, window_ms: i64) -> bool {
    snapshot.running && snapshot.current_index.is_some() && away_ms < window_ms
}

/// Runtime state to resume from `snapshot` at `now_ms`.
pub(crate) fn restored_state(
    snapshot: &SessionSnapshot,
    task_count: usize,
    now_ms: i64,
    window_ms: i64,
) -> SessionRuntimeState {
    let mut state = SessionRuntimeState::from_snapshot(snapshot, task_count);
    let away_ms = snapshot.age_ms(now_ms);

    if keeps_running(snapshot, away_ms, window_ms) {
        return state;
    }

    // A paused snapshot's pause began at its anchor; a running one is treated
    // as paused from its last save.
    let pause_origin = if snapshot.running {
        snapshot.last_update_time
    } else {
        snapshot.last_pause_time.unwrap_or(snapshot.last_update_time)
    };
    let folded = pause_interval(now_ms, pause_origin);

    state.running = false;
    state.paused_total_ms = state.paused_total_ms.saturating_add(folded);
    if state.current_task_index.is_some() {
        state.task_paused_total_ms = state.task_paused_total_ms.saturating_add(folded);
        state.last_pause_ms = Some(now_ms);
    } else {
        state.last_pause_ms = None;
    }
    state
}
