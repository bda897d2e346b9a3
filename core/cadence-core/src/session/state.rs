//! Runtime state of a routine session and its snapshot mapping.

use cadence_session_protocol::{SessionSnapshot, SNAPSHOT_VERSION};
use serde::Serialize;

use crate::clock::{elapsed_global, elapsed_task, pause_interval};

/// Coarse phase derived from the runtime fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    Idle,
    Running,
    Paused,
    /// Last task completed or skipped; waiting for `finish()`.
    AwaitingFinish,
}

/// Mutable core of a session. Timestamps are epoch milliseconds.
///
/// `Default` is the idle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionRuntimeState {
    pub session_started: bool,
    pub running: bool,
    pub current_task_index: Option<usize>,
    /// Sparse: `Some` only for completed or skipped tasks.
    pub done_actuals: Vec<Option<u64>>,
    pub session_start_ms: Option<i64>,
    pub task_start_ms: Option<i64>,
    pub paused_total_ms: i64,
    pub task_paused_total_ms: i64,
    /// Set between a pause and the following resume.
    pub last_pause_ms: Option<i64>,
    pub started_at_iso: Option<String>,
}

impl SessionRuntimeState {
    pub fn phase(&self) -> SessionPhase {
        match (self.session_started, self.running, self.current_task_index) {
            (false, _, _) => SessionPhase::Idle,
            (true, _, None) => SessionPhase::AwaitingFinish,
            (true, true, Some(_)) => SessionPhase::Running,
            (true, false, Some(_)) => SessionPhase::Paused,
        }
    }

    /// Pause in progress at `now_ms`, or zero when not paused.
    fn open_pause_ms(&self, now_ms: i64) -> i64 {
        self.last_pause_ms
            .map(|since| pause_interval(now_ms, since))
            .unwrap_or(0)
    }

    /// Session pause total including a pause still in progress, so the
    /// displayed clock stands still while paused.
    pub fn effective_paused_ms(&self, now_ms: i64) -> i64 {
        self.paused_total_ms.saturating_add(self.open_pause_ms(now_ms))
    }

    pub fn effective_task_paused_ms(&self, now_ms: i64) -> i64 {
        self.task_paused_total_ms
            .saturating_add(self.open_pause_ms(now_ms))
    }

    pub fn global_elapsed(&self, now_ms: i64) -> u64 {
        match self.session_start_ms {
            Some(start) => elapsed_global(now_ms, start, self.effective_paused_ms(now_ms)),
            None => 0,
        }
    }

    /// Elapsed seconds on the active task, `None` when no task is active.
    pub fn task_elapsed(&self, now_ms: i64) -> Option<u64> {
        self.current_task_index?;
        let start = self.task_start_ms?;
        Some(elapsed_task(
            now_ms,
            start,
            self.effective_task_paused_ms(now_ms),
        ))
    }

    /// Tasks that earned credit. A skip records `0` and does not count.
    pub fn tasks_completed(&self) -> usize {
        self.done_actuals
            .iter()
            .filter(|a| matches!(a, Some(secs) if *secs > 0))
            .count()
    }

    /// Tasks that are behind the user, completed or skipped.
    pub fn tasks_settled(&self) -> usize {
        settled_count(&self.done_actuals)
    }

    pub fn recorded_actual_seconds(&self) -> u64 {
        self.done_actuals.iter().flatten().sum()
    }

    /// Closes the pause so far into the session total and restarts it at
    /// `now_ms`. Used when the active task changes while paused, so the new
    /// task starts frozen at zero without losing session pause time.
    pub(crate) fn reanchor_pause(&mut self, now_ms: i64) {
        if let Some(since) = self.last_pause_ms {
            self.paused_total_ms = self
                .paused_total_ms
                .saturating_add(pause_interval(now_ms, since));
            self.last_pause_ms = Some(now_ms);
        }
    }

    pub(crate) fn set_actual(&mut self, index: usize, actual: Option<u64>) {
        if self.done_actuals.len() <= index {
            self.done_actuals.resize(index + 1, None);
        }
        self.done_actuals[index] = actual;
    }

    pub fn to_snapshot(&self, routine_id: &str, now_ms: i64) -> SessionSnapshot {
        SessionSnapshot {
            running: self.running,
            session_started: self.session_started,
            current_index: self.current_task_index,
            done_actuals: self.done_actuals.clone(),
            started_at: self.started_at_iso.clone(),
            session_start_time: self.session_start_ms,
            task_start_time: self.task_start_ms,
            paused_duration: self.paused_total_ms,
            task_paused_duration: self.task_paused_total_ms,
            last_update_time: now_ms,
            routine_id: routine_id.to_string(),
            version: SNAPSHOT_VERSION,
            last_pause_time: if self.running {
                None
            } else {
                self.last_pause_ms
            },
        }
    }

    /// Verbatim copy of the snapshot fields; restore policy is applied by the
    /// caller.
    pub fn from_snapshot(snapshot: &SessionSnapshot, task_count: usize) -> Self {
        let mut done_actuals = snapshot.done_actuals.clone();
        done_actuals.resize(task_count, None);

        Self {
            session_started: snapshot.session_started,
            running: snapshot.running,
            current_task_index: snapshot.current_index,
            done_actuals,
            session_start_ms: snapshot.session_start_time,
            task_start_ms: snapshot.current_index.and(snapshot.task_start_time),
            paused_total_ms: snapshot.paused_duration.max(0),
            task_paused_total_ms: snapshot.task_paused_duration.max(0),
            last_pause_ms: if snapshot.running {
                None
            } else {
                snapshot.last_pause_time
            },
            started_at_iso: snapshot.started_at.clone(),
        }
    }
}

/// Number of completed or skipped entries in a sparse actuals list.
pub(crate) fn settled_count(done_actuals: &[Option<u64>]) -> usize {
    done_actuals.iter().filter(|a| a.is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_state() -> SessionRuntimeState {
        SessionRuntimeState {
            session_started: true,
            running: true,
            current_task_index: Some(0),
            done_actuals: vec![None, None],
            session_start_ms: Some(0),
            task_start_ms: Some(0),
            started_at_iso: Some("1970-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn phase_follows_fields() {
        assert_eq!(SessionRuntimeState::default().phase(), SessionPhase::Idle);

        let mut state = running_state();
        assert_eq!(state.phase(), SessionPhase::Running);

        state.running = false;
        assert_eq!(state.phase(), SessionPhase::Paused);

        state.current_task_index = None;
        assert_eq!(state.phase(), SessionPhase::AwaitingFinish);
    }

    #[test]
    fn display_freezes_while_paused() {
        let mut state = running_state();
        state.running = false;
        state.last_pause_ms = Some(10_000);

        assert_eq!(state.global_elapsed(10_000), 10);
        assert_eq!(state.global_elapsed(500_000), 10);
        assert_eq!(state.task_elapsed(500_000), Some(10));
    }

    #[test]
    fn reanchor_moves_open_pause_into_session_total() {
        let mut state = running_state();
        state.running = false;
        state.last_pause_ms = Some(10_000);

        state.reanchor_pause(25_000);
        assert_eq!(state.paused_total_ms, 15_000);
        assert_eq!(state.last_pause_ms, Some(25_000));
        assert_eq!(state.global_elapsed(40_000), 10);
    }

    #[test]
    fn reanchor_is_noop_while_running() {
        let mut state = running_state();
        state.reanchor_pause(25_000);
        assert_eq!(state.paused_total_ms, 0);
        assert_eq!(state.last_pause_ms, None);
    }

    #[test]
    fn snapshot_round_trip_preserves_pause_anchor() {
        let mut state = running_state();
        state.running = false;
        state.last_pause_ms = Some(12_000);
        state.set_actual(0, Some(5));

        let snapshot = state.to_snapshot("r", 20_000);
        assert_eq!(snapshot.last_update_time, 20_000);
        assert_eq!(snapshot.last_pause_time, Some(12_000));

        let restored = SessionRuntimeState::from_snapshot(&snapshot, 2);
        assert_eq!(restored, state);
    }

    #[test]
    fn running_snapshot_omits_pause_anchor() {
        let snapshot = running_state().to_snapshot("r", 1_000);
        assert_eq!(snapshot.last_pause_time, None);
    }

    #[test]
    fn from_snapshot_pads_short_actuals() {
        let mut snapshot = running_state().to_snapshot("r", 1_000);
        snapshot.done_actuals = vec![Some(3)];
        let state = SessionRuntimeState::from_snapshot(&snapshot, 3);
        assert_eq!(state.done_actuals, vec![Some(3), None, None]);
    }

    #[test]
    fn totals_count_only_defined_actuals() {
        let mut state = running_state();
        state.set_actual(0, Some(40));
        state.set_actual(3, Some(0));
        assert_eq!(state.tasks_completed(), 1);
        assert_eq!(state.tasks_settled(), 2);
        assert_eq!(state.recorded_actual_seconds(), 40);
        assert_eq!(state.done_actuals.len(), 4);
    }

    #[test]
    fn settled_count_agrees_with_snapshot_and_state() {
        let mut state = running_state();
        state.set_actual(0, Some(0));
        state.current_task_index = Some(1);
        let snapshot = state.to_snapshot("r", 5_000);

        assert_eq!(settled_count(&snapshot.done_actuals), 1);
        assert_eq!(
            SessionRuntimeState::from_snapshot(&snapshot, 2).tasks_settled(),
            settled_count(&snapshot.done_actuals)
        );
        assert_eq!(state.tasks_completed(), 0);
    }
}
