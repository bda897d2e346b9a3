//! Derived display values.
//!
//! Nothing here is stored; every field is recomputed from the runtime state
//! and the routine at a given instant.

use cadence_session_protocol::Routine;
use serde::Serialize;

use super::state::{SessionPhase, SessionRuntimeState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub routine_id: String,
    pub phase: SessionPhase,
    pub running: bool,
    pub current_task_index: Option<usize>,
    pub current_task_title: Option<String>,
    pub global_elapsed: u64,
    /// `None` when no task is active.
    pub per_task_elapsed: Option<u64>,
    pub current_task_target: Option<u64>,
    pub total_target: u64,
    pub total_actual: u64,
    /// Negative once the routine runs over its budget.
    pub total_remaining: i64,
    pub tasks_completed: usize,
    pub tasks_total: usize,
}

impl SessionView {
    pub fn compute(routine: &Routine, state: &SessionRuntimeState, now_ms: i64) -> Self {
        let per_task_elapsed = state.task_elapsed(now_ms);
        let current_task = state
            .current_task_index
            .and_then(|index| routine.tasks.get(index));

        let total_target = routine.total_target_seconds();
        let total_actual = state.recorded_actual_seconds() + per_task_elapsed.unwrap_or(0);

        Self {
            routine_id: routine.id.clone(),
            phase: state.phase(),
            running: state.running,
            current_task_index: state.current_task_index,
            current_task_title: current_task.map(|task| task.title.clone()),
            global_elapsed: state.global_elapsed(now_ms),
            per_task_elapsed,
            current_task_target: current_task.map(|task| task.target_seconds),
            total_target,
            total_actual,
            total_remaining: total_target as i64 - total_actual as i64,
            tasks_completed: state.tasks_completed(),
            tasks_total: routine.tasks.len(),
        }
    }
}
