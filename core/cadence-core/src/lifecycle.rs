//! Host visibility and lifecycle events.
//!
//! The host may stop scheduling anything for arbitrary real time (window
//! hidden, laptop asleep) and only tells us when it comes back. Two events
//! matter:
//!
//! - **Foregrounded**: recompute right away instead of showing a stale value
//!   until the next tick.
//! - **Suspending**: the host is about to go away. Save now, and if the clock
//!   is running, ask the host to confirm with the user. The host decides how
//!   (or whether) to prompt; nothing here blocks.

use serde::Serialize;
use tracing::debug;

use crate::session::{RoutineSession, SessionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Foregrounded,
    Suspending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LifecycleOutcome {
    /// Freshly recomputed display values.
    Refreshed { view: SessionView },
    /// Snapshot forced to storage; nothing to ask the user.
    Saved { persisted: bool },
    /// Snapshot forced to storage, and a session is actively running: the
    /// host should warn before letting the user leave.
    ConfirmationRequired { view: SessionView, persisted: bool },
    /// Nothing to do for this event in the current phase.
    Ignored,
}

pub fn reconcile(session: &RoutineSession, event: LifecycleEvent) -> LifecycleOutcome {
    match event {
        LifecycleEvent::Foregrounded => {
            if !session.is_running() {
                return LifecycleOutcome::Ignored;
            }
            let view = session.view();
            debug!(
                routine_id = %view.routine_id,
                global_elapsed = view.global_elapsed,
                "Recomputed elapsed time on foreground"
            );
            LifecycleOutcome::Refreshed { view }
        }
        LifecycleEvent::Suspending => {
            if !session.is_started() {
                return LifecycleOutcome::Ignored;
            }
            let persisted = session.flush();
            if session.is_running() {
                LifecycleOutcome::ConfirmationRequired {
                    view: session.view(),
                    persisted,
                }
            } else {
                LifecycleOutcome::Saved { persisted }
            }
        }
    }
}

impl RoutineSession {
    pub fn handle_lifecycle(&self, event: LifecycleEvent) -> LifecycleOutcome {
        reconcile(self, event)
    }
}
