//! Contract for the external routine/session persistence layer.
//!
//! The timer core calls into this but never implements it for real: hosts
//! plug in whatever talks to their CRUD layer. Failures are reported as
//! strings and are not retried by the core.

use cadence_session_protocol::SessionRecord;

pub trait RoutineBackend: Send + Sync {
    /// Persists a finished session. Called exactly once per `finish()`.
    fn record_session(&self, record: &SessionRecord) -> Result<(), String>;

    /// Deletes the routine. `Ok(false)` means the user or the backend
    /// declined; the timer leaves its state alone in that case.
    fn delete_routine(&self, routine_id: &str) -> Result<bool, String>;
}
