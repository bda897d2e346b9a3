//! Snapshot policy on top of a [`SnapshotBackend`].
//!
//! # Defensive Design
//!
//! Every failure degrades to "no snapshot" instead of reaching the caller:
//! - Read/write errors (storage full or disabled): logged, treated as absent/skipped
//! - Corrupt JSON: logged, entry deleted, treated as absent
//! - Unsupported version: logged, treated as absent (entry kept for migration)
//! - Foreign routine id or never-started session: treated as absent
//! - Older than the max age: deleted, treated as absent

use std::sync::Arc;

use cadence_session_protocol::{parse_snapshot, SessionSnapshot};
use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::config::TimerConfig;
use crate::session::SessionRuntimeState;

use super::backend::SnapshotBackend;

pub struct SnapshotStore {
    backend: Box<dyn SnapshotBackend>,
    clock: Arc<dyn TimeSource>,
    max_age_ms: i64,
}

impl SnapshotStore {
    pub fn new(
        backend: Box<dyn SnapshotBackend>,
        clock: Arc<dyn TimeSource>,
        config: &TimerConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            max_age_ms: config.snapshot_max_age_ms(),
        }
    }

    /// Writes `state` with `lastUpdateTime = now`, replacing any previous
    /// snapshot for the routine. Returns whether the write landed.
    pub fn save(&self, routine_id: &str, state: &SessionRuntimeState) -> bool {
        let snapshot = state.to_snapshot(routine_id, self.clock.now_ms());
        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(routine_id, error = %err, "Failed to serialize session snapshot");
                return false;
            }
        };

        match self.backend.write(routine_id, &payload) {
            Ok(()) => {
                debug!(routine_id, "Session snapshot saved");
                true
            }
            Err(err) => {
                warn!(routine_id, error = %err, "Failed to save session snapshot");
                false
            }
        }
    }

    /// Returns a restorable snapshot for `routine_id`, if there is one.
    pub fn load(&self, routine_id: &str) -> Option<SessionSnapshot> {
        let content = match self.backend.read(routine_id) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(err) => {
                warn!(routine_id, error = %err, "Failed to read session snapshot");
                return None;
            }
        };

        if content.trim().is_empty() {
            warn!(routine_id, "Empty session snapshot, discarding");
            self.clear(routine_id);
            return None;
        }

        let snapshot = match parse_snapshot(&content) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(routine_id, error = %err, "Corrupt session snapshot, discarding");
                self.clear(routine_id);
                return None;
            }
        };

        if !snapshot.is_supported_version() {
            warn!(
                routine_id,
                version = snapshot.version,
                "Unsupported session snapshot version, ignoring"
            );
            return None;
        }

        if snapshot.routine_id != routine_id {
            warn!(
                routine_id,
                stored_routine_id = %snapshot.routine_id,
                "Session snapshot belongs to another routine, ignoring"
            );
            return None;
        }

        if !snapshot.session_started {
            return None;
        }

        let age_ms = snapshot.age_ms(self.clock.now_ms());
        if age_ms > self.max_age_ms {
            info!(routine_id, age_ms, "Session snapshot expired, discarding");
            self.clear(routine_id);
            return None;
        }

        Some(snapshot)
    }

    /// Deletes the snapshot. A missing entry is not an error.
    pub fn clear(&self, routine_id: &str) {
        if let Err(err) = self.backend.remove(routine_id) {
            warn!(routine_id, error = %err, "Failed to clear session snapshot");
        }
    }
}
