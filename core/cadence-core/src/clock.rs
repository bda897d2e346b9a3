//! Elapsed-time derivation.
//!
//! Elapsed values are always recomputed from absolute timestamps minus
//! accumulated pause time, never incremented per tick. A tick that fires forty
//! seconds late (or not at all while the host was suspended) still yields the
//! right value on its one computation.
//!
//! All instants are epoch milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Seconds of active time since `session_start`, excluding `paused_total_ms`.
/// Floors to whole seconds and clamps at zero.
pub fn elapsed_global(now_ms: i64, session_start_ms: i64, paused_total_ms: i64) -> u64 {
    active_seconds(now_ms, session_start_ms, paused_total_ms)
}

/// Same formula as [`elapsed_global`], scoped to the current task.
pub fn elapsed_task(now_ms: i64, task_start_ms: i64, task_paused_total_ms: i64) -> u64 {
    active_seconds(now_ms, task_start_ms, task_paused_total_ms)
}

fn active_seconds(now_ms: i64, start_ms: i64, paused_ms: i64) -> u64 {
    let active_ms = now_ms
        .saturating_sub(start_ms)
        .saturating_sub(paused_ms);
    if active_ms <= 0 {
        0
    } else {
        (active_ms / 1000) as u64
    }
}

/// Length of a pause that began at `since_ms`, clamped at zero so a clock that
/// stepped backwards can never shrink the pause totals.
pub fn pause_interval(now_ms: i64, since_ms: i64) -> i64 {
    now_ms.saturating_sub(since_ms).max(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Time sources
// ─────────────────────────────────────────────────────────────────────────────

/// Where "now" comes from. Injected so tests can drive time explicitly.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<AtomicI64>,
}

impl ManualTimeSource {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
