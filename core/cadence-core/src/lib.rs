//! # cadence-core
//!
//! Timing engine for Cadence routine sessions: a user works through an
//! ordered list of timed tasks, and the session survives pauses, reloads,
//! suspension and long absences without drifting.
//!
//! ## Design Principles
//!
//! - **Timestamps, not counters**: elapsed time is always recomputed from
//!   absolute instants and accumulated pause totals. Missed ticks never lose time.
//! - **Synchronous**: No async runtime dependency. The only threads are the
//!   optional display ticker's.
//! - **Graceful degradation**: Snapshot storage failures are logged and treated
//!   as "no snapshot", never surfaced as errors.
//! - **Caller decides**: restore and leave-while-running are reported as
//!   outcomes; nothing here blocks on a prompt.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_core::*;
//!
//! let storage = StorageConfig::from_home()?;
//! let config = load_timer_config(&storage.config_file())?;
//! let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
//! let store = SnapshotStore::new(
//!     Box::new(FileSnapshotBackend::new(storage.clone())),
//!     clock.clone(),
//!     &config,
//! );
//! let mut session = RoutineSession::open(routine, store, backend, clock, config);
//! if session.pending_restore().is_some() {
//!     session.restore_from_snapshot()?;
//! }
//! session.start()?;
//! ```

pub mod clock;
pub mod collaborator;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod routines;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod ticker;

// Re-export commonly used items at crate root
pub use clock::{elapsed_global, elapsed_task, ManualTimeSource, SystemTimeSource, TimeSource};
pub use collaborator::RoutineBackend;
pub use config::{load_timer_config, TickerConfig, TimerConfig};
pub use controller::SessionController;
pub use error::{CadenceError, Result, SessionError};
pub use history::RecordLog;
pub use lifecycle::{reconcile, LifecycleEvent, LifecycleOutcome};
pub use routines::load_routine;
pub use session::{RestoreOffer, RoutineSession, SessionPhase, SessionRuntimeState, SessionView};
pub use snapshot::{FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend, SnapshotStore};
pub use storage::StorageConfig;
pub use ticker::{lock_session, SessionHandle, TickSink, TickSource, Ticker};
