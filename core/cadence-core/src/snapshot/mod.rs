//! Durable, routine-scoped persistence of in-progress sessions.
//!
//! ```text
//! RoutineSession → SnapshotStore → SnapshotBackend → snapshots/session-{id}.json
//!   (mutations)     (policy)         (raw key/value)     (storage)
//! ```
//!
//! The store owns policy: schema versioning, staleness expiry, and swallowing
//! storage failures. Backends only move strings.
//!
//! - [`backend`]: the key/value port plus file and in-memory implementations
//! - [`store`]: save/load/clear with staleness and corruption handling

mod backend;
mod store;

pub use backend::{FileSnapshotBackend, MemorySnapshotBackend, SnapshotBackend};
pub use store::SnapshotStore;
