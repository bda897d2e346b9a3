//! Routine session state machine.
//!
//! # Phases
//!
//! ```text
//! Idle ──start──▶ Running ◀──resume── Paused
//!                   │  └────pause────▶  │
//!                   └──complete/skip (last task)──▶ AwaitingFinish
//! any started phase ──finish──▶ Idle (+ SessionRecord)
//! any phase ──reset──▶ Idle
//! ```
//!
//! # Module Structure
//!
//! - [`state`]: runtime fields, elapsed derivation, snapshot mapping
//! - [`view`]: derived display values returned by every operation
//! - [`machine`]: [`RoutineSession`], the single owner of a session's state
//! - [`restore`]: the resume-or-start-fresh decision on open

mod machine;
mod restore;
mod state;
mod view;

pub use machine::RoutineSession;
pub use restore::RestoreOffer;
pub use state::{SessionPhase, SessionRuntimeState};
pub use view::SessionView;
