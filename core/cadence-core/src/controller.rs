//! Session + ticker wiring for hosts.
//!
//! [`SessionController`] owns the shared session handle and the ticker, and
//! keeps them in step: after every operation the ticker runs if and only if
//! the session is running. Operations release the session lock before the
//! ticker is touched, which is what makes stopping deadlock-free.

use std::sync::{Arc, Mutex};

use cadence_session_protocol::SessionRecord;

use crate::config::TickerConfig;
use crate::error::SessionError;
use crate::lifecycle::{LifecycleEvent, LifecycleOutcome};
use crate::session::{RestoreOffer, RoutineSession, SessionView};
use crate::ticker::{lock_session, SessionHandle, TickSink, Ticker};

pub struct SessionController {
    handle: SessionHandle,
    ticker: Ticker,
    sink: Arc<dyn TickSink>,
}

impl SessionController {
    pub fn new(
        session: RoutineSession,
        ticker_config: TickerConfig,
        sink: Arc<dyn TickSink>,
    ) -> Self {
        Self {
            handle: Arc::new(Mutex::new(session)),
            ticker: Ticker::new(ticker_config),
            sink,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        Arc::clone(&self.handle)
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    pub fn view(&self) -> SessionView {
        lock_session(&self.handle).view()
    }

    pub fn pending_restore(&self) -> Option<RestoreOffer> {
        lock_session(&self.handle).pending_restore()
    }

    pub fn start(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.start())
    }

    pub fn pause(&mut self) -> SessionView {
        self.apply(|s| s.pause())
    }

    pub fn resume(&mut self) -> SessionView {
        self.apply(|s| s.resume())
    }

    pub fn toggle(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.toggle())
    }

    pub fn complete_current_task(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.complete_current_task())
    }

    pub fn skip_current_task(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.skip_current_task())
    }

    pub fn go_back(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.go_back())
    }

    pub fn finish(&mut self) -> Result<SessionRecord, SessionError> {
        self.apply(|s| s.finish())
    }

    pub fn reset(&mut self) -> SessionView {
        self.apply(|s| s.reset())
    }

    pub fn restore_from_snapshot(&mut self) -> Result<SessionView, SessionError> {
        self.apply(|s| s.restore_from_snapshot())
    }

    pub fn discard_snapshot(&mut self) -> SessionView {
        self.apply(|s| s.discard_snapshot())
    }

    pub fn delete_routine(&mut self) -> Result<bool, SessionError> {
        self.apply(|s| s.delete_routine())
    }

    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) -> LifecycleOutcome {
        self.apply(|s| s.handle_lifecycle(event))
    }

    /// Stops the ticker and returns the session.
    pub fn shutdown(mut self) -> SessionHandle {
        self.ticker.stop();
        Arc::clone(&self.handle)
    }

    fn apply<T>(&mut self, op: impl FnOnce(&mut RoutineSession) -> T) -> T {
        let (out, running) = {
            let mut session = lock_session(&self.handle);
            let out = op(&mut session);
            (out, session.is_running())
        };
        self.sync_ticker(running);
        out
    }

    fn sync_ticker(&mut self, running: bool) {
        match (running, self.ticker.is_active()) {
            (true, false) => self
                .ticker
                .start(Arc::clone(&self.handle), Arc::clone(&self.sink)),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }
}
