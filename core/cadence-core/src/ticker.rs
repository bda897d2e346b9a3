//! Background display ticker.
//!
//! While a session runs, two independent workers ask for a recomputed
//! [`SessionView`] and pass it to a [`TickSink`]: a frame-rate worker for a
//! smooth display and a slower fallback that keeps the display alive when
//! the host throttles the fast one. Both are idempotent because every view
//! is recomputed from timestamps; extra or missing ticks never change what
//! is shown.
//!
//! The ticker never mutates the session. It reads through the shared
//! [`SessionHandle`] and suppresses ticks whenever the session is not running.
//!
//! # Cancellation
//!
//! [`Ticker::stop`] wakes both workers and joins them before returning, so no
//! tick is delivered after `stop` returns. Do not call `stop` (or `start`)
//! while holding the session lock or from inside a sink callback: the join
//! would wait on a worker that is waiting on you.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::TickerConfig;
use crate::session::{RoutineSession, SessionView};

/// The single shared owner of a session, read by the ticker workers.
pub type SessionHandle = Arc<Mutex<RoutineSession>>;

/// Locks the session, recovering the guard if a previous holder panicked.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, RoutineSession> {
    handle
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    Frame,
    Fallback,
}

/// Receives recomputed display values.
pub trait TickSink: Send + Sync {
    fn on_tick(&self, source: TickSource, view: &SessionView);
}

impl<F> TickSink for F
where
    F: Fn(TickSource, &SessionView) + Send + Sync,
{
    fn on_tick(&self, source: TickSource, view: &SessionView) {
        self(source, view)
    }
}

struct Worker {
    stop_tx: Sender<()>,
    join: JoinHandle<()>,
}

pub struct Ticker {
    config: TickerConfig,
    alive: Arc<AtomicBool>,
    workers: Vec<Worker>,
}

impl Ticker {
    pub fn new(config: TickerConfig) -> Self {
        Self {
            config,
            alive: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Starts both workers. Any previous workers are stopped first, so at
    /// most one pair is ever scheduled.
    pub fn start(&mut self, handle: SessionHandle, sink: Arc<dyn TickSink>) {
        self.stop();

        // Fresh flag per run: a worker from an earlier run can never observe
        // this run as alive.
        let alive = Arc::new(AtomicBool::new(true));
        self.alive = Arc::clone(&alive);

        for (source, interval) in [
            (TickSource::Frame, self.config.frame_interval()),
            (TickSource::Fallback, self.config.fallback_interval()),
        ] {
            match spawn_worker(
                source,
                interval,
                handle.clone(),
                Arc::clone(&sink),
                Arc::clone(&alive),
            ) {
                Ok(worker) => self.workers.push(worker),
                Err(err) => warn!(?source, error = %err, "Failed to spawn ticker worker"),
            }
        }

        debug!(workers = self.workers.len(), "Ticker started");
    }

    /// Stops and joins all workers. Idempotent.
    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if self.workers.is_empty() {
            return;
        }

        for worker in self.workers.drain(..) {
            let _ = worker.stop_tx.send(());
            if worker.join.join().is_err() {
                warn!("Ticker worker panicked");
            }
        }
        debug!("Ticker stopped");
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_worker(
    source: TickSource,
    interval: Duration,
    handle: SessionHandle,
    sink: Arc<dyn TickSink>,
    alive: Arc<AtomicBool>,
) -> std::io::Result<Worker> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let name = match source {
        TickSource::Frame => "cadence-tick-frame",
        TickSource::Fallback => "cadence-tick-fallback",
    };

    let join = thread::Builder::new().name(name.to_string()).spawn(move || loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if !alive.load(Ordering::SeqCst) {
            break;
        }

        let view = {
            let session = lock_session(&handle);
            if !session.is_running() {
                continue;
            }
            session.view()
        };

        // Re-check after the lock: stop() may have run while we waited.
        if !alive.load(Ordering::SeqCst) {
            break;
        }
        sink.on_tick(source, &view);
    })?;

    Ok(Worker { stop_tx, join })
}
