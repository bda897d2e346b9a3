//! Interactive session in the terminal.
//!
//! Commands are single letters read line by line from stdin. The ticker
//! repaints a status line once per displayed second while the clock runs.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cadence_core::{
    load_routine, CadenceError, LifecycleEvent, LifecycleOutcome, RecordLog, Result,
    RoutineSession, SessionController, SessionError, SessionView, StorageConfig,
    SystemTimeSource, TickSink, TickSource, TimeSource, TimerConfig,
};
use tracing::info;

use crate::backend::FileRoutineBackend;
use crate::commands::{is_yes, snapshot_store};
use crate::render;

const HELP: &str = "\
  p  start / pause / resume
  c  complete task
  s  skip task
  b  back to previous task
  f  finish and save
  r  reset
  v  refresh
  q  quit (progress is kept)";

/// Repaints only when the displayed second changes.
struct TerminalSink {
    last_second: AtomicU64,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            last_second: AtomicU64::new(u64::MAX),
        }
    }
}

impl TickSink for TerminalSink {
    fn on_tick(&self, _source: TickSource, view: &SessionView) {
        if self.last_second.swap(view.global_elapsed, Ordering::Relaxed) == view.global_elapsed {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = write!(out, "\r{}   ", render::status_line(view));
        let _ = out.flush();
    }
}

pub fn run(storage: &StorageConfig, config: TimerConfig, routine_path: &Path) -> Result<()> {
    let routine = load_routine(routine_path)?;
    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let store = snapshot_store(storage, Arc::clone(&clock), &config);
    let backend = FileRoutineBackend::new(RecordLog::new(storage.records_file()));
    let ticker_config = config.ticker.clone();

    info!(routine_id = %routine.id, path = %routine_path.display(), "Opening routine");
    let session = RoutineSession::open(routine, store, Arc::new(backend), clock, config);
    let mut controller =
        SessionController::new(session, ticker_config, Arc::new(TerminalSink::new()));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    if let Some(offer) = controller.pending_restore() {
        println!("{}", render::restore_prompt(&offer));
        match read_line(&mut lines)?.as_deref().map(str::trim) {
            Some("n") => {
                controller.discard_snapshot();
            }
            _ => report(controller.restore_from_snapshot()),
        }
    }

    println!("{HELP}");
    show(&controller.view());

    loop {
        let Some(line) = read_line(&mut lines)? else {
            // stdin closed: save and leave without asking.
            controller.handle_lifecycle(LifecycleEvent::Suspending);
            break;
        };

        match line.trim() {
            "p" => report(controller.toggle()),
            "c" => report(controller.complete_current_task()),
            "s" => report(controller.skip_current_task()),
            "b" => report(controller.go_back()),
            "f" => finish(&mut controller),
            "r" => show(&controller.reset()),
            "v" => match controller.handle_lifecycle(LifecycleEvent::Foregrounded) {
                LifecycleOutcome::Refreshed { view } => show(&view),
                _ => show(&controller.view()),
            },
            "q" => {
                if confirm_quit(&mut controller, &mut lines)? {
                    break;
                }
            }
            "" => show(&controller.view()),
            "h" | "?" => println!("{HELP}"),
            other => println!("Unknown command {other:?}, h for help"),
        }
    }

    controller.shutdown();
    Ok(())
}

fn read_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<String>> {
    lines
        .next()
        .transpose()
        .map_err(|err| CadenceError::io("reading command", err))
}

fn show(view: &SessionView) {
    println!("\r{}", render::status_line(view));
}

fn report(result: std::result::Result<SessionView, SessionError>) {
    match result {
        Ok(view) => show(&view),
        Err(err) => println!("{err}"),
    }
}

fn finish(controller: &mut SessionController) {
    match controller.finish() {
        Ok(record) => println!("Saved  {}", render::record_line(&record)),
        Err(SessionError::RecordRejected { record, reason }) => println!(
            "Finished but not saved ({reason})  {}",
            render::record_line(&record)
        ),
        Err(err) => println!("{err}"),
    }
}

/// Saves, then asks before leaving a running clock behind.
fn confirm_quit(
    controller: &mut SessionController,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<bool> {
    match controller.handle_lifecycle(LifecycleEvent::Suspending) {
        LifecycleOutcome::ConfirmationRequired { persisted, .. } => {
            if !persisted {
                println!("Warning: progress could not be saved");
            }
            print!("The timer is still running and will keep counting. Quit anyway? [y/N] ");
            let _ = io::stdout().flush();
            Ok(read_line(lines)?.is_some_and(|answer| is_yes(&answer)))
        }
        LifecycleOutcome::Saved { persisted: false } => {
            println!("Warning: progress could not be saved");
            Ok(true)
        }
        _ => Ok(true),
    }
}
