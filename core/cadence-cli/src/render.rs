//! Plain-text rendering of session values.

use cadence_core::{RestoreOffer, SessionPhase, SessionView};
use cadence_session_protocol::{parse_iso, SessionRecord};

/// `m:ss`, or `h:mm:ss` once past an hour.
pub fn clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Signed clock, e.g. `-2:14` under target or `+0:30` over.
pub fn delta(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    format!("{sign}{}", clock(seconds.unsigned_abs()))
}

pub fn status_line(view: &SessionView) -> String {
    let phase = match view.phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Running => "running",
        SessionPhase::Paused => "paused",
        SessionPhase::AwaitingFinish => "done, finish to save",
    };

    let task = match (view.current_task_index, &view.current_task_title) {
        (Some(index), Some(title)) => {
            let elapsed = view.per_task_elapsed.unwrap_or(0);
            let target = view.current_task_target.unwrap_or(0);
            format!(
                " | {}/{} {title} {} / {}",
                index + 1,
                view.tasks_total,
                clock(elapsed),
                clock(target)
            )
        }
        _ => String::new(),
    };

    format!(
        "[{phase}] total {} / {}{task}",
        clock(view.global_elapsed),
        clock(view.total_target)
    )
}

pub fn restore_prompt(offer: &RestoreOffer) -> String {
    let step = offer
        .current_task_index
        .map(|index| format!("task {} of {}", index + 1, offer.tasks_total))
        .unwrap_or_else(|| "all tasks done".to_string());
    let mode = if offer.resumes_running {
        "resume running"
    } else {
        "resume paused"
    };
    format!(
        "Unfinished session found ({step}, last saved {} ago). [r] {mode}  [n] start fresh",
        clock((offer.away_ms.max(0) / 1000) as u64)
    )
}

pub fn record_line(record: &SessionRecord) -> String {
    let started = parse_iso(&record.start_iso)
        .map(|at| {
            at.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| record.date_iso.clone());
    format!(
        "{started}  {:<16} {} / {} ({})  {}/{} tasks",
        record.routine_id,
        clock(record.actual_seconds),
        clock(record.target_seconds),
        delta(record.delta_seconds),
        record.tasks_completed,
        record.tasks_total
    )
}
