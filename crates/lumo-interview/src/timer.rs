// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session timer transitions.
//!
//! Every function takes the session and the current instant and mutates the
//! timer fields in place; persistence is the caller's job. A session is
//! *running* while it is active, not paused and not completed.

use chrono::{DateTime, Utc};
use lumo_core::{LumoError, Session};
use serde::Serialize;

pub use lumo_evaluation::time_management::{is_running, running_seconds, used_seconds};

/// Timer state reported by [`status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerState {
    Paused,
    Ended,
    Running,
}

/// Non-mutating snapshot of a session's timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerStatus {
    pub remaining_seconds: i64,
    pub progress_ratio: f64,
    pub message: &'static str,
    pub status: TimerState,
}

/// What a tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Running,
    /// The budget is used up; the session must be finished.
    Exhausted,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn fold_running_time(session: &mut Session, now: DateTime<Utc>) {
    session.total_time_used = used_seconds(session, now);
    session.last_resume_time = None;
}

/// Starts (or restarts) the clock. Rejected once the session is completed.
pub fn start(session: &mut Session, now: DateTime<Utc>) -> Result<(), LumoError> {
    if session.is_completed {
        return Err(LumoError::InvalidState(format!(
            "session {} is already completed",
            session.id
        )));
    }
    fold_running_time(session, now);
    session.is_active = true;
    session.is_paused = false;
    session.last_resume_time = Some(format_timestamp(now));
    Ok(())
}

/// Pauses a running session, folding the elapsed stretch into the used time.
pub fn pause(session: &mut Session, now: DateTime<Utc>) -> Result<(), LumoError> {
    if !is_running(session) {
        return Err(LumoError::InvalidState(format!(
            "session {} is not running",
            session.id
        )));
    }
    fold_running_time(session, now);
    session.is_paused = true;
    Ok(())
}

/// Resumes a paused session.
pub fn resume(session: &mut Session, now: DateTime<Utc>) -> Result<(), LumoError> {
    if !session.is_paused || session.is_completed {
        return Err(LumoError::InvalidState(format!(
            "session {} is not paused",
            session.id
        )));
    }
    session.is_paused = false;
    session.is_active = true;
    session.last_resume_time = Some(format_timestamp(now));
    Ok(())
}

/// Adds client-measured seconds to the used time.
///
/// A tick replaces wall-clock tracking: any pending running stretch is
/// dropped, not folded in.
pub fn tick(session: &mut Session, seconds: i64) -> Result<TickResult, LumoError> {
    if seconds < 0 {
        return Err(LumoError::BadRequest(
            "seconds must not be negative".to_string(),
        ));
    }
    if !is_running(session) {
        return Err(LumoError::InvalidState(format!(
            "session {} is not active or is paused",
            session.id
        )));
    }
    session.total_time_used = session.total_time_used.saturating_add(seconds);
    session.last_resume_time = None;

    if session.total_time_allowed - session.total_time_used <= 0 {
        Ok(TickResult::Exhausted)
    } else {
        Ok(TickResult::Running)
    }
}

/// Stops the clock for good and marks the session completed.
pub fn finish(session: &mut Session, now: DateTime<Utc>) {
    fold_running_time(session, now);
    session.is_paused = false;
    session.is_active = false;
    session.is_completed = true;
}

/// Remaining time, progress and a motivational line. Does not mutate.
pub fn status(session: &Session, now: DateTime<Utc>) -> TimerStatus {
    let used = used_seconds(session, now);
    let allowed = session.total_time_allowed;
    let remaining_seconds = (allowed - used).max(0);
    let progress_ratio = if allowed > 0 {
        used as f64 / allowed as f64
    } else {
        0.0
    };

    let status = if session.is_paused {
        TimerState::Paused
    } else if session.is_completed || remaining_seconds <= 0 {
        TimerState::Ended
    } else {
        TimerState::Running
    };

    TimerStatus {
        remaining_seconds,
        progress_ratio: (progress_ratio * 1000.0).round() / 1000.0,
        message: progress_message(progress_ratio),
        status,
    }
}

/// Encouragement for the current stage of the session.
pub fn progress_message(ratio: f64) -> &'static str {
    if ratio < 0.25 {
        "Take a moment to connect with the question."
    } else if ratio < 0.5 {
        "Keep going, stay clear and focused."
    } else if ratio < 0.75 {
        "You are in the most demanding stretch: keep your energy up."
    } else if ratio < 0.9 {
        "Sometimes the best comes at the end."
    } else {
        "Close with intention and trust what you have already said."
    }
}
