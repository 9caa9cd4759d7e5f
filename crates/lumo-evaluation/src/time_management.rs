// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-management heuristic: scores used time against the session budget.

use chrono::{DateTime, Utc};
use lumo_core::Session;
use serde::Serialize;

use crate::scoring::parse_timestamp;

/// Lower edge of the ratio band that earns a perfect score.
const WELL_USED_RATIO: f64 = 0.8;

/// Floor for sessions finished early.
const EARLY_FLOOR: f64 = 4.0;

pub const FEEDBACK_NO_BUDGET: &str =
    "Time management was not evaluated because the session had no time budget.";
pub const FEEDBACK_WELL_USED: &str =
    "Great time management: you used the available time fully without running over.";
pub const FEEDBACK_EARLY: &str = "You finished well ahead of time. Take a little longer to \
elaborate on your answers with concrete examples.";
pub const FEEDBACK_OVERRUN: &str = "You went over the allotted time. Practise condensing your \
answers to the essential points.";
pub const FEEDBACK_INTERRUPTED: &str =
    "The session was interrupted, so time management was not evaluated.";

/// Heuristic output stored on the feedback report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAssessment {
    pub feedback: String,
    pub score: Option<f64>,
}

/// Scores `used_secs` against `allotted_secs`.
///
/// - `allotted <= 0`: disabled, no score
/// - `0.8 <= ratio <= 1.0`: 10.0
/// - `ratio < 0.8`: `10 * ratio / 0.8` rounded to one decimal, at least 4.0
/// - `ratio > 1.0`: `10 / ratio` rounded to one decimal, at least 0.0
pub fn assess_time(allotted_secs: i64, used_secs: i64) -> TimeAssessment {
    if allotted_secs <= 0 {
        return TimeAssessment {
            feedback: FEEDBACK_NO_BUDGET.to_string(),
            score: None,
        };
    }

    let ratio = used_secs as f64 / allotted_secs as f64;
    let (score, feedback) = if (WELL_USED_RATIO..=1.0).contains(&ratio) {
        (10.0, FEEDBACK_WELL_USED)
    } else if ratio < WELL_USED_RATIO {
        (
            round1(10.0 * (ratio / WELL_USED_RATIO)).max(EARLY_FLOOR),
            FEEDBACK_EARLY,
        )
    } else {
        (round1(10.0 / ratio).max(0.0), FEEDBACK_OVERRUN)
    };

    TimeAssessment {
        feedback: feedback.to_string(),
        score: Some(score),
    }
}

/// The assessment recorded when a session ends by interruption.
pub fn interrupted() -> TimeAssessment {
    TimeAssessment {
        feedback: FEEDBACK_INTERRUPTED.to_string(),
        score: None,
    }
}

/// A session's clock runs while it is active, not paused and not completed.
pub fn is_running(session: &Session) -> bool {
    session.is_active && !session.is_paused && !session.is_completed
}

/// Seconds since the last resume, 0 when the session is not running.
pub fn running_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    if !is_running(session) {
        return 0;
    }
    session
        .last_resume_time
        .as_deref()
        .and_then(parse_timestamp)
        .map_or(0, |resumed| (now - resumed).num_seconds().max(0))
}

/// Used time including the current running stretch.
pub fn used_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    session.total_time_used + running_seconds(session, now)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
