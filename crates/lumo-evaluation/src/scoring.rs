// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metrics derived from a repaired rubric and the message history.

use chrono::{DateTime, Utc};
use lumo_core::{Message, PerformanceLevel};

use crate::rubric::CompetencyAssessment;

/// Arithmetic mean of the competency scores; 0.0 for an empty slice.
pub fn average_score(competencies: &[CompetencyAssessment]) -> f64 {
    if competencies.is_empty() {
        return 0.0;
    }
    let total: i64 = competencies.iter().map(|c| c.score).sum();
    total as f64 / competencies.len() as f64
}

/// Maps an aggregate score to its performance level.
pub fn performance_level(average: f64) -> PerformanceLevel {
    if average >= 8.0 {
        PerformanceLevel::Excellent
    } else if average >= 6.0 {
        PerformanceLevel::Good
    } else if average >= 4.0 {
        PerformanceLevel::Fair
    } else {
        PerformanceLevel::NeedsImprovement
    }
}

/// Whole minutes between the first and last message.
///
/// At least 1 once two messages exist, 0 otherwise. Unparseable timestamps
/// count as no elapsed time.
pub fn session_duration_minutes(messages: &[Message]) -> i64 {
    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        return 0;
    };
    if messages.len() < 2 {
        return 0;
    }
    let elapsed = match (parse_timestamp(&first.created_at), parse_timestamp(&last.created_at)) {
        (Some(start), Some(end)) => (end - start).num_minutes(),
        _ => 0,
    };
    elapsed.max(1)
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
