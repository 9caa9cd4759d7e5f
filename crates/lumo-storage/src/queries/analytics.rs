// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user analytics rollup rows.

use lumo_core::LumoError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::UserAnalytics;

/// Fetch a user's rollup row.
pub async fn get_user_analytics(
    db: &Database,
    user_id: &str,
) -> Result<Option<UserAnalytics>, LumoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT user_id, total_sessions_evaluated, average_overall_score,
                     total_questions_answered, total_session_time_minutes, time_scored_sessions,
                     time_score_sum, average_time_management_score, strongest_competency,
                     weakest_competency, last_updated
                 FROM user_analytics WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserAnalytics {
                        user_id: row.get(0)?,
                        total_sessions_evaluated: row.get(1)?,
                        average_overall_score: row.get(2)?,
                        total_questions_answered: row.get(3)?,
                        total_session_time_minutes: row.get(4)?,
                        time_scored_sessions: row.get(5)?,
                        time_score_sum: row.get(6)?,
                        average_time_management_score: row.get(7)?,
                        strongest_competency: row.get(8)?,
                        weakest_competency: row.get(9)?,
                        last_updated: row.get(10)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or fully replace a user's rollup row.
pub async fn upsert_user_analytics(
    db: &Database,
    analytics: &UserAnalytics,
) -> Result<(), LumoError> {
    let a = analytics.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_analytics (user_id, total_sessions_evaluated,
                     average_overall_score, total_questions_answered, total_session_time_minutes,
                     time_scored_sessions, time_score_sum, average_time_management_score,
                     strongest_competency, weakest_competency, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (user_id) DO UPDATE SET
                     total_sessions_evaluated = excluded.total_sessions_evaluated,
                     average_overall_score = excluded.average_overall_score,
                     total_questions_answered = excluded.total_questions_answered,
                     total_session_time_minutes = excluded.total_session_time_minutes,
                     time_scored_sessions = excluded.time_scored_sessions,
                     time_score_sum = excluded.time_score_sum,
                     average_time_management_score = excluded.average_time_management_score,
                     strongest_competency = excluded.strongest_competency,
                     weakest_competency = excluded.weakest_competency,
                     last_updated = excluded.last_updated",
                params![
                    a.user_id,
                    a.total_sessions_evaluated,
                    a.average_overall_score,
                    a.total_questions_answered,
                    a.total_session_time_minutes,
                    a.time_scored_sessions,
                    a.time_score_sum,
                    a.average_time_management_score,
                    a.strongest_competency,
                    a.weakest_competency,
                    a.last_updated,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
