// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback reports and competency scores.

use lumo_core::LumoError;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::models::{CompetencyScore, FeedbackReport};
use crate::queries::parse_column;

const REPORT_COLUMNS: &str = "r.id, r.session_id, r.overall_feedback, r.average_score, \
     r.performance_level, r.questions_analyzed, r.session_duration_minutes, \
     r.time_management_score, r.feedback_time, r.time_evaluation_enabled, r.generated_at";

const SCORE_COLUMNS: &str = "c.id, c.session_id, c.competency_name, c.score, c.feedback, \
     c.example, c.improvement_area, c.created_at";

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedbackReport> {
    Ok(FeedbackReport {
        id: row.get(0)?,
        session_id: row.get(1)?,
        overall_feedback: row.get(2)?,
        average_score: row.get(3)?,
        performance_level: parse_column(row, 4)?,
        questions_analyzed: row.get(5)?,
        session_duration_minutes: row.get(6)?,
        time_management_score: row.get(7)?,
        feedback_time: row.get(8)?,
        time_evaluation_enabled: row.get(9)?,
        generated_at: row.get(10)?,
    })
}

fn score_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CompetencyScore> {
    Ok(CompetencyScore {
        id: row.get(0)?,
        session_id: row.get(1)?,
        competency_name: row.get(2)?,
        score: row.get(3)?,
        feedback: row.get(4)?,
        example: row.get(5)?,
        improvement_area: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// The report of a session, if it has been evaluated.
pub async fn get_report(
    db: &Database,
    session_id: &str,
) -> Result<Option<FeedbackReport>, LumoError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM feedback_reports r WHERE r.session_id = ?1"),
                params![session_id],
                report_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Competency scores of a session in competency display order.
pub async fn get_scores(
    db: &Database,
    session_id: &str,
) -> Result<Vec<CompetencyScore>, LumoError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCORE_COLUMNS} FROM competency_scores c
                 LEFT JOIN competency_definitions d ON d.name = c.competency_name
                 WHERE c.session_id = ?1
                 ORDER BY d.display_order ASC, c.competency_name ASC"
            ))?;
            let rows = stmt.query_map(params![session_id], score_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Write a report and its score rows in one transaction.
///
/// A second report for the same session trips the `session_id UNIQUE`
/// constraint; the transaction is rolled back and
/// [`LumoError::AlreadyEvaluated`] is returned.
pub async fn insert_evaluation(
    db: &Database,
    report: &FeedbackReport,
    scores: &[CompetencyScore],
) -> Result<(), LumoError> {
    let report = report.clone();
    let scores = scores.to_vec();
    let session_id = report.session_id.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let result = tx.execute(
                "INSERT INTO feedback_reports (id, session_id, overall_feedback, average_score,
                     performance_level, questions_analyzed, session_duration_minutes,
                     time_management_score, feedback_time, time_evaluation_enabled, generated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    report.id,
                    report.session_id,
                    report.overall_feedback,
                    report.average_score,
                    report.performance_level.to_string(),
                    report.questions_analyzed,
                    report.session_duration_minutes,
                    report.time_management_score,
                    report.feedback_time,
                    report.time_evaluation_enabled,
                    report.generated_at,
                ],
            );
            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(false),
                Err(e) => return Err(e),
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO competency_scores (id, session_id, competency_name, score,
                         feedback, example, improvement_area, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for score in &scores {
                    stmt.execute(params![
                        score.id,
                        score.session_id,
                        score.competency_name,
                        score.score,
                        score.feedback,
                        score.example,
                        score.improvement_area,
                        score.created_at,
                    ])?;
                }
            }

            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        debug!(%session_id, "evaluation rows committed");
        Ok(())
    } else {
        Err(LumoError::AlreadyEvaluated { session_id })
    }
}

/// Rewrite the time-management fields of a session's report.
/// Returns false if the session has no report.
pub async fn update_report_time(
    db: &Database,
    session_id: &str,
    time_management_score: Option<f64>,
    feedback_time: Option<&str>,
    time_evaluation_enabled: bool,
) -> Result<bool, LumoError> {
    let session_id = session_id.to_string();
    let feedback_time = feedback_time.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE feedback_reports
                 SET time_management_score = ?1, feedback_time = ?2, time_evaluation_enabled = ?3
                 WHERE session_id = ?4",
                params![
                    time_management_score,
                    feedback_time,
                    time_evaluation_enabled,
                    session_id
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Every report on a user's sessions, oldest first.
pub async fn list_reports_for_user(
    db: &Database,
    user_id: &str,
) -> Result<Vec<FeedbackReport>, LumoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM feedback_reports r
                 JOIN sessions s ON s.id = r.session_id
                 WHERE s.user_id = ?1
                 ORDER BY r.generated_at ASC, r.rowid ASC"
            ))?;
            let rows = stmt.query_map(params![user_id], report_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every competency score on a user's sessions, oldest first.
pub async fn list_scores_for_user(
    db: &Database,
    user_id: &str,
) -> Result<Vec<CompetencyScore>, LumoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCORE_COLUMNS} FROM competency_scores c
                 JOIN sessions s ON s.id = c.session_id
                 WHERE s.user_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC"
            ))?;
            let rows = stmt.query_map(params![user_id], score_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
