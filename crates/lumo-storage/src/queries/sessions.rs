// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use lumo_core::LumoError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{DeleteSummary, Session, SessionSummary};
use crate::queries::parse_column;

const SESSION_COLUMNS: &str = "s.id, s.user_id, s.category, s.title, s.created_at, s.updated_at, \
     s.is_active, s.is_completed, s.total_time_allowed, s.total_time_used, s.is_paused, \
     s.last_resume_time";

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: parse_column(row, 2)?,
        title: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        is_active: row.get(6)?,
        is_completed: row.get(7)?,
        total_time_allowed: row.get(8)?,
        total_time_used: row.get(9)?,
        is_paused: row.get(10)?,
        last_resume_time: row.get(11)?,
    })
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionSummary> {
    Ok(SessionSummary {
        session: session_from_row(row)?,
        message_count: row.get(12)?,
    })
}

/// Insert a new session.
pub async fn create_session(db: &Database, session: &Session) -> Result<(), LumoError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, category, title, created_at, updated_at,
                     is_active, is_completed, total_time_allowed, total_time_used, is_paused,
                     last_resume_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    session.id,
                    session.user_id,
                    session.category.to_string(),
                    session.title,
                    session.created_at,
                    session.updated_at,
                    session.is_active,
                    session.is_completed,
                    session.total_time_allowed,
                    session.total_time_used,
                    session.is_paused,
                    session.last_resume_time,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, LumoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions s WHERE s.id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List sessions newest first with their message counts.
///
/// `user_id = None` lists across all users; `limit = None` is unbounded.
pub async fn list_sessions(
    db: &Database,
    user_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<SessionSummary>, LumoError> {
    let user_id = user_id.map(str::to_string);
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS},
                     (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id)
                 FROM sessions s
                 WHERE ?1 IS NULL OR s.user_id = ?1
                 ORDER BY s.created_at DESC, s.rowid DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![user_id, limit], summary_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Persist the mutable fields of a session. Returns false if no row matched.
pub async fn update_session(db: &Database, session: &Session) -> Result<bool, LumoError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions SET title = ?1, updated_at = ?2, is_active = ?3,
                     is_completed = ?4, total_time_allowed = ?5, total_time_used = ?6,
                     is_paused = ?7, last_resume_time = ?8
                 WHERE id = ?9",
                params![
                    session.title,
                    session.updated_at,
                    session.is_active,
                    session.is_completed,
                    session.total_time_allowed,
                    session.total_time_used,
                    session.is_paused,
                    session.last_resume_time,
                    session.id,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the listed sessions that belong to `user_id`.
///
/// Messages, reports and scores go with them through `ON DELETE CASCADE`.
/// Ids owned by someone else or unknown are skipped.
pub async fn delete_sessions(
    db: &Database,
    user_id: &str,
    ids: &[String],
) -> Result<DeleteSummary, LumoError> {
    let user_id = user_id.to_string();
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut summary = DeleteSummary::default();
            for id in &ids {
                let messages: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM messages m JOIN sessions s ON s.id = m.session_id
                     WHERE s.id = ?1 AND s.user_id = ?2",
                    params![id, user_id],
                    |row| row.get(0),
                )?;
                let deleted = tx.execute(
                    "DELETE FROM sessions WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?;
                if deleted > 0 {
                    summary.sessions += deleted as u64;
                    summary.messages += messages as u64;
                }
            }
            tx.commit()?;
            Ok(summary)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every session owned by `user_id`.
pub async fn delete_all_sessions(db: &Database, user_id: &str) -> Result<DeleteSummary, LumoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let messages: i64 = tx.query_row(
                "SELECT COUNT(*) FROM messages m JOIN sessions s ON s.id = m.session_id
                 WHERE s.user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            let sessions = tx.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
            tx.commit()?;
            Ok(DeleteSummary {
                sessions: sessions as u64,
                messages: messages as u64,
            })
        })
        .await
        .map_err(map_tr_err)
}
