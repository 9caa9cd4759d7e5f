// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations.

use lumo_core::LumoError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::Message;
use crate::queries::parse_column;

const MESSAGE_COLUMNS: &str =
    "id, session_id, author, content, created_at, audio_path, tts_voice";

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        author: parse_column(row, 2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        audio_path: row.get(5)?,
        tts_voice: row.get(6)?,
    })
}

/// Insert a message.
pub async fn insert_message(db: &Database, message: &Message) -> Result<(), LumoError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, author, content, created_at, audio_path, tts_voice)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    message.id,
                    message.session_id,
                    message.author.to_string(),
                    message.content,
                    message.created_at,
                    message.audio_path,
                    message.tts_voice,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a message by ID.
pub async fn get_message(db: &Database, id: &str) -> Result<Option<Message>, LumoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All messages of a session, oldest first. Insertion order breaks timestamp ties.
pub async fn get_messages_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<Message>, LumoError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![session_id], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Attach a synthesized audio reference. Returns false if the message does not exist.
pub async fn attach_audio(
    db: &Database,
    message_id: &str,
    audio_path: &str,
    voice: &str,
) -> Result<bool, LumoError> {
    let message_id = message_id.to_string();
    let audio_path = audio_path.to_string();
    let voice = voice.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET audio_path = ?1, tts_voice = ?2 WHERE id = ?3",
                params![audio_path, voice, message_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
