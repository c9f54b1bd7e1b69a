use anyhow::Result;
use rusqlite::{Connection, Row, params};

use couple_types::models::{Message, toggle_reaction};

use super::OptionalExt;
use crate::Database;
use crate::models::{MessageRow, encode_reactions, now_timestamp, parse_reactions};

const MESSAGE_COLUMNS: &str = "id, chat_key, sender, text, kind, image_url, unlock_at, status, \
                               is_pinned, reactions, timestamp, created_at";

/// Fields the client controls when posting a message.
#[derive(Debug, Clone)]
pub struct NewMessageRecord {
    pub id: String,
    pub chat_key: String,
    pub sender: String,
    pub text: String,
    pub kind: String,
    pub image_url: Option<String>,
    pub unlock_at: Option<String>,
    pub status: String,
    pub is_pinned: bool,
    pub timestamp: Option<String>,
}

impl Database {
    /// Insert a message, or overwrite the client-controlled fields of an
    /// existing one with the same id. Reactions survive a re-post.
    pub fn upsert_message(&self, msg: &NewMessageRecord) -> Result<Message> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages
                    (id, chat_key, sender, text, kind, image_url, unlock_at, status, is_pinned, timestamp, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    kind = excluded.kind,
                    image_url = excluded.image_url,
                    unlock_at = excluded.unlock_at,
                    status = excluded.status,
                    is_pinned = excluded.is_pinned",
                params![
                    msg.id,
                    msg.chat_key,
                    msg.sender,
                    msg.text,
                    msg.kind,
                    msg.image_url,
                    msg.unlock_at,
                    msg.status,
                    msg.is_pinned,
                    msg.timestamp,
                    now_timestamp(),
                ],
            )?;
            require_message(conn, &msg.id)
        })
    }

    /// Most recent `limit` messages of a chat, oldest first.
    pub fn get_messages(&self, chat_key: &str, limit: u32) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM (
                    SELECT rowid AS seq, * FROM messages WHERE chat_key = ?1
                    ORDER BY created_at DESC, seq DESC LIMIT ?2
                 ) ORDER BY created_at ASC, seq ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![chat_key, limit], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Message::from).collect())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn edit_message(&self, id: &str, text: &str) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET text = ?2, status = 'edited' WHERE id = ?1",
                params![id, text],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, id)
        })
    }

    pub fn set_message_pinned(&self, id: &str, pinned: bool) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_pinned = ?2 WHERE id = ?1",
                params![id, pinned],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, id)
        })
    }

    /// Toggle a reaction by rewriting the whole reactions array.
    /// Returns None if the message does not exist.
    pub fn toggle_message_reaction(
        &self,
        id: &str,
        user: &str,
        emoji: &str,
    ) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let current: Option<String> = tx
                .query_row("SELECT reactions FROM messages WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(raw) = current else {
                return Ok(None);
            };

            let mut reactions = parse_reactions(&raw);
            toggle_reaction(&mut reactions, user, emoji);

            tx.execute(
                "UPDATE messages SET reactions = ?2 WHERE id = ?1",
                params![id, encode_reactions(&reactions)],
            )?;
            let updated = query_message(&tx, id)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a message, returning it so callers know which chat to notify.
    pub fn delete_message(&self, id: &str) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let existing = query_message(conn, id)?;
            if existing.is_some() {
                conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            }
            Ok(existing)
        })
    }

    pub fn clear_chat(&self, chat_key: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM messages WHERE chat_key = ?1", [chat_key])?;
            Ok(removed)
        })
    }
}

fn map_message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_key: row.get(1)?,
        sender: row.get(2)?,
        text: row.get(3)?,
        kind: row.get(4)?,
        image_url: row.get(5)?,
        unlock_at: row.get(6)?,
        status: row.get(7)?,
        is_pinned: row.get(8)?,
        reactions: row.get(9)?,
        timestamp: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<Message>> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_message_row).optional()?;
    Ok(row.map(Message::from))
}

fn require_message(conn: &Connection, id: &str) -> Result<Message> {
    query_message(conn, id)?.ok_or_else(|| anyhow::anyhow!("Message vanished after write: {}", id))
}
