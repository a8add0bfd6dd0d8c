//! CRUD operations for chat [`Message`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use scout_shared::models::Message;
use scout_shared::thread::ThreadKey;
use scout_shared::types::{MessageId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::rows::{conversion_err, parse_opt_ts, parse_uuid, ts};

const MESSAGE_COLUMNS: &str = "id, thread_key, author_id, body, created_at, \
                               deleted_at, deleted_by, is_pinned, pinned_at, pinned_by";

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            "INSERT INTO messages (id, thread_key, author_id, body, created_at, deleted_at,
                                   deleted_by, is_pinned, pinned_at, pinned_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                message.id.0.to_string(),
                message.thread.as_str(),
                message.author_id.as_ref().map(UserId::as_str),
                message.body,
                message.created_at.as_ref().map(ts),
                message.deleted_at.as_ref().map(ts),
                message.deleted_by.as_ref().map(UserId::as_str),
                message.is_pinned,
                message.pinned_at.as_ref().map(ts),
                message.pinned_by.as_ref().map(UserId::as_str),
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` messages of a thread, oldest first.
    pub fn get_messages_for_thread(&self, thread: &ThreadKey, limit: u32) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                 SELECT {MESSAGE_COLUMNS}, rowid AS seq
                 FROM messages
                 WHERE thread_key = ?1
                 ORDER BY created_at DESC, seq DESC
                 LIMIT ?2
             )
             ORDER BY created_at ASC, seq ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![thread.as_str(), limit], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_message_by_id(&self, id: MessageId) -> Result<Message> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        self.conn()
            .query_row(&sql, params![id.0.to_string()], row_to_message)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Soft-delete a message. Returns `false` if it was missing or already
    /// deleted.
    pub fn soft_delete_message(
        &self,
        id: MessageId,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET deleted_at = ?2, deleted_by = ?3
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.0.to_string(), ts(&at), by.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn set_message_pinned(
        &self,
        id: MessageId,
        pinned: bool,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let (pinned_at, pinned_by) = if pinned {
            (Some(ts(&at)), Some(by.as_str()))
        } else {
            (None, None)
        };
        let affected = self.conn().execute(
            "UPDATE messages SET is_pinned = ?2, pinned_at = ?3, pinned_by = ?4
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.0.to_string(), pinned, pinned_at, pinned_by],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let thread_str: String = row.get(1)?;
    let author: Option<String> = row.get(2)?;
    let body: String = row.get(3)?;
    let created_at: Option<String> = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;
    let deleted_by: Option<String> = row.get(6)?;
    let is_pinned: bool = row.get(7)?;
    let pinned_at: Option<String> = row.get(8)?;
    let pinned_by: Option<String> = row.get(9)?;

    let thread: ThreadKey = thread_str.parse().map_err(|e| conversion_err(1, e))?;

    Ok(Message {
        id: MessageId(parse_uuid(0, &id_str)?),
        thread,
        author_id: author.map(UserId),
        body,
        created_at: parse_opt_ts(4, created_at)?,
        deleted_at: parse_opt_ts(5, deleted_at)?,
        deleted_by: deleted_by.map(UserId),
        is_pinned,
        pinned_at: parse_opt_ts(8, pinned_at)?,
        pinned_by: pinned_by.map(UserId),
    })
}
