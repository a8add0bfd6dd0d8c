//! Per-viewer block and mute lists.

use chrono::{DateTime, Utc};
use rusqlite::params;
use scout_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::rows::ts;

impl Database {
    pub fn block_user(&self, user: &UserId, target: &UserId, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO blocked_users (user_id, blocked_user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![user.as_str(), target.as_str(), ts(&at)],
        )?;
        Ok(())
    }

    pub fn unblock_user(&self, user: &UserId, target: &UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM blocked_users WHERE user_id = ?1 AND blocked_user_id = ?2",
            params![user.as_str(), target.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn list_blocked(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.list_user_ids(
            "SELECT blocked_user_id FROM blocked_users WHERE user_id = ?1 ORDER BY created_at ASC",
            user,
        )
    }

    pub fn set_muted(
        &self,
        user: &UserId,
        target: &UserId,
        muted: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if muted {
            self.conn().execute(
                "INSERT OR IGNORE INTO muted_users (user_id, muted_user_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![user.as_str(), target.as_str(), ts(&at)],
            )?;
        } else {
            self.conn().execute(
                "DELETE FROM muted_users WHERE user_id = ?1 AND muted_user_id = ?2",
                params![user.as_str(), target.as_str()],
            )?;
        }
        Ok(())
    }

    pub fn list_muted(&self, user: &UserId) -> Result<Vec<UserId>> {
        self.list_user_ids(
            "SELECT muted_user_id FROM muted_users WHERE user_id = ?1 ORDER BY created_at ASC",
            user,
        )
    }

    fn list_user_ids(&self, sql: &str, user: &UserId) -> Result<Vec<UserId>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params![user.as_str()], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(UserId(row?));
        }
        Ok(ids)
    }
}
