//! Per-user read markers and the unread counts derived from them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rusqlite::params;
use scout_shared::thread::{Thread, ThreadKey};
use scout_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::rows::ts;

impl Database {
    /// Record that `user` has seen everything in `thread` up to `at`.
    pub fn mark_thread_read(
        &self,
        user: &UserId,
        thread: &ThreadKey,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO thread_reads (user_id, thread_key, last_read_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, thread_key) DO UPDATE SET last_read_at = excluded.last_read_at",
            params![user.as_str(), thread.as_str(), ts(&at)],
        )?;
        Ok(())
    }

    /// Unread message counts for every thread relevant to `user`.
    ///
    /// Friend threads count when the user is a participant, group threads
    /// when the user is a member, lounges only once the user has opened
    /// them. The user's own messages and soft-deleted messages never count.
    pub fn unread_counts(&self, user: &UserId) -> Result<HashMap<ThreadKey, u32>> {
        let groups = self.group_ids_for_user(user)?;

        let mut stmt = self.conn().prepare(
            "SELECT m.thread_key, COUNT(*), MAX(r.last_read_at IS NOT NULL)
             FROM messages m
             LEFT JOIN thread_reads r
                    ON r.thread_key = m.thread_key AND r.user_id = ?1
             WHERE m.deleted_at IS NULL
               AND (m.author_id IS NULL OR m.author_id != ?1)
               AND (r.last_read_at IS NULL OR m.created_at > r.last_read_at)
             GROUP BY m.thread_key",
        )?;

        let rows = stmt.query_map(params![user.as_str()], |row| {
            let key: String = row.get(0)?;
            let count: u32 = row.get(1)?;
            let visited: bool = row.get(2)?;
            Ok((key, count, visited))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (key, count, visited) = row?;
            let Ok(key) = key.parse::<ThreadKey>() else {
                tracing::warn!(thread = %key, "skipping unparseable thread key");
                continue;
            };
            let relevant = match key.to_thread(user) {
                Ok(Thread::Friend { .. }) => true,
                Ok(Thread::Group { group_id }) => groups.contains(&group_id.0.to_string()),
                Ok(
                    Thread::TownLounge { .. }
                    | Thread::CountryLounge { .. }
                    | Thread::GeneralLounge,
                ) => visited,
                Err(_) => false,
            };
            if relevant {
                counts.insert(key, count);
            }
        }
        Ok(counts)
    }

    fn group_ids_for_user(&self, user: &UserId) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT group_id FROM group_members WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user.as_str()], |row| row.get::<_, String>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use scout_shared::models::{GroupRole, Message};
    use scout_shared::types::GroupId;

    fn post(db: &Database, thread: &ThreadKey, author: &str, at: DateTime<Utc>) {
        let m = Message::new(thread.clone(), UserId::new(author), "hi").with_created_at(at);
        db.insert_message(&m).unwrap();
    }

    #[test]
    fn counts_only_messages_after_last_read() {
        let db = Database::open_in_memory().unwrap();
        let me = UserId::new("me");
        let friend = UserId::new("pal");
        let dm = ThreadKey::friend(&me, &friend);
        let t0 = Utc::now() - Duration::minutes(10);

        post(&db, &dm, "pal", t0);
        post(&db, &dm, "pal", t0 + Duration::minutes(1));
        post(&db, &dm, "me", t0 + Duration::minutes(2));
        assert_eq!(db.unread_counts(&me).unwrap().get(&dm), Some(&2));

        db.mark_thread_read(&me, &dm, t0 + Duration::minutes(3)).unwrap();
        assert_eq!(db.unread_counts(&me).unwrap().get(&dm), None);

        post(&db, &dm, "pal", t0 + Duration::minutes(4));
        assert_eq!(db.unread_counts(&me).unwrap().get(&dm), Some(&1));
    }

    #[test]
    fn foreign_dms_and_unvisited_lounges_do_not_count() {
        let db = Database::open_in_memory().unwrap();
        let me = UserId::new("me");
        let other_dm = ThreadKey::friend(&UserId::new("a"), &UserId::new("b"));
        let now = Utc::now();

        post(&db, &other_dm, "a", now);
        post(&db, &ThreadKey::lounge(), "a", now);
        assert!(db.unread_counts(&me).unwrap().is_empty());

        db.mark_thread_read(&me, &ThreadKey::lounge(), now - Duration::minutes(1))
            .unwrap();
        assert_eq!(
            db.unread_counts(&me).unwrap().get(&ThreadKey::lounge()),
            Some(&1)
        );
    }

    #[test]
    fn group_threads_require_membership() {
        let db = Database::open_in_memory().unwrap();
        let me = UserId::new("me");
        let group = GroupId::new();
        db.create_group(group, "Algarve 2026", &UserId::new("founder"), Utc::now())
            .unwrap();
        let key = ThreadKey::group(group);
        post(&db, &key, "founder", Utc::now());

        assert!(db.unread_counts(&me).unwrap().is_empty());

        db.add_group_member(group, &me, GroupRole::Member).unwrap();
        assert_eq!(db.unread_counts(&me).unwrap().get(&key), Some(&1));
    }
}
