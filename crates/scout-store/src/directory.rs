//! Friends, group chats, towns and countries: the lists a selection is
//! validated against.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use scout_shared::models::{Friend, GroupChat, GroupRole, Town};
use scout_shared::types::{GroupId, TownId, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::rows::{conversion_err, parse_uuid, ts};

impl Database {
    // ------------------------------------------------------------------
    // Users and friendships
    // ------------------------------------------------------------------

    pub fn upsert_user(&self, id: &UserId, display_name: &str, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name",
            params![id.as_str(), display_name, ts(&at)],
        )?;
        Ok(())
    }

    /// Connect two users. Friendship is stored in both directions.
    pub fn add_friendship(&mut self, a: &UserId, b: &UserId, at: DateTime<Utc>) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        for (user, friend) in [(a, b), (b, a)] {
            tx.execute(
                "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![user.as_str(), friend.as_str(), ts(&at)],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_friends(&self, user: &UserId) -> Result<Vec<Friend>> {
        let mut stmt = self.conn().prepare(
            "SELECT f.friend_id, u.display_name
             FROM friendships f
             JOIN users u ON u.id = f.friend_id
             WHERE f.user_id = ?1
             ORDER BY u.display_name ASC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            Ok(Friend {
                friend_id: UserId(row.get(0)?),
                display_name: row.get(1)?,
            })
        })?;

        let mut friends = Vec::new();
        for row in rows {
            friends.push(row?);
        }
        Ok(friends)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a group chat; the creator joins with [`GroupRole::Creator`].
    pub fn create_group(
        &self,
        id: GroupId,
        name: &str,
        creator: &UserId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO groups (id, name, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.0.to_string(), name, creator.as_str(), ts(&at)],
        )?;
        self.conn().execute(
            "INSERT INTO group_members (group_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id.0.to_string(), creator.as_str(), GroupRole::Creator.as_str(), ts(&at)],
        )?;
        Ok(())
    }

    pub fn add_group_member(&self, group: GroupId, user: &UserId, role: GroupRole) -> Result<()> {
        self.conn().execute(
            "INSERT INTO group_members (group_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(group_id, user_id) DO UPDATE SET role = excluded.role",
            params![group.0.to_string(), user.as_str(), role.as_str(), ts(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn group_role(&self, group: GroupId, user: &UserId) -> Result<Option<GroupRole>> {
        let role: Option<String> = self
            .conn()
            .query_row(
                "SELECT role FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                params![group.0.to_string(), user.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(role.map(|r| r.parse::<GroupRole>()).transpose()?)
    }

    /// Groups `user` belongs to, with the user's role in each.
    pub fn list_groups_for_user(&self, user: &UserId) -> Result<Vec<GroupChat>> {
        let mut stmt = self.conn().prepare(
            "SELECT g.id, g.name, m.role
             FROM groups g
             JOIN group_members m ON m.group_id = g.id
             WHERE m.user_id = ?1
             ORDER BY g.name ASC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let role: String = row.get(2)?;
            Ok(GroupChat {
                id: GroupId(parse_uuid(0, &id)?),
                name,
                viewer_role: role.parse::<GroupRole>().map_err(|e| conversion_err(2, e))?,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    // ------------------------------------------------------------------
    // Towns and countries
    // ------------------------------------------------------------------

    pub fn insert_town(&self, town: &Town) -> Result<()> {
        self.conn().execute(
            "INSERT INTO towns (id, name, country) VALUES (?1, ?2, ?3)",
            params![town.id.0.to_string(), town.name, town.country],
        )?;
        Ok(())
    }

    pub fn list_towns(&self) -> Result<Vec<Town>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, country FROM towns ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            Ok(Town {
                id: TownId(parse_uuid(0, &id)?),
                name: row.get(1)?,
                country: row.get(2)?,
            })
        })?;

        let mut towns = Vec::new();
        for row in rows {
            towns.push(row?);
        }
        Ok(towns)
    }

    pub fn insert_country(&self, name: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO countries (name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    pub fn list_countries(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name FROM countries ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut countries = Vec::new();
        for row in rows {
            countries.push(row?);
        }
        Ok(countries)
    }
}
