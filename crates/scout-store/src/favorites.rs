//! Chat favorites and favorited towns.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use scout_shared::models::FavoriteEntry;
use scout_shared::thread::ChatType;
use scout_shared::types::{TownId, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::rows::{conversion_err, parse_ts, parse_uuid, ts};

impl Database {
    /// Favorites of `user` in insertion order.
    pub fn list_chat_favorites(&self, user: &UserId) -> Result<Vec<FavoriteEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, chat_type, reference_id, reference_name, created_at
             FROM chat_favorites
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            let user_id: String = row.get(0)?;
            let chat_type: String = row.get(1)?;
            let created_at: String = row.get(4)?;
            Ok(FavoriteEntry {
                user_id: UserId(user_id),
                chat_type: chat_type
                    .parse::<ChatType>()
                    .map_err(|e| conversion_err(1, e))?,
                reference_id: row.get(2)?,
                reference_name: row.get(3)?,
                created_at: parse_ts(4, &created_at)?,
            })
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }

    /// Add the favorite if absent, remove it if present.
    ///
    /// Returns the new entry, or `None` when the call removed it.
    pub fn toggle_chat_favorite(
        &mut self,
        user: &UserId,
        chat_type: ChatType,
        reference_id: &str,
        reference_name: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FavoriteEntry>> {
        let tx = self.conn_mut().transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT rowid FROM chat_favorites
                 WHERE user_id = ?1 AND chat_type = ?2 AND reference_id = ?3",
                params![user.as_str(), chat_type.as_str(), reference_id],
                |row| row.get(0),
            )
            .optional()?;

        let result = match existing {
            Some(rowid) => {
                tx.execute("DELETE FROM chat_favorites WHERE rowid = ?1", params![rowid])?;
                None
            }
            None => {
                tx.execute(
                    "INSERT INTO chat_favorites
                         (user_id, chat_type, reference_id, reference_name, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        user.as_str(),
                        chat_type.as_str(),
                        reference_id,
                        reference_name,
                        ts(&at)
                    ],
                )?;
                Some(FavoriteEntry {
                    user_id: user.clone(),
                    chat_type,
                    reference_id: reference_id.to_string(),
                    reference_name: reference_name.to_string(),
                    created_at: at,
                })
            }
        };

        tx.commit()?;
        Ok(result)
    }

    /// Favorited towns of `user` in insertion order.
    pub fn list_favorite_towns(&self, user: &UserId) -> Result<Vec<TownId>> {
        let mut stmt = self.conn().prepare(
            "SELECT town_id FROM favorite_towns
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            let id: String = row.get(0)?;
            Ok(TownId(parse_uuid(0, &id)?))
        })?;

        let mut towns = Vec::new();
        for row in rows {
            towns.push(row?);
        }
        Ok(towns)
    }

    /// Returns `true` if the town is now a favorite.
    pub fn toggle_favorite_town(
        &self,
        user: &UserId,
        town: TownId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM favorite_towns WHERE user_id = ?1 AND town_id = ?2",
            params![user.as_str(), town.0.to_string()],
        )?;
        if removed > 0 {
            return Ok(false);
        }
        self.conn().execute(
            "INSERT INTO favorite_towns (user_id, town_id, created_at) VALUES (?1, ?2, ?3)",
            params![user.as_str(), town.0.to_string(), ts(&at)],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_shared::models::Town;

    #[test]
    fn favoriting_twice_toggles_off() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("u1");
        let group = "6f1c2a48-0000-4000-8000-000000000001";

        let added = db
            .toggle_chat_favorite(&user, ChatType::Group, group, "Lisbon Expats", Utc::now())
            .unwrap();
        assert!(added.is_some());
        assert_eq!(db.list_chat_favorites(&user).unwrap().len(), 1);

        let removed = db
            .toggle_chat_favorite(&user, ChatType::Group, group, "Lisbon Expats", Utc::now())
            .unwrap();
        assert!(removed.is_none());
        assert!(db.list_chat_favorites(&user).unwrap().is_empty());
    }

    #[test]
    fn same_reference_different_type_is_distinct() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("u1");
        db.toggle_chat_favorite(&user, ChatType::CountryLounge, "Spain", "Spain", Utc::now())
            .unwrap();
        db.toggle_chat_favorite(&user, ChatType::TownLounge, "Spain", "Spain", Utc::now())
            .unwrap();

        let favs = db.list_chat_favorites(&user).unwrap();
        assert_eq!(favs.len(), 2);
        assert_eq!(favs[0].chat_type, ChatType::CountryLounge);
        assert_eq!(favs[1].chat_type, ChatType::TownLounge);
    }

    #[test]
    fn favorite_towns_toggle() {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::new("u1");
        let town = Town {
            id: TownId::new(),
            name: "Cuenca".into(),
            country: "Ecuador".into(),
        };
        db.insert_town(&town).unwrap();

        assert!(db.toggle_favorite_town(&user, town.id, Utc::now()).unwrap());
        assert_eq!(db.list_favorite_towns(&user).unwrap(), vec![town.id]);
        assert!(!db.toggle_favorite_town(&user, town.id, Utc::now()).unwrap());
        assert!(db.list_favorite_towns(&user).unwrap().is_empty());
    }
}
