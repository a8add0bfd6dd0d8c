//! Local mirror of the viewer's chat favorites.

use scout_shared::models::FavoriteEntry;
use scout_shared::thread::{ChatType, Thread};
use serde::Serialize;

use crate::resolver::Directory;

/// Favorites in insertion order, unique per (chat_type, reference_id).
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    entries: Vec<FavoriteEntry>,
}

impl FavoriteSet {
    pub fn new(entries: Vec<FavoriteEntry>) -> Self {
        let mut set = Self::default();
        for entry in entries {
            if !set.contains(entry.chat_type, &entry.reference_id) {
                set.entries.push(entry);
            }
        }
        set
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn contains(&self, chat_type: ChatType, reference_id: &str) -> bool {
        self.entries.iter().any(|e| e.matches(chat_type, reference_id))
    }

    /// Align with the collaborator's toggle outcome (`None` = removed).
    pub fn apply_remote(
        &mut self,
        chat_type: ChatType,
        reference_id: &str,
        outcome: Option<FavoriteEntry>,
    ) -> bool {
        match outcome {
            Some(entry) => {
                if !self.contains(chat_type, reference_id) {
                    self.entries.push(entry);
                }
                true
            }
            None => {
                self.remove(chat_type, reference_id);
                false
            }
        }
    }

    fn remove(&mut self, chat_type: ChatType, reference_id: &str) {
        self.entries.retain(|e| !e.matches(chat_type, reference_id));
    }
}

/// What favoriting a thread stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteTarget {
    pub chat_type: ChatType,
    pub reference_id: String,
    pub reference_name: String,
}

/// Favorite reference for `thread`. The general lounge cannot be favorited.
pub fn favorite_target(thread: &Thread, directory: &Directory) -> Option<FavoriteTarget> {
    match thread {
        Thread::Friend { friend_id } => Some(FavoriteTarget {
            chat_type: ChatType::Friend,
            reference_id: friend_id.to_string(),
            reference_name: directory
                .friend(friend_id)
                .map(|f| f.display_name.clone())
                .unwrap_or_else(|| friend_id.to_string()),
        }),
        Thread::Group { group_id } => Some(FavoriteTarget {
            chat_type: ChatType::Group,
            reference_id: group_id.to_string(),
            reference_name: directory.group(*group_id)?.name.clone(),
        }),
        Thread::TownLounge { town_id } => Some(FavoriteTarget {
            chat_type: ChatType::TownLounge,
            reference_id: town_id.to_string(),
            reference_name: directory.town(*town_id)?.name.clone(),
        }),
        Thread::CountryLounge { country_name } => Some(FavoriteTarget {
            chat_type: ChatType::CountryLounge,
            reference_id: country_name.clone(),
            reference_name: country_name.clone(),
        }),
        Thread::GeneralLounge => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scout_shared::models::Town;
    use scout_shared::types::{TownId, UserId};

    #[test]
    fn remote_outcome_wins() {
        let me = UserId::new("me");
        let mut set = FavoriteSet::default();
        let entry = FavoriteEntry {
            user_id: me.clone(),
            chat_type: ChatType::CountryLounge,
            reference_id: "Spain".into(),
            reference_name: "Spain".into(),
            created_at: Utc::now(),
        };
        assert!(set.apply_remote(ChatType::CountryLounge, "Spain", Some(entry.clone())));
        assert!(set.apply_remote(ChatType::CountryLounge, "Spain", Some(entry)));
        assert_eq!(set.entries().len(), 1);
        assert!(!set.apply_remote(ChatType::CountryLounge, "Spain", None));
        assert!(set.entries().is_empty());
    }

    #[test]
    fn targets_by_thread() {
        let town = Town {
            id: TownId::new(),
            name: "Lagos".into(),
            country: "Portugal".into(),
        };
        let dir = Directory {
            towns: vec![town.clone()],
            ..Directory::default()
        };
        let target = favorite_target(&Thread::TownLounge { town_id: town.id }, &dir).unwrap();
        assert_eq!(target.chat_type, ChatType::TownLounge);
        assert_eq!(target.reference_id, town.id.to_string());
        assert_eq!(target.reference_name, "Lagos");

        assert!(favorite_target(&Thread::GeneralLounge, &dir).is_none());
        assert!(favorite_target(&Thread::TownLounge { town_id: TownId::new() }, &dir).is_none());
    }
}
