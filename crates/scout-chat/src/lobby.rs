//! Favorites/Unread Aggregator: the lobby summary.

use std::collections::{HashMap, HashSet};

use scout_shared::models::FavoriteEntry;
use scout_shared::thread::ChatType;
use scout_shared::types::{GroupId, TownId, UserId};
use serde::Serialize;
use uuid::Uuid;

use crate::resolver::{Directory, Selection};
use crate::unread::UnreadByType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteIcon {
    Person,
    People,
    MapPin,
    Globe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyFavorite {
    pub chat_type: ChatType,
    pub reference_id: String,
    pub name: String,
    pub subtitle: Option<String>,
    pub icon: FavoriteIcon,
    /// Feed back into the resolver to open the chat.
    pub action: Selection,
    pub unread: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbySummary {
    pub friend_count: usize,
    pub group_count: usize,
    pub favorite_town_count: usize,
    pub unread: UnreadByType,
    pub favorites: Vec<LobbyFavorite>,
}

pub struct LobbyInputs<'a> {
    pub chat_favorites: &'a [FavoriteEntry],
    pub favorite_towns: &'a [TownId],
    pub directory: &'a Directory,
    pub unread_by_friend: &'a HashMap<UserId, u32>,
    pub unread_by_group: &'a HashMap<GroupId, u32>,
    pub unread_by_type: UnreadByType,
}

/// Build the lobby summary. Chat favorites come first in insertion order,
/// then favorited towns; each (chat_type, reference_id) appears once.
/// Entries that no longer resolve against the directory are skipped.
pub fn aggregate(inputs: &LobbyInputs<'_>) -> LobbySummary {
    let mut seen: HashSet<(ChatType, String)> = HashSet::new();
    let mut favorites = Vec::new();

    for entry in inputs.chat_favorites {
        let Some(favorite) = resolve_favorite(entry.chat_type, &entry.reference_id, inputs) else {
            tracing::debug!(
                chat_type = %entry.chat_type,
                reference = %entry.reference_id,
                "skipping unresolvable favorite"
            );
            continue;
        };
        if seen.insert((favorite.chat_type, favorite.reference_id.clone())) {
            favorites.push(favorite);
        }
    }

    let mut favorite_town_count = 0;
    for town_id in inputs.favorite_towns {
        let Some(favorite) = resolve_favorite(ChatType::TownLounge, &town_id.to_string(), inputs)
        else {
            continue;
        };
        favorite_town_count += 1;
        if seen.insert((favorite.chat_type, favorite.reference_id.clone())) {
            favorites.push(favorite);
        }
    }

    LobbySummary {
        friend_count: inputs.directory.friends.len(),
        group_count: inputs.directory.groups.len(),
        favorite_town_count,
        unread: inputs.unread_by_type,
        favorites,
    }
}

fn resolve_favorite(
    chat_type: ChatType,
    reference_id: &str,
    inputs: &LobbyInputs<'_>,
) -> Option<LobbyFavorite> {
    let dir = inputs.directory;
    let favorite = match chat_type {
        ChatType::Friend => {
            let friend = dir.friend(&UserId::new(reference_id))?;
            LobbyFavorite {
                chat_type,
                reference_id: friend.friend_id.to_string(),
                name: friend.display_name.clone(),
                subtitle: None,
                icon: FavoriteIcon::Person,
                action: Selection::Friend(friend.friend_id.clone()),
                unread: inputs
                    .unread_by_friend
                    .get(&friend.friend_id)
                    .copied()
                    .unwrap_or(0),
            }
        }
        ChatType::Group => {
            let group = dir.group(GroupId(Uuid::parse_str(reference_id).ok()?))?;
            LobbyFavorite {
                chat_type,
                reference_id: group.id.to_string(),
                name: group.name.clone(),
                subtitle: None,
                icon: FavoriteIcon::People,
                action: Selection::Group(group.id),
                unread: inputs.unread_by_group.get(&group.id).copied().unwrap_or(0),
            }
        }
        ChatType::TownLounge => {
            let town = dir.town(TownId(Uuid::parse_str(reference_id).ok()?))?;
            LobbyFavorite {
                chat_type,
                reference_id: town.id.to_string(),
                name: town.name.clone(),
                subtitle: Some(town.country.clone()),
                icon: FavoriteIcon::MapPin,
                action: Selection::Town(town.id),
                unread: 0,
            }
        }
        ChatType::CountryLounge => {
            let country = dir.country(reference_id)?;
            LobbyFavorite {
                chat_type,
                reference_id: country.to_string(),
                name: country.to_string(),
                subtitle: None,
                icon: FavoriteIcon::Globe,
                action: Selection::CountryLounge(country.to_string()),
                unread: 0,
            }
        }
    };
    Some(favorite)
}
