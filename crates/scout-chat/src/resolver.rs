//! Thread Resolver.
//!
//! Turns a lobby or sidebar selection into the canonical [`Thread`] plus
//! header metadata, and fences message fetches: each fetch carries a
//! [`FetchTicket`] issued at dispatch, and a result whose ticket is no
//! longer current is dropped. The newest selection always wins.

use scout_shared::models::{Friend, GroupChat, Town};
use scout_shared::thread::{Thread, ThreadKey};
use scout_shared::types::{GroupId, TownId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::unread::UnreadCounters;

/// What the user clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Selection {
    Friend(UserId),
    Group(GroupId),
    Town(TownId),
    CountryLounge(String),
    GeneralLounge,
}

/// Collaborator-loaded lists a selection must match.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub friends: Vec<Friend>,
    pub groups: Vec<GroupChat>,
    pub towns: Vec<Town>,
    pub countries: Vec<String>,
}

impl Directory {
    pub fn friend(&self, id: &UserId) -> Option<&Friend> {
        self.friends.iter().find(|f| &f.friend_id == id)
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupChat> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn town(&self, id: TownId) -> Option<&Town> {
        self.towns.iter().find(|t| t.id == id)
    }

    /// Case-insensitive lookup; returns the directory's spelling.
    pub fn country(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.countries
            .iter()
            .find(|c| c.to_lowercase() == wanted)
            .map(String::as_str)
    }
}

/// A resolved thread with what the header and composer display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedThread {
    pub thread: Thread,
    pub key: ThreadKey,
    pub title: String,
    pub placeholder: String,
}

/// Resolve a selection against the directory. Pure.
pub fn resolve(
    selection: &Selection,
    directory: &Directory,
    viewer: &UserId,
) -> Result<ResolvedThread, ResolveError> {
    let (thread, title, placeholder) = match selection {
        Selection::Friend(id) => {
            let friend = directory
                .friend(id)
                .ok_or_else(|| ResolveError::UnknownFriend(id.clone()))?;
            (
                Thread::Friend {
                    friend_id: friend.friend_id.clone(),
                },
                friend.display_name.clone(),
                format!("Message {}...", friend.display_name),
            )
        }
        Selection::Group(id) => {
            let group = directory.group(*id).ok_or(ResolveError::UnknownGroup(*id))?;
            (
                Thread::Group { group_id: group.id },
                group.name.clone(),
                format!("Message {}...", group.name),
            )
        }
        Selection::Town(id) => {
            let town = directory.town(*id).ok_or(ResolveError::UnknownTown(*id))?;
            (
                Thread::TownLounge { town_id: town.id },
                format!("{}, {}", town.name, town.country),
                format!("Chat about {}...", town.name),
            )
        }
        Selection::CountryLounge(name) => {
            let country = directory
                .country(name)
                .ok_or_else(|| ResolveError::UnknownCountry(name.clone()))?;
            (
                Thread::CountryLounge {
                    country_name: country.to_string(),
                },
                format!("{country} Lounge"),
                format!("Chat with others interested in {country}..."),
            )
        }
        Selection::GeneralLounge => (
            Thread::GeneralLounge,
            "Retirement Lounge".to_string(),
            "Share with the retirement lounge...".to_string(),
        ),
    };

    let key = thread.key(viewer);
    Ok(ResolvedThread {
        thread,
        key,
        title,
        placeholder,
    })
}

/// Tag carried by an in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: ThreadKey,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct ActiveThread {
    pub resolved: ResolvedThread,
    pub show_hidden: bool,
    generation: u64,
}

/// Tracks the single active thread of a session.
#[derive(Debug)]
pub struct ThreadResolver {
    viewer: UserId,
    active: Option<ActiveThread>,
    generation: u64,
}

impl ThreadResolver {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            active: None,
            generation: 0,
        }
    }

    pub fn active(&self) -> Option<&ActiveThread> {
        self.active.as_ref()
    }

    pub fn active_thread(&self) -> Option<&Thread> {
        self.active.as_ref().map(|a| &a.resolved.thread)
    }

    /// Activate `selection` and issue a ticket for its fetch.
    ///
    /// On an unknown reference the active thread is left unchanged.
    /// Otherwise the show-hidden toggle resets and the thread's unread
    /// counter clears, even when re-selecting the active thread.
    pub fn select(
        &mut self,
        selection: &Selection,
        directory: &Directory,
        unread: &mut UnreadCounters,
    ) -> Result<FetchTicket, ResolveError> {
        let resolved = match resolve(selection, directory, &self.viewer) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected chat selection");
                return Err(e);
            }
        };

        self.generation += 1;
        unread.reset(&resolved.thread);
        tracing::debug!(thread = %resolved.key, generation = self.generation, "Thread selected");

        let ticket = FetchTicket {
            key: resolved.key.clone(),
            generation: self.generation,
        };
        self.active = Some(ActiveThread {
            resolved,
            show_hidden: false,
            generation: self.generation,
        });
        Ok(ticket)
    }

    /// Ticket for refetching the active thread. Supersedes earlier tickets.
    pub fn refetch(&mut self) -> Option<FetchTicket> {
        let active = self.active.as_mut()?;
        self.generation += 1;
        active.generation = self.generation;
        Some(FetchTicket {
            key: active.resolved.key.clone(),
            generation: self.generation,
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.generation == ticket.generation && a.resolved.key == ticket.key)
    }

    /// Whether `key` is still the active thread, regardless of refetches.
    pub fn is_active_key(&self, key: &ThreadKey) -> bool {
        self.active.as_ref().is_some_and(|a| &a.resolved.key == key)
    }

    /// Returns `false` when no thread is active.
    pub fn set_show_hidden(&mut self, show: bool) -> bool {
        match self.active.as_mut() {
            Some(active) => {
                active.show_hidden = show;
                true
            }
            None => false,
        }
    }

    /// Navigate away. In-flight fetches become stale.
    pub fn deactivate(&mut self) {
        if self.active.take().is_some() {
            self.generation += 1;
        }
    }
}
