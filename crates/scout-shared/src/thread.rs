//! Conversation contexts.
//!
//! A [`Thread`] is the closed set of places a viewer can chat in. The
//! collaborator never sees the enum; it addresses threads through the
//! canonical [`ThreadKey`] string.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::GENERAL_LOUNGE_KEY;
use crate::error::SharedError;
use crate::types::{GroupId, TownId, UserId};

const FRIEND_PREFIX: &str = "friend:";
const GROUP_PREFIX: &str = "group:";
const TOWN_PREFIX: &str = "town:";
const COUNTRY_PREFIX: &str = "country:";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Thread {
    Friend { friend_id: UserId },
    Group { group_id: GroupId },
    TownLounge { town_id: TownId },
    CountryLounge { country_name: String },
    GeneralLounge,
}

impl Thread {
    pub fn kind(&self) -> ThreadKind {
        match self {
            Thread::Friend { .. } => ThreadKind::Friend,
            Thread::Group { .. } => ThreadKind::Group,
            Thread::TownLounge { .. } => ThreadKind::TownLounge,
            Thread::CountryLounge { .. } => ThreadKind::CountryLounge,
            Thread::GeneralLounge => ThreadKind::GeneralLounge,
        }
    }

    /// Canonical key of this thread as seen by `viewer`.
    ///
    /// Friend threads sort both participants so that either side resolves
    /// the same key.
    pub fn key(&self, viewer: &UserId) -> ThreadKey {
        match self {
            Thread::Friend { friend_id } => ThreadKey::friend(viewer, friend_id),
            Thread::Group { group_id } => ThreadKey::group(*group_id),
            Thread::TownLounge { town_id } => ThreadKey::town(*town_id),
            Thread::CountryLounge { country_name } => ThreadKey::country(country_name),
            Thread::GeneralLounge => ThreadKey::lounge(),
        }
    }
}

/// Payload-free discriminant of [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    Friend,
    Group,
    TownLounge,
    CountryLounge,
    GeneralLounge,
}

impl ThreadKind {
    pub fn is_lounge(self) -> bool {
        matches!(
            self,
            ThreadKind::TownLounge | ThreadKind::CountryLounge | ThreadKind::GeneralLounge
        )
    }
}

/// Canonical identity of a thread on the collaborator side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadKey(String);

impl ThreadKey {
    pub fn friend(a: &UserId, b: &UserId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{FRIEND_PREFIX}{lo}:{hi}"))
    }

    pub fn group(id: GroupId) -> Self {
        Self(format!("{GROUP_PREFIX}{}", id.0))
    }

    pub fn town(id: TownId) -> Self {
        Self(format!("{TOWN_PREFIX}{}", id.0))
    }

    pub fn country(name: &str) -> Self {
        Self(format!("{COUNTRY_PREFIX}{name}"))
    }

    pub fn lounge() -> Self {
        Self(GENERAL_LOUNGE_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<ThreadKind> {
        let s = self.0.as_str();
        if s == GENERAL_LOUNGE_KEY {
            Some(ThreadKind::GeneralLounge)
        } else if s.starts_with(FRIEND_PREFIX) {
            Some(ThreadKind::Friend)
        } else if s.starts_with(GROUP_PREFIX) {
            Some(ThreadKind::Group)
        } else if s.starts_with(TOWN_PREFIX) {
            Some(ThreadKind::TownLounge)
        } else if s.starts_with(COUNTRY_PREFIX) {
            Some(ThreadKind::CountryLounge)
        } else {
            None
        }
    }

    /// Recover the [`Thread`] this key names, from `viewer`'s perspective.
    pub fn to_thread(&self, viewer: &UserId) -> Result<Thread, SharedError> {
        let s = self.0.as_str();
        if s == GENERAL_LOUNGE_KEY {
            return Ok(Thread::GeneralLounge);
        }
        if let Some(rest) = s.strip_prefix(FRIEND_PREFIX) {
            let (lo, hi) = rest
                .split_once(':')
                .ok_or_else(|| SharedError::InvalidThreadKey(s.to_string()))?;
            let friend_id = if lo == viewer.as_str() {
                hi
            } else if hi == viewer.as_str() {
                lo
            } else {
                return Err(SharedError::NotAParticipant(s.to_string()));
            };
            return Ok(Thread::Friend {
                friend_id: UserId::new(friend_id),
            });
        }
        if let Some(rest) = s.strip_prefix(GROUP_PREFIX) {
            let id = parse_uuid(s, rest)?;
            return Ok(Thread::Group {
                group_id: GroupId(id),
            });
        }
        if let Some(rest) = s.strip_prefix(TOWN_PREFIX) {
            let id = parse_uuid(s, rest)?;
            return Ok(Thread::TownLounge { town_id: TownId(id) });
        }
        if let Some(rest) = s.strip_prefix(COUNTRY_PREFIX) {
            if rest.is_empty() {
                return Err(SharedError::InvalidThreadKey(s.to_string()));
            }
            return Ok(Thread::CountryLounge {
                country_name: rest.to_string(),
            });
        }
        Err(SharedError::InvalidThreadKey(s.to_string()))
    }
}

fn parse_uuid(key: &str, raw: &str) -> Result<Uuid, SharedError> {
    Uuid::parse_str(raw).map_err(|_| SharedError::InvalidThreadKey(key.to_string()))
}

impl FromStr for ThreadKey {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = Self(s.to_string());
        match key.kind() {
            Some(_) => Ok(key),
            None => Err(SharedError::InvalidThreadKey(s.to_string())),
        }
    }
}

impl std::fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a chat favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Friend,
    Group,
    TownLounge,
    CountryLounge,
}

impl ChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Friend => "friend",
            ChatType::Group => "group",
            ChatType::TownLounge => "town_lounge",
            ChatType::CountryLounge => "country_lounge",
        }
    }
}

impl FromStr for ChatType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friend" => Ok(ChatType::Friend),
            "group" => Ok(ChatType::Group),
            "town_lounge" => Ok(ChatType::TownLounge),
            "country_lounge" => Ok(ChatType::CountryLounge),
            other => Err(SharedError::UnknownChatType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
