//! Records exchanged with the persistence collaborator.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! to the UI layer or the store unchanged.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SharedError;
use crate::thread::{ChatType, ThreadKey};
use crate::types::{GroupId, MessageId, TownId, UserId};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message.
///
/// `author_id` and `created_at` are optional so that malformed rows coming
/// back from the collaborator can still be represented; actions that need
/// them are denied instead of rejecting the whole thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub thread: ThreadKey,
    pub author_id: Option<UserId>,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. The row and its timestamp are kept.
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<UserId>,
    /// Only meaningful in group threads.
    pub is_pinned: bool,
    pub pinned_at: Option<DateTime<Utc>>,
    pub pinned_by: Option<UserId>,
}

impl Message {
    pub fn new(thread: ThreadKey, author_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            thread,
            author_id: Some(author_id),
            body: body.into(),
            created_at: Some(Utc::now()),
            deleted_at: None,
            deleted_by: None,
            is_pinned: false,
            pinned_at: None,
            pinned_by: None,
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_from(&self, user: &UserId) -> bool {
        self.author_id.as_ref() == Some(user)
    }

    /// Body to render, `None` once the message has been soft-deleted.
    pub fn display_body(&self) -> Option<&str> {
        if self.is_deleted() {
            None
        } else {
            Some(&self.body)
        }
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

/// A favorited chat. Unique per (user, chat_type, reference_id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub user_id: UserId,
    pub chat_type: ChatType,
    /// Friend user id, group/town UUID, or country name.
    pub reference_id: String,
    pub reference_name: String,
    pub created_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn matches(&self, chat_type: ChatType, reference_id: &str) -> bool {
        self.chat_type == chat_type && self.reference_id == reference_id
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// An accepted friend connection, seen from the viewer's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    pub friend_id: UserId,
    pub display_name: String,
}

/// A group chat the viewer belongs to, with the viewer's role in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupChat {
    pub id: GroupId,
    pub name: String,
    pub viewer_role: GroupRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Town {
    pub id: TownId,
    pub name: String,
    pub country: String,
}

/// Membership role inside a group chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Creator,
    AdminExecutive,
    Admin,
    Moderator,
    Member,
}

impl GroupRole {
    /// Higher rank means more authority.
    pub fn rank(self) -> u8 {
        match self {
            GroupRole::Creator => 5,
            GroupRole::AdminExecutive => 4,
            GroupRole::Admin => 3,
            GroupRole::Moderator => 2,
            GroupRole::Member => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Creator => "creator",
            GroupRole::AdminExecutive => "admin_executive",
            GroupRole::Admin => "admin",
            GroupRole::Moderator => "moderator",
            GroupRole::Member => "member",
        }
    }
}

impl FromStr for GroupRole {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(GroupRole::Creator),
            "admin_executive" => Ok(GroupRole::AdminExecutive),
            "admin" => Ok(GroupRole::Admin),
            "moderator" => Ok(GroupRole::Moderator),
            "member" => Ok(GroupRole::Member),
            other => Err(SharedError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
