use std::time::Duration;

use scout_shared::onboarding::OnboardingStep;
use scout_shared::types::{GroupId, MessageId, TownId, UserId};
use scout_shared::SharedError;
use thiserror::Error;

/// Top-level error of the chat core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Moderation rejected: {0}")]
    Moderation(#[from] ModerationError),

    #[error("Could not open chat: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Backend call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid data: {0}")]
    Shared(#[from] SharedError),

    #[error("No active chat selected")]
    NoActiveThread,

    #[error("Message not found in the active chat: {0}")]
    MessageNotFound(MessageId),

    #[error("Not permitted to {0} this message")]
    NotPermitted(&'static str),

    #[error("Onboarding step {0} is not reachable yet")]
    StepLocked(OnboardingStep),
}

/// Input rejected before any collaborator call. Shown inline, never as a
/// notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message is too long: {len} characters (max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("Please enter a group name")]
    EmptyGroupName,

    #[error("Group name is too long: {len} characters (max {max})")]
    GroupNameTooLong { len: usize, max: usize },

    #[error("Please select at least one friend")]
    NoMembersSelected,
}

/// Mute or block aimed at a target that is immune to moderation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    #[error("You cannot {0} yourself")]
    SelfTarget(&'static str),

    #[error("The Scout assistant cannot be {0}")]
    ScoutTarget(&'static str),
}

/// A selection that does not match the loaded directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown friend: {0}")]
    UnknownFriend(UserId),

    #[error("Unknown group chat: {0}")]
    UnknownGroup(GroupId),

    #[error("Unknown town: {0}")]
    UnknownTown(TownId),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),
}

/// Failure reported by (or while reaching) the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BackendError {
    /// Whether retrying the same read could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Timeout { .. } | BackendError::Unavailable(_))
    }
}

/// Denial of a group membership action, with a reason fit for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionDenied(pub String);
