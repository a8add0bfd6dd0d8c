//! Persistence collaborator interface.
//!
//! The chat core never talks to storage directly; every read and write goes
//! through these traits, wrapped in a [`policy::RequestPolicy`].

pub mod policy;
pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;
use scout_shared::models::{FavoriteEntry, Friend, GroupChat, Message, Town};
use scout_shared::onboarding::{OnboardingProgress, OnboardingStep};
use scout_shared::thread::{ChatType, ThreadKey};
use scout_shared::types::{MessageId, TownId, UserId};

use crate::error::BackendError;

pub use policy::RequestPolicy;
pub use sqlite::SqliteBackend;

/// Thread messages and read markers.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Messages of a thread, oldest first.
    async fn fetch_messages(&self, thread: &ThreadKey) -> Result<Vec<Message>, BackendError>;

    /// Persist a new message; returns it as stored.
    async fn send_message(
        &self,
        thread: &ThreadKey,
        author: &UserId,
        body: &str,
    ) -> Result<Message, BackendError>;

    async fn soft_delete_message(&self, id: MessageId, by: &UserId) -> Result<(), BackendError>;

    async fn set_pinned(
        &self,
        id: MessageId,
        pinned: bool,
        by: &UserId,
    ) -> Result<(), BackendError>;

    async fn mark_thread_read(&self, user: &UserId, thread: &ThreadKey) -> Result<(), BackendError>;

    async fn fetch_unread_counts(
        &self,
        user: &UserId,
    ) -> Result<HashMap<ThreadKey, u32>, BackendError>;
}

/// The lists selections are validated against, plus favorites.
#[async_trait]
pub trait DirectoryBackend: Send + Sync {
    async fn fetch_friends(&self, user: &UserId) -> Result<Vec<Friend>, BackendError>;

    async fn fetch_groups(&self, user: &UserId) -> Result<Vec<GroupChat>, BackendError>;

    async fn fetch_towns(&self) -> Result<Vec<Town>, BackendError>;

    async fn fetch_countries(&self) -> Result<Vec<String>, BackendError>;

    async fn fetch_favorites(&self, user: &UserId) -> Result<Vec<FavoriteEntry>, BackendError>;

    async fn fetch_favorite_towns(&self, user: &UserId) -> Result<Vec<TownId>, BackendError>;

    /// Add the favorite if absent, remove it otherwise. `None` means removed.
    async fn toggle_favorite(
        &self,
        user: &UserId,
        chat_type: ChatType,
        reference_id: &str,
        reference_name: &str,
    ) -> Result<Option<FavoriteEntry>, BackendError>;
}

/// Per-viewer block and mute lists.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    async fn fetch_blocked(&self, user: &UserId) -> Result<Vec<UserId>, BackendError>;

    async fn block_user(&self, user: &UserId, target: &UserId) -> Result<(), BackendError>;

    async fn unblock_user(&self, user: &UserId, target: &UserId) -> Result<(), BackendError>;

    async fn fetch_muted(&self, user: &UserId) -> Result<Vec<UserId>, BackendError>;

    async fn set_muted(
        &self,
        user: &UserId,
        target: &UserId,
        muted: bool,
    ) -> Result<(), BackendError>;
}

#[async_trait]
pub trait OnboardingBackend: Send + Sync {
    async fn save_onboarding_step(
        &self,
        user: &UserId,
        step: OnboardingStep,
        data: serde_json::Value,
    ) -> Result<(), BackendError>;

    async fn get_onboarding_progress(
        &self,
        user: &UserId,
    ) -> Result<OnboardingProgress, BackendError>;

    async fn complete_onboarding(&self, user: &UserId) -> Result<(), BackendError>;
}

/// Everything a [`crate::session::ChatSession`] needs.
pub trait Backend: ChatBackend + DirectoryBackend + ModerationBackend {}

impl<T> Backend for T where T: ChatBackend + DirectoryBackend + ModerationBackend {}
