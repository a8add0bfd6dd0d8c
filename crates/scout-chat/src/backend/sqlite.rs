//! Collaborator backed by the local SQLite store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use scout_shared::models::{FavoriteEntry, Friend, GroupChat, Message, Town};
use scout_shared::onboarding::{OnboardingProgress, OnboardingStep};
use scout_shared::thread::{ChatType, ThreadKey};
use scout_shared::types::{MessageId, TownId, UserId};
use scout_store::{Database, StoreError};

use super::{ChatBackend, DirectoryBackend, ModerationBackend, OnboardingBackend};
use crate::error::BackendError;

impl From<StoreError> for BackendError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => BackendError::NotFound("record".into()),
            other => BackendError::Storage(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct SqliteBackend {
    db: Arc<Mutex<Database>>,
    message_limit: u32,
}

impl SqliteBackend {
    pub fn new(db: Database, message_limit: u32) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            message_limit,
        }
    }

    pub fn open(path: &Path, message_limit: u32) -> Result<Self, BackendError> {
        Ok(Self::new(Database::open_at(path)?, message_limit))
    }

    /// Direct access for seeding and tests.
    pub fn database(&self) -> Result<MutexGuard<'_, Database>, BackendError> {
        self.db
            .lock()
            .map_err(|_| BackendError::Storage("database lock poisoned".into()))
    }
}

#[async_trait]
impl ChatBackend for SqliteBackend {
    async fn fetch_messages(&self, thread: &ThreadKey) -> Result<Vec<Message>, BackendError> {
        let db = self.database()?;
        Ok(db.get_messages_for_thread(thread, self.message_limit)?)
    }

    async fn send_message(
        &self,
        thread: &ThreadKey,
        author: &UserId,
        body: &str,
    ) -> Result<Message, BackendError> {
        let message = Message::new(thread.clone(), author.clone(), body);
        let db = self.database()?;
        db.insert_message(&message)?;
        tracing::debug!(thread = %thread, id = %message.id, "Message stored");
        Ok(message)
    }

    async fn soft_delete_message(&self, id: MessageId, by: &UserId) -> Result<(), BackendError> {
        let db = self.database()?;
        if db.soft_delete_message(id, by, Utc::now())? {
            Ok(())
        } else {
            Err(BackendError::NotFound(format!("message {id}")))
        }
    }

    async fn set_pinned(
        &self,
        id: MessageId,
        pinned: bool,
        by: &UserId,
    ) -> Result<(), BackendError> {
        let db = self.database()?;
        if db.set_message_pinned(id, pinned, by, Utc::now())? {
            Ok(())
        } else {
            Err(BackendError::NotFound(format!("message {id}")))
        }
    }

    async fn mark_thread_read(
        &self,
        user: &UserId,
        thread: &ThreadKey,
    ) -> Result<(), BackendError> {
        let db = self.database()?;
        Ok(db.mark_thread_read(user, thread, Utc::now())?)
    }

    async fn fetch_unread_counts(
        &self,
        user: &UserId,
    ) -> Result<HashMap<ThreadKey, u32>, BackendError> {
        let db = self.database()?;
        Ok(db.unread_counts(user)?)
    }
}

#[async_trait]
impl DirectoryBackend for SqliteBackend {
    async fn fetch_friends(&self, user: &UserId) -> Result<Vec<Friend>, BackendError> {
        Ok(self.database()?.list_friends(user)?)
    }

    async fn fetch_groups(&self, user: &UserId) -> Result<Vec<GroupChat>, BackendError> {
        Ok(self.database()?.list_groups_for_user(user)?)
    }

    async fn fetch_towns(&self) -> Result<Vec<Town>, BackendError> {
        Ok(self.database()?.list_towns()?)
    }

    async fn fetch_countries(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.database()?.list_countries()?)
    }

    async fn fetch_favorites(&self, user: &UserId) -> Result<Vec<FavoriteEntry>, BackendError> {
        Ok(self.database()?.list_chat_favorites(user)?)
    }

    async fn fetch_favorite_towns(&self, user: &UserId) -> Result<Vec<TownId>, BackendError> {
        Ok(self.database()?.list_favorite_towns(user)?)
    }

    async fn toggle_favorite(
        &self,
        user: &UserId,
        chat_type: ChatType,
        reference_id: &str,
        reference_name: &str,
    ) -> Result<Option<FavoriteEntry>, BackendError> {
        let mut db = self.database()?;
        let outcome = db.toggle_chat_favorite(
            user,
            chat_type,
            reference_id,
            reference_name,
            Utc::now(),
        )?;
        Ok(outcome)
    }
}

#[async_trait]
impl ModerationBackend for SqliteBackend {
    async fn fetch_blocked(&self, user: &UserId) -> Result<Vec<UserId>, BackendError> {
        Ok(self.database()?.list_blocked(user)?)
    }

    async fn block_user(&self, user: &UserId, target: &UserId) -> Result<(), BackendError> {
        Ok(self.database()?.block_user(user, target, Utc::now())?)
    }

    async fn unblock_user(&self, user: &UserId, target: &UserId) -> Result<(), BackendError> {
        self.database()?.unblock_user(user, target)?;
        Ok(())
    }

    async fn fetch_muted(&self, user: &UserId) -> Result<Vec<UserId>, BackendError> {
        Ok(self.database()?.list_muted(user)?)
    }

    async fn set_muted(
        &self,
        user: &UserId,
        target: &UserId,
        muted: bool,
    ) -> Result<(), BackendError> {
        Ok(self.database()?.set_muted(user, target, muted, Utc::now())?)
    }
}

#[async_trait]
impl OnboardingBackend for SqliteBackend {
    async fn save_onboarding_step(
        &self,
        user: &UserId,
        step: OnboardingStep,
        data: serde_json::Value,
    ) -> Result<(), BackendError> {
        Ok(self
            .database()?
            .save_onboarding_step(user, step, &data, Utc::now())?)
    }

    async fn get_onboarding_progress(
        &self,
        user: &UserId,
    ) -> Result<OnboardingProgress, BackendError> {
        Ok(self.database()?.get_onboarding_progress(user)?)
    }

    async fn complete_onboarding(&self, user: &UserId) -> Result<(), BackendError> {
        Ok(self.database()?.complete_onboarding(user, Utc::now())?)
    }
}
