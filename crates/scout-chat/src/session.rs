//! Chat session: owns all per-viewer chat state and orchestrates
//! collaborator calls.
//!
//! State lives behind an async mutex that is never held across a
//! collaborator call. Message fetches are fenced by [`FetchTicket`]s, so a
//! slow response for a thread the user already left is dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scout_shared::models::{FavoriteEntry, Message};
use scout_shared::thread::{ChatType, Thread};
use scout_shared::types::{MessageId, TownId, UserId};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::backend::{Backend, RequestPolicy};
use crate::error::{BackendError, ChatError};
use crate::events::{emit_notice, Notice, NoticeSender};
use crate::favorites::{favorite_target, FavoriteSet};
use crate::lobby::{aggregate, LobbyInputs, LobbySummary};
use crate::moderation::{ensure_moderatable, filter, ModerationState};
use crate::permissions::{annotate, permissions_for, AnnotatedMessage};
use crate::resolver::{Directory, FetchTicket, ResolvedThread, Selection, ThreadResolver};
use crate::timeline::Timeline;
use crate::unread::{UnreadByType, UnreadCounters};
use crate::validation::sanitize_message;

/// Result of a message fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    /// A newer selection superseded this fetch; its result was dropped.
    Stale,
}

/// Render-ready view of the active thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub thread: ResolvedThread,
    pub messages: Vec<AnnotatedMessage>,
    pub hidden_count: usize,
    pub show_hidden: bool,
}

#[derive(Debug)]
struct SessionState {
    directory: Directory,
    resolver: ThreadResolver,
    timeline: Timeline,
    moderation: ModerationState,
    unread: UnreadCounters,
    favorites: FavoriteSet,
    favorite_towns: Vec<TownId>,
}

pub struct ChatSession {
    viewer: UserId,
    backend: Arc<dyn Backend>,
    policy: RequestPolicy,
    notices: NoticeSender,
    state: Mutex<SessionState>,
}

impl ChatSession {
    pub fn new(
        viewer: UserId,
        backend: Arc<dyn Backend>,
        policy: RequestPolicy,
        notices: NoticeSender,
    ) -> Self {
        let state = SessionState {
            directory: Directory::default(),
            resolver: ThreadResolver::new(viewer.clone()),
            timeline: Timeline::new(),
            moderation: ModerationState::default(),
            unread: UnreadCounters::new(),
            favorites: FavoriteSet::default(),
            favorite_towns: Vec::new(),
        };
        Self {
            viewer,
            backend,
            policy,
            notices,
            state: Mutex::new(state),
        }
    }

    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    fn notify(&self, notice: Notice) {
        emit_notice(&self.notices, notice);
    }

    // ------------------------------------------------------------------
    // Lobby
    // ------------------------------------------------------------------

    /// Load the directory, favorites, moderation lists and unread counts
    /// concurrently, then build the lobby summary.
    pub async fn load_lobby(&self) -> Result<LobbySummary, ChatError> {
        let backend = &self.backend;
        let viewer = &self.viewer;
        let policy = &self.policy;

        let loaded = futures::try_join!(
            policy.read("fetch_friends", move || backend.fetch_friends(viewer)),
            policy.read("fetch_groups", move || backend.fetch_groups(viewer)),
            policy.read("fetch_towns", move || backend.fetch_towns()),
            policy.read("fetch_countries", move || backend.fetch_countries()),
            policy.read("fetch_favorites", move || backend.fetch_favorites(viewer)),
            policy.read("fetch_favorite_towns", move || backend.fetch_favorite_towns(viewer)),
            policy.read("fetch_blocked", move || backend.fetch_blocked(viewer)),
            policy.read("fetch_muted", move || backend.fetch_muted(viewer)),
            policy.read("fetch_unread_counts", move || backend.fetch_unread_counts(viewer)),
        );
        let (friends, groups, towns, countries, favorites, favorite_towns, blocked, muted, unread) =
            match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    self.notify(Notice::error("Failed to load chats"));
                    return Err(e.into());
                }
            };

        let mut state = self.state.lock().await;
        state.directory = Directory {
            friends,
            groups,
            towns,
            countries,
        };
        state.favorites = FavoriteSet::new(favorites);
        state.favorite_towns = favorite_towns;
        state.moderation = ModerationState::new(muted, blocked);
        let active = state.resolver.active_thread().cloned();
        state.unread.replace_from_keys(unread, &self.viewer, active.as_ref());

        let summary = summarize(&state);
        tracing::info!(
            viewer = %self.viewer,
            friends = summary.friend_count,
            groups = summary.group_count,
            favorites = summary.favorites.len(),
            "Lobby loaded"
        );
        Ok(summary)
    }

    /// Summary from the state already loaded.
    pub async fn lobby_summary(&self) -> LobbySummary {
        let state = self.state.lock().await;
        summarize(&state)
    }

    pub async fn refresh_unread(&self) -> Result<UnreadByType, ChatError> {
        let counts = self
            .policy
            .read("fetch_unread_counts", move || self.backend.fetch_unread_counts(&self.viewer))
            .await?;
        let mut state = self.state.lock().await;
        let active = state.resolver.active_thread().cloned();
        state.unread.replace_from_keys(counts, &self.viewer, active.as_ref());
        Ok(state.unread.by_type())
    }

    // ------------------------------------------------------------------
    // Thread selection and fetch fencing
    // ------------------------------------------------------------------

    /// Activate a thread and load its messages.
    ///
    /// An unknown reference leaves the current thread untouched and raises
    /// a warning notice.
    pub async fn select(&self, selection: Selection) -> Result<FetchOutcome, ChatError> {
        let ticket = {
            let mut state = self.state.lock().await;
            let SessionState {
                directory,
                resolver,
                unread,
                timeline,
                ..
            } = &mut *state;
            match resolver.select(&selection, directory, unread) {
                Ok(ticket) => {
                    timeline.clear();
                    ticket
                }
                Err(e) => {
                    self.notify(Notice::warning(format!("Could not open chat: {e}")));
                    return Err(e.into());
                }
            }
        };

        if let Err(e) = self
            .policy
            .write("mark_thread_read", self.backend.mark_thread_read(&self.viewer, &ticket.key))
            .await
        {
            tracing::debug!(thread = %ticket.key, error = %e, "Could not mark thread read");
        }

        self.fetch(ticket).await
    }

    /// Reload the active thread.
    pub async fn refresh(&self) -> Result<FetchOutcome, ChatError> {
        let ticket = {
            let mut state = self.state.lock().await;
            let ticket = state.resolver.refetch().ok_or(ChatError::NoActiveThread)?;
            state.timeline.begin_fetch();
            ticket
        };
        self.fetch(ticket).await
    }

    async fn fetch(&self, ticket: FetchTicket) -> Result<FetchOutcome, ChatError> {
        let key = &ticket.key;
        let result = self
            .policy
            .read("fetch_messages", move || self.backend.fetch_messages(key))
            .await;

        let mut state = self.state.lock().await;
        if !state.resolver.is_current(&ticket) {
            tracing::debug!(thread = %ticket.key, "Discarding stale fetch");
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok(messages) => {
                let count = messages.len();
                state.timeline.replace_with_fetched(messages);
                tracing::debug!(thread = %ticket.key, count, "Messages loaded");
                Ok(FetchOutcome::Applied { count })
            }
            Err(e) => {
                self.notify(Notice::error("Failed to load messages"));
                Err(e.into())
            }
        }
    }

    /// Navigate away from the active thread.
    pub async fn leave_thread(&self) {
        let mut state = self.state.lock().await;
        state.resolver.deactivate();
        state.timeline.clear();
    }

    pub async fn set_show_hidden(&self, show: bool) -> Result<(), ChatError> {
        let mut state = self.state.lock().await;
        if state.resolver.set_show_hidden(show) {
            Ok(())
        } else {
            Err(ChatError::NoActiveThread)
        }
    }

    pub async fn thread_view(&self) -> Option<ThreadView> {
        self.thread_view_at(Utc::now()).await
    }

    /// Filtered and annotated view of the active thread as of `now`.
    pub async fn thread_view_at(&self, now: DateTime<Utc>) -> Option<ThreadView> {
        let state = self.state.lock().await;
        let active = state.resolver.active()?;

        let outcome = filter(
            state.timeline.messages(),
            &state.moderation,
            &self.viewer,
            active.show_hidden,
        );
        let messages = annotate(
            &outcome.visible,
            &self.viewer,
            active.resolved.thread.kind(),
            now,
            |m| state.timeline.is_pending(m.id),
        );

        Some(ThreadView {
            thread: active.resolved.clone(),
            messages,
            hidden_count: outcome.hidden_count,
            show_hidden: active.show_hidden,
        })
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Send to the active thread with an optimistic local append.
    ///
    /// Validation failures are returned without a notice; the caller shows
    /// them inline.
    pub async fn send_message(&self, body: &str) -> Result<MessageId, ChatError> {
        let body = sanitize_message(body)?;

        let (key, temp) = {
            let mut state = self.state.lock().await;
            let Some(active) = state.resolver.active() else {
                self.notify(Notice::error("No active chat selected"));
                return Err(ChatError::NoActiveThread);
            };
            let key = active.resolved.key.clone();
            let temp = state
                .timeline
                .push_optimistic(Message::new(key.clone(), self.viewer.clone(), body.clone()));
            (key, temp)
        };

        let result = self
            .policy
            .write("send_message", self.backend.send_message(&key, &self.viewer, &body))
            .await;

        let mut state = self.state.lock().await;
        let still_active = state.resolver.is_active_key(&key);
        match result {
            Ok(stored) => {
                let id = stored.id;
                if still_active {
                    state.timeline.confirm(temp, stored);
                }
                tracing::debug!(thread = %key, %id, "Message sent");
                Ok(id)
            }
            Err(e) => {
                if still_active {
                    state.timeline.discard(temp);
                }
                self.notify(Notice::error("Failed to send message"));
                Err(e.into())
            }
        }
    }

    /// Soft-delete one of the viewer's own recent messages.
    pub async fn delete_message(&self, id: MessageId) -> Result<(), ChatError> {
        self.check_permission(id, "delete", |p| p.can_delete).await?;

        if let Err(e) = self
            .policy
            .write("soft_delete_message", self.backend.soft_delete_message(id, &self.viewer))
            .await
        {
            self.notify(Notice::error("Failed to delete message"));
            return Err(e.into());
        }

        let mut state = self.state.lock().await;
        state.timeline.mark_deleted(id, &self.viewer, Utc::now());
        Ok(())
    }

    /// Pin or unpin a message in the active group thread.
    pub async fn set_pinned(&self, id: MessageId, pinned: bool) -> Result<(), ChatError> {
        self.check_permission(id, "pin", |p| p.can_pin).await?;

        if let Err(e) = self
            .policy
            .write("set_pinned", self.backend.set_pinned(id, pinned, &self.viewer))
            .await
        {
            let verb = if pinned { "pin" } else { "unpin" };
            self.notify(Notice::error(format!("Failed to {verb} message")));
            return Err(e.into());
        }

        let mut state = self.state.lock().await;
        state.timeline.set_pinned(id, pinned, &self.viewer, Utc::now());
        Ok(())
    }

    async fn check_permission(
        &self,
        id: MessageId,
        action: &'static str,
        allowed: impl Fn(&crate::permissions::MessagePermissions) -> bool,
    ) -> Result<(), ChatError> {
        let state = self.state.lock().await;
        let kind = state
            .resolver
            .active_thread()
            .map(Thread::kind)
            .ok_or(ChatError::NoActiveThread)?;
        let messages = state.timeline.messages();
        let index = messages
            .iter()
            .position(|m| m.id == id)
            .ok_or(ChatError::MessageNotFound(id))?;

        if state.timeline.is_pending(id) {
            return Err(ChatError::NotPermitted(action));
        }

        let permissions = permissions_for(
            &messages[index],
            index,
            messages,
            &self.viewer,
            kind,
            Utc::now(),
        );
        if allowed(&permissions) {
            Ok(())
        } else {
            Err(ChatError::NotPermitted(action))
        }
    }

    /// A message pushed by the collaborator (another participant posted).
    ///
    /// Lands in the timeline when it belongs to the active thread, otherwise
    /// bumps that thread's unread counter.
    pub async fn receive(&self, message: Message) -> Result<(), ChatError> {
        let thread = message.thread.to_thread(&self.viewer)?;
        let mut state = self.state.lock().await;

        if state.resolver.is_active_key(&message.thread) {
            state.timeline.apply_inbound(message);
            return Ok(());
        }

        let SessionState {
            resolver, unread, ..
        } = &mut *state;
        let count = unread.record_inbound(
            &thread,
            message.author_id.as_ref(),
            &self.viewer,
            resolver.active_thread(),
        );
        tracing::debug!(thread = %message.thread, count, "Unread incremented");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Moderation
    // ------------------------------------------------------------------

    /// Returns `true` if `target` is muted afterwards.
    pub async fn toggle_mute(&self, target: &UserId) -> Result<bool, ChatError> {
        ensure_moderatable(&self.viewer, target, "mute")?;
        let mute = !self.state.lock().await.moderation.is_muted(target);

        if let Err(e) = self
            .policy
            .write("set_muted", self.backend.set_muted(&self.viewer, target, mute))
            .await
        {
            self.notify(Notice::error("Failed to update mute"));
            return Err(e.into());
        }

        self.state.lock().await.moderation.set_muted(target.clone(), mute);
        self.notify(Notice::success(if mute { "User muted" } else { "User unmuted" }));
        tracing::info!(viewer = %self.viewer, target = %target, muted = mute, "Mute toggled");
        Ok(mute)
    }

    /// Returns `true` if `target` is blocked afterwards.
    pub async fn toggle_block(&self, target: &UserId) -> Result<bool, ChatError> {
        ensure_moderatable(&self.viewer, target, "block")?;
        let block = !self.state.lock().await.moderation.is_blocked(target);

        let result = if block {
            self.policy
                .write("block_user", self.backend.block_user(&self.viewer, target))
                .await
        } else {
            self.policy
                .write("unblock_user", self.backend.unblock_user(&self.viewer, target))
                .await
        };
        if let Err(e) = result {
            self.notify(Notice::error(if block {
                "Failed to block user"
            } else {
                "Failed to unblock user"
            }));
            return Err(e.into());
        }

        self.state.lock().await.moderation.set_blocked(target.clone(), block);
        self.notify(Notice::success(if block { "User blocked" } else { "User unblocked" }));
        tracing::info!(viewer = %self.viewer, target = %target, blocked = block, "Block toggled");
        Ok(block)
    }

    pub async fn moderation(&self) -> ModerationState {
        self.state.lock().await.moderation.clone()
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    /// Returns `true` if the chat is a favorite afterwards.
    pub async fn toggle_favorite(
        &self,
        chat_type: ChatType,
        reference_id: &str,
        reference_name: &str,
    ) -> Result<bool, ChatError> {
        let was_favorite = self
            .state
            .lock()
            .await
            .favorites
            .contains(chat_type, reference_id);

        let outcome: Result<Option<FavoriteEntry>, BackendError> = self
            .policy
            .write(
                "toggle_favorite",
                self.backend
                    .toggle_favorite(&self.viewer, chat_type, reference_id, reference_name),
            )
            .await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.notify(Notice::error(if was_favorite {
                    "Failed to remove favorite"
                } else {
                    "Failed to add favorite"
                }));
                return Err(e.into());
            }
        };

        let now_favorite = self
            .state
            .lock()
            .await
            .favorites
            .apply_remote(chat_type, reference_id, outcome);
        self.notify(Notice::success(if now_favorite {
            format!("Added {reference_name} to favorites")
        } else {
            format!("Removed {reference_name} from favorites")
        }));
        Ok(now_favorite)
    }

    /// Toggle the active thread as a favorite. The general lounge cannot be
    /// favorited.
    pub async fn toggle_active_favorite(&self) -> Result<bool, ChatError> {
        let target = {
            let state = self.state.lock().await;
            let thread = state.resolver.active_thread().ok_or(ChatError::NoActiveThread)?;
            favorite_target(thread, &state.directory)
        };
        let Some(target) = target else {
            return Err(ChatError::NotPermitted("favorite"));
        };
        self.toggle_favorite(
            target.chat_type,
            &target.reference_id,
            &target.reference_name,
        )
        .await
    }

    pub async fn favorites(&self) -> Vec<FavoriteEntry> {
        self.state.lock().await.favorites.entries().to_vec()
    }
}

fn summarize(state: &SessionState) -> LobbySummary {
    let by_friend = state.unread.by_friend();
    let by_group = state.unread.by_group();
    aggregate(&LobbyInputs {
        chat_favorites: state.favorites.entries(),
        favorite_towns: &state.favorite_towns,
        directory: &state.directory,
        unread_by_friend: &by_friend,
        unread_by_group: &by_group,
        unread_by_type: state.unread.by_type(),
    })
}
