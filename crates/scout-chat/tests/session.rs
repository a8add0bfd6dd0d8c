use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use scout_chat::backend::{
    ChatBackend, DirectoryBackend, ModerationBackend, RequestPolicy, SqliteBackend,
};
use scout_chat::error::{BackendError, ChatError, ModerationError, ValidationError};
use scout_chat::events::{notice_channel, NoticeLevel, NoticeReceiver};
use scout_chat::resolver::Selection;
use scout_chat::session::{ChatSession, FetchOutcome};
use scout_shared::models::{FavoriteEntry, Friend, GroupChat, GroupRole, Message, Town};
use scout_shared::thread::{ChatType, ThreadKey};
use scout_shared::types::{GroupId, MessageId, TownId, UserId};
use scout_store::Database;
use tokio::sync::Notify;

#[derive(Default)]
struct Gate {
    started: Notify,
    release: Notify,
}

/// In-memory collaborator. Fetches for gated threads, and sends while a
/// send gate is set, block until released.
#[derive(Default)]
struct FakeBackend {
    friends: Vec<Friend>,
    groups: Vec<GroupChat>,
    towns: Vec<Town>,
    countries: Vec<String>,
    messages: Mutex<HashMap<ThreadKey, Vec<Message>>>,
    gates: Mutex<HashMap<ThreadKey, Arc<Gate>>>,
    send_gate: Mutex<Option<Arc<Gate>>>,
    muted: Mutex<BTreeSet<UserId>>,
    fail_writes: AtomicBool,
}

impl FakeBackend {
    fn seed(&self, message: Message) {
        self.messages
            .lock()
            .unwrap()
            .entry(message.thread.clone())
            .or_default()
            .push(message);
    }

    fn gate(&self, key: ThreadKey) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(key, gate.clone());
        gate
    }

    fn gate_sends(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.send_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn check_writes(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable("offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn fetch_messages(&self, thread: &ThreadKey) -> Result<Vec<Message>, BackendError> {
        let gate = self.gates.lock().unwrap().get(thread).cloned();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        let messages = self.messages.lock().unwrap().get(thread).cloned();
        Ok(messages.unwrap_or_default())
    }

    async fn send_message(
        &self,
        thread: &ThreadKey,
        author: &UserId,
        body: &str,
    ) -> Result<Message, BackendError> {
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        self.check_writes()?;
        let message = Message::new(thread.clone(), author.clone(), body);
        self.seed(message.clone());
        Ok(message)
    }

    async fn soft_delete_message(&self, _id: MessageId, _by: &UserId) -> Result<(), BackendError> {
        self.check_writes()
    }

    async fn set_pinned(
        &self,
        _id: MessageId,
        _pinned: bool,
        _by: &UserId,
    ) -> Result<(), BackendError> {
        self.check_writes()
    }

    async fn mark_thread_read(
        &self,
        _user: &UserId,
        _thread: &ThreadKey,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn fetch_unread_counts(
        &self,
        _user: &UserId,
    ) -> Result<HashMap<ThreadKey, u32>, BackendError> {
        Ok(HashMap::new())
    }
}

#[async_trait]
impl DirectoryBackend for FakeBackend {
    async fn fetch_friends(&self, _user: &UserId) -> Result<Vec<Friend>, BackendError> {
        Ok(self.friends.clone())
    }

    async fn fetch_groups(&self, _user: &UserId) -> Result<Vec<GroupChat>, BackendError> {
        Ok(self.groups.clone())
    }

    async fn fetch_towns(&self) -> Result<Vec<Town>, BackendError> {
        Ok(self.towns.clone())
    }

    async fn fetch_countries(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.countries.clone())
    }

    async fn fetch_favorites(&self, _user: &UserId) -> Result<Vec<FavoriteEntry>, BackendError> {
        Ok(Vec::new())
    }

    async fn fetch_favorite_towns(&self, _user: &UserId) -> Result<Vec<TownId>, BackendError> {
        Ok(Vec::new())
    }

    async fn toggle_favorite(
        &self,
        _user: &UserId,
        _chat_type: ChatType,
        _reference_id: &str,
        _reference_name: &str,
    ) -> Result<Option<FavoriteEntry>, BackendError> {
        Err(BackendError::Rejected("not supported".into()))
    }
}

#[async_trait]
impl ModerationBackend for FakeBackend {
    async fn fetch_blocked(&self, _user: &UserId) -> Result<Vec<UserId>, BackendError> {
        Ok(Vec::new())
    }

    async fn block_user(&self, _user: &UserId, _target: &UserId) -> Result<(), BackendError> {
        self.check_writes()
    }

    async fn unblock_user(&self, _user: &UserId, _target: &UserId) -> Result<(), BackendError> {
        self.check_writes()
    }

    async fn fetch_muted(&self, _user: &UserId) -> Result<Vec<UserId>, BackendError> {
        Ok(self.muted.lock().unwrap().iter().cloned().collect())
    }

    async fn set_muted(
        &self,
        _user: &UserId,
        target: &UserId,
        muted: bool,
    ) -> Result<(), BackendError> {
        self.check_writes()?;
        let mut set = self.muted.lock().unwrap();
        if muted {
            set.insert(target.clone());
        } else {
            set.remove(target);
        }
        Ok(())
    }
}

fn viewer() -> UserId {
    UserId::new("viewer")
}

fn towns() -> (Town, Town) {
    (
        Town {
            id: TownId::new(),
            name: "Lagos".into(),
            country: "Portugal".into(),
        },
        Town {
            id: TownId::new(),
            name: "Cuenca".into(),
            country: "Ecuador".into(),
        },
    )
}

fn fake_with_towns() -> (FakeBackend, Town, Town) {
    let (a, b) = towns();
    let backend = FakeBackend {
        friends: vec![Friend {
            friend_id: UserId::new("u1"),
            display_name: "Marta".into(),
        }],
        towns: vec![a.clone(), b.clone()],
        countries: vec!["Portugal".into()],
        ..FakeBackend::default()
    };
    (backend, a, b)
}

fn session(backend: Arc<FakeBackend>) -> (ChatSession, NoticeReceiver) {
    let (tx, rx) = notice_channel();
    (
        ChatSession::new(viewer(), backend, RequestPolicy::default(), tx),
        rx,
    )
}

fn bodies(view: &scout_chat::session::ThreadView) -> Vec<String> {
    view.messages.iter().map(|m| m.message.body.clone()).collect()
}

#[tokio::test]
async fn slow_fetch_for_previous_town_is_discarded() {
    let (fake, town_a, town_b) = fake_with_towns();
    fake.seed(Message::new(ThreadKey::town(town_a.id), UserId::new("u1"), "from A"));
    fake.seed(Message::new(ThreadKey::town(town_b.id), UserId::new("u1"), "from B"));
    let gate_a = fake.gate(ThreadKey::town(town_a.id));

    let backend = Arc::new(fake);
    let (session, _rx) = session(backend);
    let session = Arc::new(session);
    session.load_lobby().await.unwrap();

    let slow = tokio::spawn({
        let session = session.clone();
        async move { session.select(Selection::Town(town_a.id)).await }
    });
    gate_a.started.notified().await;

    let fast = session.select(Selection::Town(town_b.id)).await.unwrap();
    assert_eq!(fast, FetchOutcome::Applied { count: 1 });

    gate_a.release.notify_one();
    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow, FetchOutcome::Stale);

    let view = session.thread_view().await.unwrap();
    assert_eq!(view.thread.key, ThreadKey::town(town_b.id));
    assert_eq!(bodies(&view), ["from B"]);
}

#[tokio::test]
async fn muted_author_hidden_until_revealed() {
    let (fake, _, _) = fake_with_towns();
    let lounge = ThreadKey::lounge();
    let base = Utc::now() - Duration::minutes(1);
    fake.seed(Message::new(lounge.clone(), UserId::new("u1"), "a").with_created_at(base));
    fake.seed(Message::new(lounge.clone(), UserId::new("u2"), "b").with_created_at(base));
    fake.seed(Message::new(lounge.clone(), viewer(), "c").with_created_at(base));
    fake.muted.lock().unwrap().insert(UserId::new("u2"));

    let (session, _rx) = session(Arc::new(fake));
    session.load_lobby().await.unwrap();
    session.select(Selection::GeneralLounge).await.unwrap();

    let view = session.thread_view().await.unwrap();
    assert_eq!(bodies(&view), ["a", "c"]);
    assert_eq!(view.hidden_count, 1);

    session.set_show_hidden(true).await.unwrap();
    let view = session.thread_view().await.unwrap();
    assert_eq!(bodies(&view), ["a", "b", "c"]);
    assert_eq!(view.hidden_count, 1);

    // Re-selecting resets the reveal toggle.
    session.select(Selection::GeneralLounge).await.unwrap();
    let view = session.thread_view().await.unwrap();
    assert!(!view.show_hidden);
    assert_eq!(view.messages.len(), 2);
}

#[tokio::test]
async fn unknown_selection_keeps_thread_and_warns() {
    let (fake, town_a, _) = fake_with_towns();
    let (session, mut rx) = session(Arc::new(fake));
    session.load_lobby().await.unwrap();
    session.select(Selection::Town(town_a.id)).await.unwrap();

    let err = session
        .select(Selection::Group(GroupId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Resolve(_)));

    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    let view = session.thread_view().await.unwrap();
    assert_eq!(view.thread.key, ThreadKey::town(town_a.id));
}

#[tokio::test]
async fn failed_send_removes_optimistic_message() {
    let (fake, _, _) = fake_with_towns();
    let fake = Arc::new(fake);
    let (session, mut rx) = session(fake.clone());
    session.load_lobby().await.unwrap();
    session
        .select(Selection::Friend(UserId::new("u1")))
        .await
        .unwrap();

    let sent = session.send_message("  hola Marta  ").await.unwrap();
    let view = session.thread_view().await.unwrap();
    assert_eq!(bodies(&view), ["hola Marta"]);
    assert_eq!(view.messages[0].message.id, sent);
    assert!(!view.messages[0].pending);

    assert_eq!(
        session.send_message("   ").await,
        Err(ChatError::Validation(ValidationError::EmptyMessage))
    );

    fake.fail_writes.store(true, Ordering::SeqCst);
    assert!(session.send_message("lost").await.is_err());
    let view = session.thread_view().await.unwrap();
    assert_eq!(bodies(&view), ["hola Marta"]);
    assert_eq!(rx.recv().await.unwrap().text, "Failed to send message");
}

#[tokio::test]
async fn delete_respects_the_window() {
    let (fake, _, _) = fake_with_towns();
    let lounge = ThreadKey::lounge();
    let now = Utc::now();
    let fresh = Message::new(lounge.clone(), viewer(), "fresh")
        .with_created_at(now - Duration::minutes(14) - Duration::seconds(59));
    let old = Message::new(lounge.clone(), viewer(), "old")
        .with_created_at(now - Duration::minutes(20));
    let (fresh_id, old_id) = (fresh.id, old.id);
    fake.seed(old);
    fake.seed(fresh);

    let (session, _rx) = session(Arc::new(fake));
    session.load_lobby().await.unwrap();
    session.select(Selection::GeneralLounge).await.unwrap();

    let view = session.thread_view_at(now).await.unwrap();
    assert!(!view.messages[0].permissions.can_delete);
    assert!(view.messages[1].permissions.can_delete);
    assert!(!view.messages[1].permissions.is_first_in_group);

    assert_eq!(
        session.delete_message(old_id).await,
        Err(ChatError::NotPermitted("delete"))
    );
    session.delete_message(fresh_id).await.unwrap();
    let view = session.thread_view().await.unwrap();
    assert!(view.messages[1].permissions.is_deleted);
    assert!(view.messages[1].message.body.is_empty());

    assert_eq!(
        session.set_pinned(old_id, true).await,
        Err(ChatError::NotPermitted("pin"))
    );
}

#[tokio::test]
async fn live_message_survives_overlapping_refresh() {
    let (fake, town_a, _) = fake_with_towns();
    let key = ThreadKey::town(town_a.id);
    fake.seed(Message::new(key.clone(), UserId::new("u1"), "old"));

    let backend = Arc::new(fake);
    let (session, _rx) = session(backend.clone());
    let session = Arc::new(session);
    session.load_lobby().await.unwrap();
    session.select(Selection::Town(town_a.id)).await.unwrap();

    let gate = backend.gate(key.clone());
    let refresh = tokio::spawn({
        let session = session.clone();
        async move { session.refresh().await }
    });
    gate.started.notified().await;

    session
        .receive(Message::new(key.clone(), UserId::new("u2"), "live"))
        .await
        .unwrap();
    assert_eq!(bodies(&session.thread_view().await.unwrap()), ["old", "live"]);

    gate.release.notify_one();
    let outcome = refresh.await.unwrap().unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { count: 1 });
    assert_eq!(bodies(&session.thread_view().await.unwrap()), ["old", "live"]);
}

#[tokio::test]
async fn unconfirmed_send_cannot_be_deleted_or_pinned() {
    let (mut fake, _, _) = fake_with_towns();
    let group = GroupChat {
        id: GroupId::new(),
        name: "Algarve Walkers".into(),
        viewer_role: GroupRole::Member,
    };
    fake.groups.push(group.clone());
    let send_gate = fake.gate_sends();

    let (session, _rx) = session(Arc::new(fake));
    let session = Arc::new(session);
    session.load_lobby().await.unwrap();
    session.select(Selection::Group(group.id)).await.unwrap();

    let send = tokio::spawn({
        let session = session.clone();
        async move { session.send_message("On my way").await }
    });
    send_gate.started.notified().await;

    let view = session.thread_view().await.unwrap();
    let local = &view.messages[0];
    assert!(local.pending);
    assert!(!local.permissions.can_delete);
    assert!(!local.permissions.can_pin);
    assert_eq!(
        session.delete_message(local.message.id).await,
        Err(ChatError::NotPermitted("delete"))
    );
    assert_eq!(
        session.set_pinned(local.message.id, true).await,
        Err(ChatError::NotPermitted("pin"))
    );

    send_gate.release.notify_one();
    let stored = send.await.unwrap().unwrap();
    let view = session.thread_view().await.unwrap();
    assert_eq!(view.messages[0].message.id, stored);
    assert!(!view.messages[0].pending);
    assert!(view.messages[0].permissions.can_delete);
    assert!(view.messages[0].permissions.can_pin);
}

#[tokio::test]
async fn inbound_messages_count_as_unread_elsewhere() {
    let (fake, town_a, _) = fake_with_towns();
    let (session, _rx) = session(Arc::new(fake));
    session.load_lobby().await.unwrap();
    session.select(Selection::Town(town_a.id)).await.unwrap();

    let dm = ThreadKey::friend(&viewer(), &UserId::new("u1"));
    session
        .receive(Message::new(dm.clone(), UserId::new("u1"), "psst"))
        .await
        .unwrap();
    session
        .receive(Message::new(ThreadKey::town(town_a.id), UserId::new("u1"), "live"))
        .await
        .unwrap();

    let summary = session.lobby_summary().await;
    assert_eq!(summary.unread.friends, 1);
    assert_eq!(summary.unread.towns, 0);
    let view = session.thread_view().await.unwrap();
    assert_eq!(bodies(&view), ["live"]);

    session
        .select(Selection::Friend(UserId::new("u1")))
        .await
        .unwrap();
    assert_eq!(session.lobby_summary().await.unread.friends, 0);
}

#[tokio::test]
async fn self_and_scout_cannot_be_muted() {
    let (fake, _, _) = fake_with_towns();
    let (session, _rx) = session(Arc::new(fake));

    assert_eq!(
        session.toggle_mute(&viewer()).await,
        Err(ChatError::Moderation(ModerationError::SelfTarget("mute")))
    );
    assert!(session.toggle_block(&UserId::scout()).await.is_err());

    assert!(session.toggle_mute(&UserId::new("u2")).await.unwrap());
    assert!(session.moderation().await.is_muted(&UserId::new("u2")));
    assert!(!session.toggle_mute(&UserId::new("u2")).await.unwrap());
}

fn seeded_store() -> (tempfile::TempDir, SqliteBackend, GroupId) {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::open_at(&dir.path().join("scout.db")).unwrap();
    let now = Utc::now();
    let me = viewer();
    let pal = UserId::new("u1");
    db.upsert_user(&me, "Viewer", now).unwrap();
    db.upsert_user(&pal, "Marta", now).unwrap();
    db.add_friendship(&me, &pal, now).unwrap();

    let group = GroupId::new();
    db.create_group(group, "Algarve Walkers", &pal, now).unwrap();
    db.add_group_member(group, &me, GroupRole::Member).unwrap();
    db.insert_message(&Message::new(ThreadKey::group(group), pal.clone(), "welcome"))
        .unwrap();
    db.insert_country("Portugal").unwrap();

    (dir, SqliteBackend::new(db, 100), group)
}

#[tokio::test]
async fn sqlite_end_to_end() {
    let (_dir, backend, group) = seeded_store();
    let backend = Arc::new(backend);
    let (tx, _rx) = notice_channel();
    let session = ChatSession::new(viewer(), backend.clone(), RequestPolicy::default(), tx);

    let summary = session.load_lobby().await.unwrap();
    assert_eq!(summary.friend_count, 1);
    assert_eq!(summary.group_count, 1);
    assert_eq!(summary.unread.groups, 1);

    // Favoriting twice toggles off.
    let group_ref = group.to_string();
    assert!(session
        .toggle_favorite(ChatType::Group, &group_ref, "Algarve Walkers")
        .await
        .unwrap());
    assert_eq!(session.lobby_summary().await.favorites.len(), 1);
    assert!(!session
        .toggle_favorite(ChatType::Group, &group_ref, "Algarve Walkers")
        .await
        .unwrap());
    assert!(session.favorites().await.is_empty());

    let outcome = session.select(Selection::Group(group)).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { count: 1 });
    assert_eq!(session.refresh_unread().await.unwrap().groups, 0);

    let welcome = session.thread_view().await.unwrap().messages[0].message.id;
    session.set_pinned(welcome, true).await.unwrap();

    let id = session.send_message("Count me in").await.unwrap();
    session.delete_message(id).await.unwrap();

    session.refresh().await.unwrap();
    let view = session.thread_view().await.unwrap();
    assert_eq!(view.messages.len(), 2);
    assert!(view.messages[0].message.is_pinned);
    assert!(view.messages[1].permissions.is_deleted);

    assert!(session.toggle_active_favorite().await.unwrap());
    let favorites = backend
        .database()
        .unwrap()
        .list_chat_favorites(&viewer())
        .unwrap();
    assert_eq!(favorites[0].reference_name, "Algarve Walkers");
}
