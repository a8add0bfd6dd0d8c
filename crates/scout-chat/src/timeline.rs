//! Message list of the active thread with optimistic sends.
//!
//! Reconciliation is keyed on [`MessageId`]: no id is ever present twice.
//! A fetch is authoritative for the ids it returns; messages that arrived
//! locally after the fetch was dispatched survive it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scout_shared::models::Message;
use scout_shared::types::{MessageId, UserId};

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    pending: HashSet<MessageId>,
    /// Ids added since the in-flight fetch was dispatched.
    since_fetch: HashSet<MessageId>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_pending(&self, id: MessageId) -> bool {
        self.pending.contains(&id)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending.clear();
        self.since_fetch.clear();
    }

    /// Call when dispatching a fetch whose snapshot will cover everything
    /// currently in the list.
    pub fn begin_fetch(&mut self) {
        self.since_fetch.clear();
    }

    /// Merge an authoritative fetch. Messages the fetch does not contain are
    /// kept at the end when still pending or added since [`begin_fetch`].
    ///
    /// [`begin_fetch`]: Timeline::begin_fetch
    pub fn replace_with_fetched(&mut self, fetched: Vec<Message>) {
        let previous = std::mem::take(&mut self.messages);
        let mut seen = HashSet::with_capacity(fetched.len());

        for message in fetched {
            if seen.insert(message.id) {
                self.messages.push(message);
            }
        }

        self.pending.retain(|id| !seen.contains(id));
        for message in previous {
            let local =
                self.pending.contains(&message.id) || self.since_fetch.contains(&message.id);
            if local && seen.insert(message.id) {
                self.messages.push(message);
            }
        }
        self.since_fetch.clear();
    }

    /// Append a locally sent message and mark it pending.
    pub fn push_optimistic(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.pending.insert(id);
        self.since_fetch.insert(id);
        self.messages.push(message);
        id
    }

    /// Swap the optimistic entry for the stored message. If a refetch
    /// already brought the stored message in, the optimistic entry is just
    /// dropped. Returns `false` if `temp` is no longer in the list.
    pub fn confirm(&mut self, temp: MessageId, confirmed: Message) -> bool {
        self.pending.remove(&temp);
        let Some(pos) = self.messages.iter().position(|m| m.id == temp) else {
            return false;
        };

        self.since_fetch.insert(confirmed.id);
        if temp != confirmed.id && self.get(confirmed.id).is_some() {
            self.messages.remove(pos);
        } else {
            self.messages[pos] = confirmed;
        }
        true
    }

    /// Remove a failed optimistic send.
    pub fn discard(&mut self, temp: MessageId) -> bool {
        self.pending.remove(&temp);
        let before = self.messages.len();
        self.messages.retain(|m| m.id != temp);
        self.messages.len() != before
    }

    /// Append a message pushed by the collaborator. Returns `false` for a
    /// message already present.
    pub fn apply_inbound(&mut self, message: Message) -> bool {
        if self.get(message.id).is_some() {
            return false;
        }
        self.since_fetch.insert(message.id);
        self.messages.push(message);
        true
    }

    pub fn mark_deleted(&mut self, id: MessageId, by: &UserId, at: DateTime<Utc>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.deleted_at = Some(at);
                m.deleted_by = Some(by.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_pinned(
        &mut self,
        id: MessageId,
        pinned: bool,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.is_pinned = pinned;
                m.pinned_at = pinned.then_some(at);
                m.pinned_by = pinned.then(|| by.clone());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_shared::thread::ThreadKey;

    fn msg(author: &str, body: &str) -> Message {
        Message::new(ThreadKey::lounge(), UserId::new(author), body)
    }

    fn ids(t: &Timeline) -> Vec<MessageId> {
        t.messages().iter().map(|m| m.id).collect()
    }

    fn assert_unique(t: &Timeline) {
        let set: HashSet<_> = ids(t).into_iter().collect();
        assert_eq!(set.len(), t.messages().len());
    }

    #[test]
    fn optimistic_send_confirmed() {
        let mut t = Timeline::new();
        t.replace_with_fetched(vec![msg("u1", "hi")]);

        let temp = t.push_optimistic(msg("me", "hello"));
        assert!(t.is_pending(temp));

        let stored = msg("me", "hello");
        let stored_id = stored.id;
        assert!(t.confirm(temp, stored));
        assert!(!t.is_pending(temp));
        assert_eq!(t.messages().len(), 2);
        assert_eq!(t.messages()[1].id, stored_id);
    }

    #[test]
    fn refetch_before_confirm_never_duplicates() {
        let mut t = Timeline::new();
        let first = msg("u1", "hi");
        t.replace_with_fetched(vec![first.clone()]);

        let temp = t.push_optimistic(msg("me", "hello"));
        let stored = msg("me", "hello");

        t.replace_with_fetched(vec![first.clone(), stored.clone()]);
        assert_eq!(ids(&t), [first.id, stored.id, temp]);

        t.confirm(temp, stored.clone());
        assert_eq!(ids(&t), [first.id, stored.id]);
        assert_unique(&t);
    }

    #[test]
    fn refetch_keeps_unconfirmed_pending_at_end() {
        let mut t = Timeline::new();
        let temp = t.push_optimistic(msg("me", "draft"));
        let newer = msg("u1", "meanwhile");

        t.replace_with_fetched(vec![newer.clone(), newer.clone()]);
        assert_eq!(ids(&t), [newer.id, temp]);
        assert!(t.is_pending(temp));
    }

    #[test]
    fn arrivals_during_refetch_survive_it() {
        let mut t = Timeline::new();
        let old = msg("u1", "old");
        t.replace_with_fetched(vec![old.clone()]);

        t.begin_fetch();
        let live = msg("u2", "live");
        assert!(t.apply_inbound(live.clone()));
        let temp = t.push_optimistic(msg("me", "sent"));
        let stored = msg("me", "sent");
        assert!(t.confirm(temp, stored.clone()));

        // The snapshot was taken before either arrival.
        t.replace_with_fetched(vec![old.clone()]);
        assert_eq!(ids(&t), [old.id, live.id, stored.id]);

        // A later fetch is authoritative again.
        t.begin_fetch();
        t.replace_with_fetched(vec![old.clone(), stored.clone()]);
        assert_eq!(ids(&t), [old.id, stored.id]);
        assert_unique(&t);
    }

    #[test]
    fn failed_send_is_removed() {
        let mut t = Timeline::new();
        let temp = t.push_optimistic(msg("me", "lost"));
        assert!(t.discard(temp));
        assert!(t.messages().is_empty());
        assert!(!t.discard(temp));
    }

    #[test]
    fn confirm_after_clear_is_ignored() {
        let mut t = Timeline::new();
        let temp = t.push_optimistic(msg("me", "x"));
        t.clear();
        assert!(!t.confirm(temp, msg("me", "x")));
        assert!(t.messages().is_empty());
    }

    #[test]
    fn inbound_dedupes_by_id() {
        let mut t = Timeline::new();
        let m = msg("u1", "ping");
        assert!(t.apply_inbound(m.clone()));
        assert!(!t.apply_inbound(m));
        assert_eq!(t.messages().len(), 1);
    }

    #[test]
    fn delete_and_pin_update_in_place() {
        let mut t = Timeline::new();
        let m = msg("u1", "pin me");
        t.replace_with_fetched(vec![m.clone()]);
        let by = UserId::new("me");
        let now = Utc::now();

        assert!(t.set_pinned(m.id, true, &by, now));
        assert_eq!(t.get(m.id).unwrap().pinned_by, Some(by.clone()));
        assert!(t.set_pinned(m.id, false, &by, now));
        assert!(t.get(m.id).unwrap().pinned_at.is_none());

        assert!(t.mark_deleted(m.id, &by, now));
        assert!(t.get(m.id).unwrap().is_deleted());
        assert!(!t.mark_deleted(MessageId::new(), &by, now));
    }
}
