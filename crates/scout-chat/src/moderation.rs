//! Per-viewer mute and block filtering.
//!
//! [`filter`] is pure: it never mutates the message list and keeps the
//! input order. Hidden messages are only revealed by the view-local
//! `show_hidden` toggle, which is not persisted.

use std::collections::BTreeSet;

use scout_shared::models::Message;
use scout_shared::types::UserId;
use serde::{Deserialize, Serialize};

use crate::error::ModerationError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationState {
    pub muted_user_ids: BTreeSet<UserId>,
    pub blocked_user_ids: BTreeSet<UserId>,
}

impl ModerationState {
    pub fn new<M, B>(muted: M, blocked: B) -> Self
    where
        M: IntoIterator<Item = UserId>,
        B: IntoIterator<Item = UserId>,
    {
        Self {
            muted_user_ids: muted.into_iter().collect(),
            blocked_user_ids: blocked.into_iter().collect(),
        }
    }

    pub fn is_muted(&self, user: &UserId) -> bool {
        self.muted_user_ids.contains(user)
    }

    pub fn is_blocked(&self, user: &UserId) -> bool {
        self.blocked_user_ids.contains(user)
    }

    pub fn set_muted(&mut self, user: UserId, muted: bool) {
        if muted {
            self.muted_user_ids.insert(user);
        } else {
            self.muted_user_ids.remove(&user);
        }
    }

    pub fn set_blocked(&mut self, user: UserId, blocked: bool) {
        if blocked {
            self.blocked_user_ids.insert(user);
        } else {
            self.blocked_user_ids.remove(&user);
        }
    }

    /// Whether a message by `author` is hidden for `viewer`.
    pub fn hides(&self, author: Option<&UserId>, viewer: &UserId) -> bool {
        match author {
            None => false,
            Some(a) if a == viewer || a.is_scout() => false,
            Some(a) => self.is_muted(a) || self.is_blocked(a),
        }
    }
}

/// Reject moderation aimed at the viewer or the Scout assistant.
///
/// `action` is the verb shown to the user ("mute", "block").
pub fn ensure_moderatable(
    viewer: &UserId,
    target: &UserId,
    action: &'static str,
) -> Result<(), ModerationError> {
    if target == viewer {
        return Err(ModerationError::SelfTarget(action));
    }
    if target.is_scout() {
        return Err(ModerationError::ScoutTarget(match action {
            "mute" => "muted",
            "block" => "blocked",
            other => other,
        }));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visible: Vec<Message>,
    /// Messages the moderation state hides, whether or not they are
    /// currently revealed.
    pub hidden_count: usize,
}

pub fn filter(
    messages: &[Message],
    moderation: &ModerationState,
    viewer: &UserId,
    show_hidden: bool,
) -> FilterOutcome {
    let mut visible = Vec::with_capacity(messages.len());
    let mut hidden_count = 0;

    for message in messages {
        let hidden = moderation.hides(message.author_id.as_ref(), viewer);
        if hidden {
            hidden_count += 1;
        }
        if !hidden || show_hidden {
            visible.push(message.clone());
        }
    }

    FilterOutcome {
        visible,
        hidden_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_shared::thread::ThreadKey;

    fn msg(author: &str, body: &str) -> Message {
        Message::new(ThreadKey::lounge(), UserId::new(author), body)
    }

    fn bodies(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.body.as_str()).collect()
    }

    #[test]
    fn muted_author_hidden_in_order() {
        let viewer = UserId::new("viewer");
        let messages = vec![msg("u1", "a"), msg("u2", "b"), msg("viewer", "c")];
        let moderation = ModerationState::new([UserId::new("u2")], Vec::<UserId>::new());

        let out = filter(&messages, &moderation, &viewer, false);
        assert_eq!(bodies(&out.visible), ["a", "c"]);
        assert_eq!(out.hidden_count, 1);

        let revealed = filter(&messages, &moderation, &viewer, true);
        assert_eq!(bodies(&revealed.visible), ["a", "b", "c"]);
        assert_eq!(revealed.hidden_count, 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let viewer = UserId::new("viewer");
        let messages = vec![msg("u1", "a"), msg("u2", "b"), msg("u3", "c"), msg("u2", "d")];
        let moderation = ModerationState::new([UserId::new("u2")], [UserId::new("u3")]);

        let once = filter(&messages, &moderation, &viewer, false);
        let twice = filter(&once.visible, &moderation, &viewer, false);
        assert_eq!(once.visible, twice.visible);
        assert_eq!(twice.hidden_count, 0);
    }

    #[test]
    fn visible_plus_hidden_accounts_for_everything() {
        let viewer = UserId::new("viewer");
        let messages: Vec<_> = ["u1", "u2", "u3", "viewer", "scout", "u2"]
            .iter()
            .map(|a| msg(a, "x"))
            .collect();
        let moderation = ModerationState::new([UserId::new("u2")], [UserId::new("u3")]);

        let out = filter(&messages, &moderation, &viewer, false);
        assert_eq!(out.visible.len() + out.hidden_count, messages.len());
        assert_eq!(out.hidden_count, 3);
    }

    #[test]
    fn viewer_and_scout_are_never_hidden() {
        let viewer = UserId::new("viewer");
        let moderation = ModerationState::new(
            [viewer.clone(), UserId::scout()],
            [viewer.clone(), UserId::scout()],
        );
        let messages = vec![msg("viewer", "mine"), msg("scout", "tip")];

        let out = filter(&messages, &moderation, &viewer, false);
        assert_eq!(out.visible.len(), 2);
        assert_eq!(out.hidden_count, 0);
    }

    #[test]
    fn authorless_messages_stay_visible() {
        let viewer = UserId::new("viewer");
        let mut orphan = msg("u2", "orphan");
        orphan.author_id = None;
        let moderation = ModerationState::new([UserId::new("u2")], Vec::<UserId>::new());

        let out = filter(&[orphan], &moderation, &viewer, false);
        assert_eq!(out.visible.len(), 1);
    }

    #[test]
    fn self_and_scout_cannot_be_moderated() {
        let viewer = UserId::new("viewer");
        assert_eq!(
            ensure_moderatable(&viewer, &viewer, "mute"),
            Err(ModerationError::SelfTarget("mute"))
        );
        assert_eq!(
            ensure_moderatable(&viewer, &UserId::scout(), "block"),
            Err(ModerationError::ScoutTarget("blocked"))
        );
        assert!(ensure_moderatable(&viewer, &UserId::new("u2"), "mute").is_ok());
    }
}
