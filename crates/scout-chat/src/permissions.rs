//! Per-message delete/pin permissions and the grouping flag.

use chrono::{DateTime, Duration, Utc};
use scout_shared::constants::DELETE_WINDOW_MINUTES;
use scout_shared::models::Message;
use scout_shared::thread::ThreadKind;
use scout_shared::types::UserId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessagePermissions {
    pub is_deleted: bool,
    pub can_delete: bool,
    pub can_pin: bool,
    /// First message of a run by the same author; the UI shows the author
    /// header only on these.
    pub is_first_in_group: bool,
}

pub fn delete_window() -> Duration {
    Duration::minutes(DELETE_WINDOW_MINUTES)
}

/// Strictly less than the window: a message exactly 15 minutes old can no
/// longer be deleted.
pub fn within_delete_window(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at) < delete_window()
}

/// Permissions of `messages[index]` for `viewer`.
///
/// Never fails. A message without an author or a creation time gets
/// neither delete nor pin rights.
pub fn permissions_for(
    message: &Message,
    index: usize,
    messages: &[Message],
    viewer: &UserId,
    thread_kind: ThreadKind,
    now: DateTime<Utc>,
) -> MessagePermissions {
    let is_deleted = message.is_deleted();
    let well_formed = message.author_id.is_some() && message.created_at.is_some();

    let can_delete = match (&message.author_id, message.created_at) {
        (Some(author), Some(created_at)) => {
            author == viewer && !is_deleted && within_delete_window(created_at, now)
        }
        _ => false,
    };
    let can_pin = well_formed && thread_kind == ThreadKind::Group && !is_deleted;

    let is_first_in_group = match index.checked_sub(1).and_then(|i| messages.get(i)) {
        None => true,
        Some(prev) => prev.author_id != message.author_id,
    };

    MessagePermissions {
        is_deleted,
        can_delete,
        can_pin,
        is_first_in_group,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedMessage {
    pub message: Message,
    pub permissions: MessagePermissions,
    /// Sent locally, not yet confirmed by the collaborator.
    pub pending: bool,
}

/// Annotate a whole list. Grouping follows list position, so pass the list
/// as it will be rendered.
///
/// Pending messages carry a local id the collaborator does not know yet, so
/// they can be neither deleted nor pinned. Deleted messages lose their body.
pub fn annotate(
    messages: &[Message],
    viewer: &UserId,
    thread_kind: ThreadKind,
    now: DateTime<Utc>,
    is_pending: impl Fn(&Message) -> bool,
) -> Vec<AnnotatedMessage> {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let pending = is_pending(m);
            let mut permissions = permissions_for(m, i, messages, viewer, thread_kind, now);
            if pending {
                permissions.can_delete = false;
                permissions.can_pin = false;
            }

            let mut message = m.clone();
            if permissions.is_deleted {
                message.body.clear();
            }
            AnnotatedMessage {
                message,
                permissions,
                pending,
            }
        })
        .collect()
}
