//! Unread counters keyed by thread.

use std::collections::HashMap;

use scout_shared::thread::{Thread, ThreadKey};
use scout_shared::types::{GroupId, UserId};
use serde::Serialize;

/// Unread totals per lobby category. `lounge` covers the general and the
/// country lounges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnreadByType {
    pub lounge: u32,
    pub friends: u32,
    pub towns: u32,
    pub groups: u32,
}

impl UnreadByType {
    pub fn total(&self) -> u32 {
        self.lounge
            .saturating_add(self.friends)
            .saturating_add(self.towns)
            .saturating_add(self.groups)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnreadCounters {
    counts: HashMap<Thread, u32>,
}

impl UnreadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every counter with collaborator-computed counts. Keys that do
    /// not parse for `viewer` are skipped; `active` stays at zero.
    pub fn replace_from_keys(
        &mut self,
        counts: HashMap<ThreadKey, u32>,
        viewer: &UserId,
        active: Option<&Thread>,
    ) {
        self.counts.clear();
        for (key, count) in counts {
            match key.to_thread(viewer) {
                Ok(thread) if Some(&thread) != active && count > 0 => {
                    self.counts.insert(thread, count);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(thread = %key, error = %e, "skipping unread count"),
            }
        }
    }

    /// Count an inbound message. Messages by the viewer and messages for the
    /// active thread do not count. Returns the new count for `thread`.
    pub fn record_inbound(
        &mut self,
        thread: &Thread,
        author: Option<&UserId>,
        viewer: &UserId,
        active: Option<&Thread>,
    ) -> u32 {
        if author == Some(viewer) || active == Some(thread) {
            return self.get(thread);
        }
        let count = self.counts.entry(thread.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, thread: &Thread) {
        self.counts.remove(thread);
    }

    pub fn get(&self, thread: &Thread) -> u32 {
        self.counts.get(thread).copied().unwrap_or(0)
    }

    pub fn by_friend(&self) -> HashMap<UserId, u32> {
        self.counts
            .iter()
            .filter_map(|(thread, count)| match thread {
                Thread::Friend { friend_id } => Some((friend_id.clone(), *count)),
                _ => None,
            })
            .collect()
    }

    pub fn by_group(&self) -> HashMap<GroupId, u32> {
        self.counts
            .iter()
            .filter_map(|(thread, count)| match thread {
                Thread::Group { group_id } => Some((*group_id, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn by_type(&self) -> UnreadByType {
        let mut totals = UnreadByType::default();
        for (thread, count) in &self.counts {
            let slot = match thread {
                Thread::Friend { .. } => &mut totals.friends,
                Thread::Group { .. } => &mut totals.groups,
                Thread::TownLounge { .. } => &mut totals.towns,
                Thread::CountryLounge { .. } | Thread::GeneralLounge => &mut totals.lounge,
            };
            *slot = slot.saturating_add(*count);
        }
        totals
    }
}
