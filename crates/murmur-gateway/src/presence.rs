use std::collections::HashMap;

use uuid::Uuid;

/// Which users are currently joined to which channel.
///
/// A user stays present while at least one of their connections is joined,
/// so joins are counted per user. Not synchronized on its own: the
/// [`Dispatcher`](crate::dispatcher::Dispatcher) owns the only instance and
/// mutates it under its lock together with room membership.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// channel_id -> (user_id -> joined connection count)
    channels: HashMap<Uuid, HashMap<Uuid, usize>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, channel_id: Uuid, user_id: Uuid) {
        *self
            .channels
            .entry(channel_id)
            .or_default()
            .entry(user_id)
            .or_insert(0) += 1;
    }

    /// Drop one join of `user_id`. Returns false if the user was not present.
    pub fn leave(&mut self, channel_id: Uuid, user_id: Uuid) -> bool {
        let Some(users) = self.channels.get_mut(&channel_id) else {
            return false;
        };
        let Some(count) = users.get_mut(&user_id) else {
            return false;
        };

        *count -= 1;
        if *count == 0 {
            users.remove(&user_id);
        }
        if users.is_empty() {
            self.channels.remove(&channel_id);
        }
        true
    }

    /// Participants of a channel, sorted so that repeated updates compare equal.
    pub fn members_of(&self, channel_id: Uuid) -> Vec<Uuid> {
        let mut members: Vec<Uuid> = self
            .channels
            .get(&channel_id)
            .map(|users| users.keys().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }
}
