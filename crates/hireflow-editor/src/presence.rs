use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info, warn};

use hireflow_core::error::Result;
use hireflow_core::traits::PresencePort;
use hireflow_core::types::{CampaignId, PresenceEvent, PresenceUser, UserId};

/// Read-only view of who is present, rebuilt from presence events.
#[derive(Debug, Clone, Default)]
pub struct PresenceRoster {
    users: BTreeMap<UserId, PresenceUser>,
}

impl PresenceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &PresenceEvent) {
        match event {
            PresenceEvent::RoomSync { users } => {
                self.users = users
                    .iter()
                    .map(|u| (u.user_id.clone(), u.clone()))
                    .collect();
            }
            PresenceEvent::UserJoined { user } => {
                self.users.insert(user.user_id.clone(), user.clone());
            }
            PresenceEvent::UserLeft { user_id } => {
                self.users.remove(user_id);
            }
            PresenceEvent::UserUpdated { user_id, patch } => match self.users.get_mut(user_id) {
                Some(user) => user.merge(patch),
                None => debug!(user_id = %user_id, "Update for unknown presence user ignored"),
            },
        }
    }

    pub fn users(&self) -> impl Iterator<Item = &PresenceUser> {
        self.users.values()
    }

    /// Everyone except `me`, for avatar rendering.
    pub fn others<'a>(&'a self, me: &'a UserId) -> impl Iterator<Item = &'a PresenceUser> + 'a {
        self.users.values().filter(move |u| &u.user_id != me)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.users.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// One user's membership in a campaign's presence room.
///
/// Observation only: events update the roster, never the graph.
pub struct PresenceSession {
    port: Arc<dyn PresencePort>,
    campaign: CampaignId,
    user: PresenceUser,
    events: BoxStream<'static, PresenceEvent>,
    roster: PresenceRoster,
}

impl PresenceSession {
    /// Subscribe to the room, then announce the user.
    pub async fn join(
        port: Arc<dyn PresencePort>,
        campaign: CampaignId,
        user: PresenceUser,
        page: &str,
    ) -> Result<Self> {
        let events = port.subscribe(&campaign);
        port.join_room(&campaign, &user, page).await?;
        info!(campaign_id = %campaign, user_id = %user.user_id, page, "Joined presence room");
        Ok(Self {
            port,
            campaign,
            user,
            events,
            roster: PresenceRoster::new(),
        })
    }

    /// Wait for the next event and fold it into the roster.
    /// `None` once the channel has closed.
    pub async fn next_event(&mut self) -> Option<PresenceEvent> {
        let event = self.events.next().await?;
        self.roster.apply(&event);
        Some(event)
    }

    /// Apply every event that is already available without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(Some(event)) = self.events.next().now_or_never() {
            self.roster.apply(&event);
            applied += 1;
        }
        applied
    }

    pub fn roster(&self) -> &PresenceRoster {
        &self.roster
    }

    /// Other users present, excluding this session's user.
    pub fn others(&self) -> Vec<&PresenceUser> {
        self.roster.others(&self.user.user_id).collect()
    }

    pub fn campaign(&self) -> &CampaignId {
        &self.campaign
    }

    /// Announce departure. Best-effort: failures are logged, never retried.
    pub async fn leave(self) {
        match self.port.leave_room(&self.campaign, &self.user.user_id).await {
            Ok(()) => info!(campaign_id = %self.campaign, user_id = %self.user.user_id, "Left presence room"),
            Err(e) => warn!(
                campaign_id = %self.campaign,
                user_id = %self.user.user_id,
                error = %e,
                "Presence leave failed"
            ),
        }
    }
}
