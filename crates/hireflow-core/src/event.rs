use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::PresenceConfig;
use crate::error::{HireflowError, Result};
use crate::traits::PresencePort;
use crate::types::{CampaignId, PresenceEvent, PresencePatch, PresenceUser, UserId};

struct Room {
    users: BTreeMap<UserId, PresenceUser>,
    tx: broadcast::Sender<PresenceEvent>,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            users: BTreeMap::new(),
            tx,
        }
    }

    fn publish(&self, event: PresenceEvent) {
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }

    fn sync_event(&self) -> PresenceEvent {
        PresenceEvent::RoomSync {
            users: self.users.values().cloned().collect(),
        }
    }
}

/// In-process presence rooms, one broadcast channel per campaign.
/// All subscribers of a room receive all of its events.
pub struct PresenceHub {
    capacity: usize,
    rooms: Mutex<HashMap<CampaignId, Room>>,
}

impl PresenceHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &PresenceConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Users currently in the campaign's room, ordered by id.
    pub fn users(&self, campaign: &CampaignId) -> Vec<PresenceUser> {
        let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        rooms
            .get(campaign)
            .map(|room| room.users.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Merge `patch` into a present user. Returns false if the user is not in the room.
    pub fn update_user(&self, campaign: &CampaignId, user: &UserId, patch: PresencePatch) -> bool {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let Some(room) = rooms.get_mut(campaign) else {
            return false;
        };
        let Some(entry) = room.users.get_mut(user) else {
            return false;
        };
        entry.merge(&patch);
        room.publish(PresenceEvent::UserUpdated {
            user_id: user.clone(),
            patch,
        });
        true
    }

    fn with_room<T>(&self, campaign: &CampaignId, f: impl FnOnce(&mut Room) -> T) -> Result<T> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|e| HireflowError::Presence(e.to_string()))?;
        let room = rooms
            .entry(campaign.clone())
            .or_insert_with(|| Room::new(self.capacity));
        Ok(f(room))
    }
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl PresencePort for PresenceHub {
    fn join_room(
        &self,
        campaign: &CampaignId,
        user: &PresenceUser,
        page: &str,
    ) -> BoxFuture<'_, Result<()>> {
        let mut user = user.clone();
        user.page = Some(page.to_string());
        let result = self.with_room(campaign, |room| {
            room.users.insert(user.user_id.clone(), user.clone());
            room.publish(PresenceEvent::UserJoined { user });
            room.publish(room.sync_event());
        });
        debug!(campaign_id = %campaign, "Presence join");
        Box::pin(async move { result })
    }

    fn leave_room(&self, campaign: &CampaignId, user: &UserId) -> BoxFuture<'_, Result<()>> {
        let result = self.with_room(campaign, |room| {
            if room.users.remove(user).is_some() {
                room.publish(PresenceEvent::UserLeft {
                    user_id: user.clone(),
                });
            }
        });
        debug!(campaign_id = %campaign, user_id = %user, "Presence leave");
        Box::pin(async move { result })
    }

    fn subscribe(&self, campaign: &CampaignId) -> BoxStream<'static, PresenceEvent> {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let rx = rooms
            .entry(campaign.clone())
            .or_insert_with(|| Room::new(self.capacity))
            .tx
            .subscribe();
        drop(rooms);

        stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Presence subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
