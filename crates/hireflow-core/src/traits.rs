use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::*;

/// Workflow store: load/save a campaign's workflow graph.
///
/// Saves are unconditional overwrites: there is no concurrency token, so
/// two editors saving the same campaign resolve as last-write-wins.
pub trait WorkflowStore: Send + Sync + 'static {
    /// Load the stored document, `None` if the campaign has never been saved.
    fn load(&self, campaign: &CampaignId) -> BoxFuture<'_, Result<Option<WorkflowDocument>>>;

    /// Persist the document, replacing whatever was stored before.
    fn save(&self, document: &WorkflowDocument) -> BoxFuture<'_, Result<()>>;
}

/// Presence channel: who else is looking at a workflow.
pub trait PresencePort: Send + Sync + 'static {
    /// Announce that `user` opened `page` of the campaign.
    fn join_room(
        &self,
        campaign: &CampaignId,
        user: &PresenceUser,
        page: &str,
    ) -> BoxFuture<'_, Result<()>>;

    /// Announce that the user left.
    fn leave_room(&self, campaign: &CampaignId, user: &UserId) -> BoxFuture<'_, Result<()>>;

    /// Stream of presence events for the campaign's room.
    fn subscribe(&self, campaign: &CampaignId) -> BoxStream<'static, PresenceEvent>;
}
