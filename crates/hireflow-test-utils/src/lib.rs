//! Shared fakes and fixtures for hireflow tests.
//!
//! The fakes implement the core port traits in memory and record how they
//! were called, so tests can assert on interactions without a database or
//! a presence backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};

use hireflow_core::error::{HireflowError, Result};
use hireflow_core::traits::{PresencePort, WorkflowStore};
use hireflow_core::types::{CampaignId, PresenceEvent, PresenceUser, UserId, WorkflowDocument};

/// In-memory workflow store. Saves overwrite, mirroring the real backends.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<CampaignId, WorkflowDocument>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<WorkflowDocument>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.lock().unwrap();
            for doc in documents {
                map.insert(doc.campaign_id.clone(), doc);
            }
        }
        store
    }

    pub fn get(&self, campaign: &CampaignId) -> Option<WorkflowDocument> {
        self.documents.lock().unwrap().get(campaign).cloned()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl WorkflowStore for MemoryStore {
    fn load(&self, campaign: &CampaignId) -> BoxFuture<'_, Result<Option<WorkflowDocument>>> {
        let doc = self.get(campaign);
        Box::pin(async move { Ok(doc) })
    }

    fn save(&self, document: &WorkflowDocument) -> BoxFuture<'_, Result<()>> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.campaign_id.clone(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(()) })
    }
}

/// Store whose every call fails, for error-path tests.
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl WorkflowStore for FailingStore {
    fn load(&self, campaign: &CampaignId) -> BoxFuture<'_, Result<Option<WorkflowDocument>>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let msg = format!("workflow service unavailable for {}", campaign);
        Box::pin(async move { Err(HireflowError::Store(msg)) })
    }

    fn save(&self, _document: &WorkflowDocument) -> BoxFuture<'_, Result<()>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(HireflowError::Store("workflow service unavailable".into())) })
    }
}

/// Presence port that replays a fixed event script and records calls.
#[derive(Default)]
pub struct ScriptedPresence {
    events: Vec<PresenceEvent>,
    fail_leave: bool,
    joins: Mutex<Vec<(CampaignId, UserId, String)>>,
    leaves: AtomicUsize,
}

impl ScriptedPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subscriber receives `events`, then the stream ends.
    pub fn with_events(events: Vec<PresenceEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn failing_leave() -> Self {
        Self {
            fail_leave: true,
            ..Self::default()
        }
    }

    /// Recorded `(campaign, user, page)` joins.
    pub fn joins(&self) -> Vec<(CampaignId, UserId, String)> {
        self.joins.lock().unwrap().clone()
    }

    pub fn leave_attempts(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }
}

impl PresencePort for ScriptedPresence {
    fn join_room(
        &self,
        campaign: &CampaignId,
        user: &PresenceUser,
        page: &str,
    ) -> BoxFuture<'_, Result<()>> {
        self.joins
            .lock()
            .unwrap()
            .push((campaign.clone(), user.user_id.clone(), page.to_string()));
        Box::pin(async { Ok(()) })
    }

    fn leave_room(&self, _campaign: &CampaignId, _user: &UserId) -> BoxFuture<'_, Result<()>> {
        self.leaves.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_leave;
        Box::pin(async move {
            if fail {
                Err(HireflowError::Presence("presence channel closed".into()))
            } else {
                Ok(())
            }
        })
    }

    fn subscribe(&self, _campaign: &CampaignId) -> BoxStream<'static, PresenceEvent> {
        stream::iter(self.events.clone()).boxed()
    }
}

/// Canned workflow documents.
pub mod fixtures {
    use hireflow_core::types::{CampaignId, Edge, Node, NodeKind, WorkflowDocument};

    /// `Start -> Criteria -> Screening` with ids `s`, `c`, `a`.
    pub fn linear_workflow(campaign: &str) -> WorkflowDocument {
        WorkflowDocument::new(
            CampaignId::new(campaign),
            vec![
                Node::new("s", NodeKind::Start, "Start"),
                Node::new("c", NodeKind::Criteria, "Gate"),
                Node::new("a", NodeKind::Screening, "Screen"),
            ],
            vec![Edge::new("s", "c"), Edge::new("c", "a")],
        )
    }

    /// Document as the workflow service returns it, with campaign metadata.
    pub fn service_document(campaign: &str) -> serde_json::Value {
        serde_json::json!({
            "campaignID": campaign,
            "nodes": [
                {"id": "s", "type": "START", "title": "Start", "x": 0, "y": 0, "data": {}},
                {"id": "c", "type": "CRITERIA", "title": "Gate", "x": 0, "y": 0,
                 "data": {"enabled": true}},
                {"id": "a", "type": "SCREENING", "title": "Screen", "x": 0, "y": 0,
                 "data": {"desc": "Phone screen"}}
            ],
            "edges": [
                {"from": "s", "to": "c"},
                {"from": "c", "to": "a"}
            ],
            "jobFitPreferences": {"minScore": 70},
            "sharedWith": ["recruiter@example.com"]
        })
    }
}
