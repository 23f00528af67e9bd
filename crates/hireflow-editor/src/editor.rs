use tracing::{debug, error, info, warn};

use hireflow_core::config::{AppConfig, LayoutConfig, ZoomConfig};
use hireflow_core::error::{HireflowError, Result};
use hireflow_core::traits::WorkflowStore;
use hireflow_core::types::{CampaignId, NodeId, NodeKind, Orientation, WorkflowDocument};

use crate::geometry::{resolve_connectors, Connector};
use crate::graph::{default_template, Connection, Graph, NodeEdit};
use crate::history::History;
use crate::layout::relayout;
use crate::session::{GestureMachine, GestureOutcome, PointerEvent, Viewport, WheelInput};
use crate::validation::{validate, validation_messages, ValidationIssue};

/// Knobs the editor needs from the application config.
#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub orientation: Orientation,
    pub history_limit: usize,
    pub layout: LayoutConfig,
    pub zoom: ZoomConfig,
}

impl From<&AppConfig> for EditorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            orientation: config.editor.orientation,
            history_limit: config.editor.history_limit,
            layout: config.layout.clone(),
            zoom: config.zoom.clone(),
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Nothing changed since the last load or save.
    NothingToSave,
}

/// One editing session over a campaign's workflow graph.
///
/// Every structural edit re-runs the layout and records exactly one
/// history entry; failed edits leave both the graph and history untouched.
pub struct WorkflowEditor {
    campaign: CampaignId,
    graph: Graph,
    orientation: Orientation,
    settings: EditorSettings,
    history: History,
    viewport: Viewport,
    gestures: GestureMachine,
    job_fit_preferences: Option<serde_json::Value>,
    shared_with: Option<Vec<serde_json::Value>>,
}

impl WorkflowEditor {
    /// Open the campaign's workflow from the store.
    pub async fn load(
        store: &dyn WorkflowStore,
        campaign: CampaignId,
        settings: EditorSettings,
    ) -> Result<Self> {
        let document = match store.load(&campaign).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                info!(campaign_id = %campaign, "No saved workflow");
                WorkflowDocument::new(campaign.clone(), vec![], vec![])
            }
            Err(e) => {
                error!(campaign_id = %campaign, error = %e, "Failed to load workflow");
                return Err(e);
            }
        };
        Ok(Self::from_document(campaign, document, settings))
    }

    /// Start a session from an already-fetched document.
    pub fn from_document(
        campaign: CampaignId,
        document: WorkflowDocument,
        settings: EditorSettings,
    ) -> Self {
        let mut graph = if document.has_graph() {
            Graph::new(document.nodes, document.edges)
        } else {
            info!(campaign_id = %campaign, "Using default workflow template");
            default_template()
        };
        relayout(&mut graph, settings.orientation, &settings.layout);

        let mut history = History::new(settings.history_limit);
        history.reset(&graph);

        info!(
            campaign_id = %campaign,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Workflow opened"
        );

        Self {
            campaign,
            graph,
            orientation: settings.orientation,
            settings,
            history,
            viewport: Viewport::default(),
            gestures: GestureMachine::new(),
            job_fit_preferences: document.job_fit_preferences,
            shared_with: document.shared_with,
        }
    }

    pub fn campaign(&self) -> &CampaignId {
        &self.campaign
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn gestures(&self) -> &GestureMachine {
        &self.gestures
    }

    /// True when there is nothing to save.
    pub fn is_saved(&self) -> bool {
        self.history.is_saved()
    }

    pub fn can_save(&self) -> bool {
        !self.history.is_saved()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self, action: &str) {
        relayout(&mut self.graph, self.orientation, &self.settings.layout);
        self.history.record(&self.graph);
        debug!(
            campaign_id = %self.campaign,
            action,
            history_len = self.history.len(),
            "Workflow edited"
        );
    }

    pub fn add_step(&mut self, kind: NodeKind, title: impl Into<String>) -> NodeId {
        let id = self.graph.add_node(kind, title);
        self.commit("add_step");
        id
    }

    pub fn append_step(
        &mut self,
        parent: &str,
        kind: NodeKind,
        title: impl Into<String>,
    ) -> Result<NodeId> {
        let id = self.graph.append_step(parent, kind, title)?;
        self.commit("append_step");
        Ok(id)
    }

    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        self.graph.delete_node(id)?;
        self.commit("delete_node");
        Ok(())
    }

    pub fn connect(&mut self, from: &str, to: &str) -> Result<Connection> {
        let connection = self.graph.connect(from, to)?;
        self.commit("connect");
        Ok(connection)
    }

    pub fn toggle_automation(&mut self, id: &str) -> Result<bool> {
        let enabled = self.graph.toggle_automation(id)?;
        self.commit("toggle_automation");
        Ok(enabled)
    }

    pub fn edit_node(&mut self, id: &str, edit: NodeEdit) -> Result<()> {
        self.graph.edit_node(id, edit)?;
        self.commit("edit_node");
        Ok(())
    }

    /// Switch flow direction. View state only, so history is untouched.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation == orientation {
            return;
        }
        self.orientation = orientation;
        relayout(&mut self.graph, self.orientation, &self.settings.layout);
        debug!(campaign_id = %self.campaign, orientation = %orientation, "Orientation changed");
    }

    pub fn toggle_orientation(&mut self) {
        self.set_orientation(self.orientation.toggled());
    }

    /// Restore the previous snapshot. Returns false at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(graph) => {
                self.restore(graph);
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(graph) => {
                self.restore(graph);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, graph: Graph) {
        self.graph = graph;
        // Snapshot positions may come from the other orientation.
        relayout(&mut self.graph, self.orientation, &self.settings.layout);
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate(&self.graph)
    }

    pub fn connectors(&self) -> Vec<Connector> {
        resolve_connectors(&self.graph, self.orientation)
    }

    /// The document a save would send.
    pub fn document(&self) -> WorkflowDocument {
        WorkflowDocument {
            campaign_id: self.campaign.clone(),
            nodes: self.graph.nodes.clone(),
            edges: self.graph.edges.clone(),
            job_fit_preferences: self.job_fit_preferences.clone(),
            shared_with: self.shared_with.clone(),
            saved_at: None,
        }
    }

    /// Validate and persist. On failure the graph and history are kept as-is
    /// so the save can simply be retried.
    pub async fn save(&mut self, store: &dyn WorkflowStore) -> Result<SaveOutcome> {
        if self.history.is_saved() {
            return Ok(SaveOutcome::NothingToSave);
        }

        let problems = validation_messages(&self.graph);
        if !problems.is_empty() {
            warn!(
                campaign_id = %self.campaign,
                problems = problems.len(),
                "Save blocked by validation"
            );
            return Err(HireflowError::Validation(problems));
        }

        let document = self.document();
        match store.save(&document).await {
            Ok(()) => {
                self.history.reset(&self.graph);
                info!(
                    campaign_id = %self.campaign,
                    nodes = document.nodes.len(),
                    edges = document.edges.len(),
                    "Workflow saved"
                );
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                error!(campaign_id = %self.campaign, error = %e, "Failed to save workflow");
                Err(e)
            }
        }
    }

    /// Feed a pointer event to the gesture machine, applying finished connections.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<GestureOutcome> {
        let outcome =
            self.gestures
                .handle(event, &mut self.viewport, &self.graph, self.orientation);
        if let GestureOutcome::Connect { from, to } = &outcome {
            self.connect(from, to)?;
        }
        Ok(outcome)
    }

    pub fn handle_wheel(&mut self, wheel: WheelInput) -> Viewport {
        self.viewport.apply_wheel(wheel, &self.settings.zoom);
        self.viewport
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.viewport.zoom_in(&self.settings.zoom);
        self.viewport.zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.viewport.zoom_out(&self.settings.zoom);
        self.viewport.zoom
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.viewport.reset_zoom(&self.settings.zoom);
        self.viewport.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireflow_core::types::{Edge, Node, Point};
    use hireflow_test_utils::{fixtures, FailingStore, MemoryStore};

    use crate::session::HitTarget;

    fn campaign() -> CampaignId {
        CampaignId::new("cmp-1")
    }

    fn linear() -> WorkflowDocument {
        fixtures::linear_workflow("cmp-1")
    }

    fn editor_with(document: WorkflowDocument) -> WorkflowEditor {
        WorkflowEditor::from_document(campaign(), document, EditorSettings::default())
    }

    #[tokio::test]
    async fn test_missing_workflow_falls_back_to_template() {
        let store = MemoryStore::new();
        let editor = WorkflowEditor::load(&store, campaign(), EditorSettings::default())
            .await
            .unwrap();
        assert_eq!(editor.graph().nodes.len(), default_template().nodes.len());
        assert!(editor.is_saved());
        assert_eq!(editor.history().len(), 1);
        assert!(editor.validate().is_empty());
    }

    #[tokio::test]
    async fn test_document_without_nodes_falls_back_to_template() {
        let store = MemoryStore::with_documents(vec![WorkflowDocument::new(campaign(), vec![], vec![])]);
        let editor = WorkflowEditor::load(&store, campaign(), EditorSettings::default())
            .await
            .unwrap();
        assert!(editor.graph().node("start").is_some());
    }

    #[tokio::test]
    async fn test_load_error_is_returned() {
        let store = FailingStore::new();
        let result = WorkflowEditor::load(&store, campaign(), EditorSettings::default()).await;
        assert!(matches!(result, Err(HireflowError::Store(_))));
    }

    #[test]
    fn test_loaded_graph_is_laid_out() {
        let editor = editor_with(linear());
        let start = editor.graph().node("s").unwrap();
        assert_eq!((start.x, start.y), (50.0, 318.0));
    }

    #[test]
    fn test_each_mutation_records_once() {
        let mut editor = editor_with(linear());
        let mut expected = 1;

        let id = editor.add_step(NodeKind::Survey, "Exit survey");
        expected += 1;
        assert_eq!(editor.history().len(), expected);

        editor.connect("a", &id).unwrap();
        expected += 1;
        assert_eq!(editor.history().len(), expected);

        let criteria = editor
            .graph()
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Criteria && n.id != "c")
            .map(|n| n.id.clone())
            .unwrap();
        editor.toggle_automation(&criteria).unwrap();
        expected += 1;
        assert_eq!(editor.history().len(), expected);

        editor
            .edit_node(&id, NodeEdit { title: Some("Survey".into()), ..NodeEdit::default() })
            .unwrap();
        expected += 1;
        assert_eq!(editor.history().len(), expected);

        editor.append_step(&id, NodeKind::Interview, "Debrief").unwrap();
        expected += 1;
        assert_eq!(editor.history().len(), expected);

        editor.delete_node(&id).unwrap();
        expected += 1;
        assert_eq!(editor.history().len(), expected);
        assert!(!editor.is_saved());
    }

    #[test]
    fn test_failed_mutation_records_nothing() {
        let mut editor = editor_with(linear());
        assert!(editor.connect("a", "s").is_err());
        assert!(editor.delete_node("ghost").is_err());
        assert!(editor.toggle_automation("a").is_err());
        assert_eq!(editor.history().len(), 1);
        assert!(editor.is_saved());
    }

    #[test]
    fn test_round_connect_never_adjacent() {
        let mut editor = editor_with(linear());
        let b = editor.add_step(NodeKind::Interview, "Onsite");
        let conn = editor.connect("a", &b).unwrap();
        assert!(matches!(conn, Connection::ViaCriteria { .. }));
        assert!(!editor.graph().has_round_adjacency());
        assert!(!editor
            .graph()
            .edges
            .iter()
            .any(|e| e == &Edge::new("a", b.clone())));
    }

    #[test]
    fn test_structural_edit_relayouts() {
        let mut editor = editor_with(linear());
        let id = editor.append_step("a", NodeKind::Interview, "Onsite").unwrap();
        let node = editor.graph().node(&id).unwrap();
        let a = editor.graph().node("a").unwrap();
        assert!(node.x > a.x);
    }

    #[test]
    fn test_undo_redo_restores_graph() {
        let mut editor = editor_with(linear());
        let before = editor.graph().clone();
        let id = editor.add_step(NodeKind::Survey, "Exit");
        let after = editor.graph().clone();

        assert!(editor.undo());
        assert_eq!(editor.graph(), &before);
        assert!(!editor.undo());

        assert!(editor.redo());
        assert_eq!(editor.graph(), &after);
        assert!(editor.graph().contains(&id));
        assert!(!editor.redo());
    }

    #[test]
    fn test_orientation_is_not_history() {
        let mut editor = editor_with(linear());
        editor.toggle_orientation();
        assert_eq!(editor.orientation(), Orientation::Vertical);
        assert_eq!(editor.history().len(), 1);
        assert!(editor.is_saved());
        let start = editor.graph().node("s").unwrap();
        assert_eq!((start.x, start.y), (500.0, 50.0));
    }

    #[test]
    fn test_undo_after_toggle_uses_current_orientation() {
        let mut editor = editor_with(linear());
        editor.add_step(NodeKind::Survey, "Exit");
        editor.set_orientation(Orientation::Vertical);
        editor.undo();
        let start = editor.graph().node("s").unwrap();
        assert_eq!((start.x, start.y), (500.0, 50.0));
    }

    #[tokio::test]
    async fn test_save_resets_history() {
        let store = MemoryStore::new();
        let mut editor = editor_with(linear());
        editor.append_step("a", NodeKind::Interview, "Onsite").unwrap();
        editor.add_step(NodeKind::Survey, "Loose");
        editor.undo();

        assert_eq!(editor.save(&store).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(editor.history().len(), 1);
        assert!(editor.is_saved());
        assert!(!editor.undo());

        let stored = store.get(&campaign()).unwrap();
        assert_eq!(stored.nodes, editor.graph().nodes);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_clean_editor_has_nothing_to_save() {
        let store = MemoryStore::new();
        let mut editor = editor_with(linear());
        assert!(!editor.can_save());
        assert_eq!(editor.save(&store).await.unwrap(), SaveOutcome::NothingToSave);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_graph_is_not_saved() {
        let store = MemoryStore::new();
        let mut editor = editor_with(linear());
        editor.add_step(NodeKind::Survey, "   ");

        let err = editor.save(&store).await.unwrap_err();
        let HireflowError::Validation(messages) = err else {
            panic!("expected validation error");
        };
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m == "SURVEY node has an empty title"));
        assert_eq!(store.save_count(), 0);
        assert!(!editor.is_saved());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_state() {
        let store = FailingStore::new();
        let mut editor = editor_with(linear());
        editor.append_step("a", NodeKind::Interview, "Onsite").unwrap();
        let graph = editor.graph().clone();

        assert!(matches!(editor.save(&store).await, Err(HireflowError::Store(_))));
        assert_eq!(editor.graph(), &graph);
        assert_eq!(editor.history().len(), 2);
        assert!(editor.can_save());
        assert!(editor.undo());
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_save() {
        let mut doc = linear();
        doc.job_fit_preferences = Some(serde_json::json!({"minScore": 60}));
        doc.shared_with = Some(vec![serde_json::json!("recruiter-7")]);
        let store = MemoryStore::with_documents(vec![doc]);

        let mut editor = WorkflowEditor::load(&store, campaign(), EditorSettings::default())
            .await
            .unwrap();
        editor.add_step(NodeKind::Survey, "x");
        editor.undo();
        editor.save(&store).await.unwrap();

        let stored = store.get(&campaign()).unwrap();
        assert_eq!(stored.job_fit_preferences, Some(serde_json::json!({"minScore": 60})));
        assert_eq!(stored.shared_with.map(|s| s.len()), Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_editors_last_write_wins() {
        // Documented policy: no conflict detection, the later save overwrites.
        let store = MemoryStore::new();
        let mut first = editor_with(linear());
        let mut second = editor_with(linear());

        first.append_step("a", NodeKind::Interview, "From first").unwrap();
        second.append_step("a", NodeKind::Survey, "From second").unwrap();

        first.save(&store).await.unwrap();
        second.save(&store).await.unwrap();

        let stored = store.get(&campaign()).unwrap();
        assert!(stored.nodes.iter().any(|n| n.title == "From second"));
        assert!(!stored.nodes.iter().any(|n| n.title == "From first"));
    }

    #[test]
    fn test_pointer_connect_goes_through_editor() {
        let mut doc = linear();
        doc.nodes.push(Node::new("b", NodeKind::Interview, "Onsite"));
        let mut editor = editor_with(doc);
        // b is a root at depth 0; a sits further right
        let b = editor.graph().node("b").unwrap().clone();
        let a = editor.graph().node("a").unwrap().clone();
        assert!(a.x > b.x);

        editor
            .handle_pointer(PointerEvent::Down {
                at: Point::new(b.x + 280.0, b.y + 80.0),
                target: HitTarget::OutputHandle("b".into()),
            })
            .unwrap();
        let outcome = editor
            .handle_pointer(PointerEvent::Up {
                at: Point::new(a.x, a.y),
                target: HitTarget::Node("a".into()),
            })
            .unwrap();

        assert_eq!(outcome, GestureOutcome::Connect { from: "b".into(), to: "a".into() });
        assert_eq!(editor.history().len(), 2);
        assert!(!editor.graph().has_round_adjacency());
    }

    #[test]
    fn test_zoom_controls_share_range() {
        let mut editor = editor_with(linear());
        for _ in 0..50 {
            editor.zoom_in();
        }
        assert_eq!(editor.viewport().zoom, 3.0);
        editor.handle_wheel(WheelInput { delta_y: 100_000.0, ctrl: true, ..WheelInput::default() });
        assert_eq!(editor.viewport().zoom, 0.1);
        assert_eq!(editor.reset_zoom(), 1.0);
    }
}
