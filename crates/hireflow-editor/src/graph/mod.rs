//! Workflow graph model: typed steps joined by directed edges.
//!
//! Round nodes (announcement, screening, interview, survey) are never
//! joined directly: connecting two of them inserts a criteria node in
//! between. Everything else about validity (single start, reachability)
//! is checked on demand by the validation engine, so intermediate
//! editing states are allowed to be unsound.

pub mod template;

use serde::{Deserialize, Serialize};
use tracing::debug;

use hireflow_core::error::{HireflowError, Result};
use hireflow_core::types::{Edge, Node, NodeId, NodeKind};

pub use template::default_template;

/// Node set plus edge set. Node order is insertion order and feeds layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// What a successful `connect` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Direct(Edge),
    /// Two round nodes were joined through a freshly inserted criteria node.
    ViaCriteria { criteria: NodeId, edges: [Edge; 2] },
}

/// Content edit of a single node. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct NodeEdit {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub config: Option<serde_json::Value>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn start_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Start)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to == id)
    }

    /// Deep, independent copy of the whole graph.
    pub fn snapshot(&self) -> Graph {
        self.clone()
    }

    /// Add an unconnected node with a generated id.
    pub fn add_node(&mut self, kind: NodeKind, title: impl Into<String>) -> NodeId {
        let node = Node::with_id_generated(kind, title);
        let id = node.id.clone();
        debug!(node_id = %id, kind = %kind, "Node added");
        self.nodes.push(node);
        id
    }

    /// Add a node and connect `parent` to it.
    pub fn append_step(
        &mut self,
        parent: &str,
        kind: NodeKind,
        title: impl Into<String>,
    ) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(HireflowError::NodeNotFound(parent.to_string()));
        }
        let node = Node::with_id_generated(kind, title);
        let id = node.id.clone();
        self.nodes.push(node);
        if let Err(e) = self.connect(parent, &id) {
            self.nodes.retain(|n| n.id != id);
            return Err(e);
        }
        Ok(id)
    }

    /// Remove a node together with every edge touching it.
    pub fn delete_node(&mut self, id: &str) -> Result<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| HireflowError::NodeNotFound(id.to_string()))?;
        let removed = self.nodes.remove(index);
        let before = self.edges.len();
        self.edges.retain(|e| e.from != id && e.to != id);
        debug!(
            node_id = %id,
            edges_removed = before - self.edges.len(),
            "Node deleted"
        );
        Ok(removed)
    }

    /// Connect `from` to `to`, inserting a criteria node between two rounds.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<Connection> {
        let source = self
            .node(from)
            .ok_or_else(|| HireflowError::NodeNotFound(from.to_string()))?;
        let target = self
            .node(to)
            .ok_or_else(|| HireflowError::NodeNotFound(to.to_string()))?;

        if from == to {
            return Err(HireflowError::invalid_connection(
                from,
                to,
                "a node cannot connect to itself",
            ));
        }
        if target.kind == NodeKind::Start {
            return Err(HireflowError::invalid_connection(
                from,
                to,
                "the start node cannot be a connection target",
            ));
        }
        if source.kind == NodeKind::Criteria && target.kind == NodeKind::Criteria {
            return Err(HireflowError::invalid_connection(
                from,
                to,
                "criteria nodes cannot be chained",
            ));
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(HireflowError::invalid_connection(
                from,
                to,
                "the nodes are already connected",
            ));
        }

        if source.kind.is_round() && target.kind.is_round() {
            let criteria = Node::with_id_generated(NodeKind::Criteria, NodeKind::Criteria.default_title());
            let criteria_id = criteria.id.clone();
            let edges = [
                Edge::new(from, criteria_id.clone()),
                Edge::new(criteria_id.clone(), to),
            ];
            self.nodes.push(criteria);
            self.edges.extend(edges.iter().cloned());
            debug!(from, to, criteria_id = %criteria_id, "Connected through criteria");
            return Ok(Connection::ViaCriteria {
                criteria: criteria_id,
                edges,
            });
        }

        let edge = Edge::new(from, to);
        self.edges.push(edge.clone());
        debug!(from, to, "Connected");
        Ok(Connection::Direct(edge))
    }

    /// Flip the automation flag of a criteria node, returning the new value.
    pub fn toggle_automation(&mut self, id: &str) -> Result<bool> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| HireflowError::NodeNotFound(id.to_string()))?;
        if node.kind != NodeKind::Criteria {
            return Err(HireflowError::NotCriteria(id.to_string()));
        }
        let enabled = !node.is_automated();
        node.data.enabled = Some(enabled);
        Ok(enabled)
    }

    pub fn edit_node(&mut self, id: &str, edit: NodeEdit) -> Result<()> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| HireflowError::NodeNotFound(id.to_string()))?;
        if let Some(title) = edit.title {
            node.title = title;
        }
        if let Some(desc) = edit.desc {
            node.data.desc = Some(desc);
        }
        if let Some(config) = edit.config {
            node.data.config = Some(config);
        }
        Ok(())
    }

    /// True if any edge joins two round nodes directly.
    pub fn has_round_adjacency(&self) -> bool {
        self.edges.iter().any(|e| {
            let is_round = |id: &str| self.node(id).is_some_and(|n| n.kind.is_round());
            is_round(&e.from) && is_round(&e.to)
        })
    }
}
