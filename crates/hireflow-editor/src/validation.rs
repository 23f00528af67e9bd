use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use hireflow_core::types::{NodeId, NodeKind};

use crate::graph::Graph;

/// A structural problem that blocks saving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Missing Start Node: the workflow needs a Start node")]
    MissingStart,

    #[error("Multiple Start Nodes: found {0}, expected exactly one")]
    MultipleStarts(usize),

    #[error("\"{title}\" is unreachable from Start")]
    Unreachable { id: NodeId, title: String },

    #[error("{kind} node has an empty title")]
    EmptyTitle { id: NodeId, kind: NodeKind },
}

/// Run every check and collect all issues, in check order.
pub fn validate(graph: &Graph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let starts: Vec<&str> = graph.start_nodes().map(|n| n.id.as_str()).collect();
    match starts.len() {
        0 => issues.push(ValidationIssue::MissingStart),
        1 => {}
        n => issues.push(ValidationIssue::MultipleStarts(n)),
    }

    if !starts.is_empty() {
        let reached = reachable_from(graph, &starts);
        for node in &graph.nodes {
            if !reached.contains(node.id.as_str()) {
                let title = if node.title.trim().is_empty() {
                    node.id.clone()
                } else {
                    node.title.clone()
                };
                issues.push(ValidationIssue::Unreachable {
                    id: node.id.clone(),
                    title,
                });
            }
        }
    }

    for node in &graph.nodes {
        if node.title.trim().is_empty() {
            issues.push(ValidationIssue::EmptyTitle {
                id: node.id.clone(),
                kind: node.kind,
            });
        }
    }

    issues
}

/// Human-readable messages for every issue; empty means the graph may be saved.
pub fn validation_messages(graph: &Graph) -> Vec<String> {
    validate(graph).iter().map(ToString::to_string).collect()
}

fn reachable_from<'a>(graph: &'a Graph, roots: &[&'a str]) -> HashSet<&'a str> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &graph.edges {
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
    }

    let mut seen: HashSet<&str> = roots.iter().copied().collect();
    let mut queue: VecDeque<&str> = roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for &next in adjacency.get(id).map(Vec::as_slice).unwrap_or_default() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
