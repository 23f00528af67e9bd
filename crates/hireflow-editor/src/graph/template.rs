use hireflow_core::types::{Edge, Node, NodeKind};

use super::Graph;

/// Demo workflow used when a campaign has no saved graph.
pub fn default_template() -> Graph {
    let steps = [
        ("start", NodeKind::Start),
        ("criteria-1", NodeKind::Criteria),
        ("announcement", NodeKind::Announcement),
        ("criteria-2", NodeKind::Criteria),
        ("screening", NodeKind::Screening),
        ("criteria-3", NodeKind::Criteria),
        ("interview", NodeKind::Interview),
        ("criteria-4", NodeKind::Criteria),
        ("survey", NodeKind::Survey),
    ];

    let nodes: Vec<Node> = steps
        .iter()
        .map(|(id, kind)| Node::new(*id, *kind, kind.default_title()))
        .collect();
    let edges = steps
        .windows(2)
        .map(|pair| Edge::new(pair[0].0, pair[1].0))
        .collect();

    Graph::new(nodes, edges)
}
