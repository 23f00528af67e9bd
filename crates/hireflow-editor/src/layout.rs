//! Auto-layout: deterministic node positions from graph topology alone.
//!
//! Nodes are leveled by breadth-first distance from the roots (the start
//! node and every node without incoming edges). Levels become columns in
//! horizontal mode and rows in vertical mode; each level is centered on a
//! fixed axis. Manual positions are never consulted, so running the layout
//! twice on the same topology gives the same coordinates.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use hireflow_core::config::LayoutConfig;
use hireflow_core::types::{NodeId, NodeKind, Orientation, Point};

use crate::graph::Graph;

/// Computed positions plus the level structure they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Top-left corner of every node.
    pub positions: BTreeMap<NodeId, Point>,
    /// Node ids per depth, in discovery order.
    pub levels: Vec<Vec<NodeId>>,
}

impl Layout {
    /// Write the computed positions into the graph's nodes.
    pub fn apply(&self, graph: &mut Graph) {
        for node in &mut graph.nodes {
            if let Some(p) = self.positions.get(&node.id) {
                node.x = p.x;
                node.y = p.y;
            }
        }
    }

    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|n| n == id))
    }
}

/// Compute positions for every node of `graph`.
pub fn calculate_auto_layout(
    graph: &Graph,
    orientation: Orientation,
    config: &LayoutConfig,
) -> Layout {
    let levels = assign_levels(graph);

    let sizes: HashMap<&str, _> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.size()))
        .collect();

    let mut positions = BTreeMap::new();
    let mut cursor = config.origin;

    for level in &levels {
        let level_sizes: Vec<_> = level.iter().map(|id| sizes[id.as_str()]).collect();

        match orientation {
            Orientation::Horizontal => {
                let column_width = level_sizes.iter().map(|s| s.width).fold(0.0, f64::max);
                if column_width <= 0.0 {
                    continue;
                }
                let total: f64 = level_sizes.iter().map(|s| s.height).sum::<f64>()
                    + config.gap_y * (level.len() as f64 - 1.0);
                let mut y = config.horizontal_axis_y - total / 2.0;
                for (id, size) in level.iter().zip(&level_sizes) {
                    let x = cursor + (column_width - size.width) / 2.0;
                    positions.insert(id.clone(), Point::new(x, y));
                    y += size.height + config.gap_y;
                }
                cursor += column_width + config.gap_x;
            }
            Orientation::Vertical => {
                let row_height = level_sizes.iter().map(|s| s.height).fold(0.0, f64::max);
                if row_height <= 0.0 {
                    continue;
                }
                let total: f64 = level_sizes.iter().map(|s| s.width).sum::<f64>()
                    + config.gap_x * (level.len() as f64 - 1.0);
                let mut x = config.vertical_axis_x - total / 2.0;
                for (id, size) in level.iter().zip(&level_sizes) {
                    let y = cursor + (row_height - size.height) / 2.0;
                    positions.insert(id.clone(), Point::new(x, y));
                    x += size.width + config.gap_x;
                }
                cursor += row_height + config.gap_y;
            }
        }
    }

    Layout { positions, levels }
}

/// Lay the graph out and write the positions back in one step.
pub fn relayout(graph: &mut Graph, orientation: Orientation, config: &LayoutConfig) -> Layout {
    let layout = calculate_auto_layout(graph, orientation, config);
    layout.apply(graph);
    layout
}

/// Breadth-first depth of every node, grouped into levels.
fn assign_levels(graph: &Graph) -> Vec<Vec<NodeId>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> =
        graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();

    for edge in &graph.edges {
        if !in_degree.contains_key(edge.from.as_str()) || !in_degree.contains_key(edge.to.as_str())
        {
            debug!(from = %edge.from, to = %edge.to, "Layout ignoring dangling edge");
            continue;
        }
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        if let Some(d) = in_degree.get_mut(edge.to.as_str()) {
            *d += 1;
        }
    }

    let mut depth: HashMap<&str, usize> = HashMap::new();
    let mut discovered: Vec<&str> = Vec::with_capacity(graph.nodes.len());
    let mut queue: VecDeque<&str> = VecDeque::new();

    for node in &graph.nodes {
        let id = node.id.as_str();
        if (node.kind == NodeKind::Start || in_degree[id] == 0) && !depth.contains_key(id) {
            depth.insert(id, 0);
            discovered.push(id);
            queue.push_back(id);
        }
    }
    walk(&adjacency, &mut depth, &mut discovered, &mut queue);

    // Cycles without an entry point: seed them at depth 0.
    for node in &graph.nodes {
        let id = node.id.as_str();
        if depth.contains_key(id) {
            continue;
        }
        depth.insert(id, 0);
        discovered.push(id);
        queue.push_back(id);
        walk(&adjacency, &mut depth, &mut discovered, &mut queue);
    }

    let max_depth = depth.values().copied().max().map_or(0, |d| d + 1);
    let mut levels: Vec<Vec<NodeId>> = vec![Vec::new(); max_depth];
    for id in discovered {
        levels[depth[id]].push(id.to_string());
    }
    levels
}

fn walk<'a>(
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    depth: &mut HashMap<&'a str, usize>,
    discovered: &mut Vec<&'a str>,
    queue: &mut VecDeque<&'a str>,
) {
    while let Some(id) = queue.pop_front() {
        let next = depth[id] + 1;
        for &child in adjacency.get(id).map(Vec::as_slice).unwrap_or_default() {
            if depth.contains_key(child) {
                continue;
            }
            depth.insert(child, next);
            discovered.push(child);
            queue.push_back(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireflow_core::types::{Edge, Node};
    use std::collections::HashSet;

    fn chain() -> Graph {
        Graph::new(
            vec![
                Node::new("s", NodeKind::Start, "Start"),
                Node::new("c", NodeKind::Criteria, "Criteria"),
                Node::new("a", NodeKind::Screening, "Screen"),
            ],
            vec![Edge::new("s", "c"), Edge::new("c", "a")],
        )
    }

    fn pos(layout: &Layout, id: &str) -> (f64, f64) {
        let p = layout.positions[id];
        (p.x, p.y)
    }

    #[test]
    fn test_horizontal_chain_coordinates() {
        let layout = calculate_auto_layout(&chain(), Orientation::Horizontal, &LayoutConfig::default());
        assert_eq!(pos(&layout, "s"), (50.0, 318.0));
        assert_eq!(pos(&layout, "c"), (350.0, 330.0));
        assert_eq!(pos(&layout, "a"), (490.0, 270.0));
    }

    #[test]
    fn test_vertical_chain_coordinates() {
        let layout = calculate_auto_layout(&chain(), Orientation::Vertical, &LayoutConfig::default());
        assert_eq!(pos(&layout, "s"), (500.0, 50.0));
        assert_eq!(pos(&layout, "c"), (580.0, 174.0));
        assert_eq!(pos(&layout, "a"), (460.0, 274.0));
    }

    #[test]
    fn test_siblings_are_stacked_around_axis() {
        let mut g = chain();
        g.nodes.push(Node::new("b", NodeKind::Screening, "Other"));
        g.edges.push(Edge::new("c", "b"));

        let layout = calculate_auto_layout(&g, Orientation::Horizontal, &LayoutConfig::default());
        assert_eq!(layout.levels[2], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(pos(&layout, "a"), (490.0, 160.0));
        assert_eq!(pos(&layout, "b"), (490.0, 380.0));

        let layout = calculate_auto_layout(&g, Orientation::Vertical, &LayoutConfig::default());
        assert_eq!(pos(&layout, "a"), (270.0, 274.0));
        assert_eq!(pos(&layout, "b"), (650.0, 274.0));
    }

    #[test]
    fn test_narrow_node_centered_in_column() {
        let mut g = chain();
        g.nodes.push(Node::new("c2", NodeKind::Criteria, "Criteria"));
        g.edges.push(Edge::new("a", "c2"));
        g.nodes.push(Node::new("x", NodeKind::Interview, "Onsite"));
        g.edges.push(Edge::new("s", "x"));

        let layout = calculate_auto_layout(&g, Orientation::Horizontal, &LayoutConfig::default());
        // level 1 holds c (40 wide) and x (280 wide)
        assert_eq!(layout.levels[1], vec!["c".to_string(), "x".to_string()]);
        assert_eq!(layout.positions["c"].x, 350.0 + 120.0);
        assert_eq!(layout.positions["x"].x, 350.0);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut g = crate::graph::default_template();
        let config = LayoutConfig::default();
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let first = relayout(&mut g, orientation, &config);
            let coords: Vec<_> = g.nodes.iter().map(|n| (n.x, n.y)).collect();
            let second = relayout(&mut g, orientation, &config);
            assert_eq!(first, second);
            assert_eq!(coords, g.nodes.iter().map(|n| (n.x, n.y)).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_ignores_existing_positions() {
        let mut moved = chain();
        for node in &mut moved.nodes {
            node.x = 9999.0;
            node.y = -42.0;
        }
        let config = LayoutConfig::default();
        assert_eq!(
            calculate_auto_layout(&moved, Orientation::Horizontal, &config),
            calculate_auto_layout(&chain(), Orientation::Horizontal, &config)
        );
    }

    #[test]
    fn test_every_node_in_exactly_one_level() {
        let mut g = crate::graph::default_template();
        // disconnected fragment and a pure cycle
        g.nodes.push(Node::new("lone", NodeKind::Survey, "Lone"));
        g.nodes.push(Node::new("p", NodeKind::Screening, "P"));
        g.nodes.push(Node::new("q", NodeKind::Criteria, "Q"));
        g.edges.push(Edge::new("p", "q"));
        g.edges.push(Edge::new("q", "p"));

        let layout = calculate_auto_layout(&g, Orientation::Horizontal, &LayoutConfig::default());
        let all: Vec<&NodeId> = layout.levels.iter().flatten().collect();
        let unique: HashSet<&NodeId> = all.iter().copied().collect();
        assert_eq!(all.len(), g.nodes.len());
        assert_eq!(unique.len(), g.nodes.len());
        assert_eq!(layout.positions.len(), g.nodes.len());

        for node in &g.nodes {
            if node.kind == NodeKind::Start || g.incoming(&node.id).count() == 0 {
                assert_eq!(layout.depth_of(&node.id), Some(0), "{} should be a root", node.id);
            }
        }
        assert_eq!(layout.depth_of("p"), Some(0));
        assert_eq!(layout.depth_of("q"), Some(1));
    }

    #[test]
    fn test_depth_is_nearest_root_distance() {
        let g = Graph::new(
            vec![
                Node::new("s", NodeKind::Start, "Start"),
                Node::new("c1", NodeKind::Criteria, "C1"),
                Node::new("a", NodeKind::Screening, "A"),
                Node::new("c2", NodeKind::Criteria, "C2"),
                Node::new("b", NodeKind::Interview, "B"),
            ],
            vec![
                Edge::new("s", "c1"),
                Edge::new("c1", "a"),
                Edge::new("a", "c2"),
                Edge::new("c2", "b"),
                Edge::new("c1", "b"),
            ],
        );
        let layout = calculate_auto_layout(&g, Orientation::Horizontal, &LayoutConfig::default());
        assert_eq!(layout.depth_of("b"), Some(2));
        assert_eq!(layout.depth_of("c2"), Some(3));
    }

    #[test]
    fn test_dangling_edges_are_ignored() {
        let mut g = chain();
        g.edges.push(Edge::new("a", "ghost"));
        g.edges.push(Edge::new("ghost", "c"));
        let config = LayoutConfig::default();
        assert_eq!(
            calculate_auto_layout(&g, Orientation::Horizontal, &config),
            calculate_auto_layout(&chain(), Orientation::Horizontal, &config)
        );
    }

    #[test]
    fn test_empty_graph() {
        let layout = calculate_auto_layout(&Graph::default(), Orientation::Vertical, &LayoutConfig::default());
        assert!(layout.levels.is_empty());
        assert!(layout.positions.is_empty());
    }
}
