use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use hireflow_core::types::{Node, NodeId, Orientation, Point};

use crate::graph::Graph;

/// Render geometry of one edge: anchors plus cubic Bézier control points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub from: NodeId,
    pub to: NodeId,
    pub source: Point,
    pub target: Point,
    pub control_1: Point,
    pub control_2: Point,
}

impl Connector {
    /// SVG path data for the connector curve.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.source.x,
            self.source.y,
            self.control_1.x,
            self.control_1.y,
            self.control_2.x,
            self.control_2.y,
            self.target.x,
            self.target.y
        )
    }
}

/// Where connectors leave a node: right-center or bottom-center.
pub fn output_anchor(node: &Node, orientation: Orientation) -> Point {
    let size = node.size();
    match orientation {
        Orientation::Horizontal => Point::new(node.x + size.width, node.y + size.height / 2.0),
        Orientation::Vertical => Point::new(node.x + size.width / 2.0, node.y + size.height),
    }
}

/// Where connectors enter a node: left-center or top-center.
pub fn input_anchor(node: &Node, orientation: Orientation) -> Point {
    let size = node.size();
    match orientation {
        Orientation::Horizontal => Point::new(node.x, node.y + size.height / 2.0),
        Orientation::Vertical => Point::new(node.x + size.width / 2.0, node.y),
    }
}

/// Connector geometry for every edge whose endpoints are both present.
pub fn resolve_connectors(graph: &Graph, orientation: Orientation) -> Vec<Connector> {
    let nodes: HashMap<&str, &Node> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    graph
        .edges
        .iter()
        .filter_map(|edge| {
            let (Some(from), Some(to)) = (nodes.get(edge.from.as_str()), nodes.get(edge.to.as_str()))
            else {
                debug!(from = %edge.from, to = %edge.to, "Dropping connector with missing endpoint");
                return None;
            };
            let source = output_anchor(from, orientation);
            let target = input_anchor(to, orientation);
            let (control_1, control_2) = match orientation {
                Orientation::Horizontal => {
                    let bend = (target.x - source.x).abs() / 2.0;
                    (
                        Point::new(source.x + bend, source.y),
                        Point::new(target.x - bend, target.y),
                    )
                }
                Orientation::Vertical => {
                    let bend = (target.y - source.y).abs() / 2.0;
                    (
                        Point::new(source.x, source.y + bend),
                        Point::new(target.x, target.y - bend),
                    )
                }
            };
            Some(Connector {
                from: edge.from.clone(),
                to: edge.to.clone(),
                source,
                target,
                control_1,
                control_2,
            })
        })
        .collect()
}
