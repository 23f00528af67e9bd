//! Interactive canvas session: viewport transform and the pointer gesture
//! state machine. Inputs are abstract pointer/wheel events so the logic
//! runs without a real input device.

use serde::Serialize;

use hireflow_core::config::ZoomConfig;
use hireflow_core::types::{NodeId, NodeKind, Orientation, Point};

use crate::geometry::output_anchor;
use crate::graph::Graph;

/// Scroll offset and zoom factor of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Convert a screen position into canvas units.
    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x + self.scroll_x) / self.zoom,
            (screen.y + self.scroll_y) / self.zoom,
        )
    }

    /// Wheel handling: ctrl zooms, shift pans horizontally, plain wheel scrolls.
    pub fn apply_wheel(&mut self, wheel: WheelInput, zoom: &ZoomConfig) {
        if wheel.ctrl {
            self.set_zoom(self.zoom - wheel.delta_y * zoom.wheel_sensitivity, zoom);
        } else if wheel.shift {
            self.scroll_x += wheel.delta_y;
        } else {
            self.scroll_x += wheel.delta_x;
            self.scroll_y += wheel.delta_y;
        }
    }

    pub fn zoom_in(&mut self, zoom: &ZoomConfig) {
        self.set_zoom(self.zoom + zoom.step, zoom);
    }

    pub fn zoom_out(&mut self, zoom: &ZoomConfig) {
        self.set_zoom(self.zoom - zoom.step, zoom);
    }

    pub fn reset_zoom(&mut self, zoom: &ZoomConfig) {
        self.set_zoom(1.0, zoom);
    }

    /// Wheel and toolbar share one clamp range.
    fn set_zoom(&mut self, value: f64, zoom: &ZoomConfig) {
        self.zoom = value.clamp(zoom.min, zoom.max);
    }
}

/// One wheel notch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub ctrl: bool,
    pub shift: bool,
}

/// What sits under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Canvas,
    Node(NodeId),
    /// The connector handle on a node's output side.
    OutputHandle(NodeId),
}

/// Abstract pointer input in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down { at: Point, target: HitTarget },
    Move { at: Point },
    Up { at: Point, target: HitTarget },
}

/// Current gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Panning { origin: Point, scroll_origin: (f64, f64) },
    Connecting { source: NodeId, pointer: Point },
}

/// What the caller should do in response to a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    None,
    ViewportChanged(Viewport),
    /// Rubber-band line from the source's output anchor to the pointer, canvas units.
    RubberBand { from: Point, to: Point },
    /// A connection gesture ended on a valid target.
    Connect { from: NodeId, to: NodeId },
    ConnectCancelled,
}

/// Pointer gesture state machine: `Idle`, `Panning`, `Connecting`.
#[derive(Debug, Clone)]
pub struct GestureMachine {
    state: Gesture,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self {
            state: Gesture::Idle,
        }
    }

    pub fn state(&self) -> &Gesture {
        &self.state
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        viewport: &mut Viewport,
        graph: &Graph,
        orientation: Orientation,
    ) -> GestureOutcome {
        let state = std::mem::replace(&mut self.state, Gesture::Idle);
        match (state, event) {
            (Gesture::Idle, PointerEvent::Down { at, target }) => match target {
                HitTarget::Canvas => {
                    self.state = Gesture::Panning {
                        origin: at,
                        scroll_origin: (viewport.scroll_x, viewport.scroll_y),
                    };
                    GestureOutcome::None
                }
                HitTarget::OutputHandle(source) => match graph.node(&source) {
                    Some(node) => {
                        let from = output_anchor(node, orientation);
                        self.state = Gesture::Connecting {
                            source,
                            pointer: viewport.to_canvas(at),
                        };
                        GestureOutcome::RubberBand { from, to: from }
                    }
                    None => GestureOutcome::None,
                },
                HitTarget::Node(_) => GestureOutcome::None,
            },

            (Gesture::Panning { origin, scroll_origin }, PointerEvent::Move { at }) => {
                viewport.scroll_x = scroll_origin.0 - (at.x - origin.x);
                viewport.scroll_y = scroll_origin.1 - (at.y - origin.y);
                self.state = Gesture::Panning {
                    origin,
                    scroll_origin,
                };
                GestureOutcome::ViewportChanged(*viewport)
            }
            (Gesture::Panning { .. }, PointerEvent::Up { .. }) => GestureOutcome::None,

            (Gesture::Connecting { source, .. }, PointerEvent::Move { at }) => {
                let Some(node) = graph.node(&source) else {
                    return GestureOutcome::ConnectCancelled;
                };
                let from = output_anchor(node, orientation);
                let to = viewport.to_canvas(at);
                self.state = Gesture::Connecting {
                    source,
                    pointer: to,
                };
                GestureOutcome::RubberBand { from, to }
            }
            (Gesture::Connecting { source, .. }, PointerEvent::Up { target, .. }) => match target {
                HitTarget::Node(to) | HitTarget::OutputHandle(to)
                    if can_connect(graph, &source, &to, orientation) =>
                {
                    GestureOutcome::Connect { from: source, to }
                }
                _ => GestureOutcome::ConnectCancelled,
            },

            // A stray down while a gesture is active, or move/up while idle.
            (state, _) => {
                self.state = state;
                GestureOutcome::None
            }
        }
    }

    /// Abandon whatever gesture is in progress.
    pub fn cancel(&mut self) -> GestureOutcome {
        let was_connecting = matches!(self.state, Gesture::Connecting { .. });
        self.state = Gesture::Idle;
        if was_connecting {
            GestureOutcome::ConnectCancelled
        } else {
            GestureOutcome::None
        }
    }
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a drag from `source` may end on `target`.
///
/// Rejects self-loops, start and criteria targets, and any target not
/// strictly after the source along the flow axis. The positional check is
/// a heuristic against backward edges, not a cycle check.
pub fn can_connect(graph: &Graph, source: &str, target: &str, orientation: Orientation) -> bool {
    if source == target {
        return false;
    }
    let (Some(from), Some(to)) = (graph.node(source), graph.node(target)) else {
        return false;
    };
    if matches!(to.kind, NodeKind::Start | NodeKind::Criteria) {
        return false;
    }
    match orientation {
        Orientation::Horizontal => to.x > from.x,
        Orientation::Vertical => to.y > from.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireflow_core::types::Node;

    fn zoom() -> ZoomConfig {
        ZoomConfig::default()
    }

    fn graph() -> Graph {
        Graph::new(
            vec![
                Node::new("s", NodeKind::Start, "Start").at(0.0, 0.0),
                Node::new("a", NodeKind::Screening, "A").at(100.0, 0.0),
                Node::new("b", NodeKind::Interview, "B").at(50.0, 300.0),
                Node::new("c", NodeKind::Criteria, "C").at(400.0, 400.0),
            ],
            vec![],
        )
    }

    #[test]
    fn test_connection_validity_is_positional() {
        let g = graph();
        assert!(!can_connect(&g, "a", "b", Orientation::Horizontal));
        assert!(can_connect(&g, "b", "a", Orientation::Horizontal));
        // vertical flips the primary axis
        assert!(can_connect(&g, "a", "b", Orientation::Vertical));
        assert!(!can_connect(&g, "b", "a", Orientation::Vertical));
    }

    #[test]
    fn test_connection_rejects_start_criteria_and_self() {
        let g = graph();
        assert!(!can_connect(&g, "a", "s", Orientation::Horizontal));
        assert!(!can_connect(&g, "a", "c", Orientation::Horizontal));
        assert!(!can_connect(&g, "a", "a", Orientation::Horizontal));
        assert!(!can_connect(&g, "a", "ghost", Orientation::Horizontal));
    }

    #[test]
    fn test_same_column_siblings_are_rejected() {
        let mut g = graph();
        g.node_mut("b").unwrap().x = 100.0;
        assert!(!can_connect(&g, "a", "b", Orientation::Horizontal));
        assert!(!can_connect(&g, "b", "a", Orientation::Horizontal));
    }

    #[test]
    fn test_ctrl_wheel_zoom_is_clamped() {
        let mut vp = Viewport::default();
        let z = zoom();
        vp.apply_wheel(WheelInput { delta_y: -500.0, ctrl: true, ..WheelInput::default() }, &z);
        assert!((vp.zoom - 1.5).abs() < 1e-9);
        vp.apply_wheel(WheelInput { delta_y: -10_000.0, ctrl: true, ..WheelInput::default() }, &z);
        assert_eq!(vp.zoom, 3.0);
        vp.apply_wheel(WheelInput { delta_y: 10_000.0, ctrl: true, ..WheelInput::default() }, &z);
        assert_eq!(vp.zoom, 0.1);
        assert_eq!((vp.scroll_x, vp.scroll_y), (0.0, 0.0));
    }

    #[test]
    fn test_shift_wheel_pans_horizontally() {
        let mut vp = Viewport::default();
        vp.apply_wheel(WheelInput { delta_y: 40.0, shift: true, ..WheelInput::default() }, &zoom());
        assert_eq!((vp.scroll_x, vp.scroll_y, vp.zoom), (40.0, 0.0, 1.0));

        vp.apply_wheel(WheelInput { delta_x: 5.0, delta_y: 10.0, ..WheelInput::default() }, &zoom());
        assert_eq!((vp.scroll_x, vp.scroll_y), (45.0, 10.0));
    }

    #[test]
    fn test_toolbar_uses_same_range() {
        let mut vp = Viewport::default();
        let z = zoom();
        for _ in 0..100 {
            vp.zoom_in(&z);
        }
        assert_eq!(vp.zoom, z.max);
        for _ in 0..100 {
            vp.zoom_out(&z);
        }
        assert_eq!(vp.zoom, z.min);
        vp.reset_zoom(&z);
        assert_eq!(vp.zoom, 1.0);
    }

    #[test]
    fn test_panning_moves_scroll_offset() {
        let g = graph();
        let mut vp = Viewport::default();
        let mut m = GestureMachine::new();

        m.handle(
            PointerEvent::Down { at: Point::new(10.0, 10.0), target: HitTarget::Canvas },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        assert!(matches!(m.state(), Gesture::Panning { .. }));

        let out = m.handle(
            PointerEvent::Move { at: Point::new(40.0, 0.0) },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        assert_eq!((vp.scroll_x, vp.scroll_y), (-30.0, 10.0));
        assert_eq!(out, GestureOutcome::ViewportChanged(vp));

        m.handle(
            PointerEvent::Up { at: Point::new(40.0, 0.0), target: HitTarget::Canvas },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        assert_eq!(m.state(), &Gesture::Idle);
    }

    #[test]
    fn test_connect_gesture_to_valid_target() {
        let g = graph();
        let mut vp = Viewport::default();
        let mut m = GestureMachine::new();

        let out = m.handle(
            PointerEvent::Down { at: Point::new(330.0, 380.0), target: HitTarget::OutputHandle("b".into()) },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        // b is 280x160 at (50, 300): right-center anchor
        assert_eq!(
            out,
            GestureOutcome::RubberBand { from: Point::new(330.0, 380.0), to: Point::new(330.0, 380.0) }
        );

        let out = m.handle(
            PointerEvent::Move { at: Point::new(200.0, 50.0) },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        assert_eq!(
            out,
            GestureOutcome::RubberBand { from: Point::new(330.0, 380.0), to: Point::new(200.0, 50.0) }
        );

        let out = m.handle(
            PointerEvent::Up { at: Point::new(200.0, 50.0), target: HitTarget::Node("a".into()) },
            &mut vp,
            &g,
            Orientation::Horizontal,
        );
        assert_eq!(out, GestureOutcome::Connect { from: "b".into(), to: "a".into() });
        assert_eq!(m.state(), &Gesture::Idle);
    }

    #[test]
    fn test_connect_gesture_cancelled() {
        let g = graph();
        let mut vp = Viewport::default();
        let mut m = GestureMachine::new();

        for target in [HitTarget::Canvas, HitTarget::Node("s".into()), HitTarget::Node("c".into())] {
            m.handle(
                PointerEvent::Down { at: Point::default(), target: HitTarget::OutputHandle("a".into()) },
                &mut vp,
                &g,
                Orientation::Horizontal,
            );
            let out = m.handle(
                PointerEvent::Up { at: Point::default(), target },
                &mut vp,
                &g,
                Orientation::Horizontal,
            );
            assert_eq!(out, GestureOutcome::ConnectCancelled);
            assert_eq!(m.state(), &Gesture::Idle);
        }
    }

    #[test]
    fn test_pointer_respects_zoom_and_scroll() {
        let vp = Viewport { scroll_x: 100.0, scroll_y: 0.0, zoom: 2.0 };
        assert_eq!(vp.to_canvas(Point::new(100.0, 50.0)), Point::new(100.0, 25.0));
    }

    #[test]
    fn test_idle_ignores_move_and_node_press() {
        let g = graph();
        let mut vp = Viewport::default();
        let mut m = GestureMachine::new();
        assert_eq!(
            m.handle(PointerEvent::Move { at: Point::default() }, &mut vp, &g, Orientation::Horizontal),
            GestureOutcome::None
        );
        assert_eq!(
            m.handle(
                PointerEvent::Down { at: Point::default(), target: HitTarget::Node("a".into()) },
                &mut vp,
                &g,
                Orientation::Horizontal
            ),
            GestureOutcome::None
        );
        assert_eq!(m.state(), &Gesture::Idle);
        assert_eq!(m.cancel(), GestureOutcome::None);
    }
}
