//! Headless workflow editor.
//!
//! The graph model, auto-layout, connector geometry, undo history and
//! validation are plain synchronous code over [`Graph`]. [`WorkflowEditor`]
//! ties them to a [`hireflow_core::traits::WorkflowStore`] and the canvas
//! gesture machine; [`PresenceSession`] follows who else has the workflow open.

pub mod editor;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod layout;
pub mod presence;
pub mod session;
pub mod validation;

pub use editor::{EditorSettings, SaveOutcome, WorkflowEditor};
pub use geometry::{input_anchor, output_anchor, resolve_connectors, Connector};
pub use graph::{default_template, Connection, Graph, NodeEdit};
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use layout::{calculate_auto_layout, relayout, Layout};
pub use presence::{PresenceRoster, PresenceSession};
pub use session::{
    can_connect, Gesture, GestureMachine, GestureOutcome, HitTarget, PointerEvent, Viewport,
    WheelInput,
};
pub use validation::{validate, validation_messages, ValidationIssue};
