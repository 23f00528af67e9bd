use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a node within one workflow graph.
pub type NodeId = String;

/// Campaign (job) the workflow belongs to.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User taking part in an editing session.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Width and height of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point in canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The kind of step a node represents.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Start,
    Criteria,
    Announcement,
    Screening,
    Interview,
    Survey,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Start,
        NodeKind::Criteria,
        NodeKind::Announcement,
        NodeKind::Screening,
        NodeKind::Interview,
        NodeKind::Survey,
    ];

    /// Candidate-facing stages.
    pub const ROUNDS: [NodeKind; 4] = [
        NodeKind::Announcement,
        NodeKind::Screening,
        NodeKind::Interview,
        NodeKind::Survey,
    ];

    /// Footprint used by layout and connector geometry.
    pub fn footprint(self) -> Size {
        match self {
            NodeKind::Start => Size::new(200.0, 64.0),
            NodeKind::Criteria => Size::new(40.0, 40.0),
            NodeKind::Announcement
            | NodeKind::Screening
            | NodeKind::Interview
            | NodeKind::Survey => Size::new(280.0, 160.0),
        }
    }

    pub fn is_round(self) -> bool {
        match self {
            NodeKind::Start | NodeKind::Criteria => false,
            NodeKind::Announcement
            | NodeKind::Screening
            | NodeKind::Interview
            | NodeKind::Survey => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::Criteria => "Criteria",
            NodeKind::Announcement => "Announcement",
            NodeKind::Screening => "Screening",
            NodeKind::Interview => "Interview",
            NodeKind::Survey => "Survey",
        }
    }

    /// Icon key understood by the rendering layer.
    pub fn icon(self) -> &'static str {
        match self {
            NodeKind::Start => "play",
            NodeKind::Criteria => "filter",
            NodeKind::Announcement => "megaphone",
            NodeKind::Screening => "clipboard-check",
            NodeKind::Interview => "users",
            NodeKind::Survey => "list-checks",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::Criteria => "Criteria",
            NodeKind::Announcement => "Job Announcement",
            NodeKind::Screening => "Screening Round",
            NodeKind::Interview => "Interview Round",
            NodeKind::Survey => "Candidate Survey",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Start => "START",
            NodeKind::Criteria => "CRITERIA",
            NodeKind::Announcement => "ANNOUNCEMENT",
            NodeKind::Screening => "SCREENING",
            NodeKind::Interview => "INTERVIEW",
            NodeKind::Survey => "SURVEY",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown node type: {}", s))
    }
}

/// Type-specific payload of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Round configuration (eligibility rules, automation schedule, questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    /// Automation flag of a criteria node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A step in the hiring workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, title: impl Into<String>) -> Self {
        let data = match kind {
            NodeKind::Criteria => NodeData {
                enabled: Some(false),
                ..NodeData::default()
            },
            _ => NodeData::default(),
        };
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            x: 0.0,
            y: 0.0,
            data,
        }
    }

    /// Create a node with a freshly generated id.
    pub fn with_id_generated(kind: NodeKind, title: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), kind, title)
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(&self) -> Size {
        self.kind.footprint()
    }

    pub fn center(&self) -> Point {
        let size = self.size();
        Point::new(self.x + size.width / 2.0, self.y + size.height / 2.0)
    }

    /// Whether a criteria node has automation turned on.
    pub fn is_automated(&self) -> bool {
        self.data.enabled.unwrap_or(false)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Flow direction of the canvas.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Left-to-right flow.
    #[default]
    #[serde(alias = "HORIZONTAL")]
    Horizontal,
    /// Top-to-bottom flow.
    #[serde(alias = "VERTICAL")]
    Vertical,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(Orientation::Horizontal),
            "vertical" | "v" => Ok(Orientation::Vertical),
            other => Err(format!("unknown orientation: {}", other)),
        }
    }
}

/// Workflow graph plus campaign metadata, as exchanged with the workflow service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(rename = "campaignID", default)]
    pub campaign_id: CampaignId,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_fit_preferences: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl WorkflowDocument {
    pub fn new(campaign_id: CampaignId, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            campaign_id,
            nodes,
            edges,
            ..Self::default()
        }
    }

    /// A document without nodes carries no usable graph.
    pub fn has_graph(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// Another user present on the same workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUser {
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl PresenceUser {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            name: name.into(),
            avatar: None,
            page: None,
            color: None,
        }
    }

    /// Apply the fields present in `patch`, leaving the rest untouched.
    pub fn merge(&mut self, patch: &PresencePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(avatar) = &patch.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(page) = &patch.page {
            self.page = Some(page.clone());
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
    }
}

/// Partial update to a present user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Events pushed by the presence channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum PresenceEvent {
    /// Full replacement of the active-user set.
    RoomSync { users: Vec<PresenceUser> },
    UserJoined { user: PresenceUser },
    UserLeft { user_id: UserId },
    /// Partial merge into an existing user.
    UserUpdated { user_id: UserId, patch: PresencePatch },
}
