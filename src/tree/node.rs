//! Node records and the nested view produced for callers

use crate::audience::Audience;
use crate::error::TreeError;
use crate::types::{Depth, NodeId, SortOrder, TreeFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node kind
///
/// Navigation trees hold only `Entry` nodes. Asset trees hold `Folder` and `File` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Entry,
    Folder,
    File,
}

impl NodeKind {
    /// Whether nodes of this kind may have children
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Entry | NodeKind::Folder)
    }

    pub fn belongs_to(&self, family: TreeFamily) -> bool {
        match family {
            TreeFamily::Navigation => *self == NodeKind::Entry,
            TreeFamily::Assets => matches!(self, NodeKind::Folder | NodeKind::File),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Entry => "entry",
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
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
        match s {
            "entry" => Ok(NodeKind::Entry),
            "folder" => Ok(NodeKind::Folder),
            "file" => Ok(NodeKind::File),
            other => Err(format!(
                "Invalid node kind: {} (must be 'entry', 'folder', or 'file')",
                other
            )),
        }
    }
}

/// Node: a flat record with a parent reference, sibling position, and stored depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Kind-specific payload (URL for navigation, storage location for files)
    pub external_ref: Option<String>,
    pub description: Option<String>,
    pub kind: NodeKind,
    pub parent_id: Option<NodeId>,
    pub sort_order: SortOrder,
    /// Derived from the parent chain; persisted for fast filtering
    pub depth: Depth,
    pub is_active: bool,
    /// Minimum audience allowed to see this node in tree reads
    pub required_role: Option<Audience>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create an active node with no optional attributes set
    pub fn new(
        id: NodeId,
        label: impl Into<String>,
        kind: NodeKind,
        parent_id: Option<NodeId>,
        sort_order: SortOrder,
        depth: Depth,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            label: label.into(),
            external_ref: None,
            description: None,
            kind,
            parent_id,
            sort_order,
            depth,
            is_active: true,
            required_role: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Attributes supplied when creating a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub label: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_role: Option<Audience>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NodeAttributes {
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            external_ref: None,
            description: None,
            required_role: None,
            is_active: true,
        }
    }

    pub fn entry(label: impl Into<String>) -> Self {
        Self::new(label, NodeKind::Entry)
    }

    pub fn folder(label: impl Into<String>) -> Self {
        Self::new(label, NodeKind::Folder)
    }

    pub fn file(label: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(label, NodeKind::File).with_ref(location)
    }

    pub fn with_ref(mut self, external_ref: impl Into<String>) -> Self {
        self.external_ref = Some(external_ref.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_role(mut self, role: Audience) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Validate against the family the node is being created in
    pub fn validate(&self, family: TreeFamily) -> Result<(), TreeError> {
        validate_label(&self.label)?;
        if !self.kind.belongs_to(family) {
            return Err(TreeError::InvalidAttributes(format!(
                "{} nodes are not allowed in the {} tree",
                self.kind, family
            )));
        }
        Ok(())
    }
}

/// Partial edit of a node's non-structural attributes
///
/// `None` leaves a field unchanged; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub external_ref: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub required_role: Option<Option<Audience>>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.external_ref.is_none()
            && self.description.is_none()
            && self.required_role.is_none()
    }

    /// Apply onto a node, validating the new label if one is given
    pub fn apply_to(self, node: &mut Node) -> Result<(), TreeError> {
        if let Some(label) = self.label {
            validate_label(&label)?;
            node.label = label;
        }
        if let Some(external_ref) = self.external_ref {
            node.external_ref = external_ref;
        }
        if let Some(description) = self.description {
            node.description = description;
        }
        if let Some(required_role) = self.required_role {
            node.required_role = required_role;
        }
        node.touch();
        Ok(())
    }
}

fn validate_label(label: &str) -> Result<(), TreeError> {
    if label.trim().is_empty() {
        return Err(TreeError::InvalidAttributes(
            "Label cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// A node with its children attached, as handed to display layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Count this node and all nodes below it
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            total += 1;
            stack.extend(current.children.iter());
        }
        total
    }
}

impl Drop for TreeNode {
    // Unlink descendants onto a heap stack so deep chains drop without recursion.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}
