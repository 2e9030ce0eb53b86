//! Diff tree interface and change classification
//!
//! The diff itself is computed elsewhere. The engine only walks a tree of
//! nodes that already know whether they were added, deleted or updated
//! between the running and candidate configurations.

use crate::schema::{NodeKind, Schema};
use crate::types::{ActionTag, CommitAction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A node of the diff between running and candidate configuration
pub trait DiffNode: Send + Sync {
    fn name(&self) -> &str;

    /// Schema of this node, `None` only if diff and schema disagree
    fn schema(&self) -> Option<&Arc<Schema>>;

    /// Present in candidate but not in running
    fn added(&self) -> bool;

    /// Present in running but not in candidate
    fn deleted(&self) -> bool;

    /// Present in both but changed
    fn updated(&self) -> bool;

    /// Value comes from a schema default rather than user configuration
    fn is_default(&self) -> bool;

    fn children(&self) -> Vec<&dyn DiffNode>;

    /// Any of added, deleted or updated
    fn changed(&self) -> bool {
        self.added() || self.deleted() || self.updated()
    }
}

/// Change flags of a single node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub added: bool,
    pub deleted: bool,
    pub updated: bool,
    pub default: bool,
}

impl Flags {
    pub fn of(node: &dyn DiffNode) -> Self {
        Self {
            added: node.added(),
            deleted: node.deleted(),
            updated: node.updated(),
            default: node.is_default(),
        }
    }

    pub fn changed(self) -> bool {
        self.added || self.deleted || self.updated
    }
}

/// Map change flags to the action recorded for audit and replay
///
/// A deleted node that falls back to its schema default is still configured
/// afterwards, so it counts as updated.
pub fn classify(flags: Flags) -> Option<CommitAction> {
    match flags {
        Flags { deleted: true, default: true, .. } => Some(CommitAction::Updated),
        Flags { deleted: true, .. } => Some(CommitAction::Deleted),
        Flags { added: true, .. } => Some(CommitAction::Created),
        Flags { updated: true, .. } => Some(CommitAction::Updated),
        _ => None,
    }
}

/// Coarse action exported to scripts
pub fn action_tag(flags: Flags, kind: NodeKind) -> ActionTag {
    if flags.deleted {
        ActionTag::Delete
    } else if flags.added || (flags.updated && kind.is_leaf_type()) {
        ActionTag::Set
    } else {
        ActionTag::Active
    }
}

/// Change status of an owned diff node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unchanged,
    Added,
    Deleted,
    Updated,
}

/// An owned, pre-annotated diff node
///
/// Used when the diff arrives as data (fixtures, serialized diffs) rather
/// than from a live diff provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(skip)]
    pub schema: Option<Arc<Schema>>,
}

impl Node {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Resolve schema references by walking the schema tree alongside
    ///
    /// Children without a matching schema are left unresolved.
    pub fn attach_schema(&mut self, schema: &Arc<Schema>) {
        self.schema = Some(Arc::clone(schema));
        for child in &mut self.children {
            if let Some(child_schema) = schema.child(&child.name) {
                child.attach_schema(child_schema);
            }
        }
    }
}

impl DiffNode for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    fn added(&self) -> bool {
        self.status == Status::Added
    }

    fn deleted(&self) -> bool {
        self.status == Status::Deleted
    }

    fn updated(&self) -> bool {
        self.status == Status::Updated
    }

    fn is_default(&self) -> bool {
        self.default
    }

    fn children(&self) -> Vec<&dyn DiffNode> {
        self.children.iter().map(|c| c as &dyn DiffNode).collect()
    }
}
