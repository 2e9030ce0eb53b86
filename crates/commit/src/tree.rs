//! Commit tree - the annotated mirror of a diff tree
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Children are
//! owned through the ordered `children` list; `parent` is a plain back
//! reference and never used to rebuild ownership.

use crate::diff::{DiffNode, Flags, action_tag, classify};
use crate::error::{Error, Result};
use crate::schema::{NodeKind, Schema};
use crate::types::{ActionTag, Change, CommitAction, Path};
use std::sync::Arc;

/// Index of a node in a [`CommitTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// One node of the commit tree
#[derive(Debug)]
pub struct CommitNode {
    pub name: String,
    pub schema: Arc<Schema>,
    /// Segments from the root; the root itself has an empty path
    pub path: Path,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: Flags,
    /// This node or a descendant changed
    pub subtree_changed: bool,
    /// Actions run in the deferred pass
    pub deferred: bool,
    /// Synthetic list-key node, kept out of change lists
    pub ignore: bool,
}

impl CommitNode {
    pub fn kind(&self) -> NodeKind {
        self.schema.kind
    }

    pub fn added(&self) -> bool {
        self.flags.added
    }

    pub fn deleted(&self) -> bool {
        self.flags.deleted
    }

    pub fn updated(&self) -> bool {
        self.flags.updated
    }

    /// Action recorded for this node, if it changed
    pub fn action(&self) -> Option<CommitAction> {
        classify(self.flags)
    }

    /// Action exported to this node's scripts
    pub fn action_tag(&self) -> ActionTag {
        action_tag(self.flags, self.kind())
    }

    /// `path` as shown in outputs, errors and logs
    ///
    /// Values of a secret leaf are masked, whether `path` is the value node
    /// itself or a value path run on behalf of the leaf.
    pub fn redact(&self, path: &Path) -> Path {
        if self.schema.secret && (self.kind() == NodeKind::LeafValue || *path != self.path) {
            path.redacted()
        } else {
            path.clone()
        }
    }

    fn change(&self, action: CommitAction) -> Change {
        Change {
            path: self.path.clone(),
            redacted: self.redact(&self.path),
            action,
        }
    }
}

/// Which diff nodes to leave out of a commit tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Prune unchanged subtrees down to the minimal changed tree
    pub skip_unchanged: bool,
    /// Leave out deleted nodes, giving the post-commit view
    pub skip_deleted: bool,
}

impl BuildOptions {
    /// Options used for commit and change detection
    pub fn commit() -> Self {
        Self {
            skip_unchanged: true,
            skip_deleted: false,
        }
    }

    /// Options used for validation
    pub fn validate() -> Self {
        Self {
            skip_unchanged: false,
            skip_deleted: true,
        }
    }
}

/// Annotated tree built from a diff
#[derive(Debug, Default)]
pub struct CommitTree {
    nodes: Vec<CommitNode>,
    root: Option<NodeId>,
}

impl CommitTree {
    /// Build a commit tree from a diff root
    ///
    /// Returns an empty tree when everything was pruned. Fails with
    /// [`Error::MissingSchema`] if any visited diff node has no schema.
    pub fn build(diff: &dyn DiffNode, opts: BuildOptions) -> Result<Self> {
        let mut tree = Self::default();
        let root = Builder {
            tree: &mut tree,
            opts,
        }
        .build(diff, None, false, None)?;
        tree.root = root;
        Ok(tree)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn node(&self, id: NodeId) -> &CommitNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Nodes reachable from `id`, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Remove a node from its parent's child list
    ///
    /// The node keeps its parent link and path; it simply stops being walked
    /// from the parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Mark a node changed, along with every ancestor
    pub fn mark_changed(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &mut self.nodes[current.0];
            if node.subtree_changed && current != id {
                break;
            }
            node.subtree_changed = true;
            cursor = node.parent;
        }
    }

    /// Deleted nodes under `id`, children before parents
    pub fn delete_list(&self, id: NodeId) -> Vec<Change> {
        let mut out = Vec::new();
        self.collect_deletes(id, &mut out);
        out
    }

    fn collect_deletes(&self, id: NodeId, out: &mut Vec<Change>) {
        let node = self.node(id);
        if !node.subtree_changed {
            return;
        }
        for child in &node.children {
            self.collect_deletes(*child, out);
        }
        if node.ignore || node.path.is_empty() {
            return;
        }
        if node.action() == Some(CommitAction::Deleted) {
            out.push(node.change(CommitAction::Deleted));
        }
    }

    /// Created and updated nodes under `id`, parents before children
    pub fn create_list(&self, id: NodeId) -> Vec<Change> {
        let mut out = Vec::new();
        self.collect_creates(id, &mut out);
        out
    }

    fn collect_creates(&self, id: NodeId, out: &mut Vec<Change>) {
        let node = self.node(id);
        if !node.subtree_changed {
            return;
        }
        if !node.ignore && !node.path.is_empty() {
            match node.action() {
                Some(action @ (CommitAction::Created | CommitAction::Updated)) => {
                    out.push(node.change(action));
                }
                _ => {}
            }
        }
        for child in &node.children {
            self.collect_creates(*child, out);
        }
    }
}

struct Builder<'t> {
    tree: &'t mut CommitTree,
    opts: BuildOptions,
}

impl Builder<'_> {
    fn build(
        &mut self,
        diff: &dyn DiffNode,
        parent: Option<NodeId>,
        ignore: bool,
        key: Option<&dyn DiffNode>,
    ) -> Result<Option<NodeId>> {
        let path = match parent {
            Some(p) => self.tree.node(p).path.child(diff.name()),
            None => Path::new(),
        };
        let Some(schema) = diff.schema() else {
            return Err(Error::MissingSchema { path });
        };
        if self.opts.skip_deleted && diff.deleted() {
            return Ok(None);
        }

        let inherited = parent
            .map(|p| self.tree.node(p))
            .is_some_and(|p| p.kind() != NodeKind::List && p.deferred);
        let flags = Flags::of(diff);
        let id = NodeId(self.tree.nodes.len());
        self.tree.nodes.push(CommitNode {
            name: diff.name().to_string(),
            schema: Arc::clone(schema),
            path,
            parent,
            children: Vec::new(),
            flags,
            subtree_changed: false,
            deferred: inherited || schema.deferred,
            ignore,
        });

        if let Some(key) = key {
            self.attach(id, key, true, None)?;
        }
        let is_list = schema.kind == NodeKind::List;
        for child in diff.children() {
            if is_list {
                let key = KeyLeaf::for_entry(child);
                self.attach(id, child, ignore, key.as_ref().map(|k| k as &dyn DiffNode))?;
            } else {
                self.attach(id, child, ignore, None)?;
            }
        }

        if flags.changed() {
            self.tree.mark_changed(id);
        } else if self.opts.skip_unchanged && self.tree.node(id).children.is_empty() {
            // Every descendant was pruned already, so this node is the
            // last one in the arena.
            self.tree.nodes.truncate(id.0);
            return Ok(None);
        }
        Ok(Some(id))
    }

    fn attach(
        &mut self,
        parent: NodeId,
        diff: &dyn DiffNode,
        ignore: bool,
        key: Option<&dyn DiffNode>,
    ) -> Result<()> {
        if let Some(child) = self.build(diff, Some(parent), ignore, key)? {
            self.tree.nodes[parent.0].children.push(child);
        }
        Ok(())
    }
}

/// Key leaf synthesized under a list entry
///
/// Legacy per-key scripts hang off the key leaf, so every entry gets one
/// whose single value is the entry name, changing together with the entry.
struct KeyLeaf<'a> {
    entry: &'a dyn DiffNode,
    schema: &'a Arc<Schema>,
    value: KeyValue<'a>,
}

struct KeyValue<'a> {
    entry: &'a dyn DiffNode,
    schema: Option<&'a Arc<Schema>>,
}

impl<'a> KeyLeaf<'a> {
    fn for_entry(entry: &'a dyn DiffNode) -> Option<Self> {
        let entry_schema = entry.schema()?;
        let key = entry_schema.key.as_deref()?;
        if entry.children().iter().any(|c| c.name() == key) {
            return None;
        }
        let schema = entry_schema.child(key)?;
        Some(Self {
            entry,
            schema,
            value: KeyValue {
                entry,
                schema: schema.child(entry.name()),
            },
        })
    }
}

impl DiffNode for KeyLeaf<'_> {
    fn name(&self) -> &str {
        &self.schema.name
    }

    fn schema(&self) -> Option<&Arc<Schema>> {
        Some(self.schema)
    }

    fn added(&self) -> bool {
        self.entry.added()
    }

    fn deleted(&self) -> bool {
        self.entry.deleted()
    }

    fn updated(&self) -> bool {
        false
    }

    fn is_default(&self) -> bool {
        false
    }

    fn children(&self) -> Vec<&dyn DiffNode> {
        vec![&self.value]
    }
}

impl DiffNode for KeyValue<'_> {
    fn name(&self) -> &str {
        self.entry.name()
    }

    fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema
    }

    fn added(&self) -> bool {
        self.entry.added()
    }

    fn deleted(&self) -> bool {
        self.entry.deleted()
    }

    fn updated(&self) -> bool {
        false
    }

    fn is_default(&self) -> bool {
        false
    }

    fn children(&self) -> Vec<&dyn DiffNode> {
        Vec::new()
    }
}
