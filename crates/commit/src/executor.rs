//! Action executor - runs lifecycle scripts over a commit subtree
//!
//! Within one node (or one leaf value) the scripts form an ordered sequence
//! and the first failure stops it. Across the tree failures are collected
//! and traversal continues with the next sibling.

use crate::context::{CommitContext, ScriptEnv};
use crate::error::Error;
use crate::schema::{NodeKind, Phase};
use crate::tree::{CommitNode, CommitTree, NodeId};
use crate::types::{ActionResult, ActionTag, Output, Path};

/// Scripts run for every added leaf value
const CREATE_SEQUENCE: &[Phase] = &[Phase::RegisterDefer, Phase::Begin, Phase::Create, Phase::End];

/// Scripts run for every deleted leaf value
const DELETE_SEQUENCE: &[Phase] = &[Phase::RegisterDefer, Phase::Begin, Phase::Delete, Phase::End];

/// Scripts run for every value removed from a leaf-list
const REMOVE_SEQUENCE: &[Phase] = &[Phase::Begin, Phase::Delete, Phase::End];

/// Scripts opening a begin/end scope
const OPEN_SEQUENCE: &[Phase] = &[Phase::RegisterDefer, Phase::Begin];

/// Run the scripts one node declares for a phase
///
/// Gated phases only run when the node's deferred flag matches the pass
/// being run. Stops at the first failing script.
pub(crate) fn run_phase(
    ctx: &CommitContext<'_>,
    node: &CommitNode,
    path: &Path,
    phase: Phase,
    action: ActionTag,
    deferred: bool,
) -> ActionResult {
    let mut result = ActionResult::default();
    let scripts = node.schema.scripts(phase);
    if scripts.is_empty() {
        return result;
    }
    let shown = node.redact(path);
    if phase.is_gated() && node.deferred != deferred {
        if ctx.debug {
            let pass = if node.deferred { "deferred" } else { "immediate" };
            log::debug!("[{shown}] {phase} skipped, runs in {pass} pass");
        }
        return result;
    }

    let env = ScriptEnv {
        session_id: &ctx.session_id,
        path,
        phase,
        action,
    };
    for script in scripts {
        match ctx.executor.run(&env, &shown, script) {
            Ok(text) => {
                if !text.is_empty() {
                    result.outputs.push(Output {
                        path: shown.clone(),
                        text,
                    });
                }
            }
            Err(e) => {
                result.errors.push(Error::Script {
                    path: shown.clone(),
                    phase,
                    message: format!("{e:#}"),
                });
                result.ok = false;
                break;
            }
        }
    }
    result
}

/// Runs update and delete actions for the nodes of one commit tree
pub struct ActionRunner<'a> {
    tree: &'a CommitTree,
    ctx: &'a CommitContext<'a>,
    deferred: bool,
}

impl<'a> ActionRunner<'a> {
    /// Runner for the pass selected by the context
    pub fn new(tree: &'a CommitTree, ctx: &'a CommitContext<'a>) -> Self {
        Self {
            tree,
            ctx,
            deferred: ctx.deferred,
        }
    }

    /// Runner for an explicit pass
    pub fn for_pass(tree: &'a CommitTree, ctx: &'a CommitContext<'a>, deferred: bool) -> Self {
        Self {
            tree,
            ctx,
            deferred,
        }
    }

    /// Apply a created or updated subtree
    pub fn update(&self, id: NodeId) -> ActionResult {
        let node = self.tree.node(id);
        if !node.subtree_changed {
            return ActionResult::default();
        }
        match node.kind() {
            NodeKind::Leaf => self.update_leaf(node),
            NodeKind::LeafList => self.update_leaf_list(node),
            NodeKind::List => self.update_list(node),
            NodeKind::LeafValue => ActionResult::default(),
            NodeKind::Container | NodeKind::Tree | NodeKind::ListEntry => {
                self.update_container(node, true)
            }
        }
    }

    /// Remove a deleted subtree
    pub fn delete(&self, id: NodeId) -> ActionResult {
        let node = self.tree.node(id);
        if !node.subtree_changed {
            return ActionResult::default();
        }
        match node.kind() {
            NodeKind::Leaf => self.delete_leaf(node),
            NodeKind::LeafList => self.delete_leaf_list(node),
            NodeKind::List => self.delete_list(node),
            NodeKind::LeafValue => ActionResult::default(),
            NodeKind::Container | NodeKind::Tree | NodeKind::ListEntry => {
                self.delete_container(node, true)
            }
        }
    }

    fn phase(
        &self,
        node: &CommitNode,
        path: &Path,
        phase: Phase,
        action: ActionTag,
    ) -> ActionResult {
        run_phase(self.ctx, node, path, phase, action, self.deferred)
    }

    fn sequence(
        &self,
        node: &CommitNode,
        path: &Path,
        action: ActionTag,
        phases: &[Phase],
    ) -> ActionResult {
        let mut result = ActionResult::default();
        for phase in phases {
            let step = self.phase(node, path, *phase, action);
            let failed = !step.ok;
            result.merge(step);
            if failed {
                break;
            }
        }
        result
    }

    /// Run a sequence once per value child selected by `wanted`
    fn per_value(
        &self,
        leaf: &CommitNode,
        phases: &[Phase],
        wanted: impl Fn(&CommitNode) -> bool,
    ) -> ActionResult {
        let mut result = ActionResult::default();
        for id in &leaf.children {
            let value = self.tree.node(*id);
            if wanted(value) {
                result.merge(self.sequence(leaf, &value.path, value.action_tag(), phases));
            }
        }
        result
    }

    fn update_leaf(&self, node: &CommitNode) -> ActionResult {
        if node.schema.presence {
            if node.added() {
                return self.sequence(node, &node.path, node.action_tag(), CREATE_SEQUENCE);
            }
            return ActionResult::default();
        }
        self.per_value(node, CREATE_SEQUENCE, CommitNode::added)
    }

    fn delete_leaf(&self, node: &CommitNode) -> ActionResult {
        if node.schema.presence {
            if node.deleted() {
                return self.sequence(node, &node.path, node.action_tag(), DELETE_SEQUENCE);
            }
            return ActionResult::default();
        }
        self.per_value(node, DELETE_SEQUENCE, CommitNode::deleted)
    }

    fn update_leaf_list(&self, node: &CommitNode) -> ActionResult {
        // Removed values go first so re-added values keep the user's order.
        let mut result = self.per_value(node, REMOVE_SEQUENCE, CommitNode::deleted);
        result.merge(self.per_value(node, CREATE_SEQUENCE, CommitNode::added));
        result
    }

    fn delete_leaf_list(&self, node: &CommitNode) -> ActionResult {
        self.per_value(node, REMOVE_SEQUENCE, CommitNode::deleted)
    }

    fn update_list(&self, node: &CommitNode) -> ActionResult {
        let mut result = ActionResult::default();
        for id in &node.children {
            let entry = self.tree.node(*id);
            if !entry.subtree_changed {
                continue;
            }
            if entry.deleted() {
                result.merge(self.delete_child(*id));
            } else {
                result.merge(self.update_child(*id));
            }
        }
        result
    }

    fn delete_list(&self, node: &CommitNode) -> ActionResult {
        let mut result = ActionResult::default();
        for id in &node.children {
            result.merge(self.delete_child(*id));
        }
        result
    }

    /// Update a child, inlining containers without their own begin/end
    fn update_child(&self, id: NodeId) -> ActionResult {
        let node = self.tree.node(id);
        if node.kind().is_container_like() && !node.schema.has_boundary() {
            if !node.subtree_changed {
                return ActionResult::default();
            }
            return self.update_container(node, false);
        }
        self.update(id)
    }

    /// Delete a child, inlining containers without their own begin/end
    fn delete_child(&self, id: NodeId) -> ActionResult {
        let node = self.tree.node(id);
        if node.kind().is_container_like() && !node.schema.has_boundary() {
            if !node.subtree_changed {
                return ActionResult::default();
            }
            return self.delete_container(node, false);
        }
        self.delete(id)
    }

    fn update_container(&self, node: &CommitNode, scoped: bool) -> ActionResult {
        let action = node.action_tag();
        let mut result = ActionResult::default();
        if scoped {
            let open = self.sequence(node, &node.path, action, OPEN_SEQUENCE);
            if !open.ok {
                return open;
            }
            result.merge(open);
        }

        let own = if node.added() { Phase::Create } else { Phase::Update };
        let step = self.phase(node, &node.path, own, action);
        let failed = !step.ok;
        result.merge(step);
        if failed {
            return result;
        }

        for id in &node.children {
            let child = self.tree.node(*id);
            if !child.subtree_changed {
                continue;
            }
            if child.deleted() {
                result.merge(self.delete_child(*id));
            } else {
                result.merge(self.update_child(*id));
            }
        }

        if scoped {
            result.merge(self.phase(node, &node.path, Phase::End, action));
        }
        result
    }

    fn delete_container(&self, node: &CommitNode, scoped: bool) -> ActionResult {
        let action = node.action_tag();
        let mut result = ActionResult::default();
        if scoped {
            let open = self.sequence(node, &node.path, action, OPEN_SEQUENCE);
            if !open.ok {
                return open;
            }
            result.merge(open);
        }

        for id in &node.children {
            if self.tree.node(*id).subtree_changed {
                result.merge(self.delete_child(*id));
            }
        }

        if node.deleted() {
            let step = self.phase(node, &node.path, Phase::Delete, action);
            let failed = !step.ok;
            result.merge(step);
            if failed {
                return result;
            }
        }

        if scoped {
            result.merge(self.phase(node, &node.path, Phase::End, action));
        }
        result
    }
}
