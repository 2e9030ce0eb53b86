//! Priority tree - groups of the commit tree that are scheduled as a unit
//!
//! Every node with a declared priority becomes the root of its own group and
//! is cut out of its parent's child list, so each commit node is executed by
//! exactly one group.

use crate::tree::{CommitTree, NodeId};

/// Index of a node in a [`PriorityTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrioId(usize);

/// A priority group
#[derive(Debug)]
pub struct PriorityNode {
    /// Effective priority, 0 only for the root group
    ///
    /// Wider than the declared `u32` so a fix-up below a `u32::MAX` group
    /// still exceeds it.
    pub priority: u64,
    /// Commit subtree executed by this group
    pub root: NodeId,
    pub parent: Option<PrioId>,
    pub children: Vec<PrioId>,
}

/// Tree of priority groups
#[derive(Debug)]
pub struct PriorityTree {
    nodes: Vec<PriorityNode>,
}

impl PriorityTree {
    /// Split a commit tree into priority groups
    ///
    /// A priority that does not exceed the enclosing group's is raised to one
    /// above it. Lists and leaf values never start a group.
    pub fn build(tree: &mut CommitTree, root: NodeId) -> Self {
        let mut prio = Self {
            nodes: vec![PriorityNode {
                priority: 0,
                root,
                parent: None,
                children: Vec::new(),
            }],
        };
        prio.walk(tree, root, PrioId(0));
        prio
    }

    fn walk(&mut self, tree: &mut CommitTree, id: NodeId, cursor: PrioId) {
        // Detaching below mutates this child list, so walk a copy.
        let children = tree.children(id).to_vec();
        for child in children {
            let node = tree.node(child);
            let declared = u64::from(node.schema.priority);
            if declared == 0 || node.kind().is_priority_exempt() {
                self.walk(tree, child, cursor);
                continue;
            }

            let floor = self.node(cursor).priority;
            let priority = if declared <= floor {
                log::warn!(
                    "priority {declared} of '{}' does not exceed enclosing {floor}, using {}",
                    node.path,
                    floor + 1
                );
                floor + 1
            } else {
                declared
            };

            let group = self.add(cursor, priority, child);
            tree.detach(child);
            self.walk(tree, child, group);
        }
    }

    fn add(&mut self, parent: PrioId, priority: u64, root: NodeId) -> PrioId {
        let id = PrioId(self.nodes.len());
        self.nodes.push(PriorityNode {
            priority,
            root,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> PrioId {
        PrioId(0)
    }

    pub fn node(&self, id: PrioId) -> &PriorityNode {
        &self.nodes[id.0]
    }

    /// All groups, root first
    pub fn ids(&self) -> impl Iterator<Item = PrioId> {
        (0..self.nodes.len()).map(PrioId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Node, Status};
    use crate::schema::{NodeKind, Schema};
    use crate::testing::attach;
    use crate::tree::BuildOptions;
    use crate::types::Path;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Schema::new("root", NodeKind::Tree)
            .with_child(
                Schema::new("interfaces", NodeKind::Container)
                    .with_priority(300)
                    .with_child(
                        Schema::new("ethernet", NodeKind::List).with_priority(310).with_child(
                            Schema::new("ethernet", NodeKind::ListEntry)
                                .with_priority(310)
                                .with_child(
                                    Schema::new("firewall", NodeKind::Container)
                                        .with_priority(200),
                                )
                                .with_child(Schema::new("mtu", NodeKind::Leaf).with_priority(5)),
                        ),
                    ),
            )
            .with_child(
                Schema::new("system", NodeKind::Container)
                    .with_child(Schema::new("ntp", NodeKind::Container).with_priority(400)),
            )
            .into_shared()
    }

    fn diff() -> Node {
        Node::new("root", Status::Updated)
            .with_child(
                Node::new("interfaces", Status::Added).with_child(
                    Node::new("ethernet", Status::Added).with_children([
                        Node::new("dp0s3", Status::Added)
                            .with_child(Node::new("firewall", Status::Added))
                            .with_child(
                                Node::new("mtu", Status::Added)
                                    .with_child(Node::new("9000", Status::Added)),
                            ),
                        Node::new("dp0s4", Status::Added),
                    ]),
                ),
            )
            .with_child(
                Node::new("system", Status::Updated)
                    .with_child(Node::new("ntp", Status::Added)),
            )
    }

    fn build() -> (CommitTree, PriorityTree) {
        let diff = attach(diff(), &schema());
        let mut tree = CommitTree::build(&diff, BuildOptions::commit()).unwrap();
        let root = tree.root().unwrap();
        let prio = PriorityTree::build(&mut tree, root);
        (tree, prio)
    }

    fn group_path(tree: &CommitTree, prio: &PriorityTree, id: PrioId) -> Path {
        tree.node(prio.node(id).root).path.clone()
    }

    #[test]
    fn priorities_increase_along_every_path() {
        let (_, prio) = build();
        for id in prio.ids() {
            let node = prio.node(id);
            if let Some(parent) = node.parent {
                assert!(node.priority > prio.node(parent).priority);
            }
        }
    }

    #[test]
    fn inverted_priority_is_raised() {
        let (tree, prio) = build();
        let target = Path::from("interfaces ethernet dp0s3 firewall");
        let firewall = prio.ids().find(|id| group_path(&tree, &prio, *id) == target).unwrap();
        assert_eq!(prio.node(firewall).priority, 311);
    }

    #[test]
    fn child_of_maximum_priority_group_still_runs_after_it() {
        let schema = Schema::new("root", NodeKind::Tree)
            .with_child(
                Schema::new("a", NodeKind::Container)
                    .with_priority(u32::MAX)
                    .with_child(Schema::new("b", NodeKind::Container).with_priority(1)),
            )
            .into_shared();
        let diff = attach(
            Node::new("root", Status::Updated).with_child(
                Node::new("a", Status::Added).with_child(Node::new("b", Status::Added)),
            ),
            &schema,
        );
        let mut tree = CommitTree::build(&diff, BuildOptions::commit()).unwrap();
        let root = tree.root().unwrap();
        let prio = PriorityTree::build(&mut tree, root);

        let a = prio.node(prio.root()).children[0];
        let b = prio.node(a).children[0];
        assert_eq!(prio.node(a).priority, u64::from(u32::MAX));
        assert_eq!(prio.node(b).priority, u64::from(u32::MAX) + 1);
        assert_eq!(group_path(&tree, &prio, b), Path::from("a b"));
    }

    #[test]
    fn lists_and_values_never_start_groups() {
        let (tree, prio) = build();
        let mut groups: Vec<(u64, String)> = prio
            .ids()
            .map(|id| (prio.node(id).priority, group_path(&tree, &prio, id).to_string()))
            .collect();
        groups.sort();
        assert_eq!(
            groups,
            [
                (0, String::new()),
                (300, "interfaces".to_string()),
                (310, "interfaces ethernet dp0s3".to_string()),
                (310, "interfaces ethernet dp0s4".to_string()),
                (311, "interfaces ethernet dp0s3 firewall".to_string()),
                (311, "interfaces ethernet dp0s3 mtu".to_string()),
                (400, "system ntp".to_string()),
            ]
        );
    }

    #[test]
    fn group_roots_are_detached_from_parents() {
        let (tree, prio) = build();
        let interfaces = prio.node(prio.root()).children[0];
        let interfaces = prio.node(interfaces).root;
        let list = tree.children(interfaces)[0];
        assert_eq!(tree.node(list).name, "ethernet");
        assert!(tree.children(list).is_empty());

        let system = tree
            .children(tree.root().unwrap())
            .iter()
            .find(|id| tree.node(**id).name == "system")
            .copied()
            .unwrap();
        assert!(tree.children(system).is_empty());
    }
}
