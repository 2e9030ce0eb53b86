//! Schema constraint checks run after validate scripts

use commit::{CommitTree, NodeKind, StructuralValidator, Violation};

/// Reports mandatory children missing from present containers
#[derive(Debug, Default)]
pub struct MandatoryValidator;

impl StructuralValidator for MandatoryValidator {
    fn validate(&self, tree: &CommitTree) -> Vec<Violation> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        for id in tree.descendants(root) {
            let node = tree.node(id);
            if !node.kind().is_container_like() {
                continue;
            }
            for required in node.schema.children.iter().filter(|c| c.mandatory) {
                let present = tree
                    .children(id)
                    .iter()
                    .any(|c| tree.node(*c).name == required.name);
                if !present {
                    violations.push(Violation {
                        path: node.path.child(required.name.clone()),
                        message: format!("{} is mandatory", describe(required.kind)),
                    });
                }
            }
        }
        violations
    }
}

fn describe(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Leaf | NodeKind::LeafList | NodeKind::LeafValue => "value",
        NodeKind::List => "at least one entry",
        _ => "node",
    }
}
