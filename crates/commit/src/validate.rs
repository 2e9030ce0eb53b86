//! Parallel validation of a commit tree
//!
//! The calling thread walks the tree and spawns one job per validation
//! target onto a fixed-size rayon pool. Responses come back over a channel
//! in completion order and are put back into path order before returning.

use crate::context::CommitContext;
use crate::error::{Error, Result};
use crate::executor::run_phase;
use crate::schema::{NodeKind, Phase};
use crate::tree::{CommitNode, CommitTree, NodeId};
use crate::types::{ActionResult, ActionTag, Path, ValidateOutcome};
use std::collections::HashSet;
use std::sync::mpsc;

/// One node's validate scripts, bound to the path they run for
struct ValidateJob<'t> {
    seq: usize,
    node: &'t CommitNode,
    path: Path,
    action: ActionTag,
}

struct ValidateResponse {
    seq: usize,
    result: ActionResult,
}

impl ValidateJob<'_> {
    fn run(self, ctx: &CommitContext<'_>) -> ValidateResponse {
        let result = run_phase(
            ctx,
            self.node,
            &self.path,
            Phase::Validate,
            self.action,
            ctx.deferred,
        );
        ValidateResponse {
            seq: self.seq,
            result,
        }
    }
}

/// Run every validate script in the tree, then structural validation
pub fn validate_tree<'t>(tree: &'t CommitTree, ctx: &CommitContext<'_>) -> Result<ValidateOutcome> {
    let mut outcome = ValidateOutcome::default();
    let Some(root) = tree.root() else {
        return Ok(outcome);
    };

    let workers = ctx.worker_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("validate-{i}"))
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    let (tx, rx) = mpsc::channel();
    let mut jobs = 0;
    pool.in_place_scope(|scope| {
        let mut spawn = |node: &'t CommitNode, path: &Path, action: ActionTag| {
            let job = ValidateJob {
                seq: jobs,
                node,
                path: path.clone(),
                action,
            };
            jobs += 1;
            let tx = tx.clone();
            scope.spawn(move |_| {
                // The receiver outlives the scope.
                let _ = tx.send(job.run(ctx));
            });
        };
        walk(tree, root, &mut spawn);
    });
    drop(tx);

    let mut responses: Vec<ValidateResponse> = rx.into_iter().collect();
    log::debug!("validated {jobs} targets on {workers} workers");
    // Fold in a fixed order so equal paths keep a stable relative order.
    responses.sort_by_key(|r| r.seq);
    for response in responses {
        outcome.outputs.extend(response.result.outputs);
        outcome.errors.extend(response.result.errors);
        outcome.ok &= response.result.ok;
    }
    outcome.outputs.sort_by(|a, b| a.path.cmp(&b.path));
    outcome.errors.sort_by(|a, b| a.path().cmp(&b.path()));

    let mut violations = ctx.structural.validate(tree);
    violations.sort_by(|a, b| a.path.cmp(&b.path));
    if !violations.is_empty() {
        outcome.ok = false;
    }
    outcome.errors.extend(violations.into_iter().map(|v| Error::Structural {
        path: v.path,
        message: v.message,
    }));
    Ok(outcome)
}

/// Visit validation targets in tree order
fn walk<'t, F>(tree: &'t CommitTree, id: NodeId, spawn: &mut F)
where
    F: FnMut(&'t CommitNode, &Path, ActionTag),
{
    let node = tree.node(id);
    match node.kind() {
        NodeKind::Leaf | NodeKind::LeafList => {
            if node.schema.presence {
                spawn(node, &node.path, node.action_tag());
                return;
            }
            let mut seen = HashSet::new();
            for value in tree.children(id).iter().map(|c| tree.node(*c)) {
                if seen.insert(value.name.as_str()) {
                    spawn(node, &value.path, value.action_tag());
                }
            }
        }
        NodeKind::List => {
            for child in tree.children(id) {
                walk(tree, *child, spawn);
            }
        }
        NodeKind::LeafValue => {}
        NodeKind::Container | NodeKind::Tree | NodeKind::ListEntry => {
            if !node.schema.scripts(Phase::Validate).is_empty() {
                spawn(node, &node.path, node.action_tag());
            }
            for child in tree.children(id) {
                walk(tree, *child, spawn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{StructuralValidator, Violation};
    use crate::diff::{Node, Status};
    use crate::schema::Schema;
    use crate::testing::{Recorder, attach, interfaces_schema};
    use crate::tree::BuildOptions;
    use std::sync::Arc;

    fn validate_with(
        diff: Node,
        schema: &Arc<Schema>,
        workers: usize,
    ) -> (ValidateOutcome, Recorder) {
        let diff = attach(diff, schema);
        let tree = CommitTree::build(&diff, BuildOptions::validate()).unwrap();
        let recorder = Recorder::default();
        let mut ctx = CommitContext::new(&diff, &recorder);
        ctx.workers = workers;
        let outcome = validate_tree(&tree, &ctx).unwrap();
        (outcome, recorder)
    }

    fn echo_schema() -> Arc<Schema> {
        Schema::new("root", NodeKind::Tree)
            .with_child(
                Schema::new("servers", NodeKind::List)
                    .with_script(Phase::Validate, "list-validate")
                    .with_child(
                        Schema::new("servers", NodeKind::ListEntry)
                            .with_script(Phase::Validate, "echo-entry")
                            .with_child(
                                Schema::new("port", NodeKind::LeafList)
                                    .with_script(Phase::Validate, "echo-port"),
                            ),
                    ),
            )
            .into_shared()
    }

    fn servers(names: &[&str]) -> Node {
        let entries = names.iter().map(|name| {
            Node::new(*name, Status::Added).with_child(
                Node::new("port", Status::Added).with_children([
                    Node::new("443", Status::Added),
                    Node::new("80", Status::Added),
                ]),
            )
        });
        Node::new("root", Status::Updated)
            .with_child(Node::new("servers", Status::Updated).with_children(entries))
    }

    #[test]
    fn results_are_sorted_by_path_regardless_of_workers() {
        let diff = servers(&["web", "db", "cache", "auth", "mail", "dns"]);
        let (single, _) = validate_with(diff.clone(), &echo_schema(), 1);
        let (many, _) = validate_with(diff, &echo_schema(), 8);

        let paths = |o: &ValidateOutcome| -> Vec<String> {
            o.outputs.iter().map(|out| out.path.to_string()).collect()
        };
        assert_eq!(paths(&single), paths(&many));
        let mut sorted = single.outputs.iter().map(|o| o.path.clone()).collect::<Vec<_>>();
        sorted.sort();
        assert_eq!(single.outputs.iter().map(|o| o.path.clone()).collect::<Vec<_>>(), sorted);
        assert_eq!(single.outputs.len(), 18);
        assert_eq!(single.outputs[0].path, Path::from("servers auth"));
        assert_eq!(single.outputs[1].path, Path::from("servers auth port 443"));
        assert!(single.ok);
    }

    #[test]
    fn lists_themselves_are_not_validated() {
        let (_, recorder) = validate_with(servers(&["web"]), &echo_schema(), 2);
        assert!(recorder.calls().iter().all(|c| c.script != "list-validate"));
        assert_eq!(recorder.calls().len(), 3);
    }

    #[test]
    fn multi_valued_leaf_validates_each_distinct_value_once() {
        let diff = Node::new("root", Status::Updated).with_child(
            Node::new("servers", Status::Updated).with_child(
                Node::new("web", Status::Added).with_child(
                    Node::new("port", Status::Added).with_children([
                        Node::new("80", Status::Added),
                        Node::new("80", Status::Added),
                        Node::new("8080", Status::Added),
                    ]),
                ),
            ),
        );
        let (_, recorder) = validate_with(diff, &echo_schema(), 2);
        let mut ports: Vec<String> = recorder
            .calls()
            .into_iter()
            .filter(|c| c.script == "echo-port")
            .map(|c| c.path)
            .collect();
        ports.sort();
        assert_eq!(ports, ["servers web port 80", "servers web port 8080"]);
        assert!(recorder.calls().iter().all(|c| c.phase == "commit"));
    }

    #[test]
    fn deleted_nodes_are_not_validated() {
        let diff = Node::new("root", Status::Updated).with_child(
            Node::new("interfaces", Status::Updated).with_child(
                Node::new("ethernet", Status::Updated).with_children([
                    Node::new("dp0s3", Status::Deleted),
                    Node::new("dp0s4", Status::Added),
                ]),
            ),
        );
        let (outcome, recorder) = validate_with(diff, &interfaces_schema(), 2);
        assert!(outcome.ok);
        assert_eq!(recorder.trace(), ["eth-validate@interfaces ethernet dp0s4"]);
    }

    #[test]
    fn failures_clear_ok_and_carry_their_path() {
        let schema = Schema::new("root", NodeKind::Tree)
            .with_child(
                Schema::new("mtu", NodeKind::Leaf).with_script(Phase::Validate, "fail-range"),
            )
            .with_child(
                Schema::new("name", NodeKind::Leaf).with_script(Phase::Validate, "fail-name"),
            )
            .into_shared();
        let diff = Node::new("root", Status::Updated)
            .with_child(
                Node::new("name", Status::Added).with_child(Node::new("eth0", Status::Added)),
            )
            .with_child(
                Node::new("mtu", Status::Added).with_child(Node::new("70000", Status::Added)),
            );
        let (outcome, _) = validate_with(diff, &schema, 4);

        assert!(!outcome.ok);
        let paths: Vec<String> = outcome
            .errors
            .iter()
            .filter_map(|e| e.path().map(ToString::to_string))
            .collect();
        assert_eq!(paths, ["mtu 70000", "name eth0"]);
    }

    struct RequireHostName;

    impl StructuralValidator for RequireHostName {
        fn validate(&self, _tree: &CommitTree) -> Vec<Violation> {
            vec![Violation {
                path: Path::from("system host-name"),
                message: "missing mandatory node".to_string(),
            }]
        }
    }

    #[test]
    fn structural_violations_are_appended() {
        let diff = attach(
            Node::new("root", Status::Updated).with_child(
                Node::new("interfaces", Status::Updated).with_child(
                    Node::new("ethernet", Status::Updated).with_child(
                        Node::new("dp0s4", Status::Added).with_child(
                            Node::new("mtu", Status::Added)
                                .with_child(Node::new("1400", Status::Added)),
                        ),
                    ),
                ),
            ),
            &interfaces_schema(),
        );
        let tree = CommitTree::build(&diff, BuildOptions::validate()).unwrap();
        let recorder = FailingMtu;
        let ctx = CommitContext::new(&diff, &recorder).with_structural(&RequireHostName);

        let outcome = validate_tree(&tree, &ctx).unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.errors.len(), 2);
        assert!(!outcome.errors[0].is_structural());
        assert!(outcome.errors[1].is_structural());
        assert_eq!(outcome.errors[1].to_string(), "[system host-name] missing mandatory node");
    }

    struct FailingMtu;

    impl crate::context::ScriptExecutor for FailingMtu {
        fn run(
            &self,
            _env: &crate::context::ScriptEnv<'_>,
            _path: &Path,
            script: &str,
        ) -> anyhow::Result<String> {
            if script == "mtu-validate" {
                anyhow::bail!("mtu out of range");
            }
            Ok(String::new())
        }
    }

    #[test]
    fn empty_tree_validates_ok() {
        let tree = CommitTree::default();
        let (empty, recorder) = (Node::default(), Recorder::default());
        let ctx = CommitContext::new(&empty, &recorder);
        let outcome = validate_tree(&tree, &ctx).unwrap();
        assert!(outcome.ok);
        assert!(outcome.errors.is_empty());
    }
}
