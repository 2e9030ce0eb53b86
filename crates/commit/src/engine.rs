//! Commit engine - the commit, validate and changed entry points
//!
//! Priority groups run strictly one after another: the whole delete queue
//! first, then the set queue. Each group's changes are snapshotted before
//! its actions run and replayed into the effective database only when every
//! action of the group succeeded.

use crate::context::{CommitContext, CommitProgress, NoProgress};
use crate::error::{Error, Result};
use crate::executor::ActionRunner;
use crate::heap::schedule;
use crate::priority::{PrioId, PriorityTree};
use crate::tree::{BuildOptions, CommitTree};
use crate::types::{Change, CommitOutcome, CommitPlan, PlannedGroup, ValidateOutcome};
use crate::validate::validate_tree;

/// Apply the diff in the context
///
/// Returns [`CommitOutcome::no_changes`] when nothing changed. The only
/// `Err` is a fatal precondition violation such as a node without schema.
pub fn commit(ctx: &CommitContext<'_>) -> Result<CommitOutcome> {
    commit_with_progress(ctx, &mut NoProgress)
}

/// Apply the diff in the context, reporting each priority group
///
/// # Arguments
/// * `ctx` - Diff, collaborators and session of this commit
/// * `progress` - Notified before and after every priority group
pub fn commit_with_progress<P: CommitProgress>(
    ctx: &CommitContext<'_>,
    progress: &mut P,
) -> Result<CommitOutcome> {
    let mut tree = CommitTree::build(ctx.diff, BuildOptions::commit())?;
    let Some(root) = tree.root() else {
        log::info!("nothing to commit");
        return Ok(CommitOutcome::no_changes());
    };

    let prio = PriorityTree::build(&mut tree, root);
    let mut queues = schedule(&prio, &tree);
    log::debug!(
        "scheduled {} delete and {} set groups",
        queues.delete.len(),
        queues.set.len()
    );
    progress.on_schedule(queues.groups());

    let runner = ActionRunner::new(&tree, ctx);
    let mut outcome = CommitOutcome::default();
    for (priority, id) in queues.delete.drain().chain(queues.set.drain()) {
        let group = prio.node(id).root;
        let node = tree.node(group);
        progress.on_group_start(priority, &node.path);

        // Snapshot before running so replay matches what was executed.
        let deletes = tree.delete_list(group);
        let creates = tree.create_list(group);
        let result = if node.deleted() {
            runner.delete(group)
        } else {
            runner.update(group)
        };

        let ok = result.ok;
        outcome.outputs.extend(result.outputs);
        outcome.errors.extend(result.errors);
        if ok {
            outcome.successes += 1;
            if !ctx.deferred {
                replay(ctx, &deletes, &creates, &mut outcome.errors);
            }
        } else {
            outcome.failures += 1;
            log::warn!("priority {priority} group [{}] failed", node.path);
        }
        progress.on_group_complete(&node.path, ok);
    }

    log::info!(
        "commit finished: {} groups succeeded, {} failed",
        outcome.successes,
        outcome.failures
    );
    Ok(outcome)
}

/// Record a successful group's changes and audit each one
fn replay(
    ctx: &CommitContext<'_>,
    deletes: &[Change],
    creates: &[Change],
    errors: &mut Vec<Error>,
) {
    for change in deletes {
        match ctx.effective.delete(&change.path) {
            Ok(()) => ctx.audit.record(change, ctx.user_id),
            Err(e) => errors.push(effective_error(change, e)),
        }
    }
    for change in creates {
        match ctx.effective.set(&change.path) {
            Ok(()) => ctx.audit.record(change, ctx.user_id),
            Err(e) => errors.push(effective_error(change, e)),
        }
    }
}

fn effective_error(change: &Change, e: anyhow::Error) -> Error {
    Error::Effective {
        path: change.redacted.clone(),
        message: format!("{e:#}"),
    }
}

/// Run validate scripts and structural validation over the post-commit view
pub fn validate(ctx: &CommitContext<'_>) -> Result<ValidateOutcome> {
    let tree = CommitTree::build(ctx.diff, BuildOptions::validate())?;
    validate_tree(&tree, ctx)
}

/// Whether the diff holds any change at all
pub fn changed(ctx: &CommitContext<'_>) -> Result<bool> {
    let tree = CommitTree::build(ctx.diff, BuildOptions::commit())?;
    Ok(tree.root().is_some_and(|root| !tree.children(root).is_empty()))
}

/// Order in which a commit would run its priority groups
pub fn plan(ctx: &CommitContext<'_>) -> Result<CommitPlan> {
    let mut tree = CommitTree::build(ctx.diff, BuildOptions::commit())?;
    let Some(root) = tree.root() else {
        return Ok(CommitPlan::default());
    };
    let prio = PriorityTree::build(&mut tree, root);
    let mut queues = schedule(&prio, &tree);

    let group = |(priority, id): (u64, PrioId)| {
        let node = tree.node(prio.node(id).root);
        PlannedGroup {
            priority,
            path: node.path.clone(),
            deleted: node.deleted(),
        }
    };
    Ok(CommitPlan {
        delete: queues.delete.drain().map(group).collect(),
        set: queues.set.drain().map(group).collect(),
    })
}
