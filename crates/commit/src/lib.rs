//! # Commit
//!
//! A configuration commit engine.
//!
//! Given a diff between a candidate and a running configuration tree, this
//! crate works out which nodes changed, orders the changes by the priorities
//! declared in the schema, runs each node's lifecycle scripts and replays the
//! accepted changes into an effective configuration store.
//!
//! ## Core Concepts
//!
//! - **Schema**: Node kinds, priorities and lifecycle scripts per phase
//! - **CommitTree**: The diff, annotated and pruned to what changed
//! - **PriorityTree**: Groups of the commit tree that run as a unit
//! - **Schedule**: Delete groups by descending priority, then set groups by
//!   ascending priority
//! - **ActionRunner**: Runs begin/create/update/delete/end scripts for a group
//!
//! ## Example
//!
//! ```ignore
//! use commit::{CommitContext, Node, Schema, NodeKind, Phase, Status};
//!
//! let schema = Schema::new("root", NodeKind::Tree)
//!     .with_child(
//!         Schema::new("host-name", NodeKind::Leaf)
//!             .with_script(Phase::Create, "hostnamectl set-hostname \"${CONFIG_PATH##* }\""),
//!     )
//!     .into_shared();
//!
//! let mut diff = Node::new("root", Status::Updated).with_child(
//!     Node::new("host-name", Status::Added).with_child(Node::new("vr1", Status::Added)),
//! );
//! diff.attach_schema(&schema);
//!
//! let ctx = CommitContext::new(&diff, &executor).with_effective(&store);
//! let outcome = commit::commit(&ctx)?;
//! println!("{} groups ok, {} failed", outcome.successes, outcome.failures);
//! ```
//!
//! ## Collaborator Traits
//!
//! - [`ScriptExecutor`]: Runs one action script
//! - [`EffectiveDb`]: Records paths that are now in effect
//! - [`StructuralValidator`]: Checks schema constraints on the whole tree
//! - [`AuditLog`]: Receives one record per replayed change
//! - [`CommitProgress`]: Receives progress updates
//!
//! The engine has no hard dependency on how scripts are run or where the
//! effective configuration lives.

pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod heap;
pub mod priority;
pub mod schema;
pub mod tree;
pub mod types;
pub mod validate;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{
    AuditLog, CommitContext, CommitProgress, EffectiveDb, LogAudit, NoEffectiveDb, NoProgress,
    NoStructuralValidation, ScriptEnv, ScriptExecutor, StructuralValidator, Violation,
};
pub use diff::{DiffNode, Node, Status};
pub use engine::{changed, commit, commit_with_progress, plan, validate};
pub use error::{Error, Result};
pub use schema::{NodeKind, Phase, Schema};
pub use tree::{BuildOptions, CommitTree};
pub use types::{
    ActionTag, Change, CommitAction, CommitOutcome, CommitPlan, Output, Path, PlannedGroup,
    ValidateOutcome,
};
