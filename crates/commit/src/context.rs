//! Commit context and collaborator traits
//!
//! These traits allow the engine to be used without depending on a specific
//! script runner, effective database, schema validator or audit trail.

use crate::diff::DiffNode;
use crate::schema::Phase;
use crate::tree::CommitTree;
use crate::types::{ActionTag, Change, CommitAction, Path};
use anyhow::Result;

/// Environment variable carrying the configuration session id
pub const ENV_SESSION_ID: &str = "CONFIG_SESSION_ID";
/// Environment variable carrying the full node path
pub const ENV_PATH: &str = "CONFIG_PATH";
/// Environment variable carrying the phase name
pub const ENV_PHASE: &str = "CONFIG_PHASE";
/// Environment variable carrying the coarse commit action
pub const ENV_ACTION: &str = "COMMIT_ACTION";

/// Environment handed to every action script
#[derive(Debug, Clone)]
pub struct ScriptEnv<'a> {
    pub session_id: &'a str,
    pub path: &'a Path,
    pub phase: Phase,
    pub action: ActionTag,
}

impl ScriptEnv<'_> {
    /// Variables to export to the script process
    pub fn vars(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_SESSION_ID, self.session_id.to_string()),
            (ENV_PATH, self.path.to_string()),
            (ENV_PHASE, self.phase.env_name().to_string()),
            (ENV_ACTION, self.action.as_str().to_string()),
        ]
    }
}

/// Runs action scripts
///
/// Called from validation workers concurrently, so implementations must be
/// thread-safe. Timeouts and sandboxing are the executor's business.
pub trait ScriptExecutor: Send + Sync {
    /// Run one script, returning its captured output
    ///
    /// `path` is for logging and has secret values redacted. The script
    /// itself sees the real path through `env`.
    fn run(&self, env: &ScriptEnv<'_>, path: &Path, script: &str) -> Result<String>;
}

/// Store of the configuration paths currently in effect
pub trait EffectiveDb: Send + Sync {
    fn set(&self, path: &Path) -> Result<()>;
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Effective database that records nothing
pub struct NoEffectiveDb;

impl EffectiveDb for NoEffectiveDb {
    fn set(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// A structural validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: Path,
    pub message: String,
}

/// Schema constraint checking over a whole commit tree
pub trait StructuralValidator: Send + Sync {
    fn validate(&self, tree: &CommitTree) -> Vec<Violation>;
}

/// Validator that accepts every tree
pub struct NoStructuralValidation;

impl StructuralValidator for NoStructuralValidation {
    fn validate(&self, _tree: &CommitTree) -> Vec<Violation> {
        Vec::new()
    }
}

/// Audit trail of committed changes
pub trait AuditLog: Send + Sync {
    /// Record one replayed change; `change.redacted` is safe to persist
    fn record(&self, change: &Change, user_id: u32);
}

/// Audit trail written through the `log` facade under the `audit` target
pub struct LogAudit;

impl AuditLog for LogAudit {
    fn record(&self, change: &Change, user_id: u32) {
        let verb = match change.action {
            CommitAction::Created => "create",
            CommitAction::Deleted => "delete",
            CommitAction::Updated => "update",
        };
        log::info!(target: "audit", "{verb} [{}] by uid {user_id}", change.redacted);
    }
}

/// Progress callback for commit execution
pub trait CommitProgress: Send {
    /// Called once the schedule is known
    fn on_schedule(&mut self, groups: usize);

    /// Called before a priority group runs
    fn on_group_start(&mut self, priority: u64, path: &Path);

    /// Called after a priority group ran
    fn on_group_complete(&mut self, path: &Path, ok: bool);
}

/// No-op progress callback
pub struct NoProgress;

impl CommitProgress for NoProgress {
    fn on_schedule(&mut self, _groups: usize) {}
    fn on_group_start(&mut self, _priority: u64, _path: &Path) {}
    fn on_group_complete(&mut self, _path: &Path, _ok: bool) {}
}

/// Everything a commit, validate or changed call needs
pub struct CommitContext<'a> {
    /// Root of the diff between running and candidate
    pub diff: &'a dyn DiffNode,
    pub executor: &'a dyn ScriptExecutor,
    pub effective: &'a dyn EffectiveDb,
    pub structural: &'a dyn StructuralValidator,
    pub audit: &'a dyn AuditLog,
    pub session_id: String,
    /// Acting user, named in audit records
    pub user_id: u32,
    /// Trace skipped actions
    pub debug: bool,
    /// Run the deferred pass instead of the immediate one
    pub deferred: bool,
    /// Validation workers, 0 for host parallelism
    pub workers: usize,
}

impl<'a> CommitContext<'a> {
    /// Create a context with no-op effective database and structural validation
    pub fn new(diff: &'a dyn DiffNode, executor: &'a dyn ScriptExecutor) -> Self {
        Self {
            diff,
            executor,
            effective: &NoEffectiveDb,
            structural: &NoStructuralValidation,
            audit: &LogAudit,
            session_id: String::new(),
            user_id: 0,
            debug: false,
            deferred: false,
            workers: 0,
        }
    }

    pub fn with_effective(mut self, effective: &'a dyn EffectiveDb) -> Self {
        self.effective = effective;
        self
    }

    pub fn with_structural(mut self, structural: &'a dyn StructuralValidator) -> Self {
        self.structural = structural;
        self
    }

    pub fn with_audit(mut self, audit: &'a dyn AuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>, user_id: u32) -> Self {
        self.session_id = session_id.into();
        self.user_id = user_id;
        self
    }

    /// Number of validation workers to start
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}
