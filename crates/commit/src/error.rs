//! Error types for commit operations.
//!
//! Script and validation failures are collected per node and returned next
//! to the outputs; they never abort a commit. The only error that aborts a
//! whole operation is [`Error::MissingSchema`], which means the diff and the
//! schema disagree.

use crate::schema::Phase;
use crate::types::Path;
use thiserror::Error;

/// Errors produced by the commit engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A diff node was visited that carries no schema
    #[error("no schema for node '{path}'")]
    MissingSchema {
        /// Path of the offending node
        path: Path,
    },

    /// Commit requested but the candidate matches the running config
    #[error("commit failed: no changes to commit")]
    NoChanges,

    /// An action script failed
    #[error("[{path}] {phase} failed: {message}")]
    Script {
        /// Path the script ran for, including any value segment
        path: Path,
        /// Phase the script belongs to
        phase: Phase,
        /// Error reported by the script executor
        message: String,
    },

    /// Structural (schema constraint) validation failed
    #[error("[{path}] {message}")]
    Structural {
        /// Path of the node violating the constraint
        path: Path,
        /// Description of the violated constraint
        message: String,
    },

    /// The effective database rejected an update
    #[error("[{path}] effective database update failed: {message}")]
    Effective {
        /// Path being recorded
        path: Path,
        /// Error reported by the effective database
        message: String,
    },

    /// Validation workers could not be started
    #[error("failed to start validation workers: {0}")]
    WorkerPool(String),
}

impl Error {
    /// Path the error refers to, used to order validation results
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingSchema { path }
            | Self::Script { path, .. }
            | Self::Structural { path, .. }
            | Self::Effective { path, .. } => Some(path),
            Self::NoChanges | Self::WorkerPool(_) => None,
        }
    }

    /// Whether this error must abort the whole operation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingSchema { .. })
    }

    /// Whether this error came from structural validation
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}

/// Result type for commit operations.
pub type Result<T> = std::result::Result<T, Error>;
