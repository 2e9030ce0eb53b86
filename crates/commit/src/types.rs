//! Core types shared by the commit engine

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written in place of secret values
pub const REDACTED: &str = "********";

/// A configuration path, one segment per tree level
///
/// Ordering is segment-wise, which is the order validation results are
/// reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// A copy of this path with one more segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// A copy of this path with the last segment masked
    pub fn redacted(&self) -> Self {
        let mut path = self.clone();
        if let Some(last) = path.0.last_mut() {
            *last = REDACTED.to_string();
        }
        path
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        s.split_whitespace().collect()
    }
}

/// Action recorded for a changed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitAction {
    Created,
    Deleted,
    Updated,
}

impl fmt::Display for CommitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Updated => "updated",
        };
        f.write_str(name)
    }
}

/// Coarse action exported to scripts as `COMMIT_ACTION`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTag {
    Set,
    Delete,
    Active,
}

impl ActionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Active => "ACTIVE",
        }
    }
}

/// One entry of a delete or create list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub path: Path,
    /// Path safe for audit records
    pub redacted: Path,
    pub action: CommitAction,
}

/// Captured output of one script invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub path: Path,
    pub text: String,
}

/// Accumulated result of running actions for a node or subtree
#[derive(Debug)]
pub struct ActionResult {
    pub outputs: Vec<Output>,
    pub errors: Vec<Error>,
    pub ok: bool,
}

impl Default for ActionResult {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            errors: Vec::new(),
            ok: true,
        }
    }
}

impl ActionResult {
    /// Fold another result into this one
    pub fn merge(&mut self, other: ActionResult) {
        self.outputs.extend(other.outputs);
        self.errors.extend(other.errors);
        self.ok &= other.ok;
    }
}

/// Result of a commit
#[derive(Debug, Default)]
pub struct CommitOutcome {
    pub outputs: Vec<Output>,
    pub errors: Vec<Error>,
    /// Priority groups whose actions all succeeded
    pub successes: usize,
    /// Priority groups with at least one failed action
    pub failures: usize,
}

impl CommitOutcome {
    /// Outcome of a commit with nothing to do
    pub fn no_changes() -> Self {
        Self {
            errors: vec![Error::NoChanges],
            failures: 1,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Result of a validation
#[derive(Debug)]
pub struct ValidateOutcome {
    pub outputs: Vec<Output>,
    pub errors: Vec<Error>,
    pub ok: bool,
}

impl Default for ValidateOutcome {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            errors: Vec::new(),
            ok: true,
        }
    }
}

/// One scheduled priority group, as reported by [`crate::plan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedGroup {
    pub priority: u64,
    pub path: Path,
    pub deleted: bool,
}

/// Execution order of a commit without running it
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitPlan {
    pub delete: Vec<PlannedGroup>,
    pub set: Vec<PlannedGroup>,
}

impl CommitPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.set.is_empty()
    }
}
