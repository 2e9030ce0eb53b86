//! Audit trail appended to `<state>/audit.log`

use anyhow::{Context, Result};
use chrono::Utc;
use commit::{AuditLog, Change, CommitAction};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const AUDIT_FILE: &str = "audit.log";

/// Appends one timestamped line per replayed change
#[derive(Debug)]
pub struct FileAudit {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileAudit {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        let path = dir.join(AUDIT_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }
}

/// One audit line, without the trailing newline
fn audit_line(change: &Change, user_id: u32) -> String {
    let verb = match change.action {
        CommitAction::Created => "create",
        CommitAction::Deleted => "delete",
        CommitAction::Updated => "update",
    };
    format!(
        "{} {verb} [{}] by uid {user_id}",
        Utc::now().to_rfc3339(),
        change.redacted
    )
}

impl AuditLog for FileAudit {
    fn record(&self, change: &Change, user_id: u32) {
        let line = audit_line(change, user_id);
        let mut file = match self.file.lock() {
            Ok(locked) => locked,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            log::warn!("Could not write {}: {e}", self.path.display());
        }
    }
}
