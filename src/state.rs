use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use commit::{EffectiveDb, Path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Name of the effective configuration file inside the state directory
pub const EFFECTIVE_FILE: &str = "effective.toml";

// ============================================================================
// State Structures
// ============================================================================

/// Configuration paths currently in effect
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct EffectiveState {
    /// Paths in effect, one space-joined path per entry
    #[serde(default)]
    pub paths: BTreeSet<String>,

    /// Last time a commit updated the state
    pub last_updated: Option<DateTime<Utc>>,
}

/// TOML-backed effective database
///
/// Commits mutate the in-memory state; [`EffectiveStore::save`] writes it
/// back once the commit is over.
#[derive(Debug)]
pub struct EffectiveStore {
    file: PathBuf,
    state: Mutex<EffectiveState>,
}

// ============================================================================
// EffectiveStore Implementation
// ============================================================================

impl EffectiveStore {
    /// Open the store in `dir`, starting empty if it doesn't exist yet
    pub fn open(dir: PathBuf) -> Result<Self> {
        let file = dir.join(EFFECTIVE_FILE);
        let state = if file.exists() {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read effective config: {}", file.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse effective config: {}", file.display()))?
        } else {
            log::debug!("Effective config does not exist, starting empty");
            EffectiveState::default()
        };
        Ok(Self {
            file,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EffectiveState> {
        match self.state.lock() {
            Ok(locked) => locked,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    fn snapshot(&self) -> EffectiveState {
        self.lock().clone()
    }

    /// Stamp and write the state to disk
    pub fn save(&self) -> Result<()> {
        let mut state = self.lock();
        state.last_updated = Some(Utc::now());

        if let Some(dir) = self.file.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }
        let content =
            toml::to_string_pretty(&*state).context("Failed to serialize effective config")?;
        fs::write(&self.file, content)
            .with_context(|| format!("Failed to write effective config: {}", self.file.display()))?;

        log::debug!("Saved {} effective paths to {}", state.paths.len(), self.file.display());
        Ok(())
    }
}

impl EffectiveDb for EffectiveStore {
    fn set(&self, path: &Path) -> Result<()> {
        self.lock().paths.insert(path.to_string());
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.lock().paths.remove(&path.to_string());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
