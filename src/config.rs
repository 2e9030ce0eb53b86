use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "commitctl.toml";

// ============================================================================
// Settings
// ============================================================================

/// Settings read from `commitctl.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Session id exported to scripts; empty means the process id
    pub session_id: String,

    /// User id named in audit records
    pub user_id: u32,

    /// Validation workers, 0 for host parallelism
    pub workers: usize,

    /// Trace actions skipped by the deferred gate
    pub debug: bool,

    /// Shell used to run action scripts
    pub shell: String,

    /// Override for the state directory
    pub state_dir: Option<String>,

    /// Ask before committing
    pub confirm: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            user_id: 0,
            workers: 0,
            debug: false,
            shell: "/bin/sh".to_string(),
            state_dir: None,
            confirm: true,
        }
    }
}

impl Settings {
    /// Load settings from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from a file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Session id to export, defaulting to this process
    pub fn session(&self) -> String {
        if self.session_id.is_empty() {
            std::process::id().to_string()
        } else {
            self.session_id.clone()
        }
    }

    /// Directory for the effective configuration and audit log
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(paths::expand(dir)),
            None => paths::state_dir(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
