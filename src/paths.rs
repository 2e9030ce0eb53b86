//! Directory resolution for commitctl
//!
//! # Environment Variables
//!
//! - `COMMITCTL_CONFIG_DIR` - Override the directory holding `commitctl.toml`
//! - `COMMITCTL_STATE_DIR` - Override the directory holding the effective
//!   configuration and the audit log
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `COMMITCTL_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/commitctl` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\commitctl`
//!    - macOS/Linux: `~/.config/commitctl`
//!
//! For state_dir():
//! 1. `COMMITCTL_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/commitctl` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\commitctl`
//!    - macOS/Linux: `~/.local/state/commitctl`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "commitctl";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "COMMITCTL_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "COMMITCTL_STATE_DIR";

/// Get the commitctl config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {ENV_CONFIG_DIR}: {}", path.display());
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the commitctl state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {ENV_STATE_DIR}: {}", path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Expand `~` and environment variables in a path string
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set, restoring the previous value afterwards
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: each variable is read and written by a single test only
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: as above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: each variable is read and written by a single test only
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: as above
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/srv/commitctl/etc", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/srv/commitctl/etc"));
        });
    }

    // Both cases share COMMITCTL_STATE_DIR, so they run in one test.
    #[test]
    fn state_dir_resolution() {
        let home = dirs::home_dir().unwrap();
        with_env_var("XDG_STATE_HOME", "/tmp/xdg-state-test", || {
            with_env_var(ENV_STATE_DIR, "~/commitctl-state-test", || {
                assert_eq!(state_dir().unwrap(), home.join("commitctl-state-test"));
            });
            without_env_var(ENV_STATE_DIR, || {
                assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/xdg-state-test/commitctl"));
            });
        });
    }

    #[test]
    fn expand_env_var() {
        with_env_var("COMMITCTL_TEST_VAR", "router", || {
            assert_eq!(expand("/var/$COMMITCTL_TEST_VAR/db"), PathBuf::from("/var/router/db"));
        });
    }

    #[test]
    fn expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$NONEXISTENT_VAR_12345/file"),
            PathBuf::from("/path/$NONEXISTENT_VAR_12345/file")
        );
    }
}
