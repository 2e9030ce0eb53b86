use anyhow::{Context, Result};
use commit::{Path, ScriptEnv, ScriptExecutor};
use std::process::Command;

/// Runs action scripts through a shell with the commit environment exported
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl ScriptExecutor for ShellExecutor {
    fn run(&self, env: &ScriptEnv<'_>, path: &Path, script: &str) -> Result<String> {
        log::trace!("[{path}] {} running: {script}", env.phase);
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .envs(env.vars())
            .output()
            .with_context(|| format!("Failed to execute: {} -c {script}", self.shell))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                anyhow::bail!("Script exited with {}", output.status)
            }
            anyhow::bail!("Script exited with {}: {stderr}", output.status)
        }
    }
}
