//! Shared fixtures for unit tests

use crate::context::{ScriptEnv, ScriptExecutor};
use crate::diff::Node;
use crate::schema::{NodeKind, Phase, Schema};
use crate::types::Path;
use std::sync::{Arc, Mutex};

/// Schema of a small router configuration
pub(crate) fn interfaces_schema() -> Arc<Schema> {
    Schema::new("root", NodeKind::Tree)
        .with_child(
            Schema::new("interfaces", NodeKind::Container).with_child(
                Schema::new("ethernet", NodeKind::List).with_child(
                    Schema::new("ethernet", NodeKind::ListEntry)
                        .with_key("tagnode")
                        .with_script(Phase::Begin, "eth-begin")
                        .with_script(Phase::Create, "eth-create")
                        .with_script(Phase::Update, "eth-update")
                        .with_script(Phase::Delete, "eth-delete")
                        .with_script(Phase::End, "eth-end")
                        .with_script(Phase::Validate, "eth-validate")
                        .with_child(
                            Schema::new("tagnode", NodeKind::Leaf)
                                .with_script(Phase::Create, "tag-create"),
                        )
                        .with_child(
                            Schema::new("mtu", NodeKind::Leaf)
                                .with_script(Phase::Create, "mtu-create")
                                .with_script(Phase::Delete, "mtu-delete")
                                .with_script(Phase::Validate, "mtu-validate"),
                        )
                        .with_child(Schema::new("description", NodeKind::Leaf)),
                ),
            ),
        )
        .with_child(
            Schema::new("system", NodeKind::Container)
                .with_child(
                    Schema::new("host-name", NodeKind::Leaf)
                        .with_script(Phase::Create, "hostname-create"),
                )
                .with_child(Schema::new("password", NodeKind::Leaf).secret()),
        )
        .into_shared()
}

pub(crate) fn attach(mut node: Node, schema: &Arc<Schema>) -> Node {
    node.attach_schema(schema);
    node
}

/// One recorded script invocation
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub script: String,
    /// Path exported to the script
    pub path: String,
    /// Path the engine reports the call under
    pub shown: String,
    pub phase: &'static str,
    pub action: &'static str,
}

/// Script executor that records invocations
///
/// Scripts named `fail*` fail; scripts named `echo*` print their path.
#[derive(Default)]
pub(crate) struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations as `script@path`
    pub fn trace(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| format!("{}@{}", c.script, c.path))
            .collect()
    }
}

impl ScriptExecutor for Recorder {
    fn run(&self, env: &ScriptEnv<'_>, path: &Path, script: &str) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(Call {
            script: script.to_string(),
            path: env.path.to_string(),
            shown: path.to_string(),
            phase: env.phase.env_name(),
            action: env.action.as_str(),
        });
        if script.starts_with("fail") {
            anyhow::bail!("{script} exited with status 1");
        }
        if script.starts_with("echo") {
            return Ok(format!("{path}\n"));
        }
        Ok(String::new())
    }
}
