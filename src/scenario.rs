//! Scenario files - a schema and an annotated diff tree in one JSON document
//!
//! ```json
//! {
//!   "schema": { "name": "root", "kind": "tree", "children": [...] },
//!   "diff": { "name": "root", "status": "updated", "children": [...] }
//! }
//! ```

use anyhow::{Context, Result};
use commit::{Node, Schema};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    schema: Schema,
    diff: Node,
}

/// A loaded scenario, its diff carrying resolved schema references
#[derive(Debug)]
pub struct Scenario {
    pub diff: Node,
}

impl Scenario {
    /// Load and resolve a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(content)?;
        let schema = file.schema.into_shared();
        let mut diff = file.diff;
        diff.attach_schema(&schema);
        Ok(Self { diff })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commit::{DiffNode, NodeKind};

    const SCENARIO: &str = r#"{
        "schema": {
            "name": "root",
            "kind": "tree",
            "children": [
                {
                    "name": "system",
                    "children": [
                        {
                            "name": "host-name",
                            "kind": "leaf",
                            "scripts": { "create": ["echo created"] }
                        }
                    ]
                }
            ]
        },
        "diff": {
            "name": "root",
            "status": "updated",
            "children": [
                {
                    "name": "system",
                    "children": [
                        {
                            "name": "host-name",
                            "status": "added",
                            "children": [{ "name": "vr1", "status": "added" }]
                        }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn parse_resolves_schemas_down_to_values() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let system = scenario.diff.children()[0];
        assert_eq!(system.schema().unwrap().kind, NodeKind::Container);
        let host_name = system.children()[0];
        let value = host_name.children()[0];
        assert_eq!(value.schema().unwrap().kind, NodeKind::LeafValue);
        assert!(value.added());
    }

    #[test]
    fn load_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"schema\": {} }").unwrap();
        let err = Scenario::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn bundled_demo_parses() {
        let scenario = Scenario::parse(include_str!("../demos/router.json")).unwrap();
        let schema = scenario.diff.schema().unwrap();
        let interfaces = schema.child("interfaces").unwrap();
        assert_eq!(interfaces.priority, 300);
        let entry = interfaces.child("ethernet").unwrap().child("dp0s3").unwrap();
        assert_eq!(entry.kind, NodeKind::ListEntry);
        assert!(scenario.diff.changed());
    }
}
