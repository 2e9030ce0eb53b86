//! Schema nodes consumed by the commit engine
//!
//! The engine never parses or compiles schema. It only needs to know what
//! kind of node it is looking at, the priority declared for it, and which
//! scripts run in each lifecycle phase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Single-valued leaf
    Leaf,
    /// Multi-valued leaf, values kept in declared order
    LeafList,
    /// One value of a leaf or leaf-list
    LeafValue,
    /// Keyed list; its children are list entries
    List,
    /// One entry of a list
    ListEntry,
    /// Plain container
    #[default]
    Container,
    /// Root of a configuration tree
    Tree,
}

impl NodeKind {
    /// Leaves and leaf-lists carry values
    pub fn is_leaf_type(self) -> bool {
        matches!(self, Self::Leaf | Self::LeafList)
    }

    /// Kinds that may never own a priority group
    pub fn is_priority_exempt(self) -> bool {
        matches!(self, Self::List | Self::LeafValue)
    }

    /// Kinds dispatched as containers by the action executor
    pub fn is_container_like(self) -> bool {
        matches!(self, Self::Container | Self::Tree | Self::ListEntry)
    }
}

/// Lifecycle phase of an action script
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    RegisterDefer,
    Begin,
    Create,
    Update,
    Delete,
    End,
    /// Validation scripts, exported to scripts as the `commit` phase
    Validate,
}

impl Phase {
    /// Name exported to scripts through the environment
    ///
    /// `register-defer` reports itself as `begin` since older scripts only
    /// know the original phase names.
    pub fn env_name(self) -> &'static str {
        match self {
            Self::RegisterDefer | Self::Begin => "begin",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::End => "end",
            Self::Validate => "commit",
        }
    }

    /// Whether the deferred two-pass split applies to this phase
    pub fn is_gated(self) -> bool {
        !matches!(self, Self::RegisterDefer | Self::Validate)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RegisterDefer => "register-defer",
            Self::Begin => "begin",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::End => "end",
            Self::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// A schema node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub kind: NodeKind,
    /// Declared priority, 0 when unset
    #[serde(default)]
    pub priority: u32,
    /// Actions of this subtree run in the deferred pass
    #[serde(default)]
    pub deferred: bool,
    /// Leaf of presence/empty type: no values, only existence
    #[serde(default)]
    pub presence: bool,
    /// Values must be redacted in audit records
    #[serde(default)]
    pub secret: bool,
    /// Must exist whenever the parent exists
    #[serde(default)]
    pub mandatory: bool,
    /// Key leaf of a list entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<Phase, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Schema>>,
}

impl Schema {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_script(mut self, phase: Phase, script: impl Into<String>) -> Self {
        self.scripts.entry(phase).or_default().push(script.into());
        self
    }

    pub fn with_child(mut self, child: Schema) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn presence(mut self) -> Self {
        self.presence = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Scripts declared for a phase
    pub fn scripts(&self, phase: Phase) -> &[String] {
        self.scripts.get(&phase).map_or(&[], Vec::as_slice)
    }

    /// Whether this node owns its own begin/end scope
    pub fn has_boundary(&self) -> bool {
        [Phase::RegisterDefer, Phase::Begin, Phase::End]
            .iter()
            .any(|phase| !self.scripts(*phase).is_empty())
    }

    /// Schema of a named child
    ///
    /// Lists have a single entry schema and leaves a single value schema, so
    /// for those the name is not consulted.
    pub fn child(&self, name: &str) -> Option<&Arc<Schema>> {
        match self.kind {
            NodeKind::List | NodeKind::Leaf | NodeKind::LeafList => self.children.first(),
            _ => self.children.iter().find(|c| c.name == name),
        }
    }

    /// Finish a schema tree for sharing
    ///
    /// Leaves and leaf-lists get their value schema, which inherits the
    /// secret marker so values can be redacted.
    pub fn into_shared(mut self) -> Arc<Self> {
        let children = std::mem::take(&mut self.children);
        self.children = children
            .into_iter()
            .map(|c| Arc::unwrap_or_clone(c).into_shared())
            .collect();

        if self.kind.is_leaf_type() && !self.presence && self.children.is_empty() {
            let mut value = Schema::new(self.name.clone(), NodeKind::LeafValue);
            value.secret = self.secret;
            self.children.push(Arc::new(value));
        }

        Arc::new(self)
    }
}
