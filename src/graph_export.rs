//! Serializable snapshots of the definition set and dependency edges.
//!
//! Enabled with the `graph-export` feature. Snapshots are diagnostic data
//! for external tooling; they carry definition metadata and every dependency
//! edge recorded so far, and serialize to JSON.

use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::definition::BeanRole;

/// One bean definition in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    pub scope: String,
    pub type_name: Option<String>,
    pub primary: bool,
    pub lazy: bool,
    pub abstract_template: bool,
    pub role: String,
}

/// One recorded dependency edge: `from` depends on `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Snapshot of definitions and dependency edges at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn role_label(role: BeanRole) -> &'static str {
    match role {
        BeanRole::Application => "application",
        BeanRole::Support => "support",
        BeanRole::Infrastructure => "infrastructure",
    }
}

impl Container {
    /// Snapshot the current definitions and recorded dependency edges.
    pub fn export_graph(&self) -> GraphSnapshot {
        let mut nodes = Vec::new();
        for name in self.definition_names() {
            let Ok(merged) = self.merged_definition(&name) else {
                continue;
            };
            nodes.push(GraphNode {
                name,
                scope: merged.scope_name().to_string(),
                type_name: merged.type_info().map(|t| t.name.to_string()),
                primary: merged.is_primary(),
                lazy: merged.is_lazy(),
                abstract_template: merged.is_abstract(),
                role: role_label(merged.role_hint()).to_string(),
            });
        }
        let edges = self
            .inner
            .graph
            .edges()
            .into_iter()
            .map(|(from, to)| GraphEdge { from, to })
            .collect();
        GraphSnapshot { nodes, edges }
    }
}
