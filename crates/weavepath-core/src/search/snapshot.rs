use std::{fmt::Debug, hash::Hash};

use serde::Serialize;

use crate::search::{
    graph::{ExpansionState, ExploredGraph},
    ids::NodeId,
    policy::NodeLabel,
};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub schema_version: u32,
    pub root_node_id: usize,
    pub node_count: usize,
    pub unexpanded_count: usize,
    pub expansion_count: usize,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub node_id: usize,
    /// `Debug` rendering of the node state.
    pub state: String,
    pub depth: usize,
    pub parent_node_id: Option<usize>,
    pub action: Option<String>,
    pub child_node_ids: Vec<usize>,
    pub expansion_state: ExpansionState,
    pub visited: bool,
    pub dead_end: bool,
    pub fully_explored: bool,
    pub label: Option<NodeLabel>,
}

impl GraphSnapshot {
    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<N, A> ExploredGraph<N, A>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    /// Capture every node together with the label `label` reports for it.
    pub fn snapshot<F>(&self, label: F) -> GraphSnapshot
    where
        F: Fn(NodeId) -> Option<NodeLabel>,
    {
        let nodes = self
            .nodes()
            .map(|(node_id, node)| NodeSnapshot {
                node_id: node_id.index(),
                state: format!("{:?}", node.state()),
                depth: node.depth(),
                parent_node_id: node.parent().map(|parent| parent.index()),
                action: node.action().map(|action| format!("{action:?}")),
                child_node_ids: node.children().iter().map(|child| child.index()).collect(),
                expansion_state: node.expansion_state(),
                visited: node.is_visited(),
                dead_end: node.is_dead_end(),
                fully_explored: node.is_fully_explored(),
                label: label(node_id),
            })
            .collect();

        GraphSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            root_node_id: self.root_id().index(),
            node_count: self.node_count(),
            unexpanded_count: self.unexpanded_count(),
            expansion_count: self.expansion_count(),
            nodes,
        }
    }
}
