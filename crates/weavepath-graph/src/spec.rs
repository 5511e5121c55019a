use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CompiledGraph, GraphSpecError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Serializable search-graph schema used for YAML IO and validation.
pub struct GraphSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Id of the node every search starts from.
    pub root: String,
    /// All node declarations in the graph.
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single node declaration.
pub struct NodeSpec {
    /// Unique node id.
    pub id: String,
    /// Whether reaching this node completes a path (defaults to `false`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<bool>,
    /// Score a path ending here evaluates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Outgoing edges in generation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A labelled edge to another node.
pub struct EdgeSpec {
    pub action: String,
    pub to: String,
}

impl NodeSpec {
    pub fn is_goal(&self) -> bool {
        self.goal.unwrap_or(false)
    }
}

impl GraphSpec {
    /// Validate ids, edges, and scores.
    pub fn validate(&self) -> Result<(), GraphSpecError> {
        if self.root.trim().is_empty() {
            return Err(GraphSpecError::MissingRoot);
        }

        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphSpecError::DuplicateNodeId {
                    id: node.id.clone(),
                });
            }
        }

        if !ids.contains(self.root.as_str()) {
            return Err(GraphSpecError::UnknownRoot {
                root: self.root.clone(),
            });
        }

        for node in &self.nodes {
            if let Some(score) = node.score.filter(|score| !score.is_finite()) {
                return Err(GraphSpecError::InvalidScore {
                    node: node.id.clone(),
                    value: score,
                });
            }

            if node.is_goal() && !node.edges.is_empty() {
                return Err(GraphSpecError::GoalHasEdges {
                    node: node.id.clone(),
                });
            }

            let mut actions = HashSet::with_capacity(node.edges.len());
            for edge in &node.edges {
                if !actions.insert(edge.action.as_str()) {
                    return Err(GraphSpecError::DuplicateAction {
                        node: node.id.clone(),
                        action: edge.action.clone(),
                    });
                }

                if !ids.contains(edge.to.as_str()) {
                    return Err(GraphSpecError::UnknownTarget {
                        node: node.id.clone(),
                        action: edge.action.clone(),
                        to: edge.to.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Compile this spec into the runtime representation.
    pub fn compile(&self) -> Result<CompiledGraph, GraphSpecError> {
        CompiledGraph::from_spec(self)
    }
}
