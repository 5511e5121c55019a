use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for graph loading, validation, compilation, and builder operations.
pub enum GraphSpecError {
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing root node")]
    MissingRoot,

    #[error("root node '{root}' does not exist")]
    UnknownRoot { root: String },

    #[error("duplicate node id '{id}'")]
    DuplicateNodeId { id: String },

    #[error("duplicate action '{action}' on node '{node}'")]
    DuplicateAction { node: String, action: String },

    #[error("node '{node}' is a goal and cannot declare edges")]
    GoalHasEdges { node: String },

    #[error("edge '{action}' on node '{node}' references unknown node '{to}'")]
    UnknownTarget {
        node: String,
        action: String,
        to: String,
    },

    #[error("invalid score on node '{node}': {value}")]
    InvalidScore { node: String, value: f64 },

    #[error("builder referenced unknown node '{node}'")]
    BuilderUnknownNode { node: String },

    #[error("binary tree of depth {depth} needs {expected} leaf scores, got {found}")]
    LeafScoreCount {
        depth: u32,
        expected: usize,
        found: usize,
    },

    #[error("invalid random tree: {reason}")]
    InvalidRandomTree { reason: String },
}
