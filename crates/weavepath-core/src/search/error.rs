use thiserror::Error;

use crate::search::{config::SearchConfigError, ids::NodeId, interrupt::Interruption};

/// Errors raised by action-selection policies.
///
/// Everything except `NoActionAvailable` is an invariant violation and
/// aborts the search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("no action available in node {node}")]
    NoActionAvailable { node: String },

    #[error(
        "node at depth {depth} has {child_visits} visits but its parent only has {parent_visits}"
    )]
    InconsistentVisits {
        depth: usize,
        parent_visits: u64,
        child_visits: u64,
    },

    #[error("negative selection score {score} for action {action}")]
    NegativeScore { action: String, score: f64 },

    #[error("score {score} is not a finite number")]
    NonFiniteScore { score: f64 },

    #[error("nested search could not pick an action: {reason}")]
    NestedSearch { reason: String },
}

/// Failure reported by an external graph generator. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("successor generation failed: {0}")]
pub struct GenerationError(pub String);

/// Failure reported by an external path evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The path could not be scored; the search substitutes its penalty score.
    #[error("evaluation failed: {0}")]
    Failed(String),

    /// The evaluator observed the stop signal.
    #[error("evaluation {0}")]
    Interrupted(Interruption),
}

/// Errors of the explored graph store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("missing node with id {}", node_id.index())]
    MissingNode { node_id: NodeId },

    #[error("node {} has already been expanded", node_id.index())]
    AlreadyExpanded { node_id: NodeId },

    #[error("generator returned action {action} twice for node {node}")]
    DuplicateAction { node: String, action: String },
}

/// Fatal errors that abort a search run.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Config(#[from] SearchConfigError),

    #[error("policy chose action {action}, which is not a successor of node {node}")]
    InvalidChosenAction { node: String, action: String },

    #[error("prefix root {found} does not match search root {expected}")]
    PrefixRootMismatch { expected: String, found: String },

    #[error("prefix edge {position} with action {action} does not exist in the search graph")]
    InvalidPrefix { position: usize, action: String },

    #[error("invalid solution path: {reason}")]
    InvalidSolutionPath { reason: String },

    #[error("search was {0} while enforcing a prefix")]
    Interrupted(Interruption),

    #[error("search has already terminated")]
    AlreadyTerminated,
}

/// Internal reason a playout stopped short of producing a path.
#[derive(Debug)]
pub(crate) enum Halt {
    /// The stop check fired.
    Interrupted(Interruption),
    /// No playout can be drawn anymore; normal termination.
    Exhausted,
    Fatal(SearchError),
}

impl From<SearchError> for Halt {
    fn from(err: SearchError) -> Self {
        Halt::Fatal(err)
    }
}

impl From<GraphError> for Halt {
    fn from(err: GraphError) -> Self {
        Halt::Fatal(err.into())
    }
}

impl From<PolicyError> for Halt {
    fn from(err: PolicyError) -> Self {
        Halt::Fatal(err.into())
    }
}

impl From<GenerationError> for Halt {
    fn from(err: GenerationError) -> Self {
        Halt::Fatal(err.into())
    }
}
