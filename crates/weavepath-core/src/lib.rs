mod search;

pub use search::config::{MAX_INTERRUPT_CHECK_INTERVAL, SearchConfig, SearchConfigError};
pub use search::engine::{
    ConfiguredMcts, EngineState, Mcts, PolicySet, RunStatus, SearchEvent, SearchOutcome,
};
pub use search::error::{EvaluationError, GenerationError, GraphError, PolicyError, SearchError};
pub use search::graph::{ExpansionState, ExploredGraph, GraphChange, GraphHook, GraphNode};
pub use search::ids::NodeId;
pub use search::interrupt::{CancelFlag, Deadline, FirstOf, Interruption, NeverStop, StopCheck};
pub use search::metrics::{PlayoutHook, PlayoutMetrics, PlayoutTimings, SearchMetrics};
pub use search::path::{EvaluatedPath, SearchPath};
pub use search::policy::{
    ActionPolicy, LabelStore, NodeLabel, Objective, PlkPolicy, SpUcbPolicy, TreePolicy,
    TreePolicyConfig, UcbPolicy, UniformRandomPolicy, pick_weighted,
};
pub use search::problem::{
    GoalTester, GraphGenerator, NodeGoal, PathEvaluator, Score, SearchInput,
};
pub use search::snapshot::{GraphSnapshot, NodeSnapshot, SNAPSHOT_SCHEMA_VERSION};
