use std::{ops::AddAssign, time::Duration};

/// Time spent in the expensive collaborators during one or more playouts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayoutTimings {
    pub successor_generation: Duration,
    pub tree_policy_queries: Duration,
    pub tree_policy_updates: Duration,
    pub default_policy_queries: Duration,
    pub evaluation: Duration,
}

impl AddAssign for PlayoutTimings {
    fn add_assign(&mut self, other: Self) {
        self.successor_generation += other.successor_generation;
        self.tree_policy_queries += other.tree_policy_queries;
        self.tree_policy_updates += other.tree_policy_updates;
        self.default_policy_queries += other.default_policy_queries;
        self.evaluation += other.evaluation;
    }
}

/// Per-playout metrics emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayoutMetrics {
    /// 1-based playout number.
    pub playout: usize,
    /// Edges of the complete playout path.
    pub path_len: usize,
    /// Nodes of the path tracked by the tree policy (root included).
    pub tree_path_len: usize,
    pub is_goal: bool,
    pub score: f64,
    pub cached: bool,
    pub evaluation_failed: bool,
    pub tree_policy_invocations: usize,
    pub default_policy_invocations: usize,
    /// Playout attempts discarded because they ran into a dead end.
    pub dead_end_restarts: usize,
    pub timings: PlayoutTimings,
    pub duration: Duration,
}

/// Observer invoked after every completed playout.
pub type PlayoutHook = Box<dyn FnMut(&PlayoutMetrics)>;

/// Aggregate metrics for a search run. Passive; never affects the search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchMetrics {
    pub playouts: usize,
    pub solutions: usize,
    pub cache_hits: usize,
    pub failed_evaluations: usize,
    pub dead_end_restarts: usize,
    pub tree_policy_invocations: usize,
    pub default_policy_invocations: usize,
    pub score_sum: f64,
    pub average_score: f64,
    /// `tree_depths[d]` counts playouts whose tracked prefix had `d` edges.
    pub tree_depths: Vec<usize>,
    pub timings: PlayoutTimings,
    pub total_duration: Duration,
}

impl SearchMetrics {
    pub(crate) fn record(&mut self, metrics: &PlayoutMetrics) {
        self.playouts += 1;
        if metrics.is_goal && !metrics.cached && !metrics.evaluation_failed {
            self.solutions += 1;
        }
        if metrics.cached {
            self.cache_hits += 1;
        }
        if metrics.evaluation_failed {
            self.failed_evaluations += 1;
        }
        self.dead_end_restarts += metrics.dead_end_restarts;
        self.tree_policy_invocations += metrics.tree_policy_invocations;
        self.default_policy_invocations += metrics.default_policy_invocations;
        self.score_sum += metrics.score;
        self.average_score = self.score_sum / self.playouts as f64;

        let depth = metrics.tree_path_len.saturating_sub(1);
        if self.tree_depths.len() <= depth {
            self.tree_depths.resize(depth + 1, 0);
        }
        self.tree_depths[depth] += 1;

        self.timings += metrics.timings;
        self.total_duration += metrics.duration;
    }

    /// Deepest tracked prefix seen so far, in edges.
    pub fn max_tree_depth(&self) -> usize {
        self.tree_depths.len().saturating_sub(1)
    }
}
