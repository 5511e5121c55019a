use std::{fmt::Debug, hash::Hash};

use crate::search::{
    error::PolicyError,
    policy::{
        ActionPolicy, LabelStore, NodeLabel, Objective, TreePolicy, select_with_labels,
        ucb::{pick_best, ucb_score},
    },
};

/// Single-player UCB: UCT plus a variance term per child.
#[derive(Debug, Clone)]
pub struct SpUcbPolicy<N> {
    labels: LabelStore<N>,
    exploration: f64,
    variance_bound: f64,
    objective: Objective,
}

impl<N> SpUcbPolicy<N>
where
    N: Clone + Eq + Hash,
{
    pub const DEFAULT_VARIANCE_BOUND: f64 = 1.0;

    /// `variance_bound` is the constant `D` added under the square root.
    pub fn new(objective: Objective, exploration: f64, variance_bound: f64) -> Self {
        SpUcbPolicy {
            labels: LabelStore::new(),
            exploration,
            variance_bound,
            objective,
        }
    }

    pub fn labels(&self) -> &LabelStore<N> {
        &self.labels
    }

    pub fn score(&self, parent: &NodeLabel, child: &NodeLabel) -> f64 {
        spucb_score(
            parent,
            child,
            self.exploration,
            self.variance_bound,
            self.objective,
        )
    }
}

fn spucb_score(
    parent: &NodeLabel,
    child: &NodeLabel,
    exploration: f64,
    variance_bound: f64,
    objective: Objective,
) -> f64 {
    let child_visits = child.visits().max(1) as f64;
    let deviation = child.squared_deviation().max(0.0);
    let variance_term = ((deviation + variance_bound) / child_visits).sqrt();
    ucb_score(parent, child, exploration, objective) + objective.sign() * variance_term
}

impl<N, A> ActionPolicy<N, A> for SpUcbPolicy<N>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Debug,
{
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError> {
        let (exploration, variance_bound, objective) =
            (self.exploration, self.variance_bound, self.objective);
        select_with_labels(
            &self.labels,
            node,
            successors,
            |parent, child, _| spucb_score(parent, child, exploration, variance_bound, objective),
            |scores| {
                pick_best(scores, objective).ok_or_else(|| PolicyError::NoActionAvailable {
                    node: format!("{node:?}"),
                })
            },
        )
    }
}

impl<N, A> TreePolicy<N, A> for SpUcbPolicy<N>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Debug,
{
    fn update_path(
        &mut self,
        path: &[N],
        score: f64,
        _playout_length: usize,
    ) -> Result<(), PolicyError> {
        self.labels.update_path(path, score)
    }

    fn label(&self, node: &N) -> Option<&NodeLabel> {
        self.labels.get(node)
    }
}
