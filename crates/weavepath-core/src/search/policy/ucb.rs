use std::{f64::consts::SQRT_2, fmt::Debug, hash::Hash};

use crate::search::{
    error::PolicyError,
    policy::{ActionPolicy, LabelStore, NodeLabel, Objective, TreePolicy, select_with_labels},
};

/// Upper-confidence-bound tree policy (UCT).
#[derive(Debug, Clone)]
pub struct UcbPolicy<N> {
    labels: LabelStore<N>,
    exploration: f64,
    objective: Objective,
}

impl<N> UcbPolicy<N>
where
    N: Clone + Eq + Hash,
{
    /// Default exploration constant, `√2`.
    pub const DEFAULT_EXPLORATION: f64 = SQRT_2;

    pub fn new(objective: Objective, exploration: f64) -> Self {
        UcbPolicy {
            labels: LabelStore::new(),
            exploration,
            objective,
        }
    }

    pub fn maximizing() -> Self {
        Self::new(Objective::Maximize, Self::DEFAULT_EXPLORATION)
    }

    pub fn minimizing() -> Self {
        Self::new(Objective::Minimize, Self::DEFAULT_EXPLORATION)
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn labels(&self) -> &LabelStore<N> {
        &self.labels
    }

    /// UCB score of `child` below `parent`.
    pub fn score(&self, parent: &NodeLabel, child: &NodeLabel) -> f64 {
        ucb_score(parent, child, self.exploration, self.objective)
    }
}

/// `mean + sign·C·sqrt(ln(parent visits) / child visits)`.
pub(crate) fn ucb_score(
    parent: &NodeLabel,
    child: &NodeLabel,
    exploration: f64,
    objective: Objective,
) -> f64 {
    let parent_visits = parent.visits().max(1) as f64;
    let child_visits = child.visits().max(1) as f64;
    child.mean() + objective.sign() * exploration * (parent_visits.ln() / child_visits).sqrt()
}

/// Best-scored action in objective direction; ties go to the first one seen.
pub(crate) fn pick_best<A: Clone>(scores: &[(A, f64)], objective: Objective) -> Option<A> {
    let mut best: Option<(&A, f64)> = None;
    for (action, score) in scores {
        best = match best {
            Some((_, best_score)) if !objective.is_better(*score, best_score) => best,
            _ => Some((action, *score)),
        };
    }
    best.map(|(action, _)| action.clone())
}

impl<N, A> ActionPolicy<N, A> for UcbPolicy<N>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Debug,
{
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError> {
        let (exploration, objective) = (self.exploration, self.objective);
        select_with_labels(
            &self.labels,
            node,
            successors,
            |parent, child, _| ucb_score(parent, child, exploration, objective),
            |scores| {
                pick_best(scores, objective).ok_or_else(|| PolicyError::NoActionAvailable {
                    node: format!("{node:?}"),
                })
            },
        )
    }
}

impl<N, A> TreePolicy<N, A> for UcbPolicy<N>
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
