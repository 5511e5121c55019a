use std::{collections::HashMap, fmt::Debug, hash::Hash};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::search::{
    error::PolicyError,
    policy::{ActionPolicy, LabelStore, NodeLabel, Objective, TreePolicy, select_with_labels},
};

/// Plackett-Luce style top-k policy.
///
/// Each child is rated by how close the mean of its best `k` scores comes to
/// the best score seen at the parent, and the action is drawn with
/// probability proportional to that rating.
#[derive(Debug, Clone)]
pub struct PlkPolicy<N> {
    labels: LabelStore<N>,
    best_scores: HashMap<N, Vec<f64>>,
    k: usize,
    objective: Objective,
    rng: ChaCha8Rng,
}

impl<N> PlkPolicy<N>
where
    N: Clone + Eq + Hash,
{
    pub const DEFAULT_K: usize = 3;

    pub fn new(objective: Objective, k: usize, seed: u64) -> Self {
        PlkPolicy {
            labels: LabelStore::new(),
            best_scores: HashMap::new(),
            k: k.max(1),
            objective,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn labels(&self) -> &LabelStore<N> {
        &self.labels
    }

    /// Best `k` scores observed below `node`, best first.
    pub fn best_scores(&self, node: &N) -> &[f64] {
        self.best_scores.get(node).map_or(&[], Vec::as_slice)
    }

    /// Rating of `child` given the best score observed at its parent.
    pub fn rating(&self, parent_best: f64, child: &N) -> f64 {
        let Some(label) = self.labels.get(child) else {
            return 0.0;
        };
        plk_rating(parent_best, self.best_scores(child), label.visits())
    }

    fn remember(&mut self, node: &N, score: f64) {
        let objective = self.objective;
        let k = self.k;
        let scores = self.best_scores.entry(node.clone()).or_default();
        let position = scores
            .iter()
            .position(|existing| objective.is_better(score, *existing))
            .unwrap_or(scores.len());
        scores.insert(position, score);
        scores.truncate(k);
    }
}

/// `1 - distance^(1/n)` where `distance` separates the child's top-k mean
/// from the parent's best score.
fn plk_rating(parent_best: f64, child_best: &[f64], visits: u64) -> f64 {
    if child_best.is_empty() || visits == 0 {
        return 0.0;
    }
    let sub_mean = child_best.iter().sum::<f64>() / child_best.len() as f64;
    let distance = (parent_best - sub_mean).abs();
    1.0 - distance.powf(1.0 / visits as f64)
}

/// Draw uniformly in `[0, Σ weights)` and return the first action whose
/// cumulative weight exceeds the draw. All-zero weights fall back to a
/// uniform choice.
pub fn pick_weighted<A: Clone, R: Rng + ?Sized>(weights: &[(A, f64)], rng: &mut R) -> Option<A> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
    if total <= 0.0 {
        let index = rng.gen_range(0..weights.len());
        return Some(weights[index].0.clone());
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for (action, weight) in weights {
        cumulative += weight;
        if cumulative > draw {
            return Some(action.clone());
        }
    }
    weights.last().map(|(action, _)| action.clone())
}

impl<N, A> ActionPolicy<N, A> for PlkPolicy<N>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Debug,
{
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError> {
        let parent_best = self.best_scores(node).first().copied();
        let best_scores = &self.best_scores;
        let rng = &mut self.rng;

        select_with_labels(
            &self.labels,
            node,
            successors,
            |_, child_label: &NodeLabel, child| {
                let child_best = best_scores.get(child).map_or(&[][..], Vec::as_slice);
                let parent_best = parent_best.or(child_best.first().copied()).unwrap_or(0.0);
                plk_rating(parent_best, child_best, child_label.visits())
            },
            |scores| {
                if let Some((action, score)) = scores.iter().find(|(_, score)| *score < 0.0) {
                    return Err(PolicyError::NegativeScore {
                        action: format!("{action:?}"),
                        score: *score,
                    });
                }
                pick_weighted(scores, rng).ok_or_else(|| PolicyError::NoActionAvailable {
                    node: format!("{node:?}"),
                })
            },
        )
    }
}

impl<N, A> TreePolicy<N, A> for PlkPolicy<N>
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
        self.labels.update_path(path, score)?;
        for node in path {
            self.remember(node, score);
        }
        Ok(())
    }

    fn label(&self, node: &N) -> Option<&NodeLabel> {
        self.labels.get(node)
    }
}
