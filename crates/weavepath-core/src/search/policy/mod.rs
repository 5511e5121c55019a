//! Action-selection policies.
//!
//! A default policy only picks actions. A tree policy additionally learns
//! from the scores of finished playouts through `update_path`.

mod config;
mod label;
mod plk;
mod random;
mod spucb;
mod ucb;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::search::error::PolicyError;

pub use config::TreePolicyConfig;
pub use label::{LabelStore, NodeLabel};
pub use plk::{PlkPolicy, pick_weighted};
pub use random::UniformRandomPolicy;
pub use spucb::SpUcbPolicy;
pub use ucb::UcbPolicy;

/// Whether higher or lower scores are better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Maximize,
    Minimize,
}

impl Objective {
    /// `+1.0` when maximizing, `-1.0` when minimizing.
    pub fn sign(self) -> f64 {
        match self {
            Objective::Maximize => 1.0,
            Objective::Minimize => -1.0,
        }
    }

    /// Strict improvement of `candidate` over `incumbent`.
    pub fn is_better<V: PartialOrd>(self, candidate: V, incumbent: V) -> bool {
        match self {
            Objective::Maximize => candidate > incumbent,
            Objective::Minimize => candidate < incumbent,
        }
    }
}

/// Picks one action out of a non-empty list of `(action, successor)` pairs.
pub trait ActionPolicy<N, A> {
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError>;
}

/// A policy that learns from playout scores.
pub trait TreePolicy<N, A>: ActionPolicy<N, A> {
    /// Record `score` on every node of `path` (root first).
    ///
    /// `playout_length` is the number of edges of the complete playout,
    /// which may extend beyond `path`.
    fn update_path(&mut self, path: &[N], score: f64, playout_length: usize)
    -> Result<(), PolicyError>;

    /// Statistics recorded for `node`, if it was ever updated.
    fn label(&self, node: &N) -> Option<&NodeLabel>;
}

impl<N, A, P> ActionPolicy<N, A> for Box<P>
where
    P: ActionPolicy<N, A> + ?Sized,
{
    fn choose_action(&mut self, node: &N, successors: &[(A, N)]) -> Result<A, PolicyError> {
        (**self).choose_action(node, successors)
    }
}

impl<N, A, P> TreePolicy<N, A> for Box<P>
where
    P: TreePolicy<N, A> + ?Sized,
{
    fn update_path(
        &mut self,
        path: &[N],
        score: f64,
        playout_length: usize,
    ) -> Result<(), PolicyError> {
        (**self).update_path(path, score, playout_length)
    }

    fn label(&self, node: &N) -> Option<&NodeLabel> {
        (**self).label(node)
    }
}

/// Fail with `NoActionAvailable` on an empty successor list.
pub(crate) fn ensure_choices<N: Debug, A>(
    node: &N,
    successors: &[(A, N)],
) -> Result<(), PolicyError> {
    if successors.is_empty() {
        return Err(PolicyError::NoActionAvailable {
            node: format!("{node:?}"),
        });
    }
    Ok(())
}

/// Shared selection skeleton of the label-based tree policies: try every
/// child without a label first, otherwise hand per-action scores to
/// `pick`.
pub(crate) fn select_with_labels<N, A, S, P>(
    labels: &LabelStore<N>,
    node: &N,
    successors: &[(A, N)],
    mut score: S,
    pick: P,
) -> Result<A, PolicyError>
where
    N: Clone + Eq + std::hash::Hash + Debug,
    A: Clone + Debug,
    S: FnMut(&NodeLabel, &NodeLabel, &N) -> f64,
    P: FnOnce(&[(A, f64)]) -> Result<A, PolicyError>,
{
    ensure_choices(node, successors)?;

    if let Some((action, _)) = successors
        .iter()
        .find(|(_, child)| labels.get(child).is_none())
    {
        return Ok(action.clone());
    }

    let parent = labels.get(node).copied().unwrap_or_else(|| {
        // Unlabelled parent with labelled children only happens for callers
        // that update sub-paths; fall back to the children's total.
        let visits = successors
            .iter()
            .filter_map(|(_, child)| labels.get(child))
            .map(NodeLabel::visits)
            .sum();
        NodeLabel::with_visits(visits)
    });

    let scores: Vec<(A, f64)> = successors
        .iter()
        .filter_map(|(action, child)| {
            labels
                .get(child)
                .map(|label| (action.clone(), score(&parent, label, child)))
        })
        .collect();

    pick(&scores)
}
