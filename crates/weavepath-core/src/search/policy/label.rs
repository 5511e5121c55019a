use std::{collections::HashMap, hash::Hash};

use serde::Serialize;

use crate::search::error::PolicyError;

/// Running statistics a tree policy keeps per node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeLabel {
    visits: u64,
    mean: f64,
    sum_of_squares: f64,
}

impl NodeLabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label carrying a visit count only, used as a stand-in parent.
    pub(crate) fn with_visits(visits: u64) -> Self {
        NodeLabel {
            visits,
            ..Self::default()
        }
    }

    /// Retrieve the amount of playouts that passed through the node.
    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Mean of all recorded scores, `0.0` while unvisited.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.sum_of_squares
    }

    /// `Σx² - n·mean²`, the unnormalized sample variance.
    pub fn squared_deviation(&self) -> f64 {
        self.sum_of_squares - self.visits as f64 * self.mean * self.mean
    }

    /// Fold one observed score into the label.
    pub fn record(&mut self, score: f64) {
        let visits = self.visits as f64;
        self.mean = (self.mean * visits + score) / (visits + 1.0);
        self.sum_of_squares += score * score;
        self.visits += 1;
    }
}

/// Node labels of one tree policy, created lazily on first update.
#[derive(Debug, Clone)]
pub struct LabelStore<N> {
    labels: HashMap<N, NodeLabel>,
}

impl<N> Default for LabelStore<N> {
    fn default() -> Self {
        LabelStore {
            labels: HashMap::new(),
        }
    }
}

impl<N> LabelStore<N>
where
    N: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &N) -> Option<&NodeLabel> {
        self.labels.get(node)
    }

    /// Number of labelled nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Record `score` on every node of `path`, then check that visit counts
    /// never increase from the root towards the leaf.
    pub fn update_path(&mut self, path: &[N], score: f64) -> Result<(), PolicyError> {
        if !score.is_finite() {
            return Err(PolicyError::NonFiniteScore { score });
        }

        for node in path {
            self.labels.entry(node.clone()).or_default().record(score);
        }

        let mut parent_visits = u64::MAX;
        for (depth, node) in path.iter().enumerate() {
            let visits = self.labels.get(node).map_or(0, NodeLabel::visits);
            if visits > parent_visits {
                return Err(PolicyError::InconsistentVisits {
                    depth,
                    parent_visits,
                    child_visits: visits,
                });
            }
            parent_visits = visits;
        }
        Ok(())
    }
}
