use std::{fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};

use crate::search::policy::{Objective, PlkPolicy, SpUcbPolicy, TreePolicy, UcbPolicy};

/// Serializable choice of tree policy, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreePolicyConfig {
    Ucb {
        #[serde(default = "default_exploration")]
        exploration: f64,
    },
    Spucb {
        #[serde(default = "default_exploration")]
        exploration: f64,
        #[serde(default = "default_variance_bound")]
        variance_bound: f64,
    },
    Plk {
        #[serde(default = "default_k")]
        k: usize,
        #[serde(default)]
        seed: u64,
    },
}

fn default_exploration() -> f64 {
    std::f64::consts::SQRT_2
}

fn default_variance_bound() -> f64 {
    1.0
}

fn default_k() -> usize {
    3
}

impl Default for TreePolicyConfig {
    fn default() -> Self {
        TreePolicyConfig::Ucb {
            exploration: default_exploration(),
        }
    }
}

impl TreePolicyConfig {
    /// Build the configured policy for nodes of type `N`.
    pub fn build<N, A>(&self, objective: Objective) -> Box<dyn TreePolicy<N, A>>
    where
        N: Clone + Eq + Hash + Debug + 'static,
        A: Clone + Debug + 'static,
    {
        match *self {
            TreePolicyConfig::Ucb { exploration } => {
                Box::new(UcbPolicy::new(objective, exploration))
            }
            TreePolicyConfig::Spucb {
                exploration,
                variance_bound,
            } => Box::new(SpUcbPolicy::new(objective, exploration, variance_bound)),
            TreePolicyConfig::Plk { k, seed } => Box::new(PlkPolicy::new(objective, k, seed)),
        }
    }

    /// Human readable reason the parameters are unusable, if any.
    pub(crate) fn invalid_reason(&self) -> Option<&'static str> {
        match *self {
            TreePolicyConfig::Ucb { exploration } if !exploration.is_finite() || exploration < 0.0 => {
                Some("tree_policy.exploration must be finite and >= 0")
            }
            TreePolicyConfig::Spucb {
                exploration,
                variance_bound,
            } => {
                if !exploration.is_finite() || exploration < 0.0 {
                    Some("tree_policy.exploration must be finite and >= 0")
                } else if !variance_bound.is_finite() || variance_bound < 0.0 {
                    Some("tree_policy.variance_bound must be finite and >= 0")
                } else {
                    None
                }
            }
            TreePolicyConfig::Plk { k: 0, .. } => Some("tree_policy.k must be greater than 0"),
            _ => None,
        }
    }
}
