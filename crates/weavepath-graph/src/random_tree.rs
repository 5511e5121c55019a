use std::ops::RangeInclusive;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use weavepath_core::{
    EvaluationError, GenerationError, GoalTester, GraphGenerator, NodeGoal, PathEvaluator,
    SearchInput, SearchPath, StopCheck,
};

use crate::GraphSpecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Node of a [`RandomTree`]; `key` seeds its successors.
pub struct RandomNode {
    pub depth: usize,
    pub key: u64,
}

#[derive(Debug, Clone)]
/// Seeded synthetic tree, unbounded or capped at `max_depth`.
///
/// Successors are derived from the seed and the node key alone, so asking
/// twice for the same node yields the same children. Nodes at `max_depth`
/// are goal leaves; inner nodes below the root become dead ends with
/// `dead_end_probability`.
pub struct RandomTree {
    seed: u64,
    branching: RangeInclusive<usize>,
    max_depth: Option<usize>,
    dead_end_probability: f64,
}

impl RandomTree {
    pub fn new(
        seed: u64,
        branching: RangeInclusive<usize>,
        max_depth: Option<usize>,
    ) -> Result<Self, GraphSpecError> {
        if branching.is_empty() || *branching.start() == 0 {
            return Err(GraphSpecError::InvalidRandomTree {
                reason: format!(
                    "branching {}..={} must be a non-empty range starting at 1 or more",
                    branching.start(),
                    branching.end()
                ),
            });
        }

        Ok(Self {
            seed,
            branching,
            max_depth,
            dead_end_probability: 0.0,
        })
    }

    pub fn with_dead_ends(mut self, probability: f64) -> Result<Self, GraphSpecError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GraphSpecError::InvalidRandomTree {
                reason: format!("dead end probability {probability} is outside [0, 1]"),
            });
        }
        self.dead_end_probability = probability;
        Ok(self)
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn is_goal(&self, node: &RandomNode) -> bool {
        self.max_depth == Some(node.depth)
    }

    pub fn goal_tester(&self) -> impl GoalTester<RandomNode> + 'static {
        let max_depth = self.max_depth;
        NodeGoal(move |node: &RandomNode| max_depth == Some(node.depth))
    }

    pub fn leaf_score_evaluator(&self) -> RandomTreeScores {
        RandomTreeScores { seed: self.seed }
    }

    pub fn search_input(&self) -> SearchInput<RandomTree, f64> {
        SearchInput::new(self.clone(), self.goal_tester(), self.leaf_score_evaluator())
    }

    fn node_rng(&self, node: &RandomNode) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed ^ node.key)
    }
}

impl GraphGenerator for RandomTree {
    type Node = RandomNode;
    type Action = u32;

    fn root(&self) -> RandomNode {
        RandomNode { depth: 0, key: 0 }
    }

    fn successors(&self, node: &RandomNode) -> Result<Vec<(u32, RandomNode)>, GenerationError> {
        if self.is_goal(node) {
            return Ok(Vec::new());
        }

        let mut rng = self.node_rng(node);
        if node.depth > 0 && rng.gen_bool(self.dead_end_probability) {
            return Ok(Vec::new());
        }

        let count = rng.gen_range(self.branching.clone());
        Ok((0..count as u32)
            .map(|action| {
                let child = RandomNode {
                    depth: node.depth + 1,
                    key: rng.next_u64(),
                };
                (action, child)
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
/// Deterministic score in `[0, 1)` per head node.
pub struct RandomTreeScores {
    seed: u64,
}

impl RandomTreeScores {
    pub fn score_of(&self, node: &RandomNode) -> f64 {
        ChaCha8Rng::seed_from_u64(self.seed.rotate_left(32) ^ node.key).gen_range(0.0..1.0)
    }
}

impl PathEvaluator<RandomNode, u32, f64> for RandomTreeScores {
    fn evaluate(
        &mut self,
        path: &SearchPath<RandomNode, u32>,
        stop: &dyn StopCheck,
    ) -> Result<f64, EvaluationError> {
        if let Some(kind) = stop.poll() {
            return Err(EvaluationError::Interrupted(kind));
        }
        Ok(self.score_of(path.head()))
    }
}
