use std::collections::HashMap;

use crate::{
    EvaluationError, GenerationError, GoalTester, GraphGenerator, Mcts, NodeId, PathEvaluator,
    PolicySet, SearchConfig, SearchInput, SearchPath, UcbPolicy, UniformRandomPolicy,
};

/// Small explicit graph: node `0` is the root, edges are `(action, target)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableGraph {
    edges: HashMap<u32, Vec<(u32, u32)>>,
}

impl TableGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn edge(mut self, from: u32, action: u32, to: u32) -> Self {
        self.edges.entry(from).or_default().push((action, to));
        self
    }

    pub(crate) fn is_leaf(&self, node: u32) -> bool {
        self.edges.get(&node).is_none_or(Vec::is_empty)
    }
}

impl GraphGenerator for TableGraph {
    type Node = u32;
    type Action = u32;

    fn root(&self) -> u32 {
        0
    }

    fn successors(&self, node: &u32) -> Result<Vec<(u32, u32)>, GenerationError> {
        Ok(self.edges.get(node).cloned().unwrap_or_default())
    }
}

/// Complete binary tree of bit strings; leaves sit at `depth`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinaryTree {
    pub(crate) depth: usize,
}

impl GraphGenerator for BinaryTree {
    type Node = Vec<u8>;
    type Action = u8;

    fn root(&self) -> Vec<u8> {
        Vec::new()
    }

    fn successors(&self, node: &Vec<u8>) -> Result<Vec<(u8, Vec<u8>)>, GenerationError> {
        if node.len() >= self.depth {
            return Ok(Vec::new());
        }
        Ok((0..2)
            .map(|bit| {
                let mut child = node.clone();
                child.push(bit);
                (bit, child)
            })
            .collect())
    }
}

pub(crate) fn leaf_goal(depth: usize) -> impl Fn(&[Vec<u8>]) -> bool {
    move |path: &[Vec<u8>]| path.last().is_some_and(|node| node.len() == depth)
}

/// Score of a bit-string path head read as a binary number.
pub(crate) fn bits_score(path: &SearchPath<Vec<u8>, u8>) -> Result<f64, EvaluationError> {
    Ok(path
        .head()
        .iter()
        .fold(0.0, |acc, bit| acc * 2.0 + f64::from(*bit)))
}

pub(crate) fn head_score(path: &SearchPath<u32, u32>) -> Result<f64, EvaluationError> {
    Ok(f64::from(*path.head()))
}

pub(crate) type UcbMcts<G> = Mcts<G, f64, UcbPolicy<NodeId>, UniformRandomPolicy>;

pub(crate) fn ucb_engine<G>(
    generator: G,
    goal: impl GoalTester<G::Node> + 'static,
    evaluator: impl PathEvaluator<G::Node, G::Action, f64> + 'static,
    config: SearchConfig,
) -> UcbMcts<G>
where
    G: GraphGenerator,
{
    let policies = PolicySet::new(
        UcbPolicy::new(config.objective, UcbPolicy::<NodeId>::DEFAULT_EXPLORATION),
        UniformRandomPolicy::new(config.seed),
    );
    Mcts::new(
        SearchInput::new(generator, goal, evaluator),
        policies,
        config,
        -1.0,
    )
    .expect("engine should build")
}
