use std::{fmt::Debug, hash::Hash};

use crate::search::{
    error::{EvaluationError, GenerationError},
    interrupt::StopCheck,
    path::SearchPath,
};

/// Lazily generates the search graph.
///
/// `successors` must be idempotent: calling it twice for the same node
/// yields the same actions, and actions are pairwise distinct per node.
pub trait GraphGenerator {
    type Node: Clone + Eq + Hash + Debug;
    type Action: Clone + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    fn successors(
        &self,
        node: &Self::Node,
    ) -> Result<Vec<(Self::Action, Self::Node)>, GenerationError>;
}

/// Decides whether a path ends in a goal.
pub trait GoalTester<N> {
    fn is_goal(&self, path: &[N]) -> bool;
}

impl<N, F> GoalTester<N> for F
where
    F: Fn(&[N]) -> bool,
{
    fn is_goal(&self, path: &[N]) -> bool {
        self(path)
    }
}

/// Adapts a predicate on the last node of a path into a goal tester.
#[derive(Debug, Clone, Copy)]
pub struct NodeGoal<F>(pub F);

impl<N, F> GoalTester<N> for NodeGoal<F>
where
    F: Fn(&N) -> bool,
{
    fn is_goal(&self, path: &[N]) -> bool {
        path.last().is_some_and(|node| (self.0)(node))
    }
}

/// Scores a finished playout path.
///
/// May be slow; implementations should poll `stop` and return
/// `EvaluationError::Interrupted` once it fires.
pub trait PathEvaluator<N, A, V> {
    fn evaluate(&mut self, path: &SearchPath<N, A>, stop: &dyn StopCheck)
    -> Result<V, EvaluationError>;
}

impl<N, A, V, F> PathEvaluator<N, A, V> for F
where
    F: FnMut(&SearchPath<N, A>) -> Result<V, EvaluationError>,
{
    fn evaluate(
        &mut self,
        path: &SearchPath<N, A>,
        _stop: &dyn StopCheck,
    ) -> Result<V, EvaluationError> {
        self(path)
    }
}

/// The three external collaborators a search needs.
pub struct SearchInput<G, V>
where
    G: GraphGenerator,
{
    pub generator: G,
    pub goal_tester: Box<dyn GoalTester<G::Node>>,
    pub evaluator: Box<dyn PathEvaluator<G::Node, G::Action, V>>,
}

impl<G, V> SearchInput<G, V>
where
    G: GraphGenerator,
{
    pub fn new(
        generator: G,
        goal_tester: impl GoalTester<G::Node> + 'static,
        evaluator: impl PathEvaluator<G::Node, G::Action, V> + 'static,
    ) -> Self {
        SearchInput {
            generator,
            goal_tester: Box::new(goal_tester),
            evaluator: Box::new(evaluator),
        }
    }
}

/// Scores produced by an evaluator.
///
/// Scores are compared with `PartialOrd` to rank solutions and converted to
/// `f64` for the tree policy.
pub trait Score: Copy + PartialOrd + Into<f64> + Debug {}

impl<V> Score for V where V: Copy + PartialOrd + Into<f64> + Debug {}
