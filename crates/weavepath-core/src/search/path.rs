/// Root-anchored sequence of nodes interleaved with the actions between them.
///
/// `nodes[0]` is the root and `actions[i]` labels the edge
/// `nodes[i] -> nodes[i + 1]`, so `len()` (the number of edges) is always
/// `nodes.len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPath<N, A> {
    nodes: Vec<N>,
    actions: Vec<A>,
}

impl<N, A> SearchPath<N, A> {
    /// A path consisting only of its root.
    pub fn from_root(root: N) -> Self {
        SearchPath {
            nodes: vec![root],
            actions: Vec::new(),
        }
    }

    /// Build a path from parallel node/action lists.
    /// Returns `None` unless there is exactly one more node than actions.
    pub fn from_parts(nodes: Vec<N>, actions: Vec<A>) -> Option<Self> {
        if nodes.is_empty() || nodes.len() != actions.len() + 1 {
            return None;
        }
        Some(SearchPath { nodes, actions })
    }

    /// Append one edge.
    pub fn extend(&mut self, action: A, node: N) {
        self.actions.push(action);
        self.nodes.push(node);
    }

    pub fn root(&self) -> &N {
        &self.nodes[0]
    }

    /// Last node of the path.
    pub fn head(&self) -> &N {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True for a path that is just its root.
    pub fn is_point(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate `(from, action, to)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &A, &N)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, action)| (&self.nodes[i], action, &self.nodes[i + 1]))
    }

    pub fn into_parts(self) -> (Vec<N>, Vec<A>) {
        (self.nodes, self.actions)
    }
}

/// A path together with the score the evaluator (or the cache) assigned it.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedPath<N, A, V> {
    pub path: SearchPath<N, A>,
    pub score: V,
    /// Whether the head of the path is a goal node.
    pub is_goal: bool,
    /// Whether the score came from the score cache.
    pub cached: bool,
    /// Whether the score is the penalty substituted for a failed evaluation.
    pub evaluation_failed: bool,
}
