use std::collections::HashMap;

use weavepath_core::{
    EvaluationError, GenerationError, GoalTester, GraphGenerator, NodeGoal, PathEvaluator,
    SearchInput, SearchPath, StopCheck,
};

use crate::{GraphSpec, GraphSpecError, LabelInterner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Dense index for nodes in a compiled graph.
pub struct NodeKey(usize);

impl NodeKey {
    /// Return the underlying node index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeKey {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Interned action label. Equal labels share a key across the whole graph.
pub struct ActionKey(usize);

impl ActionKey {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
/// Runtime form of a graph spec with resolved edge targets and interned actions.
pub struct CompiledGraph {
    root: NodeKey,
    nodes: Vec<NodeRec>,
    node_ids: Vec<String>,
    node_id_to_key: HashMap<String, NodeKey>,
    actions: LabelInterner,
}

#[derive(Debug, Clone)]
struct NodeRec {
    goal: bool,
    score: Option<f64>,
    edges: Vec<(ActionKey, NodeKey)>,
}

impl CompiledGraph {
    /// Validate and compile a spec.
    pub(crate) fn from_spec(spec: &GraphSpec) -> Result<Self, GraphSpecError> {
        spec.validate()?;

        let mut node_id_to_key = HashMap::with_capacity(spec.nodes.len());
        let mut node_ids = Vec::with_capacity(spec.nodes.len());
        for (idx, node) in spec.nodes.iter().enumerate() {
            node_id_to_key.insert(node.id.clone(), NodeKey::from(idx));
            node_ids.push(node.id.clone());
        }

        let root = node_id_to_key
            .get(&spec.root)
            .copied()
            .ok_or_else(|| GraphSpecError::UnknownRoot {
                root: spec.root.clone(),
            })?;

        let mut actions = LabelInterner::new();
        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for node in &spec.nodes {
            let mut edges = Vec::with_capacity(node.edges.len());
            for edge in &node.edges {
                let to = node_id_to_key.get(&edge.to).copied().ok_or_else(|| {
                    GraphSpecError::UnknownTarget {
                        node: node.id.clone(),
                        action: edge.action.clone(),
                        to: edge.to.clone(),
                    }
                })?;
                edges.push((ActionKey(actions.intern(&edge.action)), to));
            }

            nodes.push(NodeRec {
                goal: node.is_goal(),
                score: node.score,
                edges,
            });
        }

        Ok(Self {
            root,
            nodes,
            node_ids,
            node_id_to_key,
            actions,
        })
    }

    pub fn root_key(&self) -> NodeKey {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.edges.len()).sum()
    }

    pub fn is_goal(&self, key: NodeKey) -> Option<bool> {
        self.nodes.get(key.index()).map(|node| node.goal)
    }

    pub fn score(&self, key: NodeKey) -> Option<f64> {
        self.nodes.get(key.index()).and_then(|node| node.score)
    }

    /// Convert a node key back to its declared id.
    pub fn node_id(&self, key: NodeKey) -> Option<&str> {
        self.node_ids.get(key.index()).map(String::as_str)
    }

    pub fn node_key(&self, id: &str) -> Option<NodeKey> {
        self.node_id_to_key.get(id).copied()
    }

    /// Convert an action key back to its label.
    pub fn action_label(&self, key: ActionKey) -> Option<&str> {
        self.actions.resolve(key.index())
    }

    pub fn action_key(&self, label: &str) -> Option<ActionKey> {
        self.actions.key_of(label).map(ActionKey)
    }

    /// Goal tester over the declared `goal` flags.
    pub fn goal_tester(&self) -> impl GoalTester<NodeKey> + 'static {
        let goals: Vec<bool> = self.nodes.iter().map(|node| node.goal).collect();
        NodeGoal(move |key: &NodeKey| goals.get(key.index()).copied().unwrap_or(false))
    }

    /// Evaluator scoring a path by the declared score of its head node.
    pub fn leaf_score_evaluator(&self) -> LeafScores {
        LeafScores {
            scores: self.nodes.iter().map(|node| node.score).collect(),
            node_ids: self.node_ids.clone(),
        }
    }

    /// Bundle this graph with its goal tester and leaf-score evaluator.
    pub fn search_input(&self) -> SearchInput<CompiledGraph, f64> {
        SearchInput::new(
            self.clone(),
            self.goal_tester(),
            self.leaf_score_evaluator(),
        )
    }

    /// Render a path using declared node ids and action labels.
    pub fn describe_path(&self, path: &SearchPath<NodeKey, ActionKey>) -> String {
        let mut out = self.node_id(*path.root()).unwrap_or("?").to_string();
        for (_, action, to) in path.edges() {
            out.push_str(&format!(
                " -{}-> {}",
                self.action_label(*action).unwrap_or("?"),
                self.node_id(*to).unwrap_or("?")
            ));
        }
        out
    }
}

impl GraphGenerator for CompiledGraph {
    type Node = NodeKey;
    type Action = ActionKey;

    fn root(&self) -> NodeKey {
        self.root
    }

    fn successors(&self, node: &NodeKey) -> Result<Vec<(ActionKey, NodeKey)>, GenerationError> {
        self.nodes
            .get(node.index())
            .map(|rec| rec.edges.clone())
            .ok_or_else(|| GenerationError(format!("unknown node key {}", node.index())))
    }
}

#[derive(Debug, Clone)]
/// Path evaluator returning the declared score of the path's head node.
///
/// Paths ending in a node without a score fail evaluation, so the search
/// substitutes its penalty.
pub struct LeafScores {
    scores: Vec<Option<f64>>,
    node_ids: Vec<String>,
}

impl PathEvaluator<NodeKey, ActionKey, f64> for LeafScores {
    fn evaluate(
        &mut self,
        path: &SearchPath<NodeKey, ActionKey>,
        _stop: &dyn StopCheck,
    ) -> Result<f64, EvaluationError> {
        let head = path.head().index();
        self.scores.get(head).copied().flatten().ok_or_else(|| {
            let id = self.node_ids.get(head).map_or("?", String::as_str);
            EvaluationError::Failed(format!("node '{id}' has no score"))
        })
    }
}
