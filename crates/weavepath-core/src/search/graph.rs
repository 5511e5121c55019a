use std::{collections::HashSet, fmt::Debug, hash::Hash};

use serde::Serialize;

use crate::search::{
    arena::Arena,
    error::{GraphError, Halt},
    ids::NodeId,
    interrupt::StopCheck,
    path::SearchPath,
};

/// Expansion status of a node in the explored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionState {
    /// Successors not generated yet.
    Unexpanded,
    /// Successors generated and attached.
    Expanded,
    /// Goal node; never expanded, treated as a leaf.
    Closed,
}

/// Change notification sent to a graph hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphChange {
    Attached { parent: NodeId, child: NodeId },
    Visited(NodeId),
    Closed(NodeId),
    DeadEnd(NodeId),
    FullyExplored(NodeId),
}

/// Callback notified of every structural or bookkeeping change.
pub type GraphHook = Box<dyn FnMut(GraphChange)>;

/// One node of the explored graph.
#[derive(Debug, Clone)]
pub struct GraphNode<N, A> {
    state: N,
    depth: usize,
    parent: Option<NodeId>,
    action: Option<A>,
    children: Vec<NodeId>,
    expansion_state: ExpansionState,
    visited: bool,
    dead_end: bool,
    fully_explored: bool,
}

impl<N, A> GraphNode<N, A> {
    fn new(state: N, depth: usize, parent: Option<NodeId>, action: Option<A>) -> Self {
        GraphNode {
            state,
            depth,
            parent,
            action,
            children: Vec::new(),
            expansion_state: ExpansionState::Unexpanded,
            visited: false,
            dead_end: false,
            fully_explored: false,
        }
    }

    pub fn state(&self) -> &N {
        &self.state
    }

    /// Number of edges between the root and this node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Label of the edge from the parent, `None` for the root.
    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn expansion_state(&self) -> ExpansionState {
        self.expansion_state
    }

    pub fn is_unexpanded(&self) -> bool {
        self.expansion_state == ExpansionState::Unexpanded
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn is_dead_end(&self) -> bool {
        self.dead_end
    }

    pub fn is_fully_explored(&self) -> bool {
        self.fully_explored
    }
}

/// Incrementally grown single-rooted search tree plus its bookkeeping sets.
///
/// Nodes are never removed. Every node except the root has exactly one
/// recorded parent, so equal states reached via different paths live in
/// different nodes.
pub struct ExploredGraph<N, A> {
    arena: Arena<GraphNode<N, A>>,
    unexpanded: usize,
    expansions: usize,
    hook: Option<GraphHook>,
}

impl<N, A> ExploredGraph<N, A>
where
    N: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    /// Create a graph containing only the unexpanded root.
    pub fn new(root: N) -> Self {
        let arena = Arena::with_root(GraphNode::new(root, 0, None, None));
        ExploredGraph {
            arena,
            unexpanded: 1,
            expansions: 0,
            hook: None,
        }
    }

    pub(crate) fn set_hook(&mut self, hook: Option<GraphHook>) {
        self.hook = hook;
    }

    /// The root is always at index 0.
    pub fn root_id(&self) -> NodeId {
        NodeId::from(0)
    }

    /// Return how many nodes exist in the graph arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Number of nodes whose successors have not been generated.
    pub fn unexpanded_count(&self) -> usize {
        self.unexpanded
    }

    /// Number of nodes that left the unexpanded set (expanded or closed).
    pub fn expansion_count(&self) -> usize {
        self.expansions
    }

    pub fn node(&self, node_id: NodeId) -> Result<&GraphNode<N, A>, GraphError> {
        self.arena
            .get(node_id)
            .ok_or(GraphError::MissingNode { node_id })
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut GraphNode<N, A>, GraphError> {
        self.arena
            .get_mut(node_id)
            .ok_or(GraphError::MissingNode { node_id })
    }

    pub fn state(&self, node_id: NodeId) -> Result<&N, GraphError> {
        self.node(node_id).map(GraphNode::state)
    }

    /// Iterate all nodes in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode<N, A>)> {
        self.arena.entries()
    }

    /// `(action, child)` pairs of a node in generation order.
    pub fn child_edges(&self, node_id: NodeId) -> Result<Vec<(A, NodeId)>, GraphError> {
        let node = self.node(node_id)?;
        node.children
            .iter()
            .map(|child_id| {
                let child = self.node(*child_id)?;
                let action = child.action.clone().ok_or(GraphError::MissingNode {
                    node_id: *child_id,
                })?;
                Ok((action, *child_id))
            })
            .collect()
    }

    /// Child of `node_id` reached via `action`.
    pub fn child_for_action(&self, node_id: NodeId, action: &A) -> Result<Option<NodeId>, GraphError> {
        let node = self.node(node_id)?;
        for child_id in &node.children {
            if self.node(*child_id)?.action.as_ref() == Some(action) {
                return Ok(Some(*child_id));
            }
        }
        Ok(None)
    }

    /// States from the root down to `node_id`, root first.
    pub fn states_to(&self, node_id: NodeId) -> Result<Vec<N>, GraphError> {
        self.ids_to(node_id)?
            .into_iter()
            .map(|id| self.state(id).cloned())
            .collect()
    }

    /// Path from the root down to `node_id`.
    pub fn path_to(&self, node_id: NodeId) -> Result<SearchPath<N, A>, GraphError> {
        let ids = self.ids_to(node_id)?;
        let mut path = SearchPath::from_root(self.state(self.root_id())?.clone());
        for id in ids.into_iter().skip(1) {
            let node = self.node(id)?;
            let action = node
                .action
                .clone()
                .ok_or(GraphError::MissingNode { node_id: id })?;
            path.extend(action, node.state.clone());
        }
        Ok(path)
    }

    /// Node ids from the root down to `node_id`, root first.
    pub fn ids_to(&self, node_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut ids = vec![node_id];
        let mut current = self.node(node_id)?.parent;
        while let Some(parent) = current {
            ids.push(parent);
            current = self.node(parent)?.parent;
        }
        ids.reverse();
        Ok(ids)
    }

    /// Attach `successors` below an unexpanded node.
    ///
    /// Actions are checked to be pairwise distinct before anything changes.
    /// New child records are staged while `stop` is polled every
    /// `check_interval` nodes and committed only once all of them are
    /// built, so an interruption leaves the node unexpanded and the graph
    /// untouched.
    pub(crate) fn expand(
        &mut self,
        node_id: NodeId,
        successors: Vec<(A, N)>,
        stop: &dyn StopCheck,
        check_interval: usize,
    ) -> Result<Vec<NodeId>, Halt> {
        let depth = {
            let node = self.node(node_id)?;
            if !node.is_unexpanded() {
                return Err(GraphError::AlreadyExpanded { node_id }.into());
            }
            node.depth
        };

        let mut seen = HashSet::with_capacity(successors.len());
        for (action, _) in &successors {
            if !seen.insert(action) {
                return Err(GraphError::DuplicateAction {
                    node: format!("{node_id:?}"),
                    action: format!("{action:?}"),
                }
                .into());
            }
        }

        let interval = check_interval.max(1);
        let mut staged = Vec::with_capacity(successors.len());
        for (processed, (action, child)) in successors.into_iter().enumerate() {
            if processed % interval == 0 {
                if let Some(interruption) = stop.poll() {
                    return Err(Halt::Interrupted(interruption));
                }
            }
            staged.push(GraphNode::new(child, depth + 1, Some(node_id), Some(action)));
        }

        let children = self.arena.commit(staged);
        let count = children.len();

        let node = self.node_mut(node_id)?;
        node.children = children.clone();
        node.expansion_state = ExpansionState::Expanded;
        self.unexpanded = self.unexpanded - 1 + count;
        self.expansions += 1;

        for child in &children {
            self.notify(GraphChange::Attached {
                parent: node_id,
                child: *child,
            });
        }
        Ok(children)
    }

    /// Take a goal node out of the unexpanded set without generating its
    /// successors, and mark it fully explored.
    pub(crate) fn close(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let node = self.node_mut(node_id)?;
        if !node.is_unexpanded() {
            return Err(GraphError::AlreadyExpanded { node_id });
        }
        node.expansion_state = ExpansionState::Closed;
        self.unexpanded -= 1;
        self.expansions += 1;
        self.notify(GraphChange::Closed(node_id));
        self.propagate_fully_explored(node_id)?;
        Ok(())
    }

    pub(crate) fn mark_visited(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let node = self.node_mut(node_id)?;
        if !node.visited {
            node.visited = true;
            self.notify(GraphChange::Visited(node_id));
        }
        Ok(())
    }

    pub(crate) fn mark_dead_end(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let node = self.node_mut(node_id)?;
        if !node.dead_end {
            node.dead_end = true;
            self.notify(GraphChange::DeadEnd(node_id));
        }
        Ok(())
    }

    /// Mark `node_id` fully explored if all its known children are, and
    /// walk upwards while that keeps holding. Returns the newly marked nodes.
    pub(crate) fn propagate_fully_explored(
        &mut self,
        node_id: NodeId,
    ) -> Result<Vec<NodeId>, GraphError> {
        let mut marked = Vec::new();
        let mut current = Some(node_id);

        while let Some(id) = current {
            let node = self.node(id)?;
            if node.fully_explored || node.is_unexpanded() {
                break;
            }
            let mut complete = true;
            for child in &node.children {
                if !self.node(*child)?.fully_explored {
                    complete = false;
                    break;
                }
            }
            if !complete {
                break;
            }

            let parent = node.parent;
            self.node_mut(id)?.fully_explored = true;
            self.notify(GraphChange::FullyExplored(id));
            marked.push(id);
            current = parent;
        }
        Ok(marked)
    }

    fn notify(&mut self, change: GraphChange) {
        if let Some(hook) = self.hook.as_mut() {
            hook(change);
        }
    }

    /// Verify the bookkeeping invariants, describing the first violation.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut unexpanded = 0;
        for (id, node) in self.nodes() {
            if node.is_unexpanded() {
                unexpanded += 1;
                if node.visited {
                    return Err(format!("node {} is visited but unexpanded", id.index()));
                }
                if !node.children.is_empty() {
                    return Err(format!("unexpanded node {} has children", id.index()));
                }
            }
            if node.dead_end && node.is_unexpanded() {
                return Err(format!("dead end {} is unexpanded", id.index()));
            }

            let mut actions = HashSet::new();
            let mut all_children_explored = true;
            for child_id in &node.children {
                let child = self.node(*child_id).map_err(|err| err.to_string())?;
                if child.parent != Some(id) {
                    return Err(format!(
                        "child {} does not point back to parent {}",
                        child_id.index(),
                        id.index()
                    ));
                }
                if !actions.insert(child.action.clone()) {
                    return Err(format!("node {} has a duplicate action", id.index()));
                }
                all_children_explored &= child.fully_explored;
            }

            if !node.is_unexpanded() && node.fully_explored != all_children_explored {
                return Err(format!(
                    "node {} fully explored flag is {} but children say {}",
                    id.index(),
                    node.fully_explored,
                    all_children_explored
                ));
            }
        }

        if unexpanded != self.unexpanded {
            return Err(format!(
                "unexpanded counter {} disagrees with {} unexpanded nodes",
                self.unexpanded, unexpanded
            ));
        }
        Ok(())
    }
}
