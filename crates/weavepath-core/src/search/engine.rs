use std::{collections::HashMap, time::Instant};

use tracing::{debug, error, info, trace, warn};

use crate::search::{
    config::SearchConfig,
    error::{EvaluationError, GraphError, Halt, PolicyError, SearchError},
    graph::{ExpansionState, ExploredGraph, GraphChange, GraphHook},
    ids::NodeId,
    interrupt::{Deadline, Interruption, NeverStop, StopCheck},
    metrics::{PlayoutHook, PlayoutMetrics, PlayoutTimings, SearchMetrics},
    path::{EvaluatedPath, SearchPath},
    playout::{SimulationEnd, simulate},
    policy::{ActionPolicy, TreePolicy, UniformRandomPolicy, ensure_choices},
    problem::{GoalTester, GraphGenerator, PathEvaluator, Score, SearchInput},
    snapshot::GraphSnapshot,
};

/// Tree and default policy of one engine, plus an optional observer of
/// explored-graph changes.
pub struct PolicySet<T, D> {
    pub tree: T,
    pub default: D,
    pub graph_hook: Option<GraphHook>,
}

impl<T, D> PolicySet<T, D> {
    pub fn new(tree: T, default: D) -> Self {
        PolicySet {
            tree,
            default,
            graph_hook: None,
        }
    }

    pub fn with_graph_hook(mut self, hook: impl FnMut(GraphChange) + 'static) -> Self {
        self.graph_hook = Some(Box::new(hook));
        self
    }
}

impl<A> PolicySet<Box<dyn TreePolicy<NodeId, A>>, UniformRandomPolicy>
where
    A: Clone + std::fmt::Debug + 'static,
{
    /// Tree policy from `config.tree_policy`, uniform default policy seeded
    /// with `config.seed`.
    pub fn from_config(config: &SearchConfig) -> Self {
        PolicySet::new(
            config.tree_policy.build(config.objective),
            UniformRandomPolicy::new(config.seed),
        )
    }
}

/// Engine driven entirely by `SearchConfig`.
pub type ConfiguredMcts<G, V> = Mcts<
    G,
    V,
    Box<dyn TreePolicy<NodeId, <G as GraphGenerator>::Action>>,
    UniformRandomPolicy,
>;

/// Lifecycle of an engine. `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    Active,
    Terminated,
}

/// One step of the search as observed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent<N, A, V> {
    /// First event of every run.
    Initialized { root: N },
    /// A newly evaluated goal path.
    SolutionFound(EvaluatedPath<N, A, V>),
    /// Any other finished playout: partial paths, cache hits, failed evaluations.
    PlayoutFinished(EvaluatedPath<N, A, V>),
    /// The search ran out of work or hit its playout limit.
    Terminated,
    Cancelled,
    TimedOut,
}

impl<N, A, V> SearchEvent<N, A, V> {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchEvent::Terminated | SearchEvent::Cancelled | SearchEvent::TimedOut
        )
    }
}

/// How a complete run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
    TimedOut,
}

/// Result of `Mcts::run`.
#[derive(Debug, Clone)]
pub struct SearchOutcome<N, A, V> {
    pub status: RunStatus,
    pub best: Option<EvaluatedPath<N, A, V>>,
    pub playouts: usize,
    pub metrics: SearchMetrics,
}

/// External stop source combined with the configured wall-clock budget.
struct Signals<'a> {
    external: &'a dyn StopCheck,
    deadline: Option<Deadline>,
}

impl StopCheck for Signals<'_> {
    fn poll(&self) -> Option<Interruption> {
        self.external
            .poll()
            .or_else(|| self.deadline.and_then(|deadline| deadline.poll()))
    }
}

#[derive(Debug, Default)]
struct PlayoutStats {
    tree_policy_invocations: usize,
    default_policy_invocations: usize,
    dead_end_restarts: usize,
    timings: PlayoutTimings,
}

struct DrawnPlayout<N, A> {
    /// Explored-graph nodes the tree policy learns from, root first.
    tree_ids: Vec<NodeId>,
    path: SearchPath<N, A>,
    is_goal: bool,
}

/// Monte-Carlo tree search over a lazily generated graph.
///
/// Each call to `next_event` performs at most one playout: selection with
/// the tree policy, expansion of one untried child, simulation with the
/// default policy, then evaluation and backpropagation of the score.
pub struct Mcts<G, V, T, D>
where
    G: GraphGenerator,
{
    generator: G,
    goal_tester: Box<dyn GoalTester<G::Node>>,
    evaluator: Box<dyn PathEvaluator<G::Node, G::Action, V>>,
    tree_policy: T,
    default_policy: D,
    config: SearchConfig,
    penalty: V,
    stop: Box<dyn StopCheck>,
    deadline: Option<Deadline>,
    graph: ExploredGraph<G::Node, G::Action>,
    score_cache: HashMap<Vec<G::Node>, V>,
    prefix: Vec<NodeId>,
    state: EngineState,
    tree_policy_reached_leaf: bool,
    best: Option<EvaluatedPath<G::Node, G::Action, V>>,
    metrics: SearchMetrics,
    hooks: Vec<PlayoutHook>,
    reported_progress: usize,
}

impl<G, V> ConfiguredMcts<G, V>
where
    G: GraphGenerator,
    G::Action: 'static,
    V: Score,
{
    /// Build an engine with the policies described by `config`.
    pub fn from_config(
        input: SearchInput<G, V>,
        config: SearchConfig,
        penalty: V,
    ) -> Result<Self, SearchError> {
        let policies = PolicySet::from_config(&config);
        Self::new(input, policies, config, penalty)
    }
}

impl<G, V, T, D> Mcts<G, V, T, D>
where
    G: GraphGenerator,
    V: Score,
    T: TreePolicy<NodeId, G::Action>,
    D: ActionPolicy<G::Node, G::Action>,
{
    /// Create an engine in the `Created` state. The root is generated here.
    ///
    /// `penalty` replaces the score of paths whose evaluation fails.
    pub fn new(
        input: SearchInput<G, V>,
        policies: PolicySet<T, D>,
        config: SearchConfig,
        penalty: V,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let SearchInput {
            generator,
            goal_tester,
            evaluator,
        } = input;
        let PolicySet {
            tree,
            default,
            graph_hook,
        } = policies;

        let mut graph = ExploredGraph::new(generator.root());
        graph.set_hook(graph_hook);
        let root = graph.root_id();

        Ok(Mcts {
            generator,
            goal_tester,
            evaluator,
            tree_policy: tree,
            default_policy: default,
            config,
            penalty,
            stop: Box::new(NeverStop),
            deadline: None,
            graph,
            score_cache: HashMap::new(),
            prefix: vec![root],
            state: EngineState::Created,
            tree_policy_reached_leaf: false,
            best: None,
            metrics: SearchMetrics::default(),
            hooks: Vec::new(),
            reported_progress: 0,
        })
    }

    /// Replace the cancellation source. The configured timeout still applies.
    pub fn with_stop_check(mut self, stop: impl StopCheck + 'static) -> Self {
        self.stop = Box::new(stop);
        self
    }

    /// Register an observer called after every completed playout.
    pub fn add_playout_hook(&mut self, hook: impl FnMut(&PlayoutMetrics) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn graph(&self) -> &ExploredGraph<G::Node, G::Action> {
        &self.graph
    }

    pub fn tree_policy(&self) -> &T {
        &self.tree_policy
    }

    pub fn number_of_playouts(&self) -> usize {
        self.metrics.playouts
    }

    pub fn number_of_nodes_in_memory(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether some playout's selection phase ended on a goal leaf.
    pub fn has_tree_policy_reached_leaf(&self) -> bool {
        self.tree_policy_reached_leaf
    }

    /// Best newly evaluated goal path so far.
    pub fn best_solution(&self) -> Option<&EvaluatedPath<G::Node, G::Action, V>> {
        self.best.as_ref()
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Node ids every playout is forced through, root first.
    pub fn prefix_ids(&self) -> &[NodeId] {
        &self.prefix
    }

    /// Serializable view of the explored graph with tree-policy labels.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph
            .snapshot(|node_id| self.tree_policy.label(&node_id).copied())
    }

    /// Root action whose child was visited most often. Ties keep the
    /// earlier action.
    pub fn best_root_action_by_visits(&self) -> Result<Option<G::Action>, GraphError> {
        let best = self
            .root_labels()?
            .into_iter()
            .reduce(|best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });
        Ok(best.map(|(action, _, _)| action))
    }

    /// Root action whose child has the best mean score for the objective.
    pub fn best_root_action_by_value(&self) -> Result<Option<G::Action>, GraphError> {
        let objective = self.config.objective;
        let best = self
            .root_labels()?
            .into_iter()
            .reduce(|best, candidate| {
                if objective.is_better(candidate.2, best.2) {
                    candidate
                } else {
                    best
                }
            });
        Ok(best.map(|(action, _, _)| action))
    }

    fn root_labels(&self) -> Result<Vec<(G::Action, u64, f64)>, GraphError> {
        let edges = self.graph.child_edges(self.graph.root_id())?;
        Ok(edges
            .into_iter()
            .filter_map(|(action, child)| {
                self.tree_policy
                    .label(&child)
                    .filter(|label| label.visits() > 0)
                    .map(|label| (action, label.visits(), label.mean()))
            })
            .collect())
    }

    /// Force every later playout through `prefix`.
    ///
    /// Nodes along the prefix are expanded as needed and marked visited;
    /// the last one becomes the start of the selection phase.
    pub fn enforce_prefix(&mut self, prefix: &SearchPath<G::Node, G::Action>) -> Result<(), SearchError> {
        if self.state == EngineState::Terminated {
            return Err(SearchError::AlreadyTerminated);
        }
        let root = self.graph.root_id();
        let root_state = self.graph.state(root)?;
        if prefix.root() != root_state {
            return Err(SearchError::PrefixRootMismatch {
                expected: format!("{root_state:?}"),
                found: format!("{:?}", prefix.root()),
            });
        }

        let mut stats = PlayoutStats::default();
        let mut ids = vec![root];
        let mut current = root;
        for (position, (_, action, node)) in prefix.edges().enumerate() {
            if self.graph.node(current)?.is_unexpanded() {
                match self.expand_node(current, &mut stats) {
                    Ok(_) => {}
                    Err(Halt::Interrupted(interruption)) => {
                        return Err(SearchError::Interrupted(interruption));
                    }
                    Err(Halt::Fatal(err)) => return Err(err),
                    // Nothing left to follow below `current`.
                    Err(Halt::Exhausted) => {
                        return Err(SearchError::InvalidPrefix {
                            position,
                            action: format!("{action:?}"),
                        });
                    }
                }
                self.graph.mark_visited(current)?;
            }
            let child = self
                .graph
                .child_for_action(current, action)?
                .filter(|child| self.graph.state(*child).is_ok_and(|state| state == node))
                .ok_or_else(|| SearchError::InvalidPrefix {
                    position,
                    action: format!("{action:?}"),
                })?;
            ids.push(child);
            current = child;
        }

        info!(prefix_len = prefix.len(), "prefix enforced");
        self.prefix = ids;
        Ok(())
    }

    /// Advance the search by one event.
    ///
    /// Returns `Err(SearchError::AlreadyTerminated)` once a terminal event
    /// was delivered or a fatal error aborted the run.
    pub fn next_event(
        &mut self,
    ) -> Result<SearchEvent<G::Node, G::Action, V>, SearchError> {
        match self.state {
            EngineState::Created => {
                self.state = EngineState::Active;
                self.deadline = self.config.timeout().map(Deadline::after);
                let root = self.graph.state(self.graph.root_id())?.clone();
                info!(
                    root = ?root,
                    max_playouts = ?self.config.max_playouts,
                    timeout_ms = ?self.config.timeout_ms,
                    "search started"
                );
                Ok(SearchEvent::Initialized { root })
            }
            EngineState::Active => self.step(),
            EngineState::Terminated => Err(SearchError::AlreadyTerminated),
        }
    }

    /// Drive the search until a terminal event.
    pub fn run(&mut self) -> Result<SearchOutcome<G::Node, G::Action, V>, SearchError> {
        loop {
            let status = match self.next_event()? {
                SearchEvent::Terminated => RunStatus::Completed,
                SearchEvent::Cancelled => RunStatus::Cancelled,
                SearchEvent::TimedOut => RunStatus::TimedOut,
                _ => continue,
            };
            return Ok(SearchOutcome {
                status,
                best: self.best.clone(),
                playouts: self.metrics.playouts,
                metrics: self.metrics.clone(),
            });
        }
    }

    fn step(&mut self) -> Result<SearchEvent<G::Node, G::Action, V>, SearchError> {
        if let Some(interruption) = self.poll_stop() {
            return Ok(self.interrupt(interruption));
        }
        if self.is_exhausted()? {
            return Ok(self.finish("search space exhausted"));
        }
        if self
            .config
            .max_playouts
            .is_some_and(|max| self.metrics.playouts >= max)
        {
            return Ok(self.finish("playout limit reached"));
        }

        match self.playout() {
            Ok(event) => Ok(event),
            Err(Halt::Exhausted) => Ok(self.finish("no playout left to draw")),
            Err(Halt::Interrupted(interruption)) => Ok(self.interrupt(interruption)),
            Err(Halt::Fatal(err)) => {
                self.state = EngineState::Terminated;
                error!(error = %err, playouts = self.metrics.playouts, "search aborted");
                Err(err)
            }
        }
    }

    fn poll_stop(&self) -> Option<Interruption> {
        Signals {
            external: self.stop.as_ref(),
            deadline: self.deadline,
        }
        .poll()
    }

    fn start_node(&self) -> NodeId {
        self.prefix
            .last()
            .copied()
            .unwrap_or_else(|| self.graph.root_id())
    }

    fn is_exhausted(&self) -> Result<bool, GraphError> {
        let root = self.graph.node(self.graph.root_id())?;
        let start = self.graph.node(self.start_node())?;
        Ok(self.graph.unexpanded_count() == 0
            || root.is_fully_explored()
            || start.is_fully_explored())
    }

    fn finish(&mut self, reason: &'static str) -> SearchEvent<G::Node, G::Action, V> {
        self.state = EngineState::Terminated;
        info!(
            reason,
            playouts = self.metrics.playouts,
            solutions = self.metrics.solutions,
            nodes = self.graph.node_count(),
            "search terminated"
        );
        SearchEvent::Terminated
    }

    fn interrupt(&mut self, interruption: Interruption) -> SearchEvent<G::Node, G::Action, V> {
        self.state = EngineState::Terminated;
        info!(
            %interruption,
            playouts = self.metrics.playouts,
            nodes = self.graph.node_count(),
            "search interrupted"
        );
        match interruption {
            Interruption::Cancelled => SearchEvent::Cancelled,
            Interruption::TimedOut => SearchEvent::TimedOut,
        }
    }

    /// Draw, evaluate and backpropagate one playout.
    fn playout(&mut self) -> Result<SearchEvent<G::Node, G::Action, V>, Halt> {
        let started = Instant::now();
        let mut stats = PlayoutStats::default();
        let drawn = self.draw(&mut stats)?;

        let key = drawn.path.nodes().to_vec();
        let (score, cached, evaluation_failed) =
            if let Some(score) = self.score_cache.get(&key).copied() {
                warn!(path_len = drawn.path.len(), "playout repeated an evaluated path");
                (score, true, false)
            } else {
                let (score, failed) = self.evaluate(&drawn.path, &mut stats)?;
                self.score_cache.insert(key, score);
                (score, false, failed)
            };

        let update_started = Instant::now();
        self.tree_policy
            .update_path(&drawn.tree_ids, score.into(), drawn.path.len())?;
        stats.timings.tree_policy_updates += update_started.elapsed();

        let solution = drawn.is_goal && !cached && !evaluation_failed;
        if solution {
            self.check_solution_path(&drawn)?;
        }

        let tree_path_len = drawn.tree_ids.len();
        let evaluated = EvaluatedPath {
            path: drawn.path,
            score,
            is_goal: drawn.is_goal,
            cached,
            evaluation_failed,
        };
        if solution
            && self
                .best
                .as_ref()
                .is_none_or(|best| self.config.objective.is_better(score, best.score))
        {
            info!(score = ?score, path_len = evaluated.path.len(), "new best solution");
            self.best = Some(evaluated.clone());
        }

        let metrics = PlayoutMetrics {
            playout: self.metrics.playouts + 1,
            path_len: evaluated.path.len(),
            tree_path_len,
            is_goal: evaluated.is_goal,
            score: score.into(),
            cached,
            evaluation_failed,
            tree_policy_invocations: stats.tree_policy_invocations,
            default_policy_invocations: stats.default_policy_invocations,
            dead_end_restarts: stats.dead_end_restarts,
            timings: stats.timings,
            duration: started.elapsed(),
        };
        self.metrics.record(&metrics);
        for hook in &mut self.hooks {
            hook(&metrics);
        }
        debug!(
            playout = metrics.playout,
            path_len = metrics.path_len,
            tree_path_len = metrics.tree_path_len,
            score = metrics.score,
            is_goal = metrics.is_goal,
            cached,
            "playout finished"
        );
        self.report_progress();

        Ok(if solution {
            SearchEvent::SolutionFound(evaluated)
        } else {
            SearchEvent::PlayoutFinished(evaluated)
        })
    }

    fn evaluate(
        &mut self,
        path: &SearchPath<G::Node, G::Action>,
        stats: &mut PlayoutStats,
    ) -> Result<(V, bool), Halt> {
        let signals = Signals {
            external: self.stop.as_ref(),
            deadline: self.deadline,
        };
        if let Some(interruption) = signals.poll() {
            return Err(Halt::Interrupted(interruption));
        }

        let started = Instant::now();
        let result = self.evaluator.evaluate(path, &signals);
        stats.timings.evaluation += started.elapsed();

        match result {
            Ok(score) => Ok((score, false)),
            Err(EvaluationError::Failed(reason)) => {
                warn!(%reason, penalty = ?self.penalty, "path evaluation failed");
                Ok((self.penalty, true))
            }
            Err(EvaluationError::Interrupted(interruption)) => {
                Err(Halt::Interrupted(interruption))
            }
        }
    }

    /// Selection phase. Restarts from the start node whenever it walks into
    /// a node with nothing left to offer, marking that node a dead end.
    fn draw(
        &mut self,
        stats: &mut PlayoutStats,
    ) -> Result<DrawnPlayout<G::Node, G::Action>, Halt> {
        let start = self.start_node();

        'restart: loop {
            if let Some(interruption) = self.poll_stop() {
                return Err(Halt::Interrupted(interruption));
            }

            if self.graph.node(start)?.is_unexpanded() {
                if self.is_goal_node(start)? {
                    self.graph.close(start)?;
                    self.graph.mark_visited(start)?;
                    return self.tree_playout(self.prefix.clone(), true);
                }
                let children = self.expand_node(start, stats)?;
                self.graph.mark_visited(start)?;
                if children.is_empty() {
                    return Err(Halt::Exhausted);
                }
            }

            let mut ids = self.prefix.clone();
            let mut current = start;
            loop {
                let mut untried = Vec::new();
                let mut available = Vec::new();
                for (action, child) in self.graph.child_edges(current)? {
                    let node = self.graph.node(child)?;
                    if !node.is_visited() {
                        untried.push((action, child));
                    } else if !node.is_dead_end()
                        && !(self.config.forbid_double_paths && node.is_fully_explored())
                    {
                        available.push((action, child));
                    }
                }

                if !untried.is_empty() {
                    return self.expand_and_simulate(ids, current, untried, stats);
                }

                if available.is_empty() {
                    if current == start {
                        return Err(Halt::Exhausted);
                    }
                    trace!(node = current.index(), "dead end during selection");
                    self.graph.mark_dead_end(current)?;
                    self.graph.propagate_fully_explored(current)?;
                    stats.dead_end_restarts += 1;
                    continue 'restart;
                }

                let started = Instant::now();
                let action = self.tree_policy.choose_action(&current, &available)?;
                stats.timings.tree_policy_queries += started.elapsed();
                stats.tree_policy_invocations += 1;

                let Some(next) = available
                    .iter()
                    .find(|(candidate, _)| *candidate == action)
                    .map(|(_, child)| *child)
                else {
                    return Err(SearchError::InvalidChosenAction {
                        node: format!("{current:?}"),
                        action: format!("{action:?}"),
                    }
                    .into());
                };
                ids.push(next);
                current = next;

                if self.graph.node(current)?.expansion_state() == ExpansionState::Closed {
                    self.tree_policy_reached_leaf = true;
                    return self.tree_playout(ids, true);
                }
            }
        }
    }

    /// Expansion phase followed by simulation from the newly visited child.
    fn expand_and_simulate(
        &mut self,
        mut ids: Vec<NodeId>,
        current: NodeId,
        untried: Vec<(G::Action, NodeId)>,
        stats: &mut PlayoutStats,
    ) -> Result<DrawnPlayout<G::Node, G::Action>, Halt> {
        let state = self.graph.state(current)?.clone();
        let candidates = untried
            .iter()
            .map(|(action, child)| Ok((action.clone(), self.graph.state(*child)?.clone())))
            .collect::<Result<Vec<_>, GraphError>>()?;

        let started = Instant::now();
        let action = self.default_policy.choose_action(&state, &candidates)?;
        stats.timings.default_policy_queries += started.elapsed();
        stats.default_policy_invocations += 1;

        let Some(child) = untried
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .map(|(_, child)| *child)
        else {
            return Err(SearchError::InvalidChosenAction {
                node: format!("{state:?}"),
                action: format!("{action:?}"),
            }
            .into());
        };
        ids.push(child);

        if self.is_goal_node(child)? {
            self.graph.close(child)?;
            self.graph.mark_visited(child)?;
            return self.tree_playout(ids, true);
        }

        let grandchildren = self.expand_node(child, stats)?;
        self.graph.mark_visited(child)?;
        let mut path = self.graph.path_to(child)?;
        if grandchildren.is_empty() {
            trace!(node = child.index(), "expanded child has no successors");
            return Ok(DrawnPlayout {
                tree_ids: ids,
                path,
                is_goal: false,
            });
        }

        let first = self
            .graph
            .child_edges(child)?
            .into_iter()
            .map(|(action, id)| Ok((action, self.graph.state(id)?.clone())))
            .collect::<Result<Vec<_>, GraphError>>()?;

        let signals = Signals {
            external: self.stop.as_ref(),
            deadline: self.deadline,
        };
        let generator = &self.generator;
        let goal_tester = &self.goal_tester;
        let default_policy = &mut self.default_policy;
        let PlayoutStats {
            default_policy_invocations,
            timings,
            ..
        } = stats;
        let PlayoutTimings {
            successor_generation,
            default_policy_queries,
            ..
        } = timings;

        let end = simulate::<_, _, _, _, _, Halt>(
            &mut path,
            first,
            |node| {
                if let Some(interruption) = signals.poll() {
                    return Err(Halt::Interrupted(interruption));
                }
                let started = Instant::now();
                let successors = generator.successors(node);
                *successor_generation += started.elapsed();
                Ok(successors?)
            },
            |node, options| {
                let started = Instant::now();
                let action = default_policy.choose_action(node, options);
                *default_policy_queries += started.elapsed();
                *default_policy_invocations += 1;
                Ok(action?)
            },
            |states| goal_tester.is_goal(states),
        )?;
        trace!(
            tree_len = ids.len(),
            path_len = path.len(),
            goal = end == SimulationEnd::Goal,
            "simulation finished"
        );

        Ok(DrawnPlayout {
            tree_ids: ids,
            path,
            is_goal: end == SimulationEnd::Goal,
        })
    }

    /// Generate and attach the successors of an unexpanded node. A node
    /// without successors becomes a dead end.
    fn expand_node(
        &mut self,
        node_id: NodeId,
        stats: &mut PlayoutStats,
    ) -> Result<Vec<NodeId>, Halt> {
        let signals = Signals {
            external: self.stop.as_ref(),
            deadline: self.deadline,
        };
        if let Some(interruption) = signals.poll() {
            return Err(Halt::Interrupted(interruption));
        }

        let state = self.graph.state(node_id)?.clone();
        let started = Instant::now();
        let successors = self.generator.successors(&state)?;
        stats.timings.successor_generation += started.elapsed();

        let children = self.graph.expand(
            node_id,
            successors,
            &signals,
            self.config.interrupt_check_interval,
        )?;
        trace!(node = node_id.index(), children = children.len(), "expanded node");

        if children.is_empty() {
            self.graph.mark_dead_end(node_id)?;
            self.graph.propagate_fully_explored(node_id)?;
        }
        Ok(children)
    }

    fn is_goal_node(&self, node_id: NodeId) -> Result<bool, GraphError> {
        let states = self.graph.states_to(node_id)?;
        Ok(self.goal_tester.is_goal(&states))
    }

    fn tree_playout(
        &self,
        ids: Vec<NodeId>,
        is_goal: bool,
    ) -> Result<DrawnPlayout<G::Node, G::Action>, Halt> {
        let head = ids.last().copied().unwrap_or_else(|| self.graph.root_id());
        let path = self.graph.path_to(head)?;
        Ok(DrawnPlayout {
            tree_ids: ids,
            path,
            is_goal,
        })
    }

    /// A solution must start at the root, follow the explored graph for its
    /// tracked part and end in a goal.
    fn check_solution_path(&self, drawn: &DrawnPlayout<G::Node, G::Action>) -> Result<(), SearchError> {
        let invalid = |reason: String| SearchError::InvalidSolutionPath { reason };
        let root = self.graph.root_id();

        if drawn.tree_ids.first() != Some(&root) {
            return Err(invalid("tracked nodes do not start at the root".to_string()));
        }
        for pair in drawn.tree_ids.windows(2) {
            if self.graph.node(pair[1])?.parent() != Some(pair[0]) {
                return Err(invalid(format!(
                    "node {} is not a child of node {}",
                    pair[1].index(),
                    pair[0].index()
                )));
            }
        }
        for (position, node_id) in drawn.tree_ids.iter().enumerate() {
            if drawn.path.nodes().get(position) != Some(self.graph.state(*node_id)?) {
                return Err(invalid(format!(
                    "path position {position} disagrees with the explored graph"
                )));
            }
        }
        if !self.goal_tester.is_goal(drawn.path.nodes()) {
            return Err(invalid("path head is not a goal".to_string()));
        }
        Ok(())
    }

    fn report_progress(&mut self) {
        let Some(max) = self.config.max_playouts else {
            return;
        };
        let percent = self.metrics.playouts * 100 / max;
        if percent >= self.reported_progress + 5 {
            self.reported_progress = percent - percent % 5;
            info!(
                playouts = self.metrics.playouts,
                max_playouts = max,
                percent = self.reported_progress,
                nodes = self.graph.node_count(),
                best_score = ?self.best.as_ref().map(|best| best.score),
                "search progress"
            );
        }
    }
}

/// One nested search step per call: the engine runs until its next solution
/// (or termination) and then lets its tree policy pick among the root's
/// children matching `successors`.
impl<G, V, T, D> ActionPolicy<G::Node, G::Action> for Mcts<G, V, T, D>
where
    G: GraphGenerator,
    V: Score,
    T: TreePolicy<NodeId, G::Action>,
    D: ActionPolicy<G::Node, G::Action>,
{
    fn choose_action(
        &mut self,
        node: &G::Node,
        successors: &[(G::Action, G::Node)],
    ) -> Result<G::Action, PolicyError> {
        ensure_choices(node, successors)?;
        let nested = |err: SearchError| PolicyError::NestedSearch {
            reason: err.to_string(),
        };

        while self.state != EngineState::Terminated {
            if matches!(self.next_event().map_err(nested)?, SearchEvent::SolutionFound(_)) {
                break;
            }
        }

        let root = self.graph.root_id();
        let mut candidates = Vec::with_capacity(successors.len());
        for (action, _) in successors {
            let child = self
                .graph
                .child_for_action(root, action)
                .map_err(|err| nested(err.into()))?;
            if let Some(child) = child {
                candidates.push((action.clone(), child));
            }
        }
        if candidates.is_empty() {
            return Err(PolicyError::NoActionAvailable {
                node: format!("{node:?}"),
            });
        }
        self.tree_policy.choose_action(&root, &candidates)
    }
}

impl<G, V, T, D> Iterator for Mcts<G, V, T, D>
where
    G: GraphGenerator,
    V: Score,
    T: TreePolicy<NodeId, G::Action>,
    D: ActionPolicy<G::Node, G::Action>,
{
    type Item = Result<SearchEvent<G::Node, G::Action, V>, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == EngineState::Terminated {
            return None;
        }
        Some(self.next_event())
    }
}
