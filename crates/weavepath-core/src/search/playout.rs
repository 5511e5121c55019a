use std::{collections::HashSet, fmt::Debug, hash::Hash};

use crate::search::{
    error::{GraphError, SearchError},
    path::SearchPath,
};

/// How a simulated tail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimulationEnd {
    /// The head of the path is a goal.
    Goal,
    /// The head has no successors; the path is partial.
    DeadEnd,
}

/// Extend `path` with default-policy steps until a goal or a node without
/// successors is reached.
///
/// `first` holds the successors of the current head, already known from the
/// explored graph. Deeper nodes are generated on demand and never attached.
/// - `successors(node) -> (action, node)` pairs, possibly failing or interrupted
/// - `choose(node, successors) -> action`
/// - `is_goal(states) -> bool` for the whole root-to-head state sequence
pub(crate) fn simulate<N, A, FSucc, FChoose, FGoal, E>(
    path: &mut SearchPath<N, A>,
    first: Vec<(A, N)>,
    mut successors: FSucc,
    mut choose: FChoose,
    is_goal: FGoal,
) -> Result<SimulationEnd, E>
where
    N: Clone + Debug,
    A: Clone + Eq + Hash + Debug,
    FSucc: FnMut(&N) -> Result<Vec<(A, N)>, E>,
    FChoose: FnMut(&N, &[(A, N)]) -> Result<A, E>,
    FGoal: Fn(&[N]) -> bool,
    E: From<SearchError>,
{
    let mut options = first;

    loop {
        if options.is_empty() {
            return Ok(SimulationEnd::DeadEnd);
        }

        let head = path.head().clone();
        let action = choose(&head, &options)?;
        let Some(index) = options.iter().position(|(candidate, _)| *candidate == action) else {
            return Err(SearchError::InvalidChosenAction {
                node: format!("{head:?}"),
                action: format!("{action:?}"),
            }
            .into());
        };
        let (action, next) = options.swap_remove(index);
        path.extend(action, next);

        if is_goal(path.nodes()) {
            return Ok(SimulationEnd::Goal);
        }

        options = successors(path.head())?;
        ensure_distinct_actions(path.head(), &options)?;
    }
}

fn ensure_distinct_actions<N: Debug, A: Eq + Hash + Debug>(
    node: &N,
    successors: &[(A, N)],
) -> Result<(), SearchError> {
    let mut seen = HashSet::with_capacity(successors.len());
    for (action, _) in successors {
        if !seen.insert(action) {
            return Err(GraphError::DuplicateAction {
                node: format!("{node:?}"),
                action: format!("{action:?}"),
            }
            .into());
        }
    }
    Ok(())
}
