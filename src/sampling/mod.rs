//! Sampling policy: pick the next transition to measure.
//!
//! Information gain is proxied by posterior variance: the frontier
//! transition the belief model is least sure about is the one worth
//! paying a sample for. Ties break on lowest node index, then lowest
//! action index, so runs are reproducible.

use crate::belief::BeliefModel;
use crate::error::{ExploreError, Result};
use crate::grid::{Action, GridGraph, NodeId};
use crate::safety::SafeSets;

/// Select the frontier transition with maximal posterior variance.
///
/// Fails with [`ExploreError::FrontierEmpty`] when G is empty; the caller
/// decides whether to stop, widen β, or pick a different seed.
pub fn select_next(
    graph: &GridGraph,
    sets: &SafeSets,
    belief: &dyn BeliefModel,
) -> Result<(NodeId, Action)> {
    let mut best: Option<(NodeId, Action, f64)> = None;
    for (node, action) in sets.iter_frontier() {
        let Some((edge, _)) = graph.edge(node, action) else {
            continue;
        };
        let var = belief.predict(graph.edge_midpoint(edge)).var;
        // Strict comparison keeps the first (lowest-index) candidate on ties.
        let better = match best {
            None => true,
            Some((_, _, best_var)) => var > best_var,
        };
        if better {
            best = Some((node, action, var));
        }
    }
    best.map(|(n, a, _)| (n, a))
        .ok_or(ExploreError::FrontierEmpty)
}
