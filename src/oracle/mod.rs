//! Oracle evaluator: ground-truth safe sets for experiment scoring.
//!
//! Uses exact, noise-free slopes and the same reachability closure as the
//! online engine. Strictly offline: nothing here is ever consulted by the
//! exploration loop.

use serde::{Deserialize, Serialize};

use crate::grid::{Action, GridGraph, NodeId};
use crate::safety::engine::certified_closure;
use crate::safety::{ActionSet, SafeSets};
use crate::terrain::Terrain;

/// Precision/recall-style counts of an estimated Ŝ against the truth.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct OracleScore {
    /// |Ŝ|: certified transitions in the estimate.
    pub certified: usize,

    /// True-Ŝ transitions the estimate missed (false negatives).
    pub missed: usize,

    /// Estimated transitions absent from the true Ŝ (false positives).
    /// Must stay zero whenever β and L are honest.
    pub excess: usize,
}

/// The true safe set: transitions whose exact slope is within `[-h, h]`.
/// Stay is always safe.
pub fn true_safe_set(graph: &GridGraph, terrain: &Terrain, h: f64) -> Vec<ActionSet> {
    let mut safe = vec![ActionSet::empty(); graph.num_nodes()];
    for u in 0..graph.num_nodes() {
        safe[u].insert(Action::Stay);
        for a in Action::DIRECTIONAL {
            if let Some(s) = terrain.slope(graph, u, a) {
                if s.abs() <= h {
                    safe[u].insert(a);
                }
            }
        }
    }
    safe
}

/// The true certified reachable-returnable set from the given seed nodes.
pub fn true_certified_set(
    graph: &GridGraph,
    terrain: &Terrain,
    h: f64,
    seed_nodes: &[NodeId],
) -> Vec<ActionSet> {
    let safe = true_safe_set(graph, terrain, h);
    certified_closure(graph, &safe, seed_nodes).certified
}

/// Score an estimated snapshot against the true certified set.
pub fn score(estimate: &SafeSets, truth: &[ActionSet]) -> OracleScore {
    let mut out = OracleScore::default();
    for u in 0..truth.len() {
        let est = estimate.certified_actions(u);
        out.certified += est.count();
        for a in Action::ALL {
            match (est.contains(a), truth[u].contains(a)) {
                (false, true) => out.missed += 1,
                (true, false) => out.excess += 1,
                _ => {}
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::synthetic;

    #[test]
    fn test_true_safe_set_on_flat_terrain() {
        let g = GridGraph::new(3, 3, 1.0, 1.0).unwrap();
        let t = synthetic::flat(3, 3, 0.0).unwrap();
        let safe = true_safe_set(&g, &t, 0.5);
        // Center node has all five actions.
        assert_eq!(safe[g.node_at(1, 1)].count(), 5);
        // A corner has stay plus two directions.
        assert_eq!(safe[0].count(), 3);
    }

    #[test]
    fn test_true_certified_excludes_cliff_row() {
        let g = GridGraph::new(3, 3, 1.0, 1.0).unwrap();
        let t = synthetic::cliff(3, 3, 2, 100.0).unwrap();
        let certified = true_certified_set(&g, &t, 0.5, &[g.node_at(0, 1)]);
        for col in 0..3 {
            let above = g.node_at(1, col);
            assert!(!certified[above].contains(Action::Down));
            let inside = g.node_at(2, col);
            assert!(certified[inside].is_empty(), "cliff row must be unreached");
        }
        // The flat part is fully certified.
        assert!(certified[g.node_at(0, 0)].contains(Action::Right));
        assert!(certified[g.node_at(1, 1)].contains(Action::Left));
    }

    #[test]
    fn test_score_counts() {
        let g = GridGraph::new(1, 3, 1.0, 1.0).unwrap();
        let t = synthetic::flat(1, 3, 0.0).unwrap();
        let truth = true_certified_set(&g, &t, 0.5, &[0]);

        // Estimate missing one transition, with one spurious extra.
        let mut certified = truth.clone();
        certified[1].remove(Action::Right);
        let mut with_extra = certified.clone();
        with_extra[2].insert(Action::Right); // boundary: not in truth
        let estimate = SafeSets::new(
            vec![ActionSet::empty(); 3],
            with_extra,
            vec![ActionSet::empty(); 3],
        );
        let s = score(&estimate, &truth);
        assert_eq!(s.missed, 1);
        assert_eq!(s.excess, 1);
    }
}
