//! Safe-set engine: running interval bounds, Lipschitz propagation, and
//! the reachable-and-returnable fixed point.
//!
//! The engine owns per-edge running bounds — the intersection of every
//! confidence interval seen so far — plus sticky Safe/Unsafe stores. Sets
//! are recomputed from scratch each round from those bounds; the bounds
//! only ever tighten, so labels are monotone: once Safe (or Unsafe), a
//! transition is never relabelled. Incremental patching of the sets is
//! deliberately avoided.

use std::collections::VecDeque;

use crate::belief::BeliefModel;
use crate::error::{ExploreError, Result};
use crate::grid::{Action, GridGraph, NodeId};
use crate::safety::classifier::{classify, Interval, SafetyLabel};
use crate::safety::sets::{ActionSet, SafeSets};

/// The known-safe start region: Ŝ₀.
///
/// Built once from true altitudes within a radius of the start node, the
/// way a rover is deployed onto ground that has been surveyed up close.
#[derive(Clone, Debug)]
pub struct SeedRegion {
    /// The start node.
    pub start: NodeId,

    /// Nodes incident to at least one seed transition.
    pub nodes: Vec<NodeId>,

    /// Seed transitions per node (stay included for member nodes).
    pub transitions: Vec<ActionSet>,
}

impl SeedRegion {
    /// Mark every transition inside the radius whose true slope is within
    /// `[-h, h]`. `slope` returns the directed slope of a transition, or
    /// `None` where the transition is undefined.
    ///
    /// Fails with [`ExploreError::NoSafeSeed`] when the region contains no
    /// safe directional transition: a degenerate start the caller must not
    /// silently explore from.
    pub fn from_slopes<F>(
        graph: &GridGraph,
        start: NodeId,
        radius: usize,
        h: f64,
        slope: F,
    ) -> Result<Self>
    where
        F: Fn(NodeId, Action) -> Option<f64>,
    {
        if start >= graph.num_nodes() {
            return Err(ExploreError::Config(format!(
                "start node {} outside grid of {} nodes",
                start,
                graph.num_nodes()
            )));
        }

        let region = graph.nodes_within(start, radius);
        let in_region = {
            let mut mask = vec![false; graph.num_nodes()];
            for &n in &region {
                mask[n] = true;
            }
            mask
        };

        let mut transitions = vec![ActionSet::empty(); graph.num_nodes()];
        let mut any_directional = false;
        for &u in &region {
            for a in Action::DIRECTIONAL {
                let Some(t) = graph.neighbor(u, a) else {
                    continue;
                };
                if !in_region[t] {
                    continue;
                }
                let Some(s) = slope(u, a) else { continue };
                if s.abs() <= h {
                    transitions[u].insert(a);
                    any_directional = true;
                }
            }
        }

        if !any_directional {
            return Err(ExploreError::NoSafeSeed { start });
        }

        let mut nodes = Vec::new();
        for u in 0..graph.num_nodes() {
            let incident = transitions[u].any_directional()
                || Action::DIRECTIONAL.iter().any(|&a| {
                    graph
                        .neighbor(u, a)
                        .map(|t| transitions[t].contains(a.opposite()))
                        .unwrap_or(false)
                });
            if incident {
                transitions[u].insert(Action::Stay);
                nodes.push(u);
            }
        }

        Ok(Self {
            start,
            nodes,
            transitions,
        })
    }
}

/// Output of the reachable-and-returnable closure.
pub struct Closure {
    /// Certified transitions per node.
    pub certified: Vec<ActionSet>,

    /// Nodes reachable from the seed over certified-safe transitions.
    pub reached: Vec<bool>,

    /// Nodes from which the seed region is reachable over safe transitions.
    pub returnable: Vec<bool>,
}

/// Fixed-point reachability closure over a safe set.
///
/// A transition joins the certified set iff its source is reachable from
/// the seed over safe transitions and its target can return to the seed
/// over safe transitions. Shared by the online engine and the oracle
/// evaluator, which differ only in how `safe` was produced.
pub fn certified_closure(
    graph: &GridGraph,
    safe: &[ActionSet],
    seed_nodes: &[NodeId],
) -> Closure {
    let n = graph.num_nodes();
    let mut returnable = vec![false; n];
    let mut queue = VecDeque::new();

    // Backward pass: who can reach the seed region over safe transitions.
    for &s in seed_nodes {
        if !returnable[s] {
            returnable[s] = true;
            queue.push_back(s);
        }
    }
    while let Some(v) = queue.pop_front() {
        for a in Action::DIRECTIONAL {
            // u -[a]-> v means u sits one step opposite of a from v.
            let Some(u) = graph.neighbor(v, a.opposite()) else {
                continue;
            };
            if !returnable[u] && safe[u].contains(a) {
                returnable[u] = true;
                queue.push_back(u);
            }
        }
    }

    // Forward pass: reachability from the seed, restricted to returnable
    // targets so every certified transition preserves a way home.
    let mut reached = vec![false; n];
    let mut certified = vec![ActionSet::empty(); n];
    let mut queue = VecDeque::new();
    for &s in seed_nodes {
        if !reached[s] && returnable[s] {
            reached[s] = true;
            queue.push_back(s);
        }
    }
    while let Some(u) = queue.pop_front() {
        certified[u].insert(Action::Stay);
        for a in Action::DIRECTIONAL {
            if !safe[u].contains(a) {
                continue;
            }
            let Some(t) = graph.neighbor(u, a) else {
                continue;
            };
            if !returnable[t] {
                continue;
            }
            certified[u].insert(a);
            if !reached[t] {
                reached[t] = true;
                queue.push_back(t);
            }
        }
    }

    Closure {
        certified,
        reached,
        returnable,
    }
}

/// The safe-set computation and update engine.
pub struct SafeSetEngine {
    beta: f64,
    h: f64,
    lipschitz: f64,
    seed: SeedRegion,

    /// Running bound per canonical edge (intersection of all CIs so far).
    bounds: Vec<Interval>,

    /// Sticky Safe store per edge.
    safe_edges: Vec<bool>,

    /// Sticky Unsafe store per edge.
    unsafe_edges: Vec<bool>,
}

impl SafeSetEngine {
    /// Build an engine for one graph. `h` is the symmetric slope bound,
    /// `beta` the confidence multiplier, `lipschitz` the assumed maximum
    /// rate of change of the slope field between edge midpoints.
    pub fn new(
        graph: &GridGraph,
        beta: f64,
        h: f64,
        lipschitz: f64,
        seed: SeedRegion,
    ) -> Result<Self> {
        for (name, v) in [("beta", beta), ("h", h), ("lipschitz", lipschitz)] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(ExploreError::Config(format!(
                    "{} must be positive and finite, got {}",
                    name, v
                )));
            }
        }

        let mut safe_edges = vec![false; graph.num_edges()];
        for u in 0..graph.num_nodes() {
            for a in Action::DIRECTIONAL {
                if seed.transitions[u].contains(a) {
                    if let Some((e, _)) = graph.edge(u, a) {
                        safe_edges[e] = true;
                    }
                }
            }
        }

        Ok(Self {
            beta,
            h,
            lipschitz,
            seed,
            bounds: vec![Interval::unbounded(); graph.num_edges()],
            safe_edges,
            unsafe_edges: vec![false; graph.num_edges()],
        })
    }

    pub fn seed(&self) -> &SeedRegion {
        &self.seed
    }

    /// Current running bound of a canonical edge.
    pub fn edge_bound(&self, edge: usize) -> Interval {
        self.bounds[edge]
    }

    /// Recompute S, Ŝ and G from the belief model's current posteriors.
    ///
    /// Querying twice without new observations yields identical output:
    /// intersecting the same interval again is a no-op.
    pub fn recompute(&mut self, graph: &GridGraph, belief: &dyn BeliefModel) -> SafeSets {
        // 1. Tighten running bounds with fresh confidence intervals.
        //    Invalid posteriors (negative or non-finite variance) are
        //    skipped: they must read as Unknown, not as certainty.
        for e in 0..graph.num_edges() {
            let post = belief.predict(graph.edge_midpoint(e));
            if let Some(ci) = Interval::confidence(post.mean, post.var, self.beta) {
                self.bounds[e] = self.bounds[e].intersect(ci);
            }
        }

        // 2. Direct classification. Edges already labelled either way keep
        //    their label; only unknown edges can change.
        for e in 0..graph.num_edges() {
            if self.safe_edges[e] || self.unsafe_edges[e] {
                continue;
            }
            match classify(self.bounds[e], self.h) {
                SafetyLabel::Safe => self.safe_edges[e] = true,
                SafetyLabel::Unsafe => self.unsafe_edges[e] = true,
                SafetyLabel::Unknown => {}
            }
        }

        // 3. Lipschitz propagation, cascading to a fixed point: a freshly
        //    certified edge can itself certify further neighbours.
        let mut queue: VecDeque<usize> = (0..graph.num_edges())
            .filter(|&e| self.safe_edges[e])
            .collect();
        while let Some(e) = queue.pop_front() {
            for f in graph.adjacent_edges(e).collect::<Vec<_>>() {
                if self.safe_edges[f] || self.unsafe_edges[f] {
                    continue;
                }
                let slack = self.lipschitz * graph.edge_distance(e, f);
                let derived = self.bounds[e].widen(slack);
                if classify(derived, self.h) == SafetyLabel::Safe {
                    self.bounds[f] = self.bounds[f].intersect(derived);
                    self.safe_edges[f] = true;
                    queue.push_back(f);
                }
            }
        }

        // 4. S from edge labels; stay is always safe.
        let n = graph.num_nodes();
        let mut safe = vec![ActionSet::empty(); n];
        for u in 0..n {
            safe[u].insert(Action::Stay);
            for a in Action::DIRECTIONAL {
                if let Some((e, _)) = graph.edge(u, a) {
                    if self.safe_edges[e] {
                        safe[u].insert(a);
                    }
                }
            }
        }

        // 5. Ŝ fixed point. Seed inclusion is unconditional.
        let closure = certified_closure(graph, &safe, &self.seed.nodes);
        let mut certified = closure.certified;
        for u in 0..n {
            certified[u] = certified[u].union(self.seed.transitions[u]);
        }

        // 6. G: transitions out of the certified region whose optimistic
        //    evaluation reaches a new node and keeps a way back.
        let mut frontier = vec![ActionSet::empty(); n];
        for u in 0..n {
            if !closure.reached[u] {
                continue;
            }
            for a in Action::DIRECTIONAL {
                if certified[u].contains(a) {
                    continue;
                }
                let Some(t) = graph.neighbor(u, a) else {
                    continue;
                };
                if closure.reached[t] {
                    // No new node to gain; sampling here is wasted budget.
                    continue;
                }
                let Some((e, _)) = graph.edge(u, a) else {
                    continue;
                };
                if !self.optimistic_safe(e) {
                    continue;
                }
                // The traversed edge reversed is the target's return path:
                // every reached source is returnable.
                frontier[u].insert(a);
            }
        }

        SafeSets::new(safe, certified, frontier)
    }

    /// Whether the favourable end of the edge's running bound lies inside
    /// the safe range.
    fn optimistic_safe(&self, edge: usize) -> bool {
        if self.unsafe_edges[edge] {
            return false;
        }
        if self.safe_edges[edge] {
            return true;
        }
        let b = self.bounds[edge];
        b.lo <= self.h && b.hi >= -self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::Posterior;

    /// Belief stub: fixed posteriors keyed by edge midpoint.
    struct TableBelief {
        entries: Vec<((f64, f64), Posterior)>,
        default: Posterior,
    }

    impl TableBelief {
        fn new(default_var: f64) -> Self {
            Self {
                entries: Vec::new(),
                default: Posterior {
                    mean: 0.0,
                    var: default_var,
                },
            }
        }

        fn set(&mut self, point: (f64, f64), mean: f64, var: f64) {
            self.entries.push((point, Posterior { mean, var }));
        }
    }

    impl BeliefModel for TableBelief {
        fn predict(&self, point: (f64, f64)) -> Posterior {
            self.entries
                .iter()
                .find(|(p, _)| (p.0 - point.0).abs() < 1e-9 && (p.1 - point.1).abs() < 1e-9)
                .map(|(_, post)| *post)
                .unwrap_or(self.default)
        }

        fn update(&mut self, _point: (f64, f64), _value: f64) {}

        fn len(&self) -> usize {
            self.entries.len()
        }
    }

    fn line_graph(cols: usize) -> GridGraph {
        GridGraph::new(1, cols, 1.0, 1.0).unwrap()
    }

    fn flat_seed(graph: &GridGraph, start: NodeId, radius: usize, h: f64) -> SeedRegion {
        SeedRegion::from_slopes(graph, start, radius, h, |_, _| Some(0.0)).unwrap()
    }

    fn midpoint(graph: &GridGraph, node: NodeId, action: Action) -> (f64, f64) {
        let (e, _) = graph.edge(node, action).unwrap();
        graph.edge_midpoint(e)
    }

    #[test]
    fn test_seed_rejects_degenerate_region() {
        let g = line_graph(4);
        // Every slope huge: nothing within the radius is safe.
        let res = SeedRegion::from_slopes(&g, 0, 1, 0.5, |_, _| Some(100.0));
        assert!(matches!(res, Err(ExploreError::NoSafeSeed { start: 0 })));
    }

    #[test]
    fn test_engine_rejects_bad_parameters() {
        let g = line_graph(3);
        let seed = flat_seed(&g, 0, 1, 0.5);
        assert!(SafeSetEngine::new(&g, 0.0, 0.5, 1.0, seed.clone()).is_err());
        assert!(SafeSetEngine::new(&g, 3.0, -0.5, 1.0, seed.clone()).is_err());
        assert!(SafeSetEngine::new(&g, 3.0, 0.5, f64::NAN, seed).is_err());
    }

    #[test]
    fn test_certified_grows_along_tight_evidence() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 10.0, seed).unwrap();

        // Tight flat evidence on edges 0-1 and 1-2; edge 2-3 unknown.
        // Lipschitz slack of 10·d certifies nothing here.
        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 0, Action::Right), 0.0, 1e-6);
        belief.set(midpoint(&g, 1, Action::Right), 0.0, 1e-6);

        let sets = engine.recompute(&g, &belief);
        assert!(sets.is_certified(0, Action::Right));
        assert!(sets.is_certified(1, Action::Right));
        assert!(sets.is_certified(2, Action::Left));
        assert!(sets.is_certified(2, Action::Stay));
        assert!(!sets.is_certified(2, Action::Right), "edge 2-3 is unknown");
        // Node 3 is the one new node the frontier can gain.
        assert!(sets.in_frontier(2, Action::Right));
        assert_eq!(sets.frontier_count(), 1);
    }

    #[test]
    fn test_frontier_empties_when_world_is_covered() {
        let g = line_graph(3);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 10.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 0, Action::Right), 0.0, 1e-6);
        belief.set(midpoint(&g, 1, Action::Right), 0.0, 1e-6);

        let sets = engine.recompute(&g, &belief);
        assert_eq!(sets.certified_node_count(), 3);
        assert!(sets.frontier_is_empty());
    }

    #[test]
    fn test_unsafe_edge_blocks_reachability() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 10.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        // Edge 1-2 is a measured cliff.
        belief.set(midpoint(&g, 1, Action::Right), 10.0, 1e-6);

        let sets = engine.recompute(&g, &belief);
        assert!(!sets.is_safe(1, Action::Right));
        assert!(!sets.is_certified(1, Action::Right));
        assert!(!sets.is_certified(2, Action::Stay));
        // Frontier cannot route through the cliff: node 2 is unreachable
        // and the only way there is the unsafe edge.
        assert!(sets.frontier_is_empty());
    }

    #[test]
    fn test_safe_label_is_sticky_against_later_evidence() {
        let g = line_graph(3);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 10.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 1, Action::Right), 0.0, 1e-6);
        let sets = engine.recompute(&g, &belief);
        assert!(sets.is_safe(1, Action::Right));

        // Contradictory later evidence must not revoke the label.
        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 1, Action::Right), 10.0, 1e-6);
        let sets = engine.recompute(&g, &belief);
        assert!(sets.is_safe(1, Action::Right));
        assert!(sets.is_certified(1, Action::Right));
    }

    #[test]
    fn test_unsafe_label_is_sticky_against_contradictory_evidence() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 10.0, seed).unwrap();

        // Edge 1-2 measured well above the bound: Unsafe.
        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 1, Action::Right), 0.7, 1e-6);
        let sets = engine.recompute(&g, &belief);
        assert!(!sets.is_safe(1, Action::Right));

        // A contradictory later reading empties the running bound. The
        // label must hold: the edge stays out of S and Ŝ.
        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 1, Action::Right), 0.2, 1e-6);
        let sets = engine.recompute(&g, &belief);
        assert!(!sets.is_safe(1, Action::Right));
        assert!(!sets.is_certified(1, Action::Right));
        assert!(!sets.is_certified(2, Action::Stay));
    }

    #[test]
    fn test_lipschitz_propagation_cascades() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        // Small L: each midpoint step adds only 0.1 of slack.
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 0.1, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        // One tight measurement on edge 0-1 only.
        belief.set(midpoint(&g, 0, Action::Right), 0.0, 1e-8);

        let sets = engine.recompute(&g, &belief);
        // Edge 1-2: derived [−0.1, 0.1] ⊂ [−0.5, 0.5] — certified.
        assert!(sets.is_safe(1, Action::Right));
        // Edge 2-3 certified through the cascade from edge 1-2.
        assert!(sets.is_safe(2, Action::Right));
        assert_eq!(sets.certified_node_count(), 4);
    }

    #[test]
    fn test_propagation_stops_at_the_budgeted_slack() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        // L·d = 1.0 per step: wider than the whole safe range, so
        // propagation can never certify anything.
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 1.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 0, Action::Right), 0.0, 1e-8);

        let sets = engine.recompute(&g, &belief);
        assert!(!sets.is_safe(1, Action::Right));
        assert!(!sets.is_safe(2, Action::Right));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let g = line_graph(4);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 1.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 0, Action::Right), 0.0, 1e-6);
        belief.set(midpoint(&g, 1, Action::Right), 0.1, 0.01);

        let first = engine.recompute(&g, &belief);
        let second = engine.recompute(&g, &belief);
        for u in 0..g.num_nodes() {
            assert_eq!(first.safe_actions(u), second.safe_actions(u));
            assert_eq!(first.certified_actions(u), second.certified_actions(u));
            for a in Action::ALL {
                assert_eq!(first.in_frontier(u, a), second.in_frontier(u, a));
            }
        }
    }

    #[test]
    fn test_seed_inclusion_holds_every_round() {
        let g = GridGraph::new(3, 3, 1.0, 1.0).unwrap();
        let seed = flat_seed(&g, g.node_at(1, 1), 1, 0.5);
        let seed_sets = seed.transitions.clone();
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 1.0, seed).unwrap();

        let belief = TableBelief::new(100.0);
        for _ in 0..3 {
            let sets = engine.recompute(&g, &belief);
            for u in 0..g.num_nodes() {
                assert!(
                    seed_sets[u].is_subset_of(sets.certified_actions(u)),
                    "seed transition lost at node {}",
                    u
                );
            }
        }
    }

    #[test]
    fn test_invalid_posterior_reads_as_unknown() {
        let g = line_graph(3);
        let seed = flat_seed(&g, 0, 1, 0.5);
        let mut engine = SafeSetEngine::new(&g, 2.0, 0.5, 1.0, seed).unwrap();

        let mut belief = TableBelief::new(100.0);
        belief.set(midpoint(&g, 1, Action::Right), 0.0, -1.0);
        let sets = engine.recompute(&g, &belief);
        assert!(!sets.is_safe(1, Action::Right));
        assert!(!sets.is_certified(1, Action::Right));
    }
}
