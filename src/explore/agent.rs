//! The explorer: one grid world, one belief model, one safety engine,
//! driven through a strict recompute → select → observe sequence.
//!
//! Iterations never overlap: Ŝ at round t+1 is defined in terms of the
//! fully updated posterior from round t's observation, so the loop is
//! single-threaded by design. Parallelism lives one level up, in the
//! hyperparameter sweep over independent explorer instances.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::belief::{BeliefModel, GpConfig, GpSurrogate};
use crate::error::{ExploreError, Result};
use crate::grid::{Action, GridGraph, NodeId};
use crate::safety::{SafeSetEngine, SafeSets, SeedRegion};
use crate::sampling::select_next;
use crate::terrain::Terrain;

/// Fixed run configuration. Validated at construction; no runtime
/// reconfiguration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Grid rows.
    pub rows: usize,

    /// Grid columns.
    pub cols: usize,

    /// Physical step along rows.
    pub step_row: f64,

    /// Physical step along columns.
    pub step_col: f64,

    /// Safety threshold angle in degrees; the slope bound is its tangent.
    pub safety_angle_deg: f64,

    /// Confidence multiplier β.
    pub beta: f64,

    /// Lipschitz constant L of the slope field.
    pub lipschitz: f64,

    /// Start node (row-major index).
    pub start: NodeId,

    /// Known-safe radius around the start, in cells.
    pub seed_radius: usize,
}

impl ExploreConfig {
    /// The symmetric slope bound h = tan(angle).
    pub fn slope_bound(&self) -> f64 {
        self.safety_angle_deg.to_radians().tan()
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ExploreError::Config("grid must be non-empty".to_string()));
        }
        if self.start >= self.rows * self.cols {
            return Err(ExploreError::Config(format!(
                "start node {} outside {}x{} grid",
                self.start, self.rows, self.cols
            )));
        }
        if !(self.safety_angle_deg > 0.0) || self.safety_angle_deg >= 90.0 {
            return Err(ExploreError::Config(format!(
                "safety angle must be in (0, 90) degrees, got {}",
                self.safety_angle_deg
            )));
        }
        // Steps, β and L are re-checked by the graph and engine builders;
        // reject early for a single clear failure point.
        for (name, v) in [
            ("step_row", self.step_row),
            ("step_col", self.step_col),
            ("beta", self.beta),
            ("lipschitz", self.lipschitz),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(ExploreError::Config(format!(
                    "{} must be positive and finite, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

/// One ingested measurement.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Observation {
    /// Queried node.
    pub source: NodeId,

    /// Queried action.
    pub action: Action,

    /// Resolved destination node.
    pub target: NodeId,

    /// Noisy directed slope measurement.
    pub value: f64,
}

/// Outcome of one loop iteration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: usize,

    /// The sampled transition, absent when the frontier was empty.
    pub sampled: Option<(NodeId, Action)>,

    /// |Ŝ| after this round's recomputation.
    pub certified_count: usize,

    /// |G| after this round's recomputation.
    pub frontier_count: usize,

    /// True when exploration stalled this round.
    pub stalled: bool,
}

/// Full trace of a budgeted run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunTrace {
    pub iterations: Vec<IterationReport>,

    /// Whether the run ended on an empty frontier rather than budget
    /// exhaustion.
    pub stalled: bool,
}

impl RunTrace {
    pub fn final_certified_count(&self) -> usize {
        self.iterations
            .last()
            .map(|r| r.certified_count)
            .unwrap_or(0)
    }
}

/// The exploration agent.
pub struct Explorer {
    config: ExploreConfig,
    graph: GridGraph,
    engine: SafeSetEngine,
    belief: GpSurrogate,
    terrain: Terrain,
    noise: Option<Normal<f64>>,
    rng: StdRng,
    iteration: usize,
    last_sets: Option<SafeSets>,
    observations: Vec<Observation>,
}

impl Explorer {
    /// Build an explorer. Fails on invalid configuration, on a terrain
    /// that does not cover the grid, and on a degenerate seed region.
    pub fn new(
        config: ExploreConfig,
        gp: GpConfig,
        terrain: Terrain,
        rng_seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        let graph = GridGraph::new(config.rows, config.cols, config.step_row, config.step_col)?;
        terrain.matches(&graph)?;

        let h = config.slope_bound();
        let seed = SeedRegion::from_slopes(&graph, config.start, config.seed_radius, h, |u, a| {
            terrain.slope(&graph, u, a)
        })?;
        tracing::debug!(
            seed_nodes = seed.nodes.len(),
            start = config.start,
            "seed region built"
        );

        let engine = SafeSetEngine::new(&graph, config.beta, h, config.lipschitz, seed)?;
        let belief = GpSurrogate::new(gp)?;
        let noise = if gp.noise_std > 0.0 {
            // GpConfig validation already bounds noise_std; Normal::new
            // only fails on non-finite or negative std.
            Normal::new(0.0, gp.noise_std).ok()
        } else {
            None
        };

        Ok(Self {
            config,
            graph,
            engine,
            belief,
            terrain,
            noise,
            rng: StdRng::seed_from_u64(rng_seed),
            iteration: 0,
            last_sets: None,
            observations: Vec::new(),
        })
    }

    pub fn graph(&self) -> &GridGraph {
        &self.graph
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    pub fn belief(&self) -> &dyn BeliefModel {
        &self.belief
    }

    /// Seed nodes of the start region.
    pub fn seed_nodes(&self) -> &[NodeId] {
        &self.engine.seed().nodes
    }

    /// Read-only snapshot of the latest S/Ŝ/G, if any round has run.
    pub fn sets(&self) -> Option<&SafeSets> {
        self.last_sets.as_ref()
    }

    /// All ingested observations, in order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Measure one transition and feed the result to the belief model.
    ///
    /// The only way information enters the system. Observing the same
    /// transition twice just adds two training points. Only directional
    /// transitions carry a measurable slope; `Stay` is rejected.
    pub fn observe(&mut self, node: NodeId, action: Action) -> Result<Observation> {
        let target = self.graph.transition(node, action)?;
        let (edge, sign) = self
            .graph
            .edge(node, action)
            .ok_or(ExploreError::NoSuchTransition { node, action })?;

        // slope() is defined for every directional transition edge() accepts.
        let true_slope = self
            .terrain
            .slope(&self.graph, node, action)
            .ok_or(ExploreError::NoSuchTransition { node, action })?;
        let noise = self
            .noise
            .as_ref()
            .map(|n| n.sample(&mut self.rng))
            .unwrap_or(0.0);
        let value = true_slope + noise;

        // Store in the canonical edge direction so forward and reverse
        // traversals of one physical edge train the same query point.
        self.belief
            .update(self.graph.edge_midpoint(edge), sign * value);

        let obs = Observation {
            source: node,
            action,
            target,
            value,
        };
        self.observations.push(obs);
        Ok(obs)
    }

    /// Sample a handful of seed transitions before the main loop, the way
    /// a rover calibrates on the ground it was deployed on.
    pub fn warm_up(&mut self, samples: usize) -> Result<()> {
        let seed = self.engine.seed();
        let candidates: Vec<(NodeId, Action)> = seed
            .nodes
            .iter()
            .flat_map(|&u| {
                seed.transitions[u]
                    .iter()
                    .filter(|a| a.is_directional())
                    .map(move |a| (u, a))
            })
            .collect();
        if candidates.is_empty() {
            return Err(ExploreError::NoSafeSeed {
                start: self.config.start,
            });
        }
        for i in 0..samples {
            let (u, a) = candidates[i % candidates.len()];
            self.observe(u, a)?;
        }
        Ok(())
    }

    /// One iteration: recompute the sets, pick a frontier sample, observe
    /// it. An empty frontier is reported as a stall, not an error.
    pub fn step(&mut self) -> Result<IterationReport> {
        self.iteration += 1;
        let sets = self.engine.recompute(&self.graph, &self.belief);

        let report = match select_next(&self.graph, &sets, &self.belief) {
            Ok((node, action)) => {
                let certified_count = sets.certified_count();
                let frontier_count = sets.frontier_count();
                self.last_sets = Some(sets);
                let obs = self.observe(node, action)?;
                tracing::info!(
                    iteration = self.iteration,
                    node,
                    action = ?obs.action,
                    value = obs.value,
                    certified = certified_count,
                    frontier = frontier_count,
                    "sampled frontier transition"
                );
                IterationReport {
                    iteration: self.iteration,
                    sampled: Some((node, action)),
                    certified_count,
                    frontier_count,
                    stalled: false,
                }
            }
            Err(ExploreError::FrontierEmpty) => {
                tracing::warn!(
                    iteration = self.iteration,
                    certified = sets.certified_count(),
                    "frontier is empty; exploration stalled"
                );
                let report = IterationReport {
                    iteration: self.iteration,
                    sampled: None,
                    certified_count: sets.certified_count(),
                    frontier_count: 0,
                    stalled: true,
                };
                self.last_sets = Some(sets);
                report
            }
            Err(e) => return Err(e),
        };
        Ok(report)
    }

    /// Drive the loop for up to `budget` samples, stopping early on a
    /// stall.
    pub fn run(&mut self, budget: usize) -> Result<RunTrace> {
        let mut iterations = Vec::with_capacity(budget);
        let mut stalled = false;
        for _ in 0..budget {
            let report = self.step()?;
            let done = report.stalled;
            iterations.push(report);
            if done {
                stalled = true;
                break;
            }
        }
        Ok(RunTrace {
            iterations,
            stalled,
        })
    }
}
