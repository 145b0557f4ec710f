//! Hyperparameter sweep over independent exploration runs.
//!
//! The one embarrassingly parallel structure in the experiment: each
//! (length scale, noise) combination owns its own grid world, belief
//! model and safety state, shares nothing mutable, and returns a result
//! struct. Aggregation happens in the caller; there are no shared
//! counters.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::belief::GpConfig;
use crate::error::Result;
use crate::explore::{ExploreConfig, Explorer};
use crate::grid::GridGraph;
use crate::oracle;
use crate::safety::SeedRegion;
use crate::terrain::Terrain;

/// Sweep axes and per-run budget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// GP length scales to try.
    pub length_scales: Vec<f64>,

    /// Observation noise levels to try.
    pub noise_levels: Vec<f64>,

    /// GP signal variance, shared across runs.
    pub signal_variance: f64,

    /// Sampling budget per run.
    pub budget: usize,

    /// Warm-up samples drawn from the seed region before the loop.
    pub warm_up: usize,
}

/// Outcome of one sweep cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub length_scale: f64,
    pub noise_std: f64,

    /// Iterations actually run (≤ budget when stalled).
    pub iterations: usize,

    /// Whether the run ended on an empty frontier.
    pub stalled: bool,

    /// |Ŝ| and its errors against the oracle.
    pub score: oracle::OracleScore,
}

/// Run every (length scale, noise) combination as an isolated explorer.
///
/// Runs execute in parallel; each instance's own iteration sequence stays
/// strictly ordered inside its worker. RNG seeds are derived per cell so
/// the sweep is reproducible regardless of scheduling.
pub fn run_sweep(
    config: &ExploreConfig,
    terrain: &Terrain,
    sweep: &SweepConfig,
    base_seed: u64,
) -> Result<Vec<RunReport>> {
    let cells: Vec<(usize, f64, f64)> = sweep
        .length_scales
        .iter()
        .flat_map(|&ls| sweep.noise_levels.iter().map(move |&nl| (ls, nl)))
        .enumerate()
        .map(|(i, (ls, nl))| (i, ls, nl))
        .collect();

    // Oracle truth is shared by every cell; the seed region is the same
    // construction each explorer performs, so the comparison is apples to
    // apples.
    let graph = GridGraph::new(config.rows, config.cols, config.step_row, config.step_col)?;
    let seed = SeedRegion::from_slopes(
        &graph,
        config.start,
        config.seed_radius,
        config.slope_bound(),
        |u, a| terrain.slope(&graph, u, a),
    )?;
    let truth = oracle::true_certified_set(&graph, terrain, config.slope_bound(), &seed.nodes);

    cells
        .into_par_iter()
        .map(|(index, length_scale, noise_std)| {
            let gp = GpConfig {
                length_scale,
                signal_variance: sweep.signal_variance,
                noise_std,
            };
            let mut explorer = Explorer::new(
                config.clone(),
                gp,
                terrain.clone(),
                base_seed.wrapping_add(index as u64),
            )?;
            explorer.warm_up(sweep.warm_up)?;
            let trace = explorer.run(sweep.budget)?;

            let score = explorer
                .sets()
                .map(|sets| oracle::score(sets, &truth))
                .unwrap_or_default();
            tracing::info!(
                length_scale,
                noise_std,
                certified = score.certified,
                missed = score.missed,
                excess = score.excess,
                "sweep cell finished"
            );
            Ok(RunReport {
                length_scale,
                noise_std,
                iterations: trace.iterations.len(),
                stalled: trace.stalled,
                score,
            })
        })
        .collect()
}
