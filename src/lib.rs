//! # RIDGELINE
//!
//! **Certify Before You Step** — safe exploration of an unknown terrain
//! by a rover that must never attempt a transition steeper than its
//! climbing limit, and must always keep a certified path home.
//!
//! ## Core Components
//!
//! 1. **Grid World** — 2D lattice of cells with Stay/Up/Down/Left/Right
//!    transitions over canonical undirected edges
//! 2. **Belief Model** — Gaussian-process surrogate over edge slopes
//!    with β-scaled confidence intervals
//! 3. **Safety Engine** — monotone interval contraction, Lipschitz
//!    propagation, and the reachable-returnable closure Ŝ
//! 4. **Frontier Sampling** — most-uncertain transition on the expander
//!    frontier G, observed one at a time
//! 5. **Oracle Scoring** — noise-free ground truth for experiment
//!    evaluation, never consulted online
//! 6. **Hyperparameter Sweep** — parallel grid of independent runs over
//!    GP length scales and noise levels
//!
//! ## Loop
//!
//! - recompute S, Ŝ, G from the posterior
//! - sample the highest-variance frontier transition
//! - fold the measurement into the belief, repeat until budget or stall

pub mod belief;
pub mod error;
pub mod explore;
pub mod grid;
pub mod oracle;
pub mod sampling;
pub mod safety;
pub mod sweep;
pub mod terrain;

/// Experiment-wide defaults.
pub mod config {
    /// Confidence multiplier β on the posterior standard deviation.
    pub const DEFAULT_BETA: f64 = 3.0;

    /// Lipschitz constant of the slope field.
    pub const DEFAULT_LIPSCHITZ: f64 = 1.0;

    /// Maximum traversable incline, in degrees.
    pub const DEFAULT_SAFETY_ANGLE_DEG: f64 = 20.0;

    /// GP signal variance (altitude units squared).
    pub const DEFAULT_SIGNAL_VARIANCE: f64 = 144.0;

    /// GP length scale, in cells.
    pub const DEFAULT_LENGTH_SCALE: f64 = 11.5;

    /// Observation noise standard deviation.
    pub const DEFAULT_NOISE_STD: f64 = 0.075;

    /// Physical distance between adjacent cells, in metres.
    pub const DEFAULT_STEP: f64 = 2.0;

    /// Known-safe radius around the start node, in cells.
    pub const DEFAULT_SEED_RADIUS: usize = 4;

    /// Sampling budget of a single run.
    pub const DEFAULT_BUDGET: usize = 50;

    /// Length scales swept in the calibration experiment.
    pub const SWEEP_LENGTH_SCALES: [f64; 4] = [10.0, 11.0, 12.0, 13.0];

    /// Noise levels swept in the calibration experiment.
    pub const SWEEP_NOISE_LEVELS: [f64; 5] = [0.01, 0.06, 0.11, 0.16, 0.21];

    /// The slope bound h = tan(angle) for the default safety angle.
    pub fn default_slope_bound() -> f64 {
        DEFAULT_SAFETY_ANGLE_DEG.to_radians().tan()
    }
}
