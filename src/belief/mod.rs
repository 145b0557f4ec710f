//! Belief model: the probabilistic surrogate over edge safety features.
//!
//! The core only uses the query/update contract defined by [`BeliefModel`];
//! the concrete surrogate is an exact Gaussian-process regressor with an
//! RBF kernel over canonical edge midpoints.

pub mod gp;
pub mod kernel;

pub use gp::{GpConfig, GpSurrogate, Posterior};
pub use kernel::RbfKernel;

/// Query/update contract of the probabilistic surrogate.
///
/// Query points are physical 2D coordinates (canonical edge midpoints).
/// Updates append training data; nothing is ever discarded short of
/// rebuilding the model.
pub trait BeliefModel {
    /// Posterior mean and variance of the safety feature at a point.
    fn predict(&self, point: (f64, f64)) -> Posterior;

    /// Append one noisy observation at a point.
    fn update(&mut self, point: (f64, f64), value: f64);

    /// Number of accumulated observations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
