//! Exact Gaussian-process regression over edge midpoints.
//!
//! Zero prior mean, RBF kernel, fixed hyperparameters. The fit is a dense
//! Cholesky solve of `K + σₙ²I`, recomputed eagerly on every update: the
//! exploration loop is strictly sequential and treats the surrogate as a
//! blocking, compute-bound collaborator. Cost grows cubically with the
//! number of accumulated observations, which stays small (one per
//! iteration of the sampling budget).

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::belief::{BeliefModel, RbfKernel};
use crate::error::{ExploreError, Result};

/// Posterior mean/variance pair at one query point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub mean: f64,
    pub var: f64,
}

/// Fixed GP hyperparameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GpConfig {
    /// Kernel length scale ℓ.
    pub length_scale: f64,

    /// Kernel signal variance σ² (prior variance).
    pub signal_variance: f64,

    /// Observation noise standard deviation σₙ.
    pub noise_std: f64,
}

impl GpConfig {
    pub fn validate(&self) -> Result<()> {
        RbfKernel::new(self.length_scale, self.signal_variance)?;
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(ExploreError::Config(format!(
                "noise std must be finite and non-negative, got {}",
                self.noise_std
            )));
        }
        Ok(())
    }
}

/// Exact GP regressor over 2D points.
pub struct GpSurrogate {
    kernel: RbfKernel,
    noise_variance: f64,

    /// Training inputs (edge midpoints).
    x: Vec<(f64, f64)>,

    /// Training targets (noisy canonical slopes).
    y: Vec<f64>,

    /// Cholesky factor of `K + σₙ²I` (lower triangular).
    chol: Option<Array2<f64>>,

    /// `(K + σₙ²I)⁻¹ y`.
    alpha: Option<Array1<f64>>,
}

impl GpSurrogate {
    pub fn new(config: GpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            kernel: RbfKernel::new(config.length_scale, config.signal_variance)?,
            noise_variance: config.noise_std * config.noise_std,
            x: Vec::new(),
            y: Vec::new(),
            chol: None,
            alpha: None,
        })
    }

    /// Replace all training data, then refit.
    pub fn fit(&mut self, points: &[(f64, f64)], values: &[f64]) -> Result<()> {
        if points.len() != values.len() {
            return Err(ExploreError::Config(format!(
                "fit inputs disagree: {} points vs {} values",
                points.len(),
                values.len()
            )));
        }
        self.x = points.to_vec();
        self.y = values.to_vec();
        self.refit();
        Ok(())
    }

    /// Accumulated training pairs.
    pub fn observations(&self) -> impl Iterator<Item = ((f64, f64), f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    fn refit(&mut self) {
        let n = self.x.len();
        if n == 0 {
            self.chol = None;
            self.alpha = None;
            return;
        }

        let mut gram = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..=i {
                let k = self.kernel.eval(self.x[i], self.x[j]);
                gram[[i, j]] = k;
                gram[[j, i]] = k;
            }
            gram[[i, i]] += self.noise_variance;
        }

        // Jitter escalation keeps near-singular systems factorable; the
        // classifier guards against anything that still goes wrong.
        let base_jitter = 1e-10 * self.kernel.signal_variance.max(1.0);
        let mut jitter = 0.0;
        for _ in 0..6 {
            let mut attempt = gram.clone();
            if jitter > 0.0 {
                for i in 0..n {
                    attempt[[i, i]] += jitter;
                }
            }
            if let Some(lower) = cholesky(&attempt) {
                let y = Array1::from_vec(self.y.clone());
                let tmp = solve_lower(&lower, &y);
                let alpha = solve_upper_transposed(&lower, &tmp);
                self.chol = Some(lower);
                self.alpha = Some(alpha);
                return;
            }
            jitter = if jitter == 0.0 { base_jitter } else { jitter * 100.0 };
        }

        // Factorization failed outright: report total uncertainty rather
        // than stale certainty.
        self.chol = None;
        self.alpha = None;
    }

    fn cross_covariance(&self, point: (f64, f64)) -> Array1<f64> {
        Array1::from_iter(self.x.iter().map(|&xi| self.kernel.eval(point, xi)))
    }
}

impl BeliefModel for GpSurrogate {
    fn predict(&self, point: (f64, f64)) -> Posterior {
        let prior_var = self.kernel.signal_variance;
        if self.x.is_empty() {
            return Posterior {
                mean: 0.0,
                var: prior_var,
            };
        }
        let (lower, alpha) = match (&self.chol, &self.alpha) {
            (Some(l), Some(a)) => (l, a),
            // Unfactorable system: fall back to the prior, flagged by the
            // full prior variance.
            _ => {
                return Posterior {
                    mean: 0.0,
                    var: prior_var,
                }
            }
        };

        let k_star = self.cross_covariance(point);
        let mean = k_star.dot(alpha);
        let v = solve_lower(lower, &k_star);
        let mut var = prior_var - v.dot(&v);
        // Rounding can push the variance a hair below zero.
        if var < 0.0 && var > -1e-9 * prior_var.max(1.0) {
            var = 0.0;
        }
        Posterior { mean, var }
    }

    fn update(&mut self, point: (f64, f64), value: f64) {
        self.x.push(point);
        self.y.push(value);
        self.refit();
    }

    fn len(&self) -> usize {
        self.x.len()
    }
}

/// Dense Cholesky factorization (lower triangular), `None` if the matrix
/// is not positive definite.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve `L x = b` for lower-triangular `L`.
fn solve_lower(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut x = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Solve `Lᵀ x = b` for lower-triangular `L`.
fn solve_upper_transposed(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}
