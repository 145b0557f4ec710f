//! Squared-exponential (RBF) covariance over 2D physical coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{ExploreError, Result};

/// Isotropic RBF kernel: `k(a, b) = σ² · exp(−‖a − b‖² / (2ℓ²))`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RbfKernel {
    /// Length scale ℓ (smoothness).
    pub length_scale: f64,

    /// Signal variance σ² (output scale); the prior variance at any point.
    pub signal_variance: f64,
}

impl RbfKernel {
    pub fn new(length_scale: f64, signal_variance: f64) -> Result<Self> {
        if !(length_scale > 0.0) || !length_scale.is_finite() {
            return Err(ExploreError::Config(format!(
                "kernel length scale must be positive and finite, got {}",
                length_scale
            )));
        }
        if !(signal_variance > 0.0) || !signal_variance.is_finite() {
            return Err(ExploreError::Config(format!(
                "kernel signal variance must be positive and finite, got {}",
                signal_variance
            )));
        }
        Ok(Self {
            length_scale,
            signal_variance,
        })
    }

    /// Covariance between two points.
    pub fn eval(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        let sq = dx * dx + dy * dy;
        self.signal_variance * (-sq / (2.0 * self.length_scale * self.length_scale)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(RbfKernel::new(0.0, 1.0).is_err());
        assert!(RbfKernel::new(1.0, -1.0).is_err());
        assert!(RbfKernel::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_self_covariance_is_signal_variance() {
        let k = RbfKernel::new(2.0, 144.0).unwrap();
        let p = (1.0, 3.0);
        assert!((k.eval(p, p) - 144.0).abs() < 1e-12);
    }

    #[test]
    fn test_decays_with_distance() {
        let k = RbfKernel::new(1.0, 1.0).unwrap();
        let near = k.eval((0.0, 0.0), (0.5, 0.0));
        let far = k.eval((0.0, 0.0), (3.0, 0.0));
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_symmetry() {
        let k = RbfKernel::new(1.5, 2.0).unwrap();
        let a = (0.3, 1.2);
        let b = (2.0, -0.5);
        assert!((k.eval(a, b) - k.eval(b, a)).abs() < 1e-15);
    }
}
