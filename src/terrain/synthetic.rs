//! Synthetic altitude fields for demos and tests.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ExploreError, Result};
use crate::terrain::Terrain;

/// Perfectly flat terrain at a fixed altitude.
pub fn flat(rows: usize, cols: usize, level: f64) -> Result<Terrain> {
    Terrain::new(Array2::from_elem((rows, cols), level))
}

/// Smooth rolling terrain: a sum of seeded Gaussian bumps. Bump heights
/// are bounded by `amplitude`; zero amplitude yields flat terrain.
pub fn hills(
    rows: usize,
    cols: usize,
    n_bumps: usize,
    amplitude: f64,
    radius: f64,
    seed: u64,
) -> Result<Terrain> {
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(ExploreError::Config(format!(
            "hills amplitude must be finite and non-negative, got {}",
            amplitude
        )));
    }
    if !(radius > 0.0) || !radius.is_finite() {
        return Err(ExploreError::Config(format!(
            "hills radius must be positive and finite, got {}",
            radius
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let bumps: Vec<(f64, f64, f64)> = (0..n_bumps)
        .map(|_| {
            let r = rng.gen_range(0.0..rows as f64);
            let c = rng.gen_range(0.0..cols as f64);
            let a = rng.gen_range(-1.0..1.0) * amplitude;
            (r, c, a)
        })
        .collect();

    let field = Array2::from_shape_fn((rows, cols), |(row, col)| {
        bumps
            .iter()
            .map(|&(br, bc, a)| {
                let d2 = (row as f64 - br).powi(2) + (col as f64 - bc).powi(2);
                a * (-d2 / (2.0 * radius * radius)).exp()
            })
            .sum()
    });
    Terrain::new(field)
}

/// Flat terrain with one row dropped by `depth`: a cliff no safe rover
/// should ever cross.
pub fn cliff(rows: usize, cols: usize, cliff_row: usize, depth: f64) -> Result<Terrain> {
    let field = Array2::from_shape_fn((rows, cols), |(row, _)| {
        if row >= cliff_row {
            -depth
        } else {
            0.0
        }
    });
    Terrain::new(field)
}
