//! Terrain source: the true altitude field.
//!
//! Provided once at setup and read-only afterwards. Raster-file
//! acquisition and format conversion live outside this crate; tests and
//! the demo binary use the synthetic generators.

pub mod synthetic;

use ndarray::Array2;

use crate::error::{ExploreError, Result};
use crate::grid::{Action, GridGraph, NodeId};

/// True altitudes over the grid, indexed by (row, col).
#[derive(Clone, Debug)]
pub struct Terrain {
    altitudes: Array2<f64>,
}

impl Terrain {
    pub fn new(altitudes: Array2<f64>) -> Result<Self> {
        if altitudes.nrows() == 0 || altitudes.ncols() == 0 {
            return Err(ExploreError::Config(
                "terrain must have at least one cell".to_string(),
            ));
        }
        if altitudes.iter().any(|v| !v.is_finite()) {
            return Err(ExploreError::Config(
                "terrain altitudes must be finite".to_string(),
            ));
        }
        Ok(Self { altitudes })
    }

    pub fn rows(&self) -> usize {
        self.altitudes.nrows()
    }

    pub fn cols(&self) -> usize {
        self.altitudes.ncols()
    }

    /// Check that this terrain covers the given graph.
    pub fn matches(&self, graph: &GridGraph) -> Result<()> {
        if self.rows() != graph.rows() || self.cols() != graph.cols() {
            return Err(ExploreError::Config(format!(
                "terrain is {}x{} but grid is {}x{}",
                self.rows(),
                self.cols(),
                graph.rows(),
                graph.cols()
            )));
        }
        Ok(())
    }

    pub fn altitude(&self, row: usize, col: usize) -> f64 {
        self.altitudes[[row, col]]
    }

    pub fn altitude_at(&self, graph: &GridGraph, node: NodeId) -> f64 {
        let (row, col) = graph.row_col(node);
        self.altitudes[[row, col]]
    }

    /// True directed slope of a transition: altitude difference divided by
    /// the physical step, or `None` where the transition is undefined or a
    /// self-loop.
    pub fn slope(&self, graph: &GridGraph, node: NodeId, action: Action) -> Option<f64> {
        let target = graph.neighbor(node, action)?;
        if target == node {
            return None;
        }
        let (edge, _) = graph.edge(node, action)?;
        let rise = self.altitude_at(graph, target) - self.altitude_at(graph, node);
        Some(rise / graph.edge_length(edge))
    }

    /// True slope in the canonical edge direction (low node → high node).
    pub fn canonical_slope(&self, graph: &GridGraph, edge: usize) -> f64 {
        let (a, b) = graph.edge_endpoints(edge);
        (self.altitude_at(graph, b) - self.altitude_at(graph, a)) / graph.edge_length(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_rejects_non_finite() {
        let t = Terrain::new(arr2(&[[0.0, f64::NAN]]));
        assert!(t.is_err());
    }

    #[test]
    fn test_slope_uses_edge_length() {
        let g = GridGraph::new(2, 2, 2.0, 1.0).unwrap();
        let t = Terrain::new(arr2(&[[0.0, 1.0], [4.0, 5.0]])).unwrap();
        // Right: rise 1 over step_col 1.
        assert_eq!(t.slope(&g, 0, Action::Right), Some(1.0));
        // Down: rise 4 over step_row 2.
        assert_eq!(t.slope(&g, 0, Action::Down), Some(2.0));
        // Reverse direction negates.
        assert_eq!(t.slope(&g, 1, Action::Left), Some(-1.0));
    }

    #[test]
    fn test_slope_undefined_at_boundary_and_stay() {
        let g = GridGraph::new(2, 2, 1.0, 1.0).unwrap();
        let t = Terrain::new(arr2(&[[0.0, 0.0], [0.0, 0.0]])).unwrap();
        assert_eq!(t.slope(&g, 0, Action::Up), None);
        assert_eq!(t.slope(&g, 0, Action::Stay), None);
    }

    #[test]
    fn test_canonical_slope_matches_forward_direction() {
        let g = GridGraph::new(1, 3, 1.0, 1.0).unwrap();
        let t = Terrain::new(arr2(&[[0.0, 2.0, 1.0]])).unwrap();
        let (e, sign) = g.edge(0, Action::Right).unwrap();
        assert_eq!(sign, 1.0);
        assert_eq!(t.canonical_slope(&g, e), 2.0);
        let (e, sign) = g.edge(2, Action::Left).unwrap();
        assert_eq!(sign, -1.0);
        assert_eq!(t.canonical_slope(&g, e), -1.0);
    }

    #[test]
    fn test_matches_checks_shape() {
        let g = GridGraph::new(2, 3, 1.0, 1.0).unwrap();
        let t = Terrain::new(arr2(&[[0.0, 0.0], [0.0, 0.0]])).unwrap();
        assert!(t.matches(&g).is_err());
    }
}
