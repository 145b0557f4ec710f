//! Static grid topology: row-major nodes, 4-neighbour edges, physical
//! coordinates.
//!
//! The graph is an arena of index-identified nodes and edges; nothing in it
//! is mutated after construction. Directed transitions map onto canonical
//! undirected edges (lower node index → higher node index) plus a sign, so
//! the belief model sees one query point per physical edge.

use crate::error::{ExploreError, Result};
use crate::grid::Action;

/// Index of a grid cell (row-major).
pub type NodeId = usize;

/// Index of a canonical undirected edge.
pub type EdgeId = usize;

/// The static grid graph.
#[derive(Clone, Debug)]
pub struct GridGraph {
    rows: usize,
    cols: usize,
    step: (f64, f64),

    /// Canonical edges as (low node, high node) pairs.
    edges: Vec<(NodeId, NodeId)>,

    /// Right-neighbour edge per node, if any.
    h_edges: Vec<Option<EdgeId>>,

    /// Down-neighbour edge per node, if any.
    v_edges: Vec<Option<EdgeId>>,

    /// Edges incident to each node (at most 4).
    node_edges: Vec<Vec<EdgeId>>,
}

impl GridGraph {
    /// Build a grid graph. Rejects empty dimensions and non-positive steps.
    pub fn new(rows: usize, cols: usize, step_row: f64, step_col: f64) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ExploreError::Config(format!(
                "grid dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }
        if !(step_row > 0.0) || !(step_col > 0.0) {
            return Err(ExploreError::Config(format!(
                "step sizes must be positive, got ({}, {})",
                step_row, step_col
            )));
        }

        let n = rows * cols;
        let mut edges = Vec::with_capacity(rows * (cols - 1) + (rows - 1) * cols);
        let mut h_edges = vec![None; n];
        let mut v_edges = vec![None; n];

        for node in 0..n {
            let (row, col) = (node / cols, node % cols);
            if col + 1 < cols {
                h_edges[node] = Some(edges.len());
                edges.push((node, node + 1));
            }
            if row + 1 < rows {
                v_edges[node] = Some(edges.len());
                edges.push((node, node + cols));
            }
        }

        let mut node_edges = vec![Vec::new(); n];
        for (e, &(a, b)) in edges.iter().enumerate() {
            node_edges[a].push(e);
            node_edges[b].push(e);
        }

        Ok(Self {
            rows,
            cols,
            step: (step_row, step_col),
            edges,
            h_edges,
            v_edges,
            node_edges,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_nodes(&self) -> usize {
        self.rows * self.cols
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Node index from (row, col).
    pub fn node_at(&self, row: usize, col: usize) -> NodeId {
        row * self.cols + col
    }

    /// (row, col) of a node.
    pub fn row_col(&self, node: NodeId) -> (usize, usize) {
        (node / self.cols, node % self.cols)
    }

    /// Physical coordinates of a node.
    pub fn coords(&self, node: NodeId) -> (f64, f64) {
        let (row, col) = self.row_col(node);
        (row as f64 * self.step.0, col as f64 * self.step.1)
    }

    /// Destination of an action, or `None` at a boundary. `Stay` always
    /// resolves to the node itself.
    pub fn neighbor(&self, node: NodeId, action: Action) -> Option<NodeId> {
        if node >= self.num_nodes() {
            return None;
        }
        let (row, col) = self.row_col(node);
        let (dr, dc) = action.delta();
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr as usize >= self.rows || nc as usize >= self.cols {
            return None;
        }
        Some(self.node_at(nr as usize, nc as usize))
    }

    /// Destination of an action, rejecting undefined transitions.
    pub fn transition(&self, node: NodeId, action: Action) -> Result<NodeId> {
        self.neighbor(node, action)
            .ok_or(ExploreError::NoSuchTransition { node, action })
    }

    /// Canonical edge and sign for a directional transition.
    ///
    /// The sign is +1.0 when the transition follows the canonical direction
    /// (low node → high node) and −1.0 otherwise. `Stay` and boundary
    /// transitions have no edge.
    pub fn edge(&self, node: NodeId, action: Action) -> Option<(EdgeId, f64)> {
        let target = self.neighbor(node, action)?;
        if target == node {
            return None;
        }
        let low = node.min(target);
        let e = if matches!(action, Action::Left | Action::Right) {
            self.h_edges[low]?
        } else {
            self.v_edges[low]?
        };
        let sign = if node < target { 1.0 } else { -1.0 };
        Some((e, sign))
    }

    /// Endpoints of a canonical edge (low node, high node).
    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        self.edges[edge]
    }

    /// Physical midpoint of a canonical edge. This is the belief-model
    /// query point for the edge's safety feature.
    pub fn edge_midpoint(&self, edge: EdgeId) -> (f64, f64) {
        let (a, b) = self.edges[edge];
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        ((ax + bx) / 2.0, (ay + by) / 2.0)
    }

    /// Physical length of a canonical edge.
    pub fn edge_length(&self, edge: EdgeId) -> f64 {
        let (a, b) = self.edges[edge];
        if b == a + 1 && self.cols > 1 {
            self.step.1
        } else {
            self.step.0
        }
    }

    /// Euclidean distance between two edge midpoints.
    pub fn edge_distance(&self, a: EdgeId, b: EdgeId) -> f64 {
        let (ax, ay) = self.edge_midpoint(a);
        let (bx, by) = self.edge_midpoint(b);
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Edges sharing an endpoint with `edge` (excluding itself).
    pub fn adjacent_edges(&self, edge: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        let (a, b) = self.edges[edge];
        self.node_edges[a]
            .iter()
            .chain(self.node_edges[b].iter())
            .copied()
            .filter(move |&e| e != edge)
    }

    /// Edges incident to a node.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.node_edges[node]
    }

    /// Nodes within a Chebyshev radius (in cells) of a centre node.
    pub fn nodes_within(&self, center: NodeId, radius: usize) -> Vec<NodeId> {
        let (cr, cc) = self.row_col(center);
        let r0 = cr.saturating_sub(radius);
        let r1 = (cr + radius).min(self.rows - 1);
        let c0 = cc.saturating_sub(radius);
        let c1 = (cc + radius).min(self.cols - 1);
        let mut out = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                out.push(self.node_at(row, col));
            }
        }
        out
    }
}
