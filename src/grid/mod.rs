//! Grid graph module — the static topology everything else reads.
//!
//! Nodes are grid cells numbered in row-major order; edges are 4-neighbour
//! adjacency plus a self-loop "stay" action. Built once, then shared
//! read-only by the safety engine, the belief model and the oracle.

pub mod action;
pub mod graph;

pub use action::Action;
pub use graph::{EdgeId, GridGraph, NodeId};
