//! Error taxonomy for the exploration core.
//!
//! All core errors are synchronous and surfaced to the caller immediately.
//! Nothing is retried: a transition that failed to classify must never be
//! retried into appearing safe.

use thiserror::Error;

use crate::grid::Action;

/// Errors produced by the exploration core.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// Invalid construction-time configuration (grid dims, steps, β, L, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The seed region around the start node contains no safe transition.
    #[error("seed region around node {start} contains no safe transition")]
    NoSafeSeed { start: usize },

    /// The expander frontier is empty: exploration has stalled.
    #[error("expander frontier is empty; exploration has stalled")]
    FrontierEmpty,

    /// The requested (node, action) pair does not name a transition.
    #[error("no such transition: {action:?} from node {node}")]
    NoSuchTransition { node: usize, action: Action },
}

pub type Result<T> = std::result::Result<T, ExploreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ExploreError::NoSuchTransition {
            node: 7,
            action: Action::Up,
        };
        assert!(e.to_string().contains("node 7"));
        assert!(e.to_string().contains("Up"));
    }

    #[test]
    fn test_config_error_message() {
        let e = ExploreError::Config("rows must be > 0".to_string());
        assert!(e.to_string().contains("rows must be > 0"));
    }
}
