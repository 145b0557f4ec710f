//! Safe-set certification module.
//!
//! This is the heart of the crate: confidence-interval classification of
//! transitions, Lipschitz propagation to unobserved edges, and the
//! fixed-point computation of the certified reachable-and-returnable set
//! together with the expander frontier.

pub mod classifier;
pub mod engine;
pub mod sets;

pub use classifier::{classify, Interval, SafetyLabel};
pub use engine::{SafeSetEngine, SeedRegion};
pub use sets::{ActionSet, SafeSets};
