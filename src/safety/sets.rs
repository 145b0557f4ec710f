//! Bitset-backed safe-set snapshots.
//!
//! Per-node action bitsets keep the three sets (S, Ŝ, G) cheap to copy,
//! compare and count. A snapshot is read-only output of the engine; the
//! caller never patches it.

use serde::{Deserialize, Serialize};

use crate::grid::{Action, NodeId};

/// A set of actions, packed into the low 5 bits of a byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet(u8);

impl ActionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, action: Action) {
        self.0 |= 1 << action.index();
    }

    pub fn remove(&mut self, action: Action) {
        self.0 &= !(1 << action.index());
    }

    pub fn contains(self, action: Action) -> bool {
        self.0 & (1 << action.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of actions in the set.
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether any non-stay action is present.
    pub fn any_directional(self) -> bool {
        self.0 & !1 != 0
    }

    /// Actions in index order.
    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::ALL
            .into_iter()
            .filter(move |a| self.contains(*a))
    }

    /// True if every action in `self` is also in `other`.
    pub fn is_subset_of(self, other: ActionSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn union(self, other: ActionSet) -> ActionSet {
        ActionSet(self.0 | other.0)
    }
}

/// Snapshot of the three sets the engine produces each round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafeSets {
    /// S: transitions currently labelled Safe.
    safe: Vec<ActionSet>,

    /// Ŝ: Safe transitions on a round-trip path from the seed region.
    certified: Vec<ActionSet>,

    /// G: frontier transitions whose sampling could grow Ŝ.
    frontier: Vec<ActionSet>,
}

impl SafeSets {
    pub(crate) fn new(
        safe: Vec<ActionSet>,
        certified: Vec<ActionSet>,
        frontier: Vec<ActionSet>,
    ) -> Self {
        Self {
            safe,
            certified,
            frontier,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.safe.len()
    }

    pub fn is_safe(&self, node: NodeId, action: Action) -> bool {
        self.safe[node].contains(action)
    }

    pub fn is_certified(&self, node: NodeId, action: Action) -> bool {
        self.certified[node].contains(action)
    }

    pub fn in_frontier(&self, node: NodeId, action: Action) -> bool {
        self.frontier[node].contains(action)
    }

    pub fn safe_actions(&self, node: NodeId) -> ActionSet {
        self.safe[node]
    }

    pub fn certified_actions(&self, node: NodeId) -> ActionSet {
        self.certified[node]
    }

    /// |Ŝ|: number of certified (node, action) pairs, stay included.
    pub fn certified_count(&self) -> usize {
        self.certified.iter().map(|s| s.count()).sum()
    }

    /// Number of nodes with at least one certified transition.
    pub fn certified_node_count(&self) -> usize {
        self.certified.iter().filter(|s| !s.is_empty()).count()
    }

    /// |G|.
    pub fn frontier_count(&self) -> usize {
        self.frontier.iter().map(|s| s.count()).sum()
    }

    /// Exploration has stalled when the frontier is empty.
    pub fn frontier_is_empty(&self) -> bool {
        self.frontier.iter().all(|s| s.is_empty())
    }

    /// Frontier transitions in (node, action-index) order.
    pub fn iter_frontier(&self) -> impl Iterator<Item = (NodeId, Action)> + '_ {
        self.frontier
            .iter()
            .enumerate()
            .flat_map(|(node, set)| set.iter().map(move |a| (node, a)))
    }

    /// Certified transitions in (node, action-index) order.
    pub fn iter_certified(&self) -> impl Iterator<Item = (NodeId, Action)> + '_ {
        self.certified
            .iter()
            .enumerate()
            .flat_map(|(node, set)| set.iter().map(move |a| (node, a)))
    }

    /// True if every certified transition of `self` is certified in `other`.
    pub fn certified_subset_of(&self, other: &SafeSets) -> bool {
        self.certified
            .iter()
            .zip(other.certified.iter())
            .all(|(a, b)| a.is_subset_of(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains() {
        let mut s = ActionSet::empty();
        assert!(s.is_empty());
        s.insert(Action::Up);
        s.insert(Action::Stay);
        assert!(s.contains(Action::Up));
        assert!(s.contains(Action::Stay));
        assert!(!s.contains(Action::Down));
        assert_eq!(s.count(), 2);
    }

    #[test]
    fn test_any_directional_ignores_stay() {
        let mut s = ActionSet::empty();
        s.insert(Action::Stay);
        assert!(!s.any_directional());
        s.insert(Action::Left);
        assert!(s.any_directional());
    }

    #[test]
    fn test_iter_in_index_order() {
        let mut s = ActionSet::empty();
        s.insert(Action::Right);
        s.insert(Action::Up);
        let actions: Vec<Action> = s.iter().collect();
        assert_eq!(actions, vec![Action::Up, Action::Right]);
    }

    #[test]
    fn test_subset() {
        let mut a = ActionSet::empty();
        a.insert(Action::Up);
        let mut b = a;
        b.insert(Action::Down);
        assert!(a.is_subset_of(b));
        assert!(!b.is_subset_of(a));
    }

    #[test]
    fn test_snapshot_counts() {
        let mut certified = vec![ActionSet::empty(); 3];
        certified[0].insert(Action::Stay);
        certified[0].insert(Action::Right);
        certified[1].insert(Action::Stay);
        let sets = SafeSets::new(
            vec![ActionSet::empty(); 3],
            certified,
            vec![ActionSet::empty(); 3],
        );
        assert_eq!(sets.certified_count(), 3);
        assert_eq!(sets.certified_node_count(), 2);
        assert!(sets.frontier_is_empty());
    }
}
