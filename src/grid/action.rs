//! The five actions available from any grid cell.
//!
//! Index order is fixed (Stay = 0) and used everywhere for bitsets and
//! deterministic tie-breaking, so it must never be reordered.

use serde::{Deserialize, Serialize};

/// A move from a grid cell: stay in place or step to a 4-neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Self-loop. Always trivially safe.
    Stay,
    /// Row − 1.
    Up,
    /// Row + 1.
    Down,
    /// Column − 1.
    Left,
    /// Column + 1.
    Right,
}

impl Action {
    /// Number of actions.
    pub const COUNT: usize = 5;

    /// All actions in index order.
    pub const ALL: [Action; 5] = [
        Action::Stay,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
    ];

    /// The four directional actions in index order.
    pub const DIRECTIONAL: [Action; 4] =
        [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Stable index of this action (Stay = 0).
    pub fn index(self) -> usize {
        match self {
            Action::Stay => 0,
            Action::Up => 1,
            Action::Down => 2,
            Action::Left => 3,
            Action::Right => 4,
        }
    }

    /// Action from its stable index.
    pub fn from_index(idx: usize) -> Option<Action> {
        Action::ALL.get(idx).copied()
    }

    /// Row/column delta applied by this action.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Stay => (0, 0),
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// The action that undoes this one.
    pub fn opposite(self) -> Action {
        match self {
            Action::Stay => Action::Stay,
            Action::Up => Action::Down,
            Action::Down => Action::Up,
            Action::Left => Action::Right,
            Action::Right => Action::Left,
        }
    }

    /// Whether this action moves to a different cell.
    pub fn is_directional(self) -> bool {
        !matches!(self, Action::Stay)
    }
}
