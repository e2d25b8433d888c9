//! Manual checkpoints: a LIFO stack of player snapshots.
//!
//! ## Policy
//!
//!   - `save` always pushes, even when the new state equals the top.
//!   - `undo` pops exactly one entry and hands it back.
//!   - No depth limit, no eviction.
//!
//! The stack only holds copies. Restoring is the caller's job, and an empty
//! stack means the caller must leave the live state alone.

use crate::domain::entity::PlayerState;

#[derive(Clone, Debug, Default)]
pub struct SaveStack {
    saves: Vec<PlayerState>,
}

impl SaveStack {
    pub fn new() -> Self {
        SaveStack::default()
    }

    /// Push a copy of `state`.
    pub fn save(&mut self, state: &PlayerState) {
        self.saves.push(*state);
    }

    /// Pop the most recent checkpoint. `None` when nothing is saved.
    pub fn undo(&mut self) -> Option<PlayerState> {
        self.saves.pop()
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    /// Drop every checkpoint (level transition).
    pub fn clear(&mut self) {
        self.saves.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> PlayerState {
        PlayerState::spawn(x, y)
    }

    #[test]
    fn undo_on_empty_reports_none() {
        let mut s = SaveStack::new();
        assert_eq!(s.undo(), None);
        assert!(s.is_empty());
    }

    #[test]
    fn lifo_order() {
        let mut s = SaveStack::new();
        s.save(&at(1, 1));
        s.save(&at(2, 2));
        s.save(&at(3, 3));
        assert_eq!(s.undo(), Some(at(3, 3)));
        assert_eq!(s.undo(), Some(at(2, 2)));
        assert_eq!(s.undo(), Some(at(1, 1)));
        assert_eq!(s.undo(), None);
    }

    #[test]
    fn duplicate_saves_are_kept() {
        let mut s = SaveStack::new();
        s.save(&at(4, 4));
        s.save(&at(4, 4));
        assert_eq!(s.len(), 2);
        assert_eq!(s.undo(), Some(at(4, 4)));
        assert_eq!(s.undo(), Some(at(4, 4)));
        assert!(s.is_empty());
    }

    #[test]
    fn saved_copy_is_independent_of_live_state() {
        let mut s = SaveStack::new();
        let mut live = PlayerState { x: 2, y: 3, vy: -1.6, grounded: false };
        s.save(&live);
        live.x = 9;
        live.vy = 2.0;
        live.grounded = true;
        assert_eq!(s.undo(), Some(PlayerState { x: 2, y: 3, vy: -1.6, grounded: false }));
    }

    #[test]
    fn clear_empties_stack() {
        let mut s = SaveStack::new();
        s.save(&at(0, 0));
        s.save(&at(1, 0));
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.undo(), None);
    }
}
