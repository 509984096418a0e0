//! The window picker / `show next|previous window` cursor
//! (SPEC_FULL.md §2 "Window picker / `show list`").
//!
//! Grounded in `original_source/include/core/window_list.h`: a cursor
//! over the *number*-ordered window list, toggled open/closed by `show
//! list` and stepped by `show next/previous window`. The interactive
//! picker UI itself (drawing a list of names) is the external
//! collaborator spec.md §1 scopes out ("text rendering"); this module
//! only owns which window is selected.

use crate::ids::WindowId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowListState {
    open: bool,
    cursor: Option<WindowId>,
}

impl WindowListState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn selected(&self) -> Option<WindowId> {
        self.cursor
    }

    /// `show list`: opens the picker over `by_number`, starting at
    /// `focused` if it is one of the listed windows, else the first
    /// entry. Closes it (without changing the cursor) if already open.
    pub fn toggle(&mut self, by_number: &[WindowId], focused: Option<WindowId>) {
        if self.open {
            self.open = false;
            return;
        }
        self.open = true;
        self.cursor = focused
            .filter(|w| by_number.contains(w))
            .or_else(|| by_number.first().copied());
    }

    /// Steps the selection forward (`show next window`) or backward
    /// (`show previous window`) by `count` entries, wrapping around
    /// `by_number`. A negative `count` steps backward regardless of
    /// which action produced it.
    pub fn step(&mut self, by_number: &[WindowId], count: i64) {
        if by_number.is_empty() {
            self.cursor = None;
            return;
        }
        let current = self
            .cursor
            .and_then(|w| by_number.iter().position(|&x| x == w))
            .unwrap_or(0) as i64;
        let len = by_number.len() as i64;
        let next = (current + count).rem_euclid(len);
        self.cursor = Some(by_number[next as usize]);
        self.open = true;
    }

    /// Drops `id` from consideration if it was the current selection
    /// (called on `DestroyNotify`).
    pub fn forget(&mut self, id: WindowId) {
        if self.cursor == Some(id) {
            self.cursor = None;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_opens_at_focused_then_closes() {
        let mut list = WindowListState::new();
        let ids = vec![WindowId(0), WindowId(1), WindowId(2)];
        list.toggle(&ids, Some(WindowId(1)));
        assert!(list.is_open());
        assert_eq!(list.selected(), Some(WindowId(1)));
        list.toggle(&ids, Some(WindowId(1)));
        assert!(!list.is_open());
    }

    #[test]
    fn step_wraps_around() {
        let mut list = WindowListState::new();
        let ids = vec![WindowId(0), WindowId(1), WindowId(2)];
        list.toggle(&ids, Some(WindowId(2)));
        list.step(&ids, 1);
        assert_eq!(list.selected(), Some(WindowId(0)));
        list.step(&ids, -1);
        assert_eq!(list.selected(), Some(WindowId(2)));
    }
}
