//! Stack of open conversations.
//!
//! Only the top entry has a live [`SelectableViewport`]. Entries below it
//! keep a frozen [`ViewportState`] that is restored when the user comes
//! back up from a sidechain.

use crate::viewport::{SelectableViewport, ViewportState};

#[derive(Debug)]
struct StackEntry<C> {
    conversation: C,
    saved: Option<ViewportState>,
}

/// Result of [`NavigationStack::pop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    /// A parent conversation is on top again, with its saved state.
    Restored,
    /// The stack is empty: go back to the conversation list.
    ReturnToIndex,
}

#[derive(Debug)]
pub struct NavigationStack<C> {
    entries: Vec<StackEntry<C>>,
    live: SelectableViewport,
}

impl<C> Default for NavigationStack<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            live: SelectableViewport::default(),
        }
    }
}

impl<C> NavigationStack<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole stack with a single conversation and a fresh
    /// viewport.
    pub fn open_root(&mut self, conversation: C) {
        self.entries.clear();
        self.entries.push(StackEntry {
            conversation,
            saved: None,
        });
        self.reset_live();
    }

    /// Descend into `conversation`, freezing the current top's viewport.
    pub fn push(&mut self, conversation: C) {
        if let Some(top) = self.entries.last_mut() {
            top.saved = Some(self.live.snapshot());
        }
        self.entries.push(StackEntry {
            conversation,
            saved: None,
        });
        self.reset_live();
    }

    pub fn pop(&mut self) -> PopOutcome {
        self.entries.pop();
        match self.entries.last_mut() {
            Some(top) => {
                match top.saved.take() {
                    Some(state) => self.live.restore(state),
                    None => self.reset_live(),
                }
                PopOutcome::Restored
            }
            None => {
                self.reset_live();
                PopOutcome::ReturnToIndex
            }
        }
    }

    pub fn top(&self) -> Option<&C> {
        self.entries.last().map(|e| &e.conversation)
    }

    /// Top conversation together with the live viewport.
    pub fn top_with_viewport(&mut self) -> Option<(&mut C, &mut SelectableViewport)> {
        let live = &mut self.live;
        self.entries
            .last_mut()
            .map(|e| (&mut e.conversation, live))
    }

    pub fn viewport(&self) -> &SelectableViewport {
        &self.live
    }

    pub fn viewport_mut(&mut self) -> &mut SelectableViewport {
        &mut self.live
    }

    /// Conversations from the root down to the top.
    pub fn breadcrumbs(&self) -> impl Iterator<Item = &C> {
        self.entries.iter().map(|e| &e.conversation)
    }

    fn reset_live(&mut self) {
        let window = self.live.viewport_height();
        self.live = SelectableViewport::default();
        self.live.set_viewport_height(window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with_items(name: &'static str, items: usize) -> NavigationStack<&'static str> {
        let mut stack = NavigationStack::new();
        stack.viewport_mut().set_viewport_height(5);
        stack.open_root(name);
        stack.viewport_mut().set_item_count(items);
        stack
    }

    #[test]
    fn test_open_root_starts_fresh() {
        let mut stack = stack_with_items("a", 30);
        stack.viewport_mut().select(20);

        stack.open_root("b");
        stack.viewport_mut().set_item_count(30);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), Some(&"b"));
        assert_eq!(stack.viewport().selected(), Some(0));
        assert_eq!(stack.viewport().scroll_y(), 0);
        assert_eq!(stack.viewport().viewport_height(), 5);
    }

    #[test]
    fn test_push_pop_restores_selection_and_scroll() {
        let mut stack = stack_with_items("parent", 30);
        stack.viewport_mut().select(17);
        let scroll = stack.viewport().scroll_y();
        assert!(scroll > 0);

        stack.push("child");
        stack.viewport_mut().set_item_count(4);
        assert_eq!(stack.viewport().selected(), Some(0));
        stack.viewport_mut().select(3);

        assert_eq!(stack.pop(), PopOutcome::Restored);
        assert_eq!(stack.top(), Some(&"parent"));
        assert_eq!(stack.viewport().selected(), Some(17));
        assert_eq!(stack.viewport().scroll_y(), scroll);
    }

    #[test]
    fn test_pop_last_returns_to_index() {
        let mut stack = stack_with_items("only", 3);
        assert_eq!(stack.pop(), PopOutcome::ReturnToIndex);
        assert!(stack.is_empty());
        assert_eq!(stack.top(), None);
        assert_eq!(stack.pop(), PopOutcome::ReturnToIndex);
    }

    #[test]
    fn test_breadcrumbs_root_first() {
        let mut stack = stack_with_items("root", 1);
        stack.push("mid");
        stack.push("leaf");
        let crumbs: Vec<&str> = stack.breadcrumbs().copied().collect();
        assert_eq!(crumbs, vec!["root", "mid", "leaf"]);
    }
}
