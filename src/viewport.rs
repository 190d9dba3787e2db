//! Virtualized selection and scrolling over variable-height items.
//!
//! The viewport never sees item content. It knows an item count, a height
//! per item that stays unknown until the paint pass measures it, and the
//! height of the window. Unknown heights count as `default_height` so
//! every operation works on estimates and corrects itself as
//! measurements arrive through [`SelectableViewport::resolve_height`].
//!
//! After every mutation the selection is clamped and the window scrolled
//! so the selected item is fully visible, then `scroll_y` is clamped to
//! `[0, max(0, total_height - viewport_height)]`. An item taller than the
//! window is aligned to its top when selected; after that the window stays
//! inside the item and single steps or page moves scroll through it before
//! the selection moves on.

use std::ops::Range;

/// Frozen selection/scroll state of a viewport that is not on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportState {
    pub selected_index: usize,
    pub scroll_y: usize,
    pub item_heights: Vec<Option<usize>>,
}

#[derive(Debug, Clone)]
pub struct SelectableViewport {
    selected: usize,
    scroll_y: usize,
    heights: Vec<Option<usize>>,
    viewport_height: usize,
    default_height: usize,
}

impl Default for SelectableViewport {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SelectableViewport {
    pub fn new(default_height: usize) -> Self {
        Self {
            selected: 0,
            scroll_y: 0,
            heights: Vec::new(),
            viewport_height: 0,
            default_height: default_height.max(1),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn item_count(&self) -> usize {
        self.heights.len()
    }

    /// The selected index, `None` for an empty list.
    pub fn selected(&self) -> Option<usize> {
        (!self.heights.is_empty()).then_some(self.selected)
    }

    pub fn scroll_y(&self) -> usize {
        self.scroll_y
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Height of item `i`, falling back to the default while unknown.
    pub fn height(&self, i: usize) -> usize {
        self.heights
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(self.default_height)
    }

    pub fn is_resolved(&self, i: usize) -> bool {
        matches!(self.heights.get(i), Some(Some(_)))
    }

    /// Offset of item `i` from the top of the list.
    pub fn position(&self, i: usize) -> usize {
        (0..i.min(self.heights.len())).map(|j| self.height(j)).sum()
    }

    pub fn total_height(&self) -> usize {
        self.position(self.heights.len())
    }

    /// Mean of the measured heights, or the default when none are known.
    pub fn average_height(&self) -> usize {
        let (sum, n) = self
            .heights
            .iter()
            .flatten()
            .fold((0usize, 0usize), |(s, n), h| (s + h, n + 1));
        if n == 0 {
            self.default_height
        } else {
            (sum / n).max(1)
        }
    }

    /// Items intersecting the window `[scroll_y, scroll_y + viewport_height)`.
    pub fn visible_range(&self) -> Range<usize> {
        let window_end = self.scroll_y + self.viewport_height;
        let mut top = 0;
        let mut start = None;
        for i in 0..self.heights.len() {
            let bottom = top + self.height(i);
            if start.is_none() && bottom > self.scroll_y {
                start = Some(i);
            }
            if top >= window_end {
                return start.unwrap_or(i)..i;
            }
            top = bottom;
        }
        start.unwrap_or(self.heights.len())..self.heights.len()
    }

    // -- structural changes ---------------------------------------------------

    /// Change the item count, keeping known heights of surviving items.
    pub fn set_item_count(&mut self, n: usize) {
        self.heights.resize(n, None);
        self.settle();
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        if self.viewport_height != height {
            self.viewport_height = height;
            self.settle();
        }
    }

    /// Record a measured height. A zero is treated as not yet laid out.
    ///
    /// Returns whether the stored height changed.
    pub fn resolve_height(&mut self, i: usize, measured: usize) -> bool {
        let Some(slot) = self.heights.get_mut(i) else {
            return false;
        };
        let new = (measured > 0).then_some(measured);
        if *slot == new {
            return false;
        }
        *slot = new;
        self.settle();
        true
    }

    /// Forget the height of item `i` after its content changed.
    pub fn invalidate_height(&mut self, i: usize) {
        if let Some(slot) = self.heights.get_mut(i) {
            *slot = None;
            self.settle();
        }
    }

    /// Forget every height, e.g. after the wrap width changed.
    pub fn invalidate_all(&mut self) {
        self.heights.iter_mut().for_each(|h| *h = None);
        self.settle();
    }

    // -- navigation -----------------------------------------------------------

    /// Move the selection by `delta` items. A single step first scrolls
    /// through a selected item taller than the window, one row at a time.
    pub fn move_selection(&mut self, delta: isize) {
        if self.heights.is_empty() {
            return;
        }
        if delta.abs() == 1 && self.scroll_within(delta, 1) {
            return;
        }
        let last = self.heights.len() - 1;
        self.set_selected(self.selected.saturating_add_signed(delta).min(last));
    }

    pub fn select(&mut self, i: usize) {
        if self.heights.is_empty() {
            return;
        }
        self.set_selected(i.min(self.heights.len() - 1));
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    /// Move by about one window of items. `direction` is `1` or `-1`.
    pub fn page_move(&mut self, direction: isize) {
        if self.scroll_within(direction, self.viewport_height) {
            return;
        }
        let step = self.items_per(self.viewport_height);
        self.move_selection(direction.signum() * step as isize);
    }

    /// Move by about half a window of items.
    pub fn half_page_move(&mut self, direction: isize) {
        if self.scroll_within(direction, (self.viewport_height / 2).max(1)) {
            return;
        }
        let step = self.items_per(self.viewport_height / 2);
        self.move_selection(direction.signum() * step as isize);
    }

    /// Scroll `rows` through the selected item when it is taller than the
    /// window and its edge in `direction` is still hidden.
    ///
    /// Returns whether the window moved.
    fn scroll_within(&mut self, direction: isize, rows: usize) -> bool {
        let window = self.viewport_height;
        if self.heights.is_empty() || window == 0 || rows == 0 {
            return false;
        }
        let top = self.position(self.selected);
        let h = self.height(self.selected);
        if h <= window {
            return false;
        }
        let last_scroll = top + h - window;
        if direction > 0 && self.scroll_y < last_scroll {
            self.scroll_y = (self.scroll_y + rows).min(last_scroll);
        } else if direction < 0 && self.scroll_y > top {
            self.scroll_y = self.scroll_y.saturating_sub(rows).max(top);
        } else {
            return false;
        }
        self.settle();
        true
    }

    /// A newly selected item taller than the window starts at its top.
    fn set_selected(&mut self, i: usize) {
        if i != self.selected {
            self.selected = i;
            if self.viewport_height > 0 && self.height(i) > self.viewport_height {
                self.scroll_y = self.position(i);
            }
        }
        self.settle();
    }

    fn items_per(&self, rows: usize) -> usize {
        (rows / self.average_height()).max(1)
    }

    // -- persistence ----------------------------------------------------------

    pub fn snapshot(&self) -> ViewportState {
        ViewportState {
            selected_index: self.selected,
            scroll_y: self.scroll_y,
            item_heights: self.heights.clone(),
        }
    }

    /// Restore a snapshot. The current viewport height is kept.
    pub fn restore(&mut self, state: ViewportState) {
        self.selected = state.selected_index;
        self.scroll_y = state.scroll_y;
        self.heights = state.item_heights;
        self.settle();
    }

    // -- invariant ------------------------------------------------------------

    fn settle(&mut self) {
        if self.heights.is_empty() {
            self.selected = 0;
            self.scroll_y = 0;
            return;
        }
        self.selected = self.selected.min(self.heights.len() - 1);

        let top = self.position(self.selected);
        let h = self.height(self.selected);
        let window = self.viewport_height;

        if window == 0 {
            self.scroll_y = top;
        } else if h > window {
            self.scroll_y = self.scroll_y.clamp(top, top + h - window);
        } else if top < self.scroll_y {
            self.scroll_y = top;
        } else if top + h > self.scroll_y + window {
            self.scroll_y = top + h - window;
        }

        let max_scroll = self.total_height().saturating_sub(window);
        self.scroll_y = self.scroll_y.min(max_scroll);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn viewport(count: usize, window: usize) -> SelectableViewport {
        let mut vp = SelectableViewport::new(1);
        vp.set_viewport_height(window);
        vp.set_item_count(count);
        vp
    }

    fn assert_invariant(vp: &SelectableViewport) {
        let max_scroll = vp.total_height().saturating_sub(vp.viewport_height());
        assert!(vp.scroll_y() <= max_scroll, "scroll {} > {}", vp.scroll_y(), max_scroll);
        if let Some(sel) = vp.selected() {
            assert!(sel < vp.item_count());
            let top = vp.position(sel);
            let h = vp.height(sel);
            if h <= vp.viewport_height() {
                assert!(top >= vp.scroll_y(), "item above window");
                assert!(
                    top + h <= vp.scroll_y() + vp.viewport_height(),
                    "item below window"
                );
            } else {
                assert!(vp.scroll_y() >= top, "window above tall item");
                assert!(
                    vp.scroll_y() + vp.viewport_height() <= top + h,
                    "window below tall item"
                );
            }
        } else {
            assert_eq!(vp.scroll_y(), 0);
        }
    }

    #[test]
    fn test_empty_list() {
        let mut vp = viewport(0, 10);
        assert_eq!(vp.selected(), None);
        vp.move_selection(1);
        vp.move_selection(-3);
        vp.page_move(1);
        assert_eq!(vp.selected(), None);
        assert_eq!(vp.scroll_y(), 0);
        assert_eq!(vp.visible_range(), 0..0);
    }

    #[rstest]
    #[case(0, -1, 0)]
    #[case(0, 1, 1)]
    #[case(3, 100, 9)]
    #[case(9, 1, 9)]
    #[case(5, -100, 0)]
    fn test_move_selection_clamps(#[case] start: usize, #[case] delta: isize, #[case] expected: usize) {
        let mut vp = viewport(10, 4);
        vp.select(start);
        vp.move_selection(delta);
        assert_eq!(vp.selected(), Some(expected));
        assert_invariant(&vp);
    }

    #[test]
    fn test_scrolls_down_to_keep_selection_visible() {
        let mut vp = viewport(10, 3);
        vp.move_selection(5);
        assert_eq!(vp.scroll_y(), 3);
        vp.move_selection(-4);
        assert_eq!(vp.scroll_y(), 1);
        assert_invariant(&vp);
    }

    #[test]
    fn test_resolve_height_shifts_window() {
        let mut vp = viewport(5, 10);
        vp.select(4);
        assert_eq!(vp.scroll_y(), 0);
        assert!(vp.resolve_height(0, 8));
        // position(4) = 8 + 3 = 11, so the window must move.
        assert_eq!(vp.scroll_y(), 2);
        assert!(!vp.resolve_height(0, 8));
        assert_invariant(&vp);
    }

    #[test]
    fn test_zero_height_is_not_cached() {
        let mut vp = viewport(3, 10);
        vp.resolve_height(1, 0);
        assert!(!vp.is_resolved(1));
        assert_eq!(vp.height(1), 1);
        vp.resolve_height(1, 4);
        assert!(vp.is_resolved(1));
        assert!(vp.resolve_height(1, 0));
        assert!(!vp.is_resolved(1));
    }

    #[test]
    fn test_invalidate_height_forgets_measurement() {
        let mut vp = viewport(3, 10);
        vp.resolve_height(2, 6);
        vp.invalidate_height(2);
        assert!(!vp.is_resolved(2));
        assert_eq!(vp.total_height(), 3);
    }

    #[test]
    fn test_tall_item_aligns_top() {
        let mut vp = viewport(3, 5);
        vp.resolve_height(1, 20);
        vp.select(1);
        assert_eq!(vp.scroll_y(), 1);
        assert_invariant(&vp);
    }

    // -- tall items --

    /// Rows of item `i` currently inside the window.
    fn visible_rows(vp: &SelectableViewport, i: usize) -> std::ops::Range<usize> {
        let top = vp.position(i);
        let start = vp.scroll_y().max(top) - top;
        let end = (vp.scroll_y() + vp.viewport_height()).min(top + vp.height(i)) - top;
        start..end.max(start)
    }

    #[test]
    fn test_single_steps_reach_every_row_of_tall_item() {
        let mut vp = viewport(3, 5);
        vp.resolve_height(0, 20);
        let mut seen = vec![false; 20];
        for _ in 0..30 {
            if vp.selected() != Some(0) {
                break;
            }
            for row in visible_rows(&vp, 0) {
                seen[row] = true;
            }
            vp.move_selection(1);
            assert_invariant(&vp);
        }
        let missing: Vec<usize> = (0..20).filter(|&r| !seen[r]).collect();
        assert!(missing.is_empty(), "rows never shown: {:?}", missing);
        // The selection only moved on once the last row was shown.
        assert_eq!(vp.selected(), Some(1));
        assert_eq!(vp.scroll_y(), 16);
    }

    #[test]
    fn test_step_up_scrolls_back_through_tall_item() {
        let mut vp = viewport(3, 5);
        vp.resolve_height(0, 20);
        for _ in 0..15 {
            vp.move_selection(1);
        }
        assert_eq!((vp.selected(), vp.scroll_y()), (Some(0), 15));
        vp.move_selection(-1);
        assert_eq!((vp.selected(), vp.scroll_y()), (Some(0), 14));
        for _ in 0..14 {
            vp.move_selection(-1);
        }
        assert_eq!(vp.scroll_y(), 0);
        vp.move_selection(-1);
        assert_eq!((vp.selected(), vp.scroll_y()), (Some(0), 0));
        assert_invariant(&vp);
    }

    #[test]
    fn test_page_keys_scroll_through_tall_item() {
        let mut vp = viewport(3, 5);
        vp.resolve_height(0, 12);
        vp.page_move(1);
        assert_eq!((vp.selected(), vp.scroll_y()), (Some(0), 5));
        vp.half_page_move(1);
        assert_eq!((vp.selected(), vp.scroll_y()), (Some(0), 7));
        vp.page_move(1);
        assert_eq!(vp.selected(), Some(1));
        vp.page_move(-1);
        assert_eq!(vp.selected(), Some(0));
        assert_eq!(vp.scroll_y(), 0);
        assert_invariant(&vp);
    }

    #[test]
    fn test_tall_item_selected_from_below_starts_at_top() {
        let mut vp = viewport(4, 5);
        vp.resolve_height(1, 20);
        vp.select_last();
        vp.select(1);
        assert_eq!(vp.scroll_y(), vp.position(1));
        assert_invariant(&vp);
    }

    #[test]
    fn test_remeasure_keeps_window_inside_tall_item() {
        let mut vp = viewport(3, 5);
        vp.resolve_height(0, 20);
        for _ in 0..10 {
            vp.move_selection(1);
        }
        assert_eq!(vp.scroll_y(), 10);
        vp.resolve_height(0, 12);
        assert_eq!(vp.selected(), Some(0));
        assert_eq!(vp.scroll_y(), 7);
        assert_invariant(&vp);
    }

    #[test]
    fn test_page_step_uses_average_known_height() {
        let mut vp = viewport(100, 12);
        for i in 0..4 {
            vp.resolve_height(i, 3);
        }
        vp.page_move(1);
        assert_eq!(vp.selected(), Some(4));
        vp.half_page_move(1);
        assert_eq!(vp.selected(), Some(6));
        vp.page_move(-1);
        assert_eq!(vp.selected(), Some(2));
    }

    #[test]
    fn test_page_step_is_at_least_one() {
        let mut vp = viewport(10, 2);
        vp.resolve_height(3, 50);
        vp.half_page_move(1);
        assert_eq!(vp.selected(), Some(1));
    }

    #[test]
    fn test_set_item_count_clamps_selection() {
        let mut vp = viewport(10, 3);
        vp.select_last();
        vp.set_item_count(4);
        assert_eq!(vp.selected(), Some(3));
        vp.set_item_count(0);
        assert_eq!(vp.selected(), None);
        assert_eq!(vp.scroll_y(), 0);
    }

    #[test]
    fn test_set_item_count_keeps_known_heights() {
        let mut vp = viewport(3, 10);
        vp.resolve_height(0, 4);
        vp.set_item_count(5);
        assert!(vp.is_resolved(0));
        assert!(!vp.is_resolved(4));
    }

    #[test]
    fn test_visible_range() {
        let mut vp = viewport(10, 4);
        vp.resolve_height(0, 2);
        assert_eq!(vp.visible_range(), 0..3);
        vp.select(6);
        // positions: 0,2,3,4,5,6,7 ; window [4, 8)
        assert_eq!(vp.scroll_y(), 4);
        assert_eq!(vp.visible_range(), 3..7);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut vp = viewport(20, 5);
        vp.select(12);
        vp.resolve_height(3, 2);
        let saved = vp.snapshot();

        vp.select_first();
        vp.restore(saved.clone());
        assert_eq!(vp.selected(), Some(12));
        assert_eq!(vp.scroll_y(), saved.scroll_y);
        assert!(vp.is_resolved(3));
    }

    #[test]
    fn test_invariant_under_mixed_operations() {
        let mut vp = viewport(40, 7);
        // Deterministic pseudo-random walk.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for step in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let n = (seed % 1000) as usize;
            match step % 5 {
                0 => vp.move_selection((n % 9) as isize - 4),
                1 => vp.page_move(if n % 2 == 0 { 1 } else { -1 }),
                2 => {
                    vp.resolve_height(n % 40, n % 12);
                }
                3 => vp.half_page_move(if n % 3 == 0 { -1 } else { 1 }),
                _ => vp.invalidate_height(n % 40),
            }
            assert_invariant(&vp);
        }
    }
}
