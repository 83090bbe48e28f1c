/// Scroll model for the round table: cached rows plus a trailing "load
/// more" sentinel row. Row count and visible height change between frames,
/// so every query takes `rows_total` and clamps rather than trusting a
/// stored position.
#[derive(Debug, Default)]
pub struct TableViewport {
    scroll: usize,
    rows_visible: usize,
}

impl TableViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn rows_visible(&self) -> usize {
        self.rows_visible
    }

    /// Record how many rows the last layout pass could show. Zero means the
    /// table had no usable area; nothing is considered visible then.
    pub fn set_rows_visible(&mut self, rows: usize) {
        self.rows_visible = rows;
    }

    pub fn max_scroll(&self, rows_total: usize) -> usize {
        rows_total.saturating_sub(self.rows_visible.max(1))
    }

    pub fn scroll_down(&mut self, rows_total: usize) {
        self.scroll = (self.scroll + 1).min(self.max_scroll(rows_total));
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn jump_top(&mut self) {
        self.scroll = 0;
    }

    pub fn jump_bottom(&mut self, rows_total: usize) {
        self.scroll = self.max_scroll(rows_total);
    }

    /// Clamp the stored position against the current geometry and return
    /// the first visible row index. Rows shrink when the subject changes.
    pub fn clamp(&mut self, rows_total: usize) -> usize {
        self.scroll = self.scroll.min(self.max_scroll(rows_total));
        self.scroll
    }

    /// Whether the sentinel (always the last row) falls inside the visible
    /// span. This is the signal sampled by the backfill cadence.
    pub fn sentinel_visible(&self, rows_total: usize) -> bool {
        if self.rows_visible == 0 || rows_total == 0 {
            return false;
        }
        let start = self.scroll.min(self.max_scroll(rows_total));
        let end = (start + self.rows_visible).min(rows_total);
        (start..end).contains(&(rows_total - 1))
    }

    /// Anti-thrash correction: when a backfill fires while the view is
    /// pinned to the very bottom, step one row up so the sentinel leaves
    /// the visible span instead of re-firing on every cadence tick.
    pub fn nudge_off_bottom(&mut self, rows_total: usize) {
        if self.rows_visible > 0 && self.scroll == self.max_scroll(rows_total) {
            self.scroll = self.scroll.saturating_sub(1);
        }
    }
}
