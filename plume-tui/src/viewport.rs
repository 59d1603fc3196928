/// Fraction of the sentinel that must be visible to trigger a fetch
pub const VISIBILITY_THRESHOLD: f32 = 0.1;

/// Rows below the visible area that still count as visible, so the next
/// page starts loading before the user reaches the end of the feed
pub const LOOKAHEAD_ROWS: usize = 5;

/// The scrolled window of feed rows currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub top: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }
}

/// Watches the "load more" sentinel row at the end of the feed.
///
/// Disconnected observers never report an intersection; the feed screen
/// connects on entry and disconnects on teardown.
#[derive(Debug, Clone)]
pub struct LoadMoreObserver {
    threshold: f32,
    margin: usize,
    connected: bool,
}

impl LoadMoreObserver {
    pub fn new(threshold: f32, margin: usize) -> Self {
        Self {
            threshold,
            margin,
            connected: false,
        }
    }

    pub fn connect(&mut self) {
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the sentinel spanning `[start, start + height)` intersects the
    /// viewport extended by the lookahead margin, by at least the threshold.
    pub fn is_intersecting(&self, viewport: Viewport, start: usize, height: usize) -> bool {
        if !self.connected || height == 0 {
            return false;
        }

        let root_top = viewport.top.saturating_sub(self.margin);
        let root_bottom = viewport.top + viewport.height + self.margin;
        let end = start + height;

        let overlap = end.min(root_bottom).saturating_sub(start.max(root_top));
        overlap as f32 / height as f32 >= self.threshold
    }
}

impl Default for LoadMoreObserver {
    fn default() -> Self {
        Self::new(VISIBILITY_THRESHOLD, LOOKAHEAD_ROWS)
    }
}
