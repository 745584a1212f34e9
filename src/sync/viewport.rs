//! A scrollable pane.
//!
//! The [`Viewport`] tracks how much of a pane's content is visible and how
//! far it is scrolled. Units are whatever the host uses (pixels, rows); only
//! ratios cross between panes.

use super::{ScrollReport, ScrollView};

/// Visible window over a pane's content.
///
/// # Example
///
/// ```
/// use markpane::sync::Viewport;
///
/// let mut vp = Viewport::new(24.0, 100.0);
/// assert_eq!(vp.max_scroll(), 76.0);
///
/// vp.scroll_by(38.0);
/// assert_eq!(vp.scroll_fraction(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    visible_height: f64,
    content_height: f64,
    scroll_top: f64,
}

impl Viewport {
    /// Create a viewport scrolled to the top.
    pub const fn new(visible_height: f64, content_height: f64) -> Self {
        Self {
            visible_height,
            content_height,
            scroll_top: 0.0,
        }
    }

    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub const fn visible_height(&self) -> f64 {
        self.visible_height
    }

    pub const fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Largest valid scroll top; zero when everything fits.
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.visible_height).max(0.0)
    }

    /// Position as a fraction of the scrollable range, `0.0` when nothing
    /// scrolls.
    pub fn scroll_fraction(&self) -> f64 {
        let max = self.max_scroll();
        if max <= 0.0 {
            return 0.0;
        }
        (self.scroll_top / max).clamp(0.0, 1.0)
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.set_scroll_top(self.scroll_top + delta);
    }

    pub fn go_to_fraction(&mut self, fraction: f64) {
        self.set_scroll_top(fraction.clamp(0.0, 1.0) * self.max_scroll());
    }

    /// Change the visible height, e.g. after a window resize.
    pub fn resize(&mut self, visible_height: f64) {
        self.visible_height = visible_height.max(0.0);
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// Update the content height, e.g. after a re-render.
    pub fn set_content_height(&mut self, content_height: f64) {
        self.content_height = content_height.max(0.0);
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// The scroll event this pane would emit, if it can scroll at all.
    pub fn report(&self) -> Option<ScrollReport> {
        ScrollReport::new(self.scroll_top, self.max_scroll())
    }
}

impl ScrollView for Viewport {
    fn scrollable_height(&self) -> Option<f64> {
        let max = self.max_scroll();
        (max > 0.0).then_some(max)
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        if scroll_top.is_finite() {
            self.scroll_top = scroll_top.clamp(0.0, self.max_scroll());
        }
    }
}
