//! Editor ↔ preview scroll synchronization.
//!
//! Both panes scroll independently. When one of them reports a scroll, the
//! other is moved to the same fractional position. Moving the other pane
//! makes it report a scroll of its own, which must not bounce back, so the
//! pane that started a step is remembered as the driver until a short settle
//! delay has passed.
//!
//! Time is passed in explicitly as milliseconds, the same way the event loop
//! feeds its debouncers.

mod viewport;

pub use viewport::Viewport;

/// Default settle delay after a propagated scroll.
pub const DEFAULT_SETTLE_MS: u64 = 50;

/// The two scrollable views of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Editor,
    Preview,
}

impl Pane {
    pub const fn other(self) -> Self {
        match self {
            Self::Editor => Self::Preview,
            Self::Preview => Self::Editor,
        }
    }
}

/// Which pane, if any, is driving the current synchronization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    DrivenByEditor,
    DrivenByPreview,
}

impl SyncState {
    const fn driven_by(pane: Pane) -> Self {
        match pane {
            Pane::Editor => Self::DrivenByEditor,
            Pane::Preview => Self::DrivenByPreview,
        }
    }

    pub const fn driver(self) -> Option<Pane> {
        match self {
            Self::Idle => None,
            Self::DrivenByEditor => Some(Pane::Editor),
            Self::DrivenByPreview => Some(Pane::Preview),
        }
    }
}

/// A scroll event: how far down a pane is and how far it could go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollReport {
    scroll_top: f64,
    scrollable_height: f64,
}

impl ScrollReport {
    /// `scrollable_height` is total content height minus visible height.
    ///
    /// Returns `None` when there is nothing to scroll; such panes do not
    /// report.
    pub fn new(scroll_top: f64, scrollable_height: f64) -> Option<Self> {
        if !scroll_top.is_finite() || !scrollable_height.is_finite() || scrollable_height <= 0.0 {
            return None;
        }
        Some(Self {
            scroll_top,
            scrollable_height,
        })
    }

    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub const fn scrollable_height(&self) -> f64 {
        self.scrollable_height
    }

    /// Fractional position in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        (self.scroll_top / self.scrollable_height).clamp(0.0, 1.0)
    }
}

/// A pane the synchronizer can read geometry from and scroll.
pub trait ScrollView {
    /// Maximum meaningful scroll top, or `None` when the pane is not laid out
    /// or has nothing to scroll.
    fn scrollable_height(&self) -> Option<f64>;

    fn set_scroll_top(&mut self, scroll_top: f64);
}

/// What a report led to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The other pane was scrolled to `scroll_top`.
    Propagated { target: Pane, scroll_top: f64 },
    /// The other pane is still driving; this report is its echo.
    Suppressed,
    /// Synchronization is switched off.
    Disabled,
    /// The other pane has no usable geometry.
    Unavailable,
}

/// Keeps an editor and a preview pane at the same fractional scroll position.
///
/// Built once per session and owns both panes.
#[derive(Debug)]
pub struct ScrollSync<E, P> {
    editor: E,
    preview: P,
    enabled: bool,
    state: SyncState,
    settle_ms: u64,
    driven_at_ms: u64,
}

impl<E: ScrollView, P: ScrollView> ScrollSync<E, P> {
    pub const fn new(editor: E, preview: P) -> Self {
        Self {
            editor,
            preview,
            enabled: true,
            state: SyncState::Idle,
            settle_ms: DEFAULT_SETTLE_MS,
            driven_at_ms: 0,
        }
    }

    #[must_use]
    pub const fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.state = SyncState::Idle;
        }
    }

    /// Current guard state as of `now_ms`.
    pub fn state(&mut self, now_ms: u64) -> SyncState {
        self.settle(now_ms);
        self.state
    }

    pub const fn editor(&self) -> &E {
        &self.editor
    }

    pub const fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub const fn preview(&self) -> &P {
        &self.preview
    }

    pub const fn preview_mut(&mut self) -> &mut P {
        &mut self.preview
    }

    /// Release the driver mark once the settle delay has elapsed.
    pub fn settle(&mut self, now_ms: u64) {
        if self.state != SyncState::Idle
            && now_ms.saturating_sub(self.driven_at_ms) >= self.settle_ms
        {
            self.state = SyncState::Idle;
        }
    }

    /// Handle a scroll report from `from` at time `now_ms`.
    pub fn report(&mut self, from: Pane, report: ScrollReport, now_ms: u64) -> SyncOutcome {
        if !self.enabled {
            return SyncOutcome::Disabled;
        }
        self.settle(now_ms);
        if self.state.driver() == Some(from.other()) {
            tracing::trace!(?from, "suppressed echo scroll");
            return SyncOutcome::Suppressed;
        }

        let target = from.other();
        let Some(target_height) = self.scrollable_height(target) else {
            return SyncOutcome::Unavailable;
        };

        self.state = SyncState::driven_by(from);
        self.driven_at_ms = now_ms;

        let scroll_top = report.ratio() * target_height;
        match target {
            Pane::Editor => self.editor.set_scroll_top(scroll_top),
            Pane::Preview => self.preview.set_scroll_top(scroll_top),
        }
        SyncOutcome::Propagated { target, scroll_top }
    }

    fn scrollable_height(&self, pane: Pane) -> Option<f64> {
        let height = match pane {
            Pane::Editor => self.editor.scrollable_height(),
            Pane::Preview => self.preview.scrollable_height(),
        }?;
        (height.is_finite() && height > 0.0).then_some(height)
    }
}
