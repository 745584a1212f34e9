//! Preview session state.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete preview state
//! - [`Message`]: All possible events
//! - [`update`]: Pure function for state transitions
//! - [`Session`]: Owns the model together with its renderers and panes and
//!   performs the side effects

mod model;
mod update;

pub use model::{Model, RenderRequest};
pub use update::{Message, update};

use crate::diagram::{DiagramError, Renderers, mermaid};
use crate::sync::{Pane, ScrollSync, SyncOutcome, Viewport};
use crate::theme::Theme;

/// Initial pane size before the host reports real geometry.
const DEFAULT_PANE_HEIGHT: f64 = 600.0;

/// A live preview: document model, diagram renderers and the two scroll panes.
#[derive(Debug)]
pub struct Session {
    model: Model,
    renderers: Renderers,
    panes: ScrollSync<Viewport, Viewport>,
}

impl Session {
    pub fn new(source: impl Into<String>, theme: Theme, mut renderers: Renderers) -> Self {
        mermaid::configure(theme);
        renderers.set_theme(theme);
        Self {
            model: Model::new(source, theme),
            renderers,
            panes: ScrollSync::new(
                Viewport::new(DEFAULT_PANE_HEIGHT, DEFAULT_PANE_HEIGHT),
                Viewport::new(DEFAULT_PANE_HEIGHT, DEFAULT_PANE_HEIGHT),
            ),
        }
    }

    /// Override the scroll settle delay.
    #[must_use]
    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.panes = self.panes.with_settle_ms(settle_ms);
        self
    }

    /// Start with scroll synchronization switched off.
    #[must_use]
    pub fn with_sync_enabled(mut self, enabled: bool) -> Self {
        if self.model.sync_enabled != enabled {
            self.dispatch(Message::ToggleSync);
        }
        self
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Apply `msg` and run its side effects.
    pub fn dispatch(&mut self, msg: Message) {
        let previous_theme = self.model.theme;
        let model = std::mem::take(&mut self.model);
        self.model = update(model, msg);

        if self.model.theme != previous_theme {
            mermaid::configure(self.model.theme);
            self.renderers.set_theme(self.model.theme);
        }
        if self.panes.is_enabled() != self.model.sync_enabled {
            self.panes.set_enabled(self.model.sync_enabled);
        }
    }

    /// Render every queued diagram and feed the results back in.
    ///
    /// Failures stay local to their diagram. Returns how many renders ran.
    pub fn run_pending_renders(&mut self) -> usize {
        let _scope = crate::perf::scope("app.render_diagrams");
        let requests = self.model.take_render_requests();
        let count = requests.len();
        for request in requests {
            let block = request.block;
            let result = self
                .renderers
                .for_kind(block.kind)
                .render(&block.id, &block.source)
                .map_err(|err: DiagramError| {
                    tracing::warn!(id = %block.id, kind = %block.kind, error = %err, "diagram render failed");
                    crate::perf::log_event("diagram.error", format!("id={} err={err}", block.id));
                    err.to_string()
                });
            self.dispatch(Message::DiagramRendered {
                generation: request.generation,
                id: block.id,
                result,
            });
        }
        count
    }

    pub fn pane(&self, pane: Pane) -> &Viewport {
        match pane {
            Pane::Editor => self.panes.editor(),
            Pane::Preview => self.panes.preview(),
        }
    }

    /// Update a pane's geometry after layout.
    pub fn resize_pane(&mut self, pane: Pane, visible_height: f64, content_height: f64) {
        let view = match pane {
            Pane::Editor => self.panes.editor_mut(),
            Pane::Preview => self.panes.preview_mut(),
        };
        view.resize(visible_height);
        view.set_content_height(content_height);
    }

    /// The user scrolled `pane` to `scroll_top`.
    ///
    /// Panes with nothing to scroll do not report and yield
    /// [`SyncOutcome::Unavailable`].
    pub fn scroll(&mut self, pane: Pane, scroll_top: f64, now_ms: u64) -> SyncOutcome {
        use crate::sync::ScrollView;

        let view = match pane {
            Pane::Editor => self.panes.editor_mut(),
            Pane::Preview => self.panes.preview_mut(),
        };
        view.set_scroll_top(scroll_top);
        let Some(report) = view.report() else {
            return SyncOutcome::Unavailable;
        };
        self.panes.report(pane, report, now_ms)
    }

    pub fn sync_state(&mut self, now_ms: u64) -> crate::sync::SyncState {
        self.panes.state(now_ms)
    }
}
