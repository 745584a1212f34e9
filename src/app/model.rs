use std::collections::HashMap;

use crate::diagram::{DiagramBlock, DiagramId, DiagramState};
use crate::document::{Section, decompose};
use crate::theme::Theme;

/// A diagram waiting to be handed to its renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Decomposition pass the block came from.
    pub generation: u64,
    pub block: DiagramBlock,
}

/// The complete preview state.
///
/// All state lives here - renderers and panes are owned by the session,
/// never by the model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Markdown text as last typed
    pub source: String,
    /// Sections of `source`, in document order
    pub sections: Vec<Section>,
    diagrams: HashMap<DiagramId, DiagramState>,
    /// Bumped on every decomposition; results from older passes are dropped
    pub generation: u64,
    pub theme: Theme,
    pub sync_enabled: bool,
    pending: Vec<RenderRequest>,
}

impl Model {
    pub fn new(source: impl Into<String>, theme: Theme) -> Self {
        let mut model = Self {
            theme,
            sync_enabled: true,
            ..Self::default()
        };
        model.set_source(source.into());
        model
    }

    /// Replace the document text and start a fresh decomposition pass.
    pub fn set_source(&mut self, source: String) {
        let _scope = crate::perf::scope("app.set_source");
        self.source = source;
        self.sections = decompose(&self.source);
        self.requeue_diagrams();
    }

    /// Mark every diagram as loading again under a new generation.
    pub(super) fn requeue_diagrams(&mut self) {
        self.generation += 1;
        self.diagrams.clear();
        self.pending.clear();
        for section in &self.sections {
            let Section::Diagram {
                id,
                diagram,
                source,
            } = section
            else {
                continue;
            };
            if source.trim().is_empty() {
                self.diagrams.insert(id.clone(), DiagramState::Empty);
                continue;
            }
            self.diagrams.insert(id.clone(), DiagramState::Loading);
            self.pending.push(RenderRequest {
                generation: self.generation,
                block: DiagramBlock {
                    id: id.clone(),
                    kind: *diagram,
                    source: source.clone(),
                },
            });
        }
        crate::perf::log_event(
            "app.requeue",
            format!(
                "generation={} sections={} renders={}",
                self.generation,
                self.sections.len(),
                self.pending.len()
            ),
        );
    }

    pub fn diagram_state(&self, id: &DiagramId) -> Option<&DiagramState> {
        self.diagrams.get(id)
    }

    /// Record the outcome of a render. Returns `false` when `id` is not part
    /// of the current pass.
    pub(super) fn settle_diagram(&mut self, id: &DiagramId, state: DiagramState) -> bool {
        match self.diagrams.get_mut(id) {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    /// Hand over queued renders; each is returned once.
    pub fn take_render_requests(&mut self) -> Vec<RenderRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_renders(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether every diagram has left the loading state.
    pub fn is_settled(&self) -> bool {
        self.diagrams.values().all(DiagramState::is_settled)
    }

    pub fn diagram_count(&self) -> usize {
        self.diagrams.len()
    }
}
