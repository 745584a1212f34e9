use crate::app::Model;
use crate::diagram::{DiagramId, DiagramState, RenderedDiagram};
use crate::document::DEFAULT_MARKDOWN;
use crate::theme::Theme;

/// All events a preview session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The editor contents changed
    TextChanged(String),
    /// A renderer finished one diagram
    DiagramRendered {
        generation: u64,
        id: DiagramId,
        result: Result<RenderedDiagram, String>,
    },
    /// Switch between light and dark
    ToggleTheme,
    SetTheme(Theme),
    /// Turn scroll synchronization on or off
    ToggleSync,
    /// Restore the built-in demo document
    Reset,
}

/// Pure function that updates the model based on a message.
///
/// Side effects (renderer calls, Mermaid reconfiguration, scrolling) are
/// performed by the session after the transition.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::TextChanged(source) => {
            model.set_source(source);
        }
        Message::DiagramRendered {
            generation,
            id,
            result,
        } => {
            if generation != model.generation {
                tracing::debug!(%id, generation, current = model.generation, "dropped stale render");
                return model;
            }
            let state = match result {
                Ok(output) => DiagramState::Ready { output },
                Err(message) => DiagramState::Failed { message },
            };
            if !model.settle_diagram(&id, state) {
                tracing::debug!(%id, "dropped render for unknown diagram");
            }
        }
        Message::ToggleTheme => {
            let theme = model.theme.toggled();
            return update(model, Message::SetTheme(theme));
        }
        Message::SetTheme(theme) => {
            if model.theme != theme {
                model.theme = theme;
                // Mermaid output depends on the theme.
                model.requeue_diagrams();
            }
        }
        Message::ToggleSync => {
            model.sync_enabled = !model.sync_enabled;
        }
        Message::Reset => {
            model.set_source(DEFAULT_MARKDOWN.to_string());
        }
    }
    model
}
