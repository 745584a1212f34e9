//! Diagram kinds, identities and renderers.
//!
//! Diagram fences are pulled out of the Markdown by the section decomposer
//! and handed to a [`DiagramRenderer`] one block at a time. Each block owns
//! its own [`DiagramState`], so one broken diagram never affects its
//! siblings or the surrounding HTML.

pub mod mermaid;
pub mod plantuml;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::theme::Theme;

pub use mermaid::MermaidRenderer;
pub use plantuml::{CodecError, PlantUmlRenderer};

/// The diagram languages recognized in fenced code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Mermaid,
    PlantUml,
}

impl DiagramKind {
    /// Classify a fence language tag (case-insensitive).
    ///
    /// ```
    /// use markpane::diagram::DiagramKind;
    ///
    /// assert_eq!(DiagramKind::from_fence_tag("Mermaid"), Some(DiagramKind::Mermaid));
    /// assert_eq!(DiagramKind::from_fence_tag("puml"), Some(DiagramKind::PlantUml));
    /// assert_eq!(DiagramKind::from_fence_tag("rust"), None);
    /// ```
    pub fn from_fence_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("mermaid") {
            Some(Self::Mermaid)
        } else if tag.eq_ignore_ascii_case("plantuml") || tag.eq_ignore_ascii_case("puml") {
            Some(Self::PlantUml)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::PlantUml => "plantuml",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mermaid" => Some(Self::Mermaid),
            "plantuml" => Some(Self::PlantUml),
            _ => None,
        }
    }

    /// Heading shown above a failed diagram.
    pub const fn error_title(self) -> &'static str {
        match self {
            Self::Mermaid => "Mermaid Diagram Error",
            Self::PlantUml => "PlantUML Diagram Error",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a diagram within one decomposition pass, e.g. `mermaid-0`.
///
/// Ids are only meaningful for the pass that produced them. Editing the
/// document can hand the same id to a different block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DiagramId(String);

impl DiagramId {
    pub fn new(kind: DiagramKind, index: usize) -> Self {
        Self(format!("{kind}-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse an id back out of its textual form.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, index) = s.rsplit_once('-')?;
        DiagramKind::from_name(kind)?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(s.to_string()))
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A diagram fence captured during decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    pub id: DiagramId,
    pub kind: DiagramKind,
    /// Fence body exactly as written, without HTML escaping.
    pub source: String,
}

/// Output of a successful diagram render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedDiagram {
    /// Markup placed into the page as-is.
    Markup { html: String },
    /// An image fetched from an external server.
    Image { url: String, alt: String },
}

/// Per-diagram failure.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Failed to generate PlantUML URL: {0}")]
    Encode(#[from] CodecError),

    #[error("{0}")]
    Backend(String),
}

/// Lifecycle of one diagram section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiagramState {
    Loading,
    Ready { output: RenderedDiagram },
    Failed { message: String },
    /// The fence had no content.
    Empty,
}

impl DiagramState {
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Backend that turns diagram source into displayable output.
///
/// Implementations must tolerate being called repeatedly with the same id.
pub trait DiagramRenderer {
    fn kind(&self) -> DiagramKind;

    /// Render `source` for the section `id`.
    ///
    /// # Errors
    /// Returns a [`DiagramError`] describing why this one diagram failed.
    fn render(&self, id: &DiagramId, source: &str) -> Result<RenderedDiagram, DiagramError>;

    /// Called when the page theme changes.
    fn set_theme(&mut self, _theme: Theme) {}
}

/// One renderer per diagram kind.
pub struct Renderers {
    mermaid: Box<dyn DiagramRenderer>,
    plantuml: Box<dyn DiagramRenderer>,
}

impl Renderers {
    pub fn new(mermaid: Box<dyn DiagramRenderer>, plantuml: Box<dyn DiagramRenderer>) -> Self {
        Self { mermaid, plantuml }
    }

    /// The built-in renderers pointed at `plantuml_server`.
    pub fn builtin(plantuml_server: impl Into<String>) -> Self {
        Self::new(
            Box::new(MermaidRenderer::new()),
            Box::new(PlantUmlRenderer::new(plantuml_server)),
        )
    }

    pub fn for_kind(&self, kind: DiagramKind) -> &dyn DiagramRenderer {
        match kind {
            DiagramKind::Mermaid => self.mermaid.as_ref(),
            DiagramKind::PlantUml => self.plantuml.as_ref(),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.mermaid.set_theme(theme);
        self.plantuml.set_theme(theme);
    }
}

impl Default for Renderers {
    fn default() -> Self {
        Self::builtin(plantuml::DEFAULT_SERVER)
    }
}

impl fmt::Debug for Renderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderers")
            .field("mermaid", &self.mermaid.kind())
            .field("plantuml", &self.plantuml.kind())
            .finish()
    }
}
