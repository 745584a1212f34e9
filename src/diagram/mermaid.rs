//! Mermaid diagrams.
//!
//! Mermaid is drawn in the browser by mermaid.js, so rendering here means
//! producing the markup mermaid.js picks up plus the shared initialization
//! options. Those options are process-wide: there is one Mermaid runtime per
//! page, reconfigured whenever the theme changes.

use std::sync::{LazyLock, PoisonError, RwLock};

use serde::Serialize;

use super::{DiagramError, DiagramId, DiagramKind, DiagramRenderer, RenderedDiagram};
use crate::document::escape_html;
use crate::theme::{MONO_FONT_FAMILY, Theme};

static CONFIG: LazyLock<RwLock<MermaidConfig>> =
    LazyLock::new(|| RwLock::new(MermaidConfig::for_theme(Theme::default())));

/// Serializes tests that touch the shared configuration.
#[cfg(test)]
pub(crate) static TEST_CONFIG_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Diagram types mermaid.js understands, matched against the first
/// meaningful line of a diagram. Variants such as `stateDiagram-v2` or
/// `radar-beta` match their base name.
const DIAGRAM_KEYWORDS: &[&str] = &[
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "gitGraph",
    "mindmap",
    "timeline",
    "quadrantChart",
    "requirementDiagram",
    "C4Context",
    "C4Container",
    "C4Component",
    "C4Dynamic",
    "C4Deployment",
    "sankey",
    "xychart",
    "block",
    "packet",
    "architecture",
    "kanban",
    "radar",
    "treemap",
    "info",
    "zenuml",
];

const KEYWORD_SUFFIXES: &[&str] = &["-beta", "-v2", "-elk"];

/// Options passed to `mermaid.initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidConfig {
    pub start_on_load: bool,
    pub theme: &'static str,
    pub security_level: &'static str,
    pub font_family: &'static str,
}

impl MermaidConfig {
    pub const fn for_theme(theme: Theme) -> Self {
        Self {
            start_on_load: false,
            theme: match theme {
                Theme::Light => "neutral",
                Theme::Dark => "dark",
            },
            security_level: "strict",
            font_family: MONO_FONT_FAMILY,
        }
    }

    /// The options as a JavaScript object literal.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Point the shared Mermaid configuration at `theme`.
///
/// Returns `true` when the configuration actually changed; calling it again
/// with the same theme does nothing.
pub fn configure(theme: Theme) -> bool {
    let next = MermaidConfig::for_theme(theme);
    let mut config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    if *config == next {
        return false;
    }
    tracing::debug!(theme = next.theme, "reconfigured mermaid");
    *config = next;
    true
}

/// Snapshot of the shared Mermaid configuration.
pub fn current_config() -> MermaidConfig {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Renders Mermaid sections as `<pre class="mermaid">` blocks for mermaid.js.
#[derive(Debug, Clone, Default)]
pub struct MermaidRenderer;

impl MermaidRenderer {
    pub const fn new() -> Self {
        Self
    }
}

impl DiagramRenderer for MermaidRenderer {
    fn kind(&self) -> DiagramKind {
        DiagramKind::Mermaid
    }

    fn render(&self, id: &DiagramId, source: &str) -> Result<RenderedDiagram, DiagramError> {
        detect_diagram_type(source)?;
        Ok(RenderedDiagram::Markup {
            html: format!(
                "<pre class=\"mermaid\" id=\"{id}\">{}</pre>",
                escape_html(source)
            ),
        })
    }

    fn set_theme(&mut self, theme: Theme) {
        configure(theme);
    }
}

/// Find the diagram type keyword, skipping front matter, directives and
/// comments the way mermaid.js does.
fn detect_diagram_type(source: &str) -> Result<&str, DiagramError> {
    let mut lines = source.lines().map(str::trim).peekable();
    if lines.peek() == Some(&"---") {
        lines.next();
        for line in lines.by_ref() {
            if line == "---" {
                break;
            }
        }
    }

    let first = lines.find(|line| !line.is_empty() && !line.starts_with("%%"));
    let keyword = first
        .and_then(|line| line.split(|c: char| c.is_whitespace() || c == ';').next())
        .unwrap_or_default()
        .trim_end_matches(':');
    let base = KEYWORD_SUFFIXES
        .iter()
        .find_map(|suffix| keyword.strip_suffix(suffix))
        .unwrap_or(keyword);
    if DIAGRAM_KEYWORDS.contains(&base) {
        return Ok(keyword);
    }

    let preview: String = source.trim().chars().take(40).collect();
    Err(DiagramError::Backend(format!(
        "No diagram type detected matching given configuration for text: {preview}"
    )))
}
