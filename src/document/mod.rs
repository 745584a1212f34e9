//! Markdown decomposition into renderable sections.
//!
//! This module handles:
//! - Rendering markdown to HTML with comrak
//! - Pulling Mermaid and PlantUML fences out as diagram sections
//! - Sanitizing every HTML fragment before it reaches a view

mod decompose;
mod demo;
mod placeholder;
mod sanitize;

use serde::Serialize;

use crate::diagram::{DiagramId, DiagramKind};

pub use decompose::decompose;
pub use demo::DEFAULT_MARKDOWN;
pub use sanitize::sanitize;

/// What a section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Html,
    Mermaid,
    PlantUml,
}

impl From<DiagramKind> for SectionKind {
    fn from(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Mermaid => Self::Mermaid,
            DiagramKind::PlantUml => Self::PlantUml,
        }
    }
}

/// One renderable piece of a document, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Section {
    /// Sanitized HTML, never empty or whitespace-only.
    Html { content: String },
    /// A diagram fence body, verbatim.
    Diagram {
        id: DiagramId,
        diagram: DiagramKind,
        source: String,
    },
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Html { .. } => SectionKind::Html,
            Self::Diagram { diagram, .. } => SectionKind::from(*diagram),
        }
    }

    /// HTML for HTML sections, diagram source for diagram sections.
    pub fn content(&self) -> &str {
        match self {
            Self::Html { content } => content,
            Self::Diagram { source, .. } => source,
        }
    }

    pub const fn id(&self) -> Option<&DiagramId> {
        match self {
            Self::Html { .. } => None,
            Self::Diagram { id, .. } => Some(id),
        }
    }

    pub const fn is_diagram(&self) -> bool {
        matches!(self, Self::Diagram { .. })
    }
}

/// Escape `&`, `<` and `>` so text is not read as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Like [`escape_html`], also escaping quotes for attribute values.
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_only_touches_markup_characters() {
        assert_eq!(escape_html("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; \"d\"");
    }

    #[test]
    fn test_escape_attr_quotes() {
        assert_eq!(escape_attr("x\"y'z"), "x&quot;y&#39;z");
    }

    #[test]
    fn test_section_accessors() {
        let html = Section::Html {
            content: "<p>hi</p>".to_string(),
        };
        assert_eq!(html.kind(), SectionKind::Html);
        assert_eq!(html.content(), "<p>hi</p>");
        assert!(html.id().is_none());

        let diagram = Section::Diagram {
            id: DiagramId::new(DiagramKind::PlantUml, 1),
            diagram: DiagramKind::PlantUml,
            source: "@startuml\n@enduml".to_string(),
        };
        assert_eq!(diagram.kind(), SectionKind::PlantUml);
        assert_eq!(diagram.content(), "@startuml\n@enduml");
        assert_eq!(diagram.id().map(DiagramId::as_str), Some("plantuml-1"));
    }

    #[test]
    fn test_section_json_shape() {
        let section = Section::Diagram {
            id: DiagramId::new(DiagramKind::Mermaid, 0),
            diagram: DiagramKind::Mermaid,
            source: "graph TD".to_string(),
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["kind"], "diagram");
        assert_eq!(json["id"], "mermaid-0");
        assert_eq!(json["diagram"], "mermaid");
    }
}
