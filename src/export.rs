//! Standalone preview pages.
//!
//! Turns a settled [`Model`] into a complete HTML document (sections in
//! order, diagram states in place, theme CSS and the Mermaid bootstrap) or a
//! JSON dump of the same sections.

use std::fmt::Write as _;

use serde::Serialize;

use crate::app::Model;
use crate::diagram::{DiagramKind, DiagramState, RenderedDiagram, mermaid};
use crate::document::{Section, escape_attr, escape_html};
use crate::theme::Theme;

const MERMAID_MODULE: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.esm.min.mjs";

/// Render the full preview page.
pub fn render_page(model: &Model, title: &str) -> String {
    let _scope = crate::perf::scope("export.render_page");
    let mut body = String::new();
    let mut has_mermaid = false;
    for section in &model.sections {
        match section {
            Section::Html { content } => {
                let _ = writeln!(body, "<div class=\"markpane-section\">{content}</div>");
            }
            Section::Diagram { id, diagram, .. } => {
                let state = model.diagram_state(id).unwrap_or(&DiagramState::Loading);
                has_mermaid |= matches!(
                    state,
                    DiagramState::Ready {
                        output: RenderedDiagram::Markup { .. }
                    }
                );
                push_diagram(&mut body, *diagram, state);
            }
        }
    }

    let mut page = String::with_capacity(body.len() + 4096);
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{theme}\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>\n{css}</style>\n</head>\n<body>\n\
         <main class=\"markpane-preview\">\n{body}</main>\n",
        theme = model.theme.as_str(),
        title = escape_html(title),
        css = stylesheet(model.theme),
    );
    if has_mermaid {
        let _ = write!(
            page,
            "<script type=\"module\">\nimport mermaid from \"{MERMAID_MODULE}\";\n\
             mermaid.initialize({config});\nawait mermaid.run();\n</script>\n",
            config = mermaid::current_config().to_json(),
        );
    }
    page.push_str("</body>\n</html>\n");
    page
}

fn push_diagram(out: &mut String, kind: DiagramKind, state: &DiagramState) {
    match state {
        DiagramState::Loading => {
            let _ = writeln!(
                out,
                "<div class=\"markpane-diagram loading\">Loading {kind} diagram...</div>"
            );
        }
        DiagramState::Ready {
            output: RenderedDiagram::Markup { html },
        } => {
            let _ = writeln!(out, "<div class=\"markpane-diagram {kind}\">{html}</div>");
        }
        DiagramState::Ready {
            output: RenderedDiagram::Image { url, alt },
        } => {
            let _ = writeln!(
                out,
                "<div class=\"markpane-diagram {kind}\"><img src=\"{}\" alt=\"{}\"></div>",
                escape_attr(url),
                escape_attr(alt)
            );
        }
        DiagramState::Failed { message } => {
            let _ = writeln!(
                out,
                "<div class=\"markpane-diagram-error\"><strong>{}</strong><pre>{}</pre></div>",
                kind.error_title(),
                escape_html(message)
            );
        }
        DiagramState::Empty => {
            let _ = writeln!(out, "<div class=\"markpane-diagram {kind} empty\"></div>");
        }
    }
}

fn stylesheet(theme: Theme) -> String {
    let t = theme.tokens();
    let image_filter = if theme.is_dark() {
        "invert(0.9) hue-rotate(180deg)"
    } else {
        "none"
    };
    format!(
        "body {{ margin: 0; background: {bg}; color: {text}; font-family: {font}; }}\n\
         .markpane-preview {{ max-width: 960px; margin: 0 auto; padding: 24px; \
         background: {container}; border-radius: {radius}px; }}\n\
         .markpane-preview a {{ color: {primary}; }}\n\
         .markpane-preview pre {{ overflow-x: auto; }}\n\
         .markpane-preview table {{ border-collapse: collapse; }}\n\
         .markpane-preview th, .markpane-preview td {{ border: 1px solid {secondary}; padding: 4px 8px; }}\n\
         .markpane-diagram {{ margin: 16px 0; padding: 16px; text-align: center; \
         background: {diagram_bg}; border-radius: {radius}px; }}\n\
         .markpane-diagram.loading {{ color: {secondary}; }}\n\
         .markpane-diagram img {{ max-width: 100%; filter: {image_filter}; }}\n\
         .markpane-diagram-error {{ margin: 16px 0; padding: 12px 16px; color: #ff4d4f; \
         border: 1px solid #ff4d4f; border-radius: {radius}px; }}\n\
         .markpane-diagram-error pre {{ white-space: pre-wrap; margin: 8px 0 0; }}\n",
        bg = t.layout_bg,
        text = t.text,
        font = t.font_family,
        container = t.container_bg,
        radius = t.border_radius_px,
        primary = t.primary,
        secondary = t.text_secondary,
        diagram_bg = t.diagram_bg,
    )
}

#[derive(Serialize)]
struct PageJson<'a> {
    theme: Theme,
    generation: u64,
    sections: Vec<SectionJson<'a>>,
}

#[derive(Serialize)]
struct SectionJson<'a> {
    #[serde(flatten)]
    section: &'a Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    render: Option<&'a DiagramState>,
}

/// Sections and diagram states as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(model: &Model) -> serde_json::Result<String> {
    let sections = model
        .sections
        .iter()
        .map(|section| SectionJson {
            section,
            render: section.id().and_then(|id| model.diagram_state(id)),
        })
        .collect();
    serde_json::to_string_pretty(&PageJson {
        theme: model.theme,
        generation: model.generation,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::PoisonError;

    use super::*;
    use crate::app::{Message, Session, update};
    use crate::diagram::mermaid::TEST_CONFIG_LOCK;
    use crate::diagram::{DiagramId, Renderers};

    const DOC: &str = "# Hi\n\n```mermaid\ngraph TD; A-->B\n```\n\n```puml\n@startuml\nA -> B\n@enduml\n```\n";

    fn rendered(source: &str, theme: Theme) -> Model {
        let mut session = Session::new(source, theme, Renderers::default());
        session.run_pending_renders();
        session.model().clone()
    }

    #[test]
    fn test_page_contains_sections_in_order() {
        let _guard = TEST_CONFIG_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let page = render_page(&rendered(DOC, Theme::Light), "Doc <1>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Doc &lt;1&gt;</title>"));
        let heading = page.find("<h1>").unwrap();
        let mermaid = page.find("<pre class=\"mermaid\"").unwrap();
        let image = page.find("<img src=\"https://www.plantuml.com/plantuml/svg/").unwrap();
        assert!(heading < mermaid && mermaid < image);
    }

    #[test]
    fn test_mermaid_bootstrap_uses_shared_config() {
        let _guard = TEST_CONFIG_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let page = render_page(&rendered(DOC, Theme::Dark), "t");
        assert!(page.contains("data-theme=\"dark\""));
        assert!(page.contains("\"theme\":\"dark\""));
        assert!(page.contains("await mermaid.run();"));
        assert!(page.contains("invert(0.9)"));
    }

    #[test]
    fn test_stylesheet_uses_every_palette_token() {
        for theme in [Theme::Light, Theme::Dark] {
            let css = stylesheet(theme);
            let t = theme.tokens();
            for token in [
                t.primary,
                t.layout_bg,
                t.container_bg,
                t.text,
                t.text_secondary,
                t.diagram_bg,
                t.font_family,
            ] {
                assert!(css.contains(token), "{token} missing for {theme:?}");
            }
            assert!(css.contains(&format!("border-radius: {}px", t.border_radius_px)));
        }
    }

    #[test]
    fn test_no_script_without_mermaid() {
        let model = Model::new("just text", Theme::Light);
        let page = render_page(&model, "t");
        assert!(!page.contains("<script"));
    }

    #[test]
    fn test_failed_diagram_shows_titled_error() {
        let _guard = TEST_CONFIG_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let page = render_page(&rendered("```mermaid\n<b>oops</b>\n```", Theme::Light), "t");
        assert!(page.contains("<strong>Mermaid Diagram Error</strong>"));
        assert!(page.contains("&lt;b&gt;oops"));
        assert!(!page.contains("<b>oops"));
    }

    #[test]
    fn test_loading_and_empty_states() {
        let model = Model::new("```plantuml\n```\n\n```mermaid\ngraph TD\n```", Theme::Light);
        let page = render_page(&model, "t");
        assert!(page.contains("Loading mermaid diagram..."));
        assert!(!page.contains("Loading plantuml diagram..."));
        assert!(page.contains("<div class=\"markpane-diagram plantuml empty\"></div>"));
    }

    #[test]
    fn test_json_lists_sections_with_states() {
        let model = Model::new(DOC, Theme::Light);
        let generation = model.generation;
        let model = update(
            model,
            Message::DiagramRendered {
                generation,
                id: DiagramId::parse("mermaid-0").unwrap(),
                result: Err("bad".to_string()),
            },
        );
        let value: serde_json::Value = serde_json::from_str(&render_json(&model).unwrap()).unwrap();
        let sections = value["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0]["kind"], "html");
        assert_eq!(sections[1]["kind"], "diagram");
        assert_eq!(sections[1]["id"], "mermaid-0");
        assert_eq!(sections[1]["render"]["state"], "failed");
        assert_eq!(sections[2]["render"]["state"], "loading");
        assert_eq!(value["theme"], "light");
    }
}
