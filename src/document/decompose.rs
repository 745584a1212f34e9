//! Markdown → ordered sections.

use std::collections::HashMap;

use comrak::nodes::{NodeCodeBlock, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

use super::placeholder::{Placeholders, Run, unused_nonce};
use super::sanitize::sanitize_section;
use super::{Section, escape_attr, escape_html};
use crate::diagram::{DiagramBlock, DiagramId, DiagramKind};

/// Split a markdown document into sanitized HTML and diagram sections.
///
/// Sections come out in document order. Mermaid (`mermaid`) and PlantUML
/// (`plantuml`, `puml`) fences become diagram sections carrying their source
/// verbatim; every other fence renders as a `<pre><code>` block inside the
/// surrounding HTML. Whitespace-only HTML between diagrams is dropped.
///
/// Never fails: malformed markdown simply renders as text.
///
/// ```
/// use markpane::document::{decompose, SectionKind};
///
/// let sections = decompose("intro\n\n```mermaid\ngraph TD; A-->B\n```\n");
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[1].kind(), SectionKind::Mermaid);
/// assert_eq!(sections[1].content(), "graph TD; A-->B");
/// ```
pub fn decompose(markdown: &str) -> Vec<Section> {
    decompose_in_passes(markdown).0
}

/// Decompose and report how many render passes it took (one or two).
fn decompose_in_passes(markdown: &str) -> (Vec<Section>, u32) {
    let _scope = crate::perf::scope("document.decompose");
    let options = create_options();

    let mut nonce = 0u32;
    let mut passes = 1u32;
    loop {
        let placeholders = Placeholders::with_nonce(nonce);
        let (html, blocks) = render_html(markdown, &options, &placeholders);
        if placeholders.count_openers(&html) == blocks.len() {
            let sections = assemble(&html, &placeholders, blocks);
            tracing::debug!(
                sections = sections.len(),
                nonce,
                passes,
                html_bytes = html.len(),
                "decomposed document"
            );
            crate::perf::log_event(
                "document.decompose",
                format!("sections={} nonce={nonce} passes={passes}", sections.len()),
            );
            return (sections, passes);
        }
        // Only placeholders depend on the nonce, so the document text renders
        // the same next pass and cannot spell the new opener.
        let next = unused_nonce(&html);
        tracing::debug!(nonce, next, "document text contains the placeholder opener");
        nonce = next;
        passes += 1;
    }
}

fn create_options() -> Options {
    let mut options = Options::default();

    // GFM
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.shortcodes = true;

    // Single newlines inside a paragraph become <br>.
    options.render.hardbreaks = true;
    // Raw HTML passes through here and is cleaned per section afterwards.
    options.render.unsafe_ = true;

    options
}

/// Render markdown to HTML, swapping every code block for our own markup.
fn render_html(
    markdown: &str,
    options: &Options,
    placeholders: &Placeholders,
) -> (String, Vec<DiagramBlock>) {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, options);

    let mut blocks = Vec::new();
    for node in root.descendants() {
        let literal = {
            let data = node.data.borrow();
            let NodeValue::CodeBlock(code) = &data.value else {
                continue;
            };
            code_block_html(code, placeholders, &mut blocks)
        };
        node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal,
        });
    }

    let mut out = Vec::with_capacity(markdown.len() * 2);
    if let Err(err) = format_html(root, options, &mut out) {
        // Writing into a Vec does not fail; keep whatever was produced.
        tracing::warn!(%err, "html formatting stopped early");
    }
    (String::from_utf8_lossy(&out).into_owned(), blocks)
}

fn code_block_html(
    code: &NodeCodeBlock,
    placeholders: &Placeholders,
    blocks: &mut Vec<DiagramBlock>,
) -> String {
    let language = code.info.split_whitespace().next().unwrap_or_default();
    let text = code.literal.strip_suffix('\n').unwrap_or(&code.literal);

    if let Some(kind) = DiagramKind::from_fence_tag(language).filter(|_| code.fenced) {
        let id = DiagramId::new(kind, blocks.len());
        let placeholder = placeholders.placeholder(&id, kind);
        blocks.push(DiagramBlock {
            id,
            kind,
            source: text.to_string(),
        });
        return format!("{placeholder}\n");
    }

    if language.is_empty() {
        format!("<pre><code>{}</code></pre>\n", escape_html(text))
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_attr(&language.to_lowercase()),
            escape_html(text)
        )
    }
}

/// Walk the HTML once and emit sections in textual order.
fn assemble(html: &str, placeholders: &Placeholders, blocks: Vec<DiagramBlock>) -> Vec<Section> {
    let mut pending: HashMap<DiagramId, DiagramBlock> = blocks
        .into_iter()
        .map(|block| (block.id.clone(), block))
        .collect();

    let mut sections = Vec::new();
    for run in placeholders.scan(html) {
        match run {
            Run::Html(fragment) => {
                let clean = sanitize_section(fragment);
                let trimmed = clean.trim();
                if !trimmed.is_empty() {
                    sections.push(Section::Html {
                        content: trimmed.to_string(),
                    });
                }
            }
            Run::Placeholder { id, kind } => {
                match DiagramId::parse(id).and_then(|id| pending.remove(&id)) {
                    Some(block) => sections.push(Section::Diagram {
                        id: block.id,
                        diagram: block.kind,
                        source: block.source,
                    }),
                    None => tracing::warn!(id, kind, "placeholder has no diagram block"),
                }
            }
        }
    }
    sections
}
