//! Diagram placeholders and the scanner that finds them again.
//!
//! A placeholder is `MARK <nonce> ':' <id> ':' <kind> END`, where `MARK` and
//! `END` are the control characters U+0001 and U+0002. Documents can still
//! smuggle those characters into the HTML (numeric character references
//! decode to them), so the nonce is picked per document: the caller renders
//! with nonce 0 and counts the openers. If the count exceeds the number of
//! placeholders it inserted, [`unused_nonce`] names a nonce that no opener in
//! that HTML uses, and one more pass with it is final.

use crate::diagram::{DiagramId, DiagramKind};

const MARK: char = '\u{1}';
const END: char = '\u{2}';
const PREFIX: &str = "\u{1}markpane:";

/// Placeholder syntax for one decomposition pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Placeholders {
    opener: String,
}

impl Placeholders {
    pub(super) fn with_nonce(nonce: u32) -> Self {
        Self {
            opener: format!("{PREFIX}{nonce}:"),
        }
    }

    /// The inert text standing in for a diagram in the rendered HTML.
    pub(super) fn placeholder(&self, id: &DiagramId, kind: DiagramKind) -> String {
        format!("{}{id}:{kind}{END}", self.opener)
    }

    /// Number of openers in `html`, ours or not.
    pub(super) fn count_openers(&self, html: &str) -> usize {
        html.matches(self.opener.as_str()).count()
    }

    pub(super) fn scan<'h>(&'h self, html: &'h str) -> Scanner<'h> {
        Scanner {
            opener: &self.opener,
            rest: html,
        }
    }
}

/// Smallest nonce whose opener appears nowhere in `html`.
///
/// One scan over the HTML. Any `<digits>:` after the prefix counts as taken,
/// so the answer is at most the number of openers present.
pub(super) fn unused_nonce(html: &str) -> u32 {
    let mut taken: Vec<u32> = html
        .match_indices(PREFIX)
        .filter_map(|(start, _)| {
            let tail = &html[start + PREFIX.len()..];
            let digits = tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 || !tail[digits..].starts_with(':') {
                return None;
            }
            tail[..digits].parse().ok()
        })
        .collect();
    taken.sort_unstable();
    taken.dedup();
    taken
        .iter()
        .zip(0u32..)
        .find(|(used, candidate)| **used != *candidate)
        .map_or_else(
            || u32::try_from(taken.len()).unwrap_or(u32::MAX),
            |(_, candidate)| candidate,
        )
}

/// A contiguous stretch of rendered HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Run<'h> {
    Html(&'h str),
    Placeholder { id: &'h str, kind: &'h str },
}

/// Splits HTML into alternating HTML and placeholder runs, left to right.
///
/// Every byte of the input lands in exactly one run. An opener that is not
/// followed by a well-formed `id:kind END` tail is left inside the HTML run.
pub(super) struct Scanner<'h> {
    opener: &'h str,
    rest: &'h str,
}

impl<'h> Iterator for Scanner<'h> {
    type Item = Run<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest;
        if rest.is_empty() {
            return None;
        }

        let mut from = 0;
        while let Some(offset) = rest[from..].find(self.opener) {
            let start = from + offset;
            let tail = &rest[start + self.opener.len()..];
            let Some((id, kind, consumed)) = parse_tail(tail) else {
                from = start + self.opener.len();
                continue;
            };
            if start > 0 {
                // Emit the HTML in front first; the placeholder is picked up
                // on the next call.
                self.rest = &rest[start..];
                return Some(Run::Html(&rest[..start]));
            }
            self.rest = &tail[consumed..];
            return Some(Run::Placeholder { id, kind });
        }

        self.rest = "";
        Some(Run::Html(rest))
    }
}

/// Parse `id:kind END`, returning the pieces and the bytes consumed.
fn parse_tail(body: &str) -> Option<(&str, &str, usize)> {
    let end = body.find([END, MARK, '\n', '<'])?;
    if !body[end..].starts_with(END) {
        return None;
    }
    let (id, kind) = body[..end].rsplit_once(':')?;
    if id.is_empty() || kind.is_empty() {
        return None;
    }
    Some((id, kind, end + END.len_utf8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs<'h>(placeholders: &'h Placeholders, html: &'h str) -> Vec<Run<'h>> {
        placeholders.scan(html).collect()
    }

    #[test]
    fn test_placeholder_round_trips_through_scanner() {
        let p = Placeholders::with_nonce(0);
        let id = DiagramId::new(DiagramKind::Mermaid, 0);
        let html = format!("<p>a</p>\n{}\n<p>b</p>\n", p.placeholder(&id, DiagramKind::Mermaid));
        assert_eq!(
            runs(&p, &html),
            vec![
                Run::Html("<p>a</p>\n"),
                Run::Placeholder {
                    id: "mermaid-0",
                    kind: "mermaid"
                },
                Run::Html("\n<p>b</p>\n"),
            ]
        );
    }

    #[test]
    fn test_adjacent_placeholders_have_no_html_between() {
        let p = Placeholders::with_nonce(3);
        let a = p.placeholder(&DiagramId::new(DiagramKind::Mermaid, 0), DiagramKind::Mermaid);
        let b = p.placeholder(&DiagramId::new(DiagramKind::PlantUml, 1), DiagramKind::PlantUml);
        let html = format!("{a}{b}");
        let result = runs(&p, &html);
        assert_eq!(result.len(), 2);
        assert!(matches!(result[0], Run::Placeholder { id: "mermaid-0", .. }));
        assert!(matches!(result[1], Run::Placeholder { id: "plantuml-1", .. }));
    }

    #[test]
    fn test_runs_cover_every_byte() {
        let p = Placeholders::with_nonce(1);
        let ph = p.placeholder(&DiagramId::new(DiagramKind::PlantUml, 0), DiagramKind::PlantUml);
        let html = format!("x{ph}y{ph}z");
        let rebuilt: String = runs(&p, &html)
            .into_iter()
            .map(|run| match run {
                Run::Html(s) => s.to_string(),
                Run::Placeholder { id, kind } => {
                    format!("\u{1}markpane:1:{id}:{kind}\u{2}")
                }
            })
            .collect();
        assert_eq!(rebuilt, html);
    }

    #[test]
    fn test_malformed_opener_stays_html() {
        let p = Placeholders::with_nonce(0);
        let html = "before \u{1}markpane:0:mermaid-0 no end <p>after</p>";
        assert_eq!(runs(&p, html), vec![Run::Html(html)]);
    }

    #[test]
    fn test_unused_nonce_skips_every_taken_nonce() {
        assert_eq!(unused_nonce("<p>nothing here</p>"), 0);
        let html: String = [0, 1, 2, 4, 2]
            .iter()
            .map(|n| format!("{PREFIX}{n}:x"))
            .collect();
        assert_eq!(unused_nonce(&html), 3);
        let dense: String = (0..50).map(|n| format!("{PREFIX}{n}:")).collect();
        assert_eq!(unused_nonce(&dense), 50);
    }

    #[test]
    fn test_unused_nonce_ignores_malformed_openers() {
        let html = format!("{PREFIX}:x {PREFIX}0 {PREFIX}abc: {PREFIX}99999999999:");
        assert_eq!(unused_nonce(&html), 0);
        assert_eq!(unused_nonce(&format!("{PREFIX}00:")), 1);
    }

    #[test]
    fn test_other_nonce_is_not_matched() {
        let p = Placeholders::with_nonce(7);
        let q = Placeholders::with_nonce(8);
        let html = q.placeholder(&DiagramId::new(DiagramKind::Mermaid, 0), DiagramKind::Mermaid);
        assert_eq!(p.count_openers(&html), 0);
        assert_eq!(runs(&p, &html), vec![Run::Html(&html)]);
    }
}
