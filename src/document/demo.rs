/// Document shown on first start and after a reset.
pub const DEFAULT_MARKDOWN: &str = r#"# Markpane

Write Markdown on the left, read it on the right. Fenced **PlantUML** and
**Mermaid** blocks are drawn as diagrams right where they appear.

---

## Features

- GitHub Flavored Markdown: tables, task lists, footnotes, ~~strikethrough~~
- PlantUML through any PlantUML server
- Mermaid flowcharts, sequence, class, state, gantt and ER diagrams
- Editor and preview scroll together

| Fence tag            | Rendered as     |
|----------------------|-----------------|
| `mermaid`            | Mermaid diagram |
| `plantuml` / `puml`  | PlantUML image  |
| anything else        | code block      |

---

## PlantUML

```plantuml
@startuml
Alice -> Bob: Authentication Request
Bob --> Alice: Response
@enduml
```

## Mermaid

```mermaid
flowchart TD
    A[Start] --> B{Check Input}
    B -->|Valid| C[Process]
    B -->|Invalid| D[Error]
```

## Plain code

```rust
fn main() {
    println!("code blocks stay code");
}
```

- [x] Render diagrams inline
- [ ] Write your own document
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SectionKind, decompose};

    #[test]
    fn test_demo_document_has_both_diagram_kinds() {
        let kinds: Vec<SectionKind> = decompose(DEFAULT_MARKDOWN)
            .iter()
            .map(crate::document::Section::kind)
            .collect();
        assert!(kinds.contains(&SectionKind::Mermaid));
        assert!(kinds.contains(&SectionKind::PlantUml));
        assert_eq!(kinds.first(), Some(&SectionKind::Html));
        assert_eq!(kinds.last(), Some(&SectionKind::Html));
    }
}
