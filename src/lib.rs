// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. diagram::DiagramKind)
    clippy::module_name_repetitions
)]

//! # Markpane
//!
//! Markdown preview with inline PlantUML and Mermaid diagrams.
//!
//! Markpane turns a Markdown document into an ordered list of sections:
//! - Sanitized HTML for ordinary content
//! - Mermaid diagrams, drawn client-side by mermaid.js
//! - PlantUML diagrams, drawn by a PlantUML server from an encoded URL
//!
//! ## Architecture
//!
//! A preview session uses The Elm Architecture (TEA) pattern:
//! - **Model**: Document text, sections and per-diagram state
//! - **Message**: Edits, render results and toggles
//! - **Update**: Pure state transitions
//! - **Session**: Renderers, scroll panes and side effects
//!
//! ## Modules
//!
//! - [`document`]: Section decomposition and HTML sanitizing
//! - [`diagram`]: Diagram kinds, renderers and the PlantUML codec
//! - [`sync`]: Editor and preview scroll synchronization
//! - [`app`]: Preview session state
//! - [`export`]: Standalone HTML and JSON output
//! - [`theme`]: Light and dark palettes
//! - [`config`]: Persisted default flags
//! - [`watcher`]: File watching for live reload

pub mod app;
pub mod config;
pub mod diagram;
pub mod document;
pub mod export;
pub mod perf;
pub mod sync;
pub mod theme;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{Message, Model, Session, update};
    pub use crate::diagram::{DiagramKind, DiagramState, Renderers};
    pub use crate::document::{Section, decompose, sanitize};
    pub use crate::sync::{Pane, ScrollSync, Viewport};
    pub use crate::theme::Theme;
}
