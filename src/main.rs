//! Markpane - Markdown preview with inline PlantUML and Mermaid diagrams.
//!
//! # Usage
//!
//! ```bash
//! markpane render README.md -o README.html
//! markpane watch README.md -o README.html
//! markpane encode diagram.puml --url
//! ```

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use markpane::app::{Message, Session};
use markpane::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use markpane::diagram::{Renderers, plantuml};
use markpane::document::DEFAULT_MARKDOWN;
use markpane::export::{render_json, render_page};
use markpane::perf;
use markpane::theme::Theme;
use markpane::watcher::{DEFAULT_DEBOUNCE_MS, SourceWatcher};

const WATCH_POLL: Duration = Duration::from_millis(100);

/// Markdown preview with inline PlantUML and Mermaid diagrams
#[derive(Parser, Debug)]
#[command(name = "markpane", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Page theme
    #[arg(long, value_enum, global = true)]
    theme: Option<Theme>,

    /// PlantUML server base URL
    #[arg(long, value_name = "URL", global = true)]
    plantuml_server: Option<String>,

    /// Start with editor/preview scroll sync switched off
    #[arg(long, global = true)]
    no_sync: bool,

    /// Print timing information
    #[arg(long, global = true)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH", global = true)]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a Markdown file to a standalone HTML page
    Render {
        /// Markdown file, or `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        file: PathBuf,

        /// Output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Emit sections and diagram states as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Re-render the page whenever the Markdown file changes
    Watch {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },
    /// Encode PlantUML source for a PlantUML server
    Encode {
        /// Diagram source file, or `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        file: PathBuf,

        /// Print the full SVG URL instead of the bare encoding
        #[arg(long)]
        url: bool,
    },
    /// Decode a PlantUML server encoding back to source
    Decode {
        #[arg(value_name = "ENCODED")]
        encoded: String,
    },
    /// Render the built-in demo document
    Demo {
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the demo Markdown instead of the rendered page
        #[arg(long)]
        markdown: bool,
    },
}

#[derive(Debug, Clone)]
struct Settings {
    theme: Theme,
    plantuml_server: String,
    sync: bool,
}

impl Settings {
    fn from_flags(flags: &ConfigFlags) -> Self {
        Self {
            theme: flags.theme.unwrap_or_default(),
            plantuml_server: flags
                .plantuml_server
                .clone()
                .unwrap_or_else(|| plantuml::DEFAULT_SERVER.to_string()),
            sync: !flags.no_sync,
        }
    }

    fn session(&self, source: impl Into<String>) -> Session {
        let mut session = Session::new(
            source,
            self.theme,
            Renderers::builtin(self.plantuml_server.clone()),
        )
        .with_sync_enabled(self.sync);
        session.run_pending_renders();
        session
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush().context("Failed to write stdout")
        }
    }
}

fn page_title(path: &Path) -> String {
    path.file_stem()
        .filter(|_| path.as_os_str() != "-")
        .map_or_else(|| "markpane".to_string(), |s| s.to_string_lossy().into_owned())
}

fn render(settings: &Settings, file: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let session = settings.session(read_input(file)?);
    let content = if json {
        render_json(session.model()).context("Failed to serialize sections")?
    } else {
        render_page(session.model(), &page_title(file))
    };
    write_output(output, &content)
}

fn watch(settings: &Settings, file: &Path, output: &Path) -> Result<()> {
    let title = page_title(file);
    let mut session = settings.session(read_input(file)?);
    write_output(Some(output), &render_page(session.model(), &title))?;

    let mut watcher = SourceWatcher::new(file, DEFAULT_DEBOUNCE_MS)
        .with_context(|| format!("Failed to watch {}", file.display()))?;
    eprintln!(
        "Watching {} -> {} (Ctrl+C to stop)",
        watcher.source_path().display(),
        output.display()
    );

    let start = Instant::now();
    loop {
        std::thread::sleep(WATCH_POLL);
        let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if !watcher.poll(now_ms) {
            continue;
        }
        let source = match read_input(file) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(error = %err, "reload failed");
                perf::log_event("reload.error", format!("path={} err={err}", file.display()));
                continue;
            }
        };
        if source == session.model().source {
            continue;
        }
        session.dispatch(Message::TextChanged(source));
        session.run_pending_renders();
        write_output(Some(output), &render_page(session.model(), &title))?;
        tracing::info!(output = %output.display(), "re-rendered");
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MARKPANE_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_render_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            error = %err,
            "failed to initialize render debug log"
        );
    }

    let settings = Settings::from_flags(&effective);
    match cli.command {
        Command::Render { file, output, json } => {
            render(&settings, &file, output.as_deref(), json)
        }
        Command::Watch { file, output } => watch(&settings, &file, &output),
        Command::Encode { file, url } => {
            let source = read_input(&file)?;
            let encoded = if url {
                plantuml::svg_url(&settings.plantuml_server, &source)
            } else {
                plantuml::encode(&source)
            };
            let encoded = encoded.context("Failed to encode PlantUML source")?;
            write_output(None, &format!("{encoded}\n"))
        }
        Command::Decode { encoded } => {
            let source = plantuml::decode(encoded.trim()).context("Failed to decode")?;
            write_output(None, &source)
        }
        Command::Demo { output, markdown } => {
            if markdown {
                return write_output(output.as_deref(), DEFAULT_MARKDOWN);
            }
            let mut session = settings.session(String::new());
            session.dispatch(Message::Reset);
            session.run_pending_renders();
            write_output(output.as_deref(), &render_page(session.model(), "markpane demo"))
        }
    }
}
