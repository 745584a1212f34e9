//! Opt-in timing and render debug log.
//!
//! `--perf` prints how long each instrumented scope took; `--render-debug-log`
//! appends timestamped pipeline events to a file. Both are off by default and
//! cost one atomic load when disabled.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static RENDER_LOG: LazyLock<Mutex<RenderLog>> = LazyLock::new(|| Mutex::new(RenderLog::new()));

/// Times a scope and reports it on drop when `--perf` is on.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(target: "markpane::perf", scope = self.name, elapsed_ms, "timing");
        eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
    }
}

#[derive(Debug)]
struct RenderLog {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl RenderLog {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Start (or stop, with `None`) writing the render debug log.
///
/// # Errors
/// Returns an error if the log file cannot be created or written.
pub fn set_render_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = RENDER_LOG.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(path) = path else {
        log.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "markpane render debug log start")?;
    writer.flush()?;
    log.start = Instant::now();
    log.writer = Some(writer);
    Ok(())
}

pub fn is_render_log_enabled() -> bool {
    RENDER_LOG
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .writer
        .is_some()
}

/// Append one event line to the render debug log, if it is open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut log = RENDER_LOG.lock().unwrap_or_else(PoisonError::into_inner);
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    let Some(writer) = log.writer.as_mut() else {
        return;
    };
    let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
    let _ = writer.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_render_log_records_events() {
        let temp_file = NamedTempFile::new().unwrap();
        set_render_log_path(Some(temp_file.path())).unwrap();
        assert!(is_render_log_enabled());
        log_event("test.event", "hello world");
        set_render_log_path(None).unwrap();
        assert!(!is_render_log_enabled());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("markpane render debug log start"));
        assert!(content.contains("test.event: hello world"));
    }
}
