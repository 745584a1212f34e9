//! Source file watching for live reload.
//!
//! Uses notify for cross-platform file system events. Events are collected
//! on notify's thread and drained by polling, so the caller decides when a
//! reload happens.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Default quiet period before a burst of writes counts as one change.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Collapses a burst of change events into one ready signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDebouncer {
    delay_ms: u64,
    pending_since: Option<u64>,
}

impl ChangeDebouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending_since: None,
        }
    }

    /// Note a change at `now_ms`; later changes push the deadline out.
    pub const fn touch(&mut self, now_ms: u64) {
        self.pending_since = Some(now_ms);
    }

    pub fn take_ready(&mut self, now_ms: u64) -> bool {
        let Some(since) = self.pending_since else {
            return false;
        };
        if now_ms.saturating_sub(since) >= self.delay_ms {
            self.pending_since = None;
            true
        } else {
            false
        }
    }

    pub const fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}

/// Watches one Markdown source and reports debounced changes.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    source_path: PathBuf,
    source_name: Option<OsString>,
    debouncer: ChangeDebouncer,
}

impl std::fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceWatcher")
            .field("source_path", &self.source_path)
            .field("watch_root", &self.watch_root)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl SourceWatcher {
    /// Start watching `path`.
    ///
    /// The parent directory is watched rather than the file itself, since
    /// many editors save by replacing the file.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the directory
    /// cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce_ms: u64) -> notify::Result<Self> {
        // Event paths from the OS are canonical.
        let source_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let source_name = source_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&source_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %source_path.display(), root = %watch_root.display(), "watching source");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            source_path,
            source_name,
            debouncer: ChangeDebouncer::new(debounce_ms),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Drain pending events and report whether a debounced change is ready
    /// as of `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let mut relevant = 0u32;
        let mut ignored = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(_) => ignored += 1,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    crate::perf::log_event("watcher.error", err.to_string());
                }
            }
        }
        if relevant + ignored > 0 {
            crate::perf::log_event(
                "watcher.poll",
                format!(
                    "relevant={relevant} ignored={ignored} source={}",
                    self.source_path.display()
                ),
            );
        }
        if relevant > 0 {
            self.debouncer.touch(now_ms);
        }
        self.debouncer.take_ready(now_ms)
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.source_path
                || self
                    .source_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_debouncer_waits_for_quiet_period() {
        let mut debouncer = ChangeDebouncer::new(200);
        assert!(!debouncer.take_ready(0));
        debouncer.touch(100);
        assert!(!debouncer.take_ready(250));
        debouncer.touch(250);
        assert!(!debouncer.take_ready(400));
        assert!(debouncer.take_ready(450));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take_ready(1000));
    }

    #[test]
    fn test_sibling_file_event_is_ignored() {
        let dir = tempdir().unwrap();
        let canonical_dir = dir.path().canonicalize().unwrap();
        let path = canonical_dir.join("doc.md");
        std::fs::write(&path, "# doc").unwrap();
        let watcher = SourceWatcher::new(&path, 10).unwrap();

        assert!(watcher.is_relevant(&event(vec![path.clone()])));
        assert!(watcher.is_relevant(&event(vec![canonical_dir.clone()])));
        assert!(!watcher.is_relevant(&event(vec![canonical_dir.join("other.md")])));
    }

    #[test]
    fn test_relative_source_matches_canonical_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "notes").unwrap();
        let watcher = SourceWatcher::new(&path, 10).unwrap();
        let canonical = dir.path().canonicalize().unwrap().join("notes.md");
        assert!(watcher.is_relevant(&event(vec![canonical])));
    }

    #[test]
    fn test_watch_root_for_bare_file_name_is_dot() {
        assert_eq!(watch_root_for(Path::new("README.md")), PathBuf::from("."));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap().join("live.md");
        std::fs::write(&path, "# before").unwrap();
        let mut watcher = SourceWatcher::new(&path, 50).unwrap();

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "# after").unwrap();

        let start = Instant::now();
        let deadline = Duration::from_secs(5);
        let mut detected = false;
        while start.elapsed() < deadline {
            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if watcher.poll(now_ms) {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(detected, "watcher should report the edit within 5 seconds");
    }
}
