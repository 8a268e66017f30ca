//! File watching for stylesheet hot-reload.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};

use crate::logging::targets;
use crate::model::SelectorModel;
use crate::resolve::{StyleOrigin, StylesheetManager};
use crate::{Error, Result};

/// Quiet period before a burst of writes is reported as one change.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// A watched stylesheet file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetChangeEvent {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// Whether the file can still be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file exists and should be parsed again.
    Modified,
    /// The file is gone.
    Removed,
}

impl ChangeKind {
    fn of(path: &Path) -> Self {
        if path.exists() {
            ChangeKind::Modified
        } else {
            ChangeKind::Removed
        }
    }
}

/// Watches file-backed stylesheets for changes.
///
/// # Example
///
/// ```ignore
/// let mut watcher = StylesheetWatcher::new()?;
/// watcher.watch_manager(&manager)?;
///
/// // In your event loop:
/// let changes = watcher.poll();
/// if watcher.apply_changes(&mut manager, &changes) > 0 {
///     manager.apply_to_all(&elements)?;
/// }
/// ```
pub struct StylesheetWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    events: Receiver<DebounceEventResult>,
    watched: HashSet<PathBuf>,
}

impl StylesheetWatcher {
    /// Create a watcher with nothing registered.
    pub fn new() -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let debouncer = new_debouncer(DEBOUNCE, tx).map_err(|e| Error::HotReload(e.to_string()))?;
        Ok(Self {
            debouncer,
            events,
            watched: HashSet::new(),
        })
    }

    /// Start watching a stylesheet file. Watching the same file twice is a no-op.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().map_err(|e| Error::io(path, e))?;
        if self.watched.contains(&canonical) {
            return Ok(());
        }

        self.debouncer
            .watcher()
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|e| Error::HotReload(e.to_string()))?;
        tracing::debug!(target: targets::HOT_RELOAD, path = %canonical.display(), "watching stylesheet");
        self.watched.insert(canonical);
        Ok(())
    }

    /// Watch every existing file-backed stylesheet of the cascaded origins.
    pub fn watch_manager<M: SelectorModel>(&mut self, manager: &StylesheetManager<M>) -> Result<()> {
        let paths: Vec<PathBuf> = StyleOrigin::CASCADED
            .into_iter()
            .flat_map(|origin| manager.stylesheets(origin))
            .filter_map(|entry| entry.source().file_path())
            .filter(|path| path.exists())
            .collect();
        paths.iter().try_for_each(|path| self.watch(path))
    }

    /// Stop watching a file. Unknown or deleted files are ignored.
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let Ok(canonical) = path.as_ref().canonicalize() else {
            return Ok(());
        };
        if self.watched.remove(&canonical) {
            // The backend may have dropped the watch already if the file went away.
            let _ = self.debouncer.watcher().unwatch(&canonical);
            tracing::debug!(target: targets::HOT_RELOAD, path = %canonical.display(), "stopped watching stylesheet");
        }
        Ok(())
    }

    /// Drain pending file events.
    ///
    /// Each watched path appears at most once, ordered by path, with the
    /// state it was last seen in.
    pub fn poll(&mut self) -> Vec<StylesheetChangeEvent> {
        let mut latest = BTreeMap::new();
        loop {
            match self.events.try_recv() {
                Ok(Ok(batch)) => {
                    for event in batch {
                        if event.kind == DebouncedEventKind::Any && self.watched.contains(&event.path) {
                            let change = ChangeKind::of(&event.path);
                            latest.insert(event.path, change);
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: targets::HOT_RELOAD, error = %e, "file watcher error");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!(target: targets::HOT_RELOAD, "file watcher disconnected");
                    break;
                }
            }
        }

        latest
            .into_iter()
            .map(|(path, kind)| StylesheetChangeEvent { path, kind })
            .collect()
    }

    /// Hand changes to a manager: modified files are parsed again on next
    /// use, removed files leave the manager.
    ///
    /// Returns how many changes matched a registered stylesheet.
    pub fn apply_changes<M: SelectorModel>(
        &self,
        manager: &mut StylesheetManager<M>,
        changes: &[StylesheetChangeEvent],
    ) -> usize {
        changes
            .iter()
            .filter(|change| {
                let affected = match change.kind {
                    ChangeKind::Modified => manager.reload_path(&change.path),
                    ChangeKind::Removed => manager.remove_path(&change.path),
                };
                tracing::info!(
                    target: targets::HOT_RELOAD,
                    path = %change.path.display(),
                    kind = ?change.kind,
                    affected,
                    "stylesheet changed"
                );
                affected
            })
            .count()
    }

    /// Number of watched files.
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Canonical paths of the watched files.
    pub fn watched_paths(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }
}
