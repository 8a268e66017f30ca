//! Lazily loaded stylesheet entries.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::logging::targets;
use crate::parser::{ParseError, StylesheetParser, parse_stylesheet};
use crate::rules::Stylesheet;
use crate::{Error, Result};

/// Where a stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// CSS text held in memory.
    Text(String),
    /// A file on disk.
    Path(PathBuf),
    /// A URL. Only `file:` URLs can be loaded.
    Url(Url),
}

impl StylesheetSource {
    /// CSS text source.
    pub fn text(css: impl Into<String>) -> Self {
        Self::Text(css.into())
    }

    /// File source.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Parse a URL source.
    pub fn url(url: &str) -> Result<Self> {
        Url::parse(url)
            .map(Self::Url)
            .map_err(|e| Error::UnsupportedSource(format!("{url}: {e}")))
    }

    /// The file this source reads, for `Path` and `file:` URL sources.
    pub fn file_path(&self) -> Option<PathBuf> {
        match self {
            Self::Text(_) => None,
            Self::Path(path) => Some(path.clone()),
            Self::Url(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Self::Url(_) => None,
        }
    }

    /// Returns true if this source reads `path`.
    pub fn is_path(&self, path: &Path) -> bool {
        self.file_path().is_some_and(|own| own == path)
    }

    /// Read and parse the stylesheet.
    pub fn load(&self) -> Result<(Stylesheet, Vec<ParseError>)> {
        match self {
            Self::Text(css) => Ok(parse_stylesheet(css)),
            Self::Path(path) => load_file(path),
            Self::Url(url) => match self.file_path() {
                Some(path) => load_file(&path),
                None => Err(Error::UnsupportedSource(url.to_string())),
            },
        }
    }
}

fn load_file(path: &Path) -> Result<(Stylesheet, Vec<ParseError>)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    StylesheetParser::parse_reader(BufReader::new(file)).map_err(|err| match err {
        Error::Io { source, .. } => Error::io(path, source),
        other => other,
    })
}

impl fmt::Display for StylesheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(_) => f.write_str("<inline>"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

impl From<&str> for StylesheetSource {
    fn from(css: &str) -> Self {
        Self::Text(css.to_string())
    }
}

impl From<String> for StylesheetSource {
    fn from(css: String) -> Self {
        Self::Text(css)
    }
}

impl From<PathBuf> for StylesheetSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for StylesheetSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Url> for StylesheetSource {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

#[derive(Debug)]
enum EntryState {
    Pending,
    Ready {
        stylesheet: Arc<Stylesheet>,
        errors: Arc<[ParseError]>,
    },
    Failed(Arc<Error>),
}

/// A stylesheet source and its load result.
///
/// The source is read on first access and the result kept. Loading happens
/// at most once, except that an interrupted read leaves the entry pending
/// so the next access tries again.
#[derive(Debug)]
pub struct StylesheetEntry {
    source: StylesheetSource,
    state: RwLock<EntryState>,
    #[cfg(test)]
    interruptions: std::sync::atomic::AtomicUsize,
}

impl StylesheetEntry {
    /// Create a pending entry.
    pub fn new(source: impl Into<StylesheetSource>) -> Self {
        Self {
            source: source.into(),
            state: RwLock::new(EntryState::Pending),
            #[cfg(test)]
            interruptions: Default::default(),
        }
    }

    /// Create an entry for an already parsed stylesheet.
    pub fn ready(source: impl Into<StylesheetSource>, stylesheet: Stylesheet) -> Self {
        Self {
            source: source.into(),
            state: RwLock::new(EntryState::Ready {
                stylesheet: Arc::new(stylesheet),
                errors: Arc::from(Vec::new()),
            }),
            #[cfg(test)]
            interruptions: Default::default(),
        }
    }

    /// The entry's source.
    pub fn source(&self) -> &StylesheetSource {
        &self.source
    }

    /// Returns true once the entry is ready or failed.
    pub fn is_resolved(&self) -> bool {
        !matches!(*self.state.read(), EntryState::Pending)
    }

    /// Load the source if that has not happened yet.
    pub fn resolve(&self) {
        if self.is_resolved() {
            return;
        }
        let mut state = self.state.write();
        if !matches!(*state, EntryState::Pending) {
            return;
        }

        match self.load() {
            Ok((stylesheet, errors)) => {
                tracing::debug!(
                    target: targets::STYLESHEET,
                    source = %self.source,
                    rules = stylesheet.len(),
                    errors = errors.len(),
                    "loaded stylesheet"
                );
                *state = EntryState::Ready {
                    stylesheet: Arc::new(stylesheet),
                    errors: errors.into(),
                };
            }
            Err(err) if err.is_interrupted() => {
                tracing::debug!(
                    target: targets::STYLESHEET,
                    source = %self.source,
                    "stylesheet read interrupted; will retry"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: targets::STYLESHEET,
                    source = %self.source,
                    error = %err,
                    "failed to load stylesheet"
                );
                *state = EntryState::Failed(Arc::new(err));
            }
        }
    }

    fn load(&self) -> Result<(Stylesheet, Vec<ParseError>)> {
        #[cfg(test)]
        if self.take_interruption() {
            let interrupted = std::io::Error::from(std::io::ErrorKind::Interrupted);
            return Err(Error::io(self.source.to_string(), interrupted));
        }
        self.source.load()
    }

    /// Make the next `count` loads fail as interrupted reads.
    #[cfg(test)]
    pub(crate) fn interrupt_loads(&self, count: usize) {
        use std::sync::atomic::Ordering;
        self.interruptions.store(count, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn take_interruption(&self) -> bool {
        use std::sync::atomic::Ordering;
        self.interruptions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// The parsed stylesheet, loading it on first access.
    ///
    /// `None` if loading failed or is still pending after an interruption.
    pub fn stylesheet(&self) -> Option<Arc<Stylesheet>> {
        self.resolve();
        match &*self.state.read() {
            EntryState::Ready { stylesheet, .. } => Some(Arc::clone(stylesheet)),
            _ => None,
        }
    }

    /// Parse errors recorded while loading.
    pub fn parse_errors(&self) -> Arc<[ParseError]> {
        self.resolve();
        match &*self.state.read() {
            EntryState::Ready { errors, .. } => Arc::clone(errors),
            _ => Arc::from(Vec::new()),
        }
    }

    /// The load failure, if loading failed.
    pub fn error(&self) -> Option<Arc<Error>> {
        self.resolve();
        match &*self.state.read() {
            EntryState::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }
}
