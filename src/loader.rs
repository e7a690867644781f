//! Cascade loader.
//!
//! Drives an ordered queue of candidate files through the parsers. Files
//! are classified when queued (readable → queue, otherwise → missing) and
//! processed strictly in queue order. Includes discovered while parsing are
//! appended to the tail, so they run after every file queued before them.

use crate::deps::DependencyTracker;
use crate::error::{CascadeError, Result};
use crate::parser::{self, ParseContext, ParserOptions, format_of};
use crate::paths::parent_dir;
use crate::settings::Settings;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The loader's file bookkeeping. Parsers receive it to queue includes.
#[derive(Debug, Clone, Default)]
pub struct FileQueue {
    queue: VecDeque<PathBuf>,
    missing: Vec<PathBuf>,
    processed: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
    current: Option<PathBuf>,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue files at the tail. Unreadable files are recorded as missing.
    ///
    /// A file listed again runs again, overriding whatever ran in between.
    pub fn append_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.classify(path.into());
        }
    }

    /// Queue a file named by an `include` directive.
    ///
    /// Unlike [`FileQueue::append_files`], a file already queued, in flight
    /// or processed is ignored, so include cycles terminate. An include of
    /// an earlier file therefore does not re-apply it.
    pub fn include(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.current.as_ref() == Some(&path)
            || self.queue.contains(&path)
            || self.processed.contains(&path)
        {
            debug!(path = %path.display(), "Already loading, include not queued again");
            return;
        }
        self.classify(path);
    }

    fn classify(&mut self, path: PathBuf) {
        if is_readable(&path) {
            self.queue.push_back(path);
        } else if !self.missing.contains(&path) {
            debug!(path = %path.display(), "Config file missing");
            self.missing.push(path);
        }
    }

    /// The file being parsed right now.
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &Path> {
        self.queue.iter().map(PathBuf::as_path)
    }

    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    pub fn processed(&self) -> &[PathBuf] {
        &self.processed
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }
}

/// Whether `path` is a regular file we can open.
fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// Outcome of a load, for diagnostic tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Files handed to a parser, in processing order.
    pub processed: Vec<PathBuf>,
    /// Files that were unreadable when queued and never attempted.
    pub missing: Vec<PathBuf>,
    /// Files with no matching parser, or gone by the time they were dequeued.
    pub skipped: Vec<PathBuf>,
    /// Setting names the cascade needs from outside.
    pub externals: Vec<String>,
}

impl LoadReport {
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Loads a cascade of configuration files into a settings store.
#[derive(Debug)]
pub struct Loader<S> {
    files: FileQueue,
    settings: S,
    dependencies: DependencyTracker,
    options: ParserOptions,
}

impl<S: Settings> Loader<S> {
    /// Create a loader. Files are classified now but not read.
    pub fn new<I, P>(files: I, settings: S) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut queue = FileQueue::new();
        queue.append_files(files);
        Self {
            files: queue,
            settings,
            dependencies: DependencyTracker::new(),
            options: ParserOptions::default(),
        }
    }

    /// Base options every parser is built with.
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn append_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.append_files(paths);
    }

    /// Process every queued file, including ones queued along the way.
    ///
    /// Per-file problems are logged and recorded; only a broken dependency
    /// context stack aborts the run.
    pub fn load(&mut self) -> Result<()> {
        while let Some(path) = self.files.queue.pop_front() {
            match self.load_one(&path, None) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Skipping config file: {}", e),
            }
        }
        info!(
            processed = self.files.processed.len(),
            missing = self.files.missing.len(),
            skipped = self.files.skipped.len(),
            "Configuration loaded"
        );
        Ok(())
    }

    /// Parse one file. `format` overrides the extension-derived format.
    ///
    /// The file is [`Loader::current`] while its parser runs.
    pub fn load_one(&mut self, path: &Path, format: Option<&str>) -> Result<()> {
        if !path.is_file() {
            debug!(path = %path.display(), "Config file vanished before processing");
            self.files.skipped.push(path.to_path_buf());
            return Ok(());
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                self.files.skipped.push(path.to_path_buf());
                return Err(CascadeError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let content = match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                warn!(path = %path.display(), "Config file is not valid UTF-8, bad bytes replaced");
                text
            }
        };

        let format = format
            .map(str::to_string)
            .unwrap_or_else(|| format_of(path));
        let mut options = self.options.clone().with_name(path.display().to_string());
        options.context = parent_dir(path).or(options.context);

        let Some(mut parser) = parser::factory(&format, content, options) else {
            self.files.skipped.push(path.to_path_buf());
            return Err(CascadeError::unknown_format(&format, path));
        };

        parser.initialize();
        let previous = self.files.current.replace(path.to_path_buf());
        let mut cx = ParseContext {
            settings: &mut self.settings,
            dependencies: &mut self.dependencies,
            loader: Some(&mut self.files),
        };
        let result = parser.process(&mut cx);
        self.files.current = previous;
        result?;

        debug!(path = %path.display(), format = %format, "Processed config file");
        self.files.processed.push(path.to_path_buf());
        Ok(())
    }

    /// Setting names referenced but never defined by the cascade.
    pub fn externals(&self) -> Vec<String> {
        self.dependencies.externals()
    }

    pub fn current(&self) -> Option<&Path> {
        self.files.current()
    }

    pub fn files(&self) -> &FileQueue {
        &self.files
    }

    pub fn dependencies(&self) -> &DependencyTracker {
        &self.dependencies
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn into_settings(self) -> S {
        self.settings
    }

    /// Snapshot of the four report lists.
    pub fn report(&self) -> LoadReport {
        LoadReport {
            processed: self.files.processed.clone(),
            missing: self.files.missing.clone(),
            skipped: self.files.skipped.clone(),
            externals: self.externals(),
        }
    }
}
