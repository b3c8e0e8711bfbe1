//! Progress hooks for conversions.
//!
//! The converter publishes [`ConversionEvent`]s to a [`ConversionObserver`]
//! passed in per call. Nothing in the pipeline writes to a log sink directly,
//! so callers choose where messages go and concurrent conversions never share
//! logger state.

use std::{
    fmt,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::Local;
use log::{Level, debug, error, info, warn};

use crate::{
    dialect::{CandidateAttempt, DialectCandidate},
    error::ConversionError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    WholeFile,
    Streaming,
    Spreadsheet,
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoadStrategy::WholeFile => "whole-file",
            LoadStrategy::Streaming => "streaming",
            LoadStrategy::Spreadsheet => "spreadsheet",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum ConversionEvent<'a> {
    Started { strategy: LoadStrategy, bytes: u64 },
    CandidateTried(&'a CandidateAttempt),
    DialectDetected { candidate: DialectCandidate, score: f64 },
    Loaded { columns: usize, rows: usize },
    ChunkWritten { index: usize, rows: usize },
    Completed { output: &'a Path, rows: usize },
    Failed(&'a ConversionError),
}

impl ConversionEvent<'_> {
    pub fn level(&self) -> Level {
        match self {
            ConversionEvent::CandidateTried(_) | ConversionEvent::ChunkWritten { .. } => {
                Level::Debug
            }
            ConversionEvent::Failed(_) => Level::Error,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for ConversionEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionEvent::Started { strategy, bytes } => {
                write!(f, "Starting conversion ({strategy}, {bytes} byte(s))")
            }
            ConversionEvent::CandidateTried(attempt) => write!(f, "Candidate {attempt}"),
            ConversionEvent::DialectDetected { candidate, score } => {
                write!(f, "Detected dialect {candidate} (score {score:.2})")
            }
            ConversionEvent::Loaded { columns, rows } => {
                write!(f, "Data loaded: {columns} column(s), {rows} row(s)")
            }
            ConversionEvent::ChunkWritten { index, rows } => {
                write!(f, "Chunk {index} written ({rows} row(s))")
            }
            ConversionEvent::Completed { output, rows } => write!(
                f,
                "Conversion completed: {} INSERT statement(s) written to {}",
                rows,
                output.display()
            ),
            ConversionEvent::Failed(err) => write!(f, "Conversion failed: {err}"),
        }
    }
}

pub trait ConversionObserver: Send + Sync {
    fn on_event(&self, input: &Path, event: &ConversionEvent<'_>);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ConversionObserver for LogObserver {
    fn on_event(&self, input: &Path, event: &ConversionEvent<'_>) {
        match event.level() {
            Level::Error => error!("{}: {event}", input.display()),
            Level::Warn => warn!("{}: {event}", input.display()),
            Level::Info => info!("{}: {event}", input.display()),
            _ => debug!("{}: {event}", input.display()),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl ConversionObserver for NullObserver {
    fn on_event(&self, _input: &Path, _event: &ConversionEvent<'_>) {}
}

#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ConversionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ConversionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ConversionObserver for CompositeObserver {
    fn on_event(&self, input: &Path, event: &ConversionEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(input, event);
        }
    }
}

/// Appends `timestamp - LEVEL - message` lines to a log file.
///
/// Writes are best-effort: a log file that cannot be opened or written never
/// fails the conversion. Debug-level events are skipped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// `<dir>/<stem>_log.log` next to `input`.
    pub fn for_input(input: &Path) -> Self {
        Self::new(log_path_for(input))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn log_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "conversion".to_string());
    input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join(format!("{stem}_log.log"))
}

impl ConversionObserver for FileObserver {
    fn on_event(&self, input: &Path, event: &ConversionEvent<'_>) {
        let level = event.level();
        if level > Level::Info {
            return;
        }
        let line = format!(
            "{} - {} - {}: {event}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level.as_str(),
            input.display()
        );
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}
