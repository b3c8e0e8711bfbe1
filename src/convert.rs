//! File-level conversion: reader selection, detection, statement generation
//! and output.
//!
//! Each [`ConversionRequest`] is handled independently and always yields a
//! [`ConversionOutcome`]; errors are folded into the outcome at the file
//! boundary so a batch keeps going after a failure.
//!
//! Text inputs up to the configured threshold are parsed once during detection
//! and that table is rendered directly. Larger inputs are detected on a bounded
//! probe and then streamed in row chunks with the winning dialect. Both paths
//! emit identical statement text for the same input.
//!
//! Output goes to a temporary file beside the destination and is persisted as
//! `<basename>.sql` only after the last statement was written.

use std::{
    fmt, fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::warn;
use tempfile::NamedTempFile;

use crate::{
    config::ConverterConfig,
    dialect::{DialectDetector, Detection},
    error::{ConversionError, ConversionResult},
    identifier::{self, Identifier, IdentifierKind},
    io_utils::{self, InputFormat, RecordStream},
    observer::{ConversionEvent, ConversionObserver, LoadStrategy, LogObserver},
    spreadsheet,
    statement::{self, StatementBuilder, TargetDialect},
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub dialect: TargetDialect,
    pub schema: String,
    pub table: String,
    /// Only used by `sqlserver`, for the `USE` preamble.
    pub database: Option<String>,
}

impl ConversionRequest {
    pub fn new(
        input: impl Into<PathBuf>,
        dialect: TargetDialect,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            dialect,
            schema: schema.into(),
            table: table.into(),
            database: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

#[derive(Debug)]
pub enum ConversionOutcome {
    Converted {
        input: PathBuf,
        output: PathBuf,
        rows: usize,
    },
    Failed {
        input: PathBuf,
        error: ConversionError,
    },
}

impl ConversionOutcome {
    pub fn input(&self) -> &Path {
        match self {
            ConversionOutcome::Converted { input, .. } | ConversionOutcome::Failed { input, .. } => {
                input
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Converted { .. })
    }

    pub fn error(&self) -> Option<&ConversionError> {
        match self {
            ConversionOutcome::Failed { error, .. } => Some(error),
            ConversionOutcome::Converted { .. } => None,
        }
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .input()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input().display().to_string());
        match self {
            ConversionOutcome::Converted { output, rows, .. } => {
                write!(f, "{name} -> OK ({}, rows: {rows})", output.display())
            }
            ConversionOutcome::Failed { error, .. } => write!(f, "{name} -> Error: {error}"),
        }
    }
}

/// Validated names for one request.
struct Target {
    schema: Identifier,
    table: Identifier,
    database: Option<Identifier>,
}

impl Target {
    fn validate(request: &ConversionRequest) -> ConversionResult<Self> {
        let schema = identifier::validate(&request.schema, IdentifierKind::Schema)?;
        let table = identifier::validate(&request.table, IdentifierKind::Table)?;
        let database = match request.database.as_deref() {
            Some(name) if request.dialect.supports_use_preamble() => {
                Some(identifier::validate(name, IdentifierKind::Database)?)
            }
            _ => None,
        };
        Ok(Self {
            schema,
            table,
            database,
        })
    }

    fn builder(&self, dialect: TargetDialect, columns: &[String]) -> ConversionResult<StatementBuilder> {
        let columns = identifier::validate_columns(columns)?;
        Ok(StatementBuilder::new(
            dialect,
            &self.schema,
            &self.table,
            &columns,
        ))
    }

    fn preamble(&self, dialect: TargetDialect) -> String {
        statement::preamble(dialect, &self.schema, &self.table, self.database.as_ref())
    }
}

pub struct Converter {
    config: ConverterConfig,
    detector: DialectDetector,
    observer: Arc<dyn ConversionObserver>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::from_valid(ConverterConfig::default())
    }
}

impl Converter {
    /// Fails when `config` has a zero probe or chunk size.
    pub fn new(config: ConverterConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ConverterConfig) -> Self {
        let detector = DialectDetector::with_nulls(config.null_markers());
        Self {
            config,
            detector,
            observer: Arc::new(LogObserver),
        }
    }

    /// Replaces the default observer used by [`Converter::convert`].
    pub fn with_observer(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn convert(&self, request: &ConversionRequest) -> ConversionOutcome {
        self.convert_with(request, self.observer.as_ref())
    }

    /// Converts one file, reporting progress to `observer` instead of the default.
    pub fn convert_with(
        &self,
        request: &ConversionRequest,
        observer: &dyn ConversionObserver,
    ) -> ConversionOutcome {
        let input = request.input.clone();
        match self.try_convert(request, observer) {
            Ok((output, rows)) => {
                observer.on_event(
                    &input,
                    &ConversionEvent::Completed {
                        output: &output,
                        rows,
                    },
                );
                ConversionOutcome::Converted {
                    input,
                    output,
                    rows,
                }
            }
            Err(error) => {
                observer.on_event(&input, &ConversionEvent::Failed(&error));
                ConversionOutcome::Failed { input, error }
            }
        }
    }

    /// Converts every request in order; one failure never stops the rest.
    pub fn convert_all(&self, requests: &[ConversionRequest]) -> Vec<ConversionOutcome> {
        requests.iter().map(|request| self.convert(request)).collect()
    }

    fn try_convert(
        &self,
        request: &ConversionRequest,
        observer: &dyn ConversionObserver,
    ) -> ConversionResult<(PathBuf, usize)> {
        let input = request.input.as_path();
        let format = io_utils::input_format(input)?;
        let bytes = io_utils::ensure_readable(input)?;
        let target = Target::validate(request)?;
        if request.database.is_some() && target.database.is_none() {
            warn!(
                "{}: database name ignored for {} output",
                input.display(),
                request.dialect
            );
        }
        let output = io_utils::sql_output_path(input, self.config.output_dir.as_deref());

        match format {
            InputFormat::Spreadsheet => {
                observer.on_event(
                    input,
                    &ConversionEvent::Started {
                        strategy: LoadStrategy::Spreadsheet,
                        bytes,
                    },
                );
                let table = spreadsheet::read_first_sheet(input, self.detector.nulls())?;
                self.write_table(request, &target, table, &output, observer)
            }
            InputFormat::Text if bytes > self.config.stream_threshold_bytes => {
                observer.on_event(
                    input,
                    &ConversionEvent::Started {
                        strategy: LoadStrategy::Streaming,
                        bytes,
                    },
                );
                let detection = self.detect(input, Some(self.config.probe_rows), observer)?;
                self.write_streamed(request, &target, detection, &output, observer)
            }
            InputFormat::Text => {
                observer.on_event(
                    input,
                    &ConversionEvent::Started {
                        strategy: LoadStrategy::WholeFile,
                        bytes,
                    },
                );
                let detection = self.detect(input, None, observer)?;
                self.write_table(request, &target, detection.table, &output, observer)
            }
        }
    }

    fn detect(
        &self,
        input: &Path,
        probe_rows: Option<usize>,
        observer: &dyn ConversionObserver,
    ) -> ConversionResult<Detection> {
        let detection = self.detector.detect(input, probe_rows)?;
        for attempt in &detection.attempts {
            observer.on_event(input, &ConversionEvent::CandidateTried(attempt));
        }
        observer.on_event(
            input,
            &ConversionEvent::DialectDetected {
                candidate: detection.candidate,
                score: detection.score.value,
            },
        );
        Ok(detection)
    }

    fn write_table(
        &self,
        request: &ConversionRequest,
        target: &Target,
        table: Table,
        output: &Path,
        observer: &dyn ConversionObserver,
    ) -> ConversionResult<(PathBuf, usize)> {
        let builder = target.builder(request.dialect, &table.columns)?;
        observer.on_event(
            &request.input,
            &ConversionEvent::Loaded {
                columns: table.column_count(),
                rows: table.row_count(),
            },
        );
        let statements = builder.build(&table.rows);
        let mut sink = SqlSink::create(output)?;
        sink.write_str(&target.preamble(request.dialect))?;
        sink.write_str(&statements)?;
        sink.commit()?;
        Ok((output.to_path_buf(), table.row_count()))
    }

    fn write_streamed(
        &self,
        request: &ConversionRequest,
        target: &Target,
        detection: Detection,
        output: &Path,
        observer: &dyn ConversionObserver,
    ) -> ConversionResult<(PathBuf, usize)> {
        let input = request.input.as_path();
        let Detection {
            candidate, table, ..
        } = detection;
        let builder = target.builder(request.dialect, &table.columns)?;
        drop(table);

        let mut stream = RecordStream::open(input, candidate, self.detector.nulls().clone())?;
        let mut sink = SqlSink::create(output)?;
        sink.write_str(&target.preamble(request.dialect))?;

        let mut rows = 0usize;
        let mut index = 0usize;
        while let Some(chunk) = stream.next_chunk(self.config.chunk_rows)? {
            let text = builder.build(&chunk);
            if rows > 0 {
                sink.write_str("\n")?;
            }
            sink.write_str(&text)?;
            rows += chunk.len();
            index += 1;
            observer.on_event(
                input,
                &ConversionEvent::ChunkWritten {
                    index,
                    rows: chunk.len(),
                },
            );
        }
        observer.on_event(
            input,
            &ConversionEvent::Loaded {
                columns: stream.columns().len(),
                rows,
            },
        );
        sink.commit()?;
        Ok((output.to_path_buf(), rows))
    }
}

/// Buffered writer over a temporary file that replaces `path` on commit.
/// Dropping it without committing discards everything written.
struct SqlSink {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl SqlSink {
    fn create(path: &Path) -> ConversionResult<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = NamedTempFile::new_in(&dir).map_err(|err| ConversionError::write(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(temp),
        })
    }

    fn write_str(&mut self, text: &str) -> ConversionResult<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|err| ConversionError::write(&self.path, err))
    }

    fn commit(self) -> ConversionResult<()> {
        let path = self.path;
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| ConversionError::write(&path, err.into_error()))?;
        if let Some(permissions) = output_permissions(&path) {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|err| ConversionError::write(&path, err))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|err| ConversionError::write(&path, err))?;
        temp.persist(&path)
            .map_err(|err| ConversionError::write(&path, err.error))?;
        Ok(())
    }
}

/// Temp files are created owner-only; a replaced script keeps its previous
/// mode and a new one gets the usual `0644`.
fn output_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(existing) => Some(existing.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
