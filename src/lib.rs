pub mod cli;
pub mod config;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod identifier;
pub mod io_utils;
pub mod observer;
pub mod preview;
pub mod spreadsheet;
pub mod statement;
pub mod table;

use std::{env, sync::Arc, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands},
    config::ConverterConfig,
    convert::{ConversionRequest, Converter},
    dialect::{CandidateAttempt, DialectDetector},
    observer::{CompositeObserver, ConversionObserver, FileObserver, LogObserver},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table2sql", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => handle_convert(&args),
        Commands::Detect(args) => handle_detect(&args),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::load(path)
            .with_context(|| format!("Loading converter settings from {path:?}")),
        None => Ok(ConverterConfig::default()),
    }
}

fn handle_convert(args: &cli::ConvertArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(threshold) = args.stream_threshold {
        config.stream_threshold_bytes = threshold;
    }
    if let Some(rows) = args.probe_rows {
        config.probe_rows = rows;
    }
    if let Some(rows) = args.chunk_rows {
        config.chunk_rows = rows;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    debug!("Converter settings: {config:?}");

    let converter = Converter::new(config)?;
    let mut failures = 0usize;
    for input in &args.inputs {
        let mut request =
            ConversionRequest::new(input, args.dialect, &args.schema, &args.table);
        request.database = args.database.clone();

        let outcome = if args.log_file {
            let observers: Vec<Arc<dyn ConversionObserver>> = vec![
                Arc::new(LogObserver),
                Arc::new(FileObserver::for_input(input)),
            ];
            converter.convert_with(&request, &CompositeObserver::new(observers))
        } else {
            converter.convert(&request)
        };
        if !outcome.is_success() {
            failures += 1;
        }
        println!("{outcome}");
    }

    info!(
        "Converted {} of {} file(s)",
        args.inputs.len() - failures,
        args.inputs.len()
    );
    if failures > 0 {
        return Err(anyhow!(
            "{failures} of {} file(s) failed to convert",
            args.inputs.len()
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DetectionReport<'a> {
    input: String,
    separator: String,
    encoding: &'static str,
    score: f64,
    columns: &'a [String],
    rows_probed: usize,
    attempts: &'a [CandidateAttempt],
}

fn handle_detect(args: &cli::DetectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let detector = DialectDetector::with_nulls(config.null_markers());
    let detection = detector
        .detect(&args.input, args.probe_rows)
        .with_context(|| format!("Detecting dialect of {:?}", args.input))?;

    if args.json {
        let report = DetectionReport {
            input: args.input.display().to_string(),
            separator: detection.candidate.separator.to_string(),
            encoding: detection.candidate.encoding.label(),
            score: detection.score.value,
            columns: &detection.table.columns,
            rows_probed: detection.table.row_count(),
            attempts: &detection.attempts,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Separator '{}', encoding {} (score {:.2}, {} column(s), {} row(s) read)",
        detection.candidate.separator,
        detection.candidate.encoding,
        detection.score.value,
        detection.table.column_count(),
        detection.table.row_count()
    );
    print!("{}", preview::render_table(&detection.table, args.rows));
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
