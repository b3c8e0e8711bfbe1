use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::statement::TargetDialect;

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert CSV and spreadsheet files into SQL INSERT scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a DELETE + INSERT script (<name>.sql) for each input file
    Convert(ConvertArgs),
    /// Detect the separator and encoding of a text file and preview its rows
    Detect(DetectArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// One or more input files (.csv, .tsv, .txt, .xlsx, .xlsm, .xlsb, .xls, .ods)
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Target SQL dialect
    #[arg(short = 'd', long = "dialect", value_enum)]
    pub dialect: TargetDialect,
    /// Destination schema name
    #[arg(short = 's', long = "schema")]
    pub schema: String,
    /// Destination table name
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// Database for the USE preamble (sqlserver only)
    #[arg(long = "database")]
    pub database: Option<String>,
    /// Directory for generated .sql files (defaults to each input's directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// YAML file with converter settings
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Inputs larger than this many bytes are streamed in chunks
    #[arg(long = "stream-threshold")]
    pub stream_threshold: Option<u64>,
    /// Rows read per candidate when probing a streamed input
    #[arg(long = "probe-rows")]
    pub probe_rows: Option<usize>,
    /// Rows per chunk when streaming
    #[arg(long = "chunk-rows")]
    pub chunk_rows: Option<usize>,
    /// Also append progress messages to <name>_log.log next to each input
    #[arg(long = "log-file")]
    pub log_file: bool,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Text file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to preview
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Rows read per candidate (whole file when omitted)
    #[arg(long = "probe-rows")]
    pub probe_rows: Option<usize>,
    /// Print a JSON report including every candidate attempt
    #[arg(long)]
    pub json: bool,
    /// YAML file with converter settings
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}
