//! Converter tuning loaded from YAML, with every field defaulted.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::table::{DEFAULT_NULL_MARKERS, NullMarkers};

pub const DEFAULT_STREAM_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_PROBE_ROWS: usize = 100_000;
pub const DEFAULT_CHUNK_ROWS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Text inputs strictly larger than this are probed, then streamed in chunks.
    pub stream_threshold_bytes: u64,
    pub probe_rows: usize,
    pub chunk_rows: usize,
    pub null_markers: Vec<String>,
    pub output_dir: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            stream_threshold_bytes: DEFAULT_STREAM_THRESHOLD_BYTES,
            probe_rows: DEFAULT_PROBE_ROWS,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            output_dir: None,
        }
    }
}

impl ConverterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ConverterConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.probe_rows > 0, "probe_rows must be greater than zero");
        ensure!(self.chunk_rows > 0, "chunk_rows must be greater than zero");
        Ok(())
    }

    pub fn null_markers(&self) -> NullMarkers {
        NullMarkers::new(self.null_markers.iter().cloned())
    }
}
