//! I/O utilities for decoding, CSV reading and output path resolution.
//!
//! All text input flows through this module. It provides:
//!
//! - **Strict decoding**: [`DecodingReader`] transcodes a candidate encoding to
//!   UTF-8 on the fly and fails on the first malformed byte sequence, so a wrong
//!   encoding guess surfaces as a read error instead of replacement characters.
//! - **Reader construction**: `open_csv_reader` configures the `csv` crate for a
//!   header row, double-quote escaping and flexible record widths.
//! - **Chunked reads**: [`RecordStream`] yields bounded slices of rows, applying
//!   the reader contract (padding short records, rejecting long ones, mapping
//!   null markers) identically whether a file is read whole or in chunks.
//! - **Output paths**: `sql_output_path` maps `dir/name.ext` to `dir/name.sql`.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use encoding_rs::{Decoder, DecoderResult};

use crate::{
    dialect::DialectCandidate,
    error::{ConversionError, ConversionResult},
    table::{NullMarkers, Row, Table},
};

const READ_BUFFER_BYTES: usize = 64 * 1024;

pub const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Text,
    Spreadsheet,
}

pub fn input_format(path: &Path) -> ConversionResult<InputFormat> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(InputFormat::Text)
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Ok(InputFormat::Spreadsheet)
    } else {
        Err(ConversionError::reader(
            path,
            format!("unsupported file extension '{ext}'"),
        ))
    }
}

/// `<dir>/<stem>.sql`, where `dir` defaults to the input's own directory.
pub fn sql_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let mut file_name = stem;
    file_name.push(".sql");
    dir.join(file_name)
}

/// Fails with `ReaderFailure` unless `path` names a readable regular file.
pub fn ensure_readable(path: &Path) -> ConversionResult<u64> {
    let metadata = std::fs::metadata(path).map_err(|err| ConversionError::reader(path, err))?;
    if !metadata.is_file() {
        return Err(ConversionError::reader(path, "not a regular file"));
    }
    Ok(metadata.len())
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Reads up to `limit` rows (all rows when `None`) with the given candidate.
pub fn read_table(
    path: &Path,
    candidate: DialectCandidate,
    limit: Option<usize>,
    nulls: &NullMarkers,
) -> ConversionResult<Table> {
    let mut stream = RecordStream::open(path, candidate, nulls.clone())?;
    let mut table = Table::new(stream.columns().to_vec());
    let max_rows = limit.unwrap_or(usize::MAX);
    if let Some(rows) = stream.next_chunk(max_rows)? {
        table.rows = rows;
    }
    Ok(table)
}

/// Row source over a decoded CSV file. The file handle is released on drop.
pub struct RecordStream {
    path: PathBuf,
    reader: csv::Reader<DecodingReader<BufReader<File>>>,
    columns: Vec<String>,
    nulls: NullMarkers,
    record: csv::StringRecord,
}

impl RecordStream {
    pub fn open(
        path: &Path,
        candidate: DialectCandidate,
        nulls: NullMarkers,
    ) -> ConversionResult<Self> {
        let file = File::open(path).map_err(|err| ConversionError::reader(path, err))?;
        let decoding = DecodingReader::new(
            BufReader::with_capacity(READ_BUFFER_BYTES, file),
            candidate.encoding,
        );
        let mut reader = open_csv_reader(decoding, candidate.separator.as_byte());
        let columns = reader
            .headers()
            .map_err(|err| ConversionError::reader(path, err))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(ConversionError::reader(path, "no columns to parse from file"));
        }
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns,
            nulls,
            record: csv::StringRecord::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the next slice of at most `max_rows` rows, or `None` at end of input.
    pub fn next_chunk(&mut self, max_rows: usize) -> ConversionResult<Option<Vec<Row>>> {
        let mut rows = Vec::new();
        while rows.len() < max_rows {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(|err| ConversionError::reader(&self.path, err))?;
            if !more {
                break;
            }
            rows.push(self.decode_record()?);
        }
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows))
        }
    }

    fn decode_record(&self) -> ConversionResult<Row> {
        let width = self.columns.len();
        if self.record.len() > width {
            let line = self
                .record
                .position()
                .map(|pos| pos.line())
                .unwrap_or_default();
            return Err(ConversionError::reader(
                &self.path,
                format!(
                    "expected {width} fields on line {line}, saw {}",
                    self.record.len()
                ),
            ));
        }
        let mut row = self
            .record
            .iter()
            .map(|field| self.nulls.cell(field))
            .collect::<Row>();
        row.resize(width, None);
        Ok(row)
    }
}

/// Read adapter that decodes `inner` from a candidate encoding into UTF-8.
///
/// Any malformed input (including a truncated trailing sequence) yields an
/// `InvalidData` error. The candidate's own byte-order mark is dropped.
pub struct DecodingReader<R> {
    inner: R,
    label: &'static str,
    decoder: Option<Decoder>,
    raw: Vec<u8>,
    decoded: Vec<u8>,
    pos: usize,
    offset: u64,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: crate::dialect::TextEncoding) -> Self {
        Self {
            inner,
            label: encoding.label(),
            decoder: encoding.encoding().map(|enc| enc.new_decoder_with_bom_removal()),
            raw: vec![0; READ_BUFFER_BYTES],
            decoded: Vec::with_capacity(READ_BUFFER_BYTES * 2),
            pos: 0,
            offset: 0,
            finished: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.decoded.clear();
        self.pos = 0;
        let read = loop {
            match self.inner.read(&mut self.raw) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };
        let last = read == 0;
        let input = &self.raw[..read];

        match self.decoder.as_mut() {
            // Latin-1: every byte is the code point of the same value.
            None => {
                self.decoded.resize(read * 2, 0);
                let written = encoding_rs::mem::convert_latin1_to_utf8(input, &mut self.decoded);
                self.decoded.truncate(written);
            }
            Some(decoder) => {
                let capacity = decoder
                    .max_utf8_buffer_length_without_replacement(read)
                    .ok_or_else(|| io::Error::other("decode buffer size overflow"))?;
                self.decoded.resize(capacity, 0);
                let (result, consumed, written) =
                    decoder.decode_to_utf8_without_replacement(input, &mut self.decoded, last);
                self.decoded.truncate(written);
                match result {
                    DecoderResult::InputEmpty => {}
                    DecoderResult::Malformed(_, _) => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "invalid {} byte sequence near byte {}",
                                self.label,
                                self.offset + consumed as u64
                            ),
                        ));
                    }
                    DecoderResult::OutputFull => {
                        return Err(io::Error::other("decode buffer exhausted"));
                    }
                }
            }
        }
        self.offset += read as u64;
        self.finished = last;
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.decoded.len() {
                let n = buf.len().min(self.decoded.len() - self.pos);
                buf[..n].copy_from_slice(&self.decoded[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.fill()?;
        }
    }
}
