//! Separator and encoding detection for untyped delimited text.
//!
//! The detector parses a bounded probe of the file once per
//! [`DialectCandidate`], in a fixed priority order, and scores every table that
//! parses. The highest score wins; ties go to the earlier candidate. Every value
//! is read as raw text so that the score never depends on numeric or date
//! coercion of the content.
//!
//! ```text
//! score = 0.5*num_cols + 0.2*non_empty_rows + 10*unique_ratio
//!       + 10*data_consistency - 5*unnamed_penalty - bom_penalty
//! ```

use std::{collections::HashSet, fmt, path::Path, sync::LazyLock};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::{
    error::{ConversionError, ConversionResult},
    io_utils,
    table::{NullMarkers, Table},
};

const WEIGHT_COLUMNS: f64 = 0.5;
const WEIGHT_NON_EMPTY_ROWS: f64 = 0.2;
const WEIGHT_UNIQUE_RATIO: f64 = 10.0;
const WEIGHT_DATA_CONSISTENCY: f64 = 10.0;
const WEIGHT_UNNAMED: f64 = 5.0;
const WEIGHT_BOM: f64 = 10.0;

static PLACEHOLDER_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^unnamed:?\s*\d+$").expect("placeholder column pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Separator {
    pub const PRIORITY: [Separator; 4] = [
        Separator::Comma,
        Separator::Semicolon,
        Separator::Tab,
        Separator::Pipe,
    ];

    pub fn as_byte(self) -> u8 {
        match self {
            Separator::Comma => b',',
            Separator::Semicolon => b';',
            Separator::Tab => b'\t',
            Separator::Pipe => b'|',
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printable_delimiter(self.as_byte()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

impl TextEncoding {
    pub const PRIORITY: [TextEncoding; 5] = [
        TextEncoding::Utf8,
        TextEncoding::Utf16Le,
        TextEncoding::Utf16Be,
        TextEncoding::Latin1,
        TextEncoding::Windows1252,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Backing `encoding_rs` codec; `None` for Latin-1, which is decoded byte-for-code-point.
    pub fn encoding(self) -> Option<&'static Encoding> {
        match self {
            TextEncoding::Utf8 => Some(UTF_8),
            TextEncoding::Utf16Le => Some(UTF_16LE),
            TextEncoding::Utf16Be => Some(UTF_16BE),
            TextEncoding::Latin1 => None,
            TextEncoding::Windows1252 => Some(WINDOWS_1252),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DialectCandidate {
    pub separator: Separator,
    pub encoding: TextEncoding,
}

impl DialectCandidate {
    pub const fn new(separator: Separator, encoding: TextEncoding) -> Self {
        Self {
            separator,
            encoding,
        }
    }

    /// Separators in priority order, each tried with every encoding in priority order.
    pub fn priority_list() -> Vec<DialectCandidate> {
        Separator::PRIORITY
            .iter()
            .flat_map(|&separator| {
                TextEncoding::PRIORITY
                    .iter()
                    .map(move |&encoding| DialectCandidate::new(separator, encoding))
            })
            .collect()
    }
}

impl fmt::Display for DialectCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.separator, self.encoding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionScore {
    pub num_cols: usize,
    pub non_empty_rows: usize,
    pub unnamed: usize,
    pub unique_ratio: f64,
    pub data_consistency: f64,
    pub bom_penalty: f64,
    pub value: f64,
}

impl DetectionScore {
    pub fn of(table: &Table) -> Self {
        let num_cols = table.column_count();
        let non_empty_rows = table.non_empty_rows();
        let unnamed = table
            .columns
            .iter()
            .filter(|name| is_unnamed_column(name))
            .count();
        let bom_columns = table
            .columns
            .iter()
            .filter(|name| has_bom_or_control(name))
            .count();

        let (unique_ratio, unnamed_penalty) = if num_cols == 0 {
            (0.0, 0.0)
        } else {
            let distinct = table.columns.iter().collect::<HashSet<_>>().len();
            (
                distinct as f64 / num_cols as f64,
                unnamed as f64 / num_cols as f64,
            )
        };

        let data_consistency = if table.rows.is_empty() {
            0.0
        } else {
            let half = num_cols as f64 / 2.0;
            let consistent = table
                .rows
                .iter()
                .filter(|row| row.iter().filter(|v| v.is_some()).count() as f64 >= half)
                .count();
            consistent as f64 / table.rows.len() as f64
        };

        let bom_penalty = WEIGHT_BOM * bom_columns as f64;
        let value = WEIGHT_COLUMNS * num_cols as f64
            + WEIGHT_NON_EMPTY_ROWS * non_empty_rows as f64
            + WEIGHT_UNIQUE_RATIO * unique_ratio
            + WEIGHT_DATA_CONSISTENCY * data_consistency
            - WEIGHT_UNNAMED * unnamed_penalty
            - bom_penalty;

        Self {
            num_cols,
            non_empty_rows,
            unnamed,
            unique_ratio,
            data_consistency,
            bom_penalty,
            value,
        }
    }

    /// One column or no populated rows means the separator guess misparsed the file.
    pub fn is_degenerate(&self) -> bool {
        self.num_cols <= 1 || self.non_empty_rows == 0
    }
}

fn is_unnamed_column(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || PLACEHOLDER_COLUMN.is_match(trimmed)
}

fn has_bom_or_control(name: &str) -> bool {
    name.chars()
        .any(|ch| ch.is_control() || ch == '\u{feff}' || ch == '\u{fffe}')
}

/// What happened when one candidate was tried.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateAttempt {
    pub candidate: DialectCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<DetectionScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for CandidateAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.score, &self.error) {
            (_, Some(error)) => write!(f, "{}: {error}", self.candidate),
            (Some(score), None) => write!(
                f,
                "{}: score {:.2} ({} column(s), {} populated row(s))",
                self.candidate, score.value, score.num_cols, score.non_empty_rows
            ),
            (None, None) => write!(f, "{}: not attempted", self.candidate),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub candidate: DialectCandidate,
    pub score: DetectionScore,
    /// The probed rows parsed with the winning candidate.
    pub table: Table,
    pub attempts: Vec<CandidateAttempt>,
}

/// Owns the ordered candidate list shared by probing and full reads.
#[derive(Debug, Clone)]
pub struct DialectDetector {
    candidates: Vec<DialectCandidate>,
    nulls: NullMarkers,
}

impl Default for DialectDetector {
    fn default() -> Self {
        Self::new(DialectCandidate::priority_list(), NullMarkers::default())
    }
}

impl DialectDetector {
    pub fn new(candidates: Vec<DialectCandidate>, nulls: NullMarkers) -> Self {
        Self { candidates, nulls }
    }

    pub fn with_nulls(nulls: NullMarkers) -> Self {
        Self::new(DialectCandidate::priority_list(), nulls)
    }

    pub fn nulls(&self) -> &NullMarkers {
        &self.nulls
    }

    /// Probes `path` with each candidate, reading at most `probe_rows` rows
    /// (the whole file when `None`), and returns the best-scoring parse.
    pub fn detect(&self, path: &Path, probe_rows: Option<usize>) -> ConversionResult<Detection> {
        io_utils::ensure_readable(path)?;

        let mut attempts = Vec::with_capacity(self.candidates.len());
        let mut best: Option<(usize, DetectionScore, Table)> = None;

        for &candidate in &self.candidates {
            match io_utils::read_table(path, candidate, probe_rows, &self.nulls) {
                Ok(table) => {
                    let score = DetectionScore::of(&table);
                    debug!(
                        "Candidate {candidate} on {path:?}: score {:.2} ({} column(s), {} row(s))",
                        score.value,
                        score.num_cols,
                        table.row_count()
                    );
                    attempts.push(CandidateAttempt {
                        candidate,
                        score: Some(score),
                        error: None,
                    });
                    if best
                        .as_ref()
                        .is_none_or(|(_, best_score, _)| score.value > best_score.value)
                    {
                        best = Some((attempts.len() - 1, score, table));
                    }
                }
                Err(err) => {
                    let reason = match err {
                        ConversionError::ReaderFailure { message, .. } => message,
                        other => other.to_string(),
                    };
                    debug!("Candidate {candidate} on {path:?} failed: {reason}");
                    attempts.push(CandidateAttempt {
                        candidate,
                        score: None,
                        error: Some(reason),
                    });
                }
            }
        }

        match best {
            Some((index, score, table)) if !score.is_degenerate() => Ok(Detection {
                candidate: attempts[index].candidate,
                score,
                table,
                attempts,
            }),
            _ => Err(ConversionError::NoViableDialect {
                attempts: attempts.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}
