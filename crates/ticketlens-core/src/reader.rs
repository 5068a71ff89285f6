//! Flexible table reader: turns raw upload bytes into a [`RawTable`].
//!
//! Exports arrive with whatever delimiter and encoding the ticketing tool
//! (or the spreadsheet it passed through) chose. The reader sniffs the
//! delimiter from a prefix, then tries progressively more permissive
//! strategies until one parses:
//!
//! ```text
//! strict/UTF-8 ──► strict/Latin-1 ──► permissive (delimiter re-sniffed)
//! ```
//!
//! The permissive parse reuses the first text that decoded: UTF-8 when the
//! bytes are valid UTF-8, Latin-1 otherwise. The first success wins. A one-column result read with a non-comma
//! delimiter is re-read as comma-separated before being returned.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::IngestError;

/// Delimiters considered by the sniffer, in tie-break order.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b';', b',', b'|', b'\t'];

/// Default size of the prefix used for delimiter sniffing.
pub const DEFAULT_SNIFF_BYTES: usize = 4096;

/// Share of sampled lines that must agree on a delimiter count.
const CONSISTENCY_THRESHOLD: f64 = 0.9;

/// Sampled lines per sniff.
const SNIFF_LINES: usize = 20;

// ---------------------------------------------------------------------------
// Raw table
// ---------------------------------------------------------------------------

/// Text encoding a table was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
            Encoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

/// Parsed but untyped export: a header row plus equally wide data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    delimiter: u8,
    encoding: Encoding,
}

impl RawTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Tolerant delimited-text reader.
#[derive(Debug, Clone)]
pub struct TableReader {
    sniff_bytes: usize,
}

impl Default for TableReader {
    fn default() -> Self {
        Self {
            sniff_bytes: DEFAULT_SNIFF_BYTES,
        }
    }
}

impl TableReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sniff_bytes(mut self, sniff_bytes: usize) -> Self {
        self.sniff_bytes = sniff_bytes.max(1);
        self
    }

    /// Parse `bytes` into a table, trying each strategy in turn.
    pub fn read(&self, bytes: &[u8]) -> Result<RawTable, IngestError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(IngestError::Empty);
        }

        let truncated = bytes.len() > self.sniff_bytes;
        let sample = String::from_utf8_lossy(&bytes[..bytes.len().min(self.sniff_bytes)]);
        let delimiter = sniff_delimiter(&sample, truncated).unwrap_or_else(|| fallback_delimiter(&sample));
        debug!(delimiter = %(delimiter as char).escape_default(), "sniffed delimiter");

        let mut last_error = String::from("no strategy attempted");
        let mut decoded: Option<(Encoding, Cow<'_, str>)> = None;

        for encoding in [Encoding::Utf8, Encoding::Latin1] {
            let Some(text) = decode(bytes, encoding) else {
                debug!(%encoding, "decode failed");
                last_error = format!("input is not valid {encoding}");
                continue;
            };
            match parse(&text, delimiter, encoding, true) {
                Ok(table) => return finish(correct_single_column(table, &text, true)),
                Err(e) => {
                    debug!(%encoding, error = %e, "strict parse failed");
                    last_error = e.to_string();
                }
            }
            if decoded.is_none() {
                decoded = Some((encoding, text));
            }
        }

        let Some((encoding, text)) = decoded else {
            return Err(IngestError::Unparsable(last_error));
        };
        let delimiter = sniff_delimiter(&text, false).unwrap_or_else(|| fallback_delimiter(&text));
        warn!(
            delimiter = %(delimiter as char).escape_default(),
            %encoding,
            last_error = %last_error,
            "falling back to permissive parse"
        );
        match parse(&text, delimiter, encoding, false) {
            Ok(table) => finish(correct_single_column(table, &text, false)),
            Err(e) => Err(IngestError::Unparsable(e.to_string())),
        }
    }
}

fn finish(table: RawTable) -> Result<RawTable, IngestError> {
    if table.headers.is_empty() {
        return Err(IngestError::NoHeader);
    }
    if table.rows.is_empty() {
        return Err(IngestError::Empty);
    }
    debug!(
        rows = table.rows.len(),
        columns = table.headers.len(),
        encoding = %table.encoding,
        "table read"
    );
    Ok(table)
}

/// Re-read a one-column table as comma-separated when it was read with
/// another delimiter. Keeps the original if the comma read fails.
fn correct_single_column(table: RawTable, text: &str, strict: bool) -> RawTable {
    if table.width() != 1 || table.delimiter == b',' {
        return table;
    }
    match parse(text, b',', table.encoding, strict) {
        Ok(comma) => {
            debug!(columns = comma.width(), "single column corrected to comma delimiter");
            comma
        }
        Err(_) => table,
    }
}

fn parse(text: &str, delimiter: u8, encoding: Encoding, strict: bool) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(!strict)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(RawTable {
        headers,
        rows,
        delimiter,
        encoding,
    })
}

fn decode(bytes: &[u8], encoding: Encoding) -> Option<Cow<'_, str>> {
    let without_bom = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(without_bom).ok().map(Cow::Borrowed),
        // Every byte is a valid Latin-1 code point with the same value.
        Encoding::Latin1 => Some(Cow::Owned(without_bom.iter().map(|&b| b as char).collect())),
    }
}

// ---------------------------------------------------------------------------
// Delimiter sniffing
// ---------------------------------------------------------------------------

/// Pick the candidate delimiter that occurs a consistent, non-zero number of
/// times per line across the sample. Returns `None` when no candidate is
/// consistent enough.
///
/// `truncated` drops the last sampled line, which is usually cut mid-row.
pub fn sniff_delimiter(sample: &str, truncated: bool) -> Option<u8> {
    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    lines.truncate(SNIFF_LINES);
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64, usize)> = None;
    for &candidate in &CANDIDATE_DELIMITERS {
        let mut histogram: HashMap<usize, usize> = HashMap::new();
        for line in &lines {
            let count = line.bytes().filter(|&b| b == candidate).count();
            *histogram.entry(count).or_default() += 1;
        }

        // Most common per-line count; larger count wins a frequency tie.
        let Some((&mode, &freq)) = histogram
            .iter()
            .max_by(|(ca, fa), (cb, fb)| fa.cmp(fb).then(ca.cmp(cb)))
        else {
            continue;
        };
        if mode == 0 {
            continue;
        }

        let share = freq as f64 / lines.len() as f64;
        if share < CONSISTENCY_THRESHOLD {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_share, best_mode)) => {
                share > best_share || (share == best_share && mode > best_mode)
            }
        };
        if better {
            best = Some((candidate, share, mode));
        }
    }

    best.map(|(delimiter, _, _)| delimiter)
}

/// Used when sniffing is inconclusive: semicolon if one appears, else comma.
pub fn fallback_delimiter(sample: &str) -> u8 {
    if sample.contains(';') {
        b';'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
