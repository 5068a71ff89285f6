//! Record normalizer: turns a [`RawTable`] into a [`Dataset`].
//!
//! All loose typing is resolved here, once: header aliases, date parsing,
//! absent-value tokens, default backfill, and id coercion. Nothing downstream
//! looks at raw strings again.

use phf::phf_set;
use tracing::{debug, info};

use crate::dates::DateNormalizer;
use crate::header::{FieldMap, MappedColumn};
use crate::reader::RawTable;
use crate::types::{CanonicalField, Dataset, SourceInfo, TicketRecord};

pub const DEFAULT_STATUS: &str = "Sin Estado";
pub const DEFAULT_PRIORITY: &str = "Normal";
pub const DEFAULT_TECHNICIAN: &str = "Sin Asignar";
pub const DEFAULT_CATEGORY: &str = "Sin Categoría";

/// Cell values (after trimming) that mean "no value".
static ABSENT_TOKENS: phf::Set<&'static str> = phf_set! {
    "",
    "None",
    "nan",
    "NaN",
    "NaT",
    "<NA>",
    "null",
    "NULL",
};

/// Whether a raw cell counts as missing.
pub fn is_absent(raw: &str) -> bool {
    ABSENT_TOKENS.contains(raw.trim())
}

/// Builds canonical records from raw tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    dates: DateNormalizer,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DateNormalizer::local_now())
    }
}

impl Normalizer {
    pub fn new(dates: DateNormalizer) -> Self {
        Self { dates }
    }

    pub fn normalize(&self, table: &RawTable) -> Dataset {
        let map = FieldMap::resolve(table.headers());
        let rows = table.rows();

        let date_cells: Vec<Option<&str>> = match map.get(CanonicalField::Date) {
            Some(col) => rows.iter().map(|row| cell(row, col)).collect(),
            None => vec![None; rows.len()],
        };
        let dates = self.dates.normalize_column(&date_cells);

        let id_column = map.get(CanonicalField::Id);
        let status = map.get(CanonicalField::Status);
        let priority = map.get(CanonicalField::Priority);
        let technician = map.get(CanonicalField::Technician);
        let category = map.get(CanonicalField::Category);

        let mut backfilled = 0usize;
        let mut fill = |row: &[String], col: Option<&MappedColumn>, default: &str| -> String {
            match col.and_then(|c| cell(row, c)) {
                Some(value) => value.to_string(),
                None => {
                    backfilled += 1;
                    default.to_string()
                }
            }
        };

        let records: Vec<TicketRecord> = rows
            .iter()
            .zip(dates)
            .enumerate()
            .map(|(i, (row, date))| TicketRecord {
                id: match id_column {
                    Some(col) => cell(row, col).map_or(0, parse_id),
                    None => i as i64 + 1,
                },
                date,
                status: fill(row, status, DEFAULT_STATUS),
                priority: fill(row, priority, DEFAULT_PRIORITY),
                technician: fill(row, technician, DEFAULT_TECHNICIAN),
                category: fill(row, category, DEFAULT_CATEGORY),
            })
            .collect();

        let dated = records.iter().filter(|r| r.date.is_some()).count();
        debug!(backfilled, "categorical defaults applied");
        info!(
            rows = records.len(),
            dated,
            id_synthesized = map.synthesizes_id(),
            "dataset normalised"
        );

        Dataset::new(
            records,
            SourceInfo {
                delimiter: table.delimiter() as char,
                encoding: table.encoding(),
                columns: map.resolved_columns(),
                id_synthesized: map.synthesizes_id(),
            },
        )
    }
}

/// Trimmed cell text, or `None` when it is an absent token.
fn cell<'a>(row: &'a [String], col: &MappedColumn) -> Option<&'a str> {
    row.get(col.index)
        .map(|s| s.trim())
        .filter(|s| !ABSENT_TOKENS.contains(*s))
}

/// Integer id from a cell. Accepts `"12"` and integral floats like `"12.0"`;
/// anything else is 0.
pub fn parse_id(raw: &str) -> i64 {
    let s = raw.trim();
    if let Ok(id) = s.parse::<i64>() {
        return id;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
