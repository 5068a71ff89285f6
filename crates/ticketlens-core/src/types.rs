//! Core types shared by every pipeline stage.
//!
//! [`TicketRecord`] is the strongly-typed canonical record produced by the
//! normalizer, [`Dataset`] the immutable record set the report queries
//! borrow, and [`TicketView`] the projection that crosses the output
//! boundary.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::reader::Encoding;

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

/// One of the six semantic columns every raw export is normalised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Date,
    Status,
    Priority,
    Technician,
    Category,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Id,
        CanonicalField::Date,
        CanonicalField::Status,
        CanonicalField::Priority,
        CanonicalField::Technician,
        CanonicalField::Category,
    ];

    /// Column title used in record projections.
    pub fn display_name(self) -> &'static str {
        match self {
            CanonicalField::Id => "ID",
            CanonicalField::Date => "Fecha de apertura",
            CanonicalField::Status => "Estados",
            CanonicalField::Priority => "Prioridad",
            CanonicalField::Technician => "Asignado a - Técnico",
            CanonicalField::Category => "Categoría",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalField::Id => write!(f, "id"),
            CanonicalField::Date => write!(f, "date"),
            CanonicalField::Status => write!(f, "status"),
            CanonicalField::Priority => write!(f, "priority"),
            CanonicalField::Technician => write!(f, "technician"),
            CanonicalField::Category => write!(f, "category"),
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Month names, January first. Fixed so output never depends on the host locale.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One normalised ticket.
///
/// The categorical fields are always populated (backfilled with defaults by
/// the normalizer). Calendar fields are derived from `date` on demand, so they
/// are `None` exactly when `date` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub id: i64,
    pub date: Option<NaiveDateTime>,
    pub status: String,
    pub priority: String,
    pub technician: String,
    pub category: String,
}

impl TicketRecord {
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    pub fn month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }

    pub fn day(&self) -> Option<u32> {
        self.date.map(|d| d.day())
    }

    pub fn month_name(&self) -> Option<&'static str> {
        self.month().and_then(month_name)
    }

    /// `"YYYY-MM"` bucket key.
    pub fn year_month(&self) -> Option<String> {
        self.date.map(|d| format!("{:04}-{:02}", d.year(), d.month()))
    }
}

/// Where a dataset came from and how its columns were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub delimiter: char,
    pub encoding: Encoding,
    /// Original header chosen for each canonical field, in [`CanonicalField::ALL`] order.
    pub columns: Vec<ResolvedColumn>,
    pub id_synthesized: bool,
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            delimiter: ',',
            encoding: Encoding::Utf8,
            columns: Vec::new(),
            id_synthesized: false,
        }
    }
}

/// A canonical field and the raw header it was read from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub field: CanonicalField,
    pub header: Option<String>,
}

/// The full normalised record set of one upload. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<TicketRecord>,
    source: SourceInfo,
}

impl Dataset {
    pub fn new(records: Vec<TicketRecord>, source: SourceInfo) -> Self {
        Self { records, source }
    }

    /// Build a dataset from records alone (tests, benches, synthetic data).
    pub fn from_records(records: Vec<TicketRecord>) -> Self {
        Self::new(records, SourceInfo::default())
    }

    pub fn records(&self) -> &[TicketRecord] {
        &self.records
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TicketRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TicketRecord;
    type IntoIter = std::slice::Iter<'a, TicketRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Six-field projection of a [`TicketRecord`] with display column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    #[serde(rename = "ID")]
    pub id: i64,
    /// ISO-8601 local timestamp (`YYYY-MM-DDTHH:MM:SS`).
    #[serde(rename = "Fecha de apertura")]
    pub date: Option<String>,
    #[serde(rename = "Estados")]
    pub status: String,
    #[serde(rename = "Prioridad")]
    pub priority: String,
    #[serde(rename = "Asignado a - Técnico")]
    pub technician: String,
    #[serde(rename = "Categoría")]
    pub category: String,
}

impl From<&TicketRecord> for TicketView {
    fn from(record: &TicketRecord) -> Self {
        Self {
            id: record.id,
            date: record
                .date
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            status: record.status.clone(),
            priority: record.priority.clone(),
            technician: record.technician.clone(),
            category: record.category.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
