//! Aggregation engine: read-only queries over a [`Dataset`].
//!
//! Every query borrows the dataset and returns a plain, serialisable value.
//! An empty dataset yields empty or zeroed results, never an error; the only
//! failures are a lookup miss and a filter missing its value.
//!
//! # Queries
//!
//! | Function | Output |
//! |----------|--------|
//! | [`dashboard_stats`] | totals, frequency tables, monthly trend, top technicians |
//! | [`technician_monthly`] | technician × `"{year}-{month}"` pivot, zero-filled |
//! | [`technician_daily`] | technician × `"{year}-{month}\|{day}"` pivot, sparse |
//! | [`filter_tickets`] | projected subset for a [`Filter`] |
//! | [`find_ticket`] | one projected record by id |

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::QueryError;
use crate::types::{month_name, Dataset, TicketRecord, TicketView};

/// Default length of the top-technicians table.
pub const DEFAULT_TOP_TECHNICIANS: usize = 10;

/// Key holding the technician name in pivot rows.
pub const TECHNICIAN_KEY: &str = "Técnico";

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Ordered `label → count` table, serialised as a JSON object in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts(Vec<(String, u64)>);

impl Counts {
    /// Count occurrences, ordered by count descending. Equal counts keep the
    /// order in which their label first appeared.
    pub fn tally<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut order: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        for label in labels {
            match index.get(label) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(label, order.len());
                    order.push((label.to_string(), 1));
                }
            }
        }
        // Stable sort keeps first-appearance order among ties.
        order.sort_by(|a, b| b.1.cmp(&a.1));
        Counts(order)
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(l, c)| (l.as_str(), *c))
    }

    fn truncated(mut self, n: usize) -> Self {
        self.0.truncate(n);
        self
    }
}

impl Serialize for Counts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DashboardStats {
    pub total_tickets: usize,
    pub total_technicians: usize,
    pub by_status: Counts,
    pub by_priority: Counts,
    pub by_category: Counts,
    /// `"YYYY-MM"` → tickets opened that month. Undated tickets are left out.
    pub monthly_trend: BTreeMap<String, u64>,
    pub top_technicians: Counts,
}

pub fn dashboard_stats(dataset: &Dataset, top_technicians: usize) -> DashboardStats {
    if dataset.is_empty() {
        return DashboardStats::default();
    }

    let technicians = Counts::tally(dataset.iter().map(|r| r.technician.as_str()));

    let mut monthly_trend = BTreeMap::new();
    for key in dataset.iter().filter_map(TicketRecord::year_month) {
        *monthly_trend.entry(key).or_insert(0u64) += 1;
    }

    DashboardStats {
        total_tickets: dataset.len(),
        total_technicians: technicians.len(),
        by_status: Counts::tally(dataset.iter().map(|r| r.status.as_str())),
        by_priority: Counts::tally(dataset.iter().map(|r| r.priority.as_str())),
        by_category: Counts::tally(dataset.iter().map(|r| r.category.as_str())),
        monthly_trend,
        top_technicians: technicians.truncated(top_technicians),
    }
}

// ---------------------------------------------------------------------------
// Pivots
// ---------------------------------------------------------------------------

/// One technician's row of a pivot: the name plus ordered `column → count`
/// cells. Serialises as a flat object with [`TECHNICIAN_KEY`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub technician: String,
    pub cells: Vec<(String, u64)>,
}

impl PivotRow {
    pub fn get(&self, column: &str) -> Option<u64> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, n)| *n)
    }
}

impl Serialize for PivotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() + 1))?;
        map.serialize_entry(TECHNICIAN_KEY, &self.technician)?;
        for (column, count) in &self.cells {
            map.serialize_entry(column, count)?;
        }
        map.end()
    }
}

fn month_label(year: i32, month: u32) -> String {
    format!("{year}-{}", month_name(month).unwrap_or_default())
}

/// Technician × month counts. Every row carries every month present in the
/// dataset (chronological), zero where that technician had no tickets.
/// Columns include the year, so March 2023 and March 2024 stay apart.
pub fn technician_monthly(dataset: &Dataset) -> Vec<PivotRow> {
    let mut periods: BTreeMap<(i32, u32), String> = BTreeMap::new();
    let mut per_tech: BTreeMap<&str, HashMap<(i32, u32), u64>> = BTreeMap::new();

    for record in dataset {
        let counts = per_tech.entry(record.technician.as_str()).or_default();
        if let (Some(year), Some(month)) = (record.year(), record.month()) {
            periods
                .entry((year, month))
                .or_insert_with(|| month_label(year, month));
            *counts.entry((year, month)).or_default() += 1;
        }
    }

    debug!(technicians = per_tech.len(), months = periods.len(), "monthly pivot");

    per_tech
        .into_iter()
        .map(|(technician, counts)| PivotRow {
            technician: technician.to_string(),
            cells: periods
                .iter()
                .map(|(period, label)| (label.clone(), counts.get(period).copied().unwrap_or(0)))
                .collect(),
        })
        .collect()
}

/// Technician × day counts. Each row lists only the days that technician
/// had tickets, keyed `"{year}-{month}|{day}"`, in chronological order.
pub fn technician_daily(dataset: &Dataset) -> Vec<PivotRow> {
    let mut per_tech: BTreeMap<&str, BTreeMap<(i32, u32, u32), u64>> = BTreeMap::new();

    for record in dataset {
        let days = per_tech.entry(record.technician.as_str()).or_default();
        if let (Some(year), Some(month), Some(day)) = (record.year(), record.month(), record.day()) {
            *days.entry((year, month, day)).or_default() += 1;
        }
    }

    per_tech
        .into_iter()
        .map(|(technician, days)| PivotRow {
            technician: technician.to_string(),
            cells: days
                .into_iter()
                .map(|((year, month, day), n)| (format!("{}|{day}", month_label(year, month)), n))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// A single-field selection over the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Category(String),
    Status(String),
    Technician(String),
    /// `"YYYY-MM"` key or month name.
    Month(String),
    /// Status `pendiente`, any case.
    Pending,
    /// Status `resuelto`, any case.
    Efficiency,
    /// Unknown kinds select everything.
    All,
}

impl Filter {
    /// Build a filter from its request form (`type`, `value`).
    ///
    /// `category`, `status`, `tech` and `month` need a non-blank value.
    /// `pending` and `efficiency` ignore it. Any other kind is [`Filter::All`].
    pub fn parse(kind: &str, value: Option<&str>) -> Result<Self, QueryError> {
        let kind = kind.trim().to_ascii_lowercase();
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let needs = |v: Option<&str>| {
            v.map(str::to_string)
                .ok_or_else(|| QueryError::MissingFilterValue(kind.clone()))
        };

        let filter = match kind.as_str() {
            "category" => Filter::Category(needs(value)?),
            "status" => Filter::Status(needs(value)?),
            "tech" => Filter::Technician(needs(value)?),
            "month" => Filter::Month(needs(value)?),
            "pending" => Filter::Pending,
            "efficiency" => Filter::Efficiency,
            other => {
                debug!(kind = other, "unknown filter kind, selecting all");
                Filter::All
            }
        };
        Ok(filter)
    }

    pub fn matches(&self, record: &TicketRecord) -> bool {
        match self {
            Filter::Category(v) => record.category == *v,
            Filter::Status(v) => record.status == *v,
            Filter::Technician(v) => record.technician == *v,
            Filter::Month(v) => {
                record.year_month().as_deref() == Some(v.as_str())
                    || record
                        .month_name()
                        .is_some_and(|name| name.to_lowercase() == v.to_lowercase())
            }
            Filter::Pending => record.status.trim().eq_ignore_ascii_case("pendiente"),
            Filter::Efficiency => record.status.trim().eq_ignore_ascii_case("resuelto"),
            Filter::All => true,
        }
    }
}

/// Filter result: projected tickets in dataset order plus their count.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FilteredTickets {
    pub tickets: Vec<TicketView>,
    pub total: usize,
}

pub fn filter_tickets(dataset: &Dataset, filter: &Filter) -> FilteredTickets {
    let tickets: Vec<TicketView> = dataset
        .iter()
        .filter(|r| filter.matches(r))
        .map(TicketView::from)
        .collect();
    FilteredTickets {
        total: tickets.len(),
        tickets,
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// First ticket whose id equals `id`.
pub fn find_ticket(dataset: &Dataset, id: i64) -> Result<TicketView, QueryError> {
    dataset
        .iter()
        .find(|r| r.id == id)
        .map(TicketView::from)
        .ok_or(QueryError::NotFound(id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
