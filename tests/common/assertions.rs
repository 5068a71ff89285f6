//! Domain-specific assertions for ticketlens harnesses.
//!
//! These wrap `pretty_assertions` and name the dataset property that broke.

use pretty_assertions::assert_eq;
use ticketlens_core::{DashboardStats, Dataset};

/// Assert every categorical field is non-blank on every record.
#[track_caller]
pub fn assert_no_blank_fields(dataset: &Dataset) {
    for r in dataset {
        for (name, value) in [
            ("status", &r.status),
            ("priority", &r.priority),
            ("technician", &r.technician),
            ("category", &r.category),
        ] {
            assert!(!value.trim().is_empty(), "ticket {} has a blank {name}", r.id);
        }
    }
}

/// Assert each frequency table accounts for every ticket, and the trend for
/// every dated ticket.
#[track_caller]
pub fn assert_stats_consistent(dataset: &Dataset, stats: &DashboardStats) {
    let total = dataset.len() as u64;
    assert_eq!(stats.total_tickets, dataset.len());
    assert_eq!(stats.by_status.total(), total, "by_status");
    assert_eq!(stats.by_priority.total(), total, "by_priority");
    assert_eq!(stats.by_category.total(), total, "by_category");
    let dated = dataset.iter().filter(|r| r.date.is_some()).count() as u64;
    assert_eq!(stats.monthly_trend.values().sum::<u64>(), dated, "monthly_trend");
}

/// Assert ids are exactly `1..=n` in order.
#[track_caller]
pub fn assert_sequential_ids(dataset: &Dataset) {
    let ids: Vec<i64> = dataset.iter().map(|r| r.id).collect();
    let expected: Vec<i64> = (1..=dataset.len() as i64).collect();
    assert_eq!(ids, expected);
}
