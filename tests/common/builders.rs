//! Test builders: fixed-clock pipelines and hand-made datasets.
//!
//! These are for readability in assertions, not production use. They panic
//! on invalid input rather than returning `Result`.

use chrono::{NaiveDate, NaiveDateTime};
use ticketlens_core::{
    dates::DateNormalizer, reader::TableReader, records::Normalizer, Dataset, Pipeline,
    TicketRecord,
};

/// Clock every harness pins "now" to.
pub fn fixed_now() -> NaiveDateTime {
    at(2026, 1, 1, 0, 0)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Pipeline with default reader settings and a fixed clock.
pub fn pipeline() -> Pipeline {
    Pipeline::new(
        TableReader::new(),
        Normalizer::new(DateNormalizer::new(fixed_now())),
    )
}

pub fn ingest(bytes: impl AsRef<[u8]>) -> Dataset {
    pipeline().ingest(bytes.as_ref()).unwrap()
}

// ---------------------------------------------------------------------------
// TicketBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`TicketRecord`] fixtures.
///
/// ```rust
/// let t = TicketBuilder::new(4).tech("Ana").status("Pendiente").on(2024, 3, 9).build();
/// ```
pub struct TicketBuilder {
    record: TicketRecord,
}

impl TicketBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            record: TicketRecord {
                id,
                date: None,
                status: "Nuevo".to_string(),
                priority: "Normal".to_string(),
                technician: "Sin Asignar".to_string(),
                category: "Sin Categoría".to_string(),
            },
        }
    }

    pub fn on(mut self, y: i32, m: u32, d: u32) -> Self {
        self.record.date = Some(at(y, m, d, 9, 0));
        self
    }

    pub fn status(mut self, s: &str) -> Self {
        self.record.status = s.to_string();
        self
    }

    pub fn priority(mut self, s: &str) -> Self {
        self.record.priority = s.to_string();
        self
    }

    pub fn tech(mut self, s: &str) -> Self {
        self.record.technician = s.to_string();
        self
    }

    pub fn category(mut self, s: &str) -> Self {
        self.record.category = s.to_string();
        self
    }

    pub fn build(self) -> TicketRecord {
        self.record
    }
}

pub fn dataset(tickets: impl IntoIterator<Item = TicketBuilder>) -> Dataset {
    Dataset::from_records(tickets.into_iter().map(TicketBuilder::build).collect())
}
