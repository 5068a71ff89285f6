//! ticketlens-core: ingestion, normalization and aggregation of ticketing
//! exports.
//!
//! # Architecture
//!
//! ```text
//! bytes ──► reader ──► RawTable ──► records (header + dates) ──► Dataset ──► report
//! ```
//!
//! The crate holds no state. Callers keep the current [`Dataset`] and pass it
//! to every [`report`] query. Ingestion failures surface as [`IngestError`];
//! queries over a dataset are total apart from the [`QueryError`] cases.

pub mod config;
pub mod dates;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod reader;
pub mod records;
pub mod report;
pub mod types;

pub use error::{IngestError, QueryError};
pub use pipeline::Pipeline;
pub use report::{DashboardStats, Filter, FilteredTickets, PivotRow};
pub use types::{CanonicalField, Dataset, TicketRecord, TicketView};
