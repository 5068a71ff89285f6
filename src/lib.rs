//! ticketlens: ticket export analyzer.
//!
//! Upload a GLPI-style CSV export and get back dashboard aggregates: status,
//! priority and category breakdowns, a monthly trend, and per-technician
//! pivots. The heavy lifting lives in `ticketlens-core`; this crate adds the
//! HTTP surface, the shared dataset slot, and the offline `report` command.
//!
//! # Architecture
//!
//! ```text
//! upload ──► Pipeline (core) ──► DatasetStore ──► api handlers ──► JSON
//!                                      ▲
//!                                  generation
//! ```

pub mod api;
pub mod server;
pub mod state;

use ticketlens_core::{config::Config, IngestError, Pipeline};

/// Ingest `bytes` and build the same report bundle an upload returns.
pub fn report_bytes(config: &Config, bytes: &[u8]) -> Result<api::ReportBundle, IngestError> {
    let dataset = Pipeline::from_config(&config.ingest).ingest(bytes)?;
    Ok(api::ReportBundle::build(&dataset, config.report.top_technicians))
}
