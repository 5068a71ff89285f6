//! Error taxonomy for the pipeline.
//!
//! Ingestion failures propagate to the caller so an upload can be reported as
//! failed. Queries over an existing [`Dataset`](crate::Dataset) are total; the
//! only query errors are the ones a caller must branch on.

use thiserror::Error;

/// Raised when an upload cannot be turned into a [`Dataset`](crate::Dataset).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// No bytes, or a header row with zero data rows.
    #[error("the file is empty")]
    Empty,

    /// The first record could not be read as a header row.
    #[error("the file has no readable header row")]
    NoHeader,

    /// Every reader strategy failed. Carries the last parser message.
    #[error("could not parse the file: {0}")]
    Unparsable(String),
}

/// Errors a caller must handle when querying the current dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No dataset has been loaded yet.
    #[error("no data loaded")]
    EmptyDataset,

    /// Lookup by id missed.
    #[error("ticket {0} not found")]
    NotFound(i64),

    /// A filter kind that needs a value was given none.
    #[error("filter '{0}' requires a value")]
    MissingFilterValue(String),
}
