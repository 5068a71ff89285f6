//! HTTP API: thin axum layer over the core queries.
//!
//! Every handler resolves the current dataset snapshot, runs one query under
//! [`guarded`], and wraps the result in the `{success, data}` envelope.
//! Failures use `{success: false, error}` with a 4xx/5xx status.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use ticketlens_core::{
    report::{self, Filter},
    types::SourceInfo,
    DashboardStats, Dataset, FilteredTickets, IngestError, Pipeline, PivotRow, QueryError,
    TicketView,
};
use tracing::{error, info, warn};

use crate::state::{DatasetStore, SlotStatus};

// ============================================================================
// State
// ============================================================================

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    pub store: DatasetStore,
    pub pipeline: Pipeline,
    pub top_technicians: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, top_technicians: usize) -> Self {
        Self {
            store: DatasetStore::new(),
            pipeline,
            top_technicians,
        }
    }
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/stats", get(stats))
        .route("/api/technicians/monthly", get(technicians_monthly))
        .route("/api/technicians/daily", get(technicians_daily))
        .route("/api/tickets/filter", get(filter_tickets))
        .route("/api/tickets/{id}", get(ticket))
        .route("/api/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ============================================================================
// Envelope and errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

/// Error response: status plus a message for the envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::EmptyDataset => Self::bad_request("No data loaded"),
            QueryError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Ticket not found"),
            QueryError::MissingFilterValue(_) => Self::bad_request(e.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        Self::bad_request(e.to_string())
    }
}

// ============================================================================
// Query boundary
// ============================================================================

/// Run one query, turning a panic into the query's empty value.
///
/// This is the only place query faults are swallowed. They are logged so the
/// degraded response can be traced.
pub fn guarded<T: Default>(query: &'static str, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(query, %reason, "query failed, returning empty result");
            T::default()
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Everything the dashboard renders after an upload.
#[derive(Debug, Serialize)]
pub struct ReportBundle {
    pub source: SourceInfo,
    pub technician_stats: Vec<PivotRow>,
    pub technician_daily_stats: Vec<PivotRow>,
    pub dashboard_stats: DashboardStats,
}

impl ReportBundle {
    pub fn build(dataset: &Dataset, top_technicians: usize) -> Self {
        Self {
            source: dataset.source().clone(),
            technician_stats: guarded("technician_monthly", || report::technician_monthly(dataset)),
            technician_daily_stats: guarded("technician_daily", || report::technician_daily(dataset)),
            dashboard_stats: guarded("dashboard_stats", || {
                report::dashboard_stats(dataset, top_technicians)
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadData {
    pub generation: u64,
    #[serde(flatten)]
    pub reports: ReportBundle,
}

// ============================================================================
// Handlers
// ============================================================================

async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Success<UploadData>>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if field.file_name().map_or(true, str::is_empty) {
            return Err(ApiError::bad_request("No selected file"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        upload = Some(bytes);
        break;
    }
    let bytes = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;

    let pipeline = state.pipeline.clone();
    let dataset = tokio::task::spawn_blocking(move || pipeline.ingest(&bytes))
        .await
        .map_err(|e| {
            error!(error = %e, "ingest task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "ingestion failed")
        })?
        .map_err(|e| {
            warn!(error = %e, "upload rejected");
            ApiError::from(e)
        })?;

    let loaded = state.store.replace(dataset).await;
    info!(generation = loaded.generation, "upload accepted");

    Ok(ok(UploadData {
        generation: loaded.generation,
        reports: ReportBundle::build(&loaded.dataset, state.top_technicians),
    }))
}

async fn stats(
    State(state): State<SharedState>,
) -> Result<Json<Success<DashboardStats>>, ApiError> {
    let loaded = state.store.current().await?;
    Ok(ok(guarded("dashboard_stats", || {
        report::dashboard_stats(&loaded.dataset, state.top_technicians)
    })))
}

async fn technicians_monthly(
    State(state): State<SharedState>,
) -> Result<Json<Success<Vec<PivotRow>>>, ApiError> {
    let loaded = state.store.current().await?;
    Ok(ok(guarded("technician_monthly", || {
        report::technician_monthly(&loaded.dataset)
    })))
}

async fn technicians_daily(
    State(state): State<SharedState>,
) -> Result<Json<Success<Vec<PivotRow>>>, ApiError> {
    let loaded = state.store.current().await?;
    Ok(ok(guarded("technician_daily", || {
        report::technician_daily(&loaded.dataset)
    })))
}

#[derive(Debug, Deserialize)]
struct FilterParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    value: Option<String>,
}

async fn filter_tickets(
    State(state): State<SharedState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Success<FilteredTickets>>, ApiError> {
    let kind = params
        .kind
        .ok_or_else(|| ApiError::bad_request("Missing parameters"))?;
    let filter = Filter::parse(&kind, params.value.as_deref())?;
    let loaded = state.store.current().await?;
    Ok(ok(guarded("filter_tickets", || {
        report::filter_tickets(&loaded.dataset, &filter)
    })))
}

#[derive(Debug, Serialize)]
struct TicketData {
    ticket: TicketView,
}

async fn ticket(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Success<TicketData>>, ApiError> {
    let loaded = state.store.current().await?;
    let ticket = guarded("find_ticket", || report::find_ticket(&loaded.dataset, id).ok())
        .ok_or(QueryError::NotFound(id))?;
    Ok(ok(TicketData { ticket }))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    slot: SlotStatus,
}

async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        slot: state.store.status().await,
    })
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": "Endpoint not found",
            "path": uri.path(),
        })),
    )
}

// ============================================================================
// Tests
// ============================================================================
