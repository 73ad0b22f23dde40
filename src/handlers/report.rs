//! Report endpoint handler.
//!
//! Serves the same text as the named socket. Every request generates a new
//! snapshot.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use psinfo::PublishError;
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

const TEXT_PLAIN: (&str, &str) = ("Content-Type", "text/plain; charset=utf-8");

/// Error type for report endpoint failures.
#[derive(Debug)]
pub struct ReportError(PublishError);

impl IntoResponse for ReportError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            [TEXT_PLAIN],
            format!("Report unavailable: {}\n", self.0),
        )
            .into_response()
    }
}

/// Handler for the /psinfo endpoint.
#[instrument(skip(state))]
pub async fn report_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ReportError> {
    let start = Instant::now();
    debug!("Processing /psinfo request");

    let report = state.open_report().await.map_err(|e| {
        error!("Report generation failed: {}", e);
        ReportError(e)
    })?;
    let body = report.into_bytes();

    state.health_stats.record_http_report();
    debug!(
        "Served /psinfo: {} bytes in {:.2}ms",
        body.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok((StatusCode::OK, [TEXT_PLAIN], body))
}
