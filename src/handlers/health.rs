//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! snapshot statistics and the publication status.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::atomic::Ordering;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Formats an uptime in the largest fitting unit.
pub fn format_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let stats = &state.health_stats;
    let registered = state.channel.is_registered(&state.report_name);
    let last_failed = stats.last_snapshot_failed.load(Ordering::Relaxed);

    let (status, message) = if !registered {
        (StatusCode::SERVICE_UNAVAILABLE, "Report not registered")
    } else if last_failed {
        (StatusCode::SERVICE_UNAVAILABLE, "Process table unavailable")
    } else {
        (StatusCode::OK, "OK")
    };

    let uptime_str = format_uptime(stats.get_uptime_seconds());
    let table = stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nReport: {}\nUptime: {uptime_str}\n\n{table}",
            state.report_name
        ),
    )
}
