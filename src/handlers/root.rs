//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that lists the
//! available endpoints as plain text.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");
    let built = env!("VERGEN_BUILD_TIMESTAMP");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime_str = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let socket = if state.config.enable_socket.unwrap_or(true) {
        state.config.socket_path().display().to_string()
    } else {
        "disabled".to_string()
    };

    let mut body = format!(
        "psinfo {version} (built {built})\n\
         Uptime: {uptime_str}\n\
         Socket: {socket}\n\n\
         Endpoints:\n\
         \x20 /psinfo   process report (fresh snapshot per request)\n"
    );
    if state.config.enable_health.unwrap_or(true) {
        body.push_str("  /health   snapshot statistics\n");
    }

    ([("Content-Type", "text/plain; charset=utf-8")], body)
}
