//! Application state management for the service.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and to socket connection tasks.

use psinfo::{HealthStats, PublicationChannel, PublishError, ReportReader};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub channel: Arc<PublicationChannel>,
    /// Name the report is registered under in `channel`.
    pub report_name: String,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Opens the published report on a blocking thread; generation walks /proc
    /// synchronously.
    pub async fn open_report(self: &Arc<Self>) -> Result<ReportReader, PublishError> {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.channel.open(&state.report_name))
            .await
            .map_err(|e| PublishError::ResourceUnavailable(format!("report task failed: {}", e)))?
    }
}
