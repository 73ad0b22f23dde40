//! HTTP endpoint handlers for the service.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Plain-text landing page
//! - `/psinfo`: The process report, freshly generated per request
//! - `/health`: Health statistics

pub mod health;
pub mod report;
pub mod root;

// Re-export handlers
pub use health::health_handler;
pub use report::report_handler;
pub use root::root_handler;
