//! Snapshot command implementation.
//!
//! Generates one report in-process, without a running service.

use psinfo::{generate_snapshot, ProcfsSource, PublicationChannel};
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::cli::ReportFormat;
use crate::config::Config;

/// Generates and prints one report.
pub fn command_snapshot(
    format: ReportFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = ProcfsSource::new(config.proc_root());

    match format {
        ReportFormat::Json => {
            let snapshot = generate_snapshot(&source)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        ReportFormat::Text => {
            // Same path as a published read: register, open, copy, close
            let channel = PublicationChannel::new();
            let registration = channel.register(
                config.report_name(),
                Arc::new(move || generate_snapshot(&source)),
            )?;

            let mut report = channel.open(config.report_name())?;
            let mut text = Vec::with_capacity(report.len());
            report.read_to_end(&mut text)?;
            drop(report);
            channel.unregister(registration);

            io::stdout().write_all(&text)?;
        }
    }
    Ok(())
}
